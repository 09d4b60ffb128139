//! Position ranges used by declarations and patches.

use serde::{Deserialize, Serialize};

use crate::pos::Pos;

/// A range of global positions.
///
/// `start` is inclusive and `end` exclusive. An absent `end` denotes the
/// single point `start`, which is how insertions are expressed.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Range {
    /// Inclusive start position.
    pub start: Pos,
    /// Exclusive end position, or `None` for a point.
    pub end: Option<Pos>,
}

impl Range {
    /// Creates the range `start..end`.
    pub fn new(start: Pos, end: Pos) -> Self {
        Self {
            start,
            end: Some(end),
        }
    }

    /// Creates the point range at `pos`.
    pub fn point(pos: Pos) -> Self {
        Self {
            start: pos,
            end: None,
        }
    }

    /// Returns `true` if this range is a point (no end).
    pub fn is_point(&self) -> bool {
        self.end.is_none()
    }

    /// The end used for splicing: the end if present, otherwise the start.
    pub fn splice_end(&self) -> Pos {
        self.end.unwrap_or(self.start)
    }

    /// Returns `true` if `pos` lies in this range.
    ///
    /// A point, or an empty `start..start` range, contains only its own
    /// position; otherwise `start <= pos < end`.
    pub fn contains(&self, pos: Pos) -> bool {
        match self.end {
            Some(end) if end > self.start => self.start <= pos && pos < end,
            _ => pos == self.start,
        }
    }

    /// Returns `true` if the two ranges share any position.
    ///
    /// A point landing on the start or interior of a range overlaps it, as
    /// does a second point at the same position. A point exactly at a
    /// range's exclusive end does not.
    pub fn overlaps(&self, other: &Range) -> bool {
        self.contains(other.start)
            || other.last().is_some_and(|p| self.contains(p))
            || other.contains(self.start)
            || self.last().is_some_and(|p| other.contains(p))
    }

    /// The last position covered by a non-empty range.
    fn last(&self) -> Option<Pos> {
        match self.end {
            Some(end) if end > self.start => Some(Pos::from_raw(end.as_raw() - 1)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(start: u32, end: u32) -> Range {
        Range::new(Pos::from_raw(start), Pos::from_raw(end))
    }

    fn pt(pos: u32) -> Range {
        Range::point(Pos::from_raw(pos))
    }

    #[test]
    fn contains_half_open() {
        let range = r(10, 20);
        assert!(range.contains(Pos::from_raw(10)));
        assert!(range.contains(Pos::from_raw(19)));
        assert!(!range.contains(Pos::from_raw(20)));
        assert!(!range.contains(Pos::from_raw(9)));
    }

    #[test]
    fn point_contains_only_itself() {
        assert!(pt(5).contains(Pos::from_raw(5)));
        assert!(!pt(5).contains(Pos::from_raw(6)));
    }

    #[test]
    fn disjoint_ranges_do_not_overlap() {
        assert!(!r(1, 5).overlaps(&r(10, 15)));
        assert!(!r(10, 15).overlaps(&r(1, 5)));
    }

    #[test]
    fn adjacent_ranges_do_not_overlap() {
        assert!(!r(1, 5).overlaps(&r(5, 9)));
    }

    #[test]
    fn nested_ranges_overlap() {
        assert!(r(0, 100).overlaps(&r(10, 20)));
        assert!(r(10, 20).overlaps(&r(0, 100)));
    }

    #[test]
    fn partial_overlap() {
        assert!(r(1, 10).overlaps(&r(9, 12)));
        assert!(r(9, 12).overlaps(&r(1, 10)));
    }

    #[test]
    fn point_inside_range_overlaps() {
        assert!(r(10, 20).overlaps(&pt(15)));
        assert!(pt(10).overlaps(&r(10, 20)));
    }

    #[test]
    fn point_at_exclusive_end_is_adjacent() {
        assert!(!r(10, 20).overlaps(&pt(20)));
        assert!(!pt(20).overlaps(&r(10, 20)));
    }

    #[test]
    fn coincident_points_overlap() {
        assert!(pt(7).overlaps(&pt(7)));
        assert!(!pt(7).overlaps(&pt(8)));
    }

    #[test]
    fn empty_range_behaves_like_point() {
        assert!(r(7, 7).contains(Pos::from_raw(7)));
        assert!(r(7, 7).overlaps(&r(7, 7)));
        assert!(r(7, 7).overlaps(&pt(7)));
        assert!(r(7, 9).overlaps(&r(7, 7)));
        assert!(!r(5, 7).overlaps(&r(7, 7)));
    }

    #[test]
    fn splice_end_of_point_is_start() {
        assert_eq!(pt(4).splice_end(), Pos::from_raw(4));
        assert_eq!(r(4, 9).splice_end(), Pos::from_raw(9));
    }
}
