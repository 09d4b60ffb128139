//! Validation and application of patch sets.

use std::collections::BTreeMap;
use std::path::PathBuf;

use prism_source::{FileId, Pos, Range, SourceDb, SourceFile};

use crate::error::PatchError;
use crate::patch::Patch;
use crate::template;

/// The final content of one patched file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PatchedFile {
    /// The file that was patched.
    pub id: FileId,
    /// Its original path.
    pub path: PathBuf,
    /// The content after every patch was applied.
    pub content: Vec<u8>,
}

/// A patch whose positions have been resolved to byte offsets.
struct Resolved<'p> {
    patch: &'p Patch,
    file: FileId,
    start: u32,
    end: u32,
}

/// Applies `patches` to the files of `db`.
///
/// Returns the new content of every file touched by at least one patch,
/// keyed by file; untouched files are absent. Patches may be given in any
/// order. Validation and the overlap check run over the whole set before any
/// edit is made, so an error never yields partial output.
pub fn apply_patches(
    db: &SourceDb,
    patches: &[Patch],
) -> Result<BTreeMap<FileId, PatchedFile>, PatchError> {
    let mut resolved = patches
        .iter()
        .enumerate()
        .map(|(index, patch)| resolve(db, index, patch))
        .collect::<Result<Vec<_>, _>>()?;

    // Highest start first, so each splice leaves the offsets of the rest intact.
    resolved.sort_by(|a, b| b.patch.range.start.cmp(&a.patch.range.start));

    for pair in resolved.windows(2) {
        let (later, earlier) = (&pair[0], &pair[1]);
        if earlier.patch.range.overlaps(&later.patch.range) {
            return Err(PatchError::Overlap {
                first: location(db, earlier.patch.range.start),
                second: location(db, later.patch.range.start),
            });
        }
    }

    let mut files: BTreeMap<FileId, PatchedFile> = BTreeMap::new();
    for r in &resolved {
        let source = db.file(r.file);
        let text = resolve_text(db, source, r.patch)?;
        let entry = files.entry(r.file).or_insert_with(|| PatchedFile {
            id: source.id,
            path: source.path.clone(),
            content: source.content.as_bytes().to_vec(),
        });
        entry
            .content
            .splice(r.start as usize..r.end as usize, text.into_bytes());
    }
    Ok(files)
}

fn resolve<'p>(db: &SourceDb, index: usize, patch: &'p Patch) -> Result<Resolved<'p>, PatchError> {
    let range = patch.range;
    if !range.start.is_valid() {
        return Err(PatchError::MissingStart { index });
    }
    let file = db
        .file_for_pos(range.start)
        .ok_or(PatchError::UnknownPosition {
            index,
            pos: range.start.as_raw(),
        })?;
    let start = file
        .offset(range.start)
        .ok_or(PatchError::UnknownPosition {
            index,
            pos: range.start.as_raw(),
        })?;
    let end_pos = range.splice_end();
    if end_pos < range.start {
        return Err(PatchError::EndBeforeStart {
            location: location(db, range.start),
        });
    }
    let end = file.offset(end_pos).ok_or_else(|| PatchError::CrossFile {
        what: "patch".to_string(),
        location: location(db, range.start),
    })?;
    Ok(Resolved {
        patch,
        file: file.id,
        start,
        end,
    })
}

/// Produces the final replacement text, rendering the template if present.
///
/// Captures are read from the original file content.
fn resolve_text(db: &SourceDb, source: &SourceFile, patch: &Patch) -> Result<String, PatchError> {
    if !template::is_template(&patch.text) {
        return Ok(patch.text.clone());
    }
    let mut values = BTreeMap::new();
    for (name, capture) in &patch.captures {
        let text = capture_text(source, capture).map_err(|reason| PatchError::InvalidCapture {
            name: name.clone(),
            location: location(db, patch.range.start),
            reason,
        })?;
        values.insert(name.clone(), text);
    }
    template::render(&patch.text, &values).map_err(|source| PatchError::Template {
        location: location(db, patch.range.start),
        source,
    })
}

fn capture_text(source: &SourceFile, capture: &Range) -> Result<String, String> {
    let end_pos = capture
        .end
        .ok_or_else(|| "capture has no end".to_string())?;
    let start = source
        .offset(capture.start)
        .ok_or_else(|| "capture starts outside the patched file".to_string())?;
    let end = source
        .offset(end_pos)
        .ok_or_else(|| "capture ends outside the patched file".to_string())?;
    if end < start {
        return Err("capture ends before it starts".to_string());
    }
    let bytes = &source.content.as_bytes()[start as usize..end as usize];
    Ok(String::from_utf8_lossy(bytes).into_owned())
}

fn location(db: &SourceDb, pos: Pos) -> String {
    match db.position(pos) {
        Some(p) => format!("{}:{}:{}", p.path.display(), p.line, p.col),
        None => format!("<pos {}>", pos.as_raw()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db_with(files: &[(&str, &str)]) -> (SourceDb, Vec<FileId>) {
        let mut db = SourceDb::new();
        let ids = files
            .iter()
            .map(|(name, text)| db.add_source(*name, text.to_string()))
            .collect();
        (db, ids)
    }

    fn span(db: &SourceDb, file: FileId, start: u32, end: u32) -> Range {
        let f = db.file(file);
        Range::new(f.pos(start), f.pos(end))
    }

    fn find(db: &SourceDb, file: FileId, needle: &str) -> Range {
        let f = db.file(file);
        let start = f.content.find(needle).unwrap() as u32;
        Range::new(f.pos(start), f.pos(start + needle.len() as u32))
    }

    fn content(out: &BTreeMap<FileId, PatchedFile>, id: FileId) -> String {
        String::from_utf8(out[&id].content.clone()).unwrap()
    }

    #[test]
    fn empty_patch_set_touches_nothing() {
        let (db, _) = db_with(&[("a.go", "package a\n")]);
        assert!(apply_patches(&db, &[]).unwrap().is_empty());
    }

    #[test]
    fn single_replacement() {
        let (db, ids) = db_with(&[("a.go", "func F() string { return \"x\" }")]);
        let body = find(&db, ids[0], "{ return \"x\" }");
        let out = apply_patches(&db, &[Patch::replace(body, "{ return \"y\" }")]).unwrap();
        assert_eq!(content(&out, ids[0]), "func F() string { return \"y\" }");
    }

    #[test]
    fn disjoint_patches_merge_at_correct_offsets() {
        let (db, ids) = db_with(&[("a.go", "aaa bbb ccc ddd")]);
        let patches = [
            Patch::replace(find(&db, ids[0], "aaa"), "A"),
            Patch::replace(find(&db, ids[0], "ccc"), "CCCCC"),
        ];
        let out = apply_patches(&db, &patches).unwrap();
        assert_eq!(content(&out, ids[0]), "A bbb CCCCC ddd");
    }

    #[test]
    fn order_of_input_does_not_matter() {
        let (db, ids) = db_with(&[("a.go", "one two three four")]);
        let a = Patch::replace(find(&db, ids[0], "one"), "1");
        let b = Patch::insert(db.file(ids[0]).pos(8), "+");
        let c = Patch::replace(find(&db, ids[0], "four"), "4444");
        let forward = apply_patches(&db, &[a.clone(), b.clone(), c.clone()]).unwrap();
        let backward = apply_patches(&db, &[c, a, b]).unwrap();
        assert_eq!(forward, backward);
        assert_eq!(content(&forward, ids[0]), "1 two +three 4444");
    }

    #[test]
    fn insertion_at_replacement_end_is_allowed() {
        let (db, ids) = db_with(&[("a.go", "abcdef")]);
        let patches = [
            Patch::replace(span(&db, ids[0], 0, 3), "X"),
            Patch::insert(db.file(ids[0]).pos(3), "!"),
        ];
        let out = apply_patches(&db, &patches).unwrap();
        assert_eq!(content(&out, ids[0]), "X!def");
    }

    #[test]
    fn insertion_at_end_of_file() {
        let (db, ids) = db_with(&[("a.go", "abc")]);
        let out = apply_patches(&db, &[Patch::insert(db.file(ids[0]).pos(3), "\n")]).unwrap();
        assert_eq!(content(&out, ids[0]), "abc\n");
    }

    #[test]
    fn overlapping_replacements_rejected() {
        let (db, ids) = db_with(&[("a.go", "abcdefgh")]);
        let patches = [
            Patch::replace(span(&db, ids[0], 0, 5), "X"),
            Patch::replace(span(&db, ids[0], 3, 7), "Y"),
        ];
        let err = apply_patches(&db, &patches).unwrap_err();
        assert!(matches!(err, PatchError::Overlap { .. }));
        assert!(err.to_string().contains("a.go:1:1"));
    }

    #[test]
    fn insertion_inside_replacement_rejected() {
        let (db, ids) = db_with(&[("a.go", "abcdefgh")]);
        let patches = [
            Patch::replace(span(&db, ids[0], 2, 6), "X"),
            Patch::insert(db.file(ids[0]).pos(4), "Y"),
        ];
        assert!(matches!(
            apply_patches(&db, &patches),
            Err(PatchError::Overlap { .. })
        ));
    }

    #[test]
    fn insertion_at_replacement_start_rejected() {
        let (db, ids) = db_with(&[("a.go", "abcdefgh")]);
        let patches = [
            Patch::replace(span(&db, ids[0], 2, 6), "X"),
            Patch::insert(db.file(ids[0]).pos(2), "Y"),
        ];
        assert!(matches!(
            apply_patches(&db, &patches),
            Err(PatchError::Overlap { .. })
        ));
    }

    #[test]
    fn two_insertions_at_same_point_rejected() {
        let (db, ids) = db_with(&[("a.go", "abc")]);
        let p = db.file(ids[0]).pos(1);
        let patches = [Patch::insert(p, "1"), Patch::insert(p, "2")];
        assert!(matches!(
            apply_patches(&db, &patches),
            Err(PatchError::Overlap { .. })
        ));
    }

    #[test]
    fn empty_replacements_at_same_offset_rejected() {
        let (db, ids) = db_with(&[("a.go", "package p\n")]);
        let empty = span(&db, ids[0], 7, 7);
        for patches in [
            [Patch::replace(empty, "A"), Patch::replace(empty, "B")],
            [Patch::replace(empty, "B"), Patch::replace(empty, "A")],
        ] {
            assert!(matches!(
                apply_patches(&db, &patches),
                Err(PatchError::Overlap { .. })
            ));
        }
        let mixed = [Patch::replace(empty, "A"), Patch::insert(empty.start, "B")];
        assert!(matches!(
            apply_patches(&db, &mixed),
            Err(PatchError::Overlap { .. })
        ));
    }

    #[test]
    fn overlap_detected_across_non_adjacent_input() {
        let (db, ids) = db_with(&[("a.go", "0123456789abcdef")]);
        let patches = [
            Patch::replace(span(&db, ids[0], 0, 12), "big"),
            Patch::replace(span(&db, ids[0], 14, 15), "z"),
            Patch::replace(span(&db, ids[0], 5, 6), "small"),
        ];
        assert!(matches!(
            apply_patches(&db, &patches),
            Err(PatchError::Overlap { .. })
        ));
    }

    #[test]
    fn patches_in_separate_files_never_overlap() {
        let (db, ids) = db_with(&[("a.go", "aaaa"), ("b.go", "bbbb")]);
        let patches = [
            Patch::replace(span(&db, ids[0], 0, 4), "A"),
            Patch::replace(span(&db, ids[1], 0, 4), "B"),
        ];
        let out = apply_patches(&db, &patches).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(content(&out, ids[0]), "A");
        assert_eq!(content(&out, ids[1]), "B");
        assert_eq!(out[&ids[1]].path, PathBuf::from("b.go"));
    }

    #[test]
    fn untouched_files_omitted() {
        let (db, ids) = db_with(&[("a.go", "aaaa"), ("b.go", "bbbb")]);
        let out = apply_patches(&db, &[Patch::replace(span(&db, ids[1], 0, 1), "B")]).unwrap();
        assert!(!out.contains_key(&ids[0]));
        assert!(out.contains_key(&ids[1]));
    }

    #[test]
    fn missing_start_rejected() {
        let (db, _) = db_with(&[("a.go", "abc")]);
        let err = apply_patches(&db, &[Patch::insert(Pos::NONE, "x")]).unwrap_err();
        assert!(matches!(err, PatchError::MissingStart { index: 0 }));
    }

    #[test]
    fn end_before_start_rejected() {
        let (db, ids) = db_with(&[("a.go", "abcdef")]);
        let f = db.file(ids[0]);
        let backwards = Range::new(f.pos(4), f.pos(2));
        let err = apply_patches(&db, &[Patch::replace(backwards, "x")]).unwrap_err();
        assert!(matches!(err, PatchError::EndBeforeStart { .. }));
    }

    #[test]
    fn range_crossing_files_rejected() {
        let (db, ids) = db_with(&[("a.go", "abc"), ("b.go", "def")]);
        let range = Range::new(db.file(ids[0]).pos(1), db.file(ids[1]).pos(1));
        let err = apply_patches(&db, &[Patch::replace(range, "x")]).unwrap_err();
        assert!(matches!(err, PatchError::CrossFile { .. }));
    }

    #[test]
    fn unknown_position_rejected() {
        let (db, _) = db_with(&[("a.go", "abc")]);
        let err = apply_patches(&db, &[Patch::insert(Pos::from_raw(900), "x")]).unwrap_err();
        assert!(matches!(err, PatchError::UnknownPosition { index: 0, .. }));
    }

    #[test]
    fn wrap_uses_original_text() {
        let (db, ids) = db_with(&[("a.go", "x := compute(1)")]);
        let call = find(&db, ids[0], "compute(1)");
        let out = apply_patches(&db, &[Patch::wrap(call, "trace(", ")")]).unwrap();
        assert_eq!(content(&out, ids[0]), "x := trace(compute(1))");
    }

    #[test]
    fn captures_read_original_not_edited_text() {
        let (db, ids) = db_with(&[("a.go", "first second")]);
        let first = find(&db, ids[0], "first");
        let second = find(&db, ids[0], "second");
        // The second patch is applied first (higher offset); the capture of
        // "second" in the first patch must still see the original word.
        let patches = [
            Patch::replace(first, "{{.other}}").with_capture("other", second),
            Patch::replace(second, "EDITED"),
        ];
        let out = apply_patches(&db, &patches).unwrap();
        assert_eq!(content(&out, ids[0]), "second EDITED");
    }

    #[test]
    fn capture_in_other_file_rejected() {
        let (db, ids) = db_with(&[("a.go", "abc"), ("b.go", "def")]);
        let patch = Patch::replace(span(&db, ids[0], 0, 1), "{{.c}}")
            .with_capture("c", span(&db, ids[1], 0, 1));
        let err = apply_patches(&db, &[patch]).unwrap_err();
        assert!(matches!(err, PatchError::InvalidCapture { .. }));
    }

    #[test]
    fn capture_without_end_rejected() {
        let (db, ids) = db_with(&[("a.go", "abc")]);
        let f = db.file(ids[0]);
        let patch =
            Patch::replace(span(&db, ids[0], 0, 1), "{{.c}}").with_capture("c", Range::point(f.pos(2)));
        assert!(matches!(
            apply_patches(&db, &[patch]),
            Err(PatchError::InvalidCapture { .. })
        ));
    }

    #[test]
    fn unknown_template_name_rejected() {
        let (db, ids) = db_with(&[("a.go", "abc")]);
        let patch = Patch::replace(span(&db, ids[0], 0, 1), "{{.nope}}");
        assert!(matches!(
            apply_patches(&db, &[patch]),
            Err(PatchError::Template { .. })
        ));
    }
}
