//! Outcome type separating deferred work from completed work.

use std::fmt;

/// The non-fatal result of an engine operation.
///
/// Engine operations return `Result<Outcome<T>, E>`: `Err` is a fatal
/// failure, [`Outcome::Ready`] carries the result, and [`Outcome::Deferred`]
/// means the engine stepped aside so the host tool can report the underlying
/// problem itself. A deferral is never a success, so callers must match it.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    /// The operation completed.
    Ready(T),
    /// The operation was skipped in favor of the host tool's own reporting.
    Deferred(Deferral),
}

impl<T> Outcome<T> {
    /// Creates a deferred outcome with the given reason.
    pub fn deferred(reason: impl Into<String>) -> Self {
        Outcome::Deferred(Deferral {
            reason: reason.into(),
        })
    }

    /// Returns `true` if this outcome was deferred.
    pub fn is_deferred(&self) -> bool {
        matches!(self, Outcome::Deferred(_))
    }

    /// Maps the ready value, leaving a deferral untouched.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Ready(value) => Outcome::Ready(f(value)),
            Outcome::Deferred(deferral) => Outcome::Deferred(deferral),
        }
    }

    /// Returns the ready value, or `None` if deferred.
    pub fn ready(self) -> Option<T> {
        match self {
            Outcome::Ready(value) => Some(value),
            Outcome::Deferred(_) => None,
        }
    }
}

/// Why an operation was deferred to the host tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deferral {
    /// Human-readable reason, logged at debug level only.
    pub reason: String,
}

impl fmt::Display for Deferral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ready_path() {
        let o = Outcome::Ready(42);
        assert!(!o.is_deferred());
        assert_eq!(o.ready(), Some(42));
    }

    #[test]
    fn deferred_path() {
        let o: Outcome<i32> = Outcome::deferred("unit has type errors");
        assert!(o.is_deferred());
        assert_eq!(o.ready(), None);
    }

    #[test]
    fn map_preserves_deferral() {
        let o: Outcome<i32> = Outcome::deferred("syntax error");
        match o.map(|v| v + 1) {
            Outcome::Deferred(d) => assert_eq!(d.reason, "syntax error"),
            Outcome::Ready(_) => panic!("expected deferral"),
        }
        assert_eq!(Outcome::Ready(1).map(|v| v * 10), Outcome::Ready(10));
    }

    #[test]
    fn deferral_display() {
        let d = Deferral {
            reason: "parse failed".to_string(),
        };
        assert_eq!(d.to_string(), "parse failed");
    }
}
