//! Dimension marker comments on top-level `var` declarations.
//!
//! `var G func() string //trace:F` is a bridge to `F` compiled in the
//! `trace` dimension; `var Enabled bool //trace:<in>` is an InVar, true
//! only inside `trace`. A comment is a marker only when its prefix names a
//! configured dimension, so directives like `//go:embed` pass untouched.

use std::path::Path;

use prism_syntax::VarSpec;

use crate::error::EngineError;

/// The reference that marks an InVar.
pub const IN_VAR_REF: &str = "<in>";

/// What a marker asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerTarget<'a> {
    /// Set the variable to `true` inside the dimension.
    InVar,
    /// Bind the variable to this function of the dimension variant.
    Function(&'a str),
}

/// A parsed marker comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Marker<'a> {
    /// The dimension named by the marker.
    pub dimension: &'a str,
    /// What the marker asks for.
    pub target: MarkerTarget<'a>,
}

/// Reads the marker of `spec`, if it has one.
///
/// The marker must be the only comment trailing the var spec. A marker whose
/// reference is neither `<in>` nor an identifier is an error.
pub fn spec_marker<'a>(
    spec: &'a VarSpec,
    file: &Path,
    is_dimension: impl Fn(&str) -> bool,
) -> Result<Option<Marker<'a>>, EngineError> {
    let [comment] = spec.line_comments.as_slice() else {
        return Ok(None);
    };
    let Some((dimension, reference)) = comment
        .text
        .strip_prefix("//")
        .and_then(|body| body.split_once(':'))
    else {
        return Ok(None);
    };
    if !is_dimension(dimension) {
        return Ok(None);
    }
    let target = if reference == IN_VAR_REF {
        MarkerTarget::InVar
    } else if is_identifier(reference) {
        MarkerTarget::Function(reference)
    } else {
        return Err(EngineError::Marker {
            file: file.to_path_buf(),
            message: format!(
                "marker `{}` must reference a function name or {IN_VAR_REF}",
                comment.text
            ),
        });
    };
    Ok(Some(Marker { dimension, target }))
}

/// Checks that an InVar marker decorates a single, valueless `bool`.
pub fn check_in_var(spec: &VarSpec, file: &Path) -> Result<(), EngineError> {
    let fail = |message: String| -> Result<(), EngineError> {
        Err(EngineError::Marker {
            file: file.to_path_buf(),
            message,
        })
    };
    let name = spec.names.first().map_or("", |n| n.name.as_str());
    if spec.names.len() != 1 {
        return fail(format!(
            "{IN_VAR_REF} marker requires a single variable, found {}",
            spec.names.len()
        ));
    }
    match &spec.ty {
        Some(ty) if ty.text == "bool" => {}
        Some(ty) => return fail(format!("{IN_VAR_REF} var {name} must be a bool, found {}", ty.text)),
        None => return fail(format!("{IN_VAR_REF} var {name} must be declared as bool")),
    }
    if spec.has_value {
        return fail(format!("{IN_VAR_REF} var {name} cannot have a value"));
    }
    Ok(())
}

/// The first configured dimension whose marker prefix appears anywhere in
/// `text`. A cheap pre-check before scanning a file.
pub fn mentioned_dimension<'d>(
    text: &str,
    dimensions: impl IntoIterator<Item = &'d str>,
) -> Option<&'d str> {
    dimensions
        .into_iter()
        .find(|dim| text.contains(&format!("//{dim}:")))
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars
        .next()
        .is_some_and(|c| c == '_' || c.is_alphabetic())
        && chars.all(|c| c == '_' || c.is_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;
    use prism_source::SourceDb;
    use prism_syntax::scan_file;

    fn vars(src: &str) -> Vec<VarSpec> {
        let mut db = SourceDb::new();
        let id = db.add_source("a.go", src.to_string());
        scan_file(db.file(id)).unwrap().vars
    }

    fn is_dim(name: &str) -> bool {
        name == "dim"
    }

    #[test]
    fn bridge_marker() {
        let v = vars("package p\nvar G func() string //dim:F\n");
        let m = spec_marker(&v[0], Path::new("a.go"), is_dim).unwrap().unwrap();
        assert_eq!(m.dimension, "dim");
        assert_eq!(m.target, MarkerTarget::Function("F"));
    }

    #[test]
    fn in_var_marker() {
        let v = vars("package p\nvar On bool //dim:<in>\n");
        let m = spec_marker(&v[0], Path::new("a.go"), is_dim).unwrap().unwrap();
        assert_eq!(m.target, MarkerTarget::InVar);
        check_in_var(&v[0], Path::new("a.go")).unwrap();
    }

    #[test]
    fn unknown_prefix_is_not_a_marker() {
        let v = vars("package p\nvar X string //go:embed\nvar Y int //nolint:all\n");
        for spec in &v {
            assert!(spec_marker(spec, Path::new("a.go"), is_dim).unwrap().is_none());
        }
    }

    #[test]
    fn block_comment_is_not_a_marker() {
        let v = vars("package p\nvar G func() /*dim:F*/\n");
        assert!(spec_marker(&v[0], Path::new("a.go"), is_dim).unwrap().is_none());
    }

    #[test]
    fn extra_comment_disqualifies() {
        let v = vars("package p\nvar G func() /* x */ //dim:F\n");
        assert!(spec_marker(&v[0], Path::new("a.go"), is_dim).unwrap().is_none());
    }

    #[test]
    fn bad_reference_is_error() {
        let v = vars("package p\nvar G func() //dim: F\n");
        let err = spec_marker(&v[0], Path::new("a.go"), is_dim).unwrap_err();
        assert!(matches!(err, EngineError::Marker { .. }));
        assert!(err.to_string().starts_with("a.go: marker `//dim: F`"));
    }

    #[test]
    fn in_var_shape_checked() {
        let cases = [
            ("package p\nvar A, B bool //dim:<in>\n", "single variable"),
            ("package p\nvar A int //dim:<in>\n", "must be a bool"),
            ("package p\nvar A = true //dim:<in>\n", "declared as bool"),
            ("package p\nvar A bool = false //dim:<in>\n", "cannot have a value"),
        ];
        for (src, want) in cases {
            let v = vars(src);
            let err = check_in_var(&v[0], Path::new("a.go")).unwrap_err();
            assert!(err.to_string().contains(want), "{src}: got {err}");
        }
    }

    #[test]
    fn mentioned_dimension_precheck() {
        let dims = ["alpha", "dim"];
        assert_eq!(mentioned_dimension("var x //dim:F", dims), Some("dim"));
        assert_eq!(mentioned_dimension("var x // dim:F", dims), None);
        assert_eq!(mentioned_dimension("//go:build linux", dims), None);
    }

    #[test]
    fn identifiers() {
        assert!(is_identifier("F"));
        assert!(is_identifier("_impl2"));
        assert!(is_identifier("größe"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("2x"));
        assert!(!is_identifier("a.b"));
    }
}
