//! Restricted template substitution for patch text.
//!
//! The only markup is `{{.name}}` (whitespace inside the braces is ignored),
//! replaced by the literal value bound to `name`. Nothing is evaluated, so
//! rendering is pure string interpolation.

use std::collections::BTreeMap;

use crate::error::TemplateError;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// Returns `true` if `text` contains template markup.
pub fn is_template(text: &str) -> bool {
    text.contains(OPEN)
}

/// Renders `template`, substituting each `{{.name}}` with `values[name]`.
pub fn render(template: &str, values: &BTreeMap<String, String>) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    let mut consumed = 0;
    while let Some(open) = rest.find(OPEN) {
        out.push_str(&rest[..open]);
        let after_open = &rest[open + OPEN.len()..];
        let close = after_open
            .find(CLOSE)
            .ok_or(TemplateError::Unterminated {
                offset: consumed + open,
            })?;
        let tag = after_open[..close].trim();
        let name = tag
            .strip_prefix('.')
            .filter(|n| is_capture_name(n))
            .ok_or_else(|| TemplateError::InvalidTag {
                tag: tag.to_string(),
            })?;
        let value = values
            .get(name)
            .ok_or_else(|| TemplateError::UnknownCapture {
                name: name.to_string(),
            })?;
        out.push_str(value);
        let advance = open + OPEN.len() + close + CLOSE.len();
        consumed += advance;
        rest = &rest[advance..];
    }
    out.push_str(rest);
    Ok(out)
}

fn is_capture_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(render("return 1", &values(&[])).unwrap(), "return 1");
        assert!(!is_template("return 1"));
    }

    #[test]
    fn substitutes_single_capture() {
        let v = values(&[("body", "x + 1")]);
        assert_eq!(render("wrap({{.body}})", &v).unwrap(), "wrap(x + 1)");
    }

    #[test]
    fn substitutes_repeated_and_multiple() {
        let v = values(&[("a", "1"), ("b", "2")]);
        assert_eq!(
            render("{{.a}}-{{.b}}-{{.a}}", &v).unwrap(),
            "1-2-1"
        );
    }

    #[test]
    fn whitespace_inside_tag_allowed() {
        let v = values(&[("x", "ok")]);
        assert_eq!(render("{{ .x }}", &v).unwrap(), "ok");
    }

    #[test]
    fn values_are_literal() {
        let v = values(&[("x", "{{.y}}")]);
        assert_eq!(render("[{{.x}}]", &v).unwrap(), "[{{.y}}]");
    }

    #[test]
    fn unterminated_tag_errors() {
        let err = render("ab{{.x", &values(&[("x", "1")])).unwrap_err();
        assert_eq!(err, TemplateError::Unterminated { offset: 2 });
    }

    #[test]
    fn unterminated_offset_counts_prior_tags() {
        let err = render("{{.x}}z{{", &values(&[("x", "1")])).unwrap_err();
        assert_eq!(err, TemplateError::Unterminated { offset: 7 });
    }

    #[test]
    fn non_field_tag_rejected() {
        let err = render("{{printf \"%d\" 1}}", &values(&[])).unwrap_err();
        assert!(matches!(err, TemplateError::InvalidTag { .. }));
        let err = render("{{.}}", &values(&[])).unwrap_err();
        assert!(matches!(err, TemplateError::InvalidTag { .. }));
    }

    #[test]
    fn unknown_capture_rejected() {
        let err = render("{{.missing}}", &values(&[])).unwrap_err();
        assert_eq!(
            err,
            TemplateError::UnknownCapture {
                name: "missing".to_string()
            }
        );
    }
}
