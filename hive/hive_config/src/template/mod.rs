//! Template expansion.
//!
//! `{{ expression }}` actions are replaced by the rendered value of the
//! expression, evaluated against the document's `Context`. A leading `{{- `
//! or trailing ` -}}` trims the whitespace next to the action, as in Go
//! templates.
//!
//! Rendering rules: strings are inserted verbatim, numbers and booleans as
//! text, arrays and maps as compact JSON. An action evaluating to `null` is an
//! error.

mod expr;
mod funcs;
mod path;

pub use funcs::FUNCTIONS;

use serde_json::Value;

use crate::error::{Location, TemplateError, TemplateErrorKind};

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// Expand every action in `text` against `context`.
///
/// Error locations are relative to `text`.
pub fn render(text: &str, context: &Value) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;

    while let Some(found) = text[cursor..].find(OPEN) {
        let start = cursor + found;
        let fail = |kind| TemplateError {
            location: Location::from_offset(text, start),
            kind,
        };

        let body_start = start + OPEN.len();
        let body_len = find_close(&text[body_start..]).ok_or_else(|| fail(TemplateErrorKind::Unclosed))?;
        let mut body = &text[body_start..body_start + body_len];
        let mut after = body_start + body_len + CLOSE.len();

        let mut literal = &text[cursor..start];
        if let Some(rest) = trim_marker_left(body) {
            literal = literal.trim_end();
            body = rest;
        }
        out.push_str(literal);

        if let Some(rest) = trim_marker_right(body) {
            body = rest;
            let tail = &text[after..];
            after += tail.len() - tail.trim_start().len();
        }

        let value = expr::parse(body)
            .and_then(|pipeline| pipeline.eval(context))
            .map_err(fail)?;
        write_value(&value, &mut out).map_err(fail)?;

        cursor = after;
    }

    out.push_str(&text[cursor..]);
    Ok(out)
}

/// Byte offset of the closing delimiter, skipping quoted strings.
fn find_close(body: &str) -> Option<usize> {
    let bytes = body.as_bytes();
    let mut quote: Option<u8> = None;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(b'"') if b == b'\\' => i += 1,
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None if b == b'"' || b == b'`' => quote = Some(b),
            None if body[i..].starts_with(CLOSE) => return Some(i),
            None => {}
        }
        i += 1;
    }
    None
}

fn trim_marker_left(body: &str) -> Option<&str> {
    let rest = body.strip_prefix('-')?;
    rest.starts_with(char::is_whitespace).then_some(rest)
}

fn trim_marker_right(body: &str) -> Option<&str> {
    let rest = body.strip_suffix('-')?;
    rest.ends_with(char::is_whitespace).then_some(rest)
}

fn write_value(value: &Value, out: &mut String) -> Result<(), TemplateErrorKind> {
    match value {
        Value::Null => return Err(TemplateErrorKind::Null),
        Value::String(text) => out.push_str(text),
        Value::Bool(flag) => out.push_str(if *flag { "true" } else { "false" }),
        Value::Number(number) => out.push_str(&number.to_string()),
        Value::Array(_) | Value::Object(_) => out.push_str(&value.to_string()),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_substitutes_actions() {
        let context = json!({ "Port": 8080, "Name": "api", "Tags": ["a", "b"] });
        let text = r#"{"Addr": ":{{ .Port }}", "Name": "{{.Name}}", "Next": {{ .Port | add 1 }}, "Tags": {{ .Tags }}}"#;
        assert_eq!(
            render(text, &context).unwrap(),
            r#"{"Addr": ":8080", "Name": "api", "Next": 8081, "Tags": ["a","b"]}"#
        );
    }

    #[test]
    fn test_text_without_actions_is_untouched() {
        let text = "{ \"a\": \"}}\" }";
        assert_eq!(render(text, &json!({})).unwrap(), text);
    }

    #[test]
    fn test_close_inside_string_literal() {
        let out = render("[{{ \"}}\" }}]", &json!({})).unwrap();
        assert_eq!(out, "[}}]");
    }

    #[test]
    fn test_trim_markers() {
        let out = render("a   {{- .X -}}   b", &json!({ "X": 1 })).unwrap();
        assert_eq!(out, "a1b");
        let out = render("a {{-1}} b", &json!({})).unwrap();
        assert_eq!(out, "a -1 b");
    }

    #[test]
    fn test_error_locations() {
        let err = render("{\n  \"a\": {{ .Missing }}\n}", &json!({})).unwrap_err();
        assert_eq!(err.location, Location::new(2, 8));
        assert_eq!(err.kind, TemplateErrorKind::UndefinedPath(".Missing".into()));

        let err = render("ok\n  {{ .A ", &json!({ "A": 1 })).unwrap_err();
        assert_eq!(err.kind, TemplateErrorKind::Unclosed);
        assert_eq!(err.location, Location::new(2, 3));
    }

    #[test]
    fn test_null_is_an_error() {
        let err = render("{{ .A }}", &json!({ "A": null })).unwrap_err();
        assert_eq!(err.kind, TemplateErrorKind::Null);
    }
}
