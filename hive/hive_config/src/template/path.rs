//! Field paths such as `.Servers[0].Port`.

use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Segment {
    Key(String),
    Index(usize),
}

/// Split a path (without its leading dot) into segments.
pub(crate) fn parse_path(path: &str) -> Result<Vec<Segment>, String> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut in_bracket = false;

    for (i, c) in path.char_indices() {
        match c {
            '.' if !in_bracket => {
                if i == start && !after_bracket(path, i) {
                    return Err(format!("empty field name in .{path}"));
                }
                if i > start {
                    parts.push(Segment::Key(path[start..i].to_string()));
                }
                start = i + 1;
            }
            '[' if !in_bracket => {
                if i > start {
                    parts.push(Segment::Key(path[start..i].to_string()));
                }
                start = i + 1;
                in_bracket = true;
            }
            ']' if in_bracket => {
                let index = path[start..i]
                    .trim()
                    .parse::<usize>()
                    .map_err(|_| format!("bad index [{}] in .{path}", &path[start..i]))?;
                parts.push(Segment::Index(index));
                start = i + 1;
                in_bracket = false;
            }
            '[' | ']' => return Err(format!("unbalanced brackets in .{path}")),
            _ => {}
        }
    }

    if in_bracket {
        return Err(format!("unbalanced brackets in .{path}"));
    }
    if start < path.len() {
        parts.push(Segment::Key(path[start..].to_string()));
    } else if path.ends_with('.') {
        return Err(format!("empty field name in .{path}"));
    }

    Ok(parts)
}

fn after_bracket(path: &str, i: usize) -> bool {
    i > 0 && path[..i].ends_with(']')
}

/// Walk `segments` from `root`.
pub(crate) fn lookup<'v>(root: &'v Value, segments: &[Segment]) -> Option<&'v Value> {
    segments
        .iter()
        .try_fold(root, |current, segment| match segment {
            Segment::Key(key) => current.as_object()?.get(key),
            Segment::Index(index) => current.as_array()?.get(*index),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_path() {
        assert_eq!(
            parse_path("Servers[1].Port").unwrap(),
            vec![
                Segment::Key("Servers".into()),
                Segment::Index(1),
                Segment::Key("Port".into()),
            ]
        );
        assert_eq!(
            parse_path("A.B").unwrap(),
            vec![Segment::Key("A".into()), Segment::Key("B".into())]
        );
        assert_eq!(parse_path("[0][2]").unwrap().len(), 2);
    }

    #[test]
    fn test_parse_path_errors() {
        assert!(parse_path("A..B").is_err());
        assert!(parse_path("A.").is_err());
        assert!(parse_path("A[x]").is_err());
        assert!(parse_path("A[0").is_err());
        assert!(parse_path("A]").is_err());
    }

    #[test]
    fn test_lookup() {
        let root = json!({ "Servers": [{ "Port": 80 }, { "Port": 81 }] });
        let path = parse_path("Servers[1].Port").unwrap();
        assert_eq!(lookup(&root, &path), Some(&json!(81)));

        let missing = parse_path("Servers[5].Port").unwrap();
        assert_eq!(lookup(&root, &missing), None);

        let through_scalar = parse_path("Servers[0].Port.Deeper").unwrap();
        assert_eq!(lookup(&root, &through_scalar), None);
    }
}
