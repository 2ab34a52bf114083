//! Route pattern syntax.
//!
//! Route sources use the cloud gateway convention: `{name}` for a single
//! segment and `{name+}` for a greedy tail. Axum registers the same routes as
//! `{name}` and `{*name}`. Conversion happens once, when routes are bound; the
//! events handed to handlers always carry the cloud form.

use std::collections::HashSet;

use crate::routing::RouteError;

/// One parsed path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment<'a> {
    Literal(&'a str),
    Param(&'a str),
    Greedy(&'a str),
}

fn parse_cloud_segment(segment: &str) -> Segment<'_> {
    match segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
        Some(inner) => match inner.strip_suffix('+') {
            Some(name) => Segment::Greedy(name),
            None => Segment::Param(inner),
        },
        None => Segment::Literal(segment),
    }
}

fn parse_listener_segment(segment: &str) -> Segment<'_> {
    match segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
        Some(inner) => match inner.strip_prefix('*') {
            Some(name) => Segment::Greedy(name),
            None => Segment::Param(inner),
        },
        None => Segment::Literal(segment),
    }
}

fn map_segments<'a>(pattern: &'a str, parse: fn(&'a str) -> Segment<'a>, render: fn(Segment<'a>) -> String) -> String {
    pattern
        .split('/')
        .map(|segment| render(parse(segment)))
        .collect::<Vec<_>>()
        .join("/")
}

/// Convert a cloud-syntax pattern to axum's syntax.
pub fn to_listener_pattern(pattern: &str) -> String {
    map_segments(pattern, parse_cloud_segment, |segment| match segment {
        Segment::Literal(s) => s.to_string(),
        Segment::Param(name) => format!("{{{name}}}"),
        Segment::Greedy(name) => format!("{{*{name}}}"),
    })
}

/// Convert an axum-syntax pattern back to the cloud syntax.
pub fn to_cloud_pattern(pattern: &str) -> String {
    map_segments(pattern, parse_listener_segment, |segment| match segment {
        Segment::Literal(s) => s.to_string(),
        Segment::Param(name) => format!("{{{name}}}"),
        Segment::Greedy(name) => format!("{{{name}+}}"),
    })
}

/// Whether two distinct patterns put different placeholders at the same
/// position after a shared prefix. The listener cannot hold both: a
/// placeholder position takes one name and one kind.
pub fn placeholders_clash(first: &str, second: &str) -> bool {
    for (a, b) in first.split('/').zip(second.split('/')) {
        match (parse_cloud_segment(a), parse_cloud_segment(b)) {
            (a, b) if a == b => continue,
            (Segment::Literal(_), _) | (_, Segment::Literal(_)) => return false,
            _ => return true,
        }
    }
    false
}

fn valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
}

/// Check that a cloud-syntax pattern can be bound.
pub fn validate_pattern(pattern: &str) -> Result<(), RouteError> {
    let invalid = |reason: &str| RouteError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: reason.to_string(),
    };

    if !pattern.starts_with('/') {
        return Err(invalid("must start with '/'"));
    }

    let segments: Vec<&str> = pattern.split('/').skip(1).collect();
    let mut names = HashSet::new();
    for (i, raw) in segments.iter().enumerate() {
        match parse_cloud_segment(raw) {
            Segment::Literal(s) => {
                if s.contains('{') || s.contains('}') {
                    return Err(invalid("placeholders must span a whole segment"));
                }
                if s.starts_with(':') || s.starts_with('*') {
                    return Err(invalid("segments must not start with ':' or '*'; use {name} or {name+}"));
                }
            }
            Segment::Param(name) | Segment::Greedy(name) => {
                if !valid_name(name) {
                    return Err(invalid("placeholder names must be non-empty identifiers"));
                }
                if !names.insert(name) {
                    return Err(invalid("placeholder names must be unique"));
                }
                if matches!(parse_cloud_segment(raw), Segment::Greedy(_)) && i + 1 != segments.len() {
                    return Err(invalid("greedy placeholder must be the last segment"));
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listener_conversion() {
        assert_eq!(to_listener_pattern("/pets/{id}"), "/pets/{id}");
        assert_eq!(to_listener_pattern("/files/{proxy+}"), "/files/{*proxy}");
        assert_eq!(to_listener_pattern("/plain/path"), "/plain/path");
        assert_eq!(to_cloud_pattern("/files/{*proxy}"), "/files/{proxy+}");
    }

    #[test]
    fn test_round_trip() {
        for pattern in [
            "/",
            "/pets",
            "/pets/{id}",
            "/users/{userId}/posts/{postId}",
            "/a/{b}/c/{d}/{rest+}",
            "/static/{proxy+}",
        ] {
            assert_eq!(to_cloud_pattern(&to_listener_pattern(pattern)), pattern);
        }
    }

    #[test]
    fn test_placeholder_clash() {
        assert!(placeholders_clash("/pets/{id}", "/pets/{petId}"));
        assert!(placeholders_clash("/pets/{id}", "/pets/{id+}"));
        assert!(placeholders_clash("/a/{id}", "/a/{rest+}"));
        assert!(placeholders_clash("/a/{id}/x", "/a/{key}/y"));
        assert!(!placeholders_clash("/a/{id}", "/a/{id}/x"));
        assert!(!placeholders_clash("/a/static", "/a/{id}"));
        assert!(!placeholders_clash("/a/static", "/a/{rest+}"));
        assert!(!placeholders_clash("/a/{id}", "/b/{key}"));
    }

    #[test]
    fn test_validation() {
        assert!(validate_pattern("/pets/{id}").is_ok());
        assert!(validate_pattern("/{proxy+}").is_ok());
        assert!(validate_pattern("pets").is_err());
        assert!(validate_pattern("/pets/{}").is_err());
        assert!(validate_pattern("/pets/x{id}").is_err());
        assert!(validate_pattern("/pets/{id}/{id}").is_err());
        assert!(validate_pattern("/{rest+}/more").is_err());
        assert!(validate_pattern("/pets/{a{b}}").is_err());
        assert!(validate_pattern("/pets/:id").is_err());
        assert!(validate_pattern("/files/*rest").is_err());
        assert!(validate_pattern("/pets/a:b").is_ok());
    }
}
