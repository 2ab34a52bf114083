//! Route tree flattening.
//!
//! # Responsibilities
//! - Walk the nested route tree depth-first, accumulating path prefixes
//! - Emit one entry per (path, method) for HTTP nodes
//! - Emit one synthetic `POST` entry per top-level message node
//! - Reject trees that could not be bound unambiguously
//!
//! # Design Decisions
//! - Placeholders stay in cloud syntax; conversion happens at bind time
//! - A node may carry methods and children at once
//! - Message nodes are leaves and only valid at the top level

use std::collections::{HashMap, HashSet};

use axum::http::Method;

use crate::config::schema::{PathDefinitionNode, PathTree};
use crate::routing::pattern::{placeholders_clash, validate_pattern};
use crate::routing::{RouteEntry, RouteError, TransportKind, ANY_METHOD, MESSAGE_METHOD};

/// Flatten a route tree into the routing table.
pub fn flatten(tree: &PathTree) -> Result<Vec<RouteEntry>, RouteError> {
    let mut entries = Vec::new();

    for (key, node) in tree {
        match node.transport {
            Some(transport) => {
                if node.methods.as_ref().is_some_and(|m| !m.is_empty()) || node.paths.is_some() {
                    return Err(RouteError::MisplacedTransport {
                        pattern: key.clone(),
                    });
                }
                validate_pattern(key)?;
                entries.push(RouteEntry {
                    pattern: key.clone(),
                    method: MESSAGE_METHOD.to_string(),
                    kind: TransportKind::from(transport),
                });
            }
            None => walk(node, key.clone(), &mut entries)?,
        }
    }

    check_unambiguous(&entries)?;
    Ok(entries)
}

fn walk(node: &PathDefinitionNode, prefix: String, entries: &mut Vec<RouteEntry>) -> Result<(), RouteError> {
    if node.transport.is_some() {
        return Err(RouteError::MisplacedTransport { pattern: prefix });
    }

    if let Some(methods) = node.methods.as_ref().filter(|m| !m.is_empty()) {
        validate_pattern(&prefix)?;
        for method in methods {
            entries.push(RouteEntry {
                pattern: prefix.clone(),
                method: normalize_method(&prefix, method)?,
                kind: TransportKind::Request,
            });
        }
    }

    if let Some(children) = &node.paths {
        for (segment, child) in children {
            walk(child, format!("{prefix}{segment}"), entries)?;
        }
    }

    Ok(())
}

fn normalize_method(pattern: &str, method: &str) -> Result<String, RouteError> {
    let upper = method.trim().to_ascii_uppercase();
    let known = upper == ANY_METHOD
        || [
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
            Method::HEAD,
            Method::OPTIONS,
            Method::TRACE,
            Method::CONNECT,
        ]
        .iter()
        .any(|m| m.as_str() == upper);

    if known {
        Ok(upper)
    } else {
        Err(RouteError::InvalidMethod {
            pattern: pattern.to_string(),
            method: method.to_string(),
        })
    }
}

/// Each (pattern, method) pair is bound once, `ANY` owns its pattern, and no
/// two distinct patterns may put different placeholders at the same position.
fn check_unambiguous(entries: &[RouteEntry]) -> Result<(), RouteError> {
    let mut seen = HashSet::new();
    let mut patterns: Vec<&str> = Vec::new();
    let mut methods_by_pattern: HashMap<&str, Vec<&str>> = HashMap::new();

    for entry in entries {
        if !seen.insert((entry.pattern.as_str(), entry.method.as_str())) {
            return Err(RouteError::Duplicate {
                pattern: entry.pattern.clone(),
                method: entry.method.clone(),
            });
        }

        if !patterns.contains(&entry.pattern.as_str()) {
            if let Some(existing) = patterns.iter().find(|p| placeholders_clash(p, &entry.pattern)) {
                return Err(RouteError::Conflict {
                    first: existing.to_string(),
                    second: entry.pattern.clone(),
                });
            }
            patterns.push(&entry.pattern);
        }

        let methods = methods_by_pattern.entry(entry.pattern.as_str()).or_default();
        if methods.iter().any(|m| *m == ANY_METHOD) || (entry.method == ANY_METHOD && !methods.is_empty()) {
            return Err(RouteError::Duplicate {
                pattern: entry.pattern.clone(),
                method: entry.method.clone(),
            });
        }
        methods.push(entry.method.as_str());
    }

    Ok(())
}
