//! HTTP method semantics.
//!
//! Drives two things: default MCP `ToolAnnotations` for tools that don't ship their own, and
//! whether leftover arguments are sent as a JSON body.

use reqwest::Method;
use rmcp::model::ToolAnnotations;

/// Methods whose leftover arguments are sent as a flattened JSON body.
#[must_use]
pub fn carries_body(method: &Method) -> bool {
    *method == Method::POST || *method == Method::PUT || *method == Method::PATCH
}

/// Derive MCP tool annotations from RFC 9110 method semantics.
///
/// `openWorldHint` is always `true`: every tool reaches an external system. Extension methods
/// only get `openWorldHint`.
#[must_use]
pub fn annotations_for_method(method: &Method) -> ToolAnnotations {
    // (read_only, destructive, idempotent)
    let hints = match *method {
        Method::GET | Method::HEAD | Method::OPTIONS => Some((true, false, Some(true))),
        Method::POST => Some((false, false, Some(false))),
        Method::PUT | Method::DELETE => Some((false, true, Some(true))),
        Method::PATCH => Some((false, true, None)),
        _ => None,
    };

    let mut annotations = ToolAnnotations {
        title: None,
        read_only_hint: None,
        destructive_hint: None,
        idempotent_hint: None,
        open_world_hint: Some(true),
    };
    if let Some((read_only, destructive, idempotent)) = hints {
        annotations.read_only_hint = Some(read_only);
        annotations.destructive_hint = Some(destructive);
        annotations.idempotent_hint = idempotent;
    }
    annotations
}
