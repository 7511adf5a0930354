//! MCP tool annotations derived from HTTP method semantics.

use reqwest::Method;
use rmcp::model::ToolAnnotations;

/// Annotations for an HTTP-backed tool.
///
/// Every tool talks to Sauce Labs, so `openWorldHint` is always set. Unknown methods get no
/// other hints.
#[must_use]
pub fn annotations_for(method: &Method, tool_name: &str) -> ToolAnnotations {
    let (read_only, destructive, idempotent) =
        if [Method::GET, Method::HEAD, Method::OPTIONS].contains(method) {
            (Some(true), Some(false), Some(true))
        } else if method == Method::POST {
            (Some(false), Some(false), Some(false))
        } else if method == Method::PUT || method == Method::DELETE {
            (Some(false), Some(true), Some(true))
        } else if method == Method::PATCH {
            // PATCH may or may not be idempotent.
            (Some(false), Some(true), None)
        } else {
            (None, None, None)
        };

    ToolAnnotations {
        title: Some(title_from_name(tool_name)),
        read_only_hint: read_only,
        destructive_hint: destructive,
        idempotent_hint: idempotent,
        open_world_hint: Some(true),
    }
}

/// `get_account_info` -> `Get Account Info`.
#[must_use]
pub fn title_from_name(name: &str) -> String {
    name.split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect::<String>()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_is_read_only_and_idempotent() {
        let a = annotations_for(&Method::GET, "get_devices_status");
        assert_eq!(a.read_only_hint, Some(true));
        assert_eq!(a.destructive_hint, Some(false));
        assert_eq!(a.idempotent_hint, Some(true));
        assert_eq!(a.open_world_hint, Some(true));
        assert_eq!(a.title.as_deref(), Some("Get Devices Status"));
    }

    #[test]
    fn post_is_not_read_only() {
        let a = annotations_for(&Method::POST, "install_app");
        assert_eq!(a.read_only_hint, Some(false));
        assert_eq!(a.idempotent_hint, Some(false));
    }

    #[test]
    fn unknown_method_only_sets_open_world() {
        let custom: Method = "PROPFIND".parse().expect("valid method token");
        let a = annotations_for(&custom, "x");
        assert_eq!(a.read_only_hint, None);
        assert_eq!(a.destructive_hint, None);
        assert_eq!(a.idempotent_hint, None);
        assert_eq!(a.open_world_hint, Some(true));
    }

    #[test]
    fn title_handles_repeated_underscores() {
        assert_eq!(title_from_name("list__device_status"), "List Device Status");
    }
}
