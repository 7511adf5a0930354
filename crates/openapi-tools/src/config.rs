use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Path of the RDC schema relative to the resolved Sauce base URL.
pub const DEFAULT_SPEC_PATH: &str = "/rdc/v2/openapi.yaml";

/// Configuration for an OpenAPI-derived tool source.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenApiSourceConfig {
    /// Spec location (URL or file path). Defaults to [`DEFAULT_SPEC_PATH`] on the base URL.
    #[serde(default)]
    pub spec: Option<String>,

    /// Glob patterns over `"METHOD /path"`; when non-empty an operation must match one.
    #[serde(default)]
    pub include: Vec<String>,

    /// Glob patterns over `"METHOD /path"`. Exclude wins over include.
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Query parameters appended to every request.
    #[serde(default)]
    pub fixed_query: BTreeMap<String, String>,
}

impl OpenApiSourceConfig {
    /// Whether an operation passes the include/exclude filters.
    #[must_use]
    pub fn should_discover(&self, method: &str, path: &str) -> bool {
        let operation = format!("{} {}", method.to_uppercase(), path);

        if self.exclude.iter().any(|p| glob_match(p, &operation)) {
            return false;
        }
        if !self.include.is_empty() {
            return self.include.iter().any(|p| glob_match(p, &operation));
        }
        true
    }
}

/// Byte-wise glob: `*` matches any sequence, `?` any single byte.
#[must_use]
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern_bytes = pattern.as_bytes();
    let text_bytes = text.as_bytes();

    let mut pattern_index = 0usize;
    let mut text_index = 0usize;

    let mut star_index: Option<usize> = None;
    let mut star_text_index: usize = 0;

    while text_index < text_bytes.len() {
        match pattern_bytes.get(pattern_index) {
            Some(b'*') => {
                star_index = Some(pattern_index);
                pattern_index += 1;
                star_text_index = text_index;
            }
            Some(b'?') => {
                pattern_index += 1;
                text_index += 1;
            }
            Some(&b) if b == text_bytes[text_index] => {
                pattern_index += 1;
                text_index += 1;
            }
            _ => {
                let Some(si) = star_index else {
                    return false;
                };

                pattern_index = si + 1;
                star_text_index += 1;
                text_index = star_text_index;
            }
        }
    }

    while matches!(pattern_bytes.get(pattern_index), Some(b'*')) {
        pattern_index += 1;
    }

    pattern_index == pattern_bytes.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glob_patterns() {
        assert!(glob_match("GET /rdc/v2/*", "GET /rdc/v2/sessions"));
        assert!(glob_match("* /rdc/v2/sessions/{sessionId}", "DELETE /rdc/v2/sessions/{sessionId}"));
        assert!(glob_match("GET /sess?ons", "GET /sessions"));
        assert!(!glob_match("POST *", "GET /sessions"));
    }

    #[test]
    fn exclude_wins_over_include() {
        let cfg = OpenApiSourceConfig {
            include: vec!["GET *".to_string()],
            exclude: vec!["* /rdc/v2/sessions/*".to_string()],
            ..OpenApiSourceConfig::default()
        };
        assert!(cfg.should_discover("get", "/rdc/v2/sessions"));
        assert!(!cfg.should_discover("get", "/rdc/v2/sessions/{sessionId}"));
        assert!(!cfg.should_discover("post", "/rdc/v2/sessions"));
    }

    #[test]
    fn parses_camel_case_yaml() {
        let cfg: OpenApiSourceConfig = serde_yaml::from_str(
            "spec: ./rdc.yaml\nexclude: ['DELETE *']\nfixedQuery:\n  ai: rdc_mcp\n",
        )
        .expect("parse");
        assert_eq!(cfg.spec.as_deref(), Some("./rdc.yaml"));
        assert_eq!(cfg.fixed_query.get("ai").map(String::as_str), Some("rdc_mcp"));
    }
}
