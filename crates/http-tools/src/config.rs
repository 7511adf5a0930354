//! HTTP tool DSL.
//!
//! Tools are declared as data: a method, a path template and an ordered parameter list, plus
//! how the response is relayed. The same types are produced by the hand-written catalog and by
//! `OpenAPI` synthesis, and can also be loaded from YAML/JSON.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;

/// A set of tools sharing the same request conventions.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpToolsConfig {
    /// Query parameters appended to every request (after the tool's own parameters).
    #[serde(default)]
    pub fixed_query: BTreeMap<String, String>,

    /// What to do with arguments that are not declared parameters.
    #[serde(default)]
    pub unknown_args: UnknownArgPolicy,

    #[serde(default)]
    pub tools: Vec<ToolSpec>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UnknownArgPolicy {
    /// Fail the call with `InvalidArgument`.
    #[default]
    Reject,
    /// Drop the argument and log it at debug level.
    Ignore,
}

/// One tool: a named mapping onto a single upstream request.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolSpec {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_method")]
    pub method: String,
    pub path: String,
    #[serde(default)]
    pub params: Vec<ParamSpec>,
    #[serde(default)]
    pub response: ResponseSpec,
    /// Extra diagnostics attached to `NotFound` errors.
    #[serde(default)]
    pub not_found: Option<NotFoundHint>,
}

fn default_method() -> String {
    "GET".to_string()
}

impl ToolSpec {
    #[must_use]
    pub fn new(
        method: &str,
        name: impl Into<String>,
        path: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            method: method.to_string(),
            path: path.into(),
            params: Vec::new(),
            response: ResponseSpec::default(),
            not_found: None,
        }
    }

    #[must_use]
    pub fn get(
        name: impl Into<String>,
        path: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self::new("GET", name, path, description)
    }

    #[must_use]
    pub fn param(mut self, param: ParamSpec) -> Self {
        self.params.push(param);
        self
    }

    #[must_use]
    pub fn transform(mut self, transform: ResponseTransform) -> Self {
        self.response.transforms.push(transform);
        self
    }

    #[must_use]
    pub fn text(mut self) -> Self {
        self.response.mode = ResponseMode::Text;
        self
    }

    /// Relay the body as a base64 asset; `filename` is a template over resolved arguments.
    #[must_use]
    pub fn asset(mut self, filename: impl Into<String>) -> Self {
        self.response.mode = ResponseMode::Asset;
        self.response.asset_filename = Some(filename.into());
        self
    }

    #[must_use]
    pub fn not_found(mut self, reasons: &[&str], suggestions: &[&str]) -> Self {
        self.not_found = Some(NotFoundHint {
            possible_reasons: reasons.iter().map(ToString::to_string).collect(),
            suggestions: suggestions.iter().map(ToString::to_string).collect(),
        });
        self
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ParamLocation {
    Path,
    Query,
    Header,
    Body,
}

/// Values that come from the server configuration rather than the caller.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ContextValue {
    /// The configured Sauce Labs username.
    Username,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParamSpec {
    /// Argument name exposed to callers.
    pub name: String,
    #[serde(rename = "in")]
    pub location: ParamLocation,
    /// Name used on the wire, when it differs from `name`.
    #[serde(default)]
    pub upstream_name: Option<String>,
    /// Defaults to `true` for path parameters and `false` otherwise.
    #[serde(default)]
    pub required: Option<bool>,
    #[serde(default)]
    pub default: Option<Value>,
    /// JSON schema of the argument. Defaults to `{"type": "string"}`.
    #[serde(default)]
    pub schema: Option<Value>,
    #[serde(default)]
    pub description: Option<String>,
    /// Used when the argument is absent.
    #[serde(default)]
    pub fallback: Option<ContextValue>,
    /// Never accepted from callers; always filled from `fallback`.
    #[serde(default)]
    pub hidden: bool,
    /// Path parameter that may span several segments: `/` is kept and each segment is encoded.
    #[serde(default)]
    pub allow_reserved: bool,
}

impl ParamSpec {
    #[must_use]
    pub fn new(location: ParamLocation, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            location,
            upstream_name: None,
            required: None,
            default: None,
            schema: None,
            description: None,
            fallback: None,
            hidden: false,
            allow_reserved: false,
        }
    }

    #[must_use]
    pub fn path(name: impl Into<String>) -> Self {
        Self::new(ParamLocation::Path, name)
    }

    #[must_use]
    pub fn query(name: impl Into<String>) -> Self {
        Self::new(ParamLocation::Query, name)
    }

    #[must_use]
    pub fn body(name: impl Into<String>) -> Self {
        Self::new(ParamLocation::Body, name)
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = Some(true);
        self
    }

    #[must_use]
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    #[must_use]
    pub fn schema(mut self, schema: Value) -> Self {
        self.schema = Some(schema);
        self
    }

    #[must_use]
    pub fn integer(self) -> Self {
        self.schema(json!({"type": "integer"}))
    }

    #[must_use]
    pub fn boolean(self) -> Self {
        self.schema(json!({"type": "boolean"}))
    }

    #[must_use]
    pub fn one_of(self, values: &[&str]) -> Self {
        self.schema(json!({"type": "string", "enum": values}))
    }

    #[must_use]
    pub fn string_array(self) -> Self {
        self.schema(json!({"type": "array", "items": {"type": "string"}}))
    }

    /// Fill from context when the caller omits the argument.
    #[must_use]
    pub fn or_context(mut self, value: ContextValue) -> Self {
        self.fallback = Some(value);
        self
    }

    /// Always fill from context; not part of the tool's input schema.
    #[must_use]
    pub fn from_context(mut self, value: ContextValue) -> Self {
        self.fallback = Some(value);
        self.hidden = true;
        self
    }

    #[must_use]
    pub fn allow_reserved(mut self) -> Self {
        self.allow_reserved = true;
        self
    }

    #[must_use]
    pub fn is_required(&self) -> bool {
        self.required
            .unwrap_or(matches!(self.location, ParamLocation::Path))
    }

    #[must_use]
    pub fn wire_name(&self) -> &str {
        self.upstream_name.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ResponseMode {
    /// Parse the body as JSON (falls back to text when it is not JSON).
    #[default]
    Json,
    /// Relay the body as text.
    Text,
    /// Relay the body as a base64 asset object.
    Asset,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseSpec {
    #[serde(default)]
    pub mode: ResponseMode,
    #[serde(default)]
    pub transforms: Vec<ResponseTransform>,
    /// Template such as `{job_id}_{asset_type}`; only used in asset mode.
    #[serde(default)]
    pub asset_filename: Option<String>,
}

/// Field-level post-processing of a successful JSON body.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ResponseTransform {
    /// Rewrite epoch-second numbers under these keys (at any depth) as RFC 3339 UTC strings.
    EpochToTimestamp { fields: Vec<String> },

    /// Wrap the body as `{field: body}`.
    #[serde(rename_all = "camelCase")]
    Envelope {
        field: String,
        /// Adds the array length of the body under this key.
        #[serde(default)]
        count_field: Option<String>,
        /// Output key -> argument name, copied from the resolved arguments.
        #[serde(default)]
        echo: BTreeMap<String, String>,
        #[serde(default)]
        constants: Map<String, Value>,
    },

    /// Attach `note` under `noteField` when `body[field]` is an empty array.
    #[serde(rename_all = "camelCase")]
    EmptyArrayNote {
        field: String,
        note_field: String,
        note: Value,
    },
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NotFoundHint {
    #[serde(default)]
    pub possible_reasons: Vec<String>,
    #[serde(default)]
    pub suggestions: Vec<String>,
}
