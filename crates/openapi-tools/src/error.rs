//! Error types for `sauce-mcp-openapi-tools`.

use sauce_mcp_http_tools::ToolError;
use thiserror::Error;

/// Reasons an RDC schema could not be turned into tools.
#[derive(Error, Debug)]
pub enum OpenApiToolsError {
    #[error("failed to fetch OpenAPI spec from '{url}': {message}")]
    SpecFetch { url: String, message: String },

    #[error("failed to read OpenAPI spec body from '{url}': {message}")]
    SpecReadBody { url: String, message: String },

    #[error("failed to read OpenAPI spec file '{path}': {source}")]
    SpecReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse OpenAPI spec from '{location}': {source}")]
    SpecParse {
        location: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// Unresolvable or cyclic `$ref`s, unsupported shapes, empty documents.
    #[error("OpenAPI error: {0}")]
    OpenApi(String),

    #[error("parameter collision: {0}")]
    ParamCollision(String),

    /// The synthesized tools were rejected by the HTTP tool runtime.
    #[error(transparent)]
    Tool(#[from] ToolError),
}

impl From<OpenApiToolsError> for ToolError {
    fn from(e: OpenApiToolsError) -> Self {
        match e {
            OpenApiToolsError::Tool(ToolError::SchemaUnavailable(msg)) => {
                ToolError::SchemaUnavailable(msg)
            }
            other => ToolError::SchemaUnavailable(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, OpenApiToolsError>;
