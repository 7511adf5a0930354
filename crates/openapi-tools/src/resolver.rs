//! `OpenAPI` `$ref` resolver.
//!
//! The `openapiv3` crate models `$ref`s using `ReferenceOr<T>` but does not resolve them. The RDC
//! schema is a single document, so only local refs (`#/...`) are supported; anything pointing at
//! another document is an error.

use crate::error::{OpenApiToolsError, Result};
use openapiv3::{OpenAPI, Parameter, PathItem, ReferenceOr, RequestBody, Schema};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashSet;

#[derive(Debug)]
pub struct OpenApiResolver {
    root: Value,
}

impl OpenApiResolver {
    /// Create a resolver over a parsed document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be converted into JSON for pointer lookups.
    pub fn new(spec: &OpenAPI) -> Result<Self> {
        let root = serde_json::to_value(spec).map_err(|e| OpenApiToolsError::OpenApi(e.to_string()))?;
        Ok(Self { root })
    }

    /// # Errors
    ///
    /// Returns an error if the reference is external, dangling, cyclic or of the wrong shape.
    pub fn resolve_parameter(&self, param: &ReferenceOr<Parameter>) -> Result<Parameter> {
        self.resolve_reference_or(param)
    }

    /// # Errors
    ///
    /// Returns an error if the reference is external, dangling, cyclic or of the wrong shape.
    pub fn resolve_request_body(&self, body: &ReferenceOr<RequestBody>) -> Result<RequestBody> {
        self.resolve_reference_or(body)
    }

    /// # Errors
    ///
    /// Returns an error if the reference is external, dangling, cyclic or of the wrong shape.
    pub fn resolve_schema(&self, schema: &ReferenceOr<Schema>) -> Result<Schema> {
        self.resolve_reference_or(schema)
    }

    /// Same as [`OpenApiResolver::resolve_schema`] for the boxed form used by object properties
    /// and array items.
    ///
    /// # Errors
    ///
    /// Returns an error if the reference is external, dangling, cyclic or of the wrong shape.
    pub fn resolve_boxed_schema(&self, schema: &ReferenceOr<Box<Schema>>) -> Result<Schema> {
        match schema {
            ReferenceOr::Item(s) => Ok((**s).clone()),
            ReferenceOr::Reference { reference } => {
                self.resolve_reference_or::<Schema>(&ReferenceOr::Reference {
                    reference: reference.clone(),
                })
            }
        }
    }

    /// # Errors
    ///
    /// Returns an error if the reference is external, dangling, cyclic or of the wrong shape.
    pub fn resolve_path_item(&self, item: &ReferenceOr<PathItem>) -> Result<PathItem> {
        self.resolve_reference_or(item)
    }

    fn resolve_reference_or<T>(&self, r: &ReferenceOr<T>) -> Result<T>
    where
        T: Clone + DeserializeOwned,
    {
        let mut seen: HashSet<String> = HashSet::new();
        let mut cur: ReferenceOr<T> = r.clone();

        loop {
            match cur {
                ReferenceOr::Item(item) => return Ok(item),
                ReferenceOr::Reference { reference } => {
                    if !seen.insert(reference.clone()) {
                        return Err(OpenApiToolsError::OpenApi(format!(
                            "Cyclic $ref detected while resolving: {reference}",
                        )));
                    }

                    let value = self.resolve_ref_value(&reference)?;
                    cur = serde_json::from_value(value).map_err(|e| {
                        OpenApiToolsError::OpenApi(format!(
                            "Failed to deserialize referenced value '{reference}' as expected type: {e}"
                        ))
                    })?;
                }
            }
        }
    }

    fn resolve_ref_value(&self, reference: &str) -> Result<Value> {
        let pointer = parse_local_ref(reference)?;
        match pointer {
            None => Ok(self.root.clone()),
            Some(ptr) => self.root.pointer(ptr).cloned().ok_or_else(|| {
                OpenApiToolsError::OpenApi(format!(
                    "Unresolved $ref '{reference}' (missing pointer '{ptr}')"
                ))
            }),
        }
    }
}

fn parse_local_ref(reference: &str) -> Result<Option<&str>> {
    let Some(frag) = reference.strip_prefix('#') else {
        return Err(OpenApiToolsError::OpenApi(format!(
            "External $ref is not supported: {reference}"
        )));
    };
    if frag.is_empty() {
        Ok(None)
    } else if frag.starts_with('/') {
        Ok(Some(frag))
    } else {
        Err(OpenApiToolsError::OpenApi(format!(
            "Unsupported $ref fragment (expected JSON pointer starting with '/'): {reference}",
        )))
    }
}
