//! Tool synthesis: one [`ToolSpec`] per discovered `OpenAPI` operation.
//!
//! [`synthesize`] is pure. The same document and config always yield the same tools in the same
//! order, so a client sees stable names across restarts.

use crate::config::OpenApiSourceConfig;
use crate::error::{OpenApiToolsError, Result};
use crate::resolver::OpenApiResolver;
use openapiv3::{
    OpenAPI, Operation, Parameter, ParameterData, ParameterSchemaOrContent, PathItem, ReferenceOr, RequestBody,
    Schema, SchemaKind, Type,
};
use sauce_mcp_http_tools::config::{ParamLocation, ParamSpec, ToolSpec};
use serde_json::{Value, json};
use std::collections::{HashMap, HashSet};

const MAX_TOOL_NAME_LEN: usize = 64;

/// Build tool specs for every operation that passes the config's filters.
///
/// # Errors
///
/// Fails on the first problem: an unresolvable or cyclic `$ref`, a cookie parameter, a parameter
/// given as `content`, a request body without a JSON schema, a parameter name collision, or a
/// document with no operations left after filtering.
pub fn synthesize(spec: &OpenAPI, config: &OpenApiSourceConfig) -> Result<Vec<ToolSpec>> {
    let resolver = OpenApiResolver::new(spec)?;
    let prefix = server_path_prefix(spec);
    let mut names: HashSet<String> = HashSet::new();
    let mut tools = Vec::new();

    for (path, item) in &spec.paths.paths {
        let path_item = resolver.resolve_path_item(item)?;

        for (method, op) in operations(&path_item) {
            if !config.should_discover(method, path) {
                continue;
            }

            let base = op
                .operation_id
                .as_deref()
                .map_or_else(|| canonical_name(method, path), snake_case);
            let name = reserve_unique_tool_name(&mut names, &base);
            let full_path = format!("{prefix}{path}");

            let mut tool = ToolSpec::new(
                &method.to_uppercase(),
                name,
                full_path.clone(),
                tool_description(op, method, &full_path),
            );
            for param in collect_params(&resolver, &path_item, op, method, path)? {
                tool = tool.param(param);
            }
            tools.push(tool);
        }
    }

    if tools.is_empty() {
        return Err(OpenApiToolsError::OpenApi(
            "document defines no usable operations".to_string(),
        ));
    }

    Ok(tools)
}

/// Operations of a path item in a fixed method order.
fn operations(item: &PathItem) -> Vec<(&'static str, &Operation)> {
    [
        ("get", &item.get),
        ("put", &item.put),
        ("post", &item.post),
        ("delete", &item.delete),
        ("options", &item.options),
        ("head", &item.head),
        ("patch", &item.patch),
    ]
    .into_iter()
    .filter_map(|(m, op)| op.as_ref().map(|op| (m, op)))
    .collect()
}

/// Path component of the first `servers` entry, e.g. `/rdc/v2`. Empty when there is none.
fn server_path_prefix(spec: &OpenAPI) -> String {
    let Some(server) = spec.servers.first() else {
        return String::new();
    };

    let mut url = server.url.clone();
    if let Some(vars) = &server.variables {
        for (name, var) in vars {
            url = url.replace(&format!("{{{name}}}"), &var.default);
        }
    }

    let path = match url::Url::parse(&url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) if url.starts_with('/') => url,
        Err(_) => String::new(),
    };
    path.trim_end_matches('/').to_string()
}

fn tool_description(op: &Operation, method: &str, path: &str) -> String {
    op.summary
        .clone()
        .or_else(|| op.description.clone())
        .unwrap_or_else(|| format!("Calls {} {}", method.to_uppercase(), path))
}

fn collect_params(
    resolver: &OpenApiResolver,
    path_item: &PathItem,
    op: &Operation,
    method: &str,
    path: &str,
) -> Result<Vec<ParamSpec>> {
    let mut params = Vec::new();
    let mut names: HashSet<String> = HashSet::new();

    for param in merge_parameters(resolver, &path_item.parameters, &op.parameters)? {
        let spec = extract_parameter(resolver, &param, path)?;
        if !names.insert(spec.name.clone()) {
            return Err(OpenApiToolsError::ParamCollision(format!(
                "Parameter '{}' appears multiple times in {} {path}",
                spec.name,
                method.to_uppercase(),
            )));
        }
        params.push(spec);
    }

    if let Some(body_ref) = &op.request_body {
        let body = resolver.resolve_request_body(body_ref)?;
        for spec in extract_body_params(resolver, &body)? {
            if !names.insert(spec.name.clone()) {
                return Err(OpenApiToolsError::ParamCollision(format!(
                    "Body parameter '{}' collides with a path/query parameter in {} {path}",
                    spec.name,
                    method.to_uppercase(),
                )));
            }
            params.push(spec);
        }
    }

    Ok(params)
}

/// Path-item parameters first; operation parameters replace same (location, name) entries.
fn merge_parameters(
    resolver: &OpenApiResolver,
    path_item_params: &[ReferenceOr<Parameter>],
    operation_params: &[ReferenceOr<Parameter>],
) -> Result<Vec<Parameter>> {
    fn key_for(p: &Parameter) -> (&'static str, String) {
        let loc = match p {
            Parameter::Path { .. } => "path",
            Parameter::Query { .. } => "query",
            Parameter::Header { .. } => "header",
            Parameter::Cookie { .. } => "cookie",
        };
        (loc, p.parameter_data_ref().name.clone())
    }

    let mut merged: Vec<Parameter> = Vec::new();
    let mut index: HashMap<(&'static str, String), usize> = HashMap::new();

    for p in path_item_params.iter().chain(operation_params) {
        let rp = resolver.resolve_parameter(p)?;
        let k = key_for(&rp);
        if let Some(i) = index.get(&k).copied() {
            merged[i] = rp;
        } else {
            index.insert(k, merged.len());
            merged.push(rp);
        }
    }

    Ok(merged)
}

fn extract_parameter(resolver: &OpenApiResolver, param: &Parameter, path: &str) -> Result<ParamSpec> {
    let location = match param {
        Parameter::Path { .. } => ParamLocation::Path,
        Parameter::Query { .. } => ParamLocation::Query,
        Parameter::Header { .. } => ParamLocation::Header,
        Parameter::Cookie { parameter_data, .. } => {
            return Err(OpenApiToolsError::OpenApi(format!(
                "Cookie parameter '{}' is not supported",
                parameter_data.name
            )));
        }
    };
    let data = param.parameter_data_ref();

    let schema = match &data.format {
        ParameterSchemaOrContent::Schema(s) => schema_to_json(resolver, &resolver.resolve_schema(s)?),
        ParameterSchemaOrContent::Content(_) => {
            return Err(OpenApiToolsError::OpenApi(format!(
                "Parameter '{}' uses 'content', which is not supported",
                data.name
            )));
        }
    };

    let mut spec = ParamSpec::new(location, data.name.clone()).schema(schema);
    spec.required = Some(location == ParamLocation::Path || data.required);
    spec.description = data.description.clone();
    spec.allow_reserved = location == ParamLocation::Path && is_catch_all(path, data);
    Ok(spec)
}

/// A placeholder filling the final path segment that names a path of its own, e.g.
/// `{targetPath}`, or that carries `x-allow-reserved: true`.
fn is_catch_all(path: &str, data: &ParameterData) -> bool {
    let trailing = path
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .is_some_and(|seg| seg == format!("{{{}}}", data.name));
    let flagged = data
        .extensions
        .get("x-allow-reserved")
        .and_then(Value::as_bool);
    trailing && flagged.unwrap_or_else(|| data.name.to_ascii_lowercase().ends_with("path"))
}

/// JSON object bodies become one argument per property; any other JSON body is one `body`
/// argument.
fn extract_body_params(resolver: &OpenApiResolver, body: &RequestBody) -> Result<Vec<ParamSpec>> {
    let media = body
        .content
        .get("application/json")
        .or_else(|| {
            body.content
                .iter()
                .find(|(k, _)| k.to_ascii_lowercase().contains("json"))
                .map(|(_, v)| v)
        })
        .ok_or_else(|| {
            let types: Vec<&str> = body.content.keys().map(String::as_str).collect();
            OpenApiToolsError::OpenApi(format!(
                "request body without a JSON media type is not supported ({})",
                types.join(", ")
            ))
        })?;

    let Some(schema_ref) = &media.schema else {
        return Ok(Vec::new());
    };
    let schema = resolver.resolve_schema(schema_ref)?;

    let SchemaKind::Type(Type::Object(obj)) = &schema.schema_kind else {
        let mut spec = ParamSpec::body("body").schema(schema_to_json(resolver, &schema));
        spec.required = Some(body.required);
        return Ok(vec![spec]);
    };

    let mut params = Vec::with_capacity(obj.properties.len());
    for (prop_name, prop_schema) in &obj.properties {
        let prop = resolver.resolve_boxed_schema(prop_schema)?;
        let mut spec = ParamSpec::body(prop_name.clone()).schema(schema_to_json(resolver, &prop));
        spec.required = Some(body.required && obj.required.contains(prop_name));
        params.push(spec);
    }
    Ok(params)
}

/// Convert an `OpenAPI` schema into the JSON Schema fragment used in tool input schemas.
///
/// Nested `$ref`s are inlined one level deep; deeper ones are kept as `$ref`s.
fn schema_to_json(resolver: &OpenApiResolver, schema: &Schema) -> Value {
    convert_schema(resolver, schema, 0)
}

fn convert_schema(resolver: &OpenApiResolver, schema: &Schema, depth: usize) -> Value {
    let mut result = json!({});

    if let Some(desc) = &schema.schema_data.description {
        result["description"] = json!(desc);
    }
    if let Some(default) = &schema.schema_data.default {
        result["default"] = default.clone();
    }

    let nested = |s: &ReferenceOr<Box<Schema>>| -> Value {
        match s {
            ReferenceOr::Item(item) => convert_schema(resolver, item, depth + 1),
            ReferenceOr::Reference { reference } if depth > 0 => json!({"$ref": reference}),
            ReferenceOr::Reference { reference } => resolver
                .resolve_boxed_schema(s)
                .map_or_else(|_| json!({"$ref": reference}), |r| convert_schema(resolver, &r, depth + 1)),
        }
    };

    match &schema.schema_kind {
        SchemaKind::Type(t) => match t {
            Type::String(s) => {
                result["type"] = json!("string");
                let enum_values: Vec<&String> = s.enumeration.iter().flatten().collect();
                if !enum_values.is_empty() {
                    result["enum"] = json!(enum_values);
                }
            }
            Type::Number(_) => result["type"] = json!("number"),
            Type::Integer(i) => {
                result["type"] = json!("integer");
                let enum_values: Vec<i64> = i.enumeration.iter().flatten().copied().collect();
                if !enum_values.is_empty() {
                    result["enum"] = json!(enum_values);
                }
            }
            Type::Boolean(_) => result["type"] = json!("boolean"),
            Type::Array(a) => {
                result["type"] = json!("array");
                if let Some(items) = &a.items {
                    result["items"] = nested(items);
                }
            }
            Type::Object(o) => {
                result["type"] = json!("object");
                if !o.properties.is_empty() {
                    let properties: serde_json::Map<String, Value> = o
                        .properties
                        .iter()
                        .map(|(name, prop)| (name.clone(), nested(prop)))
                        .collect();
                    result["properties"] = Value::Object(properties);
                }
                if !o.required.is_empty() {
                    result["required"] = json!(o.required);
                }
            }
        },
        // Composite schemas (oneOf/allOf/anyOf/not/any) stay untyped.
        _ => {}
    }

    result
}

/// `listDeviceStatus` -> `list_device_status`, `getHTTPLogs` -> `get_http_logs`.
#[must_use]
pub fn snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if !c.is_ascii_alphanumeric() {
            out.push('_');
            continue;
        }
        if c.is_ascii_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_lower = chars.get(i + 1).is_some_and(char::is_ascii_lowercase);
            if prev.is_ascii_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_ascii_uppercase() && next_lower)
            {
                out.push('_');
            }
        }
        out.push(c.to_ascii_lowercase());
    }

    collapse_underscores(&out)
}

/// Name for operations without an `operationId`, e.g. `get /sessions/{sessionId}` ->
/// `get_sessions_sessionid`.
fn canonical_name(method: &str, path: &str) -> String {
    let raw: String = format!("{method}_{path}")
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    collapse_underscores(&raw)
}

fn collapse_underscores(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c == '_' && (out.is_empty() || out.ends_with('_')) {
            continue;
        }
        out.push(c);
    }
    let mut out = out.trim_end_matches('_').to_string();
    out.truncate(MAX_TOOL_NAME_LEN);
    out
}

fn reserve_unique_tool_name(tool_names: &mut HashSet<String>, base: &str) -> String {
    if tool_names.insert(base.to_string()) {
        return base.to_string();
    }

    let mut counter = 2;
    loop {
        let candidate = format!("{base}_{counter}");
        if tool_names.insert(candidate.clone()) {
            return candidate;
        }
        counter += 1;
    }
}
