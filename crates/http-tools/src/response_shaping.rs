//! Response shaping for successful JSON bodies.
//!
//! Transforms are declared per tool (see [`ResponseTransform`]) and compiled once when the tool
//! source is built. At call time they run in declaration order against the decoded body and the
//! tool's resolved arguments.

use crate::config::ResponseTransform;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value, json};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

#[derive(Debug, Clone)]
enum CompiledTransform {
    EpochToTimestamp {
        fields: HashSet<String>,
    },
    Envelope {
        field: String,
        count_field: Option<String>,
        echo: BTreeMap<String, String>,
        constants: Map<String, Value>,
    },
    EmptyArrayNote {
        field: String,
        note_field: String,
        note: Value,
    },
}

/// A compiled response shaping pipeline. Immutable after construction.
#[derive(Debug, Clone, Default)]
pub struct CompiledResponsePipeline {
    steps: Vec<CompiledTransform>,
}

/// Compile a pipeline from a tool's transform list.
///
/// # Errors
///
/// Returns an error if a transform names no fields or an empty target key.
pub fn compile_pipeline(
    transforms: &[ResponseTransform],
) -> Result<Arc<CompiledResponsePipeline>, String> {
    let mut steps = Vec::with_capacity(transforms.len());

    for t in transforms {
        match t {
            ResponseTransform::EpochToTimestamp { fields } => {
                if fields.is_empty() {
                    return Err("epochToTimestamp: fields must not be empty".to_string());
                }
                steps.push(CompiledTransform::EpochToTimestamp {
                    fields: fields.iter().cloned().collect(),
                });
            }
            ResponseTransform::Envelope {
                field,
                count_field,
                echo,
                constants,
            } => {
                if field.is_empty() {
                    return Err("envelope: field must not be empty".to_string());
                }
                steps.push(CompiledTransform::Envelope {
                    field: field.clone(),
                    count_field: count_field.clone(),
                    echo: echo.clone(),
                    constants: constants.clone(),
                });
            }
            ResponseTransform::EmptyArrayNote {
                field,
                note_field,
                note,
            } => {
                if field.is_empty() || note_field.is_empty() {
                    return Err("emptyArrayNote: field and noteField must not be empty".to_string());
                }
                steps.push(CompiledTransform::EmptyArrayNote {
                    field: field.clone(),
                    note_field: note_field.clone(),
                    note: note.clone(),
                });
            }
        }
    }

    Ok(Arc::new(CompiledResponsePipeline { steps }))
}

impl CompiledResponsePipeline {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Apply the pipeline in place. `args` are the call's resolved arguments.
    pub fn apply_to_value(&self, v: &mut Value, args: &Map<String, Value>) {
        for step in &self.steps {
            match step {
                CompiledTransform::EpochToTimestamp { fields } => {
                    epochs_to_timestamps_in_place(v, fields);
                }
                CompiledTransform::Envelope {
                    field,
                    count_field,
                    echo,
                    constants,
                } => {
                    let body = v.take();
                    let mut out = Map::new();
                    if let Some(count_field) = count_field {
                        let count = body.as_array().map_or(0, Vec::len);
                        out.insert(count_field.clone(), json!(count));
                    }
                    for (key, value) in constants {
                        out.insert(key.clone(), value.clone());
                    }
                    for (key, arg) in echo {
                        if let Some(value) = args.get(arg) {
                            out.insert(key.clone(), value.clone());
                        }
                    }
                    out.insert(field.clone(), body);
                    *v = Value::Object(out);
                }
                CompiledTransform::EmptyArrayNote {
                    field,
                    note_field,
                    note,
                } => {
                    let empty = v
                        .get(field)
                        .and_then(Value::as_array)
                        .is_some_and(Vec::is_empty);
                    if empty && let Some(obj) = v.as_object_mut() {
                        obj.insert(note_field.clone(), render_templates(note, args));
                    }
                }
            }
        }
    }
}

fn epochs_to_timestamps_in_place(v: &mut Value, fields: &HashSet<String>) {
    match v {
        Value::Object(map) => {
            for (key, child) in map.iter_mut() {
                if fields.contains(key)
                    && let Some(ts) = epoch_to_rfc3339(child)
                {
                    *child = Value::String(ts);
                } else {
                    epochs_to_timestamps_in_place(child, fields);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                epochs_to_timestamps_in_place(item, fields);
            }
        }
        _ => {}
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn epoch_to_rfc3339(v: &Value) -> Option<String> {
    let (secs, nanos) = if let Some(i) = v.as_i64() {
        (i, 0)
    } else {
        let f = v.as_f64().filter(|f| f.is_finite())?;
        // Floor so negative fractions land before the whole second, not after it.
        let whole = f.floor();
        (whole as i64, (((f - whole) * 1e9) as u32).min(999_999_999))
    };
    DateTime::<Utc>::from_timestamp(secs, nanos)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::AutoSi, true))
}

/// Substitute `{arg}` placeholders in every string of `template`.
#[must_use]
pub fn render_templates(template: &Value, args: &Map<String, Value>) -> Value {
    match template {
        Value::String(s) => Value::String(render_template(s, args)),
        Value::Array(items) => Value::Array(items.iter().map(|i| render_templates(i, args)).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), render_templates(v, args)))
                .collect(),
        ),
        other => other.clone(),
    }
}

#[must_use]
pub fn render_template(template: &str, args: &Map<String, Value>) -> String {
    let mut out = template.to_string();
    for (name, value) in args {
        let placeholder = format!("{{{name}}}");
        if out.contains(&placeholder) {
            let text = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            out = out.replace(&placeholder, &text);
        }
    }
    out
}
