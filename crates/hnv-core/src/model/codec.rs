// ── Wire codec ──
//
// decode: raw controller JSON -> finalized Model
// encode: Model -> request payload (validated first)
//
// Both directions are driven entirely by the kind's schema; no kind has
// hand-written (de)serialization. Kind-specific payload fixups live in
// `resource::compose` and run before field extraction.

use serde_json::{Map, Value};
use tracing::trace;

use super::{FieldDescriptor, FieldValue, Model, PROPERTIES, Placement, Shape, Slot};
use crate::error::CoreError;
use crate::resource::{ResourceKind, compose};

impl Model {
    /// Build a finalized model from a raw controller payload.
    ///
    /// Property fields are read from the `properties` object, everything
    /// else from the payload itself. Unrecognized keys are ignored. A
    /// required field that is absent and has no default fails decoding.
    pub fn decode(kind: ResourceKind, raw: Value) -> Result<Self, CoreError> {
        let Value::Object(mut raw) = raw else {
            return Err(CoreError::service(format!(
                "{kind} payload is not a JSON object"
            )));
        };

        compose::apply(kind, &mut raw);

        let mut properties = match raw.remove(PROPERTIES) {
            Some(Value::Object(properties)) => properties,
            _ => Map::new(),
        };

        let schema = kind.schema();
        let mut model = Model {
            schema,
            slots: indexmap::IndexMap::with_capacity(schema.fields().len()),
            finalized: false,
        };

        for field in schema.fields() {
            let source = match field.placement {
                Placement::TopLevel => &mut raw,
                Placement::Property => &mut properties,
            };
            let slot = match source.remove(field.key).filter(|v| !v.is_null()) {
                Some(value) => Some(Slot::assigned(decode_value(field, value)?)),
                None => absent_value(kind, field)?.map(Slot::defaulted),
            };
            if let Some(slot) = slot {
                model.slots.insert(field.name, slot);
            }
        }

        if !raw.is_empty() || !properties.is_empty() {
            trace!(
                %kind,
                ignored = raw.len() + properties.len(),
                "unrecognized keys in controller payload"
            );
        }

        model.finalize();
        Ok(model)
    }

    /// Check that every required field has a value or a default.
    ///
    /// Nested models are validated too.
    pub fn validate(&self) -> Result<(), CoreError> {
        for field in self.schema.fields() {
            match self.get(field.name) {
                None | Some(FieldValue::Scalar(Value::Null))
                    if field.required && field.default.is_none() =>
                {
                    return Err(CoreError::Validation {
                        kind: self.kind(),
                        field: field.name.into(),
                    });
                }
                Some(FieldValue::Model(nested)) => nested.validate()?,
                Some(FieldValue::Models(nested)) => {
                    for model in nested {
                        model.validate()?;
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Produce the wire payload for this model.
    ///
    /// Read-only fields are left out unless `include_read_only` is set;
    /// update requests never carry them. Null values and empty sequences
    /// are omitted, except that a required field with a default is always
    /// written. `properties` only appears when it has entries.
    pub fn encode(&self, include_read_only: bool) -> Result<Value, CoreError> {
        self.validate()?;
        Ok(self.to_wire(include_read_only))
    }

    /// Unvalidated wire form. Also backs model equality.
    pub(crate) fn to_wire(&self, include_read_only: bool) -> Value {
        let mut payload = Map::new();
        let mut properties = Map::new();

        for field in self.schema.fields() {
            if field.read_only && !include_read_only {
                continue;
            }
            let encoded = match self.get(field.name).filter(|v| !v.is_blank()) {
                Some(value) => encode_value(value, include_read_only),
                // A required field cleared to null falls back to its default.
                None => match field.default_value() {
                    Some(default) if field.required => default,
                    _ => continue,
                },
            };
            let target = match field.placement {
                Placement::TopLevel => &mut payload,
                Placement::Property => &mut properties,
            };
            target.insert(field.key.to_owned(), encoded);
        }

        if !properties.is_empty() {
            payload.insert(PROPERTIES.to_owned(), Value::Object(properties));
        }
        Value::Object(payload)
    }
}

fn decode_value(field: &FieldDescriptor, raw: Value) -> Result<FieldValue, CoreError> {
    match field.shape {
        Shape::Scalar => Ok(FieldValue::Scalar(raw)),
        Shape::One(kind) => Model::decode(kind, raw).map(FieldValue::from),
        Shape::Many(kind) => match raw {
            Value::Array(items) => items
                .into_iter()
                .map(|item| Model::decode(kind, item))
                .collect::<Result<Vec<_>, _>>()
                .map(FieldValue::Models),
            other => Err(CoreError::service(format!(
                "`{}` should be an array, got {other}",
                field.key
            ))),
        },
    }
}

/// Value for a field the payload left out.
fn absent_value(kind: ResourceKind, field: &FieldDescriptor) -> Result<Option<FieldValue>, CoreError> {
    if let Shape::Many(_) = field.shape {
        return Ok(Some(FieldValue::Models(Vec::new())));
    }
    if let Some(value) = field.default_value() {
        return Ok(Some(FieldValue::Scalar(value)));
    }
    if field.required {
        return Err(CoreError::Validation {
            kind,
            field: field.name.into(),
        });
    }
    Ok(None)
}

fn encode_value(value: &FieldValue, include_read_only: bool) -> Value {
    match value {
        FieldValue::Scalar(v) => v.clone(),
        FieldValue::Model(model) => model.to_wire(include_read_only),
        FieldValue::Models(models) => Value::Array(
            models
                .iter()
                .map(|model| model.to_wire(include_read_only))
                .collect(),
        ),
    }
}
