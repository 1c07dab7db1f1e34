// ── Schema-driven resource model ──
//
// A `Model` is an ordered set of field values interpreted through the
// shared, read-only `Schema` of its resource kind. The codec (decode,
// encode, validate) lives in `codec.rs`; this module owns the value
// storage and the mutation rules.

mod codec;
mod field;
mod value;

use indexmap::IndexMap;

pub use field::{DefaultFactory, FieldDescriptor, Placement, Shape};
pub use value::FieldValue;

pub(crate) use field::{no, random_id, yes, zero};

use crate::error::CoreError;
use crate::resource::{ProvisioningState, ResourceKind, ResourcePath, Schema, compose};

/// Wire key of the object holding property-placed fields.
pub(crate) const PROPERTIES: &str = "properties";

#[derive(Debug, Clone)]
struct Slot {
    value: FieldValue,
    /// Set by the caller or decoded from the controller (as opposed to
    /// filled in from the field's default). Static fields lock once assigned.
    assigned: bool,
}

impl Slot {
    fn assigned(value: FieldValue) -> Self {
        Self {
            value,
            assigned: true,
        }
    }

    fn defaulted(value: FieldValue) -> Self {
        Self {
            value,
            assigned: false,
        }
    }
}

/// A typed resource object: one value per field of its kind's schema.
///
/// Models come from two places:
///
/// - [`Model::decode`] builds a **finalized** snapshot of controller state.
///   Finalized models reject [`set`](Model::set) until the caller opts into
///   editing with [`thaw`](Model::thaw).
/// - [`Model::new`] builds an unfinalized model for a resource that does not
///   exist yet; defaults are filled in and required fields are checked when
///   it is encoded.
///
/// Equality compares the wire form of all non-read-only fields, so
/// `fetched != edited` means there are edits pending a commit.
#[derive(Debug, Clone)]
pub struct Model {
    schema: &'static Schema,
    slots: IndexMap<&'static str, Slot>,
    finalized: bool,
}

impl Model {
    /// A fresh, unfinalized model with every default applied.
    pub fn new(kind: ResourceKind) -> Self {
        let schema = kind.schema();
        let slots = schema
            .fields()
            .iter()
            .filter_map(|field| {
                initial_value(kind, field).map(|v| (field.name, Slot::defaulted(v)))
            })
            .collect();

        Self {
            schema,
            slots,
            finalized: false,
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.schema.kind()
    }

    pub fn schema(&self) -> &'static Schema {
        self.schema
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Unlock a finalized snapshot so the caller can stage edits.
    ///
    /// The next successful commit finalizes the model again.
    pub fn thaw(&mut self) {
        self.finalized = false;
    }

    // ── Field access ─────────────────────────────────────────────────

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.slots.get(name).map(|slot| &slot.value)
    }

    /// String value of a scalar field.
    pub fn str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(FieldValue::as_str)
    }

    /// Iterate over the fields that currently hold a value, in schema order.
    pub fn fields(&self) -> impl Iterator<Item = (&'static str, &FieldValue)> + '_ {
        self.schema
            .fields()
            .iter()
            .filter_map(|field| self.get(field.name).map(|value| (field.name, value)))
    }

    /// Assign a field through the public mutation path.
    ///
    /// Rejected on a finalized model, for an unknown field, for a value whose
    /// shape does not match the descriptor, and for a distinct value on a
    /// static field that already holds an assigned value.
    pub fn set(&mut self, name: &str, value: impl Into<FieldValue>) -> Result<(), CoreError> {
        let field = self.descriptor(name)?;
        let value = value.into();

        if self.finalized {
            return Err(CoreError::Finalized {
                field: field.name.into(),
            });
        }
        check_shape(field, &value)?;
        if field.is_static {
            if let Some(current) = self.slots.get(field.name) {
                if current.assigned && current.value != value {
                    return Err(CoreError::StaticField {
                        field: field.name.into(),
                    });
                }
            }
        }

        self.slots.insert(field.name, Slot::assigned(value));
        Ok(())
    }

    /// Builder form of [`set`](Model::set).
    pub fn with(mut self, name: &str, value: impl Into<FieldValue>) -> Result<Self, CoreError> {
        self.set(name, value)?;
        Ok(self)
    }

    /// Reset a field to its default, or remove its value when it has none.
    pub fn clear(&mut self, name: &str) -> Result<(), CoreError> {
        let field = self.descriptor(name)?;
        if self.finalized {
            return Err(CoreError::Finalized {
                field: field.name.into(),
            });
        }
        if field.is_static && self.slots.get(field.name).is_some_and(|slot| slot.assigned) {
            return Err(CoreError::StaticField {
                field: field.name.into(),
            });
        }

        match initial_value(self.kind(), field) {
            Some(value) => {
                self.slots.insert(field.name, Slot::defaulted(value));
            }
            None => {
                self.slots.shift_remove(field.name);
            }
        }
        Ok(())
    }

    fn descriptor(&self, name: &str) -> Result<&'static FieldDescriptor, CoreError> {
        self.schema
            .field(name)
            .ok_or_else(|| CoreError::UnknownField {
                kind: self.kind(),
                field: name.into(),
            })
    }

    // ── Lifecycle internals ──────────────────────────────────────────

    pub(crate) fn finalize(&mut self) {
        self.finalized = true;
    }

    /// Replace every field with a freshly decoded snapshot and re-finalize.
    ///
    /// This is the lifecycle's update path; it bypasses the per-field rules
    /// because the snapshot is authoritative controller state.
    pub(crate) fn replace_with(&mut self, snapshot: Model) {
        debug_assert_eq!(self.kind(), snapshot.kind());
        self.slots = snapshot.slots;
        self.finalize();
    }

    // ── Managed-resource accessors ───────────────────────────────────

    pub fn resource_id(&self) -> Option<&str> {
        self.str("resource_id")
    }

    pub fn parent_id(&self) -> Option<&str> {
        self.str("parent_id")
    }

    pub fn grandparent_id(&self) -> Option<&str> {
        self.str("grandparent_id")
    }

    pub fn etag(&self) -> Option<&str> {
        self.str("etag")
    }

    pub fn resource_ref(&self) -> Option<&str> {
        self.str("resource_ref")
    }

    /// Last provisioning state reported by the controller.
    pub fn provisioning_state(&self) -> Option<ProvisioningState> {
        self.str("provisioning_state")?.parse().ok()
    }

    /// Identifiers addressing this resource and its ancestors.
    pub fn resource_path(&self) -> ResourcePath {
        ResourcePath {
            resource_id: self.resource_id().map(str::to_owned),
            parent_id: self.parent_id().map(str::to_owned),
            grandparent_id: self.grandparent_id().map(str::to_owned),
        }
    }
}

impl PartialEq for Model {
    fn eq(&self, other: &Self) -> bool {
        self.kind() == other.kind() && self.to_wire(false) == other.to_wire(false)
    }
}

/// Value a field starts with before anything is assigned. Matches what
/// decoding an empty payload of `kind` would produce.
fn initial_value(kind: ResourceKind, field: &FieldDescriptor) -> Option<FieldValue> {
    match field.shape {
        Shape::Many(_) => Some(FieldValue::Models(Vec::new())),
        Shape::One(nested) if compose::always_present(kind).contains(&field.key) => {
            Some(FieldValue::from(Model::new(nested)))
        }
        Shape::Scalar | Shape::One(_) => field.default_value().map(FieldValue::Scalar),
    }
}

fn check_shape(field: &FieldDescriptor, value: &FieldValue) -> Result<(), CoreError> {
    let matches = match (field.shape, value) {
        (Shape::Scalar, FieldValue::Scalar(_)) => true,
        (Shape::One(kind), FieldValue::Model(m)) => m.kind() == kind,
        (Shape::Many(kind), FieldValue::Models(ms)) => ms.iter().all(|m| m.kind() == kind),
        _ => false,
    };
    if matches {
        return Ok(());
    }

    let expected = match field.shape {
        Shape::Scalar => "a plain value".to_owned(),
        Shape::One(kind) => format!("a {kind} model"),
        Shape::Many(kind) => format!("a list of {kind} models"),
    };
    Err(CoreError::InvalidField {
        field: field.name.into(),
        reason: format!("expected {expected}"),
    })
}
