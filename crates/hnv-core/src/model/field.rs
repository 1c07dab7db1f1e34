// ── Field descriptors ──
//
// One descriptor per named attribute of a resource kind. Descriptors are
// plain data built once per kind (see `resource::schema`) and shared by
// every instance of that kind.

use serde_json::Value;

use crate::resource::ResourceKind;

/// Where a field lives in the wire payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Directly on the payload object (`resourceId`, `etag`, ...).
    TopLevel,
    /// Inside the payload's `properties` object.
    Property,
}

/// What a field's value decodes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// Raw JSON value, kept as-is.
    Scalar,
    /// A nested model of the given kind.
    One(ResourceKind),
    /// A sequence of nested models of the given kind.
    Many(ResourceKind),
}

/// Supplies a value for a field absent from the payload or the caller.
pub type DefaultFactory = fn() -> Value;

/// Serialization metadata for one field of a resource kind.
#[derive(Debug, Clone, Copy)]
pub struct FieldDescriptor {
    /// Client-side field name (`resource_id`).
    pub name: &'static str,
    /// Wire key (`resourceId`). Unique within a schema.
    pub key: &'static str,
    pub placement: Placement,
    pub shape: Shape,
    pub required: bool,
    /// Server-owned; left out of update requests.
    pub read_only: bool,
    /// Immutable once assigned.
    pub is_static: bool,
    pub default: Option<DefaultFactory>,
}

impl FieldDescriptor {
    const fn new(name: &'static str, key: &'static str, placement: Placement) -> Self {
        Self {
            name,
            key,
            placement,
            shape: Shape::Scalar,
            required: false,
            read_only: false,
            is_static: false,
            default: None,
        }
    }

    /// A field stored on the payload object itself.
    pub const fn top_level(name: &'static str, key: &'static str) -> Self {
        Self::new(name, key, Placement::TopLevel)
    }

    /// A field stored inside the payload's `properties` object.
    pub const fn property(name: &'static str, key: &'static str) -> Self {
        Self::new(name, key, Placement::Property)
    }

    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub const fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub const fn fixed(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub const fn with_default(mut self, factory: DefaultFactory) -> Self {
        self.default = Some(factory);
        self
    }

    /// The value decodes into a nested model of `kind`.
    pub const fn one(mut self, kind: ResourceKind) -> Self {
        self.shape = Shape::One(kind);
        self
    }

    /// The value decodes into a sequence of models of `kind`.
    pub const fn many(mut self, kind: ResourceKind) -> Self {
        self.shape = Shape::Many(kind);
        self
    }

    /// Produce this field's default value, if it has one.
    pub fn default_value(&self) -> Option<Value> {
        self.default.map(|factory| factory())
    }
}

// ── Default factories ────────────────────────────────────────────────

/// A fresh random resource identifier.
pub fn random_id() -> Value {
    Value::String(uuid::Uuid::new_v4().to_string())
}

pub fn zero() -> Value {
    Value::from(0)
}

pub fn yes() -> Value {
    Value::Bool(true)
}

pub fn no() -> Value {
    Value::Bool(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    const VLAN: FieldDescriptor = FieldDescriptor::property("vlan_id", "vlanID")
        .required()
        .with_default(zero);

    #[test]
    fn builder_sets_flags() {
        assert_eq!(VLAN.placement, Placement::Property);
        assert_eq!(VLAN.shape, Shape::Scalar);
        assert!(VLAN.required);
        assert!(!VLAN.read_only);
        assert!(!VLAN.is_static);
        assert_eq!(VLAN.default_value(), Some(Value::from(0)));
    }

    #[test]
    fn nested_shapes() {
        let subnets = FieldDescriptor::property("subnets", "subnets")
            .many(ResourceKind::VirtualSubnetwork);
        assert_eq!(subnets.shape, Shape::Many(ResourceKind::VirtualSubnetwork));
        assert!(subnets.default_value().is_none());
    }

    #[test]
    fn random_ids_differ() {
        assert_ne!(random_id(), random_id());
        assert!(random_id().as_str().is_some());
    }
}
