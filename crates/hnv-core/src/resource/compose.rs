// ── Payload composition ──
//
// Kind-specific fixups applied to a raw payload before its fields are
// extracted. Children listed inside a parent payload usually omit their
// ancestor ids, so the parent stamps its own lineage onto them; some
// nested objects are always materialized, even when the controller
// leaves them out.

use serde_json::{Map, Value};

use super::{ResourceKind, ResourcePath};
use crate::model::PROPERTIES;

const RESOURCE_ID: &str = "resourceId";
const PARENT_ID: &str = "parentResourceID";
const GRANDPARENT_ID: &str = "grandParentResourceID";

/// Ids read from the payload being decoded.
struct Lineage {
    id: Option<Value>,
    parent: Option<Value>,
}

impl Lineage {
    fn of(raw: &Map<String, Value>) -> Self {
        Self {
            id: raw.get(RESOURCE_ID).filter(|v| !v.is_null()).cloned(),
            parent: raw.get(PARENT_ID).filter(|v| !v.is_null()).cloned(),
        }
    }
}

/// Nested objects of a network interface that always decode into models.
const INTERFACE_NESTED: [&str; 3] = ["dnsSettings", "portSettings", "configurationState"];

/// Nested objects of port settings that always decode into models.
const PORT_NESTED: [&str; 1] = ["qosSettings"];

/// Wire keys of nested objects that `kind` always carries, present in the
/// payload or not.
pub(crate) fn always_present(kind: ResourceKind) -> &'static [&'static str] {
    match kind {
        ResourceKind::NetworkInterface => &INTERFACE_NESTED,
        ResourceKind::PortSettings => &PORT_NESTED,
        _ => &[],
    }
}

/// Run the composition rule for `kind`, if it has one.
pub(crate) fn apply(kind: ResourceKind, raw: &mut Map<String, Value>) {
    let lineage = Lineage::of(raw);

    match kind {
        ResourceKind::LogicalNetwork | ResourceKind::VirtualNetwork => {
            stamp_children(raw, "subnets", lineage.id.as_ref(), None);
        }
        ResourceKind::LogicalSubnetwork => {
            stamp_children(raw, "ipPools", lineage.id.as_ref(), lineage.parent.as_ref());
        }
        ResourceKind::NetworkInterface => {
            stamp_children(raw, "ipConfigurations", lineage.id.as_ref(), None);
            if let Some(properties) = ensure_object(raw, PROPERTIES).as_object_mut() {
                for key in INTERFACE_NESTED {
                    ensure_object(properties, key);
                }
            }
        }
        ResourceKind::PortSettings => {
            for key in PORT_NESTED {
                ensure_object(raw, key);
            }
        }
        _ => {}
    }
}

/// Fill in ancestor ids a fetched payload left out from the path used to
/// address it.
pub(crate) fn adopt(raw: &mut Value, path: &ResourcePath) {
    let Some(raw) = raw.as_object_mut() else {
        return;
    };
    for (key, id) in [
        (PARENT_ID, path.parent_id.as_deref()),
        (GRANDPARENT_ID, path.grandparent_id.as_deref()),
    ] {
        if let Some(id) = id {
            let slot = raw.entry(key).or_insert(Value::Null);
            if slot.is_null() {
                *slot = Value::from(id);
            }
        }
    }
}

fn stamp_children(
    raw: &mut Map<String, Value>,
    key: &str,
    parent: Option<&Value>,
    grandparent: Option<&Value>,
) {
    let Some(Value::Array(children)) = raw
        .get_mut(PROPERTIES)
        .and_then(|properties| properties.get_mut(key))
    else {
        return;
    };

    for child in children.iter_mut().filter_map(Value::as_object_mut) {
        if let Some(id) = parent {
            child.insert(PARENT_ID.to_owned(), id.clone());
        }
        if let Some(id) = grandparent {
            child.insert(GRANDPARENT_ID.to_owned(), id.clone());
        }
    }
}

/// Make `target[key]` an object when it is absent or null.
fn ensure_object<'a>(target: &'a mut Map<String, Value>, key: &str) -> &'a mut Value {
    let slot = target.entry(key).or_insert(Value::Null);
    if slot.is_null() {
        *slot = Value::Object(Map::new());
    }
    slot
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[test]
    fn subnet_stamps_pools_with_two_generations() {
        let mut raw = object(json!({
            "resourceId": "sub1",
            "parentResourceID": "ln1",
            "properties": {"ipPools": [{"resourceId": "pool1"}]}
        }));
        apply(ResourceKind::LogicalSubnetwork, &mut raw);

        let pool = &raw["properties"]["ipPools"][0];
        assert_eq!(pool["parentResourceID"], "sub1");
        assert_eq!(pool["grandParentResourceID"], "ln1");
    }

    #[test]
    fn network_interface_materializes_nested_settings() {
        let mut raw = object(json!({"resourceId": "nic1"}));
        apply(ResourceKind::NetworkInterface, &mut raw);

        assert_eq!(raw["properties"]["dnsSettings"], json!({}));
        assert_eq!(raw["properties"]["portSettings"], json!({}));
        assert_eq!(raw["properties"]["configurationState"], json!({}));
    }

    #[test]
    fn existing_nested_settings_are_kept() {
        let mut raw = object(json!({
            "resourceId": "nic1",
            "properties": {"dnsSettings": {"dnsServers": ["10.0.0.2"]}}
        }));
        apply(ResourceKind::NetworkInterface, &mut raw);
        assert_eq!(raw["properties"]["dnsSettings"]["dnsServers"][0], "10.0.0.2");
    }

    #[test]
    fn port_settings_always_carry_qos() {
        let mut raw = object(json!({"macSpoofingEnabled": "Disabled"}));
        apply(ResourceKind::PortSettings, &mut raw);
        assert_eq!(raw["qosSettings"], json!({}));
    }

    #[test]
    fn adopt_fills_only_missing_ancestors() {
        let path = ResourcePath::id("pool1")
            .with_parent("sub1")
            .with_grandparent("ln1");

        let mut raw = json!({"resourceId": "pool1", "parentResourceID": "other"});
        adopt(&mut raw, &path);

        assert_eq!(raw["parentResourceID"], "other");
        assert_eq!(raw["grandParentResourceID"], "ln1");
    }

    #[test]
    fn kinds_without_rules_are_untouched() {
        let mut raw = object(json!({"dnsServers": []}));
        let before = raw.clone();
        apply(ResourceKind::DnsSettings, &mut raw);
        assert_eq!(raw, before);
    }
}
