// ── Per-kind field tables ──
//
// Built lazily, once per kind, and shared by every model of that kind.

use std::sync::LazyLock;

use super::{Ancestry, ResourceKind};
use crate::model::{FieldDescriptor as F, no, random_id, yes, zero};

/// Ordered field descriptors for one resource kind.
#[derive(Debug)]
pub struct Schema {
    kind: ResourceKind,
    fields: Vec<F>,
}

impl Schema {
    fn plain(kind: ResourceKind, fields: impl IntoIterator<Item = F>) -> Self {
        Self {
            kind,
            fields: fields.into_iter().collect(),
        }
    }

    /// Managed kinds share the identity and bookkeeping fields; ancestor ids
    /// become required as the kind sits deeper in the tree.
    fn managed(kind: ResourceKind, ancestry: Ancestry, own: impl IntoIterator<Item = F>) -> Self {
        let mut parent = F::top_level("parent_id", "parentResourceID").read_only();
        let mut grandparent = F::top_level("grandparent_id", "grandParentResourceID").read_only();
        if matches!(ancestry, Ancestry::Child | Ancestry::Grandchild) {
            parent = parent.required();
        }
        if ancestry == Ancestry::Grandchild {
            grandparent = grandparent.required();
        }

        let base = [
            F::top_level("resource_ref", "resourceRef"),
            F::top_level("resource_id", "resourceId").with_default(random_id),
            parent,
            grandparent,
            F::top_level("operation_id", "operation-id").read_only(),
            F::top_level("instance_id", "instanceId"),
            F::top_level("resource_metadata", "resourceMetadata").one(ResourceKind::ResourceMetadata),
            F::top_level("etag", "etag"),
            F::top_level("tags", "tags"),
            F::property("provisioning_state", "provisioningState").read_only(),
        ];

        Self::plain(kind, base.into_iter().chain(own))
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn fields(&self) -> &[F] {
        &self.fields
    }

    /// Look up a descriptor by client-side field name.
    pub fn field(&self, name: &str) -> Option<&F> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Look up a descriptor by wire key.
    pub fn field_by_key(&self, key: &str) -> Option<&F> {
        self.fields.iter().find(|f| f.key == key)
    }
}

pub(super) fn for_kind(kind: ResourceKind) -> &'static Schema {
    LazyLock::force(match kind {
        ResourceKind::Reference => &REFERENCE,
        ResourceKind::ResourceMetadata => &RESOURCE_METADATA,
        ResourceKind::IpPool => &IP_POOL,
        ResourceKind::LogicalSubnetwork => &LOGICAL_SUBNETWORK,
        ResourceKind::LogicalNetwork => &LOGICAL_NETWORK,
        ResourceKind::IpConfiguration => &IP_CONFIGURATION,
        ResourceKind::DnsSettings => &DNS_SETTINGS,
        ResourceKind::QosSettings => &QOS_SETTINGS,
        ResourceKind::PortSettings => &PORT_SETTINGS,
        ResourceKind::ConfigurationState => &CONFIGURATION_STATE,
        ResourceKind::NetworkInterface => &NETWORK_INTERFACE,
        ResourceKind::VirtualSubnetwork => &VIRTUAL_SUBNETWORK,
        ResourceKind::VirtualNetwork => &VIRTUAL_NETWORK,
    })
}

// ── Nested-only kinds ────────────────────────────────────────────────

static REFERENCE: LazyLock<Schema> = LazyLock::new(|| {
    Schema::plain(
        ResourceKind::Reference,
        [F::top_level("resource_ref", "resourceRef").required()],
    )
});

static RESOURCE_METADATA: LazyLock<Schema> = LazyLock::new(|| {
    Schema::plain(
        ResourceKind::ResourceMetadata,
        [
            F::top_level("client", "client"),
            F::top_level("tenant_id", "tenantId"),
            F::top_level("group_id", "groupId"),
            F::top_level("resource_name", "name"),
            F::top_level("original_href", "originalHref"),
        ],
    )
});

static DNS_SETTINGS: LazyLock<Schema> = LazyLock::new(|| {
    Schema::plain(
        ResourceKind::DnsSettings,
        [F::top_level("dns_servers", "dnsServers")],
    )
});

/// `outboundReservedMode` is `absolute` (value in Mbps) or `weight`.
static QOS_SETTINGS: LazyLock<Schema> = LazyLock::new(|| {
    Schema::plain(
        ResourceKind::QosSettings,
        [
            F::top_level("outbound_reserved_mode", "outboundReservedMode"),
            F::top_level("outbound_reserved_value", "outboundReservedValue"),
            F::top_level("outbound_maximum_mbps", "outboundMaximumMbps"),
            F::top_level("inbound_maximum_mbps", "inboundMaximumMbps"),
        ],
    )
});

static PORT_SETTINGS: LazyLock<Schema> = LazyLock::new(|| {
    Schema::plain(
        ResourceKind::PortSettings,
        [
            F::top_level("mac_spoofing", "macSpoofingEnabled"),
            F::top_level("arp_guard", "arpGuardEnabled"),
            F::top_level("dhcp_guard", "dhcpGuardEnabled"),
            F::top_level("storm_limit", "stormLimit"),
            F::top_level("port_flow_limit", "portFlowLimit"),
            F::top_level("vmq_weight", "vmqWeight"),
            F::top_level("iov_weight", "iovWeight"),
            F::top_level("iov_interrupt_moderation", "iovInterruptModeration"),
            F::top_level("iov_queue_pairs", "iovQueuePairsRequested"),
            F::top_level("qos_settings", "qosSettings").one(ResourceKind::QosSettings),
        ],
    )
});

static CONFIGURATION_STATE: LazyLock<Schema> = LazyLock::new(|| {
    Schema::plain(
        ResourceKind::ConfigurationState,
        [
            F::top_level("uuid", "id"),
            F::top_level("status", "status"),
            F::top_level("last_update", "lastUpdatedTime"),
            F::top_level("detailed_info", "detailedInfo"),
            F::top_level("interface_errors", "virtualNetworkInterfaceErrors"),
            F::top_level("host_errors", "hostErrors"),
        ],
    )
});

// ── Logical networks ─────────────────────────────────────────────────

static LOGICAL_NETWORK: LazyLock<Schema> = LazyLock::new(|| {
    Schema::managed(
        ResourceKind::LogicalNetwork,
        Ancestry::Root,
        [
            F::property("subnets", "subnets").many(ResourceKind::LogicalSubnetwork),
            F::property("network_virtualization_enabled", "networkVirtualizationEnabled")
                .with_default(no),
            F::property("virtual_networks", "virtualNetworks")
                .many(ResourceKind::Reference)
                .read_only(),
        ],
    )
});

/// A subnet/VLAN pair. The VLAN is required but may be zero.
static LOGICAL_SUBNETWORK: LazyLock<Schema> = LazyLock::new(|| {
    Schema::managed(
        ResourceKind::LogicalSubnetwork,
        Ancestry::Child,
        [
            F::property("address_prefix", "addressPrefix"),
            F::property("vlan_id", "vlanID").required().with_default(zero),
            F::property("routes", "routes"),
            F::property("ip_pools", "ipPools").many(ResourceKind::IpPool),
            F::property("dns_servers", "dnsServers"),
            F::property("ip_configurations", "ipConfigurations").many(ResourceKind::Reference),
            F::property("network_interfaces", "networkInterfaces")
                .many(ResourceKind::Reference)
                .read_only(),
            F::property("is_public", "isPublic"),
            F::property("default_gateways", "defaultGateways"),
            F::property("gateway_pools", "gatewayPools").read_only(),
        ],
    )
});

static IP_POOL: LazyLock<Schema> = LazyLock::new(|| {
    Schema::managed(
        ResourceKind::IpPool,
        Ancestry::Grandchild,
        [
            F::property("start_ip_address", "startIpAddress").required(),
            F::property("end_ip_address", "endIpAddress").required(),
            F::property("usage", "usage").read_only(),
        ],
    )
});

// ── Network interfaces ───────────────────────────────────────────────

static NETWORK_INTERFACE: LazyLock<Schema> = LazyLock::new(|| {
    Schema::managed(
        ResourceKind::NetworkInterface,
        Ancestry::Root,
        [
            F::property("configuration_state", "configurationState")
                .one(ResourceKind::ConfigurationState)
                .read_only(),
            F::property("dns_settings", "dnsSettings").one(ResourceKind::DnsSettings),
            F::property("ip_configurations", "ipConfigurations")
                .many(ResourceKind::IpConfiguration),
            F::property("is_host", "isHostVirtualNetworkInterface"),
            F::property("is_primary", "isPrimary").with_default(yes).fixed(),
            F::property("is_multitenant_stack", "isMultitenantStack").with_default(no),
            F::property("internal_dns_name", "internalDnsNameLabel"),
            F::property("server", "server").one(ResourceKind::Reference).read_only(),
            F::property("port_settings", "portSettings").one(ResourceKind::PortSettings),
            F::property("mac_address", "privateMacAddress"),
            F::property("mac_allocation_method", "privateMacAllocationMethod"),
            F::property("service_insertion_elements", "serviceInsertionElements").read_only(),
        ],
    )
});

static IP_CONFIGURATION: LazyLock<Schema> = LazyLock::new(|| {
    Schema::managed(
        ResourceKind::IpConfiguration,
        Ancestry::Child,
        [
            F::property("access_control_list", "accessControlList"),
            F::property("backend_address_pools", "loadBalancerBackendAddressPools").read_only(),
            F::property("inbound_nat_rules", "loadBalancerInboundNatRules"),
            F::property("private_ip_address", "privateIPAddress"),
            F::property("private_ip_allocation_method", "privateIPAllocationMethod"),
            F::property("public_ip_address", "publicIPAddress"),
            F::property("service_insertion", "serviceInsertion"),
            F::property("subnet", "subnet").one(ResourceKind::Reference).read_only(),
        ],
    )
});

// ── Virtual networks ─────────────────────────────────────────────────

static VIRTUAL_NETWORK: LazyLock<Schema> = LazyLock::new(|| {
    Schema::managed(
        ResourceKind::VirtualNetwork,
        Ancestry::Root,
        [
            F::property("configuration_state", "configurationState")
                .one(ResourceKind::ConfigurationState)
                .read_only(),
            F::property("address_space", "addressSpace").required(),
            F::property("dhcp_options", "dhcpOptions"),
            F::property("subnets", "subnets").many(ResourceKind::VirtualSubnetwork),
            F::property("logical_network", "logicalNetwork")
                .one(ResourceKind::Reference)
                .required(),
        ],
    )
});

static VIRTUAL_SUBNETWORK: LazyLock<Schema> = LazyLock::new(|| {
    Schema::managed(
        ResourceKind::VirtualSubnetwork,
        Ancestry::Child,
        [
            F::property("address_prefix", "addressPrefix").required(),
            F::property("access_control_list", "accessControlList").one(ResourceKind::Reference),
            F::property("service_insertion", "serviceInsertion"),
            F::property("route_table", "routeTable"),
            F::property("ip_configurations", "ipConfigurations").many(ResourceKind::Reference),
        ],
    )
});
