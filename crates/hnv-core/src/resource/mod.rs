// ── Resource kinds ──
//
// The catalogue of controller resource kinds, their addressing, and the
// provisioning states the controller reports for them.

pub(crate) mod compose;
mod schema;

use strum::{AsRefStr, Display, EnumIter, EnumString};

pub use schema::Schema;

use crate::error::CoreError;

/// Every resource kind this client can (de)serialize.
///
/// Managed kinds have an endpoint and a provisioning lifecycle; the rest
/// only ever appear nested inside a managed resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, AsRefStr)]
pub enum ResourceKind {
    /// `{ "resourceRef": ... }` pointer to another resource.
    Reference,
    ResourceMetadata,
    IpPool,
    LogicalSubnetwork,
    LogicalNetwork,
    IpConfiguration,
    DnsSettings,
    QosSettings,
    PortSettings,
    ConfigurationState,
    NetworkInterface,
    VirtualSubnetwork,
    VirtualNetwork,
}

/// Position of a managed kind in the controller's resource tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ancestry {
    /// Addressed by its own id only.
    Root,
    /// Addressed through its parent's id.
    Child,
    /// Addressed through its parent's and grandparent's ids.
    Grandchild,
}

impl ResourceKind {
    /// The shared field table for this kind.
    pub fn schema(self) -> &'static Schema {
        schema::for_kind(self)
    }

    /// URL path template, with `{resource_id}`, `{parent_id}` and
    /// `{grandparent_id}` placeholders. `None` for nested-only kinds.
    pub fn endpoint_template(self) -> Option<&'static str> {
        Some(match self {
            Self::LogicalNetwork => "/networking/v1/logicalNetworks/{resource_id}",
            Self::LogicalSubnetwork => {
                "/networking/v1/logicalNetworks/{parent_id}/logicalSubnets/{resource_id}"
            }
            Self::IpPool => {
                "/networking/v1/logicalNetworks/{grandparent_id}/logicalSubnets/{parent_id}/ipPools/{resource_id}"
            }
            Self::NetworkInterface => "/networking/v1/networkInterfaces/{resource_id}",
            Self::IpConfiguration => {
                "/networking/v1/networkInterfaces/{parent_id}/ipConfigurations/{resource_id}"
            }
            Self::VirtualNetwork => "/networking/v1/virtualNetworks/{resource_id}",
            Self::VirtualSubnetwork => {
                "/networking/v1/virtualNetworks/{parent_id}/subnets/{resource_id}"
            }
            Self::Reference
            | Self::ResourceMetadata
            | Self::DnsSettings
            | Self::QosSettings
            | Self::PortSettings
            | Self::ConfigurationState => return None,
        })
    }

    pub fn ancestry(self) -> Option<Ancestry> {
        match self {
            Self::LogicalNetwork | Self::NetworkInterface | Self::VirtualNetwork => {
                Some(Ancestry::Root)
            }
            Self::LogicalSubnetwork | Self::IpConfiguration | Self::VirtualSubnetwork => {
                Some(Ancestry::Child)
            }
            Self::IpPool => Some(Ancestry::Grandchild),
            _ => None,
        }
    }

    /// Whether the kind has an endpoint and a provisioning lifecycle.
    pub fn is_managed(self) -> bool {
        self.endpoint_template().is_some()
    }

    /// Render the endpoint for `path`.
    ///
    /// Missing ids substitute as empty; with no resource id this yields the
    /// collection endpoint.
    pub fn endpoint(self, path: &ResourcePath) -> Result<String, CoreError> {
        let template = self.endpoint_template().ok_or(CoreError::Unsupported {
            operation: "addressing",
            kind: self,
        })?;

        let rendered = template
            .replace("{grandparent_id}", path.grandparent_id.as_deref().unwrap_or_default())
            .replace("{parent_id}", path.parent_id.as_deref().unwrap_or_default())
            .replace("{resource_id}", path.resource_id.as_deref().unwrap_or_default());

        Ok(rendered.trim_end_matches('/').to_owned())
    }
}

/// Server-reported state of an asynchronous provisioning operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, AsRefStr)]
pub enum ProvisioningState {
    Updating,
    Succeeded,
    Failed,
    Deleting,
}

/// Identifiers addressing one managed resource (or, without a resource
/// id, a collection).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourcePath {
    pub resource_id: Option<String>,
    pub parent_id: Option<String>,
    pub grandparent_id: Option<String>,
}

impl ResourcePath {
    /// The collection under no ancestors.
    pub fn root() -> Self {
        Self::default()
    }

    /// A single resource by id.
    pub fn id(resource_id: impl Into<String>) -> Self {
        Self {
            resource_id: Some(resource_id.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    #[must_use]
    pub fn with_grandparent(mut self, grandparent_id: impl Into<String>) -> Self {
        self.grandparent_id = Some(grandparent_id.into());
        self
    }

    /// Same ancestors, no resource id: the enclosing collection.
    #[must_use]
    pub fn collection(&self) -> Self {
        Self {
            resource_id: None,
            ..self.clone()
        }
    }
}
