//! Resource model and provisioning lifecycle for network-virtualization
//! controllers.
//!
//! This crate sits between `hnv-api` (raw HTTP verbs) and callers that
//! want typed resources:
//!
//! - **[`Model`]**: a schema-driven resource object. Every
//!   [`ResourceKind`] owns a shared [`Schema`] of field descriptors; the
//!   same generic codec decodes controller payloads into finalized models
//!   and encodes edited models back into update requests.
//!
//! - **Composition**: kind-specific payload fixups run before decoding,
//!   stamping ancestor ids onto nested children so each child can be
//!   addressed on its own later.
//!
//! - **[`Lifecycle`]**: fetch, commit, and remove against a resource's
//!   endpoint. Commit and remove optionally poll the controller until the
//!   asynchronous operation finishes, bounded by [`WaitOptions`].
//!
//! - **[`Transport`]**: the seam to the controller; implemented for
//!   [`hnv_api::HnvClient`].

pub mod config;
pub mod error;
pub mod lifecycle;
pub mod model;
pub mod resource;
pub mod transport;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{ClientConfig, Credentials, TlsVerification};
pub use error::CoreError;
pub use lifecycle::{Fetched, Lifecycle, WaitOptions};
pub use model::{FieldDescriptor, FieldValue, Model, Placement, Shape};
pub use resource::{Ancestry, ProvisioningState, ResourceKind, ResourcePath, Schema};
pub use transport::Transport;
