// ── Transport seam ──
//
// The lifecycle engine talks to the controller only through this trait,
// so tests can script responses without a network.

use std::future::Future;

use serde_json::Value;

use hnv_api::HnvClient;

/// The three verbs a resource lifecycle needs.
///
/// Implementations report a missing resource as
/// [`hnv_api::Error::NotFound`]; delete polling depends on it.
pub trait Transport: Send + Sync {
    /// Fetch the raw payload at `endpoint`.
    fn get_resource(
        &self,
        endpoint: &str,
    ) -> impl Future<Output = Result<Value, hnv_api::Error>> + Send;

    /// Replace the resource at `endpoint` with `payload`.
    fn update_resource(
        &self,
        endpoint: &str,
        payload: &Value,
    ) -> impl Future<Output = Result<Value, hnv_api::Error>> + Send;

    /// Delete the resource at `endpoint`.
    fn remove_resource(
        &self,
        endpoint: &str,
    ) -> impl Future<Output = Result<(), hnv_api::Error>> + Send;
}

impl Transport for HnvClient {
    fn get_resource(
        &self,
        endpoint: &str,
    ) -> impl Future<Output = Result<Value, hnv_api::Error>> + Send {
        HnvClient::get_resource(self, endpoint)
    }

    fn update_resource(
        &self,
        endpoint: &str,
        payload: &Value,
    ) -> impl Future<Output = Result<Value, hnv_api::Error>> + Send {
        HnvClient::update_resource(self, endpoint, payload)
    }

    fn remove_resource(
        &self,
        endpoint: &str,
    ) -> impl Future<Output = Result<(), hnv_api::Error>> + Send {
        HnvClient::remove_resource(self, endpoint)
    }
}
