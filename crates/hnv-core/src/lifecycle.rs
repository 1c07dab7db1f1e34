// ── Provisioning lifecycle ──
//
// fetch / commit / remove against a resource's endpoint, including the
// polling loop that waits for the controller to finish asynchronous
// provisioning. Each operation runs to completion on the caller's task;
// the only suspension point between polls is `tokio::time::sleep`.

use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info, warn};

use hnv_api::{BasicAuth, HnvClient, TlsMode, TransportConfig};

use crate::config::{ClientConfig, DEFAULT_RETRY_INTERVAL, TlsVerification};
use crate::error::CoreError;
use crate::model::Model;
use crate::resource::compose;
use crate::resource::{ProvisioningState, ResourceKind, ResourcePath};
use crate::transport::Transport;

/// Key of the item array in a collection payload.
const COLLECTION_ITEMS: &str = "value";

// ── Wait options ─────────────────────────────────────────────────────

/// Whether (and how long) a mutating call waits for the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Poll until the operation reaches a terminal state.
    pub wait: bool,
    /// Give up after this much simulated poll time. `None` waits forever.
    /// Ignored when `wait` is false.
    pub timeout: Option<Duration>,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            wait: true,
            timeout: None,
        }
    }
}

impl WaitOptions {
    /// Return right after the request is accepted.
    pub fn no_wait() -> Self {
        Self {
            wait: false,
            timeout: None,
        }
    }

    /// Wait, but for at most `timeout`.
    pub fn timeout(timeout: Duration) -> Self {
        Self {
            wait: true,
            timeout: Some(timeout),
        }
    }
}

// ── Poll state machine ───────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PollState {
    Requested,
    Polling,
    Succeeded,
    Failed,
    TimedOut,
}

impl PollState {
    fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::TimedOut)
    }
}

/// Tracks one wait loop: its state and the poll time spent so far.
///
/// Elapsed time is counted in whole retry intervals, so a loop with a
/// timeout issues at most `ceil(timeout / interval)` status requests.
struct Poller<'a> {
    endpoint: &'a str,
    state: PollState,
    interval: Duration,
    timeout: Option<Duration>,
    elapsed: Duration,
}

impl<'a> Poller<'a> {
    fn new(endpoint: &'a str, interval: Duration, timeout: Option<Duration>) -> Self {
        Self {
            endpoint,
            state: PollState::Requested,
            interval,
            timeout,
            elapsed: Duration::ZERO,
        }
    }

    fn transition(&mut self, next: PollState) {
        debug_assert!(
            !self.state.is_terminal(),
            "poll loop left terminal state {:?}",
            self.state
        );
        if self.state != next {
            debug!(endpoint = self.endpoint, from = ?self.state, to = ?next, "poll state");
        }
        self.state = next;
    }

    fn start(&mut self) {
        self.transition(PollState::Polling);
    }

    fn succeed(&mut self) {
        self.transition(PollState::Succeeded);
    }

    fn fail(&mut self, message: impl Into<String>) -> CoreError {
        self.transition(PollState::Failed);
        let message = message.into();
        warn!(endpoint = self.endpoint, %message, "provisioning failed");
        CoreError::Service { message }
    }

    /// Spend one interval, failing once the timeout is used up.
    async fn wait(&mut self) -> Result<(), CoreError> {
        self.elapsed += self.interval;
        if let Some(timeout) = self.timeout {
            if self.elapsed >= timeout {
                self.transition(PollState::TimedOut);
                warn!(
                    endpoint = self.endpoint,
                    elapsed_secs = self.elapsed.as_secs_f64(),
                    "gave up waiting for controller"
                );
                return Err(CoreError::Timeout {
                    elapsed: self.elapsed,
                });
            }
        }
        tokio::time::sleep(self.interval).await;
        Ok(())
    }
}

// ── Fetch result ─────────────────────────────────────────────────────

/// Outcome of [`Lifecycle::fetch`]: one resource, or a whole collection
/// when the path carries no resource id.
#[derive(Debug, Clone)]
pub enum Fetched {
    One(Model),
    Many(Vec<Model>),
}

impl Fetched {
    pub fn into_models(self) -> Vec<Model> {
        match self {
            Self::One(model) => vec![model],
            Self::Many(models) => models,
        }
    }
}

// ── Lifecycle engine ─────────────────────────────────────────────────

/// Runs fetch, commit, and remove for managed resources over a
/// [`Transport`].
///
/// The engine holds no per-resource state; concurrent operations on
/// different resources share only the transport and the retry interval.
pub struct Lifecycle<T> {
    transport: T,
    retry_interval: Duration,
}

impl Lifecycle<HnvClient> {
    /// Build an HTTP-backed engine from connection settings.
    pub fn connect(config: &ClientConfig) -> Result<Self, CoreError> {
        let transport = TransportConfig {
            tls: match &config.tls {
                TlsVerification::SystemDefaults => TlsMode::System,
                TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
                TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
            },
            timeout: config.timeout,
        };
        let auth = config.credentials.as_ref().map(|c| BasicAuth {
            username: c.username.clone(),
            password: c.password.clone(),
        });

        let client = HnvClient::new(config.url.as_str(), auth, &transport)?;
        info!(url = %config.url, "controller client ready");
        Self::new(client).with_retry_interval(config.retry_interval)
    }
}

impl<T: Transport> Lifecycle<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            retry_interval: DEFAULT_RETRY_INTERVAL,
        }
    }

    /// Set the wait between status checks. Must be non-zero; poll time
    /// is counted in whole intervals.
    pub fn with_retry_interval(mut self, interval: Duration) -> Result<Self, CoreError> {
        if interval.is_zero() {
            return Err(CoreError::Config {
                message: "retry interval must be greater than zero".into(),
            });
        }
        self.retry_interval = interval;
        Ok(self)
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn retry_interval(&self) -> Duration {
        self.retry_interval
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// Fetch one resource, or the whole collection when `path` has no
    /// resource id. Never polls.
    pub async fn fetch(&self, kind: ResourceKind, path: &ResourcePath) -> Result<Fetched, CoreError> {
        if path.resource_id.is_some() {
            self.get(kind, path).await.map(Fetched::One)
        } else {
            self.list(kind, path).await.map(Fetched::Many)
        }
    }

    /// Fetch a single resource. A missing resource is [`CoreError::NotFound`].
    pub async fn get(&self, kind: ResourceKind, path: &ResourcePath) -> Result<Model, CoreError> {
        if path.resource_id.is_none() {
            return Err(CoreError::Validation {
                kind,
                field: "resource_id".into(),
            });
        }

        let endpoint = kind.endpoint(path)?;
        debug!(%kind, %endpoint, "fetching resource");
        let mut raw = self.transport.get_resource(&endpoint).await?;
        compose::adopt(&mut raw, path);
        Model::decode(kind, raw)
    }

    /// Fetch every resource of `kind` under the ancestors in `path`.
    pub async fn list(&self, kind: ResourceKind, path: &ResourcePath) -> Result<Vec<Model>, CoreError> {
        let scope = path.collection();
        let endpoint = kind.endpoint(&scope)?;
        debug!(%kind, %endpoint, "listing resources");

        let raw = self.transport.get_resource(&endpoint).await?;
        let items = match raw {
            Value::Object(mut body) => match body.remove(COLLECTION_ITEMS) {
                Some(Value::Array(items)) => items,
                _ => {
                    return Err(CoreError::service(format!(
                        "collection response from {endpoint} has no `{COLLECTION_ITEMS}` array"
                    )));
                }
            },
            _ => {
                return Err(CoreError::service(format!(
                    "collection response from {endpoint} is not an object"
                )));
            }
        };

        items
            .into_iter()
            .map(|mut item| {
                compose::adopt(&mut item, &scope);
                Model::decode(kind, item)
            })
            .collect()
    }

    // ── Mutations ────────────────────────────────────────────────────

    /// Create or update the resource `model` describes.
    ///
    /// With `options.wait`, polls until the controller reports `Succeeded`
    /// and then replaces every field of `model` with the provisioned
    /// snapshot (finalizing it). `Failed`, or a status response without
    /// `provisioningState`, is a [`CoreError::Service`]. On timeout the
    /// model is left exactly as it was before the call.
    ///
    /// Without `options.wait`, returns once the update is accepted; a
    /// non-empty update response is decoded into `model`.
    pub async fn commit(&self, model: &mut Model, options: WaitOptions) -> Result<(), CoreError> {
        let kind = model.kind();
        let path = model.resource_path();
        let endpoint = kind.endpoint(&path)?;
        let payload = model.encode(false)?;

        info!(%kind, %endpoint, wait = options.wait, "committing resource");
        let response = self.transport.update_resource(&endpoint, &payload).await?;

        if !options.wait {
            if response.as_object().is_some_and(|body| !body.is_empty()) {
                let mut response = response;
                compose::adopt(&mut response, &path);
                model.replace_with(Model::decode(kind, response)?);
            }
            return Ok(());
        }

        let snapshot = self
            .await_provisioned(kind, &endpoint, &path, options.timeout)
            .await?;
        model.replace_with(snapshot);
        info!(%kind, %endpoint, "resource provisioned");
        Ok(())
    }

    /// Delete the resource at `path`.
    ///
    /// With `options.wait`, polls until fetching the resource reports
    /// not-found. Other poll responses are not inspected; errors other
    /// than not-found propagate.
    pub async fn remove(
        &self,
        kind: ResourceKind,
        path: &ResourcePath,
        options: WaitOptions,
    ) -> Result<(), CoreError> {
        if path.resource_id.is_none() {
            return Err(CoreError::Validation {
                kind,
                field: "resource_id".into(),
            });
        }

        let endpoint = kind.endpoint(path)?;
        info!(%kind, %endpoint, wait = options.wait, "removing resource");
        self.transport.remove_resource(&endpoint).await?;

        if !options.wait {
            return Ok(());
        }

        let mut poller = Poller::new(&endpoint, self.retry_interval, options.timeout);
        poller.start();
        loop {
            match self.transport.get_resource(&endpoint).await {
                Err(err) if err.is_not_found() => {
                    poller.succeed();
                    info!(%kind, %endpoint, "resource removed");
                    return Ok(());
                }
                Err(err) => return Err(err.into()),
                Ok(_) => {
                    debug!(%kind, %endpoint, "resource still present");
                    poller.wait().await?;
                }
            }
        }
    }

    /// Delete the resource a model points at.
    pub async fn remove_model(&self, model: &Model, options: WaitOptions) -> Result<(), CoreError> {
        self.remove(model.kind(), &model.resource_path(), options)
            .await
    }

    /// Poll `endpoint` until provisioning reaches a terminal state.
    async fn await_provisioned(
        &self,
        kind: ResourceKind,
        endpoint: &str,
        path: &ResourcePath,
        timeout: Option<Duration>,
    ) -> Result<Model, CoreError> {
        let mut poller = Poller::new(endpoint, self.retry_interval, timeout);
        poller.start();

        loop {
            let mut raw = self.transport.get_resource(endpoint).await?;

            let state = raw
                .get("properties")
                .and_then(|properties| properties.get("provisioningState"))
                .and_then(Value::as_str)
                .filter(|state| !state.is_empty())
                .map(str::to_owned);
            let Some(state) = state else {
                return Err(poller.fail(format!(
                    "{kind} status response has no `provisioningState`"
                )));
            };

            match state.parse::<ProvisioningState>() {
                Ok(ProvisioningState::Succeeded) => {
                    poller.succeed();
                    compose::adopt(&mut raw, path);
                    return Model::decode(kind, raw);
                }
                Ok(ProvisioningState::Failed) => {
                    return Err(poller.fail(format!(
                        "controller failed to provision {kind} at {endpoint}"
                    )));
                }
                _ => {
                    debug!(%kind, %endpoint, %state, "provisioning in progress");
                    poller.wait().await?;
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_waits_without_timeout() {
        let options = WaitOptions::default();
        assert!(options.wait);
        assert_eq!(options.timeout, None);
        assert!(!WaitOptions::no_wait().wait);
    }

    #[tokio::test(start_paused = true)]
    async fn poller_times_out_after_whole_intervals() {
        let mut poller = Poller::new(
            "/networking/v1/virtualNetworks/vn1",
            Duration::from_secs(1),
            Some(Duration::from_secs(3)),
        );
        poller.start();

        poller.wait().await.unwrap();
        poller.wait().await.unwrap();
        let err = poller.wait().await.unwrap_err();
        assert!(matches!(err, CoreError::Timeout { elapsed } if elapsed == Duration::from_secs(3)));
        assert_eq!(poller.state, PollState::TimedOut);
    }

    #[tokio::test(start_paused = true)]
    async fn poller_without_timeout_keeps_waiting() {
        let mut poller = Poller::new("/x", Duration::from_secs(5), None);
        poller.start();
        for _ in 0..100 {
            poller.wait().await.unwrap();
        }
        assert_eq!(poller.state, PollState::Polling);
        assert_eq!(poller.elapsed, Duration::from_secs(500));
    }

    #[test]
    fn failure_is_terminal_service_error() {
        let mut poller = Poller::new("/x", Duration::from_secs(1), None);
        poller.start();
        let err = poller.fail("boom");
        assert!(matches!(err, CoreError::Service { .. }));
        assert!(poller.state.is_terminal());
    }
}
