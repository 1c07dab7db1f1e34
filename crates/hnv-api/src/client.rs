// Async HTTP client for the network controller's REST API.
//
// Base path: the controller root (resource endpoints start with `/networking/v1/`)
// Auth: optional HTTP basic credentials

use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::Error;
use crate::transport::TransportConfig;

// ── Error response shapes ────────────────────────────────────────────

#[derive(serde::Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<ErrorDetail>,
}

#[derive(serde::Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl ErrorResponse {
    fn into_message(self) -> Option<String> {
        match self.error {
            Some(ErrorDetail {
                code,
                message: Some(message),
            }) => Some(match code {
                Some(code) => format!("{code}: {message}"),
                None => message,
            }),
            _ => self.message,
        }
    }
}

// ── Credentials ──────────────────────────────────────────────────────

/// HTTP basic credentials sent with every request.
#[derive(Debug, Clone)]
pub struct BasicAuth {
    pub username: String,
    pub password: SecretString,
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the controller's resource endpoints.
///
/// Exposes exactly the three verbs the resource lifecycle needs:
/// fetch a payload, replace a resource, and delete a resource. HTTP
/// status codes are translated into [`Error`] variants here so callers
/// never inspect them; a 404 always surfaces as [`Error::NotFound`].
pub struct HnvClient {
    http: reqwest::Client,
    base_url: Url,
    auth: Option<BasicAuth>,
}

impl HnvClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build from a base URL, optional credentials, and transport config.
    pub fn new(
        base_url: &str,
        auth: Option<BasicAuth>,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        let base_url = Self::normalize_base_url(base_url)?;
        Ok(Self {
            http,
            base_url,
            auth,
        })
    }

    /// Wrap an existing `reqwest::Client` (caller manages TLS and auth).
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        let base_url = Self::normalize_base_url(base_url)?;
        Ok(Self {
            http,
            base_url,
            auth: None,
        })
    }

    /// Attach basic credentials to an existing client.
    pub fn with_auth(mut self, auth: BasicAuth) -> Self {
        self.auth = Some(auth);
        self
    }

    /// The controller base URL (always ends with `/`).
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        let path = url.path().trim_end_matches('/').to_owned();
        url.set_path(&format!("{path}/"));
        Ok(url)
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Join a resource endpoint (e.g. `/networking/v1/logicalNetworks/ln1`)
    /// onto the base URL, keeping any path prefix of the base.
    fn url(&self, endpoint: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(endpoint.trim_start_matches('/'))?)
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        let builder = self.http.request(method, url);
        match &self.auth {
            Some(auth) => builder.basic_auth(&auth.username, Some(auth.password.expose_secret())),
            None => builder,
        }
    }

    // ── Resource verbs ───────────────────────────────────────────────

    /// `GET {endpoint}` and return the decoded JSON payload.
    pub async fn get_resource(&self, endpoint: &str) -> Result<Value, Error> {
        let url = self.url(endpoint)?;
        debug!("GET {url}");

        let resp = self.request(reqwest::Method::GET, url).send().await?;
        Self::handle_response(endpoint, resp).await
    }

    /// `PUT {endpoint}` with a JSON body and return the controller's reply.
    ///
    /// An empty success body is returned as `Value::Null`.
    pub async fn update_resource(&self, endpoint: &str, payload: &Value) -> Result<Value, Error> {
        let url = self.url(endpoint)?;
        debug!("PUT {url}");

        let resp = self
            .request(reqwest::Method::PUT, url)
            .json(payload)
            .send()
            .await?;
        Self::handle_response(endpoint, resp).await
    }

    /// `DELETE {endpoint}`.
    pub async fn remove_resource(&self, endpoint: &str) -> Result<(), Error> {
        let url = self.url(endpoint)?;
        debug!("DELETE {url}");

        let resp = self.request(reqwest::Method::DELETE, url).send().await?;
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(Self::parse_error(endpoint, status, resp).await)
        }
    }

    // ── Response handling ────────────────────────────────────────────

    async fn handle_response(endpoint: &str, resp: reqwest::Response) -> Result<Value, Error> {
        let status = resp.status();
        if !status.is_success() {
            return Err(Self::parse_error(endpoint, status, resp).await);
        }

        let body = resp.text().await?;
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body).map_err(|e| {
            let preview = body.chars().take(200).collect::<String>();
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body,
            }
        })
    }

    async fn parse_error(endpoint: &str, status: StatusCode, resp: reqwest::Response) -> Error {
        if status == StatusCode::NOT_FOUND {
            return Error::NotFound {
                endpoint: endpoint.to_owned(),
            };
        }

        let raw = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorResponse>(&raw)
            .ok()
            .and_then(ErrorResponse::into_message)
            .unwrap_or_else(|| {
                if raw.is_empty() {
                    status.to_string()
                } else {
                    raw
                }
            });

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            Error::Authentication { message }
        } else {
            Error::Api {
                status: status.as_u16(),
                message,
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gains_trailing_slash() {
        let client = HnvClient::from_reqwest("https://nc.example.com/api", reqwest::Client::new())
            .unwrap();
        assert_eq!(client.base_url().as_str(), "https://nc.example.com/api/");
    }

    #[test]
    fn endpoints_keep_base_prefix() {
        let client = HnvClient::from_reqwest("https://nc.example.com/api/", reqwest::Client::new())
            .unwrap();
        let url = client.url("/networking/v1/logicalNetworks/ln1").unwrap();
        assert_eq!(
            url.as_str(),
            "https://nc.example.com/api/networking/v1/logicalNetworks/ln1"
        );
    }

    #[test]
    fn nested_error_message_includes_code() {
        let parsed: ErrorResponse = serde_json::from_str(
            r#"{"error": {"code": "InvalidRequest", "message": "vlanID out of range"}}"#,
        )
        .unwrap();
        assert_eq!(
            parsed.into_message().as_deref(),
            Some("InvalidRequest: vlanID out of range")
        );
    }
}
