use crate::config::Config;
use crate::error::SimError;
use crate::realm;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_ENCODING, CONTENT_TYPE};
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct ExchangeResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// The one operation the upload buffer needs from a transport.
/// `Err` means nothing usable came back.
pub trait CollectorClient {
    fn post(&self, body: &[u8]) -> impl Future<Output = Result<ExchangeResponse, SimError>>;
}

/// HTTP transport holding one connection pool for the process lifetime.
pub struct HttpCollector {
    http: reqwest::Client,
    url: String,
    client_id: String,
    realm_path: PathBuf,
}

impl HttpCollector {
    pub fn new(config: &Config) -> Result<Self, SimError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(format!(
                "{}/{}",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION")
            ))
            .build()
            .map_err(|e| SimError::TransportInit(e.to_string()))?;

        Ok(Self {
            http,
            url: config.collector_url.clone(),
            client_id: config.client_id.clone(),
            realm_path: config.realm_path.clone(),
        })
    }

    fn headers(&self, realm: &str) -> Result<HeaderMap, SimError> {
        let client_id = HeaderValue::from_str(&self.client_id)
            .map_err(|e| SimError::Config(format!("bad client id {:?}: {e}", self.client_id)))?;
        let realm = HeaderValue::from_str(realm)
            .map_err(|e| SimError::Realm(format!("bad realm identifier {realm:?}: {e}")))?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_ENCODING, HeaderValue::from_static("gzip"));
        headers.insert("x-uuid", client_id);
        headers.insert("x-uuid-serial", HeaderValue::from_static("-"));
        headers.insert("x-uuid-realm", realm);
        Ok(headers)
    }
}

impl CollectorClient for HttpCollector {
    async fn post(&self, body: &[u8]) -> Result<ExchangeResponse, SimError> {
        let realm = realm::load(&self.realm_path)?;
        let headers = self.headers(&realm)?;

        debug!("📤 POST {} ({} bytes)", self.url, body.len());
        let response = self
            .http
            .post(&self.url)
            .headers(headers)
            .body(body.to_vec())
            .send()
            .await
            .map_err(|e| SimError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| SimError::Transport(e.to_string()))?;

        Ok(ExchangeResponse {
            status,
            body: body.to_vec(),
        })
    }
}
