//! Update-check client
//!
//! Ties the pieces together for one check:
//!
//! 1. Generate a fresh device identity
//! 2. Resolve endpoint, headers and body for the protocol version
//! 3. Encrypt the body into `{"params": ...}`
//! 4. POST it once, bounded by the request timeout
//! 5. Validate and decrypt the response
//!
//! # Example
//!
//! ```no_run
//! use realme_ota::{OtaClient, OtaVersion, ProtocolConfig, ProtocolVersion, Region, UpdateQuery};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OtaClient::new(ProtocolConfig::default())?;
//! let query = UpdateQuery::new(
//!     "RMX1801",
//!     OtaVersion::parse("RMX1801_11.A.01_0100_202001010000")?,
//!     ProtocolVersion::V2,
//! )
//! .region(Region::IN);
//!
//! let update = client.check(&query, None).await?;
//! println!("{update}");
//! # Ok(())
//! # }
//! ```

use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info};

use crate::config::{ConfigError, ProtocolConfig};
use crate::crypto::PayloadCodec;
use crate::error::OtaError;
use crate::identity::DeviceIdentity;
use crate::request::{CipherEnvelope, ResolvedRequest, UpdateQuery};
use crate::response::{interpret, ServerResponse};
use crate::variant::ProtocolVersion;

/// Client for the update-check endpoints
///
/// Holds only immutable configuration. Every check draws its own identity
/// and nonce, so one client can be shared across tasks.
#[derive(Debug, Clone)]
pub struct OtaClient {
    http_client: Client,
    config: ProtocolConfig,
    codec: PayloadCodec,
}

impl OtaClient {
    /// Create a client from a validated configuration
    pub fn new(config: ProtocolConfig) -> Result<Self, OtaError> {
        config.validate()?;
        let codec = PayloadCodec::new(&config.keys)
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        let http_client = Client::builder().build()?;

        Ok(Self {
            http_client,
            config,
            codec,
        })
    }

    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    pub fn codec(&self) -> &PayloadCodec {
        &self.codec
    }

    /// Build the request for `query` with a new identity and the current time
    pub fn prepare(&self, query: &UpdateQuery) -> Result<ResolvedRequest, OtaError> {
        let identity = DeviceIdentity::generate(query.selected_region());
        let timestamp = chrono::Utc::now().timestamp();
        query.build(&self.config, &identity, timestamp)
    }

    /// Encrypt and POST a resolved request, returning the raw response
    pub async fn send(&self, request: &ResolvedRequest) -> Result<ServerResponse, OtaError> {
        let envelope = CipherEnvelope {
            params: self
                .codec
                .encrypt(request.scheme(), &request.body_value())
                .map_err(OtaError::EncryptionFailed)?,
        };

        let mut builder = self
            .http_client
            .post(&request.url)
            .timeout(request.timeout);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }

        // V1 servers take the envelope as raw text; later versions as JSON
        builder = match request.version {
            ProtocolVersion::V1 => builder.body(envelope.to_json_string()),
            ProtocolVersion::V2 | ProtocolVersion::V3 => builder.json(&envelope),
        };

        debug!(url = %request.url, timeout = ?request.timeout, "sending update request");
        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();
        debug!(status, len = body.len(), "received response");

        Ok(ServerResponse { status, body })
    }

    /// Run one complete update check
    ///
    /// Returns the decrypted document, or only the value of `only` if given.
    pub async fn check(&self, query: &UpdateQuery, only: Option<&str>) -> Result<Value, OtaError> {
        let ota = query.ota_version();
        info!(
            "RealmeUI {} {} ({}) - {}",
            query.protocol_version(),
            query.product(),
            ota.product_identifier(),
            ota.major_version()
        );

        let request = self.prepare(query)?;
        let response = self.send(&request).await?;
        interpret(&response, request.scheme(), &self.codec, only)
    }
}
