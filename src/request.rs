//! Request construction
//!
//! Requests are built fresh from the immutable templates in
//! [`ProtocolConfig`] plus the computed per-run fields. Templates are
//! cloned, never modified in place.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::config::ProtocolConfig;
use crate::crypto::CipherScheme;
use crate::error::OtaError;
use crate::identity::DeviceIdentity;
use crate::ota_version::OtaVersion;
use crate::variant::{ProtocolVersion, Region, VariantTable};

/// What the caller wants to check
#[derive(Debug, Clone)]
pub struct UpdateQuery {
    model: String,
    ota_version: OtaVersion,
    version: ProtocolVersion,
    region: Region,
    timeout: Option<Duration>,
}

impl UpdateQuery {
    pub fn new(
        model: impl Into<String>,
        ota_version: OtaVersion,
        version: ProtocolVersion,
    ) -> Self {
        Self {
            model: model.into(),
            ota_version,
            version,
            region: Region::default(),
            timeout: None,
        }
    }

    /// Select the update server region (default GL)
    #[must_use]
    pub fn region(mut self, region: Region) -> Self {
        self.region = region;
        self
    }

    /// Override the configured request timeout
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn protocol_version(&self) -> ProtocolVersion {
        self.version
    }

    pub fn selected_region(&self) -> Region {
        self.region
    }

    pub fn ota_version(&self) -> &OtaVersion {
        &self.ota_version
    }

    /// Model actually reported to the server
    pub fn product(&self) -> &str {
        self.ota_version.resolve_product(&self.model)
    }

    /// Resolve endpoint, headers and body for this query
    ///
    /// `timestamp` is Unix time in whole seconds.
    pub fn build(
        &self,
        config: &ProtocolConfig,
        identity: &DeviceIdentity,
        timestamp: i64,
    ) -> Result<ResolvedRequest, OtaError> {
        let variant = config.variant(self.version);
        let url = VariantTable::new(config).resolve_endpoint(self.version, self.region)?;

        let mut headers = variant.headers.clone();
        let mut body = variant.body.clone();

        let product = self.product();
        let ota = &self.ota_version;
        let region = self.region.code();

        body.insert("registrationId".into(), identity.registration_id().into());
        body.insert("strategyVersion".into(), identity.strategy_version().into());

        if self.version.uses_header_fields() {
            body.insert("deviceId".into(), identity.device_id().into());
            body.insert("model".into(), product.into());
            body.insert("time".into(), timestamp.into());

            for (key, value) in [
                ("nvCarrier", self.region.carrier()),
                ("uRegion", region),
                ("trackRegion", region),
                ("language", self.region.language()),
                ("model", product),
                ("otaVersion", ota.as_str()),
                ("romVersion", ota.minor_version()),
            ] {
                headers.insert(key.to_string(), value.to_string());
            }
        } else {
            for (key, value) in [
                ("otaVersion", ota.as_str()),
                ("productName", product),
                ("romVersion", ota.minor_version()),
                ("otaPrefix", ota.minor_version()),
                ("uRegion", region),
                ("trackRegion", region),
                ("language", self.region.language()),
            ] {
                body.insert(key.to_string(), value.into());
            }
            body.insert("time".into(), timestamp.to_string().into());
        }

        Ok(ResolvedRequest {
            version: self.version,
            url: url.to_string(),
            headers,
            body,
            timeout: self
                .timeout
                .unwrap_or(Duration::from_secs(config.timeout_secs)),
        })
    }
}

/// A fully resolved, not yet encrypted request
#[derive(Debug, Clone)]
pub struct ResolvedRequest {
    pub version: ProtocolVersion,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: Map<String, Value>,
    pub timeout: Duration,
}

impl ResolvedRequest {
    pub fn scheme(&self) -> CipherScheme {
        self.version.scheme()
    }

    pub fn body_value(&self) -> Value {
        Value::Object(self.body.clone())
    }
}

/// Encrypted wire form of a request body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CipherEnvelope {
    pub params: String,
}

impl CipherEnvelope {
    /// `{"params": "..."}` as JSON text
    pub fn to_json_string(&self) -> String {
        serde_json::json!({ "params": self.params }).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const OTA: &str = "RMX1801_11.A.01_0100_202001010000";
    const NOW: i64 = 1_577_836_800;

    fn query(version: ProtocolVersion) -> UpdateQuery {
        UpdateQuery::new("RMX1801", OtaVersion::parse(OTA).unwrap(), version)
    }

    fn identity(region: Region) -> DeviceIdentity {
        DeviceIdentity::generate_with(&mut StdRng::seed_from_u64(1), region)
    }

    #[test]
    fn test_v2_default_region_scenario() {
        let config = ProtocolConfig::default();
        let id = identity(Region::GL);
        let req = query(ProtocolVersion::V2).build(&config, &id, NOW).unwrap();

        assert_eq!(req.body["model"], "RMX1801");
        assert_eq!(req.body["deviceId"], id.device_id());
        assert_eq!(req.body["registrationId"], id.registration_id());
        assert_eq!(req.headers["otaVersion"], OTA);
        assert_eq!(req.headers["romVersion"], "RMX1801_11.A.01");
        assert_eq!(req.headers["model"], "RMX1801");
        assert_eq!(req.headers["language"], "en-IN");
        assert_eq!(req.headers["nvCarrier"], "00011011");
        assert_eq!(req.headers["uRegion"], "GL");
        assert_eq!(req.headers["trackRegion"], "GL");
        assert_eq!(req.url, config.v2.endpoints[&Region::GL]);
        assert_eq!(req.scheme(), CipherScheme::Ctr);
        assert_eq!(req.timeout, Duration::from_secs(config.timeout_secs));
    }

    #[test]
    fn test_v1_fields_go_in_body() {
        let config = ProtocolConfig::default();
        let id = identity(Region::EU);
        let req = query(ProtocolVersion::V1)
            .region(Region::EU)
            .build(&config, &id, NOW)
            .unwrap();

        assert_eq!(req.body["otaVersion"], OTA);
        assert_eq!(req.body["productName"], "RMX1801");
        assert_eq!(req.body["romVersion"], "RMX1801_11.A.01");
        assert_eq!(req.body["otaPrefix"], "RMX1801_11.A.01");
        assert_eq!(req.body["time"], "1577836800");
        assert_eq!(req.body["uRegion"], "EU");
        assert_eq!(req.body["trackRegion"], "EU");
        assert_eq!(req.body["language"], "en-EN");
        assert_eq!(req.body["strategyVersion"], id.strategy_version());
        assert_eq!(req.headers, config.v1.headers);
        assert_eq!(req.url, config.v1.endpoints[&Region::EU]);
        assert_eq!(req.scheme(), CipherScheme::Ecb);
    }

    #[test]
    fn test_cn_region_v3() {
        let config = ProtocolConfig::default();
        let req = query(ProtocolVersion::V3)
            .region(Region::CN)
            .timeout(Duration::from_secs(3))
            .build(&config, &identity(Region::CN), NOW)
            .unwrap();

        assert_eq!(req.url, config.v3.endpoints[&Region::IN]);
        assert_eq!(req.headers["nvCarrier"], "10010111");
        assert_eq!(req.headers["language"], "zh-CN");
        assert_eq!(req.headers["uRegion"], "CN");
        assert_eq!(req.timeout, Duration::from_secs(3));
        assert!(req.body["registrationId"]
            .as_str()
            .unwrap()
            .starts_with("realme_CN_"));
    }

    #[test]
    fn test_mismatched_model_uses_version_prefix() {
        let config = ProtocolConfig::default();
        let ota = OtaVersion::parse(OTA).unwrap();
        let req = UpdateQuery::new("RMX9999", ota, ProtocolVersion::V2)
            .build(&config, &identity(Region::GL), NOW)
            .unwrap();
        assert_eq!(req.body["model"], "RMX1801");
        assert_eq!(req.headers["model"], "RMX1801");
    }

    #[test]
    fn test_templates_are_not_mutated() {
        let config = ProtocolConfig::default();
        let before = config.v2.clone();
        query(ProtocolVersion::V2)
            .region(Region::CN)
            .build(&config, &identity(Region::CN), NOW)
            .unwrap();
        assert_eq!(config.v2.headers, before.headers);
        assert_eq!(config.v2.body, before.body);
    }
}
