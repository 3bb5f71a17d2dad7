//! Protocol configuration
//!
//! Endpoint tables, header/body templates and key material are plain data.
//! [`ProtocolConfig::default`] carries the built-in protocol definition; a
//! TOML file is overlaid on top of it. Nothing here is mutated after
//! startup: request construction copies from the templates.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::variant::{ProtocolVersion, Region};

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Static AES-128 keys, 16 bytes each
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CryptoKeys {
    /// Key for the V1 ECB scheme
    pub ecb: String,
    /// Key for the V2/V3 CTR scheme
    pub ctr: String,
}

impl Default for CryptoKeys {
    fn default() -> Self {
        Self {
            ecb: "oppo1997oppo1997".to_string(),
            ctr: "baed2017java7865".to_string(),
        }
    }
}

/// Everything needed to speak one protocol version
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantConfig {
    /// Endpoint per region. Missing regions fall back to GL.
    pub endpoints: BTreeMap<Region, String>,
    /// Header template
    pub headers: BTreeMap<String, String>,
    /// Body template
    pub body: Map<String, Value>,
}

impl VariantConfig {
    /// Overlay `patch` entry by entry. Entries it does not name are kept.
    fn merge(&mut self, patch: VariantPatch) {
        self.endpoints.extend(patch.endpoints);
        self.headers.extend(patch.headers);
        self.body.extend(patch.body);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "ConfigFile")]
pub struct ProtocolConfig {
    pub timeout_secs: u64,
    pub keys: CryptoKeys,
    pub v1: VariantConfig,
    pub v2: VariantConfig,
    pub v3: VariantConfig,
}

/// On-disk form: every field optional, merged over the built-in defaults
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    timeout_secs: Option<u64>,
    #[serde(default)]
    keys: KeysPatch,
    #[serde(default)]
    v1: VariantPatch,
    #[serde(default)]
    v2: VariantPatch,
    #[serde(default)]
    v3: VariantPatch,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct KeysPatch {
    ecb: Option<String>,
    ctr: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct VariantPatch {
    #[serde(default)]
    endpoints: BTreeMap<Region, String>,
    #[serde(default)]
    headers: BTreeMap<String, String>,
    #[serde(default)]
    body: Map<String, Value>,
}

impl From<ConfigFile> for ProtocolConfig {
    fn from(file: ConfigFile) -> Self {
        let mut config = ProtocolConfig::default();
        if let Some(secs) = file.timeout_secs {
            config.timeout_secs = secs;
        }
        if let Some(ecb) = file.keys.ecb {
            config.keys.ecb = ecb;
        }
        if let Some(ctr) = file.keys.ctr {
            config.keys.ctr = ctr;
        }
        config.v1.merge(file.v1);
        config.v2.merge(file.v2);
        config.v3.merge(file.v3);
        config
    }
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            keys: CryptoKeys::default(),
            v1: default_v1(),
            v2: default_v2(),
            v3: default_v3(),
        }
    }
}

impl ProtocolConfig {
    /// Load a configuration file
    ///
    /// Scalars replace the defaults. Endpoint, header and body tables are
    /// merged key by key, so a file only needs the entries it changes.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: ProtocolConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn variant(&self, version: ProtocolVersion) -> &VariantConfig {
        match version {
            ProtocolVersion::V1 => &self.v1,
            ProtocolVersion::V2 => &self.v2,
            ProtocolVersion::V3 => &self.v3,
        }
    }

    /// Check the invariants the rest of the crate relies on
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, key) in [("ecb", &self.keys.ecb), ("ctr", &self.keys.ctr)] {
            if key.len() != 16 {
                return Err(ConfigError::Invalid(format!(
                    "keys.{name} must be 16 bytes, got {}",
                    key.len()
                )));
            }
        }

        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeout_secs must be positive".to_string()));
        }

        for version in ProtocolVersion::ALL {
            // V3 only ever talks to IN; everything else falls back to GL
            let required = match version {
                ProtocolVersion::V3 => Region::IN,
                _ => Region::GL,
            };
            if !self.variant(version).endpoints.contains_key(&required) {
                return Err(ConfigError::Invalid(format!(
                    "{version} has no {required} endpoint"
                )));
            }
        }

        Ok(())
    }
}

fn endpoints(entries: &[(Region, &str)]) -> BTreeMap<Region, String> {
    entries
        .iter()
        .map(|(region, url)| (*region, url.to_string()))
        .collect()
}

fn headers(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

const COMMON_HEADERS: &[(&str, &str)] = &[
    ("language", "en-EN"),
    ("romVersion", "unknown"),
    ("otaVersion", "unknown"),
    ("androidVersion", "unknown"),
    ("colorOSVersion", "unknown"),
    ("model", "unknown"),
    ("infVersion", "1"),
    ("nvCarrier", "unknown"),
    ("uRegion", "unknown"),
    ("trackRegion", "unknown"),
    ("imei", "000000000000000"),
    ("deviceId", "unknown"),
    ("Accept", "application/json"),
    ("Content-Type", "application/json"),
    ("User-Agent", "NULL"),
];

fn default_v1() -> VariantConfig {
    let mut h = headers(COMMON_HEADERS);
    h.insert("operator".to_string(), "unknown".to_string());
    h.insert("mode".to_string(), "0".to_string());

    VariantConfig {
        endpoints: endpoints(&[
            (Region::GL, "https://iota.coloros.com/post/Query_Update"),
            (Region::CN, "https://i.iota.coloros.com/post/Query_Update"),
            (Region::IN, "https://ifota-in.realmemobile.com/post/Query_Update"),
            (Region::EU, "https://ifota-eu.realmemobile.com/post/Query_Update"),
        ]),
        headers: h,
        body: object(json!({
            "language": "en-EN",
            "romVersion": "unknown",
            "otaVersion": "unknown",
            "androidVersion": "unknown",
            "colorOSVersion": "unknown",
            "model": "unknown",
            "productName": "unknown",
            "operator": "unknown",
            "uRegion": "unknown",
            "trackRegion": "unknown",
            "imei": "000000000000000",
            "imei1": "000000000000000",
            "mode": "0",
            "registrationId": "unknown",
            "deviceId": "unknown",
            "version": "2",
            "type": "1",
            "otaPrefix": "unknown",
            "isRealme": "1",
            "time": "0",
            "canCheckSelf": "0"
        })),
    }
}

fn component_body() -> Map<String, Value> {
    object(json!({
        "mode": "0",
        "time": 0,
        "isRooted": "0",
        "isLocked": true,
        "type": "0",
        "securityPatch": "1970-01-01",
        "securityPatchVendor": "1970-01-01",
        "cota": {
            "cotaVersion": "",
            "cotaVersionName": "",
            "buildType": "user"
        },
        "opex": {
            "check": true
        },
        "sota": {
            "sotaProtocolVersionNew": ["apk", "opapk", "rus"],
            "sotaVersion": "V80P02(BRB1CN01)"
        },
        "deviceId": "unknown",
        "registrationId": "unknown",
        "model": "unknown"
    }))
}

fn default_v2() -> VariantConfig {
    let mut h = headers(COMMON_HEADERS);
    h.insert("mode".to_string(), "manual".to_string());
    h.insert("version".to_string(), "2".to_string());

    VariantConfig {
        endpoints: endpoints(&[
            (Region::GL, "https://component-ota-f.coloros.com/update/v1"),
            (Region::CN, "https://component-ota-cn.allawntech.com/update/v1"),
            (Region::IN, "https://component-ota-in.coloros.com/update/v1"),
            (Region::EU, "https://component-ota-eu.coloros.com/update/v1"),
        ]),
        headers: h,
        body: component_body(),
    }
}

fn default_v3() -> VariantConfig {
    let mut h = headers(COMMON_HEADERS);
    h.insert("mode".to_string(), "manual".to_string());
    h.insert("version".to_string(), "3".to_string());

    VariantConfig {
        endpoints: endpoints(&[(Region::IN, "https://component-ota-in.coloros.com/update/v3")]),
        headers: h,
        body: component_body(),
    }
}
