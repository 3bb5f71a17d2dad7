//! Protocol variants and regions
//!
//! Endpoint selection is a closed lookup keyed by `(ProtocolVersion, Region)`
//! over the tables held in [`ProtocolConfig`]. Gaps in a table are explicit:
//! they fall back to the version's GL endpoint.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::config::ProtocolConfig;
use crate::crypto::CipherScheme;
use crate::error::OtaError;

/// RealmeUI protocol version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProtocolVersion {
    V1,
    V2,
    V3,
}

impl ProtocolVersion {
    pub const ALL: [ProtocolVersion; 3] =
        [ProtocolVersion::V1, ProtocolVersion::V2, ProtocolVersion::V3];

    pub fn number(self) -> u8 {
        match self {
            ProtocolVersion::V1 => 1,
            ProtocolVersion::V2 => 2,
            ProtocolVersion::V3 => 3,
        }
    }

    /// Cipher scheme bound to this version
    pub fn scheme(self) -> CipherScheme {
        match self {
            ProtocolVersion::V1 => CipherScheme::Ecb,
            ProtocolVersion::V2 | ProtocolVersion::V3 => CipherScheme::Ctr,
        }
    }

    /// Whether region and version fields travel in the HTTP headers
    pub fn uses_header_fields(self) -> bool {
        self != ProtocolVersion::V1
    }
}

impl TryFrom<u8> for ProtocolVersion {
    type Error = OtaError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(ProtocolVersion::V1),
            2 => Ok(ProtocolVersion::V2),
            3 => Ok(ProtocolVersion::V3),
            other => Err(OtaError::InvalidInput(format!(
                "unsupported RealmeUI version {other} (expected 1, 2 or 3)"
            ))),
        }
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "V{}", self.number())
    }
}

/// Update server region
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Region {
    #[default]
    GL,
    CN,
    IN,
    EU,
}

impl Region {
    pub const ALL: [Region; 4] = [Region::GL, Region::CN, Region::IN, Region::EU];

    /// Two-character region code written into `uRegion` and `trackRegion`
    pub fn code(self) -> &'static str {
        match self {
            Region::GL => "GL",
            Region::CN => "CN",
            Region::IN => "IN",
            Region::EU => "EU",
        }
    }

    pub fn language(self) -> &'static str {
        match self {
            Region::GL | Region::IN => "en-IN",
            Region::CN => "zh-CN",
            Region::EU => "en-EN",
        }
    }

    /// `nvCarrier` value sent by V2/V3
    pub fn carrier(self) -> &'static str {
        match self {
            Region::CN => "10010111",
            _ => "00011011",
        }
    }

    /// Prefix prepended to the registration id
    pub fn registration_prefix(self) -> &'static str {
        match self {
            Region::GL => "realme_",
            Region::CN => "realme_CN_",
            Region::IN => "realme_IN_",
            Region::EU => "realme_EU_",
        }
    }

    /// Map a numeric server selector (GL=0, CN=1, IN=2, EU=3)
    pub fn from_index(index: u8) -> Result<Self, OtaError> {
        Region::ALL
            .get(usize::from(index))
            .copied()
            .ok_or_else(|| OtaError::InvalidInput(format!("unknown server index {index}")))
    }
}

impl FromStr for Region {
    type Err = OtaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GL" => Ok(Region::GL),
            "CN" => Ok(Region::CN),
            "IN" => Ok(Region::IN),
            "EU" => Ok(Region::EU),
            other => match other.parse::<u8>() {
                Ok(index) => Region::from_index(index),
                Err(_) => Err(OtaError::InvalidInput(format!("unknown region '{s}'"))),
            },
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Endpoint lookup over a configuration's per-version tables
pub struct VariantTable<'a> {
    config: &'a ProtocolConfig,
}

impl<'a> VariantTable<'a> {
    pub fn new(config: &'a ProtocolConfig) -> Self {
        Self { config }
    }

    /// Resolve the endpoint URL for `version` in `region`
    ///
    /// V3 only exists on the IN server and ignores `region`. For V1/V2 a
    /// region without its own entry keeps the GL endpoint.
    pub fn resolve_endpoint(
        &self,
        version: ProtocolVersion,
        region: Region,
    ) -> Result<&'a str, OtaError> {
        let table = &self.config.variant(version).endpoints;
        let effective = match version {
            ProtocolVersion::V3 => Region::IN,
            _ => region,
        };

        if let Some(url) = table.get(&effective) {
            return Ok(url.as_str());
        }

        debug!(%version, %region, "no endpoint for region, keeping GL endpoint");
        table.get(&Region::GL).map(String::as_str).ok_or_else(|| {
            OtaError::InvalidInput(format!(
                "no {effective} or GL endpoint configured for {version}"
            ))
        })
    }
}
