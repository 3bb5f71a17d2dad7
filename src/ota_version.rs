//! Fields derived from the device's OTA version string
//!
//! An OTA version looks like `RMX1801_11.A.01_0100_202001010000`. The
//! protocol slices it positionally; slices past the end of a short string
//! yield whatever characters are available.

use crate::error::OtaError;

const PRODUCT_PREFIX_LEN: usize = 7;
const MINOR_VERSION_LEN: usize = 15;
const MAJOR_VERSION_OFFSET: usize = 13;

/// A validated OTA version string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtaVersion {
    raw: String,
    product_identifier: String,
}

impl OtaVersion {
    /// Validate `raw`: it must have at least two `.`-separated components
    pub fn parse(raw: impl Into<String>) -> Result<Self, OtaError> {
        let raw = raw.into();
        let product_identifier = raw
            .split('.')
            .nth(1)
            .ok_or_else(|| {
                OtaError::InvalidInput(format!(
                    "OTA version '{raw}' must contain at least two '.'-separated components"
                ))
            })?
            .to_string();

        Ok(Self {
            raw,
            product_identifier,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Second `.`-separated component
    pub fn product_identifier(&self) -> &str {
        &self.product_identifier
    }

    /// First 15 characters, sent as `romVersion` and `otaPrefix`
    pub fn minor_version(&self) -> &str {
        prefix(&self.raw, MINOR_VERSION_LEN)
    }

    /// Everything from character 13 onward
    pub fn major_version(&self) -> &str {
        let start = self
            .raw
            .char_indices()
            .nth(MAJOR_VERSION_OFFSET)
            .map_or(self.raw.len(), |(i, _)| i);
        &self.raw[start..]
    }

    /// First 7 characters: the product model the version belongs to
    pub fn product_prefix(&self) -> &str {
        prefix(&self.raw, PRODUCT_PREFIX_LEN)
    }

    /// The model to report: the user's, unless it disagrees with the version
    pub fn resolve_product<'a>(&'a self, model: &'a str) -> &'a str {
        let expected = self.product_prefix();
        if model == expected {
            model
        } else {
            expected
        }
    }
}

fn prefix(s: &str, chars: usize) -> &str {
    match s.char_indices().nth(chars) {
        Some((end, _)) => &s[..end],
        None => s,
    }
}

impl std::fmt::Display for OtaVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}
