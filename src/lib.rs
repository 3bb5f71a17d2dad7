mod client;
pub mod config;
pub mod crypto;
mod error;
pub mod identity;
pub mod output;
mod ota_version;
pub mod prelude;
pub mod request;
pub mod response;
pub mod variant;

pub use client::OtaClient;
pub use config::{ConfigError, CryptoKeys, ProtocolConfig, VariantConfig};
pub use crypto::{CipherScheme, CodecError, PayloadCodec};
pub use error::OtaError;
pub use identity::DeviceIdentity;
pub use ota_version::OtaVersion;
pub use request::{CipherEnvelope, ResolvedRequest, UpdateQuery};
pub use response::{interpret, ServerResponse};
pub use variant::{ProtocolVersion, Region, VariantTable};
