//! realme-ota Prelude
//!
//! Commonly used types in one import.
//!
//! # Example
//!
//! ```rust
//! use realme_ota::prelude::*;
//!
//! # fn example() -> Result<(), OtaError> {
//! let query = UpdateQuery::new(
//!     "RMX1801",
//!     OtaVersion::parse("RMX1801_11.A.01_0100_202001010000")?,
//!     ProtocolVersion::V3,
//! )
//! .region(Region::EU);
//! assert_eq!(query.product(), "RMX1801");
//! # Ok(())
//! # }
//! ```

pub use crate::client::OtaClient;
pub use crate::config::{CryptoKeys, ProtocolConfig};
pub use crate::crypto::{CipherScheme, PayloadCodec};
pub use crate::error::OtaError;
pub use crate::identity::DeviceIdentity;
pub use crate::ota_version::OtaVersion;
pub use crate::request::{ResolvedRequest, UpdateQuery};
pub use crate::response::ServerResponse;
pub use crate::variant::{ProtocolVersion, Region};
