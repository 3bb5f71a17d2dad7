//! Per-run device identity
//!
//! The protocol does not require continuity between checks, so every run
//! presents a freshly generated device.

use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::variant::Region;

pub const DEVICE_ID_LEN: usize = 64;
pub const REGISTRATION_ID_LEN: usize = 30;
pub const MAX_STRATEGY_VERSION: u8 = 8;

/// Randomly generated device identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentity {
    device_id: String,
    registration_id: String,
    strategy_version: u8,
}

impl DeviceIdentity {
    /// Generate an identity from the thread-local RNG
    pub fn generate(region: Region) -> Self {
        Self::generate_with(&mut rand::thread_rng(), region)
    }

    pub fn generate_with<R: Rng>(rng: &mut R, region: Region) -> Self {
        let device_id: String = (0..DEVICE_ID_LEN)
            .map(|_| char::from(rng.sample(Alphanumeric)))
            .collect();
        let registration_id = format!(
            "{}{}",
            region.registration_prefix(),
            &device_id[..REGISTRATION_ID_LEN]
        );
        let strategy_version = rng.gen_range(0..=MAX_STRATEGY_VERSION);

        Self {
            device_id,
            registration_id,
            strategy_version,
        }
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn registration_id(&self) -> &str {
        &self.registration_id
    }

    pub fn strategy_version(&self) -> u8 {
        self.strategy_version
    }
}
