//! Payload codec for the update-check protocol
//!
//! Two schemes are spoken, selected by protocol version:
//!
//! - [`CipherScheme::Ecb`] (V1): AES-128-ECB with PKCS#7 padding, base64 text.
//!   The legacy protocol has no IV; this is the vendor's wire format.
//! - [`CipherScheme::Ctr`] (V2/V3): AES-128-CTR with a fresh random 16-byte
//!   initial counter block per message. Wire text is
//!   `base64(counter_block || ciphertext)`.
//!
//! Both directions operate on JSON text.

use aes::cipher::{BlockDecrypt, BlockEncrypt, KeyInit, KeyIvInit, StreamCipher};
use aes::{Aes128, Block};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::config::CryptoKeys;

type Aes128Ctr = ctr::Ctr128BE<Aes128>;

const BLOCK_SIZE: usize = 16;
const KEY_SIZE: usize = 16;
const NONCE_SIZE: usize = 16;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Invalid key length: expected {KEY_SIZE} bytes, got {0}")]
    InvalidKeyLength(usize),
    #[error("Base64 decode error: {0}")]
    Base64Error(#[from] base64::DecodeError),
    #[error("Ciphertext length {0} is not a multiple of the block size")]
    Misaligned(usize),
    #[error("Invalid PKCS#7 padding")]
    InvalidPadding,
    #[error("Ciphertext too short to hold a counter block ({0} bytes)")]
    Truncated(usize),
    #[error("Plaintext is not UTF-8: {0}")]
    Utf8Error(#[from] std::string::FromUtf8Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Response has no encrypted payload in field '{0}'")]
    MissingPayload(String),
}

/// Cipher construction used by a protocol version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CipherScheme {
    /// Block cipher, no IV (V1)
    Ecb,
    /// Counter mode with an embedded counter block (V2, V3)
    Ctr,
}

impl CipherScheme {
    /// Name of the response field that carries the encrypted payload
    pub fn response_field(self) -> &'static str {
        match self {
            CipherScheme::Ecb => "resps",
            CipherScheme::Ctr => "body",
        }
    }
}

/// Encrypts request bodies and decrypts response payloads
///
/// Keys are validated once at construction. The codec holds no per-message
/// state, so one instance can serve any number of requests.
#[derive(Clone)]
pub struct PayloadCodec {
    ecb_key: [u8; KEY_SIZE],
    ctr_key: [u8; KEY_SIZE],
}

impl std::fmt::Debug for PayloadCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PayloadCodec").finish_non_exhaustive()
    }
}

impl PayloadCodec {
    /// Create a codec from configured key material
    pub fn new(keys: &CryptoKeys) -> Result<Self, CodecError> {
        Ok(Self {
            ecb_key: key_array(keys.ecb.as_bytes())?,
            ctr_key: key_array(keys.ctr.as_bytes())?,
        })
    }

    /// Serialize `document` and encrypt it under `scheme`
    pub fn encrypt(&self, scheme: CipherScheme, document: &Value) -> Result<String, CodecError> {
        let plaintext = serde_json::to_string(document)?;
        Ok(match scheme {
            CipherScheme::Ecb => encrypt_ecb(&self.ecb_key, plaintext.as_bytes()),
            CipherScheme::Ctr => encrypt_ctr(&self.ctr_key, plaintext.as_bytes()),
        })
    }

    /// Decrypt `text` under `scheme` and parse the result as JSON
    pub fn decrypt(&self, scheme: CipherScheme, text: &str) -> Result<Value, CodecError> {
        let plaintext = match scheme {
            CipherScheme::Ecb => decrypt_ecb(&self.ecb_key, text)?,
            CipherScheme::Ctr => decrypt_ctr(&self.ctr_key, text)?,
        };
        let plaintext = String::from_utf8(plaintext)?;
        Ok(serde_json::from_str(&plaintext)?)
    }
}

fn key_array(key: &[u8]) -> Result<[u8; KEY_SIZE], CodecError> {
    key.try_into()
        .map_err(|_| CodecError::InvalidKeyLength(key.len()))
}

/// AES-128-ECB encrypt with PKCS#7 padding, returned as base64
pub fn encrypt_ecb(key: &[u8; KEY_SIZE], plaintext: &[u8]) -> String {
    let cipher = Aes128::new(key.into());

    let pad = BLOCK_SIZE - plaintext.len() % BLOCK_SIZE;
    let mut buf = Vec::with_capacity(plaintext.len() + pad);
    buf.extend_from_slice(plaintext);
    buf.resize(plaintext.len() + pad, pad as u8);

    for chunk in buf.chunks_mut(BLOCK_SIZE) {
        cipher.encrypt_block(Block::from_mut_slice(chunk));
    }

    BASE64.encode(buf)
}

/// Reverse [`encrypt_ecb`]
pub fn decrypt_ecb(key: &[u8; KEY_SIZE], text: &str) -> Result<Vec<u8>, CodecError> {
    let mut buf = BASE64.decode(text.trim())?;
    if buf.is_empty() || buf.len() % BLOCK_SIZE != 0 {
        return Err(CodecError::Misaligned(buf.len()));
    }

    let cipher = Aes128::new(key.into());
    for chunk in buf.chunks_mut(BLOCK_SIZE) {
        cipher.decrypt_block(Block::from_mut_slice(chunk));
    }

    let pad = buf[buf.len() - 1] as usize;
    if pad == 0 || pad > BLOCK_SIZE || buf[buf.len() - pad..].iter().any(|&b| b as usize != pad) {
        return Err(CodecError::InvalidPadding);
    }
    buf.truncate(buf.len() - pad);

    Ok(buf)
}

/// AES-128-CTR encrypt under a fresh random counter block
pub fn encrypt_ctr(key: &[u8; KEY_SIZE], plaintext: &[u8]) -> String {
    let mut nonce = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce);

    let mut cipher = Aes128Ctr::new(key.into(), (&nonce).into());
    let mut out = Vec::with_capacity(NONCE_SIZE + plaintext.len());
    out.extend_from_slice(&nonce);
    out.extend_from_slice(plaintext);
    cipher.apply_keystream(&mut out[NONCE_SIZE..]);

    BASE64.encode(out)
}

/// Reverse [`encrypt_ctr`]
pub fn decrypt_ctr(key: &[u8; KEY_SIZE], text: &str) -> Result<Vec<u8>, CodecError> {
    let data = BASE64.decode(text.trim())?;
    if data.len() < NONCE_SIZE {
        return Err(CodecError::Truncated(data.len()));
    }
    let (nonce, ciphertext) = data.split_at(NONCE_SIZE);

    let mut cipher = Aes128Ctr::new(key.into(), nonce.into());
    let mut plaintext = ciphertext.to_vec();
    cipher.apply_keystream(&mut plaintext);

    Ok(plaintext)
}

/// Extract the counter block embedded in a CTR-scheme message
pub fn ctr_nonce(text: &str) -> Result<[u8; NONCE_SIZE], CodecError> {
    let data = BASE64.decode(text.trim())?;
    data.get(..NONCE_SIZE)
        .and_then(|n| n.try_into().ok())
        .ok_or(CodecError::Truncated(data.len()))
}
