//! Response interpretation
//!
//! Linear checks, each of which can end the run:
//! status, server-side `errMsg`, payload decryption, optional projection.

use serde_json::Value;
use tracing::debug;

use crate::crypto::{CipherScheme, CodecError, PayloadCodec};
use crate::error::OtaError;

/// Raw HTTP result returned by the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Validate `response` and return the decrypted document
///
/// If `only` names a field, the value of that field is returned instead of
/// the whole document.
pub fn interpret(
    response: &ServerResponse,
    scheme: CipherScheme,
    codec: &PayloadCodec,
    only: Option<&str>,
) -> Result<Value, OtaError> {
    if response.status != 200 {
        return Err(OtaError::InvalidResponse(response.status));
    }

    let envelope: Value = serde_json::from_slice(&response.body).map_err(CodecError::from)?;

    if let Some(message) = envelope.get("errMsg").filter(|m| !m.is_null()) {
        let message = match message {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        return Err(OtaError::ProtocolRejected(message));
    }

    let field = scheme.response_field();
    let payload = envelope
        .get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| CodecError::MissingPayload(field.to_string()))?;

    debug!(field, len = payload.len(), "decrypting response payload");
    let document = codec.decrypt(scheme, payload)?;

    match only {
        Some(name) => document
            .get(name)
            .cloned()
            .ok_or_else(|| OtaError::FieldNotFound(name.to_string())),
        None => Ok(document),
    }
}
