//! Rendering of the decrypted result

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use serde_json::Value;
use std::fs;
use std::io;
use std::path::Path;
use tracing::info;

use crate::crypto::CodecError;
use crate::error::OtaError;

/// Pretty-print with a four-space indent and sorted keys
///
/// `serde_json::Map` is ordered by key, so nested objects come out sorted
/// as well. Non-ASCII text is written as UTF-8, not `\u` escapes.
pub fn to_pretty_json(document: &Value) -> Result<String, CodecError> {
    let mut buf = Vec::new();
    let mut ser = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    document.serialize(&mut ser)?;
    Ok(String::from_utf8(buf)?)
}

/// Write the rendered document to `path`
pub fn dump_to_file(document: &Value, path: impl AsRef<Path>) -> Result<(), OtaError> {
    let path = path.as_ref();
    let write_failed = |source: io::Error| OtaError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let text = to_pretty_json(document)
        .map_err(|e| write_failed(io::Error::new(io::ErrorKind::InvalidData, e)))?;
    fs::write(path, text).map_err(write_failed)?;
    info!("Successfully saved response as {}", path.display());
    Ok(())
}
