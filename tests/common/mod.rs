//! Common test utilities for realme-ota integration tests

#![allow(dead_code)]

use serde_json::{json, Value};

pub use realme_ota::{
    CipherScheme, OtaClient, OtaVersion, PayloadCodec, ProtocolConfig, ProtocolVersion, Region,
    UpdateQuery,
};

pub const OTA_VERSION: &str = "RMX1801_11.A.01_0100_202001010000";

/// Configuration whose endpoints all point at `base_url`
pub fn mock_config(base_url: &str) -> ProtocolConfig {
    let mut config = ProtocolConfig::default();
    for region in Region::ALL {
        config
            .v1
            .endpoints
            .insert(region, format!("{base_url}/post/Query_Update"));
        config
            .v2
            .endpoints
            .insert(region, format!("{base_url}/update/v1"));
    }
    config
        .v3
        .endpoints
        .insert(Region::IN, format!("{base_url}/update/v3"));
    config.timeout_secs = 5;
    config
}

pub fn codec(config: &ProtocolConfig) -> PayloadCodec {
    PayloadCodec::new(&config.keys).expect("test keys are valid")
}

pub fn query(version: ProtocolVersion) -> UpdateQuery {
    UpdateQuery::new(
        "RMX1801",
        OtaVersion::parse(OTA_VERSION).expect("valid OTA version"),
        version,
    )
}

/// Server reply wrapping `document` in the field `scheme` expects
pub fn encrypted_reply(codec: &PayloadCodec, scheme: CipherScheme, document: &Value) -> String {
    let payload = codec.encrypt(scheme, document).expect("encrypt reply");
    let mut reply = serde_json::Map::new();
    reply.insert(scheme.response_field().to_string(), Value::String(payload));
    Value::Object(reply).to_string()
}

/// Decrypt the `params` of a captured request body
pub fn decrypt_request(codec: &PayloadCodec, scheme: CipherScheme, body: &[u8]) -> Value {
    let envelope: Value = serde_json::from_slice(body).expect("request body is JSON");
    let params = envelope["params"].as_str().expect("params is a string");
    codec.decrypt(scheme, params).expect("request decrypts")
}

pub fn sample_update() -> Value {
    json!({
        "components": [{
            "componentId": "my_product",
            "componentName": "my_product",
            "componentVersion": "RMX1801_11.A.02_0200_202003010000",
            "componentPackets": {
                "size": "2147483648",
                "manualUrl": "https://example.com/ota/RMX1801_11.A.02.zip",
                "md5": "d41d8cd98f00b204e9800998ecf8427e"
            }
        }],
        "realOtaVersion": "RMX1801_11.A.02_0200_202003010000",
        "description": {"panelUrl": "https://example.com/changelog"}
    })
}
