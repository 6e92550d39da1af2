//! Build notification envelopes
//!
//! The build queue announces finished builds over a push channel. Each
//! message carries a base64 `data` payload in one of two shapes, chosen by
//! the `version` attribute:
//!
//! - `v2`: `{"buildPubsub": {"build": {"id": ..}}, "userData": <base64>}`
//! - legacy: `{"build": {"id": ..}, "hostname": .., "user_data": <base64>}`
//!
//! In both, the user data is the base64 JSON of the [`TriggerRequest`] that
//! scheduled the build.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use super::pipeline::TriggerRequest;

/// Attribute selecting the envelope shape
pub const VERSION_ATTRIBUTE: &str = "version";

/// Errors raised while decoding a notification
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("invalid base64 in {field}: {message}")]
    Base64 { field: &'static str, message: String },

    #[error("invalid JSON in {field}: {message}")]
    Json { field: &'static str, message: String },
}

/// Body of a push delivery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushRequest {
    pub message: PubsubMessage,

    #[serde(default)]
    pub subscription: String,
}

/// One message from the notification channel
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PubsubMessage {
    /// Base64 encoded payload
    pub data: String,

    #[serde(default)]
    pub attributes: HashMap<String, String>,

    #[serde(default, rename = "messageId", alias = "message_id")]
    pub message_id: String,
}

/// What a notification tells us: which build finished for which worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildNotification {
    pub build_id: i64,
    pub request: TriggerRequest,
}

#[derive(Debug, Serialize, Deserialize)]
struct Build {
    #[serde(deserialize_with = "int64_from_string_or_number")]
    id: i64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct V2Envelope {
    build_pubsub: V2BuildPubsub,
    user_data: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct V2BuildPubsub {
    build: Build,
}

#[derive(Debug, Serialize, Deserialize)]
struct LegacyEnvelope {
    build: Build,

    #[serde(default)]
    hostname: String,

    user_data: String,
}

impl PubsubMessage {
    /// Whether the message uses the v2 envelope
    pub fn is_v2(&self) -> bool {
        self.attributes
            .get(VERSION_ATTRIBUTE)
            .is_some_and(|v| v == "v2")
    }

    /// Decode the build id and the originating trigger request
    pub fn decode(&self) -> Result<BuildNotification, DecodeError> {
        let data = base64_decode("message data", &self.data)?;

        let (build_id, user_data) = if self.is_v2() {
            let envelope: V2Envelope = json_decode("v2 envelope", &data)?;
            (envelope.build_pubsub.build.id, envelope.user_data)
        } else {
            let envelope: LegacyEnvelope = json_decode("legacy envelope", &data)?;
            (envelope.build.id, envelope.user_data)
        };

        let request = json_decode("user data", &base64_decode("user data", &user_data)?)?;

        Ok(BuildNotification { build_id, request })
    }

    /// Build a v2 message announcing `build_id`
    pub fn v2(build_id: i64, request: &TriggerRequest) -> Result<Self, serde_json::Error> {
        let envelope = V2Envelope {
            build_pubsub: V2BuildPubsub {
                build: Build { id: build_id },
            },
            user_data: encode_user_data(request)?,
        };
        Ok(Self {
            data: STANDARD.encode(serde_json::to_vec(&envelope)?),
            attributes: HashMap::from([(VERSION_ATTRIBUTE.to_string(), "v2".to_string())]),
            message_id: String::new(),
        })
    }

    /// Build a legacy message announcing `build_id`
    pub fn legacy(
        build_id: i64,
        hostname: &str,
        request: &TriggerRequest,
    ) -> Result<Self, serde_json::Error> {
        let envelope = LegacyEnvelope {
            build: Build { id: build_id },
            hostname: hostname.to_string(),
            user_data: encode_user_data(request)?,
        };
        Ok(Self {
            data: STANDARD.encode(serde_json::to_vec(&envelope)?),
            attributes: HashMap::new(),
            message_id: String::new(),
        })
    }
}

/// Encode a trigger request as build user data
pub fn encode_user_data(request: &TriggerRequest) -> Result<String, serde_json::Error> {
    Ok(STANDARD.encode(serde_json::to_vec(request)?))
}

fn base64_decode(field: &'static str, value: &str) -> Result<Vec<u8>, DecodeError> {
    STANDARD.decode(value).map_err(|e| DecodeError::Base64 {
        field,
        message: e.to_string(),
    })
}

fn json_decode<T: serde::de::DeserializeOwned>(
    field: &'static str,
    bytes: &[u8],
) -> Result<T, DecodeError> {
    serde_json::from_slice(bytes).map_err(|e| DecodeError::Json {
        field,
        message: e.to_string(),
    })
}

/// Build ids are 64-bit and arrive as JSON strings or numbers
fn int64_from_string_or_number<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(i64),
        String(String),
    }

    match Repr::deserialize(deserializer)? {
        Repr::Number(n) => Ok(n),
        Repr::String(s) => s.parse().map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> TriggerRequest {
        TriggerRequest {
            run_id: 12,
            worker_name: "PyLint_UBUNTU".to_string(),
        }
    }

    #[test]
    fn test_v2_and_legacy_decode_to_same_notification() {
        let v2 = PubsubMessage::v2(8945, &request()).unwrap();
        let legacy = PubsubMessage::legacy(8945, "builds.example.com", &request()).unwrap();

        assert!(v2.is_v2());
        assert!(!legacy.is_v2());

        let expected = BuildNotification {
            build_id: 8945,
            request: request(),
        };
        assert_eq!(v2.decode().unwrap(), expected);
        assert_eq!(legacy.decode().unwrap(), expected);
    }

    #[test]
    fn test_decode_handwritten_envelopes() {
        let user_data = encode_user_data(&request()).unwrap();

        let legacy = format!(
            r#"{{"build": {{"id": "8945", "status": "COMPLETED"}}, "hostname": "h", "user_data": "{}"}}"#,
            user_data
        );
        let message = PubsubMessage {
            data: STANDARD.encode(legacy),
            ..Default::default()
        };
        assert_eq!(message.decode().unwrap().build_id, 8945);

        let v2 = format!(
            r#"{{"buildPubsub": {{"build": {{"id": 8945, "status": "SUCCESS"}}}}, "userData": "{}"}}"#,
            user_data
        );
        let message = PubsubMessage {
            data: STANDARD.encode(v2),
            attributes: HashMap::from([("version".to_string(), "v2".to_string())]),
            ..Default::default()
        };
        assert_eq!(message.decode().unwrap().request, request());
    }

    #[test]
    fn test_decode_rejects_bad_base64() {
        let message = PubsubMessage {
            data: "not base64!".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            message.decode(),
            Err(DecodeError::Base64 { field: "message data", .. })
        ));
    }

    #[test]
    fn test_decode_rejects_wrong_shape() {
        // A v2 payload without the version attribute is read as legacy
        let mut message = PubsubMessage::v2(8945, &request()).unwrap();
        message.attributes.clear();
        assert!(matches!(message.decode(), Err(DecodeError::Json { .. })));
    }

    #[test]
    fn test_decode_rejects_bad_user_data() {
        let legacy = r#"{"build": {"id": "1"}, "user_data": "e30="}"#;
        let message = PubsubMessage {
            data: STANDARD.encode(legacy),
            ..Default::default()
        };
        assert!(matches!(
            message.decode(),
            Err(DecodeError::Json { field: "user data", .. })
        ));
    }

    #[test]
    fn test_push_request_accepts_snake_case_message_id() {
        let json = r#"{"message": {"data": "", "message_id": "42"}, "subscription": "s"}"#;
        let push: PushRequest = serde_json::from_str(json).unwrap();
        assert_eq!(push.message.message_id, "42");
    }
}
