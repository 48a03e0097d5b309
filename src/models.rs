// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response structures shared by the HTTP API and the sync
//! client. All wire types derive `Serialize`, `Deserialize`, and `ToSchema`
//! for JSON handling and OpenAPI documentation.
//!
//! ## Secret Payloads
//!
//! A record holds one of four unrelated shapes. At the API boundary they are
//! the [`SecretPayload`] sum type, serialized adjacently tagged:
//!
//! ```json
//! {"kind": "PAIR", "payload": {"key": "github", "pwd": "p@ss"}}
//! ```
//!
//! Only at the storage boundary is the inner payload flattened to a
//! kind-neutral byte string (see [`SecretPayload::to_bytes`]). Reading it back
//! always goes through [`SecretPayload::from_bytes`] with the stored kind tag,
//! so a tag and a blob that disagree fail to decode instead of drifting apart.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Account identifier, assigned by the store's account sequence.
pub type AccountId = u64;

/// Record identifier, assigned by the store's record sequence.
pub type RecordId = u64;

// =============================================================================
// Record Kinds
// =============================================================================

/// Closed set of secret kinds a record can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordKind {
    /// Login/password pair
    Pair,
    /// Free text note
    Text,
    /// Named binary file
    Binary,
    /// Payment card
    Card,
}

impl RecordKind {
    /// Wire name of the kind tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Pair => "PAIR",
            RecordKind::Text => "TEXT",
            RecordKind::Binary => "BINARY",
            RecordKind::Card => "CARD",
        }
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Payload Shapes
// =============================================================================

/// Login/password pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct PairData {
    /// Login, account name or site key
    pub key: String,
    /// Password
    pub pwd: String,
}

/// Free-form text secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct TextData {
    pub text: String,
}

/// Binary file contents with the original file name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct BinaryData {
    pub file_name: String,
    /// File contents, base64 encoded on the wire
    #[serde(with = "base64_bytes")]
    #[schema(value_type = String, format = Byte)]
    pub binary: Vec<u8>,
}

/// Payment card details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CardData {
    pub card_num: String,
    pub card_cvv: String,
    pub card_owner: String,
    /// Expiry, as printed on the card (e.g. `12/29`)
    pub card_exp: String,
}

/// Kind-tagged secret payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", content = "payload", rename_all = "UPPERCASE")]
pub enum SecretPayload {
    Pair(PairData),
    Text(TextData),
    Binary(BinaryData),
    Card(CardData),
}

impl SecretPayload {
    /// Kind tag matching this payload's shape.
    pub fn kind(&self) -> RecordKind {
        match self {
            SecretPayload::Pair(_) => RecordKind::Pair,
            SecretPayload::Text(_) => RecordKind::Text,
            SecretPayload::Binary(_) => RecordKind::Binary,
            SecretPayload::Card(_) => RecordKind::Card,
        }
    }

    /// Check that the required sub-fields of the payload are present.
    pub fn validate(&self) -> Result<(), String> {
        let missing = match self {
            SecretPayload::Pair(pair) => first_empty(&[("key", &pair.key), ("pwd", &pair.pwd)]),
            SecretPayload::Text(text) => first_empty(&[("text", &text.text)]),
            SecretPayload::Binary(binary) => first_empty(&[("file_name", &binary.file_name)]),
            SecretPayload::Card(card) => first_empty(&[
                ("card_num", &card.card_num),
                ("card_cvv", &card.card_cvv),
                ("card_owner", &card.card_owner),
                ("card_exp", &card.card_exp),
            ]),
        };

        match missing {
            Some(field) => Err(format!("{} payload requires a non-empty `{field}`", self.kind())),
            None => Ok(()),
        }
    }

    /// Serialize the inner payload (without its tag) for encryption.
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        match self {
            SecretPayload::Pair(pair) => serde_json::to_vec(pair),
            SecretPayload::Text(text) => serde_json::to_vec(text),
            SecretPayload::Binary(binary) => serde_json::to_vec(binary),
            SecretPayload::Card(card) => serde_json::to_vec(card),
        }
    }

    /// Decode a payload previously produced by [`SecretPayload::to_bytes`].
    ///
    /// Fails if the bytes do not have exactly the shape `kind` prescribes.
    pub fn from_bytes(kind: RecordKind, bytes: &[u8]) -> Result<Self, serde_json::Error> {
        Ok(match kind {
            RecordKind::Pair => SecretPayload::Pair(serde_json::from_slice(bytes)?),
            RecordKind::Text => SecretPayload::Text(serde_json::from_slice(bytes)?),
            RecordKind::Binary => SecretPayload::Binary(serde_json::from_slice(bytes)?),
            RecordKind::Card => SecretPayload::Card(serde_json::from_slice(bytes)?),
        })
    }
}

fn first_empty(fields: &[(&'static str, &String)]) -> Option<&'static str> {
    fields
        .iter()
        .find(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| *name)
}

// =============================================================================
// Record Models
// =============================================================================

/// A decrypted record as returned to its owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DataRecord {
    /// Store-assigned identifier.
    pub id: RecordId,
    /// The secret itself.
    pub secret: SecretPayload,
    /// User-supplied label.
    pub annotation: String,
    /// Creation or last update time.
    pub uploaded_at: DateTime<Utc>,
}

/// Body of `CreateData` and `UpdateData`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DataRequest {
    /// The secret to store.
    pub secret: SecretPayload,
    /// Optional label, stored encrypted alongside the secret.
    #[serde(default)]
    pub annotation: String,
}

/// Response containing every record the caller owns.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DataListResponse {
    pub records: Vec<DataRecord>,
    /// Total count of records.
    pub total: usize,
}

// =============================================================================
// Account Models
// =============================================================================

/// Request to create a new account.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Request to log in to an existing account.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Bearer token issued at registration or login.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub token: String,
}

mod base64_bytes {
    use base64ct::{Base64, Encoding};
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&Base64::encode_string(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        Base64::decode_vec(&encoded).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair() -> SecretPayload {
        SecretPayload::Pair(PairData {
            key: "github".to_string(),
            pwd: "p@ss".to_string(),
        })
    }

    #[test]
    fn payload_serializes_adjacently_tagged() {
        let json = serde_json::to_value(pair()).unwrap();
        assert_eq!(json["kind"], "PAIR");
        assert_eq!(json["payload"]["key"], "github");
        assert_eq!(json["payload"]["pwd"], "p@ss");
    }

    #[test]
    fn binary_payload_is_base64_on_the_wire() {
        let payload = SecretPayload::Binary(BinaryData {
            file_name: "id_rsa".to_string(),
            binary: vec![0, 1, 2, 255],
        });
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["payload"]["binary"], "AAEC/w==");

        let back: SecretPayload = serde_json::from_value(json).unwrap();
        assert_eq!(back, payload);
    }

    #[test]
    fn from_bytes_rejects_shape_of_another_kind() {
        let card = SecretPayload::Card(CardData {
            card_num: "4111111111111111".to_string(),
            card_cvv: "123".to_string(),
            card_owner: "ALICE".to_string(),
            card_exp: "12/29".to_string(),
        });
        let bytes = card.to_bytes().unwrap();

        assert!(SecretPayload::from_bytes(RecordKind::Pair, &bytes).is_err());
        assert!(SecretPayload::from_bytes(RecordKind::Text, &bytes).is_err());
        assert_eq!(SecretPayload::from_bytes(RecordKind::Card, &bytes).unwrap(), card);
    }

    #[test]
    fn validate_reports_first_missing_field() {
        let payload = SecretPayload::Pair(PairData {
            key: "github".to_string(),
            pwd: "  ".to_string(),
        });
        let err = payload.validate().unwrap_err();
        assert!(err.contains("`pwd`"), "unexpected message: {err}");
        assert!(pair().validate().is_ok());
    }

    #[test]
    fn unknown_kind_tag_is_rejected() {
        let json = r#"{"kind":"WALLET","payload":{"key":"a","pwd":"b"}}"#;
        assert!(serde_json::from_str::<SecretPayload>(json).is_err());
    }

    #[test]
    fn data_request_annotation_defaults_to_empty() {
        let json = r#"{"secret":{"kind":"TEXT","payload":{"text":"hello"}}}"#;
        let request: DataRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.annotation, "");
        assert_eq!(request.secret.kind(), RecordKind::Text);
    }
}
