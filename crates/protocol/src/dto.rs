use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use placehub_common::{HubError, ProtocolError, ValidationError};

use crate::field::{coerce_optional, coerce_required, coerce_truthy};

/// Decodifica o corpo como objeto JSON. Corpo vazio equivale a `{}`.
fn parse_object(body: &[u8]) -> Result<Map<String, Value>, ProtocolError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(ProtocolError::NotAnObject),
        Err(e) => Err(ProtocolError::InvalidJson(e.to_string())),
    }
}

/// Corpo de `POST /api/addPlace`.
///
/// A serialização é a que o cliente envia; a leitura passa por
/// [`PlaceHeartbeat::from_json`], que aplica a coerção de campos.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceHeartbeat {
    pub place_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl PlaceHeartbeat {
    pub fn from_json(body: &[u8]) -> Result<Self, HubError> {
        let map = parse_object(body)?;
        let place_id = coerce_required(map.get("placeId"), ValidationError::MissingPlaceId)?;
        let display_name = coerce_optional(map.get("displayName"));
        Ok(Self {
            place_id,
            display_name,
        })
    }
}

/// Corpo de `POST /api/execute`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScriptSubmission {
    #[serde(rename = "uniqueId")]
    pub unique_id: String,
    #[serde(rename = "pendingScriptToAdd")]
    pub script: String,
}

impl ScriptSubmission {
    pub fn from_json(body: &[u8]) -> Result<Self, HubError> {
        let map = parse_object(body)?;
        let unique_id = coerce_truthy(map.get("uniqueId"), ValidationError::MissingScriptFields)?;
        let script = coerce_truthy(
            map.get("pendingScriptToAdd"),
            ValidationError::MissingScriptFields,
        )?;
        Ok(Self { unique_id, script })
    }
}

/// Resposta 201 de `POST /api/execute`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedResponse {
    pub status: String,
    pub unique_id: String,
}

impl QueuedResponse {
    pub fn queued(unique_id: impl Into<String>) -> Self {
        Self {
            status: "queued".into(),
            unique_id: unique_id.into(),
        }
    }
}

/// Item de `GET /api/pendingScripts`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingScriptDto {
    pub unique_id: String,
    pub script: String,
    pub expires_in_ms: u64,
}

/// `GET /api/options`: id -> displayName.
pub type PlacesResponse = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub places: usize,
    pub pending_scripts: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
