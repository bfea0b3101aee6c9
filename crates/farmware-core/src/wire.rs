use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use tracing::debug;

use super::state::AdvisoryId;
use super::state::CollectionKind;
use super::state::LoadFailure;
use super::state::LoadOutcome;

/// Body of `POST /send-advisory`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchRequest {
    pub message_id: AdvisoryId,
    pub phone_number: String,
}

/// Response of `POST /send-advisory`. Every field but `success` is optional,
/// and anything other than `success: true` reads as `false`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchReport {
    #[serde(deserialize_with = "strict_true")]
    pub success: bool,
    pub message_id: Option<AdvisoryId>,
    pub phone_number: Option<String>,
    pub advisory_title: Option<String>,
    pub verification_code: Option<String>,
    pub sms_content: Option<String>,
    pub error: Option<String>,
    pub step: Option<String>,
    pub sms_details: Option<Value>,
}

/// Decodes a collection envelope `{ success, <kind>: [...], error }`.
///
/// `success: false` (or no `success` at all) is a collaborator rejection.
/// A body that is not an object, or a successful envelope whose array is
/// missing or mistyped, is treated like a transport failure.
pub fn decode_collection<T: DeserializeOwned>(kind: CollectionKind, payload: Value) -> LoadOutcome<T> {
    let Value::Object(mut envelope) = payload else {
        return LoadOutcome::LoadFailed(LoadFailure::Transport {
            detail: format!("{} response was not a JSON object", kind.label()),
        });
    };

    let success = envelope
        .get("success")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    if !success {
        let reason = envelope
            .get("error")
            .and_then(Value::as_str)
            .map(str::to_string);
        return LoadOutcome::LoadFailed(LoadFailure::Rejected { reason });
    }

    let Some(items) = envelope.remove(kind.label()) else {
        return LoadOutcome::LoadFailed(LoadFailure::Transport {
            detail: format!("{} response is missing the `{}` array", kind.label(), kind.label()),
        });
    };

    match serde_json::from_value::<Vec<T>>(items) {
        Ok(items) => LoadOutcome::Loaded(items),
        Err(error) => LoadOutcome::LoadFailed(LoadFailure::Transport {
            detail: format!("{} response was malformed: {error}", kind.label()),
        }),
    }
}

fn strict_true<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(matches!(value, Value::Bool(true)))
}

/// Decodes a dispatch response. Only a body that is not a JSON object is an
/// error; a mistyped field is dropped and the rest of the report kept.
pub fn decode_dispatch(payload: Value) -> Result<DispatchReport, String> {
    let Value::Object(fields) = payload else {
        return Err("dispatch response was not a JSON object".to_string());
    };
    match serde_json::from_value(Value::Object(fields.clone())) {
        Ok(report) => Ok(report),
        Err(error) => {
            debug!(
                event = "core.wire.dispatch_partially_decoded",
                error = %error
            );
            Ok(salvage_report(&fields))
        }
    }
}

fn salvage_report(fields: &Map<String, Value>) -> DispatchReport {
    let text = |key: &str| fields.get(key).and_then(Value::as_str).map(str::to_string);
    DispatchReport {
        success: matches!(fields.get("success"), Some(Value::Bool(true))),
        message_id: fields
            .get("message_id")
            .cloned()
            .and_then(|id| serde_json::from_value(id).ok()),
        phone_number: text("phone_number"),
        advisory_title: text("advisory_title"),
        verification_code: text("verification_code"),
        sms_content: text("sms_content"),
        error: text("error"),
        step: text("step"),
        sms_details: fields.get("sms_details").filter(|v| !v.is_null()).cloned(),
    }
}
