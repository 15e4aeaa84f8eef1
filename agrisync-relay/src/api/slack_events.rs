//! POST /slack/events - Events API and Interactivity endpoint
//!
//! Every request must carry a valid Slack signature. After that the relay
//! never fails a request: unknown or unparseable payloads are acknowledged
//! with 200 so Slack does not retry them.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::{error, info, warn};

use super::signature::{verify_signature, SIGNATURE_HEADER, TIMESTAMP_HEADER};
use crate::error::{RelayError, RelayResult};
use crate::home_view::{home_view, START_SYNC_ACTION_ID};
use crate::AppState;
use agrisync_common::{JobRequest, TriggerSource};

const PAYLOAD_FORM_PREFIX: &str = "payload=";

/// The fields of an incoming Slack payload that the relay looks at
#[derive(Debug, Default, Deserialize)]
struct SlackPayload {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    challenge: Option<String>,
    #[serde(default)]
    actions: Vec<Action>,
    #[serde(default)]
    user: Option<ActionUser>,
    #[serde(default)]
    event: Option<InnerEvent>,
}

#[derive(Debug, Deserialize)]
struct Action {
    #[serde(default)]
    action_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ActionUser {
    id: String,
}

#[derive(Debug, Deserialize)]
struct InnerEvent {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    user: Option<String>,
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
}

fn ok() -> Response {
    (StatusCode::OK, "ok").into_response()
}

/// `payload=<urlencoded json>` (Interactivity) or a raw JSON body (Events API)
fn parse_payload(body: &[u8]) -> Result<SlackPayload, String> {
    if body.starts_with(PAYLOAD_FORM_PREFIX.as_bytes()) {
        let json = url::form_urlencoded::parse(body)
            .find(|(key, _)| key == "payload")
            .map(|(_, value)| value.into_owned())
            .ok_or_else(|| "payload field missing".to_string())?;
        serde_json::from_str(&json).map_err(|e| e.to_string())
    } else {
        serde_json::from_slice(body).map_err(|e| e.to_string())
    }
}

/// POST /slack/events
pub async fn slack_events(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> RelayResult<Response> {
    let (Some(timestamp), Some(signature)) = (
        header(&headers, TIMESTAMP_HEADER),
        header(&headers, SIGNATURE_HEADER),
    ) else {
        warn!("Rejected request without signature headers");
        return Err(RelayError::MissingSignature);
    };

    if !verify_signature(&state.signing_secret, timestamp, &body, signature) {
        warn!("Rejected request with invalid signature");
        return Err(RelayError::InvalidSignature);
    }

    if body.is_empty() {
        return Ok((StatusCode::OK, "Empty body").into_response());
    }

    let payload = match parse_payload(&body) {
        Ok(payload) => payload,
        Err(e) => {
            error!(
                "Failed to parse payload: {} (body: {})",
                e,
                String::from_utf8_lossy(&body)
            );
            return Ok(ok());
        }
    };

    dispatch(&state, payload).await
}

async fn dispatch(state: &AppState, payload: SlackPayload) -> RelayResult<Response> {
    match payload.kind.as_str() {
        "url_verification" => {
            info!("URL verification challenge");
            return Ok((StatusCode::OK, payload.challenge.unwrap_or_default()).into_response());
        }
        "block_actions" => {
            let first_action = payload.actions.first().and_then(|a| a.action_id.as_deref());
            if first_action == Some(START_SYNC_ACTION_ID) {
                return Ok(start_sync(state, payload.user.map(|u| u.id)));
            }
        }
        _ => {}
    }

    if let Some(event) = payload.event {
        if event.kind == "app_home_opened" {
            publish_home(state, event.user).await;
        }
    }

    Ok(ok())
}

/// Launch failures are logged; the button press is still acknowledged so Slack
/// does not retry it
fn start_sync(state: &AppState, user_id: Option<String>) -> Response {
    let Some(user_id) = user_id else {
        warn!("Start button pressed without a user id");
        return ok();
    };

    info!(user = %user_id, "Start button pressed, launching sync job");
    let request = JobRequest::new(Some(user_id), TriggerSource::SlackButton);
    if let Err(e) = state.launcher.launch(&request) {
        error!(user = ?request.user_id, "Failed to launch sync job: {}", e);
        return ok();
    }

    (StatusCode::OK, "").into_response()
}

/// Publish failures are logged; the request is still acknowledged
async fn publish_home(state: &AppState, user_id: Option<String>) {
    let Some(user_id) = user_id else {
        warn!("app_home_opened without a user id");
        return;
    };
    let Some(slack) = &state.slack else {
        warn!("BOT_TOKEN not configured, cannot publish home view");
        return;
    };

    if let Err(e) = slack.publish_view(&user_id, &home_view()).await {
        error!(user = %user_id, "Failed to publish home view: {}", e);
    }
}
