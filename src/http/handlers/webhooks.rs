use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::{json, Value};

use crate::gateways::WebhookEvent;
use crate::AppState;

/// Gateway push endpoint. Apart from a bad shared secret, this always
/// acknowledges with 200 so the provider's retry policy never fires on our
/// internal failures; those are recorded in `webhook_failures` instead.
/// The body is taken raw so even unparseable deliveries get acknowledged.
pub async fn asaas_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> impl IntoResponse {
    if let Some(expected) = state.webhook_token.as_deref() {
        let provided = headers
            .get("asaas-access-token")
            .and_then(|h| h.to_str().ok())
            .unwrap_or("");
        if provided != expected {
            return (StatusCode::UNAUTHORIZED, Json(json!({ "error": "unauthorized" })));
        }
    }

    let raw: Value = match serde_json::from_str(&body) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(error = %e, "unparseable webhook payload");
            return (StatusCode::OK, Json(json!({ "received": true })));
        }
    };

    let event: WebhookEvent = match serde_json::from_value(raw.clone()) {
        Ok(e) => e,
        Err(e) => {
            tracing::warn!(error = %e, "webhook payload missing expected fields");
            return (StatusCode::OK, Json(json!({ "received": true })));
        }
    };

    if let Err(e) = state.workflow.handle_webhook(&event).await {
        let gateway_payment_id = event.payment.as_ref().map(|p| p.id.clone());
        let event_type = raw
            .get("event")
            .and_then(Value::as_str)
            .unwrap_or("UNKNOWN")
            .to_string();
        tracing::error!(
            error = %e,
            gateway_payment_id = gateway_payment_id.as_deref().unwrap_or("-"),
            %event_type,
            "webhook processing failed, acknowledging anyway"
        );
        if let Err(record_err) = state
            .webhook_failures
            .insert(
                gateway_payment_id.as_deref(),
                &event_type,
                &e.to_string(),
                Some(raw),
            )
            .await
        {
            tracing::error!(error = %record_err, "could not record webhook failure");
        }
    }

    (StatusCode::OK, Json(json!({ "received": true })))
}
