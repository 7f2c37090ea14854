//! KakaoPay endpoints: the authenticated ready call and the public redirect
//! callbacks the gateway sends the browser back to

use axum::{
    extract::{Path, Query, State},
    response::Html,
    Extension, Json,
};
use serde::Deserialize;
use tracing::{error, info};
use uuid::Uuid;

use crate::error::ApiResult;
use crate::middleware::AuthUser;
use crate::payments::{ReadyRequest, ReadyResponse};
use crate::state::AppState;

/// First leg: open a payment session and hand back the redirect URLs
pub async fn ready(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(req): Json<ReadyRequest>,
) -> ApiResult<Json<ReadyResponse>> {
    let response = state.payments.ready(&auth.id.to_string(), &req).await?;
    Ok(Json(response))
}

#[derive(Debug, Deserialize)]
pub struct SuccessQuery {
    pub pg_token: String,
}

/// The gateway redirects into a sandboxed window; escape to the top frame so
/// the frontend takes over.
fn top_redirect_html(target: &str) -> Html<String> {
    Html(format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"></head>
<body>
<script>
  if (window.top) {{
    window.top.location.href = "{target}";
  }} else {{
    window.location.href = "{target}";
  }}
</script>
</body>
</html>"#
    ))
}

/// Approval callback: finish the payment and bounce the browser back to the
/// frontend
pub async fn success(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
    Query(query): Query<SuccessQuery>,
) -> Html<String> {
    let origin = state.payments.frontend_origin().to_string();

    match state.payments.approve(&order_id, &query.pg_token).await {
        Ok(approved) => {
            info!("Payment approved for order {}", order_id);

            // The partner user id is the buyer's id; notify them if it still
            // parses.
            if let Ok(user_id) = approved.partner_user_id.parse::<Uuid>() {
                if let Err(e) = state
                    .notifier
                    .payment_completed(user_id, &order_id, approved.amount.total)
                    .await
                {
                    error!("Failed to send payment notice for {}: {}", order_id, e);
                }
            }

            top_redirect_html(&format!(
                "{}/payment-result/success?order_id={}",
                origin, order_id
            ))
        }
        Err(e) => {
            error!("Payment approval failed for {}: {}", order_id, e);
            top_redirect_html(&format!(
                "{}/payment-result/fail?order_id={}",
                origin, order_id
            ))
        }
    }
}

/// Cancel callback
pub async fn cancel(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> Html<String> {
    info!("Payment cancelled by user for order {}", order_id);
    top_redirect_html(&format!(
        "{}/payment-result/cancel?order_id={}",
        state.payments.frontend_origin(),
        order_id
    ))
}

/// Failure callback
pub async fn fail(State(state): State<AppState>, Path(order_id): Path<String>) -> Html<String> {
    info!("Payment failed at the gateway for order {}", order_id);
    top_redirect_html(&format!(
        "{}/payment-result/fail?order_id={}",
        state.payments.frontend_origin(),
        order_id
    ))
}
