//! KakaoPay integration: ready/approve calls and the in-memory session map
//! that bridges the two legs of the flow.
//!
//! A `ready` call opens a payment session keyed by partner order id; the
//! matching `approve` consumes it. Sessions live only in process memory, a
//! restart between the two legs aborts the payment.

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tracing::info;

use crate::error::ApiError;

/// KakaoPay gateway configuration
#[derive(Debug, Clone)]
pub struct KakaoPayConfig {
    pub host: String,
    pub admin_key: String,
    pub cid: String,
    pub callback_base: String,
    pub frontend_origin: String,
}

impl KakaoPayConfig {
    pub fn from_env() -> Self {
        Self {
            host: env::var("KAKAOPAY_HOST")
                .unwrap_or_else(|_| "https://kapi.kakao.com".to_string()),
            admin_key: env::var("KAKAOPAY_ADMIN_KEY").unwrap_or_default(),
            cid: env::var("KAKAOPAY_CID").unwrap_or_else(|_| "TC0ONETIME".to_string()),
            callback_base: env::var("KAKAOPAY_CALLBACK_BASE")
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            frontend_origin: env::var("FRONTEND_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
        }
    }
}

#[derive(Error, Debug)]
pub enum PaymentError {
    #[error("Payment gateway admin key is not configured")]
    MissingAdminKey,
    #[error("No pending payment session for order {0}")]
    UnknownOrder(String),
    #[error("Payment gateway request failed: {0}")]
    Gateway(String),
}

impl From<PaymentError> for ApiError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::UnknownOrder(order_id) => {
                ApiError::Conflict(format!("No pending payment session for order {}", order_id))
            }
            PaymentError::MissingAdminKey | PaymentError::Gateway(_) => {
                ApiError::InternalServerError
            }
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ReadyRequest {
    pub partner_order_id: String,
    pub item_name: String,
    pub quantity: u32,
    pub total_amount: i64,
    #[serde(default)]
    pub tax_free_amount: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReadyResponse {
    pub tid: String,
    pub next_redirect_pc_url: String,
    #[serde(default)]
    pub next_redirect_mobile_url: Option<String>,
    #[serde(default)]
    pub next_redirect_app_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ApprovedAmount {
    #[serde(default)]
    pub total: i64,
    #[serde(default)]
    pub tax_free: i64,
    #[serde(default)]
    pub vat: i64,
    #[serde(default)]
    pub point: i64,
    #[serde(default)]
    pub discount: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApproveResponse {
    pub aid: String,
    pub tid: String,
    pub partner_order_id: String,
    pub partner_user_id: String,
    #[serde(default)]
    pub payment_method_type: Option<String>,
    #[serde(default)]
    pub item_name: Option<String>,
    #[serde(default)]
    pub approved_at: Option<String>,
    #[serde(default)]
    pub amount: ApprovedAmount,
}

/// State carried between ready and approve
#[derive(Debug, Clone)]
pub struct PaymentSession {
    pub tid: String,
    pub partner_user_id: String,
}

/// KakaoPay client with its session store
#[derive(Clone)]
pub struct KakaoPayService {
    config: KakaoPayConfig,
    http: reqwest::Client,
    sessions: Arc<RwLock<HashMap<String, PaymentSession>>>,
}

impl KakaoPayService {
    pub fn new(config: KakaoPayConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn frontend_origin(&self) -> &str {
        &self.config.frontend_origin
    }

    fn headers(&self) -> Result<HeaderMap, PaymentError> {
        if self.config.admin_key.is_empty() {
            return Err(PaymentError::MissingAdminKey);
        }

        let mut headers = HeaderMap::new();
        let auth = format!("KakaoAK {}", self.config.admin_key);
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth).map_err(|e| PaymentError::Gateway(e.to_string()))?,
        );
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded;charset=utf-8"),
        );
        Ok(headers)
    }

    fn remember(&self, order_id: &str, session: PaymentSession) {
        if let Ok(mut sessions) = self.sessions.write() {
            sessions.insert(order_id.to_string(), session);
        }
    }

    fn session_for(&self, order_id: &str) -> Option<PaymentSession> {
        self.sessions
            .read()
            .ok()
            .and_then(|sessions| sessions.get(order_id).cloned())
    }

    fn forget(&self, order_id: &str) {
        if let Ok(mut sessions) = self.sessions.write() {
            sessions.remove(order_id);
        }
    }

    /// Number of open payment sessions, for monitoring
    pub fn open_sessions(&self) -> usize {
        self.sessions.read().map(|s| s.len()).unwrap_or(0)
    }

    fn ready_params(&self, user_id: &str, req: &ReadyRequest) -> Vec<(&'static str, String)> {
        let order_id = &req.partner_order_id;
        vec![
            ("cid", self.config.cid.clone()),
            ("partner_order_id", order_id.clone()),
            ("partner_user_id", user_id.to_string()),
            ("item_name", req.item_name.clone()),
            ("quantity", req.quantity.to_string()),
            ("total_amount", req.total_amount.to_string()),
            ("tax_free_amount", req.tax_free_amount.to_string()),
            (
                "approval_url",
                format!("{}/kakaopay/success/{}", self.config.callback_base, order_id),
            ),
            (
                "cancel_url",
                format!("{}/kakaopay/cancel/{}", self.config.callback_base, order_id),
            ),
            (
                "fail_url",
                format!("{}/kakaopay/fail/{}", self.config.callback_base, order_id),
            ),
        ]
    }

    /// First leg: ask the gateway for a redirect URL and open a session
    pub async fn ready(
        &self,
        user_id: &str,
        req: &ReadyRequest,
    ) -> Result<ReadyResponse, PaymentError> {
        let headers = self.headers()?;
        let params = self.ready_params(user_id, req);

        let response = self
            .http
            .post(format!("{}/v1/payment/ready", self.config.host))
            .headers(headers)
            .form(&params)
            .send()
            .await
            .map_err(|e| PaymentError::Gateway(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(PaymentError::Gateway(format!("{}: {}", status, body)));
        }

        let ready: ReadyResponse = response
            .json()
            .await
            .map_err(|e| PaymentError::Gateway(e.to_string()))?;

        self.remember(
            &req.partner_order_id,
            PaymentSession {
                tid: ready.tid.clone(),
                partner_user_id: user_id.to_string(),
            },
        );
        info!(
            "Payment session opened: order_id={}, tid={}",
            req.partner_order_id, ready.tid
        );

        Ok(ready)
    }

    /// Second leg: approve with the pg_token from the redirect. Requires a
    /// session opened by a prior `ready`; the session is consumed only on
    /// success.
    pub async fn approve(
        &self,
        order_id: &str,
        pg_token: &str,
    ) -> Result<ApproveResponse, PaymentError> {
        let session = self
            .session_for(order_id)
            .ok_or_else(|| PaymentError::UnknownOrder(order_id.to_string()))?;

        let headers = self.headers()?;
        let params = vec![
            ("cid", self.config.cid.clone()),
            ("tid", session.tid.clone()),
            ("partner_order_id", order_id.to_string()),
            ("partner_user_id", session.partner_user_id.clone()),
            ("pg_token", pg_token.to_string()),
        ];

        let response = self
            .http
            .post(format!("{}/v1/payment/approve", self.config.host))
            .headers(headers)
            .form(&params)
            .send()
            .await
            .map_err(|e| PaymentError::Gateway(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(PaymentError::Gateway(format!("{}: {}", status, body)));
        }

        let approved: ApproveResponse = response
            .json()
            .await
            .map_err(|e| PaymentError::Gateway(e.to_string()))?;

        self.forget(order_id);
        info!(
            "Payment approved: order_id={}, aid={}, total={}",
            order_id, approved.aid, approved.amount.total
        );

        Ok(approved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> KakaoPayConfig {
        KakaoPayConfig {
            host: "https://kapi.kakao.com".to_string(),
            admin_key: "test-admin-key".to_string(),
            cid: "TC0ONETIME".to_string(),
            callback_base: "http://localhost:8080".to_string(),
            frontend_origin: "http://localhost:3000".to_string(),
        }
    }

    fn ready_request() -> ReadyRequest {
        ReadyRequest {
            partner_order_id: "order-42".to_string(),
            item_name: "Compact rental".to_string(),
            quantity: 1,
            total_amount: 36000,
            tax_free_amount: 0,
        }
    }

    #[test]
    fn approve_without_ready_is_rejected() {
        let service = KakaoPayService::new(test_config());

        let err =
            tokio_test::block_on(service.approve("order-42", "pg-token")).expect_err("no session");
        assert!(matches!(err, PaymentError::UnknownOrder(ref o) if o == "order-42"));

        // And it maps to a conflict at the API layer.
        let api: ApiError = err.into();
        assert!(matches!(api, ApiError::Conflict(_)));
    }

    #[tokio::test]
    async fn ready_without_admin_key_fails_before_any_network_call() {
        let mut config = test_config();
        config.admin_key = String::new();
        let service = KakaoPayService::new(config);

        let err = service
            .ready("user-1", &ready_request())
            .await
            .expect_err("no key");
        assert!(matches!(err, PaymentError::MissingAdminKey));
    }

    #[test]
    #[serial_test::serial]
    fn config_defaults_without_env() {
        for key in [
            "KAKAOPAY_HOST",
            "KAKAOPAY_ADMIN_KEY",
            "KAKAOPAY_CID",
            "KAKAOPAY_CALLBACK_BASE",
            "FRONTEND_ORIGIN",
        ] {
            // Safe: the serial guard keeps env mutation single-threaded here.
            unsafe { std::env::remove_var(key) };
        }

        let config = KakaoPayConfig::from_env();
        assert_eq!(config.host, "https://kapi.kakao.com");
        assert_eq!(config.cid, "TC0ONETIME");
        assert!(config.admin_key.is_empty());
        assert_eq!(config.frontend_origin, "http://localhost:3000");
    }

    #[test]
    fn ready_params_carry_cid_user_and_callbacks() {
        let service = KakaoPayService::new(test_config());
        let params = service.ready_params("user-1", &ready_request());

        let get = |key: &str| {
            params
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.as_str())
                .expect("param")
        };
        assert_eq!(get("cid"), "TC0ONETIME");
        assert_eq!(get("partner_user_id"), "user-1");
        assert_eq!(get("total_amount"), "36000");
        assert_eq!(
            get("approval_url"),
            "http://localhost:8080/kakaopay/success/order-42"
        );
        assert_eq!(
            get("fail_url"),
            "http://localhost:8080/kakaopay/fail/order-42"
        );
    }

    #[test]
    fn sessions_are_tracked_per_order() {
        let service = KakaoPayService::new(test_config());
        assert_eq!(service.open_sessions(), 0);

        service.remember(
            "order-42",
            PaymentSession {
                tid: "T1234".to_string(),
                partner_user_id: "user-1".to_string(),
            },
        );
        assert_eq!(service.open_sessions(), 1);
        let session = service.session_for("order-42").expect("session");
        assert_eq!(session.tid, "T1234");

        service.forget("order-42");
        assert!(service.session_for("order-42").is_none());
    }
}
