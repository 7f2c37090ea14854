//! Kakao OAuth2 integration for social login

use anyhow::Result;
use oauth2::{
    basic::BasicClient, AuthUrl, ClientId, ClientSecret, RedirectUrl, TokenResponse, TokenUrl,
};
use serde::Deserialize;
use std::env;
use tracing::info;

/// Kakao OAuth2 configuration
#[derive(Debug, Clone)]
pub struct KakaoOAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,
    pub auth_url: String,
    pub token_url: String,
}

impl KakaoOAuthConfig {
    pub fn from_env() -> Self {
        Self {
            client_id: env::var("KAKAO_CLIENT_ID").unwrap_or_default(),
            client_secret: env::var("KAKAO_CLIENT_SECRET").unwrap_or_default(),
            redirect_url: env::var("KAKAO_REDIRECT_URL")
                .unwrap_or_else(|_| "http://localhost:3000/oauth/kakao".to_string()),
            auth_url: env::var("KAKAO_AUTH_URL")
                .unwrap_or_else(|_| "https://kauth.kakao.com/oauth/authorize".to_string()),
            token_url: env::var("KAKAO_TOKEN_URL")
                .unwrap_or_else(|_| "https://kauth.kakao.com/oauth/token".to_string()),
        }
    }
}

/// Kakao OAuth2 client wrapper
#[derive(Clone)]
pub struct KakaoOAuthClient {
    client: BasicClient,
    http: reqwest::Client,
}

impl KakaoOAuthClient {
    pub fn new(config: &KakaoOAuthConfig) -> Result<Self> {
        let client = BasicClient::new(
            ClientId::new(config.client_id.clone()),
            Some(ClientSecret::new(config.client_secret.clone())),
            AuthUrl::new(config.auth_url.clone())?,
            Some(TokenUrl::new(config.token_url.clone())?),
        )
        .set_redirect_uri(RedirectUrl::new(config.redirect_url.clone())?);

        Ok(Self {
            client,
            http: reqwest::Client::new(),
        })
    }

    /// Exchange an authorization code for an access token
    pub async fn exchange_code(&self, code: String) -> Result<String> {
        info!("Exchanging Kakao authorization code for access token");

        let token_response = self
            .client
            .exchange_code(oauth2::AuthorizationCode::new(code))
            .request_async(oauth2::reqwest::async_http_client)
            .await?;

        Ok(token_response.access_token().secret().clone())
    }

    /// Fetch the Kakao account profile for an access token
    pub async fn get_user_profile(&self, access_token: &str) -> Result<KakaoUserProfile> {
        let response = self
            .http
            .get("https://kapi.kakao.com/v2/user/me")
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!(
                "Failed to get Kakao user profile: {}",
                response.status()
            ));
        }

        let me: KakaoMeResponse = response.json().await?;
        Ok(KakaoUserProfile {
            id: me.id,
            nickname: me.properties.and_then(|p| p.nickname),
        })
    }
}

#[derive(Debug, Deserialize)]
struct KakaoMeResponse {
    id: i64,
    #[serde(default)]
    properties: Option<KakaoProperties>,
}

#[derive(Debug, Deserialize)]
struct KakaoProperties {
    #[serde(default)]
    nickname: Option<String>,
}

/// Kakao account profile
#[derive(Debug, Clone)]
pub struct KakaoUserProfile {
    pub id: i64,
    pub nickname: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_response_parses_with_and_without_properties() {
        let full: KakaoMeResponse =
            serde_json::from_str(r#"{"id": 123, "properties": {"nickname": "sunny"}}"#)
                .expect("full profile");
        assert_eq!(full.id, 123);
        assert_eq!(
            full.properties.and_then(|p| p.nickname).as_deref(),
            Some("sunny")
        );

        let bare: KakaoMeResponse = serde_json::from_str(r#"{"id": 456}"#).expect("bare profile");
        assert_eq!(bare.id, 456);
        assert!(bare.properties.is_none());
    }
}
