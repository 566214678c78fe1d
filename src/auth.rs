use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use crate::config::SupabaseConfig;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    expires_in: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    id: String,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Clone)]
pub struct SupabaseAuth {
    client: Client,
    config: SupabaseConfig,
    refresh_token: Arc<Mutex<String>>,
    cached_token: Arc<Mutex<Option<CachedToken>>>,
}

fn expiry(expires_in: Option<i64>) -> chrono::DateTime<chrono::Utc> {
    chrono::Utc::now() + chrono::Duration::seconds(expires_in.unwrap_or(3600))
}

impl SupabaseAuth {
    pub fn new(config: SupabaseConfig, refresh_token: String) -> Self {
        Self {
            client: Client::new(),
            config,
            refresh_token: Arc::new(Mutex::new(refresh_token)),
            cached_token: Arc::new(Mutex::new(None)),
        }
    }

    pub fn config(&self) -> &SupabaseConfig {
        &self.config
    }

    /// Sign in with email and password.
    pub async fn sign_in_with_password(
        config: SupabaseConfig,
        email: &str,
        password: &str,
    ) -> Result<Self> {
        let client = Client::new();
        let url = config.endpoint("auth/v1/token");
        debug!(%url, "signing in with password");

        let resp = client
            .post(&url)
            .query(&[("grant_type", "password")])
            .header("apikey", &config.anon_key)
            .json(&serde_json::json!({
                "email": email,
                "password": password,
            }))
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow!("Sign-in failed: {} - {}", status, body));
        }

        let token: TokenResponse = resp.json().await?;

        Ok(Self {
            client,
            config,
            refresh_token: Arc::new(Mutex::new(token.refresh_token)),
            cached_token: Arc::new(Mutex::new(Some(CachedToken {
                access_token: token.access_token,
                expires_at: expiry(token.expires_in),
            }))),
        })
    }

    pub async fn get_access_token(&self) -> Result<String> {
        // Reuse the cached token while it has more than a minute left
        {
            let cached = self.cached_token.lock().await;
            if let Some(ref token) = *cached {
                if token.expires_at > chrono::Utc::now() + chrono::Duration::seconds(60) {
                    return Ok(token.access_token.clone());
                }
            }
        }

        self.refresh_access_token().await
    }

    async fn refresh_access_token(&self) -> Result<String> {
        let refresh_token = self.refresh_token.lock().await.clone();
        let url = self.config.endpoint("auth/v1/token");
        debug!(%url, "refreshing access token");

        let resp = self
            .client
            .post(&url)
            .query(&[("grant_type", "refresh_token")])
            .header("apikey", &self.config.anon_key)
            .json(&serde_json::json!({ "refresh_token": refresh_token }))
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow!("Failed to refresh token: {} - {}", status, body));
        }

        let token: TokenResponse = resp.json().await?;

        // Refresh tokens are single use
        *self.refresh_token.lock().await = token.refresh_token;

        let access_token = token.access_token.clone();
        *self.cached_token.lock().await = Some(CachedToken {
            access_token: token.access_token,
            expires_at: expiry(token.expires_in),
        });

        Ok(access_token)
    }

    pub async fn get_user_id(&self) -> Result<String> {
        let token = self.get_access_token().await?;
        let url = self.config.endpoint("auth/v1/user");

        let resp = self
            .client
            .get(&url)
            .header("apikey", &self.config.anon_key)
            .bearer_auth(&token)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow!("Failed to load user: {} - {}", status, body));
        }

        let user: UserResponse = resp.json().await?;
        if user.id.is_empty() {
            return Err(anyhow!("No user id in auth response"));
        }
        Ok(user.id)
    }
}
