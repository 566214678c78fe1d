use anyhow::{anyhow, Result};

pub const URL_ENV: &str = "SUPABASE_URL";
pub const ANON_KEY_ENV: &str = "SUPABASE_ANON_KEY";

/// Where the hosted project lives and the public key that identifies it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupabaseConfig {
    pub url: String,
    /// Public anon key, sent as `apikey` on every request.
    pub anon_key: String,
}

impl SupabaseConfig {
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        let url: String = url.into();
        Self {
            url: url.trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
        }
    }

    pub fn from_env() -> Result<Self> {
        let url = std::env::var(URL_ENV).map_err(|_| anyhow!("{} is not set", URL_ENV))?;
        let anon_key =
            std::env::var(ANON_KEY_ENV).map_err(|_| anyhow!("{} is not set", ANON_KEY_ENV))?;
        if url.trim().is_empty() {
            return Err(anyhow!("{} is empty", URL_ENV));
        }
        Ok(Self::new(url.trim(), anon_key.trim()))
    }

    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.url, path.trim_start_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_trimmed() {
        let config = SupabaseConfig::new("https://abc.supabase.co/", "key");
        assert_eq!(config.url, "https://abc.supabase.co");
        assert_eq!(
            config.endpoint("/rest/v1/meals"),
            "https://abc.supabase.co/rest/v1/meals"
        );
    }
}
