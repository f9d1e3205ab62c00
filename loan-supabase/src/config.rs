use anyhow::{Context, Result};

/// Connection settings for the hosted backend.
#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    /// Project base URL, e.g. `https://abc.supabase.co`.
    pub url: String,
    /// Project anon key, sent as the `apikey` header on every call.
    pub anon_key: String,
}

impl SupabaseConfig {
    /// Reads `SUPABASE_URL` and `SUPABASE_ANON_KEY` from the environment,
    /// loading a `.env` file first when one is present.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let url = std::env::var("SUPABASE_URL").context("SUPABASE_URL is not set")?;
        let anon_key =
            std::env::var("SUPABASE_ANON_KEY").context("SUPABASE_ANON_KEY is not set")?;

        Ok(Self { url, anon_key })
    }
}
