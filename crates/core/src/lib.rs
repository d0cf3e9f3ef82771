pub mod analytics;
pub mod dashboard;
pub mod domain;
pub mod ingest;
pub mod optimize;
pub mod time;

pub mod config {
    use anyhow::Context;

    const DEFAULT_PORT: u16 = 3000;
    const DEFAULT_DATA_PROVIDER_BASE_URL: &str = "https://query1.finance.yahoo.com";

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub port: u16,
        pub sentry_dsn: Option<String>,
        pub data_provider: Option<String>,
        pub data_provider_base_url: Option<String>,
        pub data_provider_timeout_secs: Option<u64>,
        pub data_provider_retries: Option<u32>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            let port = match std::env::var("PORT") {
                Ok(v) => v
                    .parse::<u16>()
                    .with_context(|| format!("PORT must be a port number (got {v})"))?,
                Err(_) => DEFAULT_PORT,
            };

            Ok(Self {
                port,
                sentry_dsn: std::env::var("SENTRY_DSN").ok(),
                data_provider: std::env::var("DATA_PROVIDER").ok(),
                data_provider_base_url: std::env::var("DATA_PROVIDER_BASE_URL").ok(),
                data_provider_timeout_secs: std::env::var("DATA_PROVIDER_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse::<u64>().ok()),
                data_provider_retries: std::env::var("DATA_PROVIDER_RETRIES")
                    .ok()
                    .and_then(|s| s.parse::<u32>().ok()),
            })
        }

        /// Which market-data backend to use; `yahoo` unless configured otherwise.
        pub fn data_provider_kind(&self) -> anyhow::Result<ProviderKind> {
            match self.data_provider.as_deref().map(str::trim) {
                None | Some("") | Some("yahoo") => Ok(ProviderKind::Yahoo),
                Some("static") => Ok(ProviderKind::Static),
                Some(other) => anyhow::bail!("unknown DATA_PROVIDER: {other}"),
            }
        }

        pub fn resolved_data_provider_base_url(&self) -> &str {
            self.data_provider_base_url
                .as_deref()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(DEFAULT_DATA_PROVIDER_BASE_URL)
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum ProviderKind {
        Yahoo,
        Static,
    }

}
