use anyhow::{bail, Context, Result};

pub const DEFAULT_UMAMI_URL: &str = "https://www.umami.monstecho.top";
pub const DEFAULT_WEBSITE_ID: &str = "a88d93ae-6c6e-46cf-a6cd-5a6a01b0caae";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl Environment {
    /// Error `details` are only ever shown outside production.
    pub fn exposes_error_details(self) -> bool {
        !matches!(self, Environment::Production)
    }
}

#[derive(Debug, Clone)]
pub struct UmamiConfig {
    pub base_url: String,
    pub website_id: String,
    pub token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Environment,
    pub host: String,
    pub port: u16,

    pub umami: UmamiConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    pub fn from_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = Self::parse_environment(&lookup);

        let config = Self {
            environment,
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: lookup("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse()
                .context("Invalid PORT")?,

            umami: UmamiConfig {
                base_url: lookup("UMAMI_URL")
                    .filter(|url| !url.is_empty())
                    .unwrap_or_else(|| DEFAULT_UMAMI_URL.to_string())
                    .trim_end_matches('/')
                    .to_string(),
                website_id: lookup("WEBSITE_ID")
                    .filter(|id| !id.is_empty())
                    .unwrap_or_else(|| DEFAULT_WEBSITE_ID.to_string()),
                token: lookup("UMAMI_TOKEN").filter(|token| !token.is_empty()),
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Unrecognised modes run as production so error details stay hidden.
    fn parse_environment<F>(lookup: &F) -> Environment
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = lookup("ENVIRONMENT")
            .or_else(|| lookup("NODE_ENV"))
            .unwrap_or_else(|| "production".to_string());

        match env.to_lowercase().as_str() {
            "development" | "dev" => Environment::Development,
            "test" | "testing" => Environment::Test,
            "production" | "prod" => Environment::Production,
            _ => {
                tracing::warn!("Unknown environment {:?}, running as production", env);
                Environment::Production
            }
        }
    }

    fn validate(&self) -> Result<()> {
        if !self.umami.base_url.starts_with("http") {
            bail!("UMAMI_URL must be HTTP(S) URL");
        }
        if self.umami.website_id.trim().is_empty() {
            bail!("WEBSITE_ID must not be blank");
        }

        if self.umami.token.is_none() {
            tracing::warn!("UMAMI_TOKEN is not set, /api/umami-stats will answer 500");
        }

        tracing::info!(
            "Configuration validated for {:?} environment",
            self.environment
        );

        Ok(())
    }
}
