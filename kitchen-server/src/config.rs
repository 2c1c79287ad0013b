//! Server configuration

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Server configuration, loaded once at startup
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection URL
    pub database_url: String,
    /// HTTP port
    pub http_port: u16,
    /// Environment: development | staging | production
    pub environment: String,
    /// HMAC secret for identity tokens
    pub jwt_secret: String,
    /// Stripe secret key
    pub stripe_secret_key: String,
    /// ISO currency for payment intents
    pub payment_currency: String,
    /// Gemini API key for the chat assistant
    pub gemini_api_key: String,
    /// Gemini model name
    pub gemini_model: String,
    /// Origins allowed to make cross-origin requests
    pub allowed_origins: Vec<String>,
}

impl Config {
    /// Require a secret env var: must be set and non-empty in non-development environments.
    fn require_secret(names: &[&str], environment: &str) -> Result<String, BoxError> {
        let primary = names.first().copied().unwrap_or_default();
        let val = names
            .iter()
            .find_map(|name| std::env::var(name).ok())
            .unwrap_or_default();

        if val.is_empty() {
            if environment != "development" {
                return Err(format!("{primary} must be set in {environment} environment").into());
            }
            tracing::warn!("{primary} not set, using development placeholder");
            return Ok(format!("dev-{primary}-not-for-production"));
        }
        Ok(val)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());

        Ok(Self {
            database_url: std::env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set")?,
            http_port: std::env::var("HTTP_PORT")
                .or_else(|_| std::env::var("PORT"))
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5000),
            jwt_secret: Self::require_secret(&["JWT_SECRET", "ACCESS_TOKEN_SECRET"], &environment)?,
            stripe_secret_key: Self::require_secret(&["STRIPE_SECRET_KEY"], &environment)?,
            payment_currency: std::env::var("PAYMENT_CURRENCY")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "usd".into())
                .to_lowercase(),
            gemini_api_key: std::env::var("GEMINI_API_KEY").unwrap_or_default(),
            gemini_model: std::env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| "gemini-1.5-flash".into()),
            allowed_origins: std::env::var("ALLOWED_ORIGINS")
                .map(|v| parse_origins(&v))
                .unwrap_or_else(|_| vec!["http://localhost:5173".to_string()]),
            environment,
        })
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
