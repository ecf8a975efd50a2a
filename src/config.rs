use std::time::Duration;

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
}

#[derive(Debug, Clone)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
    /// Applied as both connect and server-selection timeout.
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub mongo: MongoConfig,
    pub jwt: JwtConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let mongo = MongoConfig {
            uri: std::env::var("MONGO_URI")?,
            database: std::env::var("MONGO_DB").unwrap_or_else(|_| "freelanceDB".into()),
            timeout: Duration::from_secs(
                std::env::var("MONGO_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(10),
            ),
        };
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "freelance-portal".into()),
            audience: std::env::var("JWT_AUDIENCE")
                .unwrap_or_else(|_| "freelance-portal-users".into()),
        };
        Ok(Self { mongo, jwt })
    }
}
