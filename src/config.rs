use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct DbConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// `None` runs the service on the in-process store.
    pub db: Option<DbConfig>,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let db = match std::env::var("DATABASE_URL") {
            Ok(url) if !url.trim().is_empty() => Some(DbConfig {
                url,
                max_connections: std::env::var("DB_MAX_CONNECTIONS")
                    .ok()
                    .and_then(|v| v.parse::<u32>().ok())
                    .unwrap_or(10),
            }),
            _ => None,
        };
        let port = match std::env::var("APP_PORT") {
            Ok(v) => v.parse::<u16>()?,
            Err(_) => 8080,
        };
        Ok(Self {
            db,
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
