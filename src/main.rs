mod app;
mod config;
mod error;
mod state;
mod users;

const DEFAULT_LOG_FILTER: &str = "userapi=debug,axum=info,tower_http=info";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    fn from_env_value(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Text,
        }
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER));
    let format = LogFormat::from_env_value(std::env::var("LOG_FORMAT").ok().as_deref());
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Json => builder.with_target(false).json().init(),
        LogFormat::Text => builder.init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let (app_state, db) = state::AppState::init().await?;

    if let Some(db) = &db {
        if let Err(e) = sqlx::migrate!("./migrations").run(db).await {
            tracing::warn!(error = %e, "migration failed; continuing");
        }
    }

    let addr = app_state.config.bind_addr();
    app::serve(app::build_app(app_state), &addr).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_format_defaults_to_text() {
        assert_eq!(LogFormat::from_env_value(None), LogFormat::Text);
        assert_eq!(LogFormat::from_env_value(Some("pretty")), LogFormat::Text);
    }

    #[test]
    fn log_format_json_is_case_insensitive() {
        assert_eq!(LogFormat::from_env_value(Some("json")), LogFormat::Json);
        assert_eq!(LogFormat::from_env_value(Some(" JSON ")), LogFormat::Json);
    }
}
