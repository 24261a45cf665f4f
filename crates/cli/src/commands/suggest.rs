use cotiza_core::config::AppConfig;
use cotiza_core::{HistoryMatcher, Sector};
use cotiza_llm::Capabilities;

use super::CommandResult;

pub async fn run(
    config: &AppConfig,
    owner: &str,
    description: &str,
    sector: Option<&str>,
) -> CommandResult {
    let sector = match sector {
        Some(key) => match Sector::from_key(key) {
            Some(sector) => Some(sector),
            None => return CommandResult::failure(2, format!("unknown sector `{key}`")),
        },
        None => None,
    };

    let store = super::open_history_store(config).await;
    let capabilities = Capabilities::from_config(&config.llm);
    let matcher = HistoryMatcher::new(store, config.engine.history.clone());

    let suggestion =
        matcher.suggest_price(owner, description, sector, capabilities.embedder.as_deref()).await;

    if suggestion.is_empty() {
        return CommandResult::ok("sin historial similar para este propietario");
    }

    match serde_json::to_string_pretty(&suggestion) {
        Ok(rendered) => CommandResult::ok(rendered),
        Err(error) => CommandResult::failure(1, format!("could not serialize suggestion: {error}")),
    }
}

#[cfg(test)]
mod tests {
    use cotiza_core::config::AppConfig;

    use super::run;

    #[tokio::test]
    async fn empty_history_reports_no_matches() {
        let mut config = AppConfig::default();
        config.database.url = "sqlite:///nonexistent-dir/cotiza-test.db".to_owned();

        let result = run(&config, "owner-1", "Reforma de cocina", None).await;
        assert_eq!(result.exit_code, 0);
        assert!(result.output.contains("sin historial"));
    }

    #[tokio::test]
    async fn unknown_sector_fails_fast() {
        let config = AppConfig::default();
        let result = run(&config, "owner-1", "Reforma de cocina", Some("astrologia")).await;
        assert_eq!(result.exit_code, 2);
    }
}
