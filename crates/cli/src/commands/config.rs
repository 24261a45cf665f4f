use cotiza_core::config::AppConfig;

use super::CommandResult;

/// Print effective configuration with secrets redacted.
pub fn run(config: &AppConfig) -> CommandResult {
    let engine = &config.engine;
    let lines = vec![
        "[engine]".to_owned(),
        format!("inflation_index = {}", engine.inflation_index),
        format!("market_index = {}", engine.market_index),
        format!("base_margin = {}", engine.base_margin),
        format!("overhead_pct = {}", engine.overhead_pct),
        format!("default_tax_percent = {}", engine.default_tax_percent),
        format!("validity_days = {}", engine.validity_days),
        format!("history_blend_weight = {}", engine.history.blend_weight),
        format!("similarity_cutoff = {}", engine.history.similarity_cutoff),
        String::new(),
        "[llm]".to_owned(),
        format!("enabled = {}", config.llm.enabled),
        format!("provider = {:?}", config.llm.provider),
        format!("model = {}", config.llm.model),
        format!("embedding_model = {}", config.llm.embedding_model),
        format!(
            "api_key = {}",
            if config.llm.api_key.is_some() { "[redacted]" } else { "(unset)" }
        ),
        format!("base_url = {}", config.llm.base_url.as_deref().unwrap_or("(unset)")),
        String::new(),
        "[database]".to_owned(),
        format!("url = {}", config.database.url),
        format!("max_connections = {}", config.database.max_connections),
        String::new(),
        "[logging]".to_owned(),
        format!("level = {}", config.logging.level),
        format!("format = {:?}", config.logging.format),
    ];

    CommandResult::ok(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use cotiza_core::config::AppConfig;

    use super::run;

    #[test]
    fn secrets_are_never_printed() {
        let mut config = AppConfig::default();
        config.llm.api_key = Some("sk-super-secret".to_owned().into());

        let result = run(&config);
        assert_eq!(result.exit_code, 0);
        assert!(!result.output.contains("sk-super-secret"));
        assert!(result.output.contains("[redacted]"));
    }
}
