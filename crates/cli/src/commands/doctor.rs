use cotiza_core::config::AppConfig;

use super::CommandResult;

struct Check {
    name: &'static str,
    ok: bool,
    detail: String,
}

/// Readiness checks: config validity, database connectivity, capability
/// wiring. Failures are reported, not fatal, except an invalid config.
pub async fn run(config: &AppConfig, json: bool) -> CommandResult {
    let mut checks = Vec::new();

    let config_check = match config.validate() {
        Ok(()) => Check { name: "config", ok: true, detail: "valid".to_owned() },
        Err(error) => Check { name: "config", ok: false, detail: error.to_string() },
    };
    checks.push(config_check);

    let database_check = match cotiza_db::connect_with_settings(
        &config.database.url,
        1,
        config.database.timeout_secs,
    )
    .await
    {
        Ok(pool) => match cotiza_db::run_pending(&pool).await {
            Ok(()) => Check {
                name: "database",
                ok: true,
                detail: format!("reachable at {}", config.database.url),
            },
            Err(error) => Check {
                name: "database",
                ok: false,
                detail: format!("migrations failed: {error}"),
            },
        },
        Err(error) => {
            Check { name: "database", ok: false, detail: format!("unreachable: {error}") }
        }
    };
    checks.push(database_check);

    let llm_detail = if config.llm.enabled {
        format!("{:?} / {}", config.llm.provider, config.llm.model)
    } else {
        "disabled; local fallback tiers only".to_owned()
    };
    checks.push(Check { name: "llm", ok: true, detail: llm_detail });

    let all_ok = checks.iter().all(|check| check.ok);
    let exit_code = u8::from(!all_ok);

    if json {
        let rendered = serde_json::json!({
            "ok": all_ok,
            "checks": checks
                .iter()
                .map(|check| {
                    serde_json::json!({
                        "name": check.name,
                        "ok": check.ok,
                        "detail": check.detail,
                    })
                })
                .collect::<Vec<_>>(),
        });
        return CommandResult { exit_code, output: rendered.to_string() };
    }

    let lines: Vec<String> = checks
        .iter()
        .map(|check| {
            format!("{} {:<10} {}", if check.ok { "ok " } else { "FAIL" }, check.name, check.detail)
        })
        .collect();
    CommandResult { exit_code, output: lines.join("\n") }
}

#[cfg(test)]
mod tests {
    use cotiza_core::config::AppConfig;

    use super::run;

    #[tokio::test]
    async fn doctor_reports_memory_database_as_healthy() {
        let mut config = AppConfig::default();
        config.database.url = "sqlite::memory:".to_owned();

        let result = run(&config, false).await;
        assert_eq!(result.exit_code, 0);
        assert!(result.output.contains("database"));
    }

    #[tokio::test]
    async fn doctor_json_is_machine_readable() {
        let mut config = AppConfig::default();
        config.database.url = "sqlite::memory:".to_owned();

        let result = run(&config, true).await;
        let value: serde_json::Value = serde_json::from_str(&result.output).expect("json");
        assert_eq!(value.get("ok"), Some(&serde_json::Value::Bool(true)));
    }
}
