use cotiza_core::config::AppConfig;
use cotiza_core::domain::quote::{QualityTier, QuoteRequest};
use cotiza_core::templates::format_amount;
use cotiza_core::{GeneratedQuote, Orchestrator, Sector};
use cotiza_llm::Capabilities;

use super::CommandResult;

pub struct GenerateArgs {
    pub description: String,
    pub client: String,
    pub sector: Option<String>,
    pub price_range: Option<String>,
    pub location: Option<String>,
    pub owner: Option<String>,
    pub quality: Option<QualityTier>,
    pub json: bool,
}

pub async fn run(config: &AppConfig, args: GenerateArgs) -> CommandResult {
    let sector_hint = match args.sector.as_deref() {
        Some(key) => match Sector::from_key(key) {
            Some(sector) => Some(sector),
            None => {
                return CommandResult::failure(
                    2,
                    format!("unknown sector `{key}`; run `cotiza generate --help` for keys"),
                );
            }
        },
        None => None,
    };

    let store = super::open_history_store(config).await;
    let capabilities = Capabilities::from_config(&config.llm);

    let mut orchestrator = Orchestrator::new(config.engine.clone(), store);
    if let Some(generator) = capabilities.generator {
        orchestrator = orchestrator.with_text_generator(generator);
    }
    if let Some(embedder) = capabilities.embedder {
        orchestrator = orchestrator.with_embedder(embedder);
    }

    let mut request = QuoteRequest::new(args.description, args.client);
    request.sector_hint = sector_hint;
    request.price_range = args.price_range;
    request.location_hint = args.location;
    request.owner_id = args.owner;
    request.quality = args.quality;

    match orchestrator.generate_quote(request).await {
        Ok(quote) => {
            if args.json {
                match serde_json::to_string_pretty(&quote) {
                    Ok(rendered) => CommandResult::ok(rendered),
                    Err(error) => {
                        CommandResult::failure(1, format!("could not serialize quote: {error}"))
                    }
                }
            } else {
                CommandResult::ok(render_quote(&quote))
            }
        }
        Err(rejection) => CommandResult::failure(1, format!("rechazado: {}", rejection.message)),
    }
}

fn render_quote(quote: &GeneratedQuote) -> String {
    let mut lines = Vec::new();
    lines.push(format!("# {}", quote.title));
    lines.push(format!("Cliente: {}   Sector: {}", quote.client_name, quote.sector.label()));
    lines.push(String::new());

    for item in &quote.items {
        lines.push(format!(
            "  {:>2} x {:<60} {:>12} €",
            item.quantity,
            item.description,
            format_amount(item.total())
        ));
    }

    lines.push(String::new());
    lines.push(format!("  Base imponible: {:>12} €", format_amount(quote.subtotal)));
    lines.push(format!(
        "  IVA ({:.0}%):      {:>12} €",
        quote.tax_percent,
        format_amount(quote.tax_amount)
    ));
    lines.push(format!("  TOTAL:          {:>12} €", format_amount(quote.total)));
    lines.push(String::new());
    lines.push(quote.timeline.clone());
    lines.push(format!("Validez: hasta {}", quote.valid_until.format("%d/%m/%Y")));
    lines.push(String::new());
    lines.push(quote.summary.clone());
    lines.push(String::new());
    lines.push("Condiciones:".to_owned());
    for term in &quote.terms {
        lines.push(format!("  - {term}"));
    }

    if quote.audit.used_local_fallback() {
        lines.push(String::new());
        lines.push("(generado con plantillas locales)".to_owned());
    }

    lines.join("\n")
}
