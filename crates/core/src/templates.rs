//! Deterministic local text tier.
//!
//! Every customer-facing text the external capability can produce has a
//! template-rendered counterpart here, so a fully offline deployment still
//! ships complete quotes.

use rust_decimal::Decimal;
use tera::Tera;
use tracing::warn;

use crate::domain::context::{ProjectContext, Scale};
use crate::domain::sector::Sector;
use crate::sectors;
use crate::text::normalize;

const TITLE_TEMPLATE: &str = "Presupuesto de {{ sector_label }} para {{ client_name }}";

const SUMMARY_TEMPLATE: &str = "Presupuesto elaborado para {{ client_name }} sobre el proyecto \
descrito. Incluye {{ item_count }} partidas por un importe total de {{ total }} € (IVA \
incluido). {{ timeline }}";

pub struct TemplateEngine {
    tera: Tera,
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateEngine {
    pub fn new() -> Self {
        let mut tera = Tera::default();
        // Static templates; registration only fails on syntax errors, which
        // the constructor test guards.
        if let Err(error) = tera.add_raw_templates(vec![
            ("title", TITLE_TEMPLATE),
            ("summary", SUMMARY_TEMPLATE),
        ]) {
            warn!(%error, "template registration failed; falling back to plain formatting");
        }
        Self { tera }
    }

    pub fn title(&self, sector: Sector, client_name: &str) -> String {
        let mut context = tera::Context::new();
        context.insert("sector_label", sector.label());
        context.insert("client_name", client_name);
        self.tera
            .render("title", &context)
            .unwrap_or_else(|_| format!("Presupuesto de {} para {client_name}", sector.label()))
    }

    pub fn summary(
        &self,
        client_name: &str,
        item_count: usize,
        total: &str,
        timeline: &str,
    ) -> String {
        let mut context = tera::Context::new();
        context.insert("client_name", client_name);
        context.insert("item_count", &item_count);
        context.insert("total", total);
        context.insert("timeline", timeline);
        self.tera.render("summary", &context).unwrap_or_else(|_| {
            format!(
                "Presupuesto elaborado para {client_name}. Incluye {item_count} partidas por un \
                 importe total de {total} € (IVA incluido). {timeline}"
            )
        })
    }

    /// Standard commercial terms; the volatility warning joins them when
    /// the sector or the materials call for it.
    pub fn terms(&self, validity_days: i64, context: &ProjectContext) -> Vec<String> {
        let mut terms = vec![
            format!("Presupuesto válido durante {validity_days} días desde su emisión."),
            "Los importes incluyen IVA al tipo vigente, desglosado en el documento.".to_owned(),
            "Forma de pago: 50% a la aceptación del presupuesto y 50% a la entrega.".to_owned(),
            "Cualquier trabajo no recogido en las partidas se presupuestará aparte.".to_owned(),
        ];
        if let Some(warning) = &context.fluctuation_warning {
            terms.push(warning.clone());
        }
        terms
    }

    pub fn timeline(&self, context: &ProjectContext, scale: Scale) -> String {
        match context.timeline_weeks {
            Some(weeks) if weeks == 1 => {
                "Plazo estimado de entrega: 1 semana.".to_owned()
            }
            Some(weeks) => format!("Plazo estimado de entrega: {weeks} semanas."),
            None => {
                let range = match scale {
                    Scale::Small => "2 a 3 semanas",
                    Scale::Standard => "4 a 8 semanas",
                    Scale::Enterprise => "10 a 16 semanas",
                };
                format!("Plazo estimado de entrega: {range}.")
            }
        }
    }
}

/// Spanish money formatting: dot-separated thousands, comma decimals.
pub fn format_amount(value: Decimal) -> String {
    let fixed = value.round_dp(2);
    let raw = format!("{fixed:.2}");
    let (integer, decimals) = raw.split_once('.').unwrap_or((raw.as_str(), "00"));

    let (sign, digits) = match integer.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", integer),
    };

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    format!("{sign}{grouped},{decimals}")
}

/// Local stand-in for external item contextualization: anchor each sector
/// concept to the detected project focus.
pub fn contextualize_concept(concept: &str, sector: Sector, description: &str) -> String {
    let focus = project_focus(sector, description);
    match focus {
        Some(focus) => format!("{concept} — {focus}"),
        None => concept.to_owned(),
    }
}

/// The sub-type tag when one is detected, else the first sector keyword
/// present in the description.
fn project_focus(sector: Sector, description: &str) -> Option<String> {
    let normalized = normalize(description);
    let profile = sectors::profile(sector);

    profile
        .project_type_rules
        .iter()
        .find(|rule| normalized.contains(rule.keyword))
        .map(|rule| rule.tag.to_owned())
        .or_else(|| {
            profile
                .keywords
                .iter()
                .find(|keyword| normalized.contains(*keyword))
                .map(|keyword| (*keyword).to_owned())
        })
}
