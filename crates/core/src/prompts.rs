//! Prompt builders for the external text capability.
//!
//! Every prompt demands strict JSON so [`Payload::parse`] can discriminate
//! usable answers from malformed ones before any pricing code runs.
//!
//! [`Payload::parse`]: crate::capabilities::Payload::parse

use crate::capabilities::CompletionRequest;
use crate::domain::sector::Sector;

/// Ask the model to adapt each sector concept to the concrete project.
/// Expected answer: a JSON array with exactly one string per concept.
pub fn contextualize_request(
    sector: Sector,
    description: &str,
    concepts: &[&str],
) -> CompletionRequest {
    let listed = concepts
        .iter()
        .enumerate()
        .map(|(index, concept)| format!("{}. {concept}", index + 1))
        .collect::<Vec<_>>()
        .join("\n");

    CompletionRequest::new(
        format!(
            "Eres un experto en presupuestos del sector {}. Reescribe cada concepto para el \
             proyecto descrito, manteniendo el orden. Responde solo con un array JSON de {} \
             cadenas, sin texto adicional.",
            sector.label(),
            concepts.len()
        ),
        format!("Proyecto: {description}\n\nConceptos:\n{listed}"),
    )
    .with_temperature(0.4)
    .with_max_tokens(600)
}

/// Ask the model for the commercial texts of the quote. Expected answer:
/// a JSON object with `title`, `summary` and optionally `terms` (array).
pub fn enrich_request(sector: Sector, description: &str, client_name: &str) -> CompletionRequest {
    CompletionRequest::new(
        format!(
            "Eres un asistente comercial del sector {}. Redacta los textos de un presupuesto \
             profesional en español. Responde solo con un objeto JSON con las claves `title` \
             (cadena), `summary` (cadena, máximo tres frases) y `terms` (array de cadenas, \
             opcional). No modifiques partidas ni importes.",
            sector.label()
        ),
        format!("Cliente: {client_name}\nProyecto: {description}"),
    )
    .with_temperature(0.5)
    .with_max_tokens(500)
}

#[cfg(test)]
mod tests {
    use crate::domain::sector::Sector;

    use super::{contextualize_request, enrich_request};

    #[test]
    fn contextualize_prompt_lists_every_concept() {
        let request = contextualize_request(
            Sector::Software,
            "Tienda online de ropa",
            &["Analisis", "Desarrollo", "Pruebas"],
        );
        assert!(request.system.contains("array JSON de 3"));
        assert!(request.user.contains("1. Analisis"));
        assert!(request.user.contains("3. Pruebas"));
    }

    #[test]
    fn enrich_prompt_demands_json_object() {
        let request = enrich_request(Sector::Events, "Congreso anual", "Eventia SL");
        assert!(request.system.contains("`title`"));
        assert!(request.system.contains("`summary`"));
        assert!(request.user.contains("Eventia SL"));
    }
}
