//! Input gate for incoming descriptions.
//!
//! The only hard rejections in the whole pipeline happen here and during
//! sector resolution; everything downstream degrades instead of failing.

use crate::errors::{Rejection, RejectionReason};
use crate::text::normalize;

pub const MIN_DESCRIPTION_CHARS: usize = 10;

/// Tokens that mark a request as noise rather than a project description.
const BLACKLIST: &[&str] = &[
    "xd", "jaja", "jeje", "lol", "asdf", "qwerty", "prueba prueba", "no se", "tonteria",
];

/// Requests describing things nobody can build or price.
const FANTASY_PATTERNS: &[&str] = &[
    "castillo en las nubes",
    "estrella de la muerte",
    "maquina del tiempo",
    "nave espacial",
    "unicornio de verdad",
    "teletransporte",
    "pocion magica",
];

/// At least one of these must appear for a description to count as a
/// professional request. Shared with the classifier's plausibility check.
const PROFESSIONAL_VOCABULARY: &[&str] = &[
    "proyecto", "desarrollo", "desarrollar", "web", "app", "aplicacion", "reforma", "obra",
    "construccion", "evento", "boda", "campana", "marketing", "publicidad", "consultoria",
    "asesoria", "tienda", "comercio", "formacion", "curso", "diseno", "servicio", "empresa",
    "negocio", "cliente", "presupuesto", "instalacion", "fabricacion", "produccion", "software",
    "plataforma", "estrategia", "auditoria", "vivienda", "local",
];

/// Whether the text reads like a real-world professional request.
pub fn has_professional_signal(description: &str) -> bool {
    let normalized = normalize(description);
    PROFESSIONAL_VOCABULARY.iter().any(|keyword| normalized.contains(keyword))
}

/// Validate the description, returning a structured rejection with an
/// actionable message on failure.
pub fn validate_description(description: &str) -> Result<(), Rejection> {
    let trimmed = description.trim();
    if trimmed.chars().count() < MIN_DESCRIPTION_CHARS {
        return Err(Rejection::new(
            RejectionReason::TooShort,
            "La descripción es demasiado corta; cuéntanos el proyecto en al menos una frase.",
        ));
    }

    let normalized = normalize(trimmed);
    if let Some(token) = BLACKLIST.iter().find(|token| contains_token(&normalized, token)) {
        return Err(Rejection::new(
            RejectionReason::Blacklisted,
            format!("La descripción contiene contenido no válido (`{token}`); redáctala de nuevo."),
        ));
    }

    if FANTASY_PATTERNS.iter().any(|pattern| normalized.contains(&normalize(pattern))) {
        return Err(Rejection::new(
            RejectionReason::Implausible,
            "La descripción no corresponde a un proyecto realizable; describe un encargo real.",
        ));
    }

    if !has_professional_signal(trimmed) {
        return Err(Rejection::new(
            RejectionReason::NoProfessionalSignal,
            "No reconocemos un encargo profesional en la descripción; indica qué servicio \
             necesitas.",
        ));
    }

    Ok(())
}

/// Blacklist tokens must match whole words: "xd" inside "expedición" is fine.
fn contains_token(normalized: &str, token: &str) -> bool {
    normalized
        .split(|ch: char| !ch.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .any(|word| word == token)
        || (token.contains(' ') && normalized.contains(token))
}

/// Item descriptions reuse the same blacklist plus a minimum length.
pub fn acceptable_item_description(description: &str) -> bool {
    let trimmed = description.trim();
    if trimmed.chars().count() < 3 {
        return false;
    }
    let normalized = normalize(trimmed);
    !BLACKLIST.iter().any(|token| contains_token(&normalized, token))
}

#[cfg(test)]
mod tests {
    use crate::errors::RejectionReason;

    use super::{acceptable_item_description, validate_description};

    #[test]
    fn short_descriptions_are_rejected() {
        let rejection = validate_description("web ya").expect_err("too short");
        assert_eq!(rejection.reason, RejectionReason::TooShort);
    }

    #[test]
    fn blacklisted_tokens_are_rejected() {
        let rejection = validate_description("xd jaja mi proyecto").expect_err("blacklist");
        assert_eq!(rejection.reason, RejectionReason::Blacklisted);
    }

    #[test]
    fn blacklist_matches_whole_words_only() {
        assert!(validate_description("Proyecto de expedición fotográfica para una agencia").is_ok());
    }

    #[test]
    fn fantasy_requests_are_rejected() {
        let rejection = validate_description("Quiero construir una estrella de la muerte")
            .expect_err("implausible");
        assert_eq!(rejection.reason, RejectionReason::Implausible);
    }

    #[test]
    fn descriptions_without_professional_signal_are_rejected() {
        let rejection =
            validate_description("me gusta mucho el color azul del cielo").expect_err("no signal");
        assert_eq!(rejection.reason, RejectionReason::NoProfessionalSignal);
    }

    #[test]
    fn professional_request_passes() {
        assert!(validate_description("Necesito una reforma de cocina completa").is_ok());
    }

    #[test]
    fn item_descriptions_filter_noise() {
        assert!(acceptable_item_description("Instalación eléctrica"));
        assert!(!acceptable_item_description("xd"));
        assert!(!acceptable_item_description("  a "));
    }
}
