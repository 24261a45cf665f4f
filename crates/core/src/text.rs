//! Text normalization shared by every keyword detector.

/// Lower-case the input and strip Spanish diacritics so keyword tables can
/// be written once, without accents.
pub fn normalize(text: &str) -> String {
    text.chars()
        .flat_map(char::to_lowercase)
        .map(|ch| match ch {
            'á' | 'à' | 'ä' | 'â' => 'a',
            'é' | 'è' | 'ë' | 'ê' => 'e',
            'í' | 'ì' | 'ï' | 'î' => 'i',
            'ó' | 'ò' | 'ö' | 'ô' => 'o',
            'ú' | 'ù' | 'ü' | 'û' => 'u',
            'ñ' => 'n',
            'ç' => 'c',
            other => other,
        })
        .collect()
}

/// Parse a number written with Spanish separators ("3.500", "3500,50", "5k").
pub fn parse_amount(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if let Some(prefix) = trimmed.strip_suffix(['k', 'K']) {
        return prefix.trim().replace('.', "").replace(',', ".").parse::<f64>().ok().map(|n| {
            n * 1_000.0
        });
    }

    // "3.500" is a thousands separator, "3,50" a decimal comma.
    let cleaned = if trimmed.contains('.') && trimmed.contains(',') {
        trimmed.replace('.', "").replace(',', ".")
    } else if trimmed.contains('.') && trimmed.split('.').next_back().map(str::len) == Some(3) {
        trimmed.replace('.', "")
    } else {
        trimmed.replace(',', ".")
    };
    cleaned.parse::<f64>().ok()
}

/// Largest amount mentioned in a free-form price-range string
/// ("3.000 - 5.000 €", "hasta 12k"). `None` when no number is present.
pub fn range_upper_bound(text: &str) -> Option<f64> {
    let mut best: Option<f64> = None;
    let mut token = String::new();

    let flush = |token: &mut String, best: &mut Option<f64>| {
        let candidate = token.trim_end_matches(['.', ',']);
        if !candidate.is_empty() && candidate.chars().next().is_some_and(|ch| ch.is_ascii_digit())
        {
            if let Some(value) = parse_amount(candidate) {
                *best = Some(best.map_or(value, |current| current.max(value)));
            }
        }
        token.clear();
    };

    for ch in text.chars() {
        let continues_number = ch.is_ascii_digit()
            || ((ch == '.' || ch == ',') && !token.is_empty())
            || ((ch == 'k' || ch == 'K') && token.chars().last().is_some_and(|c| c.is_ascii_digit()));
        if continues_number {
            token.push(ch);
        } else {
            flush(&mut token, &mut best);
        }
    }
    flush(&mut token, &mut best);

    best
}

#[cfg(test)]
mod tests {
    use super::{normalize, parse_amount, range_upper_bound};

    #[test]
    fn strips_diacritics_and_case() {
        assert_eq!(normalize("Construcción en Cataluña"), "construccion en cataluna");
        assert_eq!(normalize("URGENTE"), "urgente");
    }

    #[test]
    fn upper_bound_takes_the_largest_amount() {
        assert_eq!(range_upper_bound("entre 3.000 y 5.000 €"), Some(5_000.0));
        assert_eq!(range_upper_bound("hasta 12k"), Some(12_000.0));
        assert_eq!(range_upper_bound("unos 900"), Some(900.0));
        assert_eq!(range_upper_bound("sin presupuesto"), None);
    }

    #[test]
    fn parses_spanish_number_formats() {
        assert_eq!(parse_amount("3.500"), Some(3_500.0));
        assert_eq!(parse_amount("3500,50"), Some(3_500.5));
        assert_eq!(parse_amount("1.234.567"), Some(1_234_567.0));
        assert_eq!(parse_amount("5k"), Some(5_000.0));
        assert_eq!(parse_amount("precio"), None);
    }
}
