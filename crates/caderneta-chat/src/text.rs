//! Text normalization shared by every matcher.
//!
//! All keyword tables are written lowercase and without diacritics, and all
//! input goes through [`normalize`] before matching, so "Amanhã", "AMANHA"
//! and "amanha" are the same word.

/// Lowercase and strip Portuguese diacritics.
pub fn normalize(text: &str) -> String {
    text.chars()
        .flat_map(char::to_lowercase)
        .map(fold_accent)
        .collect()
}

fn fold_accent(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        'ñ' => 'n',
        other => other,
    }
}

/// Normalized alphanumeric words of `text`, in order.
pub fn words(text: &str) -> Vec<String> {
    normalize(text)
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

/// Singular form of a normalized Portuguese noun or adjective.
///
/// Covers the regular plurals that show up in product names: "aneis" ->
/// "anel", "cordoes" -> "cordao", "colares" -> "colar", "brincos" ->
/// "brinco".
pub fn singularize(word: &str) -> String {
    if word.len() <= 3 {
        return word.to_string();
    }
    if let Some(stem) = word.strip_suffix("eis") {
        return format!("{}el", stem);
    }
    if let Some(stem) = word.strip_suffix("oes").or_else(|| word.strip_suffix("aes")) {
        return format!("{}ao", stem);
    }
    if word.ends_with("res") || word.ends_with("zes") {
        return word[..word.len() - 2].to_string();
    }
    match word.strip_suffix('s') {
        Some(stem) => stem.to_string(),
        None => word.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_folds_accents_and_case() {
        assert_eq!(normalize("Amanhã"), "amanha");
        assert_eq!(normalize("MÊS QUE VEM"), "mes que vem");
        assert_eq!(normalize("Coração"), "coracao");
        assert_eq!(normalize("R$ 80,39"), "r$ 80,39");
    }

    #[test]
    fn test_words_splits_on_punctuation() {
        assert_eq!(words("Sim, pode!"), vec!["sim", "pode"]);
        assert_eq!(words("  "), Vec::<String>::new());
        assert_eq!(words("R$80,39"), vec!["r", "80", "39"]);
    }

    #[test]
    fn test_singularize() {
        assert_eq!(singularize("brincos"), "brinco");
        assert_eq!(singularize("aneis"), "anel");
        assert_eq!(singularize("colares"), "colar");
        assert_eq!(singularize("cordoes"), "cordao");
        assert_eq!(singularize("perolas"), "perola");
        assert_eq!(singularize("anel"), "anel");
        assert_eq!(singularize("mes"), "mes");
    }
}
