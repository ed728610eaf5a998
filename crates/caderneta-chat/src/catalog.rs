//! Catalog resolution: which product does the sentence talk about?
//!
//! Resolution is lexical. The sentence must name a generic product noun
//! ("brinco", "colar", ...); items whose name carries that noun or one of its
//! synonyms are kept, then narrowed by every modifier word the sentence
//! mentions ("gota", "prata", ...).

use caderneta_core::types::{CatalogItem, ProductCandidate};
use tracing::debug;

use crate::text::{singularize, words};

/// Confidence of a candidate matched by noun and every modifier.
pub const CONFIDENCE_NOUN_AND_MODIFIER: f32 = 0.9;
/// Confidence of a candidate matched by noun alone.
pub const CONFIDENCE_NOUN: f32 = 0.7;
/// Confidence of a candidate offered because nothing matched.
pub const CONFIDENCE_FALLBACK: f32 = 0.3;

/// Product nouns and the name words each one accepts.
const NOUNS: &[(&str, &[&str])] = &[
    ("brinco", &["brinco", "argola", "earcuff"]),
    ("argola", &["argola"]),
    ("colar", &["colar", "gargantilha", "choker"]),
    ("gargantilha", &["gargantilha", "choker"]),
    ("choker", &["choker", "gargantilha"]),
    ("corrente", &["corrente", "cordao"]),
    ("cordao", &["cordao", "corrente"]),
    ("anel", &["anel", "alianca"]),
    ("alianca", &["alianca"]),
    ("pulseira", &["pulseira", "bracelete"]),
    ("bracelete", &["bracelete", "pulseira"]),
    ("tornozeleira", &["tornozeleira"]),
    ("pingente", &["pingente", "medalha"]),
    ("medalha", &["medalha", "pingente"]),
    ("piercing", &["piercing"]),
    ("conjunto", &["conjunto", "kit"]),
    ("kit", &["kit", "conjunto"]),
];

/// Modifier groups; the variants of one group are interchangeable.
const MODIFIERS: &[&[&str]] = &[
    &["gota"],
    &["coracao"],
    &["cruz"],
    &["estrela"],
    &["lua"],
    &["flor"],
    &["borboleta"],
    &["perola"],
    &["trevo"],
    &["infinito"],
    &["cristal"],
    &["zirconia"],
    &["strass"],
    &["prata"],
    &["ouro"],
    &["dourado", "dourada"],
    &["prateado", "prateada"],
    &["folheado", "folheada"],
    &["rose"],
    &["pequeno", "pequena"],
    &["grande"],
    &["fino", "fina"],
    &["grosso", "grossa"],
    &["azul"],
    &["verde"],
    &["vermelho", "vermelha"],
    &["preto", "preta"],
    &["branco", "branca"],
];

/// The product noun `word` refers to, if it is one.
pub fn product_noun(word: &str) -> Option<&'static str> {
    let singular = singularize(word);
    NOUNS
        .iter()
        .find(|(noun, _)| *noun == singular || *noun == word)
        .map(|(noun, _)| *noun)
}

/// Ranks catalog items against a sentence.
#[derive(Debug, Clone)]
pub struct CatalogResolver {
    fallback_candidates: usize,
}

impl CatalogResolver {
    pub fn new(fallback_candidates: usize) -> Self {
        Self {
            fallback_candidates,
        }
    }

    /// Candidates for `text`, in catalog order.
    ///
    /// Empty only when the catalog is empty. Without a recognizable noun, or
    /// when no item carries it, the first items of the catalog are offered.
    pub fn resolve(&self, text: &str, catalog: &[CatalogItem]) -> Vec<ProductCandidate> {
        if catalog.is_empty() {
            return Vec::new();
        }

        let tokens: Vec<String> = words(text).iter().map(|w| singularize(w)).collect();
        let accepted = tokens.iter().find_map(|t| {
            NOUNS
                .iter()
                .find(|(noun, _)| noun == t)
                .map(|(_, accepted)| *accepted)
        });

        let Some(accepted) = accepted else {
            debug!(candidates = self.fallback_candidates, "No product noun found, offering fallback");
            return self.fallback(catalog);
        };

        let noun_matches: Vec<&CatalogItem> = catalog
            .iter()
            .filter(|item| name_has_any(item, accepted))
            .collect();
        if noun_matches.is_empty() {
            debug!("No catalog item carries the product noun, offering fallback");
            return self.fallback(catalog);
        }

        let modifiers: Vec<&[&str]> = MODIFIERS
            .iter()
            .copied()
            .filter(|group| tokens.iter().any(|t| group.contains(&t.as_str())))
            .collect();

        if !modifiers.is_empty() {
            let narrowed: Vec<ProductCandidate> = noun_matches
                .iter()
                .filter(|item| modifiers.iter().all(|group| name_has_any(item, group)))
                .map(|item| ProductCandidate::from_item(item, CONFIDENCE_NOUN_AND_MODIFIER))
                .collect();
            if !narrowed.is_empty() {
                return narrowed;
            }
        }

        noun_matches
            .into_iter()
            .map(|item| ProductCandidate::from_item(item, CONFIDENCE_NOUN))
            .collect()
    }

    fn fallback(&self, catalog: &[CatalogItem]) -> Vec<ProductCandidate> {
        catalog
            .iter()
            .take(self.fallback_candidates)
            .map(|item| ProductCandidate::from_item(item, CONFIDENCE_FALLBACK))
            .collect()
    }
}

impl Default for CatalogResolver {
    fn default() -> Self {
        Self::new(5)
    }
}

fn name_has_any(item: &CatalogItem, accepted: &[&str]) -> bool {
    words(&item.name)
        .iter()
        .map(|w| singularize(w))
        .any(|w| accepted.contains(&w.as_str()))
}
