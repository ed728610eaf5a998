//! Matchers for short replies to the interpreter's questions.

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;
use strsim::normalized_damerau_levenshtein;

use crate::text::{normalize, words};

const AFFIRMATIVE: &[&str] = &[
    "sim", "s", "ss", "yes", "y", "ok", "okay", "isso", "isso mesmo", "confirmo", "confirma",
    "confirmar", "confirmado", "pode", "pode ser", "pode registrar", "claro", "certo", "beleza",
    "blz", "exato", "uhum", "positivo", "com certeza", "correto",
];

const NEGATIVE: &[&str] = &[
    "nao", "n", "nope", "negativo", "errado", "nao quero", "nem", "jamais", "cancelar",
    "cancela",
];

const CANCELLATION: &[&str] = &[
    "cancelar", "cancela", "cancele", "cancelado", "esquece", "esqueca", "desisto",
];

const NO_FEE: &[&str] = &[
    "sem taxa", "nao teve", "nao tem", "nao houve", "nenhuma", "zero", "sem", "dinheiro", "pix",
];

const HAS_FEE: &[&str] = &[
    "com taxa", "teve", "tem", "houve", "maquininha", "maquina", "cartao", "credito",
];

/// "simm" scores 0.75 against "sim"; "sem" scores 0.67 and is rejected.
const MIN_TYPO_SIMILARITY: f64 = 0.75;

static PERCENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{1,3}(?:[.,]\d+)?)\b\s*%?").unwrap());

static SELECTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:(?:o|a|opcao|numero|item|produto)\s+)?#?(\d{1,3})\s*[.)ºo]?\s*$").unwrap()
});

/// Answer to "did the card machine charge a fee?".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeeAnswer {
    NoFee,
    HasFee,
    /// The user answered with the percentage directly.
    Percent(Decimal),
}

/// Whether `text` is a "yes", tolerating one stray or missing letter.
pub fn is_affirmative(text: &str) -> bool {
    matches_list(text, AFFIRMATIVE)
}

/// Whether `text` is a "no", tolerating one stray or missing letter.
pub fn is_negative(text: &str) -> bool {
    matches_list(text, NEGATIVE)
}

/// Whether `text` asks to abandon whatever is pending.
pub fn is_cancellation(text: &str) -> bool {
    words(text).iter().any(|w| CANCELLATION.contains(&w.as_str()))
}

/// Interpret a reply to the fee question.
pub fn parse_fee_answer(text: &str) -> Option<FeeAnswer> {
    let phrase = words(text).join(" ");
    if phrase.is_empty() {
        return None;
    }
    if contains_phrase(&phrase, NO_FEE) || is_negative(text) {
        return Some(FeeAnswer::NoFee);
    }
    if let Some(pct) = parse_fee_percentage(text) {
        return Some(FeeAnswer::Percent(pct));
    }
    if contains_phrase(&phrase, HAS_FEE) || is_affirmative(text) {
        return Some(FeeAnswer::HasFee);
    }
    None
}

/// First percentage in `text`, accepted only within `(0, 100]`.
///
/// "2,5", "2.5" and "2,5%" all read as 2.5.
pub fn parse_fee_percentage(text: &str) -> Option<Decimal> {
    let caps = PERCENT_RE.captures(text)?;
    let value = Decimal::from_str(&caps[1].replace(',', ".")).ok()?;
    if value > Decimal::ZERO && value <= Decimal::ONE_HUNDRED {
        Some(value)
    } else {
        None
    }
}

/// A bare 1-based index ("2", "2.", "o 2", "#2"). Not range-checked.
pub fn parse_selection(text: &str) -> Option<usize> {
    let normalized = normalize(text);
    let caps = SELECTION_RE.captures(&normalized)?;
    caps[1].parse().ok()
}

fn matches_list(text: &str, list: &[&str]) -> bool {
    let tokens = words(text);
    let Some(first) = tokens.first() else {
        return false;
    };
    let phrase = tokens.join(" ");
    list.iter()
        .any(|candidate| close_enough(&phrase, candidate) || close_enough(first, candidate))
}

fn close_enough(input: &str, candidate: &str) -> bool {
    if input == candidate {
        return true;
    }
    candidate.chars().count() >= 3
        && normalized_damerau_levenshtein(input, candidate) >= MIN_TYPO_SIMILARITY
}

fn contains_phrase(phrase: &str, list: &[&str]) -> bool {
    let padded = format!(" {} ", phrase);
    list.iter().any(|p| padded.contains(&format!(" {} ", p)))
}
