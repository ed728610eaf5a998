//! Entity extraction from raw sentences.
//!
//! Pure, deterministic and infallible: every signal that is not found falls
//! back to a default (no amount, today's date, single payment). All
//! matching runs on [`normalize`]d text.

use std::str::FromStr;
use std::sync::LazyLock;

use caderneta_core::types::{ExtractedEntities, Installments, Interval, Recurrence};
use chrono::{Datelike, Duration, Local, Months, NaiveDate};
use regex::Regex;
use rust_decimal::Decimal;

use crate::catalog::product_noun;
use crate::classifier::{is_action_keyword, IntentClassifier};
use crate::text::{normalize, words};

/// Upper bound for an amount read without a currency marker.
const MAX_BARE_AMOUNT: i64 = 1_000_000;

// =============================================================================
// Compiled patterns (compiled once, reused across calls)
// =============================================================================

static CURRENCY_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"r\$\s*(\d[\d.,]*)").unwrap());

static CURRENCY_SUFFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d[\d.,]*)\s*(?:reais|real|conto|contos)\b").unwrap());

static NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d[\d.,/]*").unwrap());

static THOUSANDS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,3}(?:\.\d{3})+$").unwrap());

static INSTALLMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:em|com|de)\s+(\d{1,2})\s*(?:x|vezes|parcelas?)\b").unwrap()
});

static WEEKLY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:semanal|semanais|semanalmente|por\s+semana)\b").unwrap()
});

static QUARTERLY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:trimestral|trimestrais|trimestralmente|por\s+trimestre)\b").unwrap()
});

static RECURRENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(?:todo\s+mes|todos\s+os\s+meses|toda\s+semana|todas\s+as\s+semanas|todo\s+trimestre|mensalmente|semanalmente|trimestralmente|recorrente)\b",
    )
    .unwrap()
});

static END_DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bate\s+(?:o\s+)?dia\s+(\d{1,2})(?:/(\d{1,2})(?:/(\d{2,4}))?)?").unwrap()
});

static DAY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(ate\s+(?:o\s+)?)?dia\s+(\d{1,2})\b").unwrap());

static GENERIC_SCHEDULE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(?:sera\s+pag[oa]|vai\s+pagar|vao\s+pagar|vou\s+receber|vai\s+receber|a\s+pagar|a\s+receber|fiado|pag[oa]r?\s+depois|pra\s+pagar|para\s+pagar|vencimento|vence)\b",
    )
    .unwrap()
});

#[derive(Clone, Copy)]
enum Offset {
    Days(i64),
    Months(u32),
}

struct RelativeDate {
    pattern: Regex,
    offset: Offset,
    /// Whether the keyword alone marks the payment as scheduled.
    schedules: bool,
}

/// Relative-date keywords, longest first so "depois de amanha" beats
/// "amanha".
static RELATIVE_DATES: LazyLock<Vec<RelativeDate>> = LazyLock::new(|| {
    let mk = |pattern: &str, offset: Offset, schedules: bool| RelativeDate {
        pattern: Regex::new(pattern).expect("Invalid date regex"),
        offset,
        schedules,
    };
    vec![
        mk(r"\bdepois\s+de\s+amanha\b", Offset::Days(2), true),
        mk(r"\b(?:semana\s+que\s+vem|proxima\s+semana)\b", Offset::Days(7), true),
        mk(r"\b(?:mes\s+que\s+vem|proximo\s+mes)\b", Offset::Months(1), true),
        mk(r"\bamanha\b", Offset::Days(1), false),
        mk(r"\banteontem\b", Offset::Days(-2), false),
        mk(r"\bontem\b", Offset::Days(-1), false),
        mk(r"\bhoje\b", Offset::Days(0), false),
    ]
});

/// Words that count a quantity when they follow a number ("2 unidades").
const UNIT_WORDS: &[&str] = &[
    "unidade", "unidades", "un", "und", "peca", "pecas", "item", "itens",
];

/// Words after a number that rule it out as an amount.
const NON_AMOUNT_SUFFIXES: &[&str] = &[
    "x", "vezes", "vez", "parcela", "parcelas", "dias", "semanas", "meses", "anos", "h", "hora",
    "horas", "min", "minutos",
];

const NUMBER_WORDS: &[(&str, u32)] = &[
    ("um", 1),
    ("uma", 1),
    ("dois", 2),
    ("duas", 2),
    ("tres", 3),
    ("quatro", 4),
    ("cinco", 5),
    ("seis", 6),
    ("sete", 7),
    ("oito", 8),
    ("nove", 9),
    ("dez", 10),
];

/// Tokens dropped when building the free-text description.
const DESCRIPTION_NOISE: &[&str] = &[
    "a", "o", "as", "os", "um", "uma", "uns", "umas", "de", "do", "da", "dos", "das", "em",
    "no", "na", "nos", "nas", "com", "por", "pra", "para", "pro", "pelo", "pela", "e", "que",
    "ao", "eu", "meu", "minha", "hoje", "ontem", "anteontem", "amanha", "depois", "semana",
    "vem", "proxima", "proximo", "mes", "dia", "ate", "r", "reais", "real", "conto", "contos",
    "x", "vezes", "parcela", "parcelas", "sera", "pago", "paga", "vai", "vou", "vao",
    "receber", "fiado", "todo", "toda", "todos", "todas", "meses", "semanas", "mensalmente",
    "semanalmente", "trimestralmente", "recorrente", "semanal", "semanais", "mensal",
    "trimestral", "trimestrais", "unidade", "unidades", "un", "und", "vence", "vencimento",
];

// =============================================================================
// EntityExtractor
// =============================================================================

/// Scans sentences for amount, date, scheduling, installment, recurrence
/// and quantity signals, and classifies their action and category.
#[derive(Debug, Clone)]
pub struct EntityExtractor {
    classifier: IntentClassifier,
    scheduled_horizon_months: u32,
}

impl EntityExtractor {
    /// `scheduled_horizon_months` is the due date offset used when a
    /// payment is scheduled without any date.
    pub fn new(scheduled_horizon_months: u32) -> Self {
        Self {
            classifier: IntentClassifier::new(),
            scheduled_horizon_months,
        }
    }

    pub fn classifier(&self) -> &IntentClassifier {
        &self.classifier
    }

    /// Extract entities relative to the local calendar date.
    pub fn extract(&self, text: &str) -> ExtractedEntities {
        self.extract_at(text, Local::now().date_naive())
    }

    /// Extract entities relative to `today`.
    pub fn extract_at(&self, text: &str, today: NaiveDate) -> ExtractedEntities {
        let norm = normalize(text);
        let classification = self.classifier.classify(text);

        let mut entities = ExtractedEntities::new(classification.action, today);
        entities.category = classification.category;
        entities.amount = extract_amount(&norm);
        entities.quantity = extract_quantity(&norm);
        entities.installments = extract_installments(&norm);
        entities.recurrence = extract_recurrence(&norm, today);

        let relative = relative_date(&norm, today);
        if let Some((date, _)) = relative {
            entities.date = date;
        }

        let generic = GENERIC_SCHEDULE_RE.is_match(&norm);
        let temporal = relative.map(|(_, schedules)| schedules).unwrap_or(false);
        if generic || temporal {
            let explicit = relative.map(|(date, _)| date).filter(|date| *date > today);
            let due = explicit
                .or_else(|| due_day(&norm, today, entities.recurrence.is_some()))
                .unwrap_or_else(|| add_months(today, self.scheduled_horizon_months));
            entities.scheduled_date = Some(due);
        }

        entities.description = describe(text);
        entities
    }
}

impl Default for EntityExtractor {
    fn default() -> Self {
        Self::new(1)
    }
}

// =============================================================================
// Amount
// =============================================================================

/// Monetary amount in `text`: a value next to a currency marker first, then
/// the last plausible bare number.
pub fn extract_amount(text: &str) -> Option<Decimal> {
    let norm = normalize(text);
    for re in [&*CURRENCY_PREFIX_RE, &*CURRENCY_SUFFIX_RE] {
        if let Some(value) = re.captures_iter(&norm).find_map(|caps| parse_brl(&caps[1])) {
            return Some(value);
        }
    }
    bare_amount(&norm)
}

/// Parse a Brazilian-formatted number.
///
/// Comma is the decimal separator and dots group thousands ("1.234,56").
/// Without a comma, a dot is a thousands separator only when every group
/// after it has exactly three digits ("1.500"); otherwise it is a decimal
/// point ("80.39").
pub fn parse_brl(raw: &str) -> Option<Decimal> {
    let raw = raw.trim_end_matches(['.', ',']);
    if raw.is_empty() {
        return None;
    }
    let canonical = if raw.contains(',') {
        raw.replace('.', "").replace(',', ".")
    } else if THOUSANDS_RE.is_match(raw) {
        raw.replace('.', "")
    } else {
        raw.to_string()
    };
    let value = Decimal::from_str(&canonical).ok()?;
    (value >= Decimal::ZERO).then_some(value)
}

fn bare_amount(norm: &str) -> Option<Decimal> {
    let max = Decimal::from(MAX_BARE_AMOUNT);
    NUMBER_RE
        .find_iter(norm)
        .filter(|m| !m.as_str().contains('/'))
        .filter(|m| {
            let next = next_word(&norm[m.end()..]);
            let prev = last_word(&norm[..m.start()]);
            let percent = norm[m.end()..].trim_start().starts_with('%');
            !percent
                && prev != "dia"
                && !NON_AMOUNT_SUFFIXES.contains(&next)
                && !is_quantity_word(next)
        })
        .filter_map(|m| parse_brl(m.as_str()))
        .filter(|value| *value <= max)
        .last()
}

fn next_word(rest: &str) -> &str {
    let rest = rest.trim_start();
    let end = rest
        .find(|c: char| !c.is_alphanumeric())
        .unwrap_or(rest.len());
    &rest[..end]
}

fn last_word(before: &str) -> &str {
    let before = before.trim_end();
    let start = before
        .rfind(|c: char| !c.is_alphanumeric())
        .map(|i| i + before[i..].chars().next().map_or(1, char::len_utf8))
        .unwrap_or(0);
    &before[start..]
}

// =============================================================================
// Quantity
// =============================================================================

fn is_quantity_word(word: &str) -> bool {
    !word.is_empty() && (UNIT_WORDS.contains(&word) || product_noun(word).is_some())
}

/// Units in "vendi 2 brincos", "dois aneis", "3 unidades"; 1 otherwise.
fn extract_quantity(norm: &str) -> u32 {
    let tokens = words(norm);
    for (i, pair) in tokens.windows(2).enumerate() {
        if i > 0 && tokens[i - 1] == "r" {
            continue;
        }
        let count = pair[0].parse::<u32>().ok().or_else(|| {
            NUMBER_WORDS
                .iter()
                .find(|(word, _)| *word == pair[0])
                .map(|(_, n)| *n)
        });
        if let Some(count) = count.filter(|n| (1..=999).contains(n)) {
            if is_quantity_word(&pair[1]) {
                return count;
            }
        }
    }
    1
}

// =============================================================================
// Dates
// =============================================================================

/// First relative-date keyword: the date it names and whether it schedules.
fn relative_date(norm: &str, today: NaiveDate) -> Option<(NaiveDate, bool)> {
    RELATIVE_DATES
        .iter()
        .find(|rd| rd.pattern.is_match(norm))
        .map(|rd| {
            let date = match rd.offset {
                Offset::Days(days) => today + Duration::days(days),
                Offset::Months(months) => add_months(today, months),
            };
            (date, rd.schedules)
        })
}

/// Due day from "dia N". "ate dia N" is left to the recurrence end date
/// when the sentence is recurring.
fn due_day(norm: &str, today: NaiveDate, recurring: bool) -> Option<NaiveDate> {
    DAY_RE
        .captures_iter(norm)
        .filter(|caps| !(recurring && caps.get(1).is_some()))
        .find_map(|caps| caps[2].parse::<u32>().ok())
        .and_then(|day| next_day_of_month(today, day))
}

/// Next date after `today` falling on `day`, clamped to the month's length.
fn next_day_of_month(today: NaiveDate, day: u32) -> Option<NaiveDate> {
    if !(1..=31).contains(&day) {
        return None;
    }
    let month_start = today.with_day(1)?;
    let month_start = if day > today.day() {
        month_start
    } else {
        month_start.checked_add_months(Months::new(1))?
    };
    let last_day = month_start
        .checked_add_months(Months::new(1))?
        .pred_opt()?
        .day();
    month_start.with_day(day.min(last_day))
}

fn add_months(date: NaiveDate, months: u32) -> NaiveDate {
    date.checked_add_months(Months::new(months)).unwrap_or(date)
}

// =============================================================================
// Installments and recurrence
// =============================================================================

fn interval_for(text: &str) -> Interval {
    if WEEKLY_RE.is_match(text) {
        Interval::Weekly
    } else if QUARTERLY_RE.is_match(text) {
        Interval::Quarterly
    } else {
        Interval::Monthly
    }
}

fn extract_installments(norm: &str) -> Option<Installments> {
    let caps = INSTALLMENT_RE.captures(norm)?;
    let count: u32 = caps[1].parse().ok()?;
    (count >= 2).then(|| Installments {
        count,
        interval: interval_for(norm),
    })
}

fn extract_recurrence(norm: &str, today: NaiveDate) -> Option<Recurrence> {
    let keyword = RECURRENCE_RE.find(norm)?.as_str();
    let interval = if keyword.contains("semana") {
        Interval::Weekly
    } else if keyword.contains("trimest") {
        Interval::Quarterly
    } else {
        Interval::Monthly
    };
    Some(Recurrence {
        interval,
        end_date: end_date(norm, today),
    })
}

fn end_date(norm: &str, today: NaiveDate) -> Option<NaiveDate> {
    let caps = END_DATE_RE.captures(norm)?;
    let day: u32 = caps[1].parse().ok()?;
    let Some(month) = caps.get(2).and_then(|m| m.as_str().parse::<u32>().ok()) else {
        return next_day_of_month(today, day);
    };
    match caps.get(3).and_then(|y| y.as_str().parse::<i32>().ok()) {
        Some(year) => {
            let year = if year < 100 { 2000 + year } else { year };
            NaiveDate::from_ymd_opt(year, month, day)
        }
        None => {
            let this_year = NaiveDate::from_ymd_opt(today.year(), month, day)?;
            if this_year >= today {
                Some(this_year)
            } else {
                NaiveDate::from_ymd_opt(today.year() + 1, month, day)
            }
        }
    }
}

// =============================================================================
// Description
// =============================================================================

/// The sentence without keywords, numbers and filler words.
fn describe(text: &str) -> Option<String> {
    let kept: Vec<&str> = text
        .split_whitespace()
        .map(|token| token.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|token| !token.is_empty())
        .filter(|token| {
            let core = words(token).join("");
            !core.is_empty()
                && !core.chars().any(|c| c.is_ascii_digit())
                && !DESCRIPTION_NOISE.contains(&core.as_str())
                && !is_action_keyword(&core)
        })
        .collect();
    if kept.is_empty() {
        None
    } else {
        Some(kept.join(" "))
    }
}
