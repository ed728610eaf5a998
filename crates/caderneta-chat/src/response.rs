//! Response composition.
//!
//! Every user-visible sentence the interpreter produces is built here, in
//! Brazilian Portuguese, with amounts as "R$ 1.234,56" and dates as
//! "dd/mm/aaaa".

use caderneta_core::types::{PendingIntent, ProductCandidate, TransactionAction};
use caderneta_ledger::Dispatch;
use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::types::{ResponseData, TurnOutcome, TurnResponse};

const YES_NO: [&str; 2] = ["sim", "não"];
const FEE_CHOICES: [&str; 2] = ["sem taxa", "com taxa"];

// =============================================================================
// Formatting
// =============================================================================

/// Format an amount as Brazilian currency: `R$ 1.234,56`.
pub fn format_brl(amount: Decimal) -> String {
    let fixed = format!("{:.2}", amount.round_dp(2).abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let digits: Vec<char> = int_part.chars().collect();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(*c);
    }

    let sign = if amount.is_sign_negative() && !amount.is_zero() { "-" } else { "" };
    format!("{}R$ {},{}", sign, grouped, frac_part)
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

fn capitalized_label(action: TransactionAction) -> String {
    let label = action.label();
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// One-line description of a pending transaction.
pub fn summarize(intent: &PendingIntent) -> String {
    let mut s = format!("{} de {}", capitalized_label(intent.action), intent.subject());
    if intent.quantity > 1 {
        s.push_str(&format!(
            " ({} un. x {})",
            intent.quantity,
            format_brl(intent.amount)
        ));
    }
    s.push_str(&format!(
        ": {} em {}",
        format_brl(intent.total_amount),
        format_date(intent.date)
    ));
    if let Some(plan) = intent.installments {
        s.push_str(&format!(", parcelado em {}x {}", plan.count, plan.interval.label()));
    }
    if let Some(due) = intent.scheduled_date {
        s.push_str(&format!(", pagamento previsto para {}", format_date(due)));
    }
    if let Some(recurrence) = intent.recurrence {
        s.push_str(&format!(", recorrente {}", recurrence.interval.label()));
        if let Some(end) = recurrence.end_date {
            s.push_str(&format!(" até {}", format_date(end)));
        }
    }
    s
}

// =============================================================================
// Questions
// =============================================================================

/// Ask the user to confirm `intent`. `stock_warning` carries the available
/// stock when the requested quantity exceeds it.
pub fn confirmation_prompt(intent: &PendingIntent, stock_warning: Option<i64>) -> TurnResponse {
    let mut message = format!("{}. Confirma?", summarize(intent));
    if let Some(stock) = stock_warning {
        message.push_str(&format!(
            "\nAtenção: o estoque de {} é de {} unidade(s).",
            intent.subject(),
            stock.max(0)
        ));
    }
    TurnResponse::question(message).with_suggestions(YES_NO)
}

pub fn confirmation_reprompt(intent: &PendingIntent) -> TurnResponse {
    TurnResponse::question(format!(
        "Não entendi. Responda \"sim\" para registrar ou \"não\" para cancelar.\n{}. Confirma?",
        summarize(intent)
    ))
    .with_suggestions(YES_NO)
}

/// Numbered list question for several candidates.
pub fn selection_question(candidates: &[ProductCandidate]) -> String {
    let mut question = format!("Encontrei {} produtos. Qual deles?", candidates.len());
    for (i, c) in candidates.iter().enumerate() {
        question.push_str(&format!(
            "\n{}. {} - {} (estoque: {})",
            i + 1,
            c.name,
            format_brl(c.price),
            c.stock_quantity
        ));
    }
    question
}

pub fn selection_prompt(candidates: &[ProductCandidate], question: &str) -> TurnResponse {
    TurnResponse::question(question)
        .with_data(ResponseData {
            product_matches: Some(candidates.to_vec()),
            ..Default::default()
        })
        .with_suggestions(candidates.iter().map(|c| c.name.clone()))
}

pub fn invalid_selection(candidates: &[ProductCandidate], question: &str) -> TurnResponse {
    let message = format!(
        "Opção inválida. Escolha um número de 1 a {}.\n{}",
        candidates.len(),
        question
    );
    selection_prompt(candidates, &message)
}

pub fn fee_question(intent: &PendingIntent) -> TurnResponse {
    TurnResponse::question(format!(
        "{}. Houve taxa da maquininha nessa venda?",
        summarize(intent)
    ))
    .with_data(ResponseData {
        requires_fee_input: Some(true),
        ..Default::default()
    })
    .with_suggestions(FEE_CHOICES)
}

pub fn fee_question_reprompt(intent: &PendingIntent) -> TurnResponse {
    let mut response = fee_question(intent);
    response.message = format!(
        "Não entendi. Responda \"sem taxa\" ou \"com taxa\".\n{}",
        response.message
    );
    response
}

pub fn fee_amount_prompt() -> TurnResponse {
    TurnResponse::question("Qual a porcentagem da taxa? (ex.: 2,5%)").with_data(ResponseData {
        requires_fee_amount: Some(true),
        ..Default::default()
    })
}

pub fn invalid_fee_amount() -> TurnResponse {
    TurnResponse::question(
        "Não entendi a taxa. Informe uma porcentagem maior que 0 e até 100, por exemplo 2,5%.",
    )
    .with_data(ResponseData {
        requires_fee_amount: Some(true),
        ..Default::default()
    })
}

// =============================================================================
// Outcomes
// =============================================================================

pub fn executed(dispatch: &Dispatch) -> TurnResponse {
    let primary = dispatch.primary();
    let label = capitalized_label(primary.action);
    let mut message = match dispatch.fee() {
        None => format!(
            "{} registrada: {}, {}.",
            label,
            primary.subject(),
            format_brl(primary.total_amount)
        ),
        Some(fee) => format!(
            "{} registrada: {}, {} líquido (taxa de {}).",
            label,
            primary.subject(),
            format_brl(primary.total_amount),
            format_brl(fee.total_amount)
        ),
    };
    if let Some(due) = primary.scheduled_date {
        message.push_str(&format!(" Pagamento previsto para {}.", format_date(due)));
    }
    TurnResponse::success(message).with_outcome(TurnOutcome::Executed)
}

pub fn cancelled() -> TurnResponse {
    TurnResponse::info("Operação cancelada.").with_outcome(TurnOutcome::Cancelled)
}

pub fn nothing_pending() -> TurnResponse {
    TurnResponse::info("Não há nenhuma operação pendente.")
}

// =============================================================================
// Errors
// =============================================================================

pub fn missing_amount() -> TurnResponse {
    TurnResponse::error(
        "Não consegui identificar o valor. Tente algo como \"gastei 50 reais no mercado\".",
    )
}

pub fn catalog_unavailable() -> TurnResponse {
    TurnResponse::error("Não foi possível consultar o catálogo agora. Tente novamente.")
}

pub fn ledger_failed() -> TurnResponse {
    TurnResponse::error("Não foi possível registrar a transação agora. Tente novamente.")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ResponseType;
    use caderneta_core::types::{Installments, Interval, Recurrence};
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn intent() -> PendingIntent {
        PendingIntent {
            action: TransactionAction::Sale,
            product_id: Some("b1".into()),
            product_name: Some("Brinco Gota".into()),
            amount: dec("35"),
            quantity: 2,
            total_amount: dec("70"),
            date: NaiveDate::from_ymd_opt(2026, 10, 17).unwrap(),
            category: "Vendas".into(),
            description: "brincos gota".into(),
            scheduled_date: None,
            installments: None,
            recurrence: None,
            is_paid: true,
        }
    }

    fn candidate(id: &str, name: &str, price: &str) -> ProductCandidate {
        ProductCandidate {
            id: id.into(),
            name: name.into(),
            price: dec(price),
            stock_quantity: 2,
            category_label: String::new(),
            match_confidence: 0.7,
        }
    }

    #[test]
    fn test_format_brl() {
        assert_eq!(format_brl(dec("80.39")), "R$ 80,39");
        assert_eq!(format_brl(dec("1234.5")), "R$ 1.234,50");
        assert_eq!(format_brl(dec("1000000")), "R$ 1.000.000,00");
        assert_eq!(format_brl(dec("0")), "R$ 0,00");
        assert_eq!(format_brl(dec("999.999")), "R$ 1.000,00");
        assert_eq!(format_brl(dec("-5")), "-R$ 5,00");
    }

    #[test]
    fn test_format_date() {
        let d = NaiveDate::from_ymd_opt(2026, 3, 5).unwrap();
        assert_eq!(format_date(d), "05/03/2026");
    }

    #[test]
    fn test_summarize_plain() {
        assert_eq!(
            summarize(&intent()),
            "Venda de Brinco Gota (2 un. x R$ 35,00): R$ 70,00 em 17/10/2026"
        );
    }

    #[test]
    fn test_summarize_with_plan_schedule_and_recurrence() {
        let mut i = intent();
        i.quantity = 1;
        i.installments = Some(Installments {
            count: 3,
            interval: Interval::Monthly,
        });
        i.scheduled_date = NaiveDate::from_ymd_opt(2026, 11, 17);
        i.recurrence = Some(Recurrence {
            interval: Interval::Weekly,
            end_date: NaiveDate::from_ymd_opt(2026, 12, 20),
        });
        let s = summarize(&i);
        assert!(s.contains("parcelado em 3x mensal"));
        assert!(s.contains("pagamento previsto para 17/11/2026"));
        assert!(s.contains("recorrente semanal até 20/12/2026"));
    }

    #[test]
    fn test_confirmation_prompt_with_stock_warning() {
        let resp = confirmation_prompt(&intent(), Some(1));
        assert_eq!(resp.kind, ResponseType::Question);
        assert!(resp.message.ends_with("é de 1 unidade(s)."));
        assert_eq!(resp.suggestions, vec!["sim", "não"]);

        let resp = confirmation_prompt(&intent(), None);
        assert!(!resp.message.contains("estoque"));
    }

    #[test]
    fn test_selection_question_lists_candidates() {
        let candidates = vec![
            candidate("b1", "Brinco Gota", "35"),
            candidate("b2", "Brinco Estrela", "29.9"),
        ];
        let q = selection_question(&candidates);
        assert!(q.starts_with("Encontrei 2 produtos"));
        assert!(q.contains("\n1. Brinco Gota - R$ 35,00 (estoque: 2)"));
        assert!(q.contains("\n2. Brinco Estrela - R$ 29,90"));

        let resp = selection_prompt(&candidates, &q);
        assert_eq!(resp.data.unwrap().product_matches.unwrap().len(), 2);
        assert_eq!(resp.suggestions, vec!["Brinco Gota", "Brinco Estrela"]);
    }

    #[test]
    fn test_invalid_selection_repeats_list() {
        let candidates = vec![candidate("b1", "Brinco Gota", "35")];
        let q = selection_question(&candidates);
        let resp = invalid_selection(&candidates, &q);
        assert!(resp.message.starts_with("Opção inválida"));
        assert!(resp.message.contains(&q));
    }

    #[test]
    fn test_fee_prompts_flag_data() {
        let resp = fee_question(&intent());
        assert_eq!(resp.data.unwrap().requires_fee_input, Some(true));

        let resp = fee_amount_prompt();
        assert_eq!(resp.data.unwrap().requires_fee_amount, Some(true));
    }

    #[test]
    fn test_executed_messages() {
        let resp = executed(&Dispatch::Single(intent()));
        assert_eq!(resp.kind, ResponseType::Success);
        assert_eq!(resp.outcome, Some(TurnOutcome::Executed));
        assert_eq!(resp.message, "Venda registrada: Brinco Gota, R$ 70,00.");

        let mut one = intent();
        one.quantity = 1;
        let resp = executed(&Dispatch::with_fee(one, dec("5")));
        assert_eq!(
            resp.message,
            "Venda registrada: Brinco Gota, R$ 66,50 líquido (taxa de R$ 3,50)."
        );
    }

    #[test]
    fn test_cancelled() {
        let resp = cancelled();
        assert_eq!(resp.kind, ResponseType::Info);
        assert_eq!(resp.outcome, Some(TurnOutcome::Cancelled));
    }

    #[test]
    fn test_error_responses() {
        assert_eq!(missing_amount().kind, ResponseType::Error);
        assert_eq!(catalog_unavailable().kind, ResponseType::Error);
        assert_eq!(ledger_failed().kind, ResponseType::Error);
    }
}
