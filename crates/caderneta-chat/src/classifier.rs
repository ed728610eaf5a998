//! Keyword-based intent classification.
//!
//! Decides whether a sentence records a sale, an expense or an income, and
//! which category label it belongs to.

use caderneta_core::types::TransactionAction;

use crate::text::words;

// =============================================================================
// Keyword tables (normalized: lowercase, no diacritics)
// =============================================================================

const SALE_KEYWORDS: &[&str] = &[
    "vendi", "venda", "vendas", "vendeu", "vendemos", "vender", "vendido", "vendida",
    "vendidos", "vendidas", "recebi", "recebemos",
];

const EXPENSE_KEYWORDS: &[&str] = &[
    "gastei", "gasto", "gastos", "gastamos", "paguei", "pagamos", "pagar", "pagamento",
    "comprei", "compramos", "compra", "despesa", "despesas",
];

const INCOME_KEYWORDS: &[&str] = &[
    "receber", "recebimento", "ganhei", "ganhamos", "ganho", "entrou",
    "entrada", "receita",
];

/// Category keywords, checked in order; the first table with a hit wins.
const CATEGORY_TABLE: &[(&[&str], &str)] = &[
    (&["mercado", "supermercado", "feira", "hortifruti", "acougue"], "Compras"),
    (&["imposto", "impostos", "mei", "inss", "iptu", "ipva"], "Impostos"),
    (
        &["fornecedor", "fornecedores", "material", "materiais", "mercadoria", "mercadorias"],
        "Fornecedores",
    ),
    (
        &["luz", "agua", "internet", "energia", "telefone", "celular", "aluguel"],
        "Contas",
    ),
];

/// Result of classifying one sentence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub action: TransactionAction,
    pub category: String,
}

/// Keyword classifier for action and category.
#[derive(Debug, Clone, Default)]
pub struct IntentClassifier;

impl IntentClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Classify `text`. Sale keywords are checked before expense keywords,
    /// and expense before income; with no keyword at all the action is a
    /// sale.
    pub fn classify(&self, text: &str) -> Classification {
        let tokens = words(text);
        let action = self.detect_action(&tokens).unwrap_or_default();
        let category = category_for(&tokens, action);
        Classification { action, category }
    }

    /// The action named by an explicit keyword, if any.
    pub fn detect_action(&self, tokens: &[String]) -> Option<TransactionAction> {
        let has = |list: &[&str]| tokens.iter().any(|t| list.contains(&t.as_str()));
        if has(SALE_KEYWORDS) {
            Some(TransactionAction::Sale)
        } else if has(EXPENSE_KEYWORDS) {
            Some(TransactionAction::Expense)
        } else if has(INCOME_KEYWORDS) {
            Some(TransactionAction::Income)
        } else {
            None
        }
    }

    /// Whether `text` contains any action keyword.
    pub fn mentions_action(&self, text: &str) -> bool {
        self.detect_action(&words(text)).is_some()
    }
}

/// Whether a normalized word is one of the action keywords.
pub fn is_action_keyword(word: &str) -> bool {
    SALE_KEYWORDS.contains(&word)
        || EXPENSE_KEYWORDS.contains(&word)
        || INCOME_KEYWORDS.contains(&word)
}

fn category_for(tokens: &[String], action: TransactionAction) -> String {
    for (keywords, label) in CATEGORY_TABLE {
        if tokens.iter().any(|t| keywords.contains(&t.as_str())) {
            return label.to_string();
        }
    }
    match action {
        TransactionAction::Sale => "Vendas",
        TransactionAction::Expense => "Despesas",
        TransactionAction::Income => "Receitas",
    }
    .to_string()
}
