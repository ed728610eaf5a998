//! Line-oriented conversation on stdin/stdout.
//!
//! Every line is one turn of a single conversation. Lines starting with `/`
//! are local commands: `/sair` quits, `/reset` drops the pending question
//! and `/lancamentos` lists what the ledger recorded so far.

use std::io::Write;

use caderneta_chat::response::{format_brl, format_date};
use caderneta_chat::{DialogueOrchestrator, TurnOutcome};
use caderneta_core::types::ConversationId;
use caderneta_ledger::{InMemoryLedger, LedgerEntry};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

const PROMPT: &str = "> ";

/// Drive `orchestrator` from `input` until EOF or `/sair`.
pub async fn run<R, W>(
    orchestrator: &DialogueOrchestrator,
    ledger: &InMemoryLedger,
    conversation: &ConversationId,
    input: R,
    out: &mut W,
) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    loop {
        write!(out, "{}", PROMPT)?;
        out.flush()?;
        let Some(line) = lines.next_line().await? else {
            writeln!(out)?;
            break;
        };
        let line = line.trim();
        match line {
            "" => continue,
            "/sair" => break,
            "/reset" => {
                let cleared = orchestrator
                    .reset(conversation)
                    .map_err(|e| std::io::Error::other(e.to_string()))?;
                let message = if cleared {
                    "Pendência descartada."
                } else {
                    "Nada pendente."
                };
                writeln!(out, "{}", message)?;
                continue;
            }
            "/lancamentos" => {
                let entries = ledger.recorded();
                if entries.is_empty() {
                    writeln!(out, "Nenhum lançamento.")?;
                }
                for entry in &entries {
                    writeln!(out, "{}", entry_line(entry))?;
                }
                continue;
            }
            _ => {}
        }

        let before = ledger.len();
        match orchestrator.handle_turn(conversation, line).await {
            Ok(response) => {
                writeln!(out, "{}", response.message)?;
                if !response.suggestions.is_empty() {
                    writeln!(out, "  [{}]", response.suggestions.join(" | "))?;
                }
                if response.outcome == Some(TurnOutcome::Executed) {
                    for entry in ledger.recorded().iter().skip(before) {
                        writeln!(out, "{}", entry_line(entry))?;
                    }
                }
            }
            Err(e) => {
                tracing::debug!(error = %e, "Turn rejected");
                writeln!(out, "erro: {}", e)?;
            }
        }
    }
    Ok(())
}

/// One ledger entry as a single line.
fn entry_line(entry: &LedgerEntry) -> String {
    let intent = &entry.intent;
    let mut line = format!(
        "  + {} | {} | {} | {} | {}",
        format_date(intent.date),
        intent.action.label(),
        intent.category,
        intent.description,
        format_brl(intent.total_amount)
    );
    if !intent.is_paid {
        match intent.scheduled_date {
            Some(due) => line.push_str(&format!(" | a receber em {}", format_date(due))),
            None => line.push_str(" | pendente"),
        }
    }
    line
}
