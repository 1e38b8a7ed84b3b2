//! Action batches
//!
//! Parses JSON action input and applies it to an engine one action at a
//! time. Each action is atomic on its own; a rejected action is reported and
//! the batch moves on unless asked to stop.

use amm_ledger::{ActionOutcome, AmmAction, AmmEngine, Stateful};
use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info};

/// Per-action result line written to stdout
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionReport {
    pub index: usize,
    pub action: &'static str,
    /// Read-only action; never changes the ledger
    pub query: bool,
    pub ok: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<ActionOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<&'static str>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub reports: Vec<ActionReport>,
    /// Actions never attempted because an earlier one failed under `stop_on_error`
    pub skipped: usize,
}

impl BatchReport {
    pub fn failed(&self) -> usize {
        self.reports.iter().filter(|r| !r.ok).count()
    }

    pub fn succeeded(&self) -> usize {
        self.reports.len() - self.failed()
    }

    /// Accepted actions that may have changed the ledger
    pub fn writes(&self) -> usize {
        self.reports.iter().filter(|r| r.ok && !r.query).count()
    }
}

/// Parse either a JSON array of actions or one action per line
pub fn parse_actions(input: &str) -> Result<Vec<AmmAction>> {
    let trimmed = input.trim_start();
    if trimmed.starts_with('[') {
        return serde_json::from_str(trimmed).context("Failed to parse action array");
    }

    input
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(n, line)| {
            serde_json::from_str(line)
                .with_context(|| format!("Failed to parse action on line {}", n + 1))
        })
        .collect()
}

/// Apply `actions` in order and report each result
pub fn apply_batch(
    engine: &mut AmmEngine,
    actions: Vec<AmmAction>,
    stop_on_error: bool,
) -> BatchReport {
    let total = actions.len();
    let mut report = BatchReport::default();

    for (index, action) in actions.into_iter().enumerate() {
        let name = action.name();
        let query = action.is_query();
        let entry = match engine.apply_event(action) {
            Ok(outcome) => {
                debug!(index, action = name, "{}", outcome);
                ActionReport {
                    index,
                    action: name,
                    query,
                    ok: true,
                    message: outcome.to_string(),
                    outcome: Some(outcome),
                    error_kind: None,
                }
            }
            Err(e) => ActionReport {
                index,
                action: name,
                query,
                ok: false,
                message: e.to_string(),
                outcome: None,
                error_kind: Some(e.kind()),
            },
        };
        let failed = !entry.ok;
        report.reports.push(entry);

        if failed && stop_on_error {
            report.skipped = total - index - 1;
            break;
        }
    }

    info!(
        applied = report.succeeded(),
        writes = report.writes(),
        failed = report.failed(),
        skipped = report.skipped,
        "Batch complete"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINES: &str = r#"
{"MintTokens":{"user":"alice","token":"USDC","amount":1000}}

{"GetUserBalance":{"user":"alice","token":"USDC"}}
"#;

    #[test]
    fn test_parse_json_lines_and_array() {
        let from_lines = parse_actions(LINES).unwrap();
        assert_eq!(from_lines.len(), 2);

        let array = format!(
            "[{}]",
            LINES
                .lines()
                .filter(|l| !l.trim().is_empty())
                .collect::<Vec<_>>()
                .join(",")
        );
        assert_eq!(parse_actions(&array).unwrap(), from_lines);
    }

    #[test]
    fn test_parse_error_names_line() {
        let input = "{\"MintTokens\":{\"user\":\"a\",\"token\":\"B\",\"amount\":1}}\nnot json\n";
        let err = parse_actions(input).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_failures_are_reported_and_batch_continues() {
        let actions = parse_actions(
            r#"[
                {"SwapExactTokensForTokens":{"user":"alice","token_in":"USDC","token_out":"ETH","amount_in":5,"min_amount_out":0}},
                {"MintTokens":{"user":"alice","token":"USDC","amount":10}}
            ]"#,
        )
        .unwrap();

        let mut engine = AmmEngine::new();
        let report = apply_batch(&mut engine, actions.clone(), false);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.reports[0].error_kind, Some("PoolNotFound"));
        assert_eq!(engine.get_user_balance("alice", "USDC"), 10);

        let mut engine = AmmEngine::new();
        let report = apply_batch(&mut engine, actions, true);
        assert_eq!(report.reports.len(), 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(engine.get_user_balance("alice", "USDC"), 0);
    }

    #[test]
    fn test_queries_are_not_counted_as_writes() {
        let mut engine = AmmEngine::new();
        let report = apply_batch(&mut engine, parse_actions(LINES).unwrap(), false);
        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.writes(), 1);
        assert!(!report.reports[0].query);
        assert!(report.reports[1].query);

        let reads = parse_actions(r#"{"GetReserves":{"token_a":"ETH","token_b":"USDC"}}"#).unwrap();
        let report = apply_batch(&mut engine, reads, false);
        assert_eq!(report.writes(), 0);
    }
}
