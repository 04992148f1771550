//! Plain-text rendering of the dashboard tabs.

use bic_core::{
    metric_cards, BiometricSnapshot, ConnectionStatus, HistoryPoint, MentalState, Tab,
};
use serde::Serialize;
use std::fmt::Write;

/// Everything one frame needs, pulled from the engine getters.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub status: ConnectionStatus,
    pub tab: Tab,
    pub snapshot: BiometricSnapshot,
    pub history: Vec<HistoryPoint>,
    pub state: MentalState,
}

pub fn render(view: &DashboardView) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "[{}]  Neural State: {}  |  tab: {}",
        view.status.label(),
        view.state.label,
        view.tab
    );

    match view.tab {
        Tab::Dashboard => {
            let cards: Vec<String> = metric_cards(&view.snapshot)
                .iter()
                .map(|c| c.to_string())
                .collect();
            let _ = writeln!(out, "{}", cards.join("  "));
            out.push_str(&render_history(&view.history));
            out.push_str(&render_advisory(&view.state));
        }
        Tab::Signals => {
            for (name, value) in view.snapshot.eeg.named() {
                let _ = writeln!(out, "{:<6} {:>5.1}Hz {}", name, value, bar(value));
            }
        }
        Tab::Chat => out.push_str(&render_advisory(&view.state)),
        Tab::Training => {
            let _ = writeln!(out, "Training protocols are not driven by the simulation.");
        }
    }
    out
}

fn render_history(history: &[HistoryPoint]) -> String {
    let mut out = String::from(" time  focus stress   hr\n");
    for p in history {
        let _ = writeln!(
            out,
            "{:>5} {:>6.0} {:>6.0} {:>4.0}",
            p.timestamp, p.focus, p.stress, p.heart_rate
        );
    }
    out
}

fn render_advisory(state: &MentalState) -> String {
    if state.message.is_empty() {
        "AI: (waiting for signal to settle)\n".to_string()
    } else {
        format!("AI: {}\n", state.message)
    }
}

/// 20-cell bar for a 0-100 value
fn bar(value: f64) -> String {
    let filled = (value.clamp(0.0, 100.0) / 5.0).round() as usize;
    format!("{}{}", "#".repeat(filled), ".".repeat(20 - filled))
}
