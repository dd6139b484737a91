use std::fmt::Write as _;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use tracing::{info, warn};

use kiosk_application::commands::cycle_commands::{self, CycleOutcome, SortOutcome};
use kiosk_application::commands::reward_commands;
use kiosk_domain::ports::CaptureTrigger;
use kiosk_domain::{IssuedReward, TriggerSignal};
use kiosk_infrastructure::AppConfig;

use crate::context::{AppContext, ScaleMode};

/// The preview window may take focus; keys are only read from the terminal.
const CAPTURE_PROMPT: &str =
    "Keep this terminal focused, then press SPACE to capture or ESC to cancel.";
const STOP_PROMPT: &str = "Back in this terminal, press ENTER, ESC or q to stop the sorter.";

/// Capture trigger read from the operator's terminal.
pub struct KeyboardTrigger;

#[async_trait]
impl CaptureTrigger for KeyboardTrigger {
    async fn wait(&self) -> Result<TriggerSignal> {
        println!("{}", CAPTURE_PROMPT);
        tokio::task::spawn_blocking(|| read_key(signal_for_key))
            .await
            .map_err(|err| anyhow!("keyboard task failed: {}", err))?
    }
}

pub fn signal_for_key(code: KeyCode) -> Option<TriggerSignal> {
    match code {
        KeyCode::Char(' ') | KeyCode::Enter => Some(TriggerSignal::Capture),
        KeyCode::Esc | KeyCode::Char('q') => Some(TriggerSignal::Cancel),
        _ => None,
    }
}

fn is_stop_key(code: KeyCode) -> Option<()> {
    matches!(code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char('q')).then_some(())
}

/// Leaves raw mode on every exit path.
struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> Result<Self> {
        enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if let Err(err) = disable_raw_mode() {
            warn!("failed to restore terminal: {}", err);
        }
    }
}

fn read_key<T>(decide: fn(KeyCode) -> Option<T>) -> Result<T> {
    let _raw = RawModeGuard::enable()?;
    loop {
        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if let Some(decision) = decide(key.code) {
                return Ok(decision);
            }
        }
    }
}

async fn wait_for_stop_key() -> Result<()> {
    println!("{}", STOP_PROMPT);
    tokio::task::spawn_blocking(|| read_key(is_stop_key))
        .await
        .map_err(|err| anyhow!("keyboard task failed: {}", err))?
}

pub fn render_summary(reward: &IssuedReward) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "QR code : {}", reward.id);
    let _ = writeln!(out, "Type    : {}", reward.waste_type);
    let _ = writeln!(out, "Weight  : {:.2} g", reward.weight);
    let _ = writeln!(out, "Amount  : Rs {:.2}", reward.amount);
    if let Some(path) = &reward.qr.saved_to {
        let _ = writeln!(out, "Saved   : {}", path);
    }
    out.push_str(&reward.qr.text);
    out
}

/// Full interactive cycle driven from the terminal.
pub async fn run_interactive(config: &AppConfig) -> Result<()> {
    let context = AppContext::new(config, ScaleMode::Required).await?;
    match cycle_commands::run_cycle(&context.state, &KeyboardTrigger).await? {
        CycleOutcome::Cancelled => {
            info!("cycle cancelled by operator");
            println!("Cancelled.");
        }
        CycleOutcome::Completed(report) => {
            println!("Base weight: {:.2} g", report.base_weight);
            println!(
                "Classification: {} ({})",
                report.classification.label.as_str(),
                report.classification.summary()
            );
            println!("{}", render_summary(&report.reward));
        }
    }
    Ok(())
}

/// Operator-entered category and weight, no devices.
pub async fn run_manual(config: &AppConfig, waste_type: &str, weight: f64) -> Result<()> {
    let context = AppContext::new(config, ScaleMode::Disabled).await?;
    let reward = reward_commands::issue_manual_reward(&context.state, waste_type, weight).await?;
    println!("{}", render_summary(&reward));
    Ok(())
}

/// Capture, classify and run the servo until the operator stops it.
pub async fn run_sort(config: &AppConfig) -> Result<()> {
    let context = AppContext::new(config, ScaleMode::Required).await?;
    let outcome =
        cycle_commands::run_sort_only(&context.state, &KeyboardTrigger, wait_for_stop_key())
            .await?;
    match outcome {
        SortOutcome::Cancelled => println!("Cancelled."),
        SortOutcome::Sorted(classification) => {
            println!(
                "Sorted as {} ({})",
                classification.label.as_str(),
                classification.summary()
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use kiosk_domain::{QrArtifact, RecordId, WasteCategory};

    use super::*;

    #[test]
    fn keys_map_to_trigger_signals() {
        assert_eq!(
            signal_for_key(KeyCode::Char(' ')),
            Some(TriggerSignal::Capture)
        );
        assert_eq!(signal_for_key(KeyCode::Esc), Some(TriggerSignal::Cancel));
        assert_eq!(signal_for_key(KeyCode::Char('x')), None);
        assert_eq!(is_stop_key(KeyCode::Char('q')), Some(()));
        assert_eq!(is_stop_key(KeyCode::Char(' ')), None);
    }

    #[test]
    fn prompts_point_the_operator_at_the_terminal() {
        assert!(CAPTURE_PROMPT.contains("terminal"));
        assert!(CAPTURE_PROMPT.contains("SPACE"));
        assert!(STOP_PROMPT.contains("terminal"));
    }

    #[test]
    fn summary_lists_record_and_qr() {
        let reward = IssuedReward {
            id: RecordId("QR_ABCDEF12".to_string()),
            waste_type: WasteCategory::Dry,
            weight: 150.0,
            amount: 3.0,
            qr: QrArtifact {
                png: Vec::new(),
                text: "##".to_string(),
                saved_to: Some("qr/QR_ABCDEF12.png".to_string()),
            },
        };
        let summary = render_summary(&reward);
        assert!(summary.contains("QR code : QR_ABCDEF12"));
        assert!(summary.contains("Type    : DRY"));
        assert!(summary.contains("Amount  : Rs 3.00"));
        assert!(summary.contains("Saved   : qr/QR_ABCDEF12.png"));
        assert!(summary.ends_with("##"));
    }
}
