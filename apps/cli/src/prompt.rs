//! Interactive deploy confirmation.

use std::future::Future;
use std::io::IsTerminal;
use std::pin::Pin;

use dialoguer::{Confirm, theme::ColorfulTheme};

use scenedeploy_deploy::{Confirmation, DeploySummary};

/// Asks the operator on the terminal before signing.
///
/// Without an interactive stdin the prompt is skipped and the deploy
/// proceeds.
pub struct TerminalConfirm;

impl Confirmation for TerminalConfirm {
    fn confirm(&self, summary: DeploySummary) -> Pin<Box<dyn Future<Output = bool> + Send + '_>> {
        Box::pin(async move {
            if !std::io::stdin().is_terminal() {
                tracing::debug!("stdin is not a terminal, skipping confirmation");
                return true;
            }
            print_summary(&summary);

            let answer = tokio::task::spawn_blocking(|| {
                Confirm::with_theme(&ColorfulTheme::default())
                    .with_prompt("Deploy this scene?")
                    .default(true)
                    .interact()
            })
            .await;

            match answer {
                Ok(Ok(confirmed)) => confirmed,
                Ok(Err(e)) => {
                    tracing::warn!(error = %e, "confirmation prompt failed");
                    false
                }
                Err(e) => {
                    tracing::warn!(error = %e, "confirmation task failed");
                    false
                }
            }
        })
    }
}

fn print_summary(summary: &DeploySummary) {
    println!("Entity   {}", summary.entity_id);
    println!("Parcels  {}", summary.pointers.join(" "));
    println!(
        "Files    {} ({})",
        summary.files,
        human_size(summary.upload_size)
    );
    println!("Target   {}", summary.target);
}

pub fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}
