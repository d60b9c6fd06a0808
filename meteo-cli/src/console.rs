use anyhow::{Context, Result};
use async_trait::async_trait;
use inquire::{InquireError, Text};
use meteo_core::Console;

/// Operator console on an interactive terminal.
///
/// `inquire` blocks, so every prompt runs on the blocking pool. Esc and
/// Ctrl-C close the input.
#[derive(Debug, Default)]
pub struct TerminalConsole;

#[async_trait]
impl Console for TerminalConsole {
    async fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        let prompt = prompt.to_string();
        let answer = tokio::task::spawn_blocking(move || Text::new(&prompt).prompt())
            .await
            .context("Prompt task panicked")?;

        match answer {
            Ok(line) => Ok(Some(line)),
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(None),
            Err(err) => Err(err).context("Terminal prompt failed"),
        }
    }

    fn say(&mut self, message: &str) {
        println!("{message}");
    }
}
