//! Operator command loop.
//!
//! Serves a two-item menu over a [`Console`]: `1` exports the stored history,
//! `2` raises the shutdown signal and ends the loop. Any other input is
//! rejected and the menu is shown again. Commands run one at a time.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};
use tracing::{error, info, warn};

use crate::{
    error::ControlError,
    export::{Exporter, export_all},
    shutdown::ShutdownSignal,
    store::Store,
};

pub const MENU: [&str; 2] = ["1. Export", "2. Quit"];
pub const PROMPT: &str = "Choose an action (1 or 2):";

/// Line-oriented operator channel.
#[async_trait]
pub trait Console: Send {
    /// Show `prompt` and read one line without its terminator.
    /// `Ok(None)` means the input has been closed.
    async fn read_line(&mut self, prompt: &str) -> anyhow::Result<Option<String>>;

    /// Show one line of output to the operator.
    fn say(&mut self, message: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Export,
    Quit,
}

impl Command {
    /// Exact match only: no trimming, no case folding.
    pub fn parse(input: &str) -> Option<Self> {
        match input {
            "1" => Some(Command::Export),
            "2" => Some(Command::Quit),
            _ => None,
        }
    }
}

pub struct ControlLoop<C> {
    store: Arc<dyn Store>,
    exporter: Arc<dyn Exporter>,
    shutdown: ShutdownSignal,
    console: C,
}

impl<C: Console> ControlLoop<C> {
    pub fn new(
        store: Arc<dyn Store>,
        exporter: Arc<dyn Exporter>,
        shutdown: ShutdownSignal,
        console: C,
    ) -> Self {
        Self { store, exporter, shutdown, console }
    }

    /// Serve commands until quit. On failure the shutdown signal is still
    /// raised so the scheduler does not outlive the operator.
    pub async fn run(mut self) -> Result<(), ControlError> {
        info!("Control loop started");
        let result = self.serve().await;

        if let Err(err) = &result {
            error!(error = %err, "Control loop failed, shutting down");
            self.console.say(&format!("{err}"));
            self.shutdown.raise();
        }

        info!("Control loop stopped");
        result
    }

    async fn serve(&mut self) -> Result<(), ControlError> {
        loop {
            if self.shutdown.is_raised() {
                return Ok(());
            }

            self.console.say("");
            self.console.say("Menu:");
            for item in MENU {
                self.console.say(item);
            }

            let line = tokio::select! {
                _ = self.shutdown.raised() => return Ok(()),
                line = self.console.read_line(PROMPT) => line.map_err(ControlError::Input)?,
            };
            let Some(line) = line else {
                return Err(ControlError::InputClosed);
            };

            match Command::parse(&line) {
                Some(Command::Export) => self.export().await,
                Some(Command::Quit) => {
                    self.console.say("Shutting down...");
                    self.shutdown.raise();
                    return Ok(());
                }
                None => self.console.say("Invalid choice, please try again."),
            }
        }
    }

    async fn export(&mut self) {
        self.console.say("Exporting data to spreadsheet...");

        match export_all(self.store.as_ref(), self.exporter.as_ref()).await {
            Ok(report) => {
                info!(path = %report.path.display(), records = report.records, "Export finished");
                self.console.say(&format!(
                    "Export finished: {} records written to {}",
                    report.records,
                    report.path.display()
                ));
            }
            Err(err) => {
                warn!(error = %err, "Export failed");
                self.console.say(&format!("Export failed: {err}"));
            }
        }
    }
}

/// Console over the process's stdin/stdout, for non-interactive use.
pub struct StdinConsole {
    lines: Lines<BufReader<Stdin>>,
}

impl StdinConsole {
    pub fn new() -> Self {
        Self { lines: BufReader::new(tokio::io::stdin()).lines() }
    }
}

impl Default for StdinConsole {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Console for StdinConsole {
    async fn read_line(&mut self, prompt: &str) -> anyhow::Result<Option<String>> {
        let mut stdout = tokio::io::stdout();
        stdout.write_all(format!("{prompt} ").as_bytes()).await?;
        stdout.flush().await?;

        Ok(self.lines.next_line().await?)
    }

    fn say(&mut self, message: &str) {
        println!("{message}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        store::MemoryStore,
        testing::{FailingExporter, RecordingExporter, ScriptedConsole, Step, sample_at},
    };
    use std::time::Duration;

    struct Harness {
        store: Arc<MemoryStore>,
        exporter: Arc<RecordingExporter>,
        shutdown: ShutdownSignal,
        console: ScriptedConsole,
    }

    impl Harness {
        fn new(console: ScriptedConsole) -> Self {
            Self {
                store: Arc::new(MemoryStore::new()),
                exporter: Arc::new(RecordingExporter::new()),
                shutdown: ShutdownSignal::new(),
                console,
            }
        }

        async fn run(&self) -> Result<(), ControlError> {
            ControlLoop::new(
                self.store.clone(),
                self.exporter.clone(),
                self.shutdown.clone(),
                self.console.clone(),
            )
            .run()
            .await
        }
    }

    #[test]
    fn command_matching_is_exact() {
        assert_eq!(Command::parse("1"), Some(Command::Export));
        assert_eq!(Command::parse("2"), Some(Command::Quit));
        for input in ["", "3", " 1", "1 ", "01", "2\n", "quit", "Export"] {
            assert_eq!(Command::parse(input), None, "{input:?} must be rejected");
        }
    }

    #[tokio::test]
    async fn export_then_invalid_then_quit() {
        let h = Harness::new(ScriptedConsole::lines(&["1", "3", "2"]));
        h.store.append(&sample_at(0)).await.unwrap();

        h.run().await.unwrap();

        assert_eq!(h.exporter.created(), 1);
        assert_eq!(h.exporter.written().len(), 1);
        assert_eq!(h.console.prompts(), 3);
        assert!(h.console.saw("Export finished: 1 records"));
        assert!(h.console.saw("Invalid choice"));
        assert!(h.shutdown.is_raised());
    }

    #[tokio::test]
    async fn menu_is_shown_before_every_prompt() {
        let h = Harness::new(ScriptedConsole::lines(&["x", "2"]));

        h.run().await.unwrap();

        let menus = h.console.output().iter().filter(|l| *l == "1. Export").count();
        assert_eq!(menus, 2);
        assert!(h.console.saw("2. Quit"));
    }

    #[tokio::test]
    async fn invalid_input_has_no_side_effects() {
        let h = Harness::new(ScriptedConsole::lines(&[" 1", "export", "2"]));

        h.run().await.unwrap();

        assert_eq!(h.exporter.created(), 0);
        assert_eq!(h.console.prompts(), 3);
    }

    #[tokio::test]
    async fn failed_export_keeps_the_loop_running() {
        let console = ScriptedConsole::lines(&["1", "2"]);
        let shutdown = ShutdownSignal::new();

        ControlLoop::new(
            Arc::new(MemoryStore::new()),
            Arc::new(FailingExporter::on_create()),
            shutdown.clone(),
            console.clone(),
        )
        .run()
        .await
        .unwrap();

        assert!(console.saw("Export failed: Failed to create export file: permission denied"));
        assert_eq!(console.prompts(), 2);
        assert!(shutdown.is_raised());
    }

    #[tokio::test]
    async fn closed_input_raises_shutdown_and_fails() {
        let h = Harness::new(ScriptedConsole::new([Step::Line("1"), Step::Closed]));

        let err = h.run().await.unwrap_err();

        assert!(matches!(err, ControlError::InputClosed));
        assert!(h.shutdown.is_raised());
        assert_eq!(h.exporter.created(), 1);
    }

    #[tokio::test]
    async fn read_error_raises_shutdown_and_fails() {
        let h = Harness::new(ScriptedConsole::new([Step::Fail("terminal went away")]));

        let err = h.run().await.unwrap_err();

        assert!(err.to_string().contains("terminal went away"));
        assert!(h.shutdown.is_raised());
    }

    #[tokio::test(start_paused = true)]
    async fn external_shutdown_stops_waiting_for_input() {
        let h = Harness::new(ScriptedConsole::default());
        let shutdown = h.shutdown.clone();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            shutdown.raise();
        });

        tokio::time::timeout(Duration::from_secs(5), h.run())
            .await
            .expect("loop must return once shutdown is raised")
            .unwrap();
        assert_eq!(h.console.prompts(), 1);
    }
}
