//! Terminal realizations of the platform contracts, used by the `apprater` binary to play the role
//! of a host application.

use std::{
    env,
    path::{Path, PathBuf},
};

use ansi_term::{Colour, Style};
use tokio::io::{self, AsyncBufReadExt, BufReader};
use tracing::{debug, warn};

use crate::rater::{
    outcome::{OutcomeResponder, PromptOutcome},
    platform::{DialogPresenter, HostMetadata, RatingDialog, StoreNavigator},
};

/// Renders the dialog on stdout and reads the answer from stdin on a separate task, so the answer
/// arrives on a later turn of the runtime like a click on a real dialog would.
pub struct TerminalPresenter {
    preset: Option<PromptOutcome>,
}

impl TerminalPresenter {
    pub fn interactive() -> Self {
        Self { preset: None }
    }

    /// Answers every dialog with `outcome` without waiting for input.
    pub fn answering(outcome: PromptOutcome) -> Self {
        Self {
            preset: Some(outcome),
        }
    }
}

impl DialogPresenter for TerminalPresenter {
    fn present(&self, dialog: RatingDialog, responder: OutcomeResponder) {
        println!("{}", render_dialog(&dialog));

        if let Some(outcome) = self.preset {
            println!("> {outcome}");
            responder.respond(outcome);
            return;
        }

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("No runtime to read the answer on, skipping the dialog");
            return;
        };
        runtime.spawn(async move {
            match read_answer().await {
                Ok(Some(outcome)) => responder.respond(outcome),
                Ok(None) => debug!("Input closed before an answer was given"),
                Err(e) => warn!("Failed to read the answer {e:?}"),
            }
        });
    }
}

fn render_dialog(dialog: &RatingDialog) -> String {
    let bold = Style::new().bold();
    let button = Colour::Cyan.bold();
    format!(
        "\n{}\n\n{}\n\n  {} {}\n  {} {}\n  {} {}\n",
        bold.paint(dialog.title.as_str()),
        dialog.message,
        button.paint("[1]"),
        dialog.button_rate,
        button.paint("[2]"),
        dialog.button_remind_later,
        button.paint("[3]"),
        dialog.button_dont_show_again,
    )
}

/// Reads lines until one of them is a valid answer. `None` means stdin was closed.
async fn read_answer() -> Result<Option<PromptOutcome>, io::Error> {
    let mut lines = BufReader::new(io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match parse_answer(&line) {
            Some(outcome) => return Ok(Some(outcome)),
            None => println!("Pick 1, 2 or 3"),
        }
    }
    Ok(None)
}

pub fn parse_answer(input: &str) -> Option<PromptOutcome> {
    match input.trim().to_lowercase().as_str() {
        "1" | "rate" => Some(PromptOutcome::Rate),
        "2" | "later" | "remind-later" => Some(PromptOutcome::RemindLater),
        "3" | "never" | "dont-show-again" => Some(PromptOutcome::DontShowAgain),
        _ => None,
    }
}

/// There is no store to open from a terminal, so the listing is printed instead.
pub struct TerminalNavigator;

impl StoreNavigator for TerminalNavigator {
    fn open_store_listing(&self, uri: &str) {
        println!("Opening store listing {}", Colour::Green.paint(uri));
    }
}

/// Describes the running executable as the host application.
pub struct ProcessHost;

impl HostMetadata for ProcessHost {
    fn application_display_name(&self) -> String {
        env::current_exe()
            .ok()
            .as_deref()
            .and_then(|path| path.file_stem())
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| env!("CARGO_PKG_NAME").into())
    }

    fn application_identifier(&self) -> String {
        env!("CARGO_PKG_NAME").into()
    }
}

pub fn default_config_path(dir: &Path) -> PathBuf {
    dir.join("config.json")
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio::sync::mpsc;

    use crate::{
        rater::{outcome::RaterCallbacks, platform::StaticHost, AppRater, Platform},
        storage::preferences::MemoryPreferences,
    };

    use super::*;

    #[test]
    fn test_parse_answer() {
        assert_eq!(parse_answer(" 1\n"), Some(PromptOutcome::Rate));
        assert_eq!(parse_answer("Later"), Some(PromptOutcome::RemindLater));
        assert_eq!(parse_answer("dont-show-again"), Some(PromptOutcome::DontShowAgain));
        assert_eq!(parse_answer("4"), None);
        assert_eq!(parse_answer(""), None);
    }

    #[test]
    fn test_render_dialog_lists_all_buttons() {
        let rendered = render_dialog(&RatingDialog {
            title: "Rate Notes".into(),
            message: "Please".into(),
            button_rate: "Yes".into(),
            button_remind_later: "Later".into(),
            button_dont_show_again: "Never".into(),
        });
        for part in ["Rate Notes", "Please", "Yes", "Later", "Never"] {
            assert!(rendered.contains(part), "{part} missing from {rendered}");
        }
    }

    #[tokio::test]
    async fn test_preset_answer_reaches_callbacks() {
        let platform = Platform::new(
            Arc::new(TerminalPresenter::answering(PromptOutcome::DontShowAgain)),
            Arc::new(TerminalNavigator),
            Arc::new(StaticHost::new("Notes", "com.example.notes")),
        );
        let rater = AppRater::new(MemoryPreferences::new(), platform);

        let (sender, mut receiver) = mpsc::unbounded_channel();
        rater.show_dialog(RaterCallbacks::new().on_dont_show_again(move || {
            let _ = sender.send(PromptOutcome::DontShowAgain);
        }));

        assert_eq!(receiver.recv().await, Some(PromptOutcome::DontShowAgain));
        assert!(rater.is_dismissed_permanently());
    }

    #[test]
    fn test_process_host_has_identity() {
        assert_eq!(ProcessHost.application_identifier(), "apprater");
        assert!(!ProcessHost.application_display_name().is_empty());
    }
}
