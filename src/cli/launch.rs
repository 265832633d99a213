use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::{
    rater::{
        config::{RaterConfig, RaterConfigFile},
        outcome::{PromptOutcome, RaterCallbacks},
        platform::{DialogPresenter, HostMetadata},
        AppRater, Evaluation, Platform,
    },
    storage::{counters::NAMESPACE, preferences::FilePreferences},
};

use super::terminal::{default_config_path, ProcessHost, TerminalNavigator, TerminalPresenter};

#[derive(Debug, Clone, Default, clap::Args)]
pub struct LaunchCommand {
    #[arg(
        long,
        help = "JSON configuration file. By default <dir>/config.json is used when it exists"
    )]
    config: Option<PathBuf>,
    #[arg(long = "app-name", help = "Name of the application shown in the dialog")]
    app_name: Option<String>,
    #[arg(long = "app-id", help = "Store identifier of the application")]
    app_id: Option<String>,
    #[arg(long, help = "Days since first launch before asking. Defaults to 3")]
    days: Option<u32>,
    #[arg(long, help = "Launches before asking. Defaults to 7")]
    launches: Option<u64>,
    #[arg(
        long,
        value_enum,
        help = "Answer the dialog without asking. Useful for scripting"
    )]
    answer: Option<PromptOutcome>,
}

/// Command to process `launch` command. Counts one launch of the application and shows the rating
/// dialog when it's time.
pub async fn process_launch_command(dir: &Path, command: LaunchCommand) -> Result<()> {
    let presenter: Arc<dyn DialogPresenter> = match command.answer {
        Some(outcome) => Arc::new(TerminalPresenter::answering(outcome)),
        None => Arc::new(TerminalPresenter::interactive()),
    };

    let (evaluation, outcome) = launch(dir, command, presenter).await?;
    match evaluation {
        Evaluation::Dismissed => println!("Rating prompt is dismissed"),
        Evaluation::Pending {
            launch_count,
            first_launch,
        } => {
            debug!("Pending since {first_launch}");
            println!("Launch {launch_count} counted")
        }
        Evaluation::Prompted { .. } => match outcome {
            Some(outcome) => println!("Answered {outcome}"),
            None => println!("Dialog closed without an answer"),
        },
    }
    Ok(())
}

/// Runs one evaluation and waits for the answer if a dialog was shown.
async fn launch(
    dir: &Path,
    command: LaunchCommand,
    presenter: Arc<dyn DialogPresenter>,
) -> Result<(Evaluation, Option<PromptOutcome>)> {
    let host: Arc<dyn HostMetadata> = Arc::new(ProcessHost);
    let store = FilePreferences::open(dir, NAMESPACE)?;
    debug!("Using preferences at {:?}", store.path());
    let rater = AppRater::new(
        store,
        Platform::new(presenter, Arc::new(TerminalNavigator), host.clone()),
    );

    let file = load_config_file(dir, command.config.as_deref())?;
    if let Some(config) = resolve_config(file, &command, host.as_ref()) {
        rater.initialize(config);
    }

    let (sender, mut receiver) = mpsc::unbounded_channel::<PromptOutcome>();
    let callbacks = {
        let (rate, later, never) = (sender.clone(), sender.clone(), sender);
        RaterCallbacks::new()
            .on_rate(move || {
                let _ = rate.send(PromptOutcome::Rate);
            })
            .on_remind_later(move || {
                let _ = later.send(PromptOutcome::RemindLater);
            })
            .on_dont_show_again(move || {
                let _ = never.send(PromptOutcome::DontShowAgain);
            })
    };

    let evaluation = rater.evaluate_and_maybe_prompt(callbacks);
    info!("Launch evaluated as {evaluation:?}");

    // Senders live in the callbacks, which are dropped once the dialog is answered or abandoned.
    let outcome = receiver.recv().await;
    Ok((evaluation, outcome))
}

/// Command line flags win over the configuration file, the host fills whatever is left. Without
/// a file or flags the rater derives its configuration lazily.
fn resolve_config(
    file: Option<RaterConfigFile>,
    command: &LaunchCommand,
    host: &dyn HostMetadata,
) -> Option<RaterConfig> {
    let has_flags = command.app_name.is_some()
        || command.app_id.is_some()
        || command.days.is_some()
        || command.launches.is_some();
    if file.is_none() && !has_flags {
        return None;
    }

    let file = file.unwrap_or_default();
    let merged = RaterConfigFile {
        app_name: command.app_name.clone().or(file.app_name),
        app_id: command.app_id.clone().or(file.app_id),
        days_until_prompt: command.days.or(file.days_until_prompt),
        launches_until_prompt: command.launches.or(file.launches_until_prompt),
        ..file
    };
    Some(merged.resolve(host))
}

fn load_config_file(dir: &Path, explicit: Option<&Path>) -> Result<Option<RaterConfigFile>> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let path = default_config_path(dir);
            if !path.exists() {
                return Ok(None);
            }
            path
        }
    };
    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read configuration {path:?}"))?;
    let file = RaterConfigFile::from_json(&text)
        .with_context(|| format!("Failed to parse configuration {path:?}"))?;
    Ok(Some(file))
}
