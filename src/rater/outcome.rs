use std::fmt::Display;

use clap::ValueEnum;
use tracing::debug;

use super::AppRater;

/// Action picked by the user in the rating dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum PromptOutcome {
    Rate,
    RemindLater,
    DontShowAgain,
}

impl Display for PromptOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PromptOutcome::Rate => write!(f, "rate"),
            PromptOutcome::RemindLater => write!(f, "remind-later"),
            PromptOutcome::DontShowAgain => write!(f, "dont-show-again"),
        }
    }
}

type Handler = Box<dyn FnOnce() + Send + 'static>;

/// Handlers invoked after the user answered the dialog and the rater applied the answer. Every
/// slot is optional.
#[derive(Default)]
pub struct RaterCallbacks {
    on_rate: Option<Handler>,
    on_remind_later: Option<Handler>,
    on_dont_show_again: Option<Handler>,
}

impl RaterCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_rate(mut self, handler: impl FnOnce() + Send + 'static) -> Self {
        self.on_rate = Some(Box::new(handler));
        self
    }

    pub fn on_remind_later(mut self, handler: impl FnOnce() + Send + 'static) -> Self {
        self.on_remind_later = Some(Box::new(handler));
        self
    }

    pub fn on_dont_show_again(mut self, handler: impl FnOnce() + Send + 'static) -> Self {
        self.on_dont_show_again = Some(Box::new(handler));
        self
    }

    /// Runs the handler matching `outcome`. The others are dropped.
    pub(super) fn dispatch(self, outcome: PromptOutcome) {
        let handler = match outcome {
            PromptOutcome::Rate => self.on_rate,
            PromptOutcome::RemindLater => self.on_remind_later,
            PromptOutcome::DontShowAgain => self.on_dont_show_again,
        };
        if let Some(handler) = handler {
            handler();
        }
    }
}

/// One-shot channel from a [DialogPresenter](super::platform::DialogPresenter) back to the rater.
pub struct OutcomeResponder {
    rater: AppRater,
    callbacks: Option<RaterCallbacks>,
}

impl OutcomeResponder {
    pub(super) fn new(rater: AppRater, callbacks: RaterCallbacks) -> Self {
        Self {
            rater,
            callbacks: Some(callbacks),
        }
    }

    /// Applies the user's choice and runs the matching callback.
    pub fn respond(mut self, outcome: PromptOutcome) {
        if let Some(callbacks) = self.callbacks.take() {
            self.rater.complete_prompt(outcome, callbacks);
        }
    }
}

impl Drop for OutcomeResponder {
    fn drop(&mut self) {
        if self.callbacks.is_some() {
            debug!("Dialog was closed without an answer");
        }
    }
}
