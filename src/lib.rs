//! Small helper that asks users to rate an application once they have used it for a while.
//! Launches are counted in a durable key-value store and a dialog is requested after enough
//! launches and days. The host supplies the dialog, the store navigation and its own metadata,
//! see [rater::platform].
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use apprater::{
//!     cli::terminal::{TerminalNavigator, TerminalPresenter},
//!     rater::{outcome::RaterCallbacks, platform::StaticHost, AppRater, Platform},
//!     storage::preferences::MemoryPreferences,
//! };
//!
//! let platform = Platform::new(
//!     Arc::new(TerminalPresenter::interactive()),
//!     Arc::new(TerminalNavigator),
//!     Arc::new(StaticHost::new("Notes", "com.example.notes")),
//! );
//! let rater = AppRater::new(MemoryPreferences::new(), platform);
//! rater.evaluate_and_maybe_prompt(RaterCallbacks::new().on_rate(|| println!("Thanks!")));
//! ```

pub mod cli;
pub mod rater;
pub mod storage;
pub mod utils;
