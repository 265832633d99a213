//! The prompt decision engine. [AppRater] counts launches, decides when the user should be asked
//! for a rating and applies the answer.
//!
//! A prompt is requested once the application has been launched at least
//! [config::LAUNCHES_UNTIL_PROMPT] times and [config::DAYS_UNTIL_PROMPT] days have passed since
//! the first launch (both configurable). Answering "rate" or "don't show again" stops prompts for
//! good.

pub mod config;
pub mod outcome;
pub mod platform;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use config::{DialogStrings, RaterConfig};
use outcome::{OutcomeResponder, PromptOutcome, RaterCallbacks};
use platform::{store_listing_uri, DialogPresenter, HostMetadata, RatingDialog, StoreNavigator};
use tracing::{debug, info, info_span};

use crate::{
    storage::{
        counters::{CounterStore, RaterState, FIRST_LAUNCH_UNSET},
        preferences::KeyValueStore,
    },
    utils::{
        clock::{Clock, DefaultClock},
        time::{days_to_millis, millis_to_date},
    },
};

/// Collaborators provided by the host.
pub struct Platform {
    pub presenter: Arc<dyn DialogPresenter>,
    pub navigator: Arc<dyn StoreNavigator>,
    pub host: Arc<dyn HostMetadata>,
    pub clock: Box<dyn Clock>,
}

impl Platform {
    pub fn new(
        presenter: Arc<dyn DialogPresenter>,
        navigator: Arc<dyn StoreNavigator>,
        host: Arc<dyn HostMetadata>,
    ) -> Self {
        Self {
            presenter,
            navigator,
            host,
            clock: Box::new(DefaultClock),
        }
    }

    pub fn with_clock(self, clock: impl Clock) -> Self {
        Self {
            clock: Box::new(clock),
            ..self
        }
    }
}

/// Result of a single [AppRater::evaluate_and_maybe_prompt] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Evaluation {
    /// The user has already rated or declined. Nothing was counted.
    Dismissed,
    /// The launch was counted but the thresholds aren't met yet.
    Pending { launch_count: u64, first_launch: i64 },
    /// The dialog was handed to the presenter.
    Prompted { launch_count: u64 },
}

struct RaterInner {
    counters: CounterStore<Box<dyn KeyValueStore>>,
    config: Option<RaterConfig>,
}

struct Shared {
    state: Mutex<RaterInner>,
    platform: Platform,
}

/// Handle to the rater of the process. Cloning it is cheap and all clones share the same state.
///
/// Every operation that reads and then writes persisted state runs under a single lock, so
/// concurrent launches can't lose increments or read a half-written state. The presenter is
/// called after the lock is released.
#[derive(Clone)]
pub struct AppRater {
    shared: Arc<Shared>,
}

impl AppRater {
    pub fn new(store: impl KeyValueStore + 'static, platform: Platform) -> Self {
        let inner = RaterInner {
            counters: CounterStore::new(Box::new(store)),
            config: None,
        };
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(inner),
                platform,
            }),
        }
    }

    /// Replaces the configuration.
    pub fn initialize(&self, config: RaterConfig) {
        debug!("Initializing with {config:?}");
        self.lock().config = Some(config);
    }

    /// Replaces the configuration with one derived from host metadata and `strings`.
    pub fn initialize_from_host(&self, strings: &DialogStrings) {
        let config = RaterConfig::from_host(self.shared.platform.host.as_ref(), strings);
        self.initialize(config);
    }

    pub fn configuration(&self) -> Option<RaterConfig> {
        self.lock().config.clone()
    }

    /// Entry point to be called on each start of the host application. Counts the launch and
    /// requests the rating dialog if enough launches and days have passed.
    pub fn evaluate_and_maybe_prompt(&self, callbacks: RaterCallbacks) -> Evaluation {
        let span = info_span!("evaluate_and_maybe_prompt");
        let _entered = span.enter();

        let (dialog, launch_count) = {
            let mut guard = self.lock();
            let inner = &mut *guard;
            let config = Self::ensure_config(&mut inner.config, &self.shared.platform);

            if inner.counters.is_dismissed_permanently() {
                debug!("Prompt was dismissed permanently");
                return Evaluation::Dismissed;
            }

            let launch_count = inner.counters.increment_launch_count();
            debug!("Increment launch counter to {launch_count}");

            let now = self.shared.platform.clock.millis();
            let mut first_launch = inner.counters.first_launch();
            if first_launch == FIRST_LAUNCH_UNSET {
                info!("First launch, recording its date");
                first_launch = now;
                inner.counters.set_first_launch(first_launch);
            } else {
                debug!("Date of first launch {:?}", millis_to_date(first_launch));
            }

            debug!(
                launch_count,
                launches_until_prompt = config.launches_until_prompt,
                now,
                first_launch,
                days_until_prompt = config.days_until_prompt,
                "Checking thresholds"
            );

            if !thresholds_met(config, launch_count, first_launch, now) {
                return Evaluation::Pending {
                    launch_count,
                    first_launch,
                };
            }

            info!("Thresholds met after {launch_count} launches, requesting dialog");
            (rating_dialog(config), launch_count)
        };

        self.present(dialog, callbacks);
        Evaluation::Prompted { launch_count }
    }

    /// Requests the dialog regardless of the thresholds.
    pub fn show_dialog(&self, callbacks: RaterCallbacks) {
        let dialog = {
            let mut guard = self.lock();
            let inner = &mut *guard;
            let config = Self::ensure_config(&mut inner.config, &self.shared.platform);
            rating_dialog(config)
        };
        self.present(dialog, callbacks);
    }

    /// Applies the effect of an answer on persisted state: "rate" and "don't show again" stop
    /// future prompts and "rate" additionally opens the store listing. "Remind later" changes
    /// nothing.
    pub fn handle_outcome(&self, outcome: PromptOutcome) {
        let listing = {
            let mut guard = self.lock();
            let inner = &mut *guard;
            match outcome {
                PromptOutcome::Rate => {
                    inner.counters.set_dismissed_permanently(true);
                    let config = Self::ensure_config(&mut inner.config, &self.shared.platform);
                    Some(store_listing_uri(&config.app_id))
                }
                PromptOutcome::DontShowAgain => {
                    inner.counters.set_dismissed_permanently(true);
                    None
                }
                PromptOutcome::RemindLater => None,
            }
        };

        if let Some(uri) = listing {
            info!("Opening store listing {uri}");
            self.shared.platform.navigator.open_store_listing(&uri);
        }
    }

    pub fn is_dismissed_permanently(&self) -> bool {
        self.lock().counters.is_dismissed_permanently()
    }

    pub fn set_dismissed_permanently(&self, dismissed: bool) {
        self.lock().counters.set_dismissed_permanently(dismissed);
    }

    pub fn launch_count(&self) -> u64 {
        self.lock().counters.launch_count()
    }

    pub fn set_launch_count(&self, launch_count: u64) {
        self.lock().counters.set_launch_count(launch_count);
    }

    pub fn first_launch(&self) -> i64 {
        self.lock().counters.first_launch()
    }

    pub fn set_first_launch(&self, first_launch: i64) {
        self.lock().counters.set_first_launch(first_launch);
    }

    pub fn state(&self) -> RaterState {
        self.lock().counters.snapshot()
    }

    pub(crate) fn complete_prompt(&self, outcome: PromptOutcome, callbacks: RaterCallbacks) {
        info!("User picked {outcome}");
        self.handle_outcome(outcome);
        callbacks.dispatch(outcome);
    }

    fn present(&self, dialog: RatingDialog, callbacks: RaterCallbacks) {
        let responder = OutcomeResponder::new(self.clone(), callbacks);
        self.shared.platform.presenter.present(dialog, responder);
    }

    /// Derives the default configuration if none was supplied. An existing one is kept.
    fn ensure_config<'a>(
        config: &'a mut Option<RaterConfig>,
        platform: &Platform,
    ) -> &'a RaterConfig {
        config.get_or_insert_with(|| {
            info!("No configuration supplied, deriving it from host metadata");
            RaterConfig::from_host(platform.host.as_ref(), &DialogStrings::default())
        })
    }

    /// State is re-read from the store on every call, so a panic in another holder leaves
    /// nothing worth discarding.
    fn lock(&self) -> MutexGuard<'_, RaterInner> {
        self.shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

fn thresholds_met(config: &RaterConfig, launch_count: u64, first_launch: i64, now: i64) -> bool {
    launch_count >= config.launches_until_prompt
        && now >= first_launch.saturating_add(days_to_millis(config.days_until_prompt))
}

fn rating_dialog(config: &RaterConfig) -> RatingDialog {
    RatingDialog {
        title: config.dialog_title.clone(),
        message: config.dialog_message.clone(),
        button_rate: config.button_rate.clone(),
        button_remind_later: config.button_remind_later.clone(),
        button_dont_show_again: config.button_dont_show_again.clone(),
    }
}
