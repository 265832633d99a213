//! Contracts the host platform has to fulfill for the rater. None of them report errors: the
//! prompt is advisory, so a collaborator that can't do its job simply results in no prompt.

use super::outcome::OutcomeResponder;

/// Prefix of store listing links. The application identifier is appended to it.
pub const STORE_LISTING_PREFIX: &str = "market://details?id=";

pub fn store_listing_uri(app_id: &str) -> String {
    format!("{STORE_LISTING_PREFIX}{app_id}")
}

/// What the host knows about itself. Only used for deriving the default configuration.
#[cfg_attr(test, mockall::automock)]
pub trait HostMetadata: Send + Sync {
    fn application_display_name(&self) -> String;

    fn application_identifier(&self) -> String;
}

/// [HostMetadata] for hosts that know their name and identifier up front.
#[derive(Debug, Clone)]
pub struct StaticHost {
    name: String,
    id: String,
}

impl StaticHost {
    pub fn new(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
        }
    }
}

impl HostMetadata for StaticHost {
    fn application_display_name(&self) -> String {
        self.name.clone()
    }

    fn application_identifier(&self) -> String {
        self.id.clone()
    }
}

/// Content of the rating dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RatingDialog {
    pub title: String,
    pub message: String,
    pub button_rate: String,
    pub button_remind_later: String,
    pub button_dont_show_again: String,
}

/// Shows the rating dialog. The dialog offers exactly three actions and the presenter reports the
/// chosen one through `responder`, either right away or at any later point. Dropping the
/// responder without answering means the dialog never reached the user.
#[cfg_attr(test, mockall::automock)]
pub trait DialogPresenter: Send + Sync {
    fn present(&self, dialog: RatingDialog, responder: OutcomeResponder);
}

/// Opens the store listing of the application. Fire-and-forget.
#[cfg_attr(test, mockall::automock)]
pub trait StoreNavigator: Send + Sync {
    fn open_store_listing(&self, uri: &str);
}

#[cfg(test)]
mod tests {
    use super::store_listing_uri;

    #[test]
    fn test_store_listing_uri() {
        assert_eq!(
            store_listing_uri("com.example.notes"),
            "market://details?id=com.example.notes"
        );
    }
}
