use serde::Deserialize;

use super::platform::HostMetadata;

pub const DAYS_UNTIL_PROMPT: u32 = 3;
pub const LAUNCHES_UNTIL_PROMPT: u64 = 7;

/// Placeholder replaced with the application name in [DialogStrings] templates.
pub const APP_NAME_PLACEHOLDER: &str = "{app}";

/// Everything the rater needs to know about the host application and the dialog it shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RaterConfig {
    pub app_name: String,
    /// Identifier of the application in the store, e.g. `com.example.app`.
    pub app_id: String,
    pub dialog_title: String,
    pub dialog_message: String,
    pub button_rate: String,
    pub button_remind_later: String,
    pub button_dont_show_again: String,
    pub days_until_prompt: u32,
    pub launches_until_prompt: u64,
}

/// Localized texts of the dialog. Title and message are templates where
/// [APP_NAME_PLACEHOLDER] is substituted with the application name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogStrings {
    pub title: String,
    pub message: String,
    pub button_rate: String,
    pub button_remind_later: String,
    pub button_dont_show_again: String,
}

impl Default for DialogStrings {
    fn default() -> Self {
        Self::english()
    }
}

impl DialogStrings {
    pub fn english() -> Self {
        Self {
            title: "Rate {app}".into(),
            message: "If you enjoy using {app}, please take a moment to rate it. \
                      Thanks for your support!"
                .into(),
            button_rate: "Rate it now".into(),
            button_remind_later: "Remind me later".into(),
            button_dont_show_again: "No, thanks".into(),
        }
    }
}

impl RaterConfig {
    /// Builds a configuration from already localized strings. Thresholds get their defaults.
    pub fn from_strings(app_name: &str, app_id: &str, strings: &DialogStrings) -> Self {
        Self {
            app_name: app_name.to_owned(),
            app_id: app_id.to_owned(),
            dialog_title: strings.title.replace(APP_NAME_PLACEHOLDER, app_name),
            dialog_message: strings.message.replace(APP_NAME_PLACEHOLDER, app_name),
            button_rate: strings.button_rate.clone(),
            button_remind_later: strings.button_remind_later.clone(),
            button_dont_show_again: strings.button_dont_show_again.clone(),
            days_until_prompt: DAYS_UNTIL_PROMPT,
            launches_until_prompt: LAUNCHES_UNTIL_PROMPT,
        }
    }

    /// Derives the default configuration from what the host knows about itself.
    pub fn from_host(host: &dyn HostMetadata, strings: &DialogStrings) -> Self {
        Self::from_strings(
            &host.application_display_name(),
            &host.application_identifier(),
            strings,
        )
    }

    pub fn with_thresholds(self, days_until_prompt: u32, launches_until_prompt: u64) -> Self {
        Self {
            days_until_prompt,
            launches_until_prompt,
            ..self
        }
    }
}

/// On-disk shape of a configuration file. Only the application fields are required, everything
/// else falls back to [DialogStrings::english] and the default thresholds.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RaterConfigFile {
    pub app_name: Option<String>,
    pub app_id: Option<String>,
    pub dialog_title: Option<String>,
    pub dialog_message: Option<String>,
    pub button_rate: Option<String>,
    pub button_remind_later: Option<String>,
    pub button_dont_show_again: Option<String>,
    pub days_until_prompt: Option<u32>,
    pub launches_until_prompt: Option<u64>,
}

impl RaterConfigFile {
    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Fills the gaps of the file with values derived from the host.
    pub fn resolve(self, host: &dyn HostMetadata) -> RaterConfig {
        let app_name = self
            .app_name
            .unwrap_or_else(|| host.application_display_name());
        let app_id = self
            .app_id
            .unwrap_or_else(|| host.application_identifier());

        let defaults = DialogStrings::english();
        let strings = DialogStrings {
            title: self.dialog_title.unwrap_or(defaults.title),
            message: self.dialog_message.unwrap_or(defaults.message),
            button_rate: self.button_rate.unwrap_or(defaults.button_rate),
            button_remind_later: self
                .button_remind_later
                .unwrap_or(defaults.button_remind_later),
            button_dont_show_again: self
                .button_dont_show_again
                .unwrap_or(defaults.button_dont_show_again),
        };

        RaterConfig::from_strings(&app_name, &app_id, &strings).with_thresholds(
            self.days_until_prompt.unwrap_or(DAYS_UNTIL_PROMPT),
            self.launches_until_prompt.unwrap_or(LAUNCHES_UNTIL_PROMPT),
        )
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;

    use crate::rater::platform::StaticHost;

    use super::*;

    fn host() -> StaticHost {
        StaticHost::new("Notes", "com.example.notes")
    }

    #[test]
    fn test_default_config_from_host() {
        let config = RaterConfig::from_host(&host(), &DialogStrings::english());
        assert_eq!(config.app_name, "Notes");
        assert_eq!(config.app_id, "com.example.notes");
        assert_eq!(config.dialog_title, "Rate Notes");
        assert!(config.dialog_message.starts_with("If you enjoy using Notes,"));
        assert_eq!(config.days_until_prompt, 3);
        assert_eq!(config.launches_until_prompt, 7);
    }

    #[test]
    fn test_localized_strings() {
        let strings = DialogStrings {
            title: "Valora {app}".into(),
            message: "¿Te gusta {app}?".into(),
            button_rate: "Valorar".into(),
            button_remind_later: "Más tarde".into(),
            button_dont_show_again: "No".into(),
        };
        let config = RaterConfig::from_host(&host(), &strings);
        assert_eq!(config.dialog_title, "Valora Notes");
        assert_eq!(config.dialog_message, "¿Te gusta Notes?");
        assert_eq!(config.button_remind_later, "Más tarde");
    }

    #[test]
    fn test_config_file_partial() -> Result<()> {
        let file = RaterConfigFile::from_json(
            r#"{ "app_id": "org.other", "launches_until_prompt": 2, "dialog_title": "Hi {app}" }"#,
        )?;
        let config = file.resolve(&host());
        assert_eq!(config.app_name, "Notes");
        assert_eq!(config.app_id, "org.other");
        assert_eq!(config.dialog_title, "Hi Notes");
        assert_eq!(config.button_rate, DialogStrings::english().button_rate);
        assert_eq!(config.days_until_prompt, DAYS_UNTIL_PROMPT);
        assert_eq!(config.launches_until_prompt, 2);
        Ok(())
    }

    #[test]
    fn test_config_file_rejects_garbage() {
        assert!(RaterConfigFile::from_json("{ \"days_until_prompt\": -1 }").is_err());
    }
}
