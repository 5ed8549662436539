use serde::Deserialize;

fn default_appeared() -> String {
    "*Pollution limit exceeded*".to_string()
}

fn default_continues() -> String {
    "*Pollution continues*".to_string()
}

fn default_cleared() -> String {
    "*Pollution is over*".to_string()
}

fn default_cleared_peaks() -> String {
    "Peak values during the episode:".to_string()
}

fn default_line() -> String {
    "{{ name }}: {{ pct }}% of limit".to_string()
}

/// Templates used to compose notification text.
///
/// Headers are rendered without variables. `line` is rendered once per listed
/// substance with `name` and `pct` in scope. Telegram MarkdownV2 entities such
/// as `*bold*` are kept; everything else is escaped on delivery.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct MessageTemplates {
    #[serde(default = "default_appeared")]
    pub appeared: String,

    #[serde(default = "default_continues")]
    pub continues: String,

    #[serde(default = "default_cleared")]
    pub cleared: String,

    /// Introduces the list of peak values in an all-clear message.
    #[serde(default = "default_cleared_peaks")]
    pub cleared_peaks: String,

    #[serde(default = "default_line")]
    pub line: String,
}

impl Default for MessageTemplates {
    fn default() -> Self {
        Self {
            appeared: default_appeared(),
            continues: default_continues(),
            cleared: default_cleared(),
            cleared_peaks: default_cleared_peaks(),
            line: default_line(),
        }
    }
}
