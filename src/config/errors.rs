use std::fmt;

#[derive(Debug, PartialEq, Eq)]
pub enum SettingsError {
    Missing { setting_name: String },
    Invalid { setting_name: String, reason: String },
    Parse { setting_name: String, error: String },
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing { setting_name } => {
                write!(f, "Required setting '{}' is missing", setting_name)
            }
            Self::Invalid { setting_name, reason } => {
                write!(f, "Invalid setting '{}': {}", setting_name, reason)
            }
            Self::Parse { setting_name, error } => {
                write!(f, "Failed to parse setting '{}': {}", setting_name, error)
            }
        }
    }
}

impl std::error::Error for SettingsError {}
