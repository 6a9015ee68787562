use std::fmt::{self, Display};

/// Lifecycle state reported in an alarm's `Status` field.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AlarmStatus {
    Raised,
    Recovered,
    Cleared,
    Other(String),
}

impl AlarmStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Raised => "RAISED",
            Self::Recovered => "Recovered",
            Self::Cleared => "Cleared",
            Self::Other(raw) => raw,
        }
    }

    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        matches!(self, Self::Recovered | Self::Cleared)
    }
}

impl From<&str> for AlarmStatus {
    fn from(raw: &str) -> Self {
        match raw {
            "RAISED" => Self::Raised,
            "Recovered" => Self::Recovered,
            "Cleared" => Self::Cleared,
            other => Self::Other(other.to_string()),
        }
    }
}

impl Display for AlarmStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity reported in an alarm's `Level` field, lowest first.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AlarmLevel {
    Warning,
    Critical,
    Fault,
    Other(String),
}

impl AlarmLevel {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Warning => "WARNING",
            Self::Critical => "CRITICAL",
            Self::Fault => "FAULT",
            Self::Other(raw) => raw,
        }
    }
}

impl From<&str> for AlarmLevel {
    fn from(raw: &str) -> Self {
        match raw {
            "WARNING" => Self::Warning,
            "CRITICAL" => Self::Critical,
            "FAULT" => Self::Fault,
            other => Self::Other(other.to_string()),
        }
    }
}

impl Display for AlarmLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::{AlarmLevel, AlarmStatus};

    #[test]
    fn status_matching_is_case_sensitive() {
        assert_eq!(AlarmStatus::from("RAISED"), AlarmStatus::Raised);
        assert_eq!(AlarmStatus::from("Cleared"), AlarmStatus::Cleared);
        assert_eq!(
            AlarmStatus::from("raised"),
            AlarmStatus::Other("raised".to_string())
        );
        assert!(AlarmStatus::from("Recovered").is_resolved());
    }

    #[test]
    fn unknown_level_keeps_raw_text() {
        assert_eq!(AlarmLevel::from("FAULT"), AlarmLevel::Fault);
        let other = AlarmLevel::from("MAJOR");
        assert_eq!(other.to_string(), "MAJOR");
    }
}
