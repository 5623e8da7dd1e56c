// severity.rs
// Ordered error levels with lenient string conversion

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Severity classifies how important a leveled error is.
///
/// `Unset` is the "no error" sentinel: it orders below every named level and
/// is what unrecognised input parses to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    #[default]
    Unset,
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

impl Severity {
    /// Every named level, lowest first.
    pub const ALL: [Severity; 5] = [
        Severity::Debug,
        Severity::Info,
        Severity::Warn,
        Severity::Error,
        Severity::Fatal,
    ];

    /// Case-insensitive lookup; anything unrecognised is `Unset`.
    pub fn from_string(level: &str) -> Self {
        match level.to_lowercase().as_str() {
            "debug" => Severity::Debug,
            "info" => Severity::Info,
            "warn" => Severity::Warn,
            "error" => Severity::Error,
            "fatal" => Severity::Fatal,
            _ => Severity::Unset,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Unset => "",
            Severity::Debug => "debug",
            Severity::Info => "info",
            Severity::Warn => "warn",
            Severity::Error => "error",
            Severity::Fatal => "fatal",
        }
    }

    pub fn is_unset(&self) -> bool {
        *self == Severity::Unset
    }

    /// True for ERROR and FATAL
    pub fn is_error(&self) -> bool {
        *self >= Severity::Error
    }

    /// True only for FATAL
    pub fn is_fatal(&self) -> bool {
        *self >= Severity::Fatal
    }

    /// True for every level above DEBUG. `Unset` is not a countable level.
    pub fn not_debug(&self) -> bool {
        *self > Severity::Debug
    }

    /// Matching `tracing` level, FATAL folding into ERROR.
    pub fn to_tracing_level(&self) -> Option<tracing::Level> {
        match self {
            Severity::Unset => None,
            Severity::Debug => Some(tracing::Level::DEBUG),
            Severity::Info => Some(tracing::Level::INFO),
            Severity::Warn => Some(tracing::Level::WARN),
            Severity::Error | Severity::Fatal => Some(tracing::Level::ERROR),
        }
    }
}

impl FromStr for Severity {
    type Err = std::convert::Infallible;

    fn from_str(input: &str) -> Result<Severity, Self::Err> {
        Ok(Severity::from_string(input))
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Severity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Numbers, nulls and unknown names all land on Unset.
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(match value {
            serde_json::Value::String(s) => Severity::from_string(&s),
            _ => Severity::Unset,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_levels_round_trip_through_strings() {
        for level in Severity::ALL {
            assert_eq!(Severity::from_string(&level.to_string()), level);
        }
    }

    #[test]
    fn parsing_ignores_case() {
        assert_eq!(Severity::from_string("WARN"), Severity::Warn);
        assert_eq!(Severity::from_string("Fatal"), Severity::Fatal);
        assert_eq!("eRRoR".parse::<Severity>().unwrap(), Severity::Error);
    }

    #[test]
    fn unknown_strings_are_unset() {
        assert_eq!(Severity::from_string("critical"), Severity::Unset);
        assert_eq!(Severity::from_string(""), Severity::Unset);
        assert_eq!(Severity::from_string(" warn "), Severity::Unset);
        assert_eq!(Severity::Unset.to_string(), "");
    }

    #[test]
    fn ordering_is_total() {
        assert!(Severity::Unset < Severity::Debug);
        assert!(Severity::Debug < Severity::Info);
        assert!(Severity::Info < Severity::Warn);
        assert!(Severity::Warn < Severity::Error);
        assert!(Severity::Error < Severity::Fatal);
    }

    #[test]
    fn predicates() {
        assert!(!Severity::Warn.is_error());
        assert!(Severity::Error.is_error());
        assert!(Severity::Fatal.is_error());
        assert!(!Severity::Error.is_fatal());
        assert!(Severity::Fatal.is_fatal());

        assert!(!Severity::Unset.not_debug());
        assert!(!Severity::Debug.not_debug());
        assert!(Severity::Info.not_debug());
    }

    #[test]
    fn serde_uses_lowercase_names() {
        assert_eq!(serde_json::to_string(&Severity::Warn).unwrap(), "\"warn\"");

        let parsed: Severity = serde_json::from_str("\"ERROR\"").unwrap();
        assert_eq!(parsed, Severity::Error);

        let unknown: Severity = serde_json::from_str("\"loud\"").unwrap();
        assert_eq!(unknown, Severity::Unset);

        let numeric: Severity = serde_json::from_str("4").unwrap();
        assert_eq!(numeric, Severity::Unset);
    }

    #[test]
    fn tracing_levels() {
        assert_eq!(Severity::Unset.to_tracing_level(), None);
        assert_eq!(Severity::Fatal.to_tracing_level(), Some(tracing::Level::ERROR));
        assert_eq!(Severity::Debug.to_tracing_level(), Some(tracing::Level::DEBUG));
    }
}
