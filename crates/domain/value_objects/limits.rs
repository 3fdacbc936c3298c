use std::fmt::Display;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

const UNLIMITED: &str = "unlimited";

/// A quota ceiling. `Unbounded` is never compared or subtracted as a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
    Finite(u64),
    Unbounded,
}

impl Limit {
    pub const ZERO: Limit = Limit::Finite(0);

    /// Parses a plan feature value: `"Unlimited"` in any casing, or a non-negative integer.
    pub fn parse_feature(value: &str) -> Option<Limit> {
        let value = value.trim();
        if value.eq_ignore_ascii_case(UNLIMITED) {
            return Some(Limit::Unbounded);
        }
        value.parse::<u64>().ok().map(Limit::Finite)
    }

    pub fn is_zero(&self) -> bool {
        matches!(self, Limit::Finite(0))
    }

    pub fn is_unbounded(&self) -> bool {
        matches!(self, Limit::Unbounded)
    }

    /// What is left after `used`, saturating at zero.
    pub fn remaining_after(&self, used: u64) -> Limit {
        match self {
            Limit::Finite(allowed) => Limit::Finite(allowed.saturating_sub(used)),
            Limit::Unbounded => Limit::Unbounded,
        }
    }

    /// Whether `amount` more units fit inside this limit.
    pub fn covers(&self, amount: u64) -> bool {
        match self {
            Limit::Finite(available) => amount <= *available,
            Limit::Unbounded => true,
        }
    }
}

impl Display for Limit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Limit::Finite(value) => write!(f, "{}", value),
            Limit::Unbounded => f.write_str(UNLIMITED),
        }
    }
}

impl Serialize for Limit {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Limit::Finite(value) => serializer.serialize_u64(*value),
            Limit::Unbounded => serializer.serialize_str(UNLIMITED),
        }
    }
}

impl<'de> Deserialize<'de> for Limit {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(value) => Ok(Limit::Finite(value)),
            Raw::Text(text) => Limit::parse_feature(&text)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid limit: {text}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_unlimited_in_any_casing() {
        for raw in ["Unlimited", "UNLIMITED", "unlimited", "  uNlImItEd "] {
            assert_eq!(Limit::parse_feature(raw), Some(Limit::Unbounded));
        }
    }

    #[test]
    fn parses_integers_and_rejects_garbage() {
        assert_eq!(Limit::parse_feature("20"), Some(Limit::Finite(20)));
        assert_eq!(Limit::parse_feature(" 0 "), Some(Limit::ZERO));
        assert_eq!(Limit::parse_feature("-3"), None);
        assert_eq!(Limit::parse_feature("twenty"), None);
    }

    #[test]
    fn remaining_saturates_and_unbounded_never_exhausts() {
        assert_eq!(Limit::Finite(20).remaining_after(19), Limit::Finite(1));
        assert_eq!(Limit::Finite(5).remaining_after(9), Limit::ZERO);
        assert_eq!(Limit::Unbounded.remaining_after(u64::MAX), Limit::Unbounded);
        assert!(Limit::Unbounded.covers(u64::MAX));
        assert!(!Limit::Finite(1).covers(2));
    }

    #[test]
    fn serializes_as_number_or_marker() {
        assert_eq!(serde_json::to_value(Limit::Finite(3)).unwrap(), serde_json::json!(3));
        assert_eq!(
            serde_json::to_value(Limit::Unbounded).unwrap(),
            serde_json::json!("unlimited")
        );
        let parsed: Limit = serde_json::from_value(serde_json::json!("Unlimited")).unwrap();
        assert_eq!(parsed, Limit::Unbounded);
    }
}
