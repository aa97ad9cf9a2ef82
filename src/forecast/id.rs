use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use super::ForecastError;

/// Logical identifier of a yearly forecast: `"{project_id}_{year}"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ForecastId {
    pub project_id: i64,
    pub year: i32,
}

impl ForecastId {
    pub fn new(project_id: i64, year: i32) -> Self {
        Self { project_id, year }
    }

    pub fn encode(&self) -> String {
        self.to_string()
    }

    /// Parse a token of exactly two `_`-separated integers.
    pub fn decode(token: &str) -> Result<Self, ForecastError> {
        let invalid = || ForecastError::Format(token.to_string());

        let parts: Vec<&str> = token.split('_').collect();
        let [project, year] = parts.as_slice() else {
            return Err(invalid());
        };

        let project_id = project.parse::<i64>().map_err(|_| invalid())?;
        let year = year.parse::<i32>().map_err(|_| invalid())?;
        Ok(Self { project_id, year })
    }
}

impl fmt::Display for ForecastId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.project_id, self.year)
    }
}

impl FromStr for ForecastId {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

impl Serialize for ForecastId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ForecastId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let token = String::deserialize(deserializer)?;
        Self::decode(&token).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_encode_joins_with_underscore() {
        assert_eq!(ForecastId::new(1, 2026).encode(), "1_2026");
        assert_eq!(ForecastId::new(42, 1999).to_string(), "42_1999");
    }

    #[test]
    fn test_decode_round_trips() {
        for (project_id, year) in [(0, 2000), (1, 2026), (99999, 2026), (i64::MAX, 9999)] {
            let id = ForecastId::new(project_id, year);
            assert_eq!(ForecastId::decode(&id.encode()), Ok(id));
        }
    }

    #[test]
    fn test_decode_rejects_malformed_tokens() {
        for token in ["abc", "1_2_3", "1_abc", "abc_2026", "", "_", "1_", "_2026", "1-2026"] {
            assert_eq!(
                ForecastId::decode(token),
                Err(ForecastError::Format(token.to_string())),
                "token {token:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_serde_uses_token_string() {
        let id = ForecastId::new(7, 2026);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"7_2026\"");

        let parsed: ForecastId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);

        assert!(serde_json::from_str::<ForecastId>("\"7\"").is_err());
    }

    proptest! {
        #[test]
        fn decode_inverts_encode_for_calendar_years(project_id in any::<u32>(), year in 1000..=9999i32) {
            let id = ForecastId::new(i64::from(project_id), year);
            prop_assert_eq!(ForecastId::decode(&id.encode()), Ok(id));
        }

        #[test]
        fn decode_inverts_encode_for_any_integers(project_id in any::<i64>(), year in any::<i32>()) {
            let id = ForecastId::new(project_id, year);
            let token = id.encode();
            prop_assert_eq!(token.parse::<ForecastId>(), Ok(id));
        }
    }
}
