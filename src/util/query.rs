use std::str::FromStr;

use serde::{Deserialize, Deserializer};

/// Query string parameters in request order. Keys may repeat
/// (`genres=a&genres=b`) and are matched leniently.
#[derive(Debug, Default)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl<'de> Deserialize<'de> for QueryParams {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let pairs = Vec::<(String, String)>::deserialize(deserializer)?;
        Ok(QueryParams { pairs })
    }
}

impl QueryParams {
    /// Matches `key`, `key[]` and `Key` (first letter uppercased).
    fn key_matches(key: &str, candidate: &str) -> bool {
        if candidate == key {
            return true;
        }
        if candidate.strip_suffix("[]") == Some(key) {
            return true;
        }
        let mut chars = key.chars();
        match chars.next() {
            Some(first) if first.is_ascii_lowercase() => {
                let mut upper = first.to_ascii_uppercase().to_string();
                upper.push_str(chars.as_str());
                candidate == upper
            }
            _ => false,
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| Self::key_matches(key, k))
            .map(|(_, v)| v.as_str())
    }

    pub fn get_parsed<T: FromStr>(&self, key: &str) -> Option<T> {
        self.get(key).and_then(|v| v.trim().parse().ok())
    }

    /// Every value given for `key`; comma separated values are split.
    pub fn get_all(&self, key: &str) -> Vec<String> {
        self.pairs
            .iter()
            .filter(|(k, _)| Self::key_matches(key, k))
            .flat_map(|(_, v)| v.split(','))
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn has(&self, key: &str) -> bool {
        self.pairs.iter().any(|(k, _)| Self::key_matches(key, k))
    }
}
