//! Categorical vocabulary policy for `location` and `incident_type`.
//!
//! An open vocabulary accepts any non-empty label. A closed vocabulary
//! rejects rows whose labels are not listed, failing the whole load.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Which labels the loader accepts for the categorical columns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum VocabularyPolicy {
    /// Any non-empty label is accepted.
    #[default]
    Open,
    /// Only the listed labels are accepted.
    Closed {
        /// Permitted `location` labels.
        #[serde(default)]
        locations: BTreeSet<String>,
        /// Permitted `incident_type` labels.
        #[serde(default)]
        incident_types: BTreeSet<String>,
    },
}

impl VocabularyPolicy {
    /// Whether `location` is acceptable under this policy.
    #[must_use]
    pub fn allows_location(&self, location: &str) -> bool {
        match self {
            Self::Open => true,
            Self::Closed { locations, .. } => locations.contains(location),
        }
    }

    /// Whether `incident_type` is acceptable under this policy.
    #[must_use]
    pub fn allows_incident_type(&self, incident_type: &str) -> bool {
        match self {
            Self::Open => true,
            Self::Closed { incident_types, .. } => incident_types.contains(incident_type),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_accepts_anything() {
        let policy = VocabularyPolicy::Open;
        assert!(policy.allows_location("Rooftop"));
        assert!(policy.allows_incident_type("arson"));
    }

    #[test]
    fn closed_rejects_unlisted_labels() {
        let policy = VocabularyPolicy::Closed {
            locations: ["Library".to_string()].into_iter().collect(),
            incident_types: ["theft".to_string()].into_iter().collect(),
        };
        assert!(policy.allows_location("Library"));
        assert!(!policy.allows_location("library"));
        assert!(policy.allows_incident_type("theft"));
        assert!(!policy.allows_incident_type("fighting"));
    }

    #[test]
    fn deserializes_from_toml_table() {
        let policy: VocabularyPolicy = toml::from_str(
            r#"
            policy = "closed"
            locations = ["Library", "Cafeteria"]
            incident_types = ["theft"]
            "#,
        )
        .unwrap();
        assert!(policy.allows_location("Cafeteria"));
        assert!(!policy.allows_incident_type("vandalism"));

        let open: VocabularyPolicy = toml::from_str(r#"policy = "open""#).unwrap();
        assert_eq!(open, VocabularyPolicy::Open);
    }
}
