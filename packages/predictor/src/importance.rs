use serde::Serialize;

/// An encoded feature and its share of the model's importance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedFeature {
    /// Encoded column name, e.g. `incident_type_theft`.
    pub feature: String,
    /// Normalised importance; all features together sum to 1.
    pub importance: f64,
}

/// Top `k` features by importance, descending. Equal scores keep their
/// encoding order.
#[must_use]
pub fn rank_features(names: &[String], importances: &[f64], k: usize) -> Vec<RankedFeature> {
    let mut ranked: Vec<RankedFeature> = names
        .iter()
        .zip(importances)
        .map(|(name, &importance)| RankedFeature {
            feature: name.clone(),
            importance,
        })
        .collect();
    ranked.sort_by(|a, b| b.importance.total_cmp(&a.importance));
    ranked.truncate(k);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn sorted_descending_and_truncated() {
        let ranked = rank_features(&names(&["a", "b", "c"]), &[0.2, 0.5, 0.3], 2);
        let order: Vec<&str> = ranked.iter().map(|r| r.feature.as_str()).collect();
        assert_eq!(order, ["b", "c"]);
    }

    #[test]
    fn ties_keep_encoding_order() {
        let ranked = rank_features(&names(&["x", "y", "z", "w"]), &[0.25, 0.25, 0.25, 0.25], 10);
        let order: Vec<&str> = ranked.iter().map(|r| r.feature.as_str()).collect();
        assert_eq!(order, ["x", "y", "z", "w"]);
    }

    #[test]
    fn zero_k_is_empty() {
        assert!(rank_features(&names(&["a"]), &[1.0], 0).is_empty());
    }
}
