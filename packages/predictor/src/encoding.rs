//! One-hot encoding of the categorical columns.
//!
//! The vocabulary is taken from the table being trained on. Feature order
//! is every `location_*` column followed by every `incident_type_*` column,
//! each group sorted by label.

use campus_safety_incident_models::IncidentTable;
use ndarray::Array2;

/// Row-major matrix of encoded features.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    n_features: usize,
    data: Vec<f64>,
}

impl FeatureMatrix {
    /// Creates an empty matrix with `n_features` columns.
    #[must_use]
    pub const fn new(n_features: usize) -> Self {
        Self {
            n_features,
            data: Vec::new(),
        }
    }

    /// Appends one row. `row` must have `n_features` entries.
    pub fn push_row(&mut self, row: &[f64]) {
        debug_assert_eq!(row.len(), self.n_features);
        self.data.extend_from_slice(row);
    }

    /// Number of columns.
    #[must_use]
    pub const fn n_features(&self) -> usize {
        self.n_features
    }

    /// Number of rows.
    #[must_use]
    pub fn n_rows(&self) -> usize {
        if self.n_features == 0 {
            0
        } else {
            self.data.len() / self.n_features
        }
    }

    /// The `i`-th row.
    #[must_use]
    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.n_features..(i + 1) * self.n_features]
    }

    /// A single cell.
    #[must_use]
    pub fn get(&self, i: usize, feature: usize) -> f64 {
        self.data[i * self.n_features + feature]
    }

    /// A new matrix holding the given rows, in the given order.
    #[must_use]
    pub fn select(&self, rows: &[usize]) -> Self {
        let mut out = Self::new(self.n_features);
        out.data.reserve(rows.len() * self.n_features);
        for &i in rows {
            out.push_row(self.row(i));
        }
        out
    }

    /// Copies the matrix into an `ndarray` for fitting and prediction.
    #[must_use]
    pub fn to_array(&self) -> Array2<f64> {
        Array2::from_shape_fn((self.n_rows(), self.n_features), |(i, j)| self.get(i, j))
    }
}

/// Dummy-variable encoder for `location` and `incident_type`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureEncoder {
    locations: Vec<String>,
    incident_types: Vec<String>,
}

impl FeatureEncoder {
    /// Derives the vocabulary from `table`.
    #[must_use]
    pub fn fit(table: &IncidentTable) -> Self {
        Self {
            locations: table.locations().into_iter().map(str::to_string).collect(),
            incident_types: table
                .incident_types()
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    }

    /// Total number of encoded features.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.locations.len() + self.incident_types.len()
    }

    /// Encoded feature names, in column order.
    #[must_use]
    pub fn feature_names(&self) -> Vec<String> {
        self.locations
            .iter()
            .map(|l| format!("location_{l}"))
            .chain(self.incident_types.iter().map(|t| format!("incident_type_{t}")))
            .collect()
    }

    /// Encodes one record. Labels outside the vocabulary leave their group
    /// all zero.
    #[must_use]
    pub fn encode(&self, location: &str, incident_type: &str) -> Vec<f64> {
        let mut row = vec![0.0; self.n_features()];
        if let Ok(i) = self
            .locations
            .binary_search_by(|l| l.as_str().cmp(location))
        {
            row[i] = 1.0;
        }
        if let Ok(i) = self
            .incident_types
            .binary_search_by(|t| t.as_str().cmp(incident_type))
        {
            row[self.locations.len() + i] = 1.0;
        }
        row
    }

    /// Encodes every record of `table`, in table order.
    #[must_use]
    pub fn encode_table(&self, table: &IncidentTable) -> FeatureMatrix {
        let mut matrix = FeatureMatrix::new(self.n_features());
        for record in table {
            matrix.push_row(&self.encode(&record.location, &record.incident_type));
        }
        matrix
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::table;

    #[test]
    fn feature_names_follow_dummy_convention() {
        let t = table(&[
            ("Library", "theft", 2),
            ("Cafeteria", "vandalism", 3),
            ("Library", "fighting", 4),
        ]);
        let encoder = FeatureEncoder::fit(&t);
        assert_eq!(
            encoder.feature_names(),
            vec![
                "location_Cafeteria",
                "location_Library",
                "incident_type_fighting",
                "incident_type_theft",
                "incident_type_vandalism",
            ]
        );
    }

    #[test]
    fn each_row_has_one_hot_per_group() {
        let t = table(&[("Library", "theft", 2), ("Cafeteria", "vandalism", 3)]);
        let encoder = FeatureEncoder::fit(&t);
        let x = encoder.encode_table(&t);

        assert_eq!(x.n_rows(), 2);
        assert_eq!(x.row(0), [0.0, 1.0, 1.0, 0.0]);
        assert_eq!(x.row(1), [1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn unknown_labels_encode_as_zeros() {
        let t = table(&[("Library", "theft", 2)]);
        let encoder = FeatureEncoder::fit(&t);
        assert_eq!(encoder.encode("Rooftop", "arson"), vec![0.0, 0.0]);
    }

    #[test]
    fn select_reorders_rows() {
        let mut x = FeatureMatrix::new(2);
        x.push_row(&[1.0, 0.0]);
        x.push_row(&[0.0, 1.0]);
        let picked = x.select(&[1, 1, 0]);
        assert_eq!(picked.n_rows(), 3);
        assert_eq!(picked.row(0), [0.0, 1.0]);
        assert!((picked.get(2, 0) - 1.0).abs() < f64::EPSILON);

        let array = picked.to_array();
        assert_eq!(array.dim(), (3, 2));
        assert!((array[[0, 1]] - 1.0).abs() < f64::EPSILON);
        assert!(array[[2, 1]].abs() < f64::EPSILON);
    }
}
