use serde::{Deserialize, Serialize};

/// Sentinel class label used when no class was supplied at enrollment.
pub const CLASS_UNSET: &str = "N/A";

/// Bounding box for a detected face, in frame pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Face signature vector — a fixed-length numeric embedding produced by
/// the (external) detection and encoding routine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signature {
    pub values: Vec<f32>,
}

impl Signature {
    pub fn new(values: Vec<f32>) -> Self {
        Self { values }
    }

    /// Compute Euclidean distance to another signature.
    ///
    /// Lower = more similar. Mismatched lengths are compared over the
    /// shorter prefix; enrolled and probe signatures come from the same
    /// encoder, so lengths agree in practice.
    pub fn euclidean_distance(&self, other: &Signature) -> f32 {
        self.values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f32>()
            .sqrt()
    }
}

/// Identity metadata carried alongside each signature during matching
/// and written into attendance rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityMeta {
    pub name: String,
    pub enrollment_id: String,
    pub class_label: String,
}

/// One enrolled person: metadata plus every signature sample captured
/// for them. Persisted as one file per identity in the gallery store;
/// never mutated after enrollment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityRecord {
    pub name: String,
    pub enrollment_id: String,
    pub class_label: String,
    pub signatures: Vec<Signature>,
}

impl IdentityRecord {
    /// Build a record; a missing class label falls back to [`CLASS_UNSET`].
    pub fn new(
        name: impl Into<String>,
        enrollment_id: impl Into<String>,
        class_label: Option<String>,
        signatures: Vec<Signature>,
    ) -> Self {
        Self {
            name: name.into(),
            enrollment_id: enrollment_id.into(),
            class_label: class_label.unwrap_or_else(|| CLASS_UNSET.to_string()),
            signatures,
        }
    }

    pub fn meta(&self) -> IdentityMeta {
        IdentityMeta {
            name: self.name.clone(),
            enrollment_id: self.enrollment_id.clone(),
            class_label: self.class_label.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_euclidean_distance_identical() {
        let a = Signature::new(vec![1.0, 2.0, 3.0]);
        let b = Signature::new(vec![1.0, 2.0, 3.0]);
        assert_eq!(a.euclidean_distance(&b), 0.0);
    }

    #[test]
    fn test_euclidean_distance_unit_apart() {
        let a = Signature::new(vec![0.0, 0.0]);
        let b = Signature::new(vec![3.0, 4.0]);
        assert!((a.euclidean_distance(&b) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_euclidean_distance_symmetric() {
        let a = Signature::new(vec![0.25, -1.5, 2.0]);
        let b = Signature::new(vec![1.0, 0.5, -0.75]);
        assert_eq!(a.euclidean_distance(&b), b.euclidean_distance(&a));
    }

    #[test]
    fn test_record_default_class_label() {
        let rec = IdentityRecord::new("Alice", "E1", None, vec![Signature::new(vec![0.0])]);
        assert_eq!(rec.class_label, CLASS_UNSET);
        let rec = IdentityRecord::new(
            "Bob",
            "E2",
            Some("CS-2".to_string()),
            vec![Signature::new(vec![0.0])],
        );
        assert_eq!(rec.class_label, "CS-2");
    }
}
