//! Target series keyed by entity id.

use std::collections::HashMap;
use std::fmt;

use crate::error::SamplingError;

/// Identifier of one challenge (or any other predicted entity).
///
/// Always non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(String);

impl EntityId {
    /// Create an id, rejecting the empty string.
    ///
    /// # Errors
    ///
    /// Returns [`SamplingError::EmptyEntityId`] (with index 0) if `id` is empty.
    pub fn new(id: impl Into<String>) -> Result<Self, SamplingError> {
        let id = id.into();
        if id.is_empty() {
            return Err(SamplingError::EmptyEntityId { index: 0 });
        }
        Ok(Self(id))
    }

    /// Return the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ordered `(entity id, continuous value)` pairs with unique ids and finite values.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetSeries {
    ids: Vec<EntityId>,
    values: Vec<f64>,
}

impl TargetSeries {
    /// Build a validated series from parallel ids and values.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`SamplingError::LengthMismatch`] | `ids.len() != values.len()` |
    /// | [`SamplingError::EmptyDataset`] | zero entries |
    /// | [`SamplingError::DuplicateEntityId`] | an id appears twice |
    /// | [`SamplingError::NonFiniteTarget`] | a value is NaN or infinite |
    pub fn new(ids: Vec<EntityId>, values: Vec<f64>) -> Result<Self, SamplingError> {
        if ids.len() != values.len() {
            return Err(SamplingError::LengthMismatch {
                n_ids: ids.len(),
                n_values: values.len(),
            });
        }
        if ids.is_empty() {
            return Err(SamplingError::EmptyDataset);
        }
        {
            let mut seen: HashMap<&str, usize> = HashMap::with_capacity(ids.len());
            for (i, id) in ids.iter().enumerate() {
                if let Some(&first) = seen.get(id.as_str()) {
                    return Err(SamplingError::DuplicateEntityId {
                        id: id.as_str().to_string(),
                        first,
                        second: i,
                    });
                }
                seen.insert(id.as_str(), i);
            }
        }
        if let Some(index) = values.iter().position(|v| !v.is_finite()) {
            return Err(SamplingError::NonFiniteTarget { index });
        }
        Ok(Self { ids, values })
    }

    /// Return the entity ids.
    #[must_use]
    pub fn ids(&self) -> &[EntityId] {
        &self.ids
    }

    /// Return the target values, parallel to [`ids`](Self::ids).
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Return the number of entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Always `false` for a validated series.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(names: &[&str]) -> Vec<EntityId> {
        names.iter().map(|n| EntityId::new(*n).unwrap()).collect()
    }

    #[test]
    fn valid_series() {
        let s = TargetSeries::new(ids(&["a", "b"]), vec![1.0, 2.0]).unwrap();
        assert_eq!(s.len(), 2);
        assert_eq!(s.ids()[1].as_str(), "b");
        assert_eq!(s.values(), &[1.0, 2.0]);
    }

    #[test]
    fn empty_id_rejected() {
        assert!(matches!(EntityId::new(""), Err(SamplingError::EmptyEntityId { .. })));
    }

    #[test]
    fn duplicate_id_rejected() {
        let err = TargetSeries::new(ids(&["a", "b", "a"]), vec![1.0, 2.0, 3.0]).unwrap_err();
        assert_eq!(
            err,
            SamplingError::DuplicateEntityId {
                id: "a".to_string(),
                first: 0,
                second: 2
            }
        );
    }

    #[test]
    fn non_finite_rejected() {
        let err = TargetSeries::new(ids(&["a", "b"]), vec![1.0, f64::NAN]).unwrap_err();
        assert_eq!(err, SamplingError::NonFiniteTarget { index: 1 });
    }

    #[test]
    fn length_mismatch_rejected() {
        let err = TargetSeries::new(ids(&["a"]), vec![1.0, 2.0]).unwrap_err();
        assert!(matches!(err, SamplingError::LengthMismatch { n_ids: 1, n_values: 2 }));
    }

    #[test]
    fn empty_rejected() {
        assert_eq!(TargetSeries::new(vec![], vec![]).unwrap_err(), SamplingError::EmptyDataset);
    }
}
