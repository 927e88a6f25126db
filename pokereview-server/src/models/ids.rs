//! Category id sets

use std::collections::BTreeSet;

use super::ValidationError;

/// Non-empty, de-duplicated set of category ids for a pokemon.
///
/// Duplicates are folded so the composite key of the join table can't be
/// violated by a repeated id in one request. Values are not range-checked:
/// an id that matches no category is a referential failure, found later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryIds(BTreeSet<i32>);

impl CategoryIds {
    pub fn new(ids: &[i32]) -> Result<Self, ValidationError> {
        if ids.is_empty() {
            return Err(ValidationError::MissingItems {
                field: "categories id",
            });
        }

        Ok(Self(ids.iter().copied().collect()))
    }

    pub fn iter(&self) -> impl Iterator<Item = i32> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_vec(&self) -> Vec<i32> {
        self.iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_list() {
        let err = CategoryIds::new(&[]).unwrap_err();
        assert!(matches!(err, ValidationError::MissingItems { .. }));
    }

    #[test]
    fn folds_duplicates_and_sorts() {
        let ids = CategoryIds::new(&[3, 1, 3, 2]).unwrap();
        assert_eq!(ids.to_vec(), vec![1, 2, 3]);
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn keeps_zero_and_negative_ids_for_lookup() {
        let ids = CategoryIds::new(&[1, 0, -4]).unwrap();
        assert_eq!(ids.to_vec(), vec![-4, 0, 1]);
    }
}
