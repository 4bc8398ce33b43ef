//! Training record container with holdout partitions.
//!
//! A [`Dataset`] owns the ordered record list and up to two half-open index
//! ranges into it: the active test partition and the active validation
//! partition. Rows inside either range are held out from counting.

use std::ops::Range;

use rand::seq::SliceRandom;
use rand::Rng;

use super::record::FlightRecord;

/// Errors raised by [`Dataset`] accessors and partition setters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DatasetError {
    /// An accessor was used before [`Dataset::set_data`].
    #[error("dataset has no data loaded")]
    NotLoaded,

    /// Partition start is not strictly before its end.
    #[error("{which} partition start={start} must be less than end={end}")]
    InvertedRange {
        which: &'static str,
        start: usize,
        end: usize,
    },

    /// Partition bound lies outside the dataset.
    #[error("{which} partition bound {index} is out of bounds for dataset of length {len}")]
    OutOfBounds {
        which: &'static str,
        index: usize,
        len: usize,
    },
}

/// Ordered training records plus the active holdout partitions.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Option<Vec<FlightRecord>>,
    test: Option<Range<usize>>,
    validation: Option<Range<usize>>,
}

impl Dataset {
    /// Create an empty dataset with no data loaded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store records, taking ownership without copying.
    ///
    /// Any active partitions are cleared.
    pub fn set_data(&mut self, records: Vec<FlightRecord>) {
        self.records = Some(records);
        self.test = None;
        self.validation = None;
    }

    /// Whether data has been loaded.
    #[inline]
    pub fn data_loaded(&self) -> bool {
        self.records.is_some()
    }

    /// All records.
    pub fn records(&self) -> Result<&[FlightRecord], DatasetError> {
        self.records.as_deref().ok_or(DatasetError::NotLoaded)
    }

    /// Number of records.
    pub fn len(&self) -> Result<usize, DatasetError> {
        self.records().map(<[FlightRecord]>::len)
    }

    /// Whether the loaded dataset has no records.
    pub fn is_empty(&self) -> Result<bool, DatasetError> {
        self.len().map(|n| n == 0)
    }

    /// Number of rows outside the active test and validation partitions.
    ///
    /// Rows covered by both partitions are only subtracted once.
    pub fn training_len(&self) -> Result<usize, DatasetError> {
        let len = self.len()?;
        let test = self.test.as_ref().map_or(0, Range::len);
        let validation = self.validation.as_ref().map_or(0, Range::len);
        let overlap = match (&self.test, &self.validation) {
            (Some(t), Some(v)) => t.end.min(v.end).saturating_sub(t.start.max(v.start)),
            _ => 0,
        };
        Ok(len - (test + validation - overlap))
    }

    /// Active test partition.
    pub fn test_bounds(&self) -> Option<Range<usize>> {
        self.test.clone()
    }

    /// Active validation partition.
    pub fn validation_bounds(&self) -> Option<Range<usize>> {
        self.validation.clone()
    }

    /// Set the test partition to `[start, end)`.
    pub fn set_test_bounds(&mut self, start: usize, end: usize) -> Result<(), DatasetError> {
        self.test = Some(self.check_bounds("test", start, end)?);
        Ok(())
    }

    /// Set the validation partition to `[start, end)`.
    ///
    /// Overlap with the test partition is allowed; overlapping rows are
    /// excluded once.
    pub fn set_validation_bounds(&mut self, start: usize, end: usize) -> Result<(), DatasetError> {
        self.validation = Some(self.check_bounds("validation", start, end)?);
        Ok(())
    }

    /// Remove the test partition.
    pub fn clear_test_partition(&mut self) {
        self.test = None;
    }

    /// Remove the validation partition.
    pub fn clear_validation_partition(&mut self) {
        self.validation = None;
    }

    /// Remove both partitions.
    pub fn clear_partitions(&mut self) {
        self.test = None;
        self.validation = None;
    }

    /// Whether row `index` is held out by an active partition.
    #[inline]
    pub fn is_held_out(&self, index: usize) -> bool {
        self.test.as_ref().is_some_and(|r| r.contains(&index))
            || self.validation.as_ref().is_some_and(|r| r.contains(&index))
    }

    /// Shuffle records in place. Active partitions are cleared.
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<(), DatasetError> {
        let records = self.records.as_mut().ok_or(DatasetError::NotLoaded)?;
        records.shuffle(rng);
        self.clear_partitions();
        Ok(())
    }

    fn check_bounds(
        &self,
        which: &'static str,
        start: usize,
        end: usize,
    ) -> Result<Range<usize>, DatasetError> {
        let len = self.len()?;
        if start >= end {
            return Err(DatasetError::InvertedRange { which, start, end });
        }
        if start >= len {
            return Err(DatasetError::OutOfBounds {
                which,
                index: start,
                len,
            });
        }
        if end > len {
            return Err(DatasetError::OutOfBounds {
                which,
                index: end,
                len,
            });

        }
        Ok(start..end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixture_records;
    use rstest::rstest;

    fn loaded() -> Dataset {
        let mut ds = Dataset::new();
        ds.set_data(fixture_records());
        ds
    }

    #[test]
    fn accessors_fail_before_load() {
        let mut ds = Dataset::new();
        assert!(!ds.data_loaded());
        assert_eq!(ds.len(), Err(DatasetError::NotLoaded));
        assert_eq!(ds.training_len(), Err(DatasetError::NotLoaded));
        assert!(ds.records().is_err());
        assert_eq!(ds.set_test_bounds(0, 1), Err(DatasetError::NotLoaded));
    }

    #[test]
    fn training_len_without_partitions() {
        let ds = loaded();
        assert_eq!(ds.training_len().unwrap(), 5);
    }

    #[rstest]
    #[case((0, 2), None, 3)]
    #[case((0, 2), Some((2, 4)), 1)]
    #[case((0, 3), Some((2, 5)), 0)]
    #[case((1, 4), Some((2, 3)), 2)]
    #[case((2, 3), Some((0, 5)), 0)]
    #[case((3, 5), Some((0, 4)), 0)]
    fn training_len_corrects_overlap(
        #[case] test: (usize, usize),
        #[case] validation: Option<(usize, usize)>,
        #[case] expected: usize,
    ) {
        let mut ds = loaded();
        ds.set_test_bounds(test.0, test.1).unwrap();
        if let Some((s, e)) = validation {
            ds.set_validation_bounds(s, e).unwrap();
        }
        assert_eq!(ds.training_len().unwrap(), expected);
        let counted = (0..5).filter(|&i| !ds.is_held_out(i)).count();
        assert_eq!(counted, expected);
    }

    #[rstest]
    #[case(2, 2)]
    #[case(3, 1)]
    fn inverted_range_rejected(#[case] start: usize, #[case] end: usize) {
        let mut ds = loaded();
        assert!(matches!(
            ds.set_test_bounds(start, end),
            Err(DatasetError::InvertedRange { which: "test", .. })
        ));
        assert!(matches!(
            ds.set_validation_bounds(start, end),
            Err(DatasetError::InvertedRange { which: "validation", .. })
        ));
    }

    #[rstest]
    #[case(5, 6)]
    #[case(0, 6)]
    fn out_of_bounds_rejected(#[case] start: usize, #[case] end: usize) {
        let mut ds = loaded();
        assert!(matches!(
            ds.set_test_bounds(start, end),
            Err(DatasetError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn end_may_reach_dataset_length() {
        let mut ds = loaded();
        ds.set_test_bounds(3, 5).unwrap();
        assert_eq!(ds.test_bounds(), Some(3..5));
    }

    #[test]
    fn clearing_resets_both_bounds() {
        let mut ds = loaded();
        ds.set_test_bounds(0, 1).unwrap();
        ds.set_validation_bounds(1, 2).unwrap();
        ds.clear_test_partition();
        assert_eq!(ds.test_bounds(), None);
        assert_eq!(ds.validation_bounds(), Some(1..2));
        ds.clear_validation_partition();
        assert_eq!(ds.validation_bounds(), None);
        assert_eq!(ds.training_len().unwrap(), 5);
    }
}
