pub use crate::config::*;

use std::collections::HashSet;

/// A builder for collecting ballots before running the tallies.
///
/// The parameters are checked when they are given, the aggregation itself
/// cannot fail afterwards.
///
/// ```
/// use share_tally::builder::Builder;
/// use share_tally::VoterRecord;
/// # use share_tally::AggregationErrors;
///
/// let mut builder = Builder::new(2)?
///     .candidates(&["vote1".to_string(), "vote2".to_string()])?;
///
/// builder.add_record(
///     VoterRecord::new("anna@example.com")
///         .ratified(true)
///         .voted(true)
///         .votes("vote1", 10)
///         .selection(1, "For"),
/// );
///
/// let result = builder.aggregate();
/// assert_eq!(result.candidate_total("vote1"), Some(10));
/// assert_eq!(result.resolution(1).map(|r| r.total), Some(1));
///
/// # Ok::<(), AggregationErrors>(())
/// ```
pub struct Builder {
    pub(crate) _resolution_count: u32,
    pub(crate) _candidate_keys: Vec<String>,
    pub(crate) _records: Vec<VoterRecord>,
}

impl Builder {
    pub fn new(resolution_count: u32) -> Result<Builder, AggregationErrors> {
        if resolution_count == 0 {
            return Err(AggregationErrors::NoResolutions);
        }
        Ok(Builder {
            _resolution_count: resolution_count,
            _candidate_keys: DEFAULT_CANDIDATE_KEYS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            _records: Vec::new(),
        })
    }

    /// Replaces the default candidate keys.
    pub fn candidates(self, keys: &[String]) -> Result<Builder, AggregationErrors> {
        let mut seen: HashSet<&str> = HashSet::new();
        for k in keys.iter() {
            if k.is_empty() {
                return Err(AggregationErrors::EmptyCandidateKey);
            }
            if !seen.insert(k.as_str()) {
                return Err(AggregationErrors::DuplicateCandidateKey(k.clone()));
            }
        }
        Ok(Builder {
            _resolution_count: self._resolution_count,
            _candidate_keys: keys.to_vec(),
            _records: self._records,
        })
    }

    pub fn add_record(&mut self, record: VoterRecord) {
        self._records.push(record);
    }

    pub fn add_records(&mut self, records: &[VoterRecord]) {
        self._records.extend_from_slice(records);
    }

    pub fn num_records(&self) -> usize {
        self._records.len()
    }

    pub fn aggregate(&self) -> AggregateResult {
        crate::aggregate(
            &self._records,
            &self._candidate_keys,
            self._resolution_count,
        )
    }
}
