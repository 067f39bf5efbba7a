// ********* Input data structures ***********

use std::collections::HashMap;
use std::error::Error;
use std::fmt::Display;

/// The candidate keys of the deployment, in display order: eight regular
/// directors followed by two independent directors.
pub const DEFAULT_CANDIDATE_KEYS: [&str; 10] = [
    "vote1",
    "vote2",
    "vote3",
    "vote4",
    "vote5",
    "vote6",
    "vote7",
    "vote8",
    "independent1",
    "independent2",
];

/// Number of resolutions on the ballot of the deployment.
pub const DEFAULT_RESOLUTION_COUNT: u32 = 13;

/// A valid choice on a resolution.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum Selection {
    For,
    Against,
    Abstain,
}

impl Selection {
    /// Classifies the raw content of a `selectionN` field.
    ///
    /// The match is exact and case-sensitive: `"for"` or `" For"` are not
    /// valid selections.
    pub fn from_field(s: &str) -> Option<Selection> {
        match s {
            "For" => Some(Selection::For),
            "Against" => Some(Selection::Against),
            "Abstain" => Some(Selection::Abstain),
            _ => None,
        }
    }
}

/// The ballot of one voter, as read from the record source.
///
/// All the fields are optional except for the identifier: the reader is
/// expected to have dropped any value it could not understand.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct VoterRecord {
    pub id: String,
    pub has_ratified: bool,
    pub has_voted: bool,
    pub shares: Option<i64>,
    /// Kept as text, this is how the ballot application stores it.
    pub max_votes: Option<String>,
    /// Votes per candidate key.
    pub candidate_votes: HashMap<String, i64>,
    /// Raw content of the selection fields, keyed by resolution index (starting at 1).
    pub selections: HashMap<u32, String>,
}

impl VoterRecord {
    pub fn new(id: &str) -> VoterRecord {
        VoterRecord {
            id: id.to_string(),
            ..VoterRecord::default()
        }
    }

    pub fn ratified(mut self, has_ratified: bool) -> VoterRecord {
        self.has_ratified = has_ratified;
        self
    }

    pub fn voted(mut self, has_voted: bool) -> VoterRecord {
        self.has_voted = has_voted;
        self
    }

    pub fn shares(mut self, shares: i64) -> VoterRecord {
        self.shares = Some(shares);
        self
    }

    pub fn max_votes(mut self, max_votes: &str) -> VoterRecord {
        self.max_votes = Some(max_votes.to_string());
        self
    }

    pub fn votes(mut self, candidate_key: &str, count: i64) -> VoterRecord {
        self.candidate_votes
            .insert(candidate_key.to_string(), count);
        self
    }

    pub fn selection(mut self, index: u32, raw: &str) -> VoterRecord {
        self.selections.insert(index, raw.to_string());
        self
    }

    /// Only the voters who went through both the ratification and the
    /// balloting steps are counted.
    pub fn is_eligible(&self) -> bool {
        self.has_ratified && self.has_voted
    }

    pub fn votes_for(&self, candidate_key: &str) -> i64 {
        self.candidate_votes
            .get(candidate_key)
            .cloned()
            .unwrap_or(0)
    }

    pub fn selection_at(&self, index: u32) -> Option<Selection> {
        self.selections
            .get(&index)
            .and_then(|s| Selection::from_field(s))
    }
}

// ******** Output data structures *********

/// Statistics for one resolution
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub struct ResolutionTally {
    /// Starts at 1
    pub index: u32,
    pub for_count: u64,
    pub against_count: u64,
    pub abstain_count: u64,
    /// Number of eligible ballots with a valid selection for this resolution.
    pub total: u64,
}

#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct AggregateResult {
    pub eligible_voter_count: u64,
    pub total_shares: i64,
    pub total_max_votes: i64,
    /// In the order of the candidate keys that were requested.
    pub candidate_totals: Vec<(String, i64)>,
    pub resolution_totals: Vec<ResolutionTally>,
}

impl AggregateResult {
    pub fn candidate_total(&self, candidate_key: &str) -> Option<i64> {
        self.candidate_totals
            .iter()
            .find(|(k, _)| k == candidate_key)
            .map(|(_, v)| *v)
    }

    pub fn resolution(&self, index: u32) -> Option<&ResolutionTally> {
        self.resolution_totals.iter().find(|r| r.index == index)
    }
}

/// Errors when the parameters of an aggregation are not consistent.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum AggregationErrors {
    EmptyCandidateKey,
    DuplicateCandidateKey(String),
    NoResolutions,
}

impl Error for AggregationErrors {}

impl Display for AggregationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AggregationErrors::EmptyCandidateKey => write!(f, "empty candidate key"),
            AggregationErrors::DuplicateCandidateKey(k) => {
                write!(f, "candidate key {} is listed more than once", k)
            }
            AggregationErrors::NoResolutions => write!(f, "at least one resolution is required"),
        }
    }
}
