mod config;
pub mod builder;
pub mod manual;
pub mod quick_start;

use log::{debug, info};

pub use crate::config::*;

/// Parses an integer stored as text, the way the ballot application does it.
///
/// Surrounding whitespace is ignored, an optional sign is accepted and only
/// the leading digits are read: `"12abc"` is 12 and `"3.7"` is 3.
/// Anything else (empty text, no leading digit, a value that does not fit in
/// an `i64`) is 0. This function never fails.
///
/// ```
/// use share_tally::parse_integer;
///
/// assert_eq!(parse_integer("150"), 150);
/// assert_eq!(parse_integer("abc"), 0);
/// ```
pub fn parse_integer(s: &str) -> i64 {
    let t = s.trim();
    let (negative, rest) = match t.strip_prefix('-') {
        Some(r) => (true, r),
        None => (false, t.strip_prefix('+').unwrap_or(t)),
    };
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    match digits.parse::<i64>() {
        Ok(x) if negative => -x,
        Ok(x) => x,
        Err(_) => 0,
    }
}

/// Computes all the tallies for one run.
///
/// Arguments:
/// * `records` the ballots, in any order. Records that are not eligible are ignored.
/// * `candidate_keys` the candidates to tally. They control the order of
///   `candidate_totals` in the output.
/// * `resolution_count` the number of resolutions, the selections are read from index 1
///   to `resolution_count` included.
///
/// Malformed values have already been dropped by the readers and count as zero
/// here, so this function cannot fail.
pub fn aggregate(
    records: &[VoterRecord],
    candidate_keys: &[String],
    resolution_count: u32,
) -> AggregateResult {
    info!(
        "aggregate: Processing {:?} records, {:?} candidates, {:?} resolutions",
        records.len(),
        candidate_keys.len(),
        resolution_count
    );

    let eligible: Vec<&VoterRecord> = records.iter().filter(|r| r.is_eligible()).collect();
    info!("aggregate: eligible voters: {:?}", eligible.len());

    let mut total_shares: i64 = 0;
    let mut total_max_votes: i64 = 0;
    for r in eligible.iter() {
        total_shares = total_shares.saturating_add(r.shares.unwrap_or(0));
        let mv = r.max_votes.as_deref().map(parse_integer).unwrap_or(0);
        total_max_votes = total_max_votes.saturating_add(mv);
    }

    let candidate_totals: Vec<(String, i64)> = candidate_keys
        .iter()
        .map(|k| {
            let total = eligible
                .iter()
                .fold(0i64, |acc, r| acc.saturating_add(r.votes_for(k)));
            (k.clone(), total)
        })
        .collect();
    debug!("aggregate: candidate_totals: {:?}", candidate_totals);

    let resolution_totals: Vec<ResolutionTally> = (1..=resolution_count)
        .map(|index| tally_resolution(&eligible, index))
        .collect();
    debug!("aggregate: resolution_totals: {:?}", resolution_totals);

    AggregateResult {
        eligible_voter_count: eligible.len() as u64,
        total_shares,
        total_max_votes,
        candidate_totals,
        resolution_totals,
    }
}

fn tally_resolution(eligible: &[&VoterRecord], index: u32) -> ResolutionTally {
    let mut res = ResolutionTally {
        index,
        ..ResolutionTally::default()
    };
    for r in eligible.iter() {
        match r.selection_at(index) {
            Some(Selection::For) => res.for_count += 1,
            Some(Selection::Against) => res.against_count += 1,
            Some(Selection::Abstain) => res.abstain_count += 1,
            None => {}
        }
    }
    res.total = res.for_count + res.against_count + res.abstain_count;
    res
}
