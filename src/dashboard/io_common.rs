// Coercion of the raw fields of a ballot document, shared by all the readers.

use log::debug;
use std::path::Path;

use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use share_tally::VoterRecord;

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

/// Identifiers for the records that do not carry one.
pub fn make_default_id(path: &str) -> impl Fn(usize) -> String {
    let simplified_file_name = simplify_file_name(path);
    move |lineno| format!("{}-{:08}", simplified_file_name, lineno)
}

/// Builds a record out of the fields of one document.
///
/// Nothing fails here: a field with an unexpected type is dropped and the
/// tallies will treat it as missing.
pub fn record_from_fields(
    id: String,
    fields: &JSMap<String, JSValue>,
    candidate_keys: &[String],
    resolution_count: u32,
) -> VoterRecord {
    let mut record = VoterRecord::new(&id);
    record.has_ratified = read_flag(&id, "hasRatified", fields.get("hasRatified"));
    record.has_voted = read_flag(&id, "hasVoted", fields.get("hasVoted"));
    record.shares = read_number(&id, "shares", fields.get("shares"));
    record.max_votes = read_numeric_text(&id, "maxVotes", fields.get("maxVotes"));
    for k in candidate_keys.iter() {
        if let Some(x) = read_number(&id, k, fields.get(k)) {
            record.candidate_votes.insert(k.clone(), x);
        }
    }
    for index in 1..=resolution_count {
        let field = format!("selection{}", index);
        if let Some(s) = read_text(&id, &field, fields.get(&field)) {
            record.selections.insert(index, s);
        }
    }
    record
}

// Only a real boolean counts, a text "true" stored by mistake does not.
fn read_flag(id: &str, field: &str, v: Option<&JSValue>) -> bool {
    match v {
        Some(JSValue::Bool(b)) => *b,
        None | Some(JSValue::Null) => false,
        Some(x) => {
            debug!("record {:?}: ignoring flag {}: {:?}", id, field, x);
            false
        }
    }
}

fn read_number(id: &str, field: &str, v: Option<&JSValue>) -> Option<i64> {
    match v {
        Some(JSValue::Number(n)) => {
            if let Some(x) = n.as_i64() {
                Some(x)
            } else {
                // Fractional or too large: truncated toward zero.
                n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64)
            }
        }
        None | Some(JSValue::Null) => None,
        Some(x) => {
            debug!("record {:?}: ignoring number {}: {:?}", id, field, x);
            None
        }
    }
}

fn read_numeric_text(id: &str, field: &str, v: Option<&JSValue>) -> Option<String> {
    match v {
        Some(JSValue::String(s)) => Some(s.clone()),
        Some(JSValue::Number(n)) => Some(n.to_string()),
        None | Some(JSValue::Null) => None,
        Some(x) => {
            debug!("record {:?}: ignoring text {}: {:?}", id, field, x);
            None
        }
    }
}

fn read_text(id: &str, field: &str, v: Option<&JSValue>) -> Option<String> {
    match v {
        Some(JSValue::String(s)) => Some(s.clone()),
        None | Some(JSValue::Null) => None,
        Some(x) => {
            debug!("record {:?}: ignoring text {}: {:?}", id, field, x);
            None
        }
    }
}

/// Guesses the type of a cell from a text-only format.
pub fn infer_text_value(s: &str) -> JSValue {
    let t = s.trim();
    if t.eq_ignore_ascii_case("true") {
        return JSValue::Bool(true);
    }
    if t.eq_ignore_ascii_case("false") {
        return JSValue::Bool(false);
    }
    if let Ok(i) = t.parse::<i64>() {
        return JSValue::from(i);
    }
    if let Ok(f) = t.parse::<f64>() {
        if let Some(n) = serde_json::Number::from_f64(f) {
            return JSValue::Number(n);
        }
    }
    JSValue::String(s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn keys() -> Vec<String> {
        vec!["vote1".to_string(), "vote3".to_string()]
    }

    fn fields(v: JSValue) -> JSMap<String, JSValue> {
        v.as_object().unwrap().clone()
    }

    #[test]
    fn well_formed_document() {
        let f = fields(json!({
            "hasRatified": true, "hasVoted": true, "shares": 100, "maxVotes": "10",
            "vote1": 5, "vote3": 2, "selection1": "For", "selection2": "Abstain",
            "timeVoted": "2025-01-26T09:00:00Z"
        }));
        let r = record_from_fields("a".to_string(), &f, &keys(), 13);
        assert!(r.is_eligible());
        assert_eq!(r.shares, Some(100));
        assert_eq!(r.max_votes.as_deref(), Some("10"));
        assert_eq!(r.votes_for("vote1"), 5);
        assert_eq!(r.votes_for("vote3"), 2);
        assert_eq!(r.selections.len(), 2);
    }

    #[test]
    fn malformed_fields_are_dropped() {
        let f = fields(json!({
            "hasRatified": "true", "hasVoted": 1, "shares": "lots", "maxVotes": true,
            "vote1": "5", "vote3": 2.9, "selection1": 1, "selection14": "For"
        }));
        let r = record_from_fields("a".to_string(), &f, &keys(), 13);
        assert!(!r.has_ratified);
        assert!(!r.has_voted);
        assert_eq!(r.shares, None);
        assert_eq!(r.max_votes, None);
        assert_eq!(r.votes_for("vote1"), 0);
        assert_eq!(r.votes_for("vote3"), 2);
        assert!(r.selections.is_empty());
    }

    #[test]
    fn numeric_max_votes_is_kept_as_text() {
        let f = fields(json!({ "maxVotes": 150, "shares": 12.5 }));
        let r = record_from_fields("a".to_string(), &f, &keys(), 13);
        assert_eq!(r.max_votes.as_deref(), Some("150"));
        assert_eq!(r.shares, Some(12));
    }

    #[test]
    fn infers_cell_types() {
        assert_eq!(infer_text_value("TRUE"), json!(true));
        assert_eq!(infer_text_value("false"), json!(false));
        assert_eq!(infer_text_value("42"), json!(42));
        assert_eq!(infer_text_value("2.5"), json!(2.5));
        assert_eq!(infer_text_value("For"), json!("For"));
    }

    #[test]
    fn default_ids() {
        let f = make_default_id("/tmp/exports/ballots.csv");
        assert_eq!(f(3), "ballots.csv-00000003");
    }
}
