// Local exports of the ballot collection.

use crate::dashboard::{io_common::*, *};

pub fn read_json_records(
    path: &str,
    candidate_keys: &[String],
    resolution_count: u32,
) -> BDashResult<Vec<VoterRecord>> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    records_from_json_str(&contents, path, candidate_keys, resolution_count)
}

pub fn records_from_json_str(
    contents: &str,
    path: &str,
    candidate_keys: &[String],
    resolution_count: u32,
) -> BDashResult<Vec<VoterRecord>> {
    let js: JSValue = serde_json::from_str(contents).context(ParsingJsonSnafu {})?;
    let default_id = make_default_id(path);
    let mut res: Vec<VoterRecord> = Vec::new();
    match js {
        // A list of documents, each carrying its id.
        JSValue::Array(docs) => {
            for (idx, doc) in docs.iter().enumerate() {
                let fields = match doc.as_object() {
                    Some(x) => x,
                    None => {
                        warn!("read_json_records: skipping entry {}: {:?}", idx, doc);
                        continue;
                    }
                };
                let id = ["id", "email"]
                    .iter()
                    .find_map(|k| fields.get(*k).and_then(|v| v.as_str()))
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| default_id(idx + 1));
                res.push(record_from_fields(
                    id,
                    fields,
                    candidate_keys,
                    resolution_count,
                ));
            }
        }
        // Document id -> fields
        JSValue::Object(docs) => {
            for (id, doc) in docs.iter() {
                match doc.as_object() {
                    Some(fields) => res.push(record_from_fields(
                        id.clone(),
                        fields,
                        candidate_keys,
                        resolution_count,
                    )),
                    None => {
                        warn!("read_json_records: skipping document {:?}: {:?}", id, doc);
                    }
                }
            }
        }
        _ => {
            return Err(Box::new(DashboardError::JsonRecordShape {
                path: path.to_string(),
            }));
        }
    }
    debug!("read_json_records: {:?} records in {:?}", res.len(), path);
    Ok(res)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> Vec<String> {
        vec!["vote1".to_string()]
    }

    #[test]
    fn list_of_documents() {
        let js = r#"[
            { "email": "a@example.com", "hasRatified": true, "hasVoted": true, "vote1": 4 },
            { "id": "b", "email": "b@example.com", "hasRatified": true },
            { "hasVoted": true },
            "not a document"
        ]"#;
        let res = records_from_json_str(js, "export/ballots.json", &keys(), 13).unwrap();
        assert_eq!(res.len(), 3);
        assert_eq!(res[0].id, "a@example.com");
        assert_eq!(res[0].votes_for("vote1"), 4);
        assert_eq!(res[1].id, "b");
        assert_eq!(res[2].id, "ballots.json-00000003");
    }

    #[test]
    fn documents_keyed_by_id() {
        let js = r#"{
            "a@example.com": { "hasRatified": true, "hasVoted": true, "selection3": "Against" },
            "b@example.com": 12
        }"#;
        let res = records_from_json_str(js, "ballots.json", &keys(), 13).unwrap();
        assert_eq!(res.len(), 1);
        assert_eq!(res[0].id, "a@example.com");
        assert_eq!(res[0].selection_at(3), Some(share_tally::Selection::Against));
    }

    #[test]
    fn rejects_other_shapes() {
        let err = records_from_json_str("42", "ballots.json", &keys(), 13).unwrap_err();
        assert!(matches!(*err, DashboardError::JsonRecordShape { .. }));
        let err = records_from_json_str("{", "ballots.json", &keys(), 13).unwrap_err();
        assert!(matches!(*err, DashboardError::ParsingJson { .. }));
    }

    #[test]
    fn missing_file() {
        let err = read_json_records("/nonexistent/ballots.json", &keys(), 13).unwrap_err();
        assert!(matches!(*err, DashboardError::OpeningJson { .. }));
    }
}
