// Primitives for reading CSV files.

use serde_json::Map as JSMap;

use crate::dashboard::{
    io_common::{infer_text_value, make_default_id, record_from_fields},
    *,
};

pub fn read_csv_records(
    path: &str,
    source: &RecordSource,
    candidate_keys: &[String],
    resolution_count: u32,
) -> BDashResult<Vec<VoterRecord>> {
    let default_id = make_default_id(path);

    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu {})?;
    let header: Vec<String> = rdr
        .headers()
        .context(CsvLineParseSnafu {})?
        .iter()
        .map(|s| s.trim().to_string())
        .collect();
    debug!("read_csv_records: header: {:?}", header);

    let id_idx_o = id_column_index(&header, source)?;

    let mut res: Vec<VoterRecord> = Vec::new();
    for (idx, line_r) in rdr.records().enumerate() {
        // The header is line 1.
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu {})?;
        debug!("read_csv_records: lineno: {:?} {:?}", lineno, line);

        let mut fields: JSMap<String, JSValue> = JSMap::new();
        for (name, cell) in header.iter().zip(line.iter()) {
            // An empty cell is a missing field.
            if !cell.is_empty() {
                fields.insert(name.clone(), infer_text_value(cell));
            }
        }
        let id = id_idx_o
            .and_then(|i| line.get(i))
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
            .unwrap_or_else(|| default_id(lineno));

        res.push(record_from_fields(
            id,
            &fields,
            candidate_keys,
            resolution_count,
        ));
    }
    Ok(res)
}

/// The id column is optional, unless it was requested explicitly.
fn id_column_index(header: &[String], source: &RecordSource) -> BDashResult<Option<usize>> {
    let name = source.id_column.clone().unwrap_or_else(|| "id".to_string());
    let idx = header.iter().position(|h| *h == name);
    if idx.is_none() && source.id_column.is_some() {
        return Err(Box::new(DashboardError::MissingIdColumn { column: name }));
    }
    Ok(idx)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(id_column: Option<&str>) -> RecordSource {
        RecordSource {
            provider: "csv".to_string(),
            file_path: None,
            collection: None,
            excel_worksheet_name: None,
            id_column: id_column.map(|s| s.to_string()),
        }
    }

    fn keys() -> Vec<String> {
        vec!["vote1".to_string(), "independent1".to_string()]
    }

    const BALLOTS: &str = "email,hasRatified,hasVoted,shares,maxVotes,vote1,independent1,selection1\n\
        a@example.com,TRUE,TRUE,100,10,5,1,For\n\
        b@example.com,true,false,50,abc,3,,Against\n\
        ,true,true,,,,,Maybe\n";

    #[test]
    fn reads_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("ballots.csv");
        fs::write(&p, BALLOTS).unwrap();
        let res = read_csv_records(
            &p.display().to_string(),
            &source(Some("email")),
            &keys(),
            13,
        )
        .unwrap();
        assert_eq!(res.len(), 3);
        assert_eq!(res[0].id, "a@example.com");
        assert!(res[0].is_eligible());
        assert_eq!(res[0].shares, Some(100));
        assert_eq!(res[0].max_votes.as_deref(), Some("10"));
        assert_eq!(res[0].votes_for("independent1"), 1);
        assert!(!res[1].is_eligible());
        assert_eq!(res[1].max_votes.as_deref(), Some("abc"));
        assert_eq!(res[2].id, "ballots.csv-00000004");
        assert_eq!(res[2].selection_at(1), None);

        let tally = share_tally::aggregate(&res, &keys(), 13);
        assert_eq!(tally.eligible_voter_count, 2);
        assert_eq!(tally.total_max_votes, 10);
        assert_eq!(tally.resolution(1).unwrap().total, 1);
    }

    #[test]
    fn explicit_id_column_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("ballots.csv");
        fs::write(&p, BALLOTS).unwrap();
        let err = read_csv_records(&p.display().to_string(), &source(Some("uid")), &keys(), 13)
            .unwrap_err();
        assert!(matches!(*err, DashboardError::MissingIdColumn { .. }));
        // Without an explicit column, the ids are generated.
        let res = read_csv_records(&p.display().to_string(), &source(None), &keys(), 13).unwrap();
        assert_eq!(res[0].id, "ballots.csv-00000002");
    }
}
