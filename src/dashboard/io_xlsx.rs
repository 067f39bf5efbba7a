use calamine::{open_workbook, DataType, Reader, Xlsx};
use serde_json::Map as JSMap;

use crate::dashboard::{
    io_common::{infer_text_value, make_default_id, record_from_fields},
    *,
};

pub fn read_excel_records(
    path: &str,
    source: &RecordSource,
    candidate_keys: &[String],
    resolution_count: u32,
) -> BDashResult<Vec<VoterRecord>> {
    let default_id = make_default_id(path);
    let wrange = get_range(path, source)?;

    let mut iter = wrange.rows();
    let header: Vec<Option<String>> = iter
        .next()
        .context(EmptyExcelSnafu {})?
        .iter()
        .map(|dt| match dt {
            DataType::String(s) => Some(s.trim().to_string()),
            _ => None,
        })
        .collect();
    debug!("read_excel_records: header: {:?}", header);

    let id_name = source.id_column.clone().unwrap_or_else(|| "id".to_string());
    let id_idx_o = header.iter().position(|h| h.as_deref() == Some(id_name.as_str()));
    if id_idx_o.is_none() && source.id_column.is_some() {
        return Err(Box::new(DashboardError::MissingIdColumn { column: id_name }));
    }

    let mut res: Vec<VoterRecord> = Vec::new();
    for (idx, row) in iter.enumerate() {
        // Excel rows start at 1 and the first one is the header.
        let lineno = idx + 2;
        debug!("read_excel_records: lineno: {:?} row: {:?}", lineno, row);

        let mut fields: JSMap<String, JSValue> = JSMap::new();
        for (name_o, cell) in header.iter().zip(row.iter()) {
            if let (Some(name), Some(v)) = (name_o, cell_value(cell)) {
                fields.insert(name.clone(), v);
            }
        }
        let id = id_idx_o
            .and_then(|i| row.get(i))
            .and_then(cell_id)
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

/// Text ids are kept as written, numeric ids are printed.
fn cell_id(cell: &DataType) -> Option<String> {
    match cell {
        DataType::String(s) if s.is_empty() => None,
        DataType::String(s) => Some(s.clone()),
        _ => match cell_value(cell) {
            Some(JSValue::Number(n)) => Some(n.to_string()),
            _ => None,
        },
    }
}

fn cell_value(cell: &DataType) -> Option<JSValue> {
    match cell {
        DataType::String(s) if s.is_empty() => None,
        // Same reading as the CSV cells: "TRUE" typed as text is a boolean.
        DataType::String(s) => Some(infer_text_value(s)),
        DataType::Int(i) => Some(JSValue::from(*i)),
        DataType::Float(f) if f.fract() == 0.0 && f.abs() < 9.0e15 => Some(JSValue::from(*f as i64)),
        DataType::Float(f) => serde_json::Number::from_f64(*f).map(JSValue::Number),
        DataType::Bool(b) => Some(JSValue::Bool(*b)),
        DataType::Empty => None,
        _ => {
            debug!("cell_value: ignoring cell {:?}", cell);
            None
        }
    }
}

fn get_range(path: &str, source: &RecordSource) -> BDashResult<calamine::Range<DataType>> {
    let worksheet_name_o = source.excel_worksheet_name.clone();
    debug!(
        "read_excel_records: path: {:?} worksheet: {:?}",
        &path, &worksheet_name_o
    );
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;

    // A worksheet name was provided, use it.
    if let Some(worksheet_name) = worksheet_name_o {
        let wrange = workbook
            .worksheet_range(&worksheet_name)
            .context(MissingWorksheetSnafu {
                worksheet: worksheet_name.clone(),
                path,
            })?
            .context(OpeningExcelSnafu { path })?;
        Ok(wrange)
    } else {
        let all_worksheets = workbook.worksheets();
        match all_worksheets.as_slice() {
            [] => Err(Box::new(DashboardError::EmptyExcel {})),
            [(worksheet_name, wrange)] => {
                debug!(
                    "read_excel_records: path: {:?} worksheet: {:?}",
                    &path, &worksheet_name
                );
                Ok(wrange.clone())
            }
            _ => Err(Box::new(DashboardError::AmbiguousWorksheet {
                path: path.to_string(),
                count: all_worksheets.len(),
            })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook;

    fn source(worksheet: Option<&str>) -> RecordSource {
        RecordSource {
            provider: "xlsx".to_string(),
            file_path: None,
            collection: None,
            excel_worksheet_name: worksheet.map(|s| s.to_string()),
            id_column: None,
        }
    }

    fn write_ballots(path: &str, extra_sheet: bool) {
        let mut workbook = Workbook::new();
        let ws = workbook.add_worksheet();
        ws.set_name("pmc2026").unwrap();
        let header = ["id", "hasRatified", "hasVoted", "shares", "maxVotes", "vote1", "selection2"];
        for (col, h) in header.iter().enumerate() {
            ws.write_string(0, col as u16, *h).unwrap();
        }
        ws.write_string(1, 0, "a@example.com").unwrap();
        ws.write_boolean(1, 1, true).unwrap();
        ws.write_boolean(1, 2, true).unwrap();
        ws.write_number(1, 3, 120).unwrap();
        ws.write_string(1, 4, "12").unwrap();
        ws.write_number(1, 5, 6).unwrap();
        ws.write_string(1, 6, "Abstain").unwrap();
        ws.write_boolean(2, 1, true).unwrap();
        ws.write_boolean(2, 2, true).unwrap();
        ws.write_number(2, 5, 2.5).unwrap();
        if extra_sheet {
            workbook.add_worksheet().set_name("notes").unwrap();
        }
        workbook.save(path).unwrap();
    }

    #[test]
    fn reads_typed_cells() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("ballots.xlsx").display().to_string();
        write_ballots(&p, false);
        let keys = vec!["vote1".to_string()];
        let res = read_excel_records(&p, &source(None), &keys, 13).unwrap();
        assert_eq!(res.len(), 2);
        assert_eq!(res[0].id, "a@example.com");
        assert!(res[0].is_eligible());
        assert_eq!(res[0].shares, Some(120));
        assert_eq!(res[0].max_votes.as_deref(), Some("12"));
        assert_eq!(res[0].votes_for("vote1"), 6);
        assert_eq!(res[0].selection_at(2), Some(share_tally::Selection::Abstain));
        assert_eq!(res[1].id, "ballots.xlsx-00000003");
        assert_eq!(res[1].votes_for("vote1"), 2);
    }

    #[test]
    fn text_flags_are_booleans() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("typed_as_text.xlsx").display().to_string();
        let mut workbook = Workbook::new();
        let ws = workbook.add_worksheet();
        let header = ["id", "hasRatified", "hasVoted", "shares", "selection1"];
        for (col, h) in header.iter().enumerate() {
            ws.write_string(0, col as u16, *h).unwrap();
        }
        ws.write_string(1, 0, "007").unwrap();
        ws.write_string(1, 1, "TRUE").unwrap();
        ws.write_string(1, 2, "true").unwrap();
        ws.write_string(1, 3, "40").unwrap();
        ws.write_string(1, 4, "For").unwrap();
        workbook.save(&p).unwrap();

        let res = read_excel_records(&p, &source(None), &[], 1).unwrap();
        assert_eq!(res.len(), 1);
        assert_eq!(res[0].id, "007");
        assert!(res[0].is_eligible());
        assert_eq!(res[0].shares, Some(40));
        assert_eq!(res[0].selection_at(1), Some(share_tally::Selection::For));
    }

    #[test]
    fn worksheet_selection() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("ballots.xlsx").display().to_string();
        write_ballots(&p, true);
        let keys = vec!["vote1".to_string()];
        let err = read_excel_records(&p, &source(None), &keys, 13).unwrap_err();
        assert!(matches!(*err, DashboardError::AmbiguousWorksheet { count: 2, .. }));
        let res = read_excel_records(&p, &source(Some("pmc2026")), &keys, 13).unwrap();
        assert_eq!(res.len(), 2);
        let err = read_excel_records(&p, &source(Some("missing")), &keys, 13).unwrap_err();
        assert!(matches!(*err, DashboardError::MissingWorksheet { .. }));
    }
}
