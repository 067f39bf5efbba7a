use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use snafu::prelude::*;

use crate::dashboard::render::{DirectorVotes, ResultsView};
use crate::dashboard::{DashResult, ExportXlsxSnafu};

pub fn export_xlsx(view: &ResultsView, path: &str) -> DashResult<()> {
    write_workbook(view, path).context(ExportXlsxSnafu { path })
}

fn write_workbook(view: &ResultsView, path: &str) -> Result<(), XlsxError> {
    let bold = Format::new().set_bold();
    let mut workbook = Workbook::new();

    let summary = workbook.add_worksheet();
    summary.set_name("Summary")?;
    summary.set_column_width(0, 22)?;
    summary.set_column_width(1, 40)?;
    summary.write_string_with_format(0, 0, "Field", &bold)?;
    summary.write_string_with_format(0, 1, "Value", &bold)?;
    summary.write_string(1, 0, "Organization")?;
    summary.write_string(1, 1, &view.organization)?;
    summary.write_string(2, 0, "Meeting")?;
    summary.write_string(2, 1, &view.meeting_title)?;
    summary.write_string(3, 0, "As of")?;
    summary.write_string(3, 1, &view.as_of)?;
    summary.write_string(4, 0, "Eligible voters")?;
    summary.write_number(4, 1, view.eligible_voter_count as f64)?;
    summary.write_string(5, 0, "Total shares")?;
    summary.write_number(5, 1, view.total_shares as f64)?;
    summary.write_string(6, 0, "Total max votes")?;
    summary.write_number(6, 1, view.total_max_votes as f64)?;

    let regular = workbook.add_worksheet();
    regular.set_name("Regular Directors")?;
    write_directors(regular, &view.regular, &bold)?;

    let independent = workbook.add_worksheet();
    independent.set_name("Independent Directors")?;
    write_directors(independent, &view.independent, &bold)?;

    let resolutions = workbook.add_worksheet();
    resolutions.set_name("Resolutions")?;
    resolutions.set_column_width(1, 80)?;
    let header = ["Number", "Title", "For", "Against", "Abstain", "Total"];
    for (col, h) in header.iter().enumerate() {
        resolutions.write_string_with_format(0, col as u16, *h, &bold)?;
    }
    for (idx, r) in view.resolutions.iter().enumerate() {
        let row = idx as u32 + 1;
        resolutions.write_string(row, 0, &r.number)?;
        resolutions.write_string(row, 1, &r.title)?;
        resolutions.write_number(row, 2, r.for_count as f64)?;
        resolutions.write_number(row, 3, r.against_count as f64)?;
        resolutions.write_number(row, 4, r.abstain_count as f64)?;
        resolutions.write_number(row, 5, r.total as f64)?;
    }

    workbook.save(path)?;
    Ok(())
}

fn write_directors(
    ws: &mut Worksheet,
    directors: &[DirectorVotes],
    bold: &Format,
) -> Result<(), XlsxError> {
    ws.set_column_width(0, 36)?;
    ws.write_string_with_format(0, 0, "Name", bold)?;
    ws.write_string_with_format(0, 1, "Votes", bold)?;
    for (idx, d) in directors.iter().enumerate() {
        let row = idx as u32 + 1;
        ws.write_string(row, 0, &d.name)?;
        ws.write_number(row, 1, d.votes as f64)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::render::sample_view;
    use calamine::{open_workbook, DataType, Reader, Xlsx};

    #[test]
    fn workbook_has_all_sheets() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("results.xlsx").display().to_string();
        export_xlsx(&sample_view(), &p).unwrap();

        let mut workbook: Xlsx<_> = open_workbook(&p).unwrap();
        assert_eq!(
            workbook.sheet_names().to_vec(),
            vec![
                "Summary".to_string(),
                "Regular Directors".to_string(),
                "Independent Directors".to_string(),
                "Resolutions".to_string()
            ]
        );
        let summary = workbook.worksheet_range("Summary").unwrap().unwrap();
        assert_eq!(
            summary.get_value((3, 1)),
            Some(&DataType::String("01/26/2025 9:05AM".to_string()))
        );
        let regular = workbook.worksheet_range("Regular Directors").unwrap().unwrap();
        assert_eq!(
            regular.get_value((1, 0)),
            Some(&DataType::String("Ong, Romeo A.".to_string()))
        );
        assert_eq!(regular.get_value((1, 1)), Some(&DataType::Float(12500.0)));
        let resolutions = workbook.worksheet_range("Resolutions").unwrap().unwrap();
        assert_eq!(resolutions.get_value((1, 5)), Some(&DataType::Float(1223.0)));
    }

    #[test]
    fn missing_directory_is_an_export_error() {
        let err = export_xlsx(&sample_view(), "/nonexistent/dir/results.xlsx").unwrap_err();
        assert!(matches!(err, crate::dashboard::DashboardError::ExportXlsx { .. }));
    }
}
