// The two views of the results: directors and resolutions.

use chrono::NaiveDateTime;
use std::fmt::Write;

use crate::dashboard::config_reader::{DashboardConfig, DirectorCategory};
use crate::dashboard::{DashResult, DashboardError};
use share_tally::AggregateResult;

const TEXT_WIDTH: usize = 72;

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum Page {
    Directors,
    Resolutions,
}

impl Page {
    pub fn title(&self) -> &'static str {
        match self {
            Page::Directors => "VOTING RESULTS",
            Page::Resolutions => "RESOLUTION RESULTS",
        }
    }

    /// The pages selected on the command line, `all` by default.
    pub fn from_arg(arg: Option<&str>) -> DashResult<Vec<Page>> {
        match arg.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            None | Some("all") => Ok(vec![Page::Directors, Page::Resolutions]),
            Some("directors") => Ok(vec![Page::Directors]),
            Some("resolutions") => Ok(vec![Page::Resolutions]),
            Some(x) => Err(DashboardError::UnknownPage {
                page: x.to_string(),
            }),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct DirectorVotes {
    pub key: String,
    pub name: String,
    pub votes: i64,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ResolutionRow {
    pub index: u32,
    pub number: String,
    pub title: String,
    pub for_count: u64,
    pub against_count: u64,
    pub abstain_count: u64,
    pub total: u64,
}

/// Everything displayed or exported, with the names and titles of the configuration.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ResultsView {
    pub organization: String,
    pub meeting_title: String,
    pub as_of: String,
    pub eligible_voter_count: u64,
    pub total_shares: i64,
    pub total_max_votes: i64,
    pub regular: Vec<DirectorVotes>,
    pub independent: Vec<DirectorVotes>,
    pub resolutions: Vec<ResolutionRow>,
    pub show_statistics: bool,
}

pub fn build_view(config: &DashboardConfig, result: &AggregateResult, as_of: &str) -> ResultsView {
    let mut regular: Vec<DirectorVotes> = Vec::new();
    let mut independent: Vec<DirectorVotes> = Vec::new();
    for c in config.candidates.iter() {
        let d = DirectorVotes {
            key: c.key.clone(),
            name: c.name.clone(),
            votes: result.candidate_total(&c.key).unwrap_or(0),
        };
        match c.category {
            DirectorCategory::Regular => regular.push(d),
            DirectorCategory::Independent => independent.push(d),
        }
    }
    let resolutions = result
        .resolution_totals
        .iter()
        .map(|t| {
            let settings = config.resolution_settings(t.index);
            ResolutionRow {
                index: t.index,
                number: settings
                    .map(|s| s.number.clone())
                    .unwrap_or_else(|| format!("{:02}", t.index)),
                title: settings.map(|s| s.title.clone()).unwrap_or_default(),
                for_count: t.for_count,
                against_count: t.against_count,
                abstain_count: t.abstain_count,
                total: t.total,
            }
        })
        .collect();
    ResultsView {
        organization: config.meeting_settings.organization_name.clone(),
        meeting_title: config.meeting_settings.meeting_title.clone(),
        as_of: as_of.to_string(),
        eligible_voter_count: result.eligible_voter_count,
        total_shares: result.total_shares,
        total_max_votes: result.total_max_votes,
        regular,
        independent,
        resolutions,
        show_statistics: config.features.statistics_cards,
    }
}

/// The clock stamp of the header: `01/26/2025 9:05AM`.
pub fn format_as_of(t: &NaiveDateTime) -> String {
    t.format("%m/%d/%Y %-I:%M%p").to_string()
}

/// en-US grouping: `1234567` is `1,234,567`.
pub fn format_number(x: i64) -> String {
    let digits = x.unsigned_abs().to_string();
    let mut res = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if x < 0 {
        res.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            res.push(',');
        }
        res.push(c);
    }
    res
}

fn format_count(x: u64) -> String {
    format_number(i64::try_from(x).unwrap_or(i64::MAX))
}

/// Greedy word wrapping. A word longer than the width gets a line of its own.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if !current.is_empty() && current.chars().count() + 1 + word.chars().count() > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn statistics(view: &ResultsView) -> Vec<(&'static str, String)> {
    vec![
        ("ELIGIBLE VOTERS", format_count(view.eligible_voter_count)),
        ("TOTAL SHARES", format_number(view.total_shares)),
        ("TOTAL MAX VOTES", format_number(view.total_max_votes)),
    ]
}

fn text_directors(out: &mut String, title: &str, directors: &[DirectorVotes]) {
    let _ = writeln!(out, "{}", title);
    for d in directors.iter() {
        let votes = format_number(d.votes);
        let pad = TEXT_WIDTH.saturating_sub(d.name.chars().count() + votes.len()).max(1);
        let _ = writeln!(out, "  {}{}{}", d.name, " ".repeat(pad), votes);
    }
}

pub fn render_text(view: &ResultsView, pages: &[Page]) -> String {
    let mut out = String::new();
    for page in pages.iter() {
        let _ = writeln!(out, "{}", view.organization);
        let _ = writeln!(out, "{}", view.meeting_title);
        let _ = writeln!(out, "{}", page.title());
        let _ = writeln!(out, "AS OF {}", view.as_of);
        let _ = writeln!(out, "{}", "=".repeat(TEXT_WIDTH + 2));
        if view.show_statistics {
            for (label, value) in statistics(view).iter() {
                let _ = writeln!(out, "  {:<20}{:>width$}", label, value, width = TEXT_WIDTH - 20);
            }
            let _ = writeln!(out);
        }
        match page {
            Page::Directors => {
                text_directors(&mut out, "REGULAR DIRECTOR", &view.regular);
                let _ = writeln!(out);
                text_directors(&mut out, "INDEPENDENT DIRECTOR", &view.independent);
            }
            Page::Resolutions => {
                for r in view.resolutions.iter() {
                    let _ = writeln!(
                        out,
                        "RESOLUTION NO: {}   FOR {}   AGAINST {}   ABSTAIN {}   TOTAL {}",
                        r.number,
                        format_count(r.for_count),
                        format_count(r.against_count),
                        format_count(r.abstain_count),
                        format_count(r.total)
                    );
                    for line in wrap_text(&r.title, TEXT_WIDTH).iter() {
                        let _ = writeln!(out, "  {}", line);
                    }
                }
            }
        }
        let _ = writeln!(out);
    }
    out
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn html_directors(title: &str, directors: &[DirectorVotes]) -> String {
    let rows: String = directors
        .iter()
        .map(|d| {
            format!(
                "            <div class=\"director\"><span class=\"name\">{}</span><span class=\"votes\">{}</span></div>\n",
                html_escape(&d.name),
                format_number(d.votes)
            )
        })
        .collect();
    format!(
        "        <h2>{}</h2>\n        <div class=\"directors\">\n{}        </div>\n",
        title, rows
    )
}

fn html_resolutions(resolutions: &[ResolutionRow]) -> String {
    resolutions
        .iter()
        .map(|r| {
            format!(
                r#"        <div class="resolution">
            <div class="number">RESOLUTION NO: {}</div>
            <div class="counts"><span class="for">FOR {}</span><span class="against">AGAINST {}</span><span class="abstain">ABSTAIN {}</span><span class="total">TOTAL {}</span></div>
            <p class="title">{}</p>
        </div>
"#,
                html_escape(&r.number),
                format_count(r.for_count),
                format_count(r.against_count),
                format_count(r.abstain_count),
                format_count(r.total),
                html_escape(&r.title)
            )
        })
        .collect()
}

/// A self-contained page with both tabs.
pub fn render_html(view: &ResultsView) -> String {
    let cards = if view.show_statistics {
        let c: String = statistics(view)
            .iter()
            .map(|(label, value)| {
                format!(
                    "        <div class=\"card\"><h3>{}</h3><div class=\"value\">{}</div></div>\n",
                    label, value
                )
            })
            .collect();
        format!("    <div class=\"cards\">\n{}    </div>\n", c)
    } else {
        String::new()
    };
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>{org} - {title}</title>
    <style>
        body {{ font-family: sans-serif; background: #033E78; color: #033E78; margin: 0; padding: 2em; }}
        .container {{ background: white; border-radius: 16px; max-width: 1100px; margin: auto; padding: 2em; }}
        h1 {{ text-align: center; }}
        .as-of {{ text-align: center; font-weight: bold; }}
        .as-of span {{ color: #E2B016; }}
        .cards {{ display: flex; gap: 1em; justify-content: center; }}
        .card {{ border: 1px solid #0085BB; border-radius: 8px; padding: 1em; text-align: center; }}
        .directors {{ display: grid; grid-template-columns: 1fr 1fr; gap: 1em; }}
        .director {{ display: flex; justify-content: space-between; background: #0085BB; color: white; border-radius: 12px; padding: 1em; }}
        .votes {{ font-weight: bold; }}
        .resolution {{ border: 2px solid #ddd; border-radius: 12px; padding: 1em; margin-bottom: 1em; }}
        .counts span {{ margin-right: 1.5em; font-weight: bold; }}
    </style>
</head>
<body>
<div class="container">
    <header>
        <div class="organization">{org}</div>
        <div class="meeting"><i>{title}</i></div>
        <p class="as-of"><span>AS OF</span> {as_of}</p>
    </header>
{cards}    <section id="directors">
        <h1>{directors_title}</h1>
{regular}{independent}    </section>
    <section id="resolutions">
        <h1>{resolutions_title}</h1>
{resolutions}    </section>
</div>
</body>
</html>
"#,
        org = html_escape(&view.organization),
        title = html_escape(&view.meeting_title),
        as_of = html_escape(&view.as_of),
        cards = cards,
        directors_title = Page::Directors.title(),
        regular = html_directors("REGULAR DIRECTOR", &view.regular),
        independent = html_directors("INDEPENDENT DIRECTOR", &view.independent),
        resolutions_title = Page::Resolutions.title(),
        resolutions = html_resolutions(&view.resolutions),
    )
}

#[cfg(test)]
pub(crate) fn sample_view() -> ResultsView {
    ResultsView {
        organization: "Premier Medical Center Zamboanga".to_string(),
        meeting_title: "2025 Annual Stockholders' Meeting".to_string(),
        as_of: "01/26/2025 9:05AM".to_string(),
        eligible_voter_count: 1520,
        total_shares: 1234567,
        total_max_votes: 9876543,
        regular: vec![DirectorVotes {
            key: "vote1".to_string(),
            name: "Ong, Romeo A.".to_string(),
            votes: 12500,
        }],
        independent: vec![DirectorVotes {
            key: "independent1".to_string(),
            name: "Policarpio, Ronald D.".to_string(),
            votes: 800,
        }],
        resolutions: vec![ResolutionRow {
            index: 1,
            number: "01".to_string(),
            title: "Approval of the Minutes of the Annual Stockholders' Meeting held on January 28, 2024 & <ratification>".to_string(),
            for_count: 1200,
            against_count: 20,
            abstain_count: 3,
            total: 1223,
        }],
        show_statistics: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn page_selection() {
        assert_eq!(
            Page::from_arg(None).unwrap(),
            vec![Page::Directors, Page::Resolutions]
        );
        assert_eq!(Page::from_arg(Some("Resolutions")).unwrap(), vec![Page::Resolutions]);
        assert!(matches!(
            Page::from_arg(Some("summary")),
            Err(DashboardError::UnknownPage { .. })
        ));
    }

    #[test]
    fn clock_stamp() {
        let t = NaiveDate::from_ymd_opt(2025, 1, 26)
            .unwrap()
            .and_hms_opt(0, 5, 0)
            .unwrap();
        assert_eq!(format_as_of(&t), "01/26/2025 12:05AM");
        let t = NaiveDate::from_ymd_opt(2025, 11, 3)
            .unwrap()
            .and_hms_opt(15, 42, 59)
            .unwrap();
        assert_eq!(format_as_of(&t), "11/03/2025 3:42PM");
    }

    #[test]
    fn thousands_separators() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1234567), "1,234,567");
        assert_eq!(format_number(-45000), "-45,000");
        assert_eq!(format_number(i64::MIN), "-9,223,372,036,854,775,808");
    }

    #[test]
    fn wraps_long_titles() {
        let lines = wrap_text("Approval of the 2024 Annual Report and Audited Financial Statements", 20);
        assert!(lines.iter().all(|l| l.chars().count() <= 20));
        assert_eq!(lines.join(" "), "Approval of the 2024 Annual Report and Audited Financial Statements");
        assert_eq!(wrap_text("", 10), Vec::<String>::new());
        assert_eq!(wrap_text("Extraordinarily", 5), vec!["Extraordinarily".to_string()]);
    }

    #[test]
    fn text_view() {
        let view = sample_view();
        let s = render_text(&view, &[Page::Directors]);
        assert!(s.contains("VOTING RESULTS"));
        assert!(s.contains("AS OF 01/26/2025 9:05AM"));
        assert!(s.contains("Ong, Romeo A."));
        assert!(s.contains("12,500"));
        assert!(s.contains("1,234,567"));
        assert!(!s.contains("RESOLUTION RESULTS"));

        let mut view = sample_view();
        view.show_statistics = false;
        let s = render_text(&view, &[Page::Resolutions]);
        assert!(s.contains("RESOLUTION NO: 01"));
        assert!(s.contains("TOTAL 1,223"));
        assert!(!s.contains("TOTAL SHARES"));
    }

    #[test]
    fn html_view_is_escaped() {
        let s = render_html(&sample_view());
        assert!(s.starts_with("<!DOCTYPE html>"));
        assert!(s.contains("Stockholders&#39; Meeting"));
        assert!(s.contains("&amp; &lt;ratification&gt;"));
        assert!(!s.contains("<ratification>"));
        assert!(s.contains("ELIGIBLE VOTERS"));
        assert!(s.contains("RESOLUTION RESULTS"));
    }
}
