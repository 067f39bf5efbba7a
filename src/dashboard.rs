use log::{debug, info, warn};

use share_tally::builder::Builder;
use share_tally::*;
use snafu::{prelude::*, Snafu};

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::dashboard::auth::{AccessGrant, AuthError};
use crate::dashboard::config_reader::*;
use crate::dashboard::render::*;

pub mod auth;
pub mod config_reader;
mod export_pdf;
mod export_xlsx;
mod io_common;
mod io_csv;
mod io_firestore;
mod io_json;
mod io_xlsx;
pub mod render;
#[cfg(test)]
mod test_server;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum DashboardError {
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON content"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Expected a list of records or an object keyed by document id in {path}"))]
    JsonRecordShape { path: String },
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("The spreadsheet has no header row"))]
    EmptyExcel {},
    #[snafu(display("Cannot find worksheet {worksheet} in {path}"))]
    MissingWorksheet { worksheet: String, path: String },
    #[snafu(display(
        "The spreadsheet {path} has {count} worksheets, the worksheet name must be provided"
    ))]
    AmbiguousWorksheet { path: String, count: usize },
    #[snafu(display("Error opening CSV file"))]
    CsvOpen { source: csv::Error },
    #[snafu(display("Error reading CSV line"))]
    CsvLineParse { source: csv::Error },
    #[snafu(display("Cannot find the id column {column} in the header"))]
    MissingIdColumn { column: String },
    #[snafu(display("Request to {url} failed"))]
    HttpRequest { source: reqwest::Error, url: String },
    #[snafu(display("The database answered with status {status}: {body}"))]
    FirestoreStatus { status: u16, body: String },
    #[snafu(display("Sign-in failed"))]
    Authentication { source: AuthError },
    #[snafu(display("Error reading the password"))]
    ReadingPassword { source: std::io::Error },
    #[snafu(display("Missing Firebase settings in the configuration"))]
    MissingFirebaseSettings {},
    #[snafu(display("Missing API key: set apiKey or apiKeyEnv in the Firebase settings"))]
    MissingApiKey {},
    #[snafu(display("The parent directory of the configuration cannot be found"))]
    MissingParentDir {},
    #[snafu(display("Unknown provider {provider}"))]
    UnknownProvider { provider: String },
    #[snafu(display("The provider {provider} requires {field}"))]
    MissingSourceField {
        provider: String,
        field: &'static str,
    },
    #[snafu(display("Unknown page {page}: use directors, resolutions or all"))]
    UnknownPage { page: String },
    #[snafu(display("Invalid list of candidates or resolutions"))]
    InvalidBallotLayout { source: AggregationErrors },
    #[snafu(display("No record source in the configuration"))]
    NoRecordSources {},
    #[snafu(display("Results are already being generated"))]
    GenerationInProgress {},
    #[snafu(display("Failed to fetch voting data: {message}"))]
    RetrievalFailure { message: String },
    #[snafu(display("No results have been generated"))]
    NotDisplaying {},
    #[snafu(display("Error exporting the spreadsheet {path}"))]
    ExportXlsx {
        source: rust_xlsxwriter::XlsxError,
        path: String,
    },
    #[snafu(display("Error exporting the PDF document {path}: {message}"))]
    ExportPdf { path: String, message: String },
    #[snafu(display("Error writing file {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type DashResult<T> = Result<T, DashboardError>;

pub type BDashResult<T> = Result<T, Box<DashboardError>>;

/// Where the presentation is. Only one generation may run at a time.
#[derive(PartialEq, Debug, Clone)]
pub enum DashboardState {
    Idle,
    Fetching,
    Displaying(AggregateResult),
    Error(String),
}

pub struct Dashboard {
    config: DashboardConfig,
    grant: AccessGrant,
    state: DashboardState,
}

impl Dashboard {
    /// Requires a successful sign-in: the results cannot be generated without it.
    pub fn new(config: DashboardConfig, grant: AccessGrant) -> DashResult<Dashboard> {
        // Fail early on an inconsistent ballot layout.
        ballot_builder(&config)?;
        Ok(Dashboard {
            config,
            grant,
            state: DashboardState::Idle,
        })
    }

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    pub fn grant(&self) -> &AccessGrant {
        &self.grant
    }

    pub fn result(&self) -> Option<&AggregateResult> {
        match &self.state {
            DashboardState::Displaying(r) => Some(r),
            _ => None,
        }
    }

    /// Fetches all the records and recomputes every tally from scratch.
    ///
    /// A failure of the fetch leaves the dashboard in the `Error` state. It is
    /// not retried, calling `generate` again starts over.
    pub fn generate<F>(&mut self, fetch: F) -> DashResult<&AggregateResult>
    where
        F: FnOnce(&AccessGrant) -> BDashResult<Vec<VoterRecord>>,
    {
        ensure!(
            self.state != DashboardState::Fetching,
            GenerationInProgressSnafu {}
        );
        self.state = DashboardState::Fetching;

        let records = match fetch(&self.grant) {
            Ok(x) => x,
            Err(e) => {
                let message = e.to_string();
                warn!("generate: error fetching voting data: {:?}", e);
                self.state = DashboardState::Error(message.clone());
                return Err(DashboardError::RetrievalFailure { message });
            }
        };
        info!("Total documents fetched: {}", records.len());

        let mut builder = match ballot_builder(&self.config) {
            Ok(b) => b,
            Err(e) => {
                self.state = DashboardState::Error(e.to_string());
                return Err(e);
            }
        };
        builder.add_records(&records);
        let result = builder.aggregate();
        info!("Users who voted: {}", result.eligible_voter_count);

        self.state = DashboardState::Displaying(result);
        self.result().context(NotDisplayingSnafu {})
    }
}

fn ballot_builder(config: &DashboardConfig) -> DashResult<Builder> {
    Builder::new(config.resolution_count())
        .and_then(|b| b.candidates(&config.candidate_keys()))
        .context(InvalidBallotLayoutSnafu {})
}

fn read_record_source(
    root_path: &Path,
    source: &RecordSource,
    config: &DashboardConfig,
    grant: &AccessGrant,
) -> BDashResult<Vec<VoterRecord>> {
    let keys = config.candidate_keys();
    let count = config.resolution_count();
    let file_path = || -> BDashResult<String> {
        let fp = source
            .file_path
            .clone()
            .context(MissingSourceFieldSnafu {
                provider: source.provider.clone(),
                field: "filePath",
            })?;
        let p: PathBuf = root_path.join(fp);
        Ok(p.as_path().display().to_string())
    };
    match source.provider.as_str() {
        "json" => {
            let p = file_path()?;
            info!("Attempting to read record file {:?}", p);
            io_json::read_json_records(&p, &keys, count)
        }
        "csv" => {
            let p = file_path()?;
            info!("Attempting to read record file {:?}", p);
            io_csv::read_csv_records(&p, source, &keys, count)
        }
        "xlsx" => {
            let p = file_path()?;
            info!("Attempting to read record file {:?}", p);
            io_xlsx::read_excel_records(&p, source, &keys, count)
        }
        "firestore" => {
            let settings = config
                .firebase
                .as_ref()
                .context(MissingFirebaseSettingsSnafu {})?;
            let collection = source.collection.clone().context(MissingSourceFieldSnafu {
                provider: source.provider.clone(),
                field: "collection",
            })?;
            info!("Attempting to read collection {:?}", collection);
            io_firestore::read_firestore_records(settings, &collection, grant, &keys, count)
        }
        x => Err(Box::new(DashboardError::UnknownProvider {
            provider: x.to_string(),
        })),
    }
}

/// Reads all the sources, in order, into one list.
pub fn read_voter_records(
    root_path: &Path,
    sources: &[RecordSource],
    config: &DashboardConfig,
    grant: &AccessGrant,
) -> BDashResult<Vec<VoterRecord>> {
    ensure!(!sources.is_empty(), NoRecordSourcesSnafu {});
    let mut data: Vec<VoterRecord> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    for source in sources.iter() {
        let source_data = read_record_source(root_path, source, config, grant)?;
        debug!(
            "read_voter_records: {:?} records from {:?}",
            source_data.len(),
            source
        );
        // A ballot id is counted once: the last occurrence replaces the earlier ones.
        for record in source_data {
            match positions.get(&record.id) {
                Some(&idx) => {
                    warn!(
                        "read_voter_records: ballot {:?} found again in {:?}, keeping the last one",
                        record.id, source
                    );
                    data[idx] = record;
                }
                None => {
                    positions.insert(record.id.clone(), data.len());
                    data.push(record);
                }
            }
        }
    }
    Ok(data)
}

fn director_list_js(directors: &[DirectorVotes]) -> Vec<JSValue> {
    directors
        .iter()
        .map(|d| json!({"key": d.key, "name": d.name, "votes": d.votes}))
        .collect()
}

fn build_summary_js(config: &DashboardConfig, view: &ResultsView) -> JSValue {
    let c = OutputConfig {
        organization: config.meeting_settings.organization_name.clone(),
        meeting: config.meeting_settings.meeting_title.clone(),
        candidates: config.candidates.len(),
        resolutions: config.resolution_count(),
    };
    let resolutions: Vec<JSValue> = view
        .resolutions
        .iter()
        .map(|r| {
            json!({
                "index": r.index,
                "number": r.number,
                "title": r.title,
                "for": r.for_count,
                "against": r.against_count,
                "abstain": r.abstain_count,
                "total": r.total,
            })
        })
        .collect();
    json!({
        "config": c,
        "asOf": view.as_of,
        "results": {
            "eligibleVoterCount": view.eligible_voter_count,
            "totalShares": view.total_shares,
            "totalMaxVotes": view.total_max_votes,
            "directors": {
                "regular": director_list_js(&view.regular),
                "independent": director_list_js(&view.independent),
            },
            "resolutions": resolutions,
        }
    })
}

fn sources_from_args(
    args: &Args,
    config: &DashboardConfig,
    config_p: &Path,
) -> BDashResult<(PathBuf, Vec<RecordSource>)> {
    if let Some(input) = args.input.clone() {
        let source = RecordSource {
            provider: args.input_type.clone().unwrap_or_else(|| "json".to_string()),
            file_path: Some(input),
            collection: None,
            excel_worksheet_name: args.excel_worksheet_name.clone(),
            id_column: None,
        };
        return Ok((PathBuf::new(), vec![source]));
    }
    let root_p = config_p.parent().context(MissingParentDirSnafu {})?;
    let sources: Vec<RecordSource> = config
        .record_sources
        .iter()
        .map(|s| RecordSource {
            excel_worksheet_name: args
                .excel_worksheet_name
                .clone()
                .or_else(|| s.excel_worksheet_name.clone()),
            ..s.clone()
        })
        .collect();
    Ok((root_p.to_path_buf(), sources))
}

/// Relative output paths are placed in the output directory of the configuration, if any.
fn output_path(config: &DashboardConfig, config_p: &Path, path: &str) -> BDashResult<String> {
    let out_dir = match config.meeting_settings.output_directory.as_ref() {
        Some(d) if !Path::new(path).is_absolute() => d,
        _ => return Ok(path.to_string()),
    };
    let root_p = config_p.parent().context(MissingParentDirSnafu {})?;
    let dir: PathBuf = root_p.join(out_dir);
    fs::create_dir_all(&dir).context(WritingOutputSnafu {
        path: dir.display().to_string(),
    })?;
    Ok(dir.join(path).display().to_string())
}

fn write_output(path: &str, contents: &str) -> BDashResult<()> {
    fs::write(path, contents).context(WritingOutputSnafu {
        path: path.to_string(),
    })?;
    Ok(())
}

fn run_exports(args: &Args, config: &DashboardConfig, config_p: &Path, view: &ResultsView) {
    if !config.features.export_buttons {
        if args.xlsx.is_some() || args.pdf.is_some() {
            warn!("Exports are disabled in the configuration, skipping them");
        }
        return;
    }
    let resolve = |p: &str| match output_path(config, config_p, p) {
        Ok(x) => Some(x),
        Err(e) => {
            warn!("run_exports: {:?}", e);
            eprintln!("Export failed: {}", e);
            None
        }
    };
    if let Some(p) = args.xlsx.as_deref().and_then(resolve) {
        match export_xlsx::export_xlsx(view, &p) {
            Ok(()) => info!("Exported spreadsheet {:?}", p),
            Err(e) => {
                warn!("run_exports: {:?}", e);
                eprintln!("Export failed: {}", e);
            }
        }
    }
    if let Some(p) = args.pdf.as_deref().and_then(resolve) {
        match export_pdf::export_pdf(view, &p) {
            Ok(()) => info!("Exported PDF document {:?}", p),
            Err(e) => {
                warn!("run_exports: {:?}", e);
                eprintln!("Export failed: {}", e);
            }
        }
    }
}

pub fn run_dashboard(args: &Args) -> BDashResult<()> {
    let config_p = Path::new(args.config.as_str());
    let config = read_config(&args.config)?;
    info!("config: {:?}", config);

    let pages = Page::from_arg(args.page.as_deref())?;

    // The access gate comes first.
    let email = args
        .email
        .clone()
        .unwrap_or_else(|| config.admin.email.clone());
    let password_env = args
        .password_env
        .clone()
        .unwrap_or_else(|| auth::DEFAULT_PASSWORD_ENV.to_string());
    let password = auth::read_password(&password_env)?;
    let grant = auth::sign_in(&config.admin, config.firebase.as_ref(), &email, &password)?;
    info!("Signed in as {}", grant.email());

    let (root_p, sources) = sources_from_args(args, &config, config_p)?;
    let mut dashboard = Dashboard::new(config.clone(), grant)?;
    debug!("run_dashboard: generating as {}", dashboard.grant().email());
    let result = dashboard
        .generate(|g| read_voter_records(&root_p, &sources, &config, g))?
        .clone();

    let as_of = format_as_of(&chrono::Local::now().naive_local());
    let view = build_view(&config, &result, &as_of);

    let text_view = render_text(&view, &pages);
    if summary_on_stdout(args) {
        eprintln!("{}", text_view);
    } else {
        println!("{}", text_view);
    }

    if let Some(html_p) = args.html.as_deref() {
        let p = output_path(&config, config_p, html_p)?;
        write_output(&p, &render_html(&view))?;
        info!("Wrote static page {:?}", p);
    }

    run_exports(args, &config, config_p, &view);

    let summary_js = build_summary_js(&config, &view);
    let pretty_js_stats = serde_json::to_string_pretty(&summary_js).context(ParsingJsonSnafu {})?;
    match args.out.as_deref() {
        Some("stdout") => println!("{}", pretty_js_stats),
        Some(out_p) => write_output(&output_path(&config, config_p, out_p)?, &pretty_js_stats)?,
        None => {}
    }

    // The reference summary, if provided for comparison
    if let Some(summary_p) = args.reference.clone() {
        let summary_ref = read_summary(summary_p)?;
        info!("summary: {:?}", summary_ref);
        let pretty_js_ref =
            serde_json::to_string_pretty(&summary_ref["results"]).context(ParsingJsonSnafu {})?;
        let pretty_js_results =
            serde_json::to_string_pretty(&summary_js["results"]).context(ParsingJsonSnafu {})?;
        if pretty_js_ref != pretty_js_results {
            warn!("Found differences with the reference string");
            print_diff(pretty_js_ref.as_str(), pretty_js_results.as_ref(), "\n");
            return Err(Box::new(DashboardError::Whatever {
                message: "Difference detected between calculated summary and reference summary"
                    .to_string(),
                source: None,
            }));
        }
    }

    Ok(())
}

/// When the summary is printed on stdout, the text view goes to stderr so that stdout is only JSON.
fn summary_on_stdout(args: &Args) -> bool {
    args.out.as_deref() == Some("stdout")
}
