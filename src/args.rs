use clap::Parser;

/// This is the results program for the stockholders' meeting.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path) The file containing the meeting configuration: candidates, resolutions,
    /// administrator account and record sources. See the manual for the format.
    #[clap(short, long, value_parser)]
    pub config: String,

    /// (file path) A reference summary in JSON format. If provided, asmresults will
    /// check that the tabulated results match the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the summary of the meeting will be written in JSON format to the given
    /// location.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path or empty) If specified, the ballot records are read from this file. Setting this option overrides
    /// the sources listed in the configuration.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (default json) The type of the input given with --input: json, csv, xlsx.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// When using an Excel file, indicates the name of the worksheet to use.
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    /// (default all) The view to display: directors, resolutions or all.
    #[clap(long, value_parser)]
    pub page: Option<String>,

    /// (file path) Writes the results as a static HTML page.
    #[clap(long, value_parser)]
    pub html: Option<String>,

    /// (file path) Exports the results to an Excel spreadsheet.
    #[clap(long, value_parser)]
    pub xlsx: Option<String>,

    /// (file path) Exports the results to a PDF document.
    #[clap(long, value_parser)]
    pub pdf: Option<String>,

    /// The e-mail of the administrator account. Defaults to the account of the configuration.
    #[clap(long, value_parser)]
    pub email: Option<String>,

    /// (default ASM_ADMIN_PASSWORD) The environment variable holding the administrator password.
    /// If the variable is not set, the password is read from the standard input.
    #[clap(long, value_parser)]
    pub password_env: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
