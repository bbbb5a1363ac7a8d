use clap::Parser;

/// This is a poll weighting and tabulation program.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path) The JSON file describing the poll: data source, question types, weighting
    /// and cross-tabs. See the manual of the poll_tabulation library for the format.
    #[clap(short, long, value_parser)]
    pub config: String,

    /// (file path) A reference file containing the summary of a poll in JSON format. If provided,
    /// polltab will check that the computed summary matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the summary of the poll will be written in
    /// JSON format to the given location.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path or empty) If specified, the responses are read from this file instead of the
    /// one named in the configuration.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (csv or xlsx) Overrides the provider of the configuration.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
