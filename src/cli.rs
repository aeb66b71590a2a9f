use clap::{Parser, Subcommand, ValueEnum};
use oggsniff::{DetectOptions, OpusMultiTrack};

/// Ogg content-type sniffer
#[derive(Debug, Parser)]
#[command(long_about = None)]
pub struct Cli {
    /// First packets no longer than this many bytes are never classified
    #[arg(long = "min-packet-len", global = true, default_value_t = 10)]
    pub min_packet_len: usize,

    /// What a multi-track Opus file must match to be reported as Opus
    /// "total": every stream is Opus
    /// "vorbis": every stream is Vorbis (never true, such files stay generic)
    #[arg(long = "opus-rule", global = true, value_enum, default_value_t = OpusRule::Total, verbatim_doc_comment)]
    pub opus_rule: OpusRule,

    /// Stop at the first non-page bytes instead of searching for the next page
    #[arg(long = "no-resync", global = true, default_value_t = false)]
    pub no_resync: bool,

    /// Print one JSON object per result instead of text
    #[arg(long = "json", global = true, default_value_t = false)]
    pub json: bool,

    /// Do not print a line for each file/stream, only the summary
    #[arg(short = 's', long = "silent", global = true, default_value_t = false)]
    pub silent: bool,

    /// Log classification details (RUST_LOG takes precedence)
    #[arg(short = 'v', long = "verbose", global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OpusRule {
    Total,
    Vorbis,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Detect the content type of each input file
    #[command(arg_required_else_help = true)]
    Detect {
        /// Paths or glob patterns of the input files
        #[arg(required = true)]
        patterns: Vec<String>,
    },
    /// Find Ogg containers embedded anywhere in the input file
    #[command(arg_required_else_help = true)]
    Scan {
        /// Path to the input file
        file_path: String,
    },
}

impl Cli {
    pub fn detect_options(&self) -> DetectOptions {
        DetectOptions {
            min_first_packet_len: self.min_packet_len,
            opus_multitrack: match self.opus_rule {
                OpusRule::Total => OpusMultiTrack::TotalStreams,
                OpusRule::Vorbis => OpusMultiTrack::VorbisCount,
            },
            resync: !self.no_resync,
            ..DetectOptions::default()
        }
    }
}

pub fn parse() -> Cli {
    Cli::parse()
}
