//! Command-line arguments

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tokenlens_catalog::ContentType;

/// Token counting, limit checking and batch planning for AI model providers
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (TOML or YAML, chosen by extension)
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// Write daily-rotated log files to this directory
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check content against a model's limits
    Check(CheckArgs),
    /// List a provider's models and their limits
    Models(ModelsArgs),
    /// List catalog providers
    Providers(OutputArgs),
    /// Run the HTTP API
    Serve(ServeArgs),
    /// Download a model's tokenizer from the HuggingFace Hub
    FetchTokenizer(FetchTokenizerArgs),
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Provider name or alias
    #[arg(long, short = 'p')]
    pub provider: String,

    #[arg(long, short = 'm')]
    pub model: String,

    /// Text to check; read from stdin when neither --text, --file nor --content is given
    #[arg(long, short = 't', conflicts_with_all = ["file", "content"])]
    pub text: Option<String>,

    /// Read the text to check from a file
    #[arg(long, short = 'f', conflicts_with = "content")]
    pub file: Option<PathBuf>,

    /// Declared content type
    #[arg(long = "type", default_value_t = ContentType::Text)]
    pub content_type: ContentType,

    /// Media request as a JSON object, e.g. '{"size": "1024x1024"}'
    #[arg(long)]
    pub content: Option<String>,

    /// Count with the approximate tokenizer instead of the precise one
    #[arg(long)]
    pub approximate: bool,

    /// Split size for over-limit text
    #[arg(long)]
    pub batch_size: Option<usize>,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Args, Debug)]
pub struct ModelsArgs {
    /// Provider name or alias
    #[arg(long, short = 'p')]
    pub provider: String,

    /// Only list models of this content type
    #[arg(long = "type")]
    pub content_type: Option<ContentType>,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Args, Debug, Clone, Copy)]
pub struct OutputArgs {
    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Override the configured bind host
    #[arg(long)]
    pub host: Option<String>,

    /// Override the configured port
    #[arg(long)]
    pub port: Option<u16>,
}

#[derive(Args, Debug)]
pub struct FetchTokenizerArgs {
    #[arg(long, short = 'p')]
    pub provider: String,

    #[arg(long, short = 'm')]
    pub model: String,

    /// Hub repository; defaults to the catalog's `tokenizer_repo` for the model
    #[arg(long)]
    pub repo: Option<String>,
}
