//! Command-line interface for AutoPPT

use autoppt::render::OutputFormat;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "autoppt",
    version,
    about = "AI-powered presentation generator",
    long_about = "AutoPPT turns a short topic into a complete slide deck. It asks a language model \
                  for an outline, researches every slide on the web, synthesizes structured slide \
                  content from that research and renders it with one of 13 visual styles.",
    after_help = "EXAMPLES:
  # Generate a deck with the default provider
  autoppt generate --topic \"Artificial Intelligence\"

  # Pick style, slide count, language and provider
  autoppt generate --topic \"Quantum Computing\" --style technology --slides 12 \\
      --language German --provider anthropic

  # Fully offline run (no API key, no network)
  autoppt generate --topic \"Rust\" --provider mock --no-research

  # Render your own outline
  autoppt generate --topic \"Team Offsite\" --outline offsite.yaml

  # Inspect the catalog and providers
  autoppt themes
  autoppt providers

  # Write a configuration file
  autoppt config init --output autoppt.yaml

ENVIRONMENT:
  OPENAI_API_KEY, GOOGLE_API_KEY, ANTHROPIC_API_KEY (a .env file is loaded automatically)
  RUST_LOG overrides the log filter chosen by -v"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose logging (-v: info, -vv: debug, -vvv: trace); disables the progress bar
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// No banner and no progress bar
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value = "text", value_name = "FORMAT")]
    pub log_format: LogFormat,

    /// Also write logs to this file
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a presentation
    Generate(GenerateArgs),

    /// List available visual styles
    Themes,

    /// List AI providers, their availability and models
    Providers,

    /// Manage the configuration file
    Config(ConfigCommand),
}

#[derive(Parser, Debug)]
#[command(
    about = "Generate a presentation about a topic",
    after_help = "NOTES:
  --slides is a target: the final count follows the outline the model produces.
  Unknown styles fall back to 'minimalist'.
  Network providers pause before every slide (--pacing-delay, default 60s) to stay
  under rate limits; the mock provider never pauses."
)]
pub struct GenerateArgs {
    /// Presentation topic
    #[arg(short, long, value_name = "TOPIC")]
    pub topic: String,

    /// Visual style (see `autoppt themes`)
    #[arg(short, long, value_name = "STYLE")]
    pub style: Option<String>,

    /// AI provider (openai, google, anthropic, ollama, mock)
    #[arg(short, long, value_name = "PROVIDER")]
    pub provider: Option<String>,

    /// Model override for the provider
    #[arg(short, long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Target number of body slides
    #[arg(short = 'n', long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    pub slides: Option<u32>,

    /// Output language
    #[arg(short, long, value_name = "LANGUAGE")]
    pub language: Option<String>,

    /// Output file (default: <output_dir>/<topic>.<format>)
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Render this outline (YAML or JSON) instead of generating one
    #[arg(long, value_name = "FILE")]
    pub outline: Option<PathBuf>,

    /// Output document format
    #[arg(short, long, value_enum, default_value = "pptx", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Skip web research
    #[arg(long)]
    pub no_research: bool,

    /// Pause before each slide, in seconds
    #[arg(long, value_name = "SECS")]
    pub pacing_delay: Option<u64>,
}

#[derive(Parser, Debug)]
#[command(about = "Manage the configuration file")]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write a default configuration file
    Init {
        /// Output file path (.yaml, .yml, .toml or .json)
        #[arg(short, long, default_value = "autoppt.yaml", value_name = "FILE")]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Validate a configuration file
    Validate {
        /// Configuration file to validate
        config: PathBuf,
    },

    /// Print the effective configuration
    Show,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per event
    Json,
}
