use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::API_KEY_ENV;
use crate::logger::LogLevel;
use crate::pipeline::GenerationMode;

/// Command line arguments for the archigen binary.
#[derive(Parser, Debug, Clone)]
#[command(version, about = "Floor plans and architectural renders from text")]
pub struct Args {
    /// TOML file with API and timeout settings.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    #[arg(long, env = API_KEY_ENV, hide_env_values = true, global = true)]
    pub api_key: Option<String>,
    #[arg(long, value_enum, default_value_t = LogLevel::Info, global = true)]
    pub log_level: LogLevel,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Generate a drawing and its renders.
    Visualize {
        #[arg(long)]
        prompt: String,
        #[arg(long, value_enum, default_value_t = GenerationMode::Quality)]
        mode: GenerationMode,
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
    /// Generate a scene layout, optionally rendering it.
    Layout {
        #[arg(long)]
        prompt: String,
        #[arg(long)]
        render: bool,
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
    /// Edit an image with a text instruction.
    Edit {
        #[arg(long)]
        image: PathBuf,
        #[arg(long)]
        prompt: String,
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
    /// Rasterize an SVG drawing locally.
    Export {
        #[arg(long)]
        svg: PathBuf,
        #[arg(long, default_value_t = crate::raster::EXPORT_SIZE)]
        size: u32,
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
}

impl Command {
    /// Whether the command talks to the remote API.
    pub fn needs_credential(&self) -> bool {
        !matches!(self, Command::Export { .. })
    }
}
