use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "cachebump",
    about = "Bump cache-busting ?v= query strings in HTML files to the current git revision",
    version,
    author
)]
pub struct Cli {
    /// Path to the project directory (defaults to current directory)
    #[arg(short, long, default_value = ".")]
    pub path: PathBuf,

    /// TOML file listing the target files and patterns (defaults to the built-in targets)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Use this version token instead of the git revision or timestamp
    #[arg(short, long, value_name = "TOKEN")]
    pub token: Option<String>,

    /// Report what would change without writing any file
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Print the run report as JSON instead of status lines
    #[arg(long)]
    pub json: bool,

    /// Enable verbose output for debugging
    #[arg(short, long)]
    pub verbose: bool,
}
