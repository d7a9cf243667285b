//! Command line interface

use app_core::Grade;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "image_triage")]
#[command(about = "Grade image collections A to F and review them by grade")]
pub struct Cli {
    /// Root of the asset tree (collections.json, <id>/manifest.json)
    #[arg(long, global = true)]
    pub assets: Option<PathBuf>,
    /// Ratings database file
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,
    /// Configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Collection to open instead of the configured default
    #[arg(long, global = true)]
    pub collection: Option<String>,
    /// More log output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List available collections
    Collections,
    /// Rating counts for the collection
    Stats,
    /// Print the review grid
    Review {
        /// Grid columns (2-10)
        #[arg(long)]
        columns: Option<usize>,
        /// One grid sorted by filename instead of grade groups
        #[arg(long, default_value_t = false)]
        single: bool,
    },
    /// Print the next image to grade
    Next,
    /// Set or clear the grade of one image
    Rate {
        filename: String,
        /// a, b, c, d, f or none
        #[arg(value_parser = parse_grade)]
        grade: GradeArg,
    },
    /// Write the collection's ratings to a JSON file
    Export {
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Merge a ratings JSON file into the collection
    Import { file: PathBuf },
    /// Delete every rating of the collection
    Clear {
        #[arg(long, default_value_t = false)]
        yes: bool,
    },
    /// Read key names from stdin, one per line, and apply them
    Session,
}

/// A grade, or `none` to clear it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GradeArg(pub Option<Grade>);

fn parse_grade(s: &str) -> Result<GradeArg, String> {
    if s.trim().eq_ignore_ascii_case("none") {
        return Ok(GradeArg(None));
    }
    s.parse::<Grade>().map(|g| GradeArg(Some(g)))
}

impl Cli {
    /// Log level from `-v`, falling back to the configured one
    pub fn log_level<'a>(&self, configured: &'a str) -> &'a str {
        match self.verbose {
            0 => configured,
            1 => "debug",
            _ => "trace",
        }
    }
}
