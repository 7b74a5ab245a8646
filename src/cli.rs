use clap::Parser;
use std::path::PathBuf;

pub const USAGE: &str = "Usage: manim-slice <output_path> <line_number>";

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Where the rewritten scene script is written
    pub output: PathBuf,
    /// 1-based line whose animation is kept; later lines are cut
    pub line: usize,
    /// JSON file overriding the recognized animation names
    #[arg(long)]
    pub vocabulary: Option<PathBuf>,
}
