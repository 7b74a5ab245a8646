use clap::Parser;
use clap::error::ErrorKind;
use manim_slice::cli::{Cli, USAGE};
use std::process;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = match Cli::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => {
            eprintln!("{e}");
            eprintln!("{USAGE}");
            process::exit(1);
        }
    };

    if let Err(e) = manim_slice::run(&args) {
        eprintln!("Error transforming code: {e:#}");
        process::exit(1);
    }
}
