//! Count the blank lines of a file using grep and wc.

use std::{fs, path::PathBuf, process::ExitCode};

use clap::{error::ErrorKind, Parser};
use indexed_lines::{
    count::{LineCountSource, ShellPipeline, BLANK_LINE_PATTERN},
    logging,
};

#[derive(Debug, Parser)]
#[command(version, about = "Count the blank lines of a file")]
struct Cli {
    /// File to look at
    file: PathBuf,

    /// Extended regular expression a line has to match to be counted
    #[arg(long, default_value = BLANK_LINE_PATTERN)]
    pattern: String,
}

fn main() -> ExitCode {
    logging::init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            err.exit()
        }
        Err(err) => {
            let _ = err.print();
            return ExitCode::FAILURE;
        }
    };

    // The pipeline reports wc's status only, a missing file would silently count as zero
    if let Err(err) = fs::File::open(&cli.file) {
        eprintln!("Cannot open {}: {}", cli.file.display(), err);
        return ExitCode::FAILURE;
    }

    match ShellPipeline::blank_lines(&cli.file, &cli.pattern).count() {
        Ok(count) => {
            println!("Number of blank lines: {}", count);
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("Cannot count blank lines: {}", err);
            ExitCode::FAILURE
        }
    }
}
