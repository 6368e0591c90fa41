//! Index a text file and print its lines by number until the user stops or stays silent for too
//! long.

use std::{ffi::OsString, path::PathBuf, process::ExitCode, time::Duration};

use clap::{error::ErrorKind, Parser};
use indexed_lines::{
    config::{DEFAULT_INPUT_TIMEOUT, DEFAULT_MAP_TIMEOUT},
    error::Error,
    logging, query, Config, IndexedFile, Indexable,
};
use tracing::{debug, info};

#[derive(Debug, Parser)]
#[command(version, about = "Index a text file by its lines and print lines by number")]
struct Cli {
    /// File to index
    file: PathBuf,

    /// Time to wait for a line number before printing the whole file
    #[arg(long, value_name = "MS", default_value_t = DEFAULT_INPUT_TIMEOUT.as_millis() as u64)]
    input_timeout_ms: u64,

    /// Time to wait for a file that's temporarily unavailable for mapping
    #[arg(long, value_name = "MS", default_value_t = DEFAULT_MAP_TIMEOUT.as_millis() as u64)]
    map_timeout_ms: u64,
}

impl From<&Cli> for Config {
    fn from(cli: &Cli) -> Self {
        Config::default()
            .with_input_timeout(Duration::from_millis(cli.input_timeout_ms))
            .with_map_timeout(Duration::from_millis(cli.map_timeout_ms))
    }
}

/// Why a session never started. Each of them ends the program with exit code 1.
#[derive(Debug)]
enum StartupError {
    Args(clap::Error),
    Index(PathBuf, Error),
}

impl StartupError {
    fn report(&self) {
        match self {
            StartupError::Args(err) => {
                let _ = err.print();
            }
            StartupError::Index(path, err) => {
                eprintln!("Cannot create table for {}: {}", path.display(), err);
            }
        }
    }

    #[inline]
    fn exit_code(&self) -> ExitCode {
        ExitCode::FAILURE
    }
}

/// Parse `args` and index the requested file. Help and version requests exit right away.
fn start<I, T>(args: I) -> Result<(Config, IndexedFile), StartupError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            err.exit()
        }
        Err(err) => return Err(StartupError::Args(err)),
    };
    let config = Config::from(&cli);

    let file = IndexedFile::open(&cli.file, &config)
        .map_err(|err| StartupError::Index(cli.file.clone(), err))?;
    info!(file = %cli.file.display(), lines = file.total_lines(), "file indexed");

    Ok((config, file))
}

#[async_std::main]
async fn main() -> ExitCode {
    logging::init();

    let (config, mut file) = match start(std::env::args_os()) {
        Ok(session) => session,
        Err(err) => {
            err.report();
            return err.exit_code();
        }
    };

    match query::run_console(&mut file, &config).await {
        Ok(outcome) => {
            debug!(?outcome, "session finished");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("Error while waiting for input: {}", err);
            ExitCode::FAILURE
        }
    }
}
