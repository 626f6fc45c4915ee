use clap::Parser;

use catcell_core::error::{CatcellError, ConfigError};

mod commands;

#[derive(Parser, Debug)]
#[command(
    name = "catcell",
    version,
    about = "Cell statistics reports from a CATMAID reconstruction"
)]
struct Cli {
    #[command(subcommand)]
    command: commands::Command,

    #[command(flatten)]
    global: commands::GlobalArgs,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

/// Some cells were skipped but the report was written.
const EXIT_PARTIAL: i32 = 10;

/// Classify an error into an exit code.
///
/// Exit codes:
///   0 : success
///   1 : general/unknown error
///   2 : configuration error
///   5 : CATMAID API error (network, auth, bad response)
///   7 : writing a report or cache failed
///   10: partial success (some cells were skipped)
fn classify_exit_code(err: &anyhow::Error) -> i32 {
    for cause in err.chain() {
        if cause.downcast_ref::<ConfigError>().is_some() {
            return 2;
        }
        if let Some(e) = cause.downcast_ref::<CatcellError>() {
            return match e {
                CatcellError::Config(_) => 2,
                CatcellError::Catmaid(_) => 5,
                CatcellError::Output(_) | CatcellError::Cache(_) => 7,
                CatcellError::Cell(_) => 1,
            };
        }
    }
    1
}

fn main() {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity
    let filter = match (cli.global.quiet, cli.verbose) {
        (true, _) => "error",
        (_, 0) => "warn",
        (_, 1) => "info",
        (_, 2) => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .init();

    // Requests are serial; one worker thread is plenty.
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: Failed to create runtime: {e}");
            std::process::exit(1);
        }
    };

    match runtime.block_on(commands::run(cli.command, &cli.global)) {
        Ok(commands::Outcome::Complete) => std::process::exit(0),
        Ok(commands::Outcome::Partial) => std::process::exit(EXIT_PARTIAL),
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(classify_exit_code(&e));
        }
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Context;

    use super::*;
    use catcell_core::error::{CatmaidError, CellError, OutputError};
    use catcell_core::types::CellNumber;

    #[test]
    fn exit_code_config() {
        let err = anyhow::Error::new(ConfigError::NotFound("catcell.toml".into()));
        assert_eq!(classify_exit_code(&err), 2);
    }

    #[test]
    fn exit_code_config_through_context() {
        let err = Err::<(), _>(ConfigError::Parse("bad toml".into()))
            .context("Cannot load config")
            .unwrap_err();
        assert_eq!(classify_exit_code(&err), 2);
    }

    #[test]
    fn exit_code_catmaid_api() {
        let err = anyhow::Error::new(CatcellError::from(CatmaidError::Status {
            status: 401,
            url: "https://example.org/49/annotations/query-targets".into(),
            body: "unauthorized".into(),
        }));
        assert_eq!(classify_exit_code(&err), 5);
    }

    #[test]
    fn exit_code_output() {
        let err = anyhow::Error::new(CatcellError::from(OutputError::Io {
            path: "/readonly/cell_data.csv".into(),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        }));
        assert_eq!(classify_exit_code(&err), 7);
    }

    #[test]
    fn exit_code_cell_conflict_in_strict_mode() {
        let err = anyhow::Error::new(CatcellError::from(CellError::Conflict {
            cell: CellNumber(3),
            field: "location",
            first: "ML".into(),
            second: "IGL".into(),
        }));
        assert_eq!(classify_exit_code(&err), 1);
    }

    #[test]
    fn exit_code_general() {
        let err = anyhow::anyhow!("Something unexpected happened");
        assert_eq!(classify_exit_code(&err), 1);
    }
}
