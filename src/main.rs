use anyhow::Result;
use clap::Parser;
use foldstat::cli::{Cli, Command};
use foldstat::error::CollateError;
use foldstat::pipeline::{self, Stage};
use foldstat::reference::compare_to_reference;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber; INFO unless `--debug` or `RUST_LOG` say otherwise
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into())
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let file = cli.file_config()?;
    match cli.command {
        Command::Collate(args) => {
            pipeline::run(&args.into_context(&file)?, Stage::All)?;
        }
        Command::Average(args) => {
            pipeline::run(&args.into_context(&file)?, Stage::Average)?;
        }
        Command::Compare(args) => {
            pipeline::run(&args.into_context(&file)?, Stage::Compare)?;
        }
        Command::Reference(args) => {
            compare_to_reference(&args.into_request(&file)?)?;
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    match run(cli) {
        Err(err)
            if err
                .downcast_ref::<CollateError>()
                .is_some_and(CollateError::is_usage_error) =>
        {
            tracing::error!("{:#}", err);
            Ok(())
        }
        other => other,
    }
}
