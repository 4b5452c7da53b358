use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

use gitpr::cli::{self, Cli};

fn main() -> ExitCode {
    let cli = Cli::parse_args();
    init_logging(cli.debug);

    match cli::run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            cli::report_error(&err);
            ExitCode::FAILURE
        }
    }
}

/// `--debug` wins over `RUST_LOG`; otherwise only warnings are shown.
fn init_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::new("gitpr=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
