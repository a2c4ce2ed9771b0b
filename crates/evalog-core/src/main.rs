//! `evalog` binary entry point.

use clap::Parser;
use evalog_core::{logging, run, Cli, ExitCode};
use tracing::error;

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.log_format);

    let mut stdout = std::io::stdout().lock();
    let code = match run(cli, &mut stdout) {
        Ok(code) => code,
        Err(e) => {
            error!(code = e.code(), error = %e, "command failed");
            eprintln!("evalog: {}", e);
            ExitCode::for_error(&e)
        }
    };
    code.into()
}
