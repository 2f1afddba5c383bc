mod cli;
mod commands;
mod config;
mod error;
mod output;
mod response;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use tuyalarm_core::DeviceOperations;

use crate::cli::{Cli, Command, PresetArgs, PresetCommand};
use crate::commands::Reply;
use crate::error::{CliError, exit_code};
use crate::output::View;

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries the envelope only
    init_tracing(cli.global.verbose);

    match run(cli).await {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            let code = err.exit_code();
            eprintln!("{:?}", miette::Report::new(err));
            std::process::exit(code);
        }
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Run one command and return the process exit code.
async fn run(cli: Cli) -> Result<i32, CliError> {
    let Cli { global, command } = cli;

    // Shell completions need neither config nor credentials
    if let Command::Completions(ref args) = command {
        use clap::CommandFactory;
        use clap_complete::generate;

        let mut cmd = Cli::command();
        generate(args.shell, &mut cmd, "tuyalarm", &mut std::io::stdout());
        return Ok(exit_code::SUCCESS);
    }

    let loaded = config::load(&global)?;
    let format = config::output_format(&global, &loaded)?;

    let reply = match command {
        Command::Preset(PresetArgs {
            command: PresetCommand::List,
        }) => commands::preset::list(),

        cmd => {
            // Malformed ids are rejected before credentials are even resolved
            match cmd.device_id().map(response::validate_device_id) {
                Some(Err(result)) => Reply {
                    result,
                    view: View::Object,
                },
                _ => {
                    let alarm_config = config::alarm_config(&global, &loaded)?;
                    let ops = DeviceOperations::new(&alarm_config)?;
                    tracing::debug!(command = ?cmd, "dispatching command");
                    commands::dispatch(cmd, &ops).await
                }
            }
        }
    };

    let envelope = response::wrap(reply.result);
    let rendered = output::render(format, &envelope, reply.view)?;
    output::print_output(&rendered, global.quiet, envelope.is_success())?;
    Ok(envelope.exit_code())
}
