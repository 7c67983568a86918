use anyhow::Result;
use clap::Parser;

use cost_centers_core::model::OutputFormat;
use cost_centers_core::service::invocation_response;

use cost_centers::args::{Cli, Command};
use cost_centers::commands::{
    OutputPreferences, cli_error_payload, run_config, run_job, run_summarize,
};
use cost_centers::exit_codes::{error_kind_for_error, exit_code_for_error};
use cost_centers::logger::{self, LogLevel, LoggerConfig};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if let Some(level) = cli.global.log_level {
        level
    } else if cli.global.verbose {
        LogLevel::Verbose
    } else {
        LogLevel::Warning
    };
    logger::init(LoggerConfig {
        level: log_level,
        json_output: cli.global.json_output,
        json_only: cli.global.json_only,
    });

    let mut respond_as_invocation = false;
    let (result, output_prefs) = match cli.command {
        Command::Run(args) => {
            let prefs = OutputPreferences {
                format: if args.json || cli.global.json_only {
                    OutputFormat::Json
                } else {
                    args.format.into()
                },
                pretty: args.pretty,
                json_only: cli.global.json_only,
            };
            respond_as_invocation = prefs.uses_json_output();
            (run_job(args, &cli.global).await, prefs)
        }
        Command::Summarize(args) => {
            let prefs = OutputPreferences {
                format: if args.json || cli.global.json_only {
                    OutputFormat::Json
                } else {
                    args.format.into()
                },
                pretty: args.pretty,
                json_only: cli.global.json_only,
            };
            (run_summarize(args, &cli.global).await, prefs)
        }
        Command::Config(cmd) => {
            let mut format = cmd.command.format();
            if cli.global.json_only {
                format = OutputFormat::Json;
            }
            let prefs = OutputPreferences {
                format,
                pretty: cmd.command.pretty(),
                json_only: cli.global.json_only,
            };
            (run_config(cmd, &cli.global).await, prefs)
        }
    };

    if let Err(err) = result {
        let code = exit_code_for_error(&err);
        let kind = error_kind_for_error(&err);
        if respond_as_invocation {
            let response = invocation_response(&Err(err));
            print_json(&response, output_prefs.pretty);
        } else if output_prefs.uses_json_output() {
            let outputs = vec![cli_error_payload(code, err.to_string(), kind)];
            if let Ok(value) = serde_json::to_value(&outputs) {
                print_json(&value, output_prefs.pretty);
            }
        } else {
            eprintln!("Error: {:#}", err);
        }
        std::process::exit(code);
    }

    Ok(())
}

fn print_json(value: &serde_json::Value, pretty: bool) {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    if let Ok(json) = rendered {
        println!("{}", json);
    }
}
