//! Vigil CLI binary entry point.
//! Delegates to the library for check/gate/rules and prints results.

use clap::Parser;
use std::path::Path;
use std::time::Duration;
use vigil::cli::{Cli, Commands};
use vigil::config::{self, Overrides};
use vigil::error::VigilError;
use vigil::gate::{self, ProcessRunner};
use vigil::models::work;
use vigil::rules::RuleSet;
use vigil::select::SelectionMode;
use vigil::utils::{error_prefix, info_prefix, note_prefix};
use vigil::{lint, logging, output, report};

fn main() {
    logging::init_tracing();
    let cli = Cli::parse();
    let code = match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {}", error_prefix(), e);
            2
        }
    };
    std::process::exit(code);
}

fn run(cli: Cli) -> Result<i32, VigilError> {
    match cli.cmd {
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(0)
        }
        Commands::Check {
            paths,
            repo_root,
            window_days,
            selection,
            output,
            report: report_path,
            jobs,
            no_report,
        } => {
            let selection = selection
                .as_deref()
                .map(str::parse::<SelectionMode>)
                .transpose()?;
            let eff = config::resolve_effective(&Overrides {
                repo_root,
                window_days,
                selection,
                output,
                report: report_path,
                jobs,
            })?;
            if !eff.root_exists {
                eprintln!(
                    "{} Project root not found: {}",
                    info_prefix(),
                    eff.repo_root.display()
                );
            } else if eff.config_path.is_none() && eff.output != "json" {
                eprintln!("{} No vigil.toml found; using defaults.", note_prefix());
            }

            let run = lint::run_lint(&eff, &paths)?;
            // Nothing selected means nothing to report; leave any old report alone.
            let persisted = if run.source.is_some() && !no_report {
                report::persist(&eff.report_path(), &run.report)?;
                Some(eff.report.as_str())
            } else {
                None
            };
            output::print_check(&run, &eff.output, persisted);
            Ok(run.result.exit_code())
        }
        Commands::Gate {
            tasks,
            repo_root,
            output,
            force,
            timeout_secs,
        } => {
            let items = if tasks == "-" {
                let s = std::io::read_to_string(std::io::stdin())
                    .map_err(|e| VigilError::io("<stdin>", e))?;
                work::parse_json(&s)?
            } else {
                work::load_work_items(Path::new(&tasks))?
            };
            let eff = config::resolve_effective(&Overrides {
                repo_root,
                output,
                ..Overrides::default()
            })?;
            let runner = ProcessRunner::new(
                gate::current_exe()?,
                eff.repo_root.clone(),
                eff.report.clone(),
                Duration::from_secs(timeout_secs.unwrap_or(gate::DEFAULT_TIMEOUT_SECS)),
            );
            let run = gate::run_gate(&items, &runner, force, &eff.report);
            output::print_gate(&run, &eff.output);
            Ok(run.exit_code)
        }
        Commands::Rules { repo_root, output } => {
            let eff = config::resolve_effective(&Overrides {
                repo_root,
                output,
                ..Overrides::default()
            })?;
            let rules = RuleSet::from_policy(&eff.policy)?;
            output::print_rules(&rules, &eff.output);
            Ok(0)
        }
    }
}
