use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use mission_control::app::{AppOptions, create_app};
use mission_control::cli::{Cli, Commands, ConfigAction, Display, OutputFormat};
use mission_control::config::AppConfig;
use mission_control::error::{MissionControlError, Result};
use mission_control::logging::init_logging;
use mission_control::registry::MissionRegistry;

/// Context for command output handling.
struct OutputContext<'a> {
    display: &'a Display,
    format: OutputFormat,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            Display::new().print_error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = AppConfig::load(&cli.config).await?;
    init_logging(&config.logging, cli.verbose)?;

    let display = Display::new();
    let out = OutputContext {
        display: &display,
        format: cli.output,
    };

    match cli.command {
        Commands::Serve { port, missions } => cmd_serve(&out, config, port, missions).await,
        Commands::List { missions } => cmd_list(&out, &with_folder(config, missions)).await,
        Commands::Show {
            mission_id,
            missions,
        } => cmd_show(&out, &with_folder(config, missions), &mission_id).await,
        Commands::Validate { missions } => {
            cmd_validate(&out, &with_folder(config, missions)).await
        }
        Commands::Config { action } => cmd_config(&out, &config, action),
    }
}

fn with_folder(mut config: AppConfig, folder: Option<PathBuf>) -> AppConfig {
    if let Some(folder) = folder {
        config.mission.folder = folder;
    }
    config
}

async fn cmd_serve(
    out: &OutputContext<'_>,
    config: AppConfig,
    port: Option<u16>,
    missions: Option<PathBuf>,
) -> Result<ExitCode> {
    let mut config = with_folder(config, missions);
    if let Some(port) = port {
        config.server.port = port;
    }

    let app = create_app(&config, AppOptions::default()).await?;
    if out.format == OutputFormat::Text {
        out.display.print_info(&format!(
            "Serving missions from {} on http://{}",
            config.mission.folder.display(),
            config.server.address()
        ));
    }

    app.serve().await?;
    Ok(ExitCode::SUCCESS)
}

async fn cmd_list(out: &OutputContext<'_>, config: &AppConfig) -> Result<ExitCode> {
    let registry = MissionRegistry::new(&config.mission.folder);
    let missions = registry
        .list_missions()
        .await
        .ok_or_else(|| unreadable_folder(config))?;

    match out.format {
        OutputFormat::Text => out.display.print_missions_table(&missions),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&missions)?),
    }
    Ok(ExitCode::SUCCESS)
}

async fn cmd_show(out: &OutputContext<'_>, config: &AppConfig, key: &str) -> Result<ExitCode> {
    let registry = MissionRegistry::new(&config.mission.folder);
    let mission = registry
        .get_mission_by_key(key)
        .await
        .ok_or_else(|| MissionControlError::MissionNotFound(key.to_string()))?;

    match out.format {
        OutputFormat::Text => out.display.print_mission_detail(&mission),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&mission)?),
    }
    Ok(ExitCode::SUCCESS)
}

async fn cmd_validate(out: &OutputContext<'_>, config: &AppConfig) -> Result<ExitCode> {
    let registry = MissionRegistry::new(&config.mission.folder);
    let report = registry
        .validate_library()
        .await
        .ok_or_else(|| unreadable_folder(config))?;

    match out.format {
        OutputFormat::Text => {
            out.display.print_library_report(&report);
            if report.is_clean() {
                out.display.print_success("All mission files are valid.");
            } else {
                out.display.print_warning(&format!(
                    "{} of {} mission files rejected.",
                    report.files - report.valid.len(),
                    report.files
                ));
            }
        }
        OutputFormat::Json => {
            let rejected: Vec<_> = report
                .rejected
                .iter()
                .map(|fault| serde_json::json!({ "code": fault.code(), "detail": fault.to_string() }))
                .collect();
            let json = serde_json::json!({
                "files": report.files,
                "valid": report.valid,
                "rejected": rejected,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
    }

    Ok(if report.is_clean() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn cmd_config(out: &OutputContext<'_>, config: &AppConfig, action: ConfigAction) -> Result<ExitCode> {
    match action {
        ConfigAction::Show => match out.format {
            OutputFormat::Text => println!("{}", config.to_toml()?),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(config)?),
        },
        ConfigAction::Get { section, key } => {
            let value = config.lookup(&section, &key).ok_or_else(|| {
                MissionControlError::Config(format!("unknown setting {}.{}", section, key))
            })?;
            println!("{}", value);
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn unreadable_folder(config: &AppConfig) -> MissionControlError {
    MissionControlError::Config(format!(
        "mission folder {} could not be read",
        config.mission.folder.display()
    ))
}
