use std::process::ExitCode;

use clap::Parser;
use indicatif::ProgressDrawTarget;
use miette::Result;
use reqres_quest::QuestError;
use reqres_quest::catalog;
use reqres_quest::cli::Cli;
use reqres_quest::logging::init_tracing;
use reqres_quest::parser::QuestConfig;
use reqres_quest::run_suite;
use reqres_quest::validator::ProfileSettings;
use reqres_quest::validator::Validator;

/// Reads and validates the profile file. Without `--path` and without a
/// `reqres_quest.toml` in the working directory the built-in profile is used.
fn load_settings(cli: &Cli) -> Result<ProfileSettings, QuestError> {
    let Some(path) = cli.config_path() else {
        return Ok(ProfileSettings::default());
    };

    let contents = std::fs::read_to_string(&path).map_err(QuestError::FileError)?;
    let config: QuestConfig = toml::from_str(&contents).map_err(QuestError::TomlParsing)?;

    let settings = Validator::new(&config, contents.as_str(), path.as_str())
        .validate()
        .map_err(QuestError::ValidationError)?;

    Ok(settings)
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let mut settings = load_settings(&cli)?;
    if let Some(base_url) = &cli.base_url {
        settings.base_url = base_url.clone();
    }
    settings.verbose |= cli.verbose;

    init_tracing(settings.verbose);

    let scenarios = catalog::select(cli.filter.as_deref()).map_err(QuestError::Scenario)?;

    if cli.list {
        for scenario in &scenarios {
            println!("{} {} {}", scenario.method, scenario.path, scenario.name);
        }
        return Ok(ExitCode::SUCCESS);
    }

    let profile = settings
        .into_builder()
        .build()
        .map_err(QuestError::Profile)?;

    let summary = run_suite(profile, scenarios, ProgressDrawTarget::stderr()).await?;

    if summary.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
