//! Black-box scenarios for the reqres.in registration, login and user
//! endpoints.
//!
//! Every scenario goes through one shared [`RequestProfile`] and a three
//! stage pipeline:
//! - **Runner:** sends each scenario, in order, and captures the response.
//! - **Asserter:** checks status, content type and JSON paths.
//! - **Outputter:** prints pass/fail lines and returns a [`Summary`].

use indicatif::ProgressDrawTarget;
use miette::Diagnostic;
use thiserror::Error;

use crate::asserter::Asserter;
use crate::asserter::AsserterError;
use crate::asserter::ScenarioReport;
use crate::outputter::OutPutter;
use crate::runner::RunnerError;
use crate::runner::RunnerResult;
use crate::runner::run_scenarios;
use crate::scenario::JsonPathError;
use crate::validator::ValidationError;

pub mod asserter;
pub mod catalog;
pub mod cli;
pub mod logging;
pub mod outputter;
pub mod parser;
pub mod profile;
pub mod runner;
pub mod scenario;
pub mod validator;

pub use crate::outputter::Summary;
pub use crate::profile::RequestProfile;
pub use crate::scenario::Scenario;

#[derive(Error, Debug, Diagnostic)]
pub enum QuestError {
    #[error("Failed to read toml file")]
    FileError(#[from] std::io::Error),

    #[error("Failed to parse toml file")]
    TomlParsing(#[from] toml::de::Error),

    #[error(transparent)]
    #[diagnostic(transparent)]
    ValidationError(#[from] ValidationError),

    #[error("Failed to build the request profile: {0}")]
    Profile(#[from] profile::ProfileError),

    #[error("Invalid scenario: {0}")]
    Scenario(#[from] JsonPathError),

    #[error("Runner stopped: {0}")]
    Runner(#[from] RunnerError),

    #[error("Failed in assert step: {0}")]
    AssertError(#[from] AsserterError),

    #[error("A pipeline task panicked: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Runs `scenarios` through the runner, asserter and outputter tasks and
/// waits for all three.
pub async fn run_suite(
    profile: RequestProfile,
    scenarios: Vec<Scenario>,
    target: ProgressDrawTarget,
) -> Result<Summary, QuestError> {
    let n_tests = scenarios.len();
    let base_url = profile.base_url().to_owned();

    let (runner_tx, asserter_rx) = flume::unbounded::<RunnerResult>();
    let (asserter_tx, outputter_rx) = flume::unbounded::<ScenarioReport>();

    let outputter_jh =
        tokio::spawn(async move { OutPutter::start(outputter_rx, &base_url, n_tests, target).await });

    let runner_jh =
        tokio::spawn(async move { run_scenarios(&profile, scenarios, runner_tx).await });

    let asserter_jh = tokio::spawn(async move { Asserter::run(asserter_rx, asserter_tx).await });

    let (runner, asserter, outputter) = futures::join!(runner_jh, asserter_jh, outputter_jh);
    runner??;
    asserter??;

    Ok(outputter?)
}
