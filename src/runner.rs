use flume::SendError;
use flume::Sender;
use thiserror::Error;

use crate::asserter::Assertion;
use crate::profile::CapturedResponse;
use crate::profile::RequestProfile;
use crate::scenario::Scenario;

#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("channel error")]
    ChannelError(#[from] SendError<RunnerResult>),
}

#[derive(Debug)]
pub struct RunnerResult {
    pub name: String,
    pub method: String,
    pub path: String,
    pub response: Option<CapturedResponse>,
    pub error: Option<String>,
    pub assertions: Vec<Assertion>,
}

/// Sends every scenario through the profile, one at a time and in order, and
/// forwards what came back to the asserter. A scenario that can't be sent is
/// reported with its error and the run carries on.
pub async fn run_scenarios(
    profile: &RequestProfile,
    scenarios: Vec<Scenario>,
    tx: Sender<RunnerResult>,
) -> Result<(), RunnerError> {
    for scenario in scenarios {
        let method = scenario.method.to_string();
        let assertions = Assertion::for_scenario(&scenario);

        tracing::debug!(name = %scenario.name, %method, path = %scenario.path, "running scenario");

        let result = profile
            .apply(scenario.method, &scenario.path, scenario.body.as_ref())
            .await;

        let runner_result = match result {
            Ok(response) => RunnerResult {
                name: scenario.name,
                method,
                path: scenario.path,
                response: Some(response),
                error: None,
                assertions,
            },
            Err(err) => RunnerResult {
                name: scenario.name,
                method,
                path: scenario.path,
                response: None,
                error: Some(err.to_string()),
                assertions,
            },
        };

        tx.send_async(runner_result).await?;
    }

    Ok(())
}
