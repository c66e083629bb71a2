use core::fmt;
use std::fmt::Display;
use std::sync::Arc;

use flume::Receiver;
use flume::Sender;
use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

use crate::profile::CapturedResponse;
use crate::runner::RunnerResult;
use crate::scenario::JsonPath;
use crate::scenario::Predicate;
use crate::scenario::Scenario;

/// Name, path, method and the outcome of every assertion of one scenario.
pub type ScenarioReport = (String, String, String, Arc<[AssertResult]>);

pub struct Asserter {}

#[derive(Debug, Error)]
#[error("outputter hung up before all results were delivered")]
pub struct AsserterError;

#[derive(Debug, Clone)]
pub enum Assertion {
    Status(u16),
    ContentType(String),
    Json { path: JsonPath, predicate: Predicate },
    RequestFailed,
}

impl Assertion {
    /// Status first, then the JSON content type every response must carry,
    /// then the body assertions in declaration order.
    pub fn for_scenario(scenario: &Scenario) -> Vec<Assertion> {
        let mut assertions = vec![
            Assertion::Status(scenario.expected_status),
            Assertion::ContentType(crate::profile::JSON.into()),
        ];

        assertions.extend(
            scenario
                .expectations
                .iter()
                .map(|(path, predicate)| Assertion::Json {
                    path: path.clone(),
                    predicate: predicate.clone(),
                }),
        );

        assertions
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum TestResult {
    Pass,
    Fail,
}

#[derive(Debug, Clone)]
pub struct AssertResult {
    pub status: TestResult,
    pub expected: Assertion,
    pub actual: Actual,
}

#[derive(Debug, Clone)]
pub enum Actual {
    Status(StatusCode),
    ContentType(Option<String>),
    Json(Option<Value>),
    Unparsable(String),
    RequestFailed(String),
}

impl Display for AssertResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.status, &self.expected, &self.actual) {
            (TestResult::Pass, _, actual) => {
                write!(
                    f,
                    "{} {} {}",
                    console::style("✔").green().bold(),
                    console::style("PASS!").green().bold(),
                    actual
                )
            }

            (TestResult::Fail, Assertion::Status(exp), Actual::Status(act)) => {
                write!(
                    f,
                    "{} {}\n  Expected: {}\n  Actual:   {}",
                    console::style("✘").red().bold(),
                    console::style("FAIL!").red().bold(),
                    console::style(format!("Expected status {}", exp)).green(),
                    console::style(format!("Got status {}", act)).red(),
                )
            }

            (TestResult::Fail, Assertion::ContentType(exp), Actual::ContentType(act)) => {
                write!(
                    f,
                    "{} {}\n  Expected: {}\n  Actual:   {}",
                    console::style("✘").red().bold(),
                    console::style("FAIL!").red().bold(),
                    console::style(format!("Content type {exp}")).green(),
                    console::style(format!(
                        "Content type {}",
                        act.as_deref().unwrap_or("<missing>")
                    ))
                    .red(),
                )
            }

            (TestResult::Fail, Assertion::Json { path, predicate }, Actual::Json(actual)) => {
                writeln!(
                    f,
                    "{} {}",
                    console::style("✘").red().bold(),
                    console::style("FAIL!").red().bold(),
                )?;
                writeln!(
                    f,
                    "  {} {} {}",
                    console::style("Expected:").green(),
                    console::style(path).yellow().bold(),
                    console::style(predicate).green()
                )?;
                match actual {
                    Some(value) => writeln!(
                        f,
                        "  {} {}",
                        console::style("Actual:").red(),
                        console::style(serde_json::to_string_pretty(value).unwrap_or_default())
                            .red()
                    ),
                    None => writeln!(
                        f,
                        "  {} {}",
                        console::style("Actual:").red(),
                        console::style("<path not found>").red().bold()
                    ),
                }
            }

            (TestResult::Fail, Assertion::Json { path, .. }, Actual::Unparsable(body)) => {
                writeln!(
                    f,
                    "{} {}",
                    console::style("✘").red().bold(),
                    console::style("FAIL!").red().bold(),
                )?;
                writeln!(
                    f,
                    "  {} {}",
                    console::style("Could not read JSON for").red(),
                    console::style(path).yellow().bold()
                )?;
                writeln!(f, "  {}", console::style("Body:").red())?;
                writeln!(f, "    {}", console::style(body).dim())
            }

            (TestResult::Fail, _, Actual::RequestFailed(err)) => {
                writeln!(
                    f,
                    "{} {}",
                    console::style("✘").red().bold(),
                    console::style("FAIL!").red().bold(),
                )?;
                writeln!(
                    f,
                    "  {} {}",
                    console::style("Request failed with error:").red(),
                    console::style(err).red().bold()
                )
            }

            _ => {
                writeln!(
                    f,
                    "{} {} (unhandled combination)",
                    console::style("⚠").yellow(),
                    console::style("UNKNOWN RESULT").yellow().bold()
                )
            }
        }
    }
}

impl Display for Assertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Assertion::Status(_) => write!(f, "Status test"),
            Assertion::ContentType(_) => write!(f, "Content type test"),
            Assertion::Json { path, predicate } => write!(f, "JSON test `{path}` {predicate}"),
            Assertion::RequestFailed => write!(f, "Request failed"),
        }
    }
}

impl Display for Actual {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Actual::Status(status_code) => write!(f, "Got status {}", status_code),
            Actual::ContentType(Some(ct)) => write!(f, "Got content type {ct}"),
            Actual::ContentType(None) => write!(f, "Got no content type"),
            Actual::Json(Some(value)) => {
                write!(f, "Got json: {}", truncate(&value.to_string(), MAX_ACTUAL_LEN))
            }
            Actual::Json(None) => write!(f, "Got nothing at path"),
            Actual::Unparsable(_) => write!(f, "Got a body that is not JSON"),
            Actual::RequestFailed(_) => write!(f, "Request failed"),
        }
    }
}

const MAX_ACTUAL_LEN: usize = 60;

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_owned(),
    }
}

pub trait Assert {
    fn assert(&self) -> Arc<[AssertResult]>;
}

impl Assert for RunnerResult {
    fn assert(&self) -> Arc<[AssertResult]> {
        let response = match (&self.response, &self.error) {
            (Some(response), None) => response,
            (_, error) => {
                return Arc::from([AssertResult {
                    status: TestResult::Fail,
                    expected: Assertion::RequestFailed,
                    actual: Actual::RequestFailed(error.clone().unwrap_or_default()),
                }]);
            }
        };

        Arc::from(
            self.assertions
                .iter()
                .map(|a| check(a, response))
                .collect::<Vec<AssertResult>>(),
        )
    }
}

fn check(assertion: &Assertion, response: &CapturedResponse) -> AssertResult {
    let (status, actual) = match assertion {
        Assertion::Status(expected) => (
            assert_status(*expected, response.status),
            Actual::Status(response.status),
        ),
        Assertion::ContentType(expected) => {
            let got = response.content_type();
            (
                assert_content_type(expected, got),
                Actual::ContentType(got.map(str::to_owned)),
            )
        }
        Assertion::Json { path, predicate } => match &response.body_json {
            Some(body) => {
                let got = path.resolve(body);
                (
                    to_result(predicate.holds(got)),
                    Actual::Json(got.cloned()),
                )
            }
            None => (
                TestResult::Fail,
                Actual::Unparsable(response.body_text.clone()),
            ),
        },
        Assertion::RequestFailed => (TestResult::Fail, Actual::RequestFailed(String::new())),
    };

    AssertResult {
        status,
        expected: assertion.clone(),
        actual,
    }
}

impl Asserter {
    pub async fn run(
        rx: Receiver<RunnerResult>,
        output_tx: Sender<ScenarioReport>,
    ) -> Result<(), AsserterError> {
        while let Ok(msg) = rx.recv_async().await {
            let assert_result = msg.assert();

            output_tx
                .send_async((msg.name, msg.path, msg.method, assert_result))
                .await
                .map_err(|_| AsserterError)?;
        }

        Ok(())
    }
}

fn to_result(passed: bool) -> TestResult {
    if passed {
        TestResult::Pass
    } else {
        TestResult::Fail
    }
}

fn assert_content_type(expected: &str, got: Option<&str>) -> TestResult {
    // ignores parameters such as `; charset=utf-8`
    let essence = got
        .and_then(|ct| ct.split(';').next())
        .map(|ct| ct.trim().to_ascii_lowercase());

    to_result(essence.as_deref() == Some(expected))
}

fn assert_status(expected: u16, status: StatusCode) -> TestResult {
    to_result(status.as_u16() == expected)
}
