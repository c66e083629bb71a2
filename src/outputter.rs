use console::Style;
use flume::Receiver;
use indicatif::ProgressBar;
use indicatif::ProgressDrawTarget;
use indicatif::ProgressStyle;

use crate::asserter::AssertResult;
use crate::asserter::ScenarioReport;
use crate::asserter::TestResult;

pub struct OutPutter;

/// Scenario level counts. A scenario passes only when all of its assertions do.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub passed: usize,
    pub failed: usize,
}

impl Summary {
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

impl OutPutter {
    pub async fn start(
        rx: Receiver<ScenarioReport>,
        base_url: &str,
        n_tests: usize,
        target: ProgressDrawTarget,
    ) -> Summary {
        let style = Style::new().bold().cyan();
        let open_text =
            format!("Running scenarios against: {base_url} Found {n_tests} scenarios: Running...");

        let bar = ProgressBar::with_draw_target(Some(n_tests as u64), target);
        bar.set_style(
            ProgressStyle::with_template("{bar:30.cyan/blue} {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        println!("{}", style.apply_to(open_text));

        let mut i = 1;
        let mut summary = Summary::default();
        let mut failed_tests: Vec<(String, AssertResult)> = vec![];

        while let Ok((name, path, method, result)) = rx.recv_async().await {
            bar.set_message(name.clone());
            let mut scenario_failed = false;

            for r in result.iter() {
                match r.status {
                    TestResult::Pass => print_line(&bar, format!(
                        "[{i}/{n_tests}] {}  {method} {path} {name}: {}, {} {}",
                        console::style("✔").green().bold(),
                        r.expected,
                        r.actual,
                        console::style("PASS!").green().bold(),
                    )),
                    TestResult::Fail => {
                        scenario_failed = true;
                        failed_tests.push((name.clone(), r.clone()));
                        print_line(&bar, format!(
                            "[{i}/{n_tests}] {}  {method} {path} {name}: {} {}",
                            console::style("╳").red().bold(),
                            r.expected,
                            console::style("FAILED!").red().bold(),
                        ))
                    }
                }
            }

            if scenario_failed {
                summary.failed += 1;
            } else {
                summary.passed += 1;
            }

            bar.inc(1);
            i += 1;
        }

        bar.finish_and_clear();

        if !failed_tests.is_empty() {
            println!();
            println!(
                "{}",
                console::style("Summary of Failed Tests:").bold().red()
            );
            for (idx, result) in failed_tests.iter().enumerate() {
                println!("\n{} {}. {}", idx + 1, result.0, result.1);
            }
        } else if summary.passed > 0 {
            println!();
            println!("{}", console::style("All tests passed! 🎉").bold().green());
        }

        println!(
            "\n{} passed, {} failed",
            console::style(summary.passed).green().bold(),
            console::style(summary.failed).red().bold(),
        );

        summary
    }
}

// Lines go to stdout even when the bar itself is hidden
fn print_line(bar: &ProgressBar, line: String) {
    bar.suspend(|| println!("{line}"));
}
