//! Runs a whole scenario: fixtures, spawn, steps, exit and cleanup.

use super::Scenario;
use super::driver::Driver;
use super::verdict::Verdict;
use crate::error::{ExpectError, Result};
use crate::report::Report;
use crate::session::Session;

/// Label of the verdict recorded when the first prompt never appears.
pub const STARTUP_LABEL: &str = "startup";

/// Progress of a runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// `run` has not been called.
    NotStarted,
    /// Executing the step with this index.
    Running(usize),
    /// The report has been produced.
    Completed,
}

/// Executes a [`Scenario`] once.
#[derive(Debug)]
pub struct Runner {
    scenario: Scenario,
    state: RunState,
}

impl Runner {
    /// A runner for `scenario`.
    #[must_use]
    pub const fn new(scenario: Scenario) -> Self {
        Self {
            scenario,
            state: RunState::NotStarted,
        }
    }

    /// Current progress.
    #[must_use]
    pub const fn state(&self) -> RunState {
        self.state
    }

    /// The scenario being run.
    #[must_use]
    pub const fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    /// Run the scenario and report every step.
    ///
    /// Failed steps do not stop the run. The run is cut short, with the
    /// cause in [`Report::fatal`], when input can no longer be delivered or
    /// the program does not exit. Errors are returned only when nothing ran:
    /// fixtures could not be prepared or the program could not be spawned.
    /// Fixtures are removed and the program is released on every path.
    pub async fn run(&mut self) -> Result<Report> {
        if self.state != RunState::NotStarted {
            return Err(ExpectError::config("scenario has already been run"));
        }

        let scenario = &self.scenario;
        let _guard = scenario.fixtures.guard();
        scenario.fixtures.prepare()?;

        tracing::info!(scenario = %scenario.name, steps = scenario.steps.len(), "starting scenario");
        let mut session = Session::spawn_with_config(scenario.session.clone()).inspect_err(|e| {
            tracing::error!(error = %e, "failed to spawn program under test");
        })?;

        let mut report = Report::new(&scenario.name);
        Self::drive(scenario, &mut self.state, &mut session, &mut report).await;

        match session.close().await {
            Ok(status) => report.exit_status = status,
            Err(e) => {
                tracing::warn!(error = %e, "failed to release program under test");
                if report.fatal.is_none() {
                    report.fatal = Some(format!("cleanup: {e}"));
                }
            }
        }

        self.state = RunState::Completed;
        tracing::info!(
            scenario = %report.scenario,
            passed = report.passed(),
            failed = report.failed(),
            "scenario finished"
        );
        Ok(report)
    }

    async fn drive(scenario: &Scenario, state: &mut RunState, session: &mut Session, report: &mut Report) {
        let mut driver = Driver::new(session, scenario.prompt.clone());

        if let Err(e) = driver.await_prompt().await {
            if e.is_fatal() {
                report.fatal = Some(format!("{STARTUP_LABEL}: {e}"));
                return;
            }
            report
                .verdicts
                .push(Verdict::from_error(STARTUP_LABEL, scenario.prompt.as_str(), &e));
        }

        for (index, step) in scenario.steps.iter().enumerate() {
            *state = RunState::Running(index);
            match driver.run_step(step).await {
                Ok(verdict) => report.verdicts.push(verdict),
                Err(e) => {
                    tracing::error!(label = %step.label, error = %e, "aborting scenario");
                    report.fatal = Some(format!("{}: {e}", step.label));
                    return;
                }
            }
        }

        if let Err(e) = Self::exit(scenario, driver.session()).await {
            tracing::warn!(error = %e, "program did not exit cleanly");
            report.fatal = Some(format!("exit: {e}"));
        }
    }

    async fn exit(scenario: &Scenario, session: &mut Session) -> Result<()> {
        let timeout = session.config().timeout.exit;
        session.send_line(&scenario.exit_command).await?;
        session.expect_eof(timeout).await?;
        let status = session.wait_exit(timeout).await?;
        tracing::debug!(%status, "program exited");
        Ok(())
    }
}
