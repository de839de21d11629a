//! A tutoring session: navigator state plus a notification sink.
//!
//! The session starts in [`SessionPhase::Loading`] until a catalog is
//! delivered; commands issued before then fail with
//! [`SessionError::CatalogPending`]. A failed or empty catalog falls back
//! to the built-in tutorial and is reported through the sink.
//!
//! Runs may be split into [`TutorSession::begin_run`] and
//! [`TutorSession::complete_run`] so a host can evaluate on another
//! thread. Only one run may be in flight.

use crate::catalog::CatalogStore;
use crate::error::{CatalogError, SessionError};
use crate::navigator::{Transition, TutorState};
use crate::notify::{self, NotificationSink};
use crate::provider::CatalogProvider;
use crate::tutorial::{Tutorial, TutorialId};
use scriptlab_eval::{ExecutionResult, Sandbox};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Loading,
    Ready,
}

/// A run handed out by [`TutorSession::begin_run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunTicket {
    pub script: String,
    tutorial: TutorialId,
    generation: u64,
}

#[derive(Debug)]
pub struct TutorSession<S: NotificationSink> {
    state: Option<TutorState>,
    sandbox: Sandbox,
    sink: S,
    in_flight: Option<RunTicket>,
    /// Bumped on every navigation and reload so stale results are dropped.
    generation: u64,
}

impl<S: NotificationSink> TutorSession<S> {
    pub fn new(sandbox: Sandbox, sink: S) -> Self {
        Self {
            state: None,
            sandbox,
            sink,
            in_flight: None,
            generation: 0,
        }
    }

    /// Create a session and load it from `provider` straight away.
    pub fn load(sandbox: Sandbox, sink: S, provider: &dyn CatalogProvider) -> Self {
        let mut session = Self::new(sandbox, sink);
        session.reload(provider);
        session
    }

    pub fn phase(&self) -> SessionPhase {
        match self.state {
            Some(_) => SessionPhase::Ready,
            None => SessionPhase::Loading,
        }
    }

    pub fn state(&self) -> Result<&TutorState, SessionError> {
        self.state.as_ref().ok_or(SessionError::CatalogPending)
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn sandbox(&self) -> &Sandbox {
        &self.sandbox
    }

    pub fn is_running(&self) -> bool {
        self.in_flight.is_some()
    }

    // ── Loading ──────────────────────────────────────────────────────────

    /// Fetch from `provider` and replace the catalog wholesale.
    pub fn reload(&mut self, provider: &dyn CatalogProvider) {
        tracing::info!(source = %provider.describe(), "loading tutorial catalog");
        let fetched = provider.fetch_all();
        self.finish_loading(fetched);
    }

    /// Deliver a fetched catalog. Errors and empty lists fall back to the
    /// built-in tutorial.
    pub fn finish_loading(&mut self, fetched: Result<Vec<Tutorial>, CatalogError>) {
        let catalog = match fetched {
            Ok(tutorials) => CatalogStore::new(tutorials),
            Err(err) => {
                tracing::warn!(error = %err, "tutorial catalog unavailable, using the built-in tutorial");
                self.sink.error(notify::LOAD_FAILED_MESSAGE);
                CatalogStore::fallback()
            }
        };
        tracing::info!(tutorials = catalog.len(), "tutorial catalog ready");
        self.generation += 1;
        self.in_flight = None;
        self.state = Some(TutorState::new(catalog));
    }

    // ── Commands ─────────────────────────────────────────────────────────

    fn apply(&mut self, transition: Transition) {
        for event in transition.events {
            self.sink.notify(event);
        }
        self.state = Some(transition.state);
    }

    fn navigate(
        &mut self,
        step: impl FnOnce(&TutorState) -> Result<Transition, SessionError>,
    ) -> Result<(), SessionError> {
        let current = self.state()?;
        let transition = step(current)?;
        // A no-op at a catalog boundary leaves any run in flight current.
        if transition.state != *current {
            self.generation += 1;
        }
        self.apply(transition);
        Ok(())
    }

    pub fn goto_index(&mut self, index: usize) -> Result<(), SessionError> {
        self.navigate(|s| Ok(s.goto_index(index)))
    }

    pub fn try_goto(&mut self, index: usize) -> Result<(), SessionError> {
        self.navigate(|s| Ok(s.try_goto(index)?))
    }

    pub fn goto_id(&mut self, id: TutorialId) -> Result<(), SessionError> {
        self.navigate(|s| Ok(s.goto_id(id)?))
    }

    pub fn next(&mut self) -> Result<(), SessionError> {
        self.navigate(|s| Ok(s.next()))
    }

    pub fn prev(&mut self) -> Result<(), SessionError> {
        self.navigate(|s| Ok(s.prev()))
    }

    /// Restore the tutorial's code. Always invalidates a run in flight.
    pub fn reset_script(&mut self) -> Result<(), SessionError> {
        let transition = self.state()?.reset_script();
        self.generation += 1;
        self.apply(transition);
        Ok(())
    }

    pub fn toggle_hint(&mut self) -> Result<(), SessionError> {
        let transition = self.state()?.toggle_hint();
        self.apply(transition);
        Ok(())
    }

    pub fn edit_script(&mut self, script_text: impl Into<String>) -> Result<(), SessionError> {
        let transition = self.state()?.edit_script(script_text);
        self.apply(transition);
        Ok(())
    }

    // ── Running ──────────────────────────────────────────────────────────

    /// Reserve the run slot and hand out the script to evaluate.
    pub fn begin_run(&mut self) -> Result<RunTicket, SessionError> {
        let state = self.state()?;
        if self.in_flight.is_some() {
            return Err(SessionError::RunInProgress);
        }
        let ticket = RunTicket {
            script: state.script().to_string(),
            tutorial: state.current().id,
            generation: self.generation,
        };
        self.in_flight = Some(ticket.clone());
        Ok(ticket)
    }

    /// Record the result of the run started with `ticket`. A result for a
    /// tutorial the user has since navigated away from is discarded.
    pub fn complete_run(&mut self, ticket: RunTicket, result: ExecutionResult) -> Result<(), SessionError> {
        if self.in_flight.as_ref() != Some(&ticket) {
            return Err(SessionError::NoRunInProgress);
        }
        self.in_flight = None;
        let state = self.state()?;
        if ticket.generation != self.generation || ticket.tutorial != state.current().id {
            tracing::debug!(tutorial = ticket.tutorial, "discarding result of a stale run");
            return Ok(());
        }
        let transition = state.apply_result(result);
        self.apply(transition);
        Ok(())
    }

    /// Run the editor script to completion in this session's sandbox.
    pub fn run(&mut self) -> Result<&ExecutionResult, SessionError> {
        let ticket = self.begin_run()?;
        let result = self.sandbox.execute(&ticket.script);
        self.complete_run(ticket, result)?;
        self.state()?
            .last_result()
            .ok_or(SessionError::NoRunInProgress)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{NotificationLevel, RecordingSink};
    use crate::provider::StaticProvider;

    fn loaded() -> TutorSession<RecordingSink> {
        let provider = StaticProvider::new(vec![
            Tutorial::new(1, "One", "log('one')").with_expected_output("one"),
            Tutorial::new(2, "Two", "log('two')"),
        ]);
        TutorSession::load(Sandbox::default(), RecordingSink::new(), &provider)
    }

    #[test]
    fn test_commands_rejected_while_loading() {
        let mut session = TutorSession::new(Sandbox::default(), RecordingSink::new());
        assert_eq!(session.phase(), SessionPhase::Loading);
        assert_eq!(session.next(), Err(SessionError::CatalogPending));
        assert_eq!(session.run().err(), Some(SessionError::CatalogPending));
        session.finish_loading(Ok(Vec::new()));
        assert_eq!(session.phase(), SessionPhase::Ready);
    }

    #[test]
    fn test_second_run_rejected_while_in_flight() {
        let mut session = loaded();
        let ticket = session.begin_run().unwrap();
        assert_eq!(session.begin_run(), Err(SessionError::RunInProgress));
        let result = session.sandbox().execute(&ticket.script);
        session.complete_run(ticket, result).unwrap();
        assert!(!session.is_running());
        assert!(session.state().unwrap().last_result().unwrap().matched_expected);
    }

    #[test]
    fn test_stale_result_is_dropped() {
        let mut session = loaded();
        let ticket = session.begin_run().unwrap();
        session.next().unwrap();
        let result = session.sandbox().execute(&ticket.script);
        session.complete_run(ticket, result).unwrap();
        assert!(session.state().unwrap().last_result().is_none());
    }

    #[test]
    fn test_boundary_navigation_keeps_run_in_flight() {
        let mut session = loaded();
        session.next().unwrap();
        let ticket = session.begin_run().unwrap();
        session.next().unwrap();
        session.goto_index(9).unwrap();
        assert_eq!(session.state().unwrap().cursor(), 1);
        let result = session.sandbox().execute(&ticket.script);
        session.complete_run(ticket, result).unwrap();
        let kept = session.state().unwrap().last_result().unwrap();
        assert_eq!(kept.output_lines, vec!["two"]);
    }

    #[test]
    fn test_prev_at_first_keeps_run_in_flight() {
        let mut session = loaded();
        let ticket = session.begin_run().unwrap();
        session.prev().unwrap();
        let result = session.sandbox().execute(&ticket.script);
        session.complete_run(ticket, result).unwrap();
        assert!(session.state().unwrap().last_result().is_some());
    }

    #[test]
    fn test_reset_drops_run_in_flight() {
        let mut session = loaded();
        let ticket = session.begin_run().unwrap();
        session.reset_script().unwrap();
        let result = session.sandbox().execute(&ticket.script);
        session.complete_run(ticket, result).unwrap();
        assert!(session.state().unwrap().last_result().is_none());
    }

    #[test]
    fn test_load_failure_notifies_and_falls_back() {
        let mut session = TutorSession::new(Sandbox::default(), RecordingSink::new());
        session.finish_loading(Err(CatalogError::Provider("offline".to_string())));
        let state = session.state().unwrap();
        assert_eq!(state.catalog().len(), 1);
        assert_eq!(state.current(), &Tutorial::fallback());
        let last = session.sink().last().unwrap();
        assert_eq!(last.level, NotificationLevel::Error);
        assert_eq!(last.message, "Failed to load tutorials");
    }
}
