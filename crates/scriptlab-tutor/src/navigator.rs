//! Tutorial navigator state machine.
//!
//! [`TutorState`] is an owned, immutable-by-convention record. Every
//! operation borrows the current state and returns a [`Transition`]: the
//! next state plus the notifications the step produced. Callers decide
//! where notifications go and when to replace their state.
//!
//! Navigation re-seeds the editor from the target tutorial's code, clears
//! the last result and hides the hint. Running leaves cursor and hint
//! untouched.

use crate::catalog::{CatalogStore, Progress};
use crate::error::NavigationError;
use crate::matcher;
use crate::notify::{self, Notification};
use crate::tutorial::{Tutorial, TutorialId};
use scriptlab_eval::{ExecutionResult, Sandbox};

/// Editor contents and hint visibility.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorState {
    pub script_text: String,
    pub hint_visible: bool,
}

impl EditorState {
    fn seeded(tutorial: &Tutorial) -> Self {
        Self {
            script_text: tutorial.code.clone(),
            hint_visible: false,
        }
    }

    /// Lines shown in the editor gutter. An empty script still has one.
    pub fn line_count(&self) -> usize {
        self.script_text.split('\n').count()
    }
}

/// The whole navigator state.
#[derive(Debug, Clone, PartialEq)]
pub struct TutorState {
    catalog: CatalogStore,
    editor: EditorState,
    last_result: Option<ExecutionResult>,
}

/// Next state plus the notifications raised getting there.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: TutorState,
    pub events: Vec<Notification>,
}

impl Transition {
    fn quiet(state: TutorState) -> Self {
        Self {
            state,
            events: Vec::new(),
        }
    }

    fn with_event(state: TutorState, event: Notification) -> Self {
        Self {
            state,
            events: vec![event],
        }
    }
}

impl TutorState {
    /// Initial state: the catalog's current tutorial in the editor, hint
    /// hidden, no result.
    pub fn new(catalog: CatalogStore) -> Self {
        let editor = EditorState::seeded(catalog.current());
        Self {
            catalog,
            editor,
            last_result: None,
        }
    }

    pub fn catalog(&self) -> &CatalogStore {
        &self.catalog
    }

    pub fn editor(&self) -> &EditorState {
        &self.editor
    }

    pub fn cursor(&self) -> usize {
        self.catalog.cursor()
    }

    pub fn current(&self) -> &Tutorial {
        self.catalog.current()
    }

    pub fn script(&self) -> &str {
        &self.editor.script_text
    }

    pub fn hint_visible(&self) -> bool {
        self.editor.hint_visible
    }

    /// The active tutorial's hint, or the no-hint message.
    pub fn hint_text(&self) -> &str {
        self.current().hint_text()
    }

    /// Hint text if the hint is currently shown.
    pub fn visible_hint(&self) -> Option<&str> {
        self.editor.hint_visible.then(|| self.hint_text())
    }

    pub fn last_result(&self) -> Option<&ExecutionResult> {
        self.last_result.as_ref()
    }

    pub fn progress(&self) -> Progress {
        self.catalog.progress()
    }

    // ── Navigation ───────────────────────────────────────────────────────

    /// Select tutorial `index`. Out-of-range indices are ignored.
    pub fn goto_index(&self, index: usize) -> Transition {
        self.try_goto(index)
            .unwrap_or_else(|_| Transition::quiet(self.clone()))
    }

    /// Select tutorial `index`, rejecting out-of-range indices.
    pub fn try_goto(&self, index: usize) -> Result<Transition, NavigationError> {
        let mut catalog = self.catalog.clone();
        if !catalog.select(index) {
            return Err(NavigationError::InvalidIndex {
                index,
                len: catalog.len(),
            });
        }
        let state = TutorState::new(catalog);
        tracing::info!(
            index,
            id = state.current().id,
            title = %state.current().title,
            "tutorial selected"
        );
        let event = Notification::info(notify::loaded_message(&state.current().title));
        Ok(Transition::with_event(state, event))
    }

    pub fn goto_id(&self, id: TutorialId) -> Result<Transition, NavigationError> {
        let index = self
            .catalog
            .position_of(id)
            .ok_or(NavigationError::UnknownId(id))?;
        self.try_goto(index)
    }

    /// Move to the next tutorial; a no-op on the last one.
    pub fn next(&self) -> Transition {
        self.goto_index(self.cursor() + 1)
    }

    /// Move to the previous tutorial; a no-op on the first one.
    pub fn prev(&self) -> Transition {
        match self.cursor().checked_sub(1) {
            Some(index) => self.goto_index(index),
            None => Transition::quiet(self.clone()),
        }
    }

    // ── Editing ──────────────────────────────────────────────────────────

    /// Restore the active tutorial's code, clear the result, hide the hint.
    pub fn reset_script(&self) -> Transition {
        let state = TutorState::new(self.catalog.clone());
        Transition::with_event(state, Notification::info(notify::RESET_MESSAGE))
    }

    pub fn toggle_hint(&self) -> Transition {
        let mut state = self.clone();
        state.editor.hint_visible = !state.editor.hint_visible;
        Transition::quiet(state)
    }

    /// Replace the editor text. The last result stays until the next run.
    pub fn edit_script(&self, script_text: impl Into<String>) -> Transition {
        let mut state = self.clone();
        state.editor.script_text = script_text.into();
        Transition::quiet(state)
    }

    // ── Running ──────────────────────────────────────────────────────────

    /// Run the editor script in `sandbox` and record the result.
    pub fn run(&self, sandbox: &Sandbox) -> Transition {
        self.apply_result(sandbox.execute(self.script()))
    }

    /// Record a result produced elsewhere for the current script, checking
    /// it against the active tutorial's expected output.
    pub fn apply_result(&self, result: ExecutionResult) -> Transition {
        let result = matcher::check(result, self.current().expected_output.as_deref());
        let event = if !result.is_success() {
            Some(Notification::error(notify::FAULT_MESSAGE))
        } else if result.matched_expected {
            Some(Notification::success(notify::MATCH_MESSAGE))
        } else {
            None
        };
        let mut state = self.clone();
        state.last_result = Some(result);
        Transition {
            state,
            events: event.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> TutorState {
        TutorState::new(CatalogStore::new(vec![
            Tutorial::new(10, "First", "log(1)").with_expected_output("1"),
            Tutorial::new(20, "Second", "log(2)").with_hint("print two"),
        ]))
    }

    #[test]
    fn test_initial_state() {
        let s = state();
        assert_eq!(s.cursor(), 0);
        assert_eq!(s.script(), "log(1)");
        assert!(!s.hint_visible());
        assert!(s.last_result().is_none());
    }

    #[test]
    fn test_goto_reseeds_editor() {
        let s = state().toggle_hint().state.edit_script("changed").state;
        let t = s.goto_index(1);
        assert_eq!(t.state.cursor(), 1);
        assert_eq!(t.state.script(), "log(2)");
        assert!(!t.state.hint_visible());
        assert_eq!(t.events, vec![Notification::info("Loaded: Second")]);
    }

    #[test]
    fn test_invalid_goto() {
        let s = state();
        let t = s.goto_index(5);
        assert_eq!(t.state, s);
        assert!(t.events.is_empty());
        assert_eq!(
            s.try_goto(5),
            Err(NavigationError::InvalidIndex { index: 5, len: 2 })
        );
        assert_eq!(s.goto_id(99), Err(NavigationError::UnknownId(99)));
        assert_eq!(s.goto_id(20).map(|t| t.state.cursor()), Ok(1));
    }

    #[test]
    fn test_hint_text() {
        let s = state();
        assert_eq!(s.visible_hint(), None);
        let shown = s.toggle_hint().state;
        assert_eq!(shown.visible_hint(), Some("No hint available for this tutorial."));
        assert_eq!(shown.next().state.hint_text(), "print two");
    }

    #[test]
    fn test_line_count() {
        let s = state().edit_script("a\nb\n").state;
        assert_eq!(s.editor().line_count(), 3);
        assert_eq!(state().edit_script("").state.editor().line_count(), 1);
    }
}
