//! Navigator and session behaviour tests.
//!
//! Covers:
//! - navigation transitions and their notifications
//! - boundary no-ops and explicit index errors
//! - reset / navigate round trips
//! - runs: match, mismatch and fault notifications
//! - session lifecycle with a recording sink

use scriptlab_tutor::{
    notify, CatalogStore, NavigationError, Notification, NotificationLevel, RecordingSink,
    Sandbox, SessionError, StaticProvider, Transition, TutorSession, TutorState, Tutorial,
};

// ══════════════════════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════════════════════

fn tutorials() -> Vec<Tutorial> {
    vec![
        Tutorial::new(1, "Hello", r#"log("Hello, World!")"#).with_expected_output("Hello, World!"),
        Tutorial::new(2, "Math", "console.log(6 * 7)")
            .with_expected_output("42")
            .with_hint("Multiply with *"),
        Tutorial::new(3, "Free", "log('anything')"),
    ]
}

fn start() -> TutorState {
    TutorState::new(CatalogStore::new(tutorials()))
}

/// Apply a sequence of steps, returning the final state.
fn walk(state: TutorState, steps: &[fn(&TutorState) -> Transition]) -> TutorState {
    steps.iter().fold(state, |s, step| step(&s).state)
}

fn session() -> TutorSession<RecordingSink> {
    TutorSession::load(
        Sandbox::default(),
        RecordingSink::new(),
        &StaticProvider::new(tutorials()),
    )
}

// ══════════════════════════════════════════════════════════════════════════════
// Navigation
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_goto_index_is_idempotent() {
    let once = start().goto_index(1).state;
    let twice = once.goto_index(1).state;
    assert_eq!(once, twice);
}

#[test]
fn test_next_at_last_is_noop() {
    let last = walk(start(), &[TutorState::next, TutorState::next]);
    assert_eq!(last.cursor(), 2);
    let t = last.next();
    assert_eq!(t.state, last);
    assert!(t.events.is_empty());
}

#[test]
fn test_prev_at_first_is_noop() {
    let t = start().prev();
    assert_eq!(t.state.cursor(), 0);
    assert!(t.events.is_empty());
}

#[test]
fn test_navigation_announces_title() {
    let t = start().next();
    assert_eq!(t.events, vec![Notification::info("Loaded: Math")]);
}

#[test]
fn test_try_goto_reports_range() {
    assert_eq!(
        start().try_goto(3),
        Err(NavigationError::InvalidIndex { index: 3, len: 3 })
    );
}

#[test]
fn test_reset_round_trip_reproduces_code() {
    let edited = start().edit_script("log('mine')").state;
    let away = edited.next().state;
    let reset = away.reset_script();
    assert_eq!(reset.events, vec![Notification::info(notify::RESET_MESSAGE)]);
    let back = reset.state.prev().state;
    assert_eq!(back.script(), r#"log("Hello, World!")"#);
}

#[test]
fn test_reset_keeps_cursor_and_clears_hint_and_result() {
    let s = walk(start(), &[TutorState::next, TutorState::toggle_hint]);
    let s = s.run(&Sandbox::default()).state.edit_script("x").state;
    assert!(s.last_result().is_some());
    let reset = s.reset_script().state;
    assert_eq!(reset.cursor(), 1);
    assert!(!reset.hint_visible());
    assert!(reset.last_result().is_none());
    assert_eq!(reset.script(), "console.log(6 * 7)");
}

#[test]
fn test_toggle_hint_twice_restores() {
    let s = start();
    let toggled = walk(s.clone(), &[TutorState::toggle_hint, TutorState::toggle_hint]);
    assert_eq!(toggled, s);
}

// ══════════════════════════════════════════════════════════════════════════════
// Running
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_hello_world_matches() {
    let t = start().run(&Sandbox::default());
    let result = t.state.last_result().unwrap();
    assert_eq!(result.output_lines, vec!["Hello, World!"]);
    assert!(result.matched_expected);
    assert_eq!(
        t.events,
        vec![Notification::success("Perfect! You got the expected output! 🎉")]
    );
}

#[test]
fn test_fault_notifies_error() {
    let s = start().edit_script("undefinedVar.prop").state;
    let t = s.run(&Sandbox::default());
    let result = t.state.last_result().unwrap();
    assert_eq!(
        result.error_message.as_deref(),
        Some("Error: undefinedVar is not defined")
    );
    assert!(result.output_lines.is_empty());
    assert!(!result.matched_expected);
    assert_eq!(t.events.len(), 1);
    assert_eq!(t.events[0].level, NotificationLevel::Error);
    assert_eq!(t.events[0].message, notify::FAULT_MESSAGE);
}

#[test]
fn test_mismatch_is_silent() {
    let s = start().edit_script("log('hello')").state;
    let t = s.run(&Sandbox::default());
    assert!(!t.state.last_result().unwrap().matched_expected);
    assert!(t.events.is_empty());
}

#[test]
fn test_run_keeps_cursor_and_hint() {
    let s = walk(start(), &[TutorState::next, TutorState::toggle_hint]);
    let after = s.run(&Sandbox::default()).state;
    assert_eq!(after.cursor(), 1);
    assert!(after.hint_visible());
    assert_eq!(after.visible_hint(), Some("Multiply with *"));
    assert!(after.last_result().unwrap().matched_expected);
}

#[test]
fn test_unchecked_tutorial_never_matches() {
    let s = start().goto_index(2).state;
    let t = s.run(&Sandbox::default());
    assert!(!t.state.last_result().unwrap().matched_expected);
    assert!(t.events.is_empty());
}

// ══════════════════════════════════════════════════════════════════════════════
// Session
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_session_records_notifications_in_order() {
    let mut session = session();
    session.next().unwrap();
    session.run().unwrap();
    session.reset_script().unwrap();
    let messages: Vec<_> = session
        .sink()
        .history()
        .iter()
        .map(|n| n.message.as_str())
        .collect();
    assert_eq!(
        messages,
        vec![
            "Loaded: Math",
            notify::MATCH_MESSAGE,
            "Code reset to tutorial example"
        ]
    );
}

#[test]
fn test_session_goto_errors() {
    let mut session = session();
    assert_eq!(
        session.try_goto(7),
        Err(SessionError::Navigation(NavigationError::InvalidIndex {
            index: 7,
            len: 3
        }))
    );
    assert_eq!(session.goto_index(7), Ok(()));
    assert!(session.sink().history().is_empty());
    session.goto_id(3).unwrap();
    assert_eq!(session.state().unwrap().cursor(), 2);
}

#[test]
fn test_session_reload_replaces_catalog() {
    let mut session = session();
    session.next().unwrap();
    session.edit_script("log(1)").unwrap();
    session.reload(&StaticProvider::new(vec![Tutorial::new(9, "Only", "log(9)")]));
    let state = session.state().unwrap();
    assert_eq!(state.catalog().len(), 1);
    assert_eq!(state.cursor(), 0);
    assert_eq!(state.script(), "log(9)");
}

#[test]
fn test_session_empty_reload_falls_back_without_error() {
    let mut session = session();
    session.reload(&StaticProvider::new(Vec::new()));
    assert_eq!(session.state().unwrap().current(), &Tutorial::fallback());
    assert!(session.sink().history().is_empty());
}
