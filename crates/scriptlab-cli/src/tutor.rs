//! Line-oriented interactive tutorial session.
//!
//! Commands start with `:`; anything else is ignored with a reminder.
//! `:edit` reads replacement script lines until a line containing only `.`.

use anyhow::{Context, Result};
use scriptlab_tutor::{RecordingSink, SessionError, TutorSession};
use std::io::{BufRead, Write};

const HELP: &str = "\
commands:
  :show        show the current tutorial and script
  :list        list all tutorials
  :next :prev  move through the catalog
  :goto N      jump to tutorial N (as numbered in :list)
  :edit        replace the script; finish with a line containing only `.`
  :run         run the script
  :reset       restore the tutorial's code
  :hint        show or hide the hint
  :help        this text
  :quit        leave";

/// Drive `session` from `input` until `:quit` or end of input.
pub fn repl<R: BufRead, W: Write>(
    session: &mut TutorSession<RecordingSink>,
    input: R,
    mut out: W,
) -> Result<()> {
    flush_notifications(session, &mut out)?;
    show(session, &mut out)?;
    writeln!(out, "type :help for commands")?;

    let mut lines = input.lines();
    while let Some(line) = lines.next() {
        let line = line.context("read command")?;
        let mut words = line.split_whitespace();
        let command = match words.next() {
            Some(command) => command,
            None => continue,
        };
        let outcome = match command {
            ":quit" | ":q" => break,
            ":help" => {
                writeln!(out, "{HELP}")?;
                Ok(())
            }
            ":show" => {
                show(session, &mut out)?;
                Ok(())
            }
            ":list" => {
                list(session, &mut out)?;
                Ok(())
            }
            ":next" => session.next(),
            ":prev" => session.prev(),
            ":goto" => match words.next().and_then(|n| n.parse::<usize>().ok()) {
                Some(n) if n > 0 => session.try_goto(n - 1),
                _ => {
                    writeln!(out, "usage: :goto N")?;
                    Ok(())
                }
            },
            ":reset" => session.reset_script(),
            ":hint" => match session.toggle_hint() {
                Ok(()) => {
                    if let Some(hint) = session.state().ok().and_then(|s| s.visible_hint()) {
                        writeln!(out, "hint: {hint}")?;
                    }
                    Ok(())
                }
                Err(err) => Err(err),
            },
            ":edit" => {
                let mut script = Vec::new();
                for line in lines.by_ref() {
                    let line = line.context("read script line")?;
                    if line == "." {
                        break;
                    }
                    script.push(line);
                }
                session.edit_script(script.join("\n"))
            }
            ":run" => match session.run() {
                Ok(result) => {
                    writeln!(out, "{}", result.display_text())?;
                    Ok(())
                }
                Err(err) => Err(err),
            },
            other => {
                writeln!(out, "unknown command {other}; type :help")?;
                Ok(())
            }
        };
        if let Err(err) = outcome {
            report(&err, &mut out)?;
        }
        flush_notifications(session, &mut out)?;
    }
    Ok(())
}

fn report(err: &SessionError, out: &mut impl Write) -> Result<()> {
    writeln!(out, "error: {err}")?;
    Ok(())
}

fn flush_notifications(
    session: &mut TutorSession<RecordingSink>,
    out: &mut impl Write,
) -> Result<()> {
    for notification in session.sink_mut().drain() {
        writeln!(out, "{notification}")?;
    }
    Ok(())
}

fn show(session: &TutorSession<RecordingSink>, out: &mut impl Write) -> Result<()> {
    let state = session.state()?;
    let tutorial = state.current();
    writeln!(out, "── {} ({}) ──", tutorial.title, state.progress())?;
    writeln!(out, "{}", tutorial.description)?;
    for (number, line) in state.script().split('\n').enumerate() {
        writeln!(out, "{:>3} │ {line}", number + 1)?;
    }
    if let Some(expected) = &tutorial.expected_output {
        writeln!(out, "expected output:\n{expected}")?;
    }
    Ok(())
}

fn list(session: &TutorSession<RecordingSink>, out: &mut impl Write) -> Result<()> {
    let state = session.state()?;
    for (index, tutorial) in state.catalog().iter().enumerate() {
        let marker = if index == state.cursor() { '>' } else { ' ' };
        writeln!(out, "{marker} {:>2}. {}", index + 1, tutorial.title)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use scriptlab_tutor::{Sandbox, StaticProvider, Tutorial};

    fn transcript(commands: &str) -> String {
        let provider = StaticProvider::new(vec![
            Tutorial::new(1, "Hello", "log('hi')").with_expected_output("hi"),
            Tutorial::new(2, "Sum", "log(1 + 1)").with_hint("add them"),
        ]);
        let mut session = TutorSession::load(Sandbox::default(), RecordingSink::new(), &provider);
        let mut out = Vec::new();
        repl(&mut session, commands.as_bytes(), &mut out).expect("repl");
        String::from_utf8(out).expect("utf-8")
    }

    #[test]
    fn test_run_and_match() {
        let text = transcript(":run\n:quit\n");
        assert!(text.contains("── Hello (1/2) ──"), "{text}");
        assert!(text.contains("\nhi\n"), "{text}");
        assert!(text.contains("[success] Perfect!"), "{text}");
    }

    #[test]
    fn test_navigation_and_hint() {
        let text = transcript(":next\n:hint\n:goto 9\n");
        assert!(text.contains("[info] Loaded: Sum"), "{text}");
        assert!(text.contains("hint: add them"), "{text}");
        assert!(text.contains("error: tutorial index 8 is out of range"), "{text}");
    }

    /// Accepts everything except the hint line.
    struct RejectHint;

    impl Write for RejectHint {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if buf.windows(5).any(|w| w == b"hint:") {
                return Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"));
            }
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_hint_write_failure_is_reported() {
        let provider = StaticProvider::new(vec![Tutorial::new(1, "Sum", "log(1)").with_hint("h")]);
        let mut session = TutorSession::load(Sandbox::default(), RecordingSink::new(), &provider);
        assert!(repl(&mut session, ":show\n".as_bytes(), RejectHint).is_ok());
        assert!(repl(&mut session, ":hint\n".as_bytes(), RejectHint).is_err());
    }

    #[test]
    fn test_edit_then_run() {
        let text = transcript(":edit\nlog('a')\nlog('b')\n.\n:run\n:show\n");
        assert!(text.contains("a\nb\n"), "{text}");
        assert!(text.contains("  2 │ log('b')"), "{text}");
    }

    #[test]
    fn test_fault_is_reported() {
        let text = transcript(":edit\nboom()\n.\n:run\n");
        assert!(text.contains("Error: boom is not defined"), "{text}");
        assert!(text.contains("[error] There was an error"), "{text}");
    }
}
