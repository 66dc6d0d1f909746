#[cfg(test)]
#[path = "events_test.rs"]
mod tests;

use std::time::Duration;

use anyhow::Result;
use crossterm::event::Event as CrosstermEvent;
use crossterm::event::EventStream;
use crossterm::event::KeyEventKind;
use crossterm::event::MouseEventKind;
use futures::StreamExt;
use tokio::sync::mpsc;
use tui_textarea::Input;
use tui_textarea::Key;

use crate::domain::models::Event;

const TICK: Duration = Duration::from_millis(500);

/// Keys that drive the app rather than the input box: cancelling, publishing,
/// submitting, and moving around the code pane.
fn app_key(input: &Input) -> Option<Event> {
    let event = match (&input.key, input.ctrl) {
        (Key::Char('c'), true) => Event::KeyboardCTRLC(),
        (Key::Char('p'), true) => Event::KeyboardCTRLP(),
        (Key::Enter, _) => Event::KeyboardEnter(),
        (Key::End, true) => Event::UIScrollLast(),
        (Key::Char('d'), true) | (Key::PageDown, _) => Event::UIScrollPageDown(),
        (Key::Char('u'), true) | (Key::PageUp, _) => Event::UIScrollPageUp(),
        (Key::Down, _) | (Key::MouseScrollDown, _) => Event::UIScrollDown(),
        (Key::Up, _) | (Key::MouseScrollUp, _) => Event::UIScrollUp(),
        _ => return None,
    };

    return Some(event);
}

fn wheel(kind: MouseEventKind) -> Option<Event> {
    match kind {
        MouseEventKind::ScrollDown => return Some(Event::UIScrollDown()),
        MouseEventKind::ScrollUp => return Some(Event::UIScrollUp()),
        _ => return None,
    }
}

/// Translates a raw terminal event. Key releases, focus changes and mouse
/// clicks mean nothing to the app.
pub fn terminal_event(event: CrosstermEvent) -> Option<Event> {
    match event {
        CrosstermEvent::Key(key) => {
            if key.kind == KeyEventKind::Release {
                return None;
            }

            let input = Input::from(key);
            if let Some(event) = app_key(&input) {
                return Some(event);
            }
            return Some(Event::KeyboardCharInput(input));
        }
        CrosstermEvent::Mouse(mouse) => return wheel(mouse.kind),
        CrosstermEvent::Paste(text) => return Some(Event::KeyboardPaste(text)),
        CrosstermEvent::Resize(_, _) => return Some(Event::UIResize()),
        _ => return None,
    }
}

/// Merges terminal input with events coming back from the actions service,
/// ticking the UI when neither has anything to say.
pub struct EventsService {
    terminal: EventStream,
    worker: mpsc::UnboundedReceiver<Event>,
}

impl EventsService {
    pub fn new(worker: mpsc::UnboundedReceiver<Event>) -> EventsService {
        return EventsService {
            terminal: EventStream::new(),
            worker,
        };
    }

    pub async fn next(&mut self) -> Result<Event> {
        loop {
            let next = tokio::select! {
                event = self.worker.recv() => event,
                event = self.terminal.next() => match event {
                    Some(Ok(event)) => terminal_event(event),
                    Some(Err(err)) => {
                        tracing::debug!(error = ?err, "Dropping unreadable terminal event");
                        None
                    }
                    None => None,
                },
                _ = tokio::time::sleep(TICK) => Some(Event::UITick()),
            };

            if let Some(event) = next {
                return Ok(event);
            }
        }
    }
}
