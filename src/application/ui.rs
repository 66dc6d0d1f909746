use std::io;

use anyhow::Result;
use crossterm::cursor;
use crossterm::event::DisableBracketedPaste;
use crossterm::event::DisableMouseCapture;
use crossterm::event::EnableBracketedPaste;
use crossterm::event::EnableMouseCapture;
use crossterm::terminal::disable_raw_mode;
use crossterm::terminal::enable_raw_mode;
use crossterm::terminal::EnterAlternateScreen;
use crossterm::terminal::LeaveAlternateScreen;
use ratatui::backend::CrosstermBackend;
use ratatui::prelude::*;
use ratatui::widgets::Block;
use ratatui::widgets::BorderType;
use ratatui::widgets::Borders;
use ratatui::widgets::Clear;
use ratatui::widgets::Paragraph;
use ratatui::widgets::Scrollbar;
use ratatui::widgets::ScrollbarOrientation;
use ratatui::widgets::Wrap;
use ratatui::Terminal;
use tokio::sync::mpsc;
use tui_textarea::Input;
use tui_textarea::Key;

use crate::domain::models::Action;
use crate::domain::models::Event;
use crate::domain::models::Loading;
use crate::domain::models::TextArea;
use crate::domain::models::Toast;
use crate::domain::models::ToastKind;
use crate::domain::services::events::EventsService;
use crate::domain::services::AppState;

fn toast_style(toast: &Toast) -> Style {
    if toast.kind == ToastKind::Error {
        return Style::default().fg(Color::Red);
    }

    return Style::default().fg(Color::Green);
}

/// Single line notices go in the status bar, anything longer (help, model
/// lists) is shown in a popup over the code until the next key press.
fn render_toast<B: Backend>(frame: &mut Frame<B>, status_rect: Rect, code_rect: Rect, toast: &Toast) {
    if !toast.text.contains('\n') {
        frame.render_widget(
            Paragraph::new(toast.text.to_string()).style(toast_style(toast)),
            status_rect,
        );
        return;
    }

    let height = (toast.text.lines().count() as u16)
        .saturating_add(2)
        .min(code_rect.height);
    let popup = Rect {
        x: code_rect.x.saturating_add(2),
        y: code_rect.y.saturating_add(1),
        width: code_rect.width.saturating_sub(4),
        height,
    };

    frame.render_widget(Clear, popup);
    frame.render_widget(
        Paragraph::new(toast.text.to_string())
            .style(toast_style(toast))
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded),
            ),
        popup,
    );
}

fn insert_text(textarea: &mut tui_textarea::TextArea, text: &str) {
    for char in text.chars() {
        let key = match char {
            '\n' => Key::Enter,
            '\r' => continue,
            _ => Key::Char(char),
        };

        textarea.input(Input {
            key,
            ctrl: false,
            alt: false,
        });
    }
}

async fn start_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    app_state: &mut AppState,
    tx: mpsc::UnboundedSender<Action>,
    rx: mpsc::UnboundedReceiver<Event>,
) -> Result<()> {
    let mut events = EventsService::new(rx);
    let mut textarea = TextArea::with_title(app_state.input_title());
    let loading = Loading::default();

    #[cfg(feature = "dev")]
    {
        insert_text(
            &mut textarea,
            "Build a todo app with a dark theme and a counter of open todos.",
        );
    }

    loop {
        terminal.draw(|frame| {
            let layout = Layout::default()
                .direction(Direction::Vertical)
                .constraints(vec![
                    Constraint::Min(1),
                    Constraint::Length(1),
                    Constraint::Max(4),
                ])
                .split(frame.size());

            if layout[0].width != app_state.last_known_width
                || layout[0].height != app_state.last_known_height
            {
                app_state.set_rect(layout[0]);
            }

            app_state.code_view.render(
                frame,
                layout[0],
                app_state.scroll.position,
                "App.tsx",
            );
            frame.render_stateful_widget(
                Scrollbar::new(ScrollbarOrientation::VerticalRight),
                layout[0].inner(&Margin {
                    vertical: 1,
                    horizontal: 0,
                }),
                &mut app_state.scroll.scrollbar_state,
            );

            match &app_state.toast {
                Some(toast) => render_toast(frame, layout[1], layout[0], toast),
                None => frame.render_widget(
                    Paragraph::new(app_state.status_line())
                        .style(Style::default().fg(Color::DarkGray)),
                    layout[1],
                ),
            }

            if app_state.session.is_loading() {
                loading.render(frame, layout[2], app_state.session.state());
            } else {
                frame.render_widget(textarea.widget(), layout[2]);
            }
        })?;

        match events.next().await? {
            Event::BackendResponse(msg) => {
                let done = msg.done;
                app_state.handle_backend_response(msg);
                if done {
                    textarea = TextArea::with_title(app_state.input_title());
                }
            }
            Event::BackendFailed(failure) => {
                app_state.handle_backend_failure(failure);
            }
            Event::PublishResponse(receipt) => {
                app_state.handle_publish_response(receipt);
            }
            Event::Toast(toast) => {
                app_state.toast = Some(toast);
            }
            Event::KeyboardCTRLC() => {
                if !app_state.abort(&tx)? {
                    break;
                }
            }
            Event::KeyboardCTRLP() => {
                app_state.publish(&tx)?;
            }
            Event::KeyboardEnter() => {
                if app_state.session.is_loading() {
                    continue;
                }

                let input_str = textarea.lines().join("\n");
                if input_str.trim().is_empty() {
                    continue;
                }

                if app_state.submit(&input_str, &tx)? {
                    break;
                }
                textarea = TextArea::with_title(app_state.input_title());
            }
            Event::KeyboardPaste(text) => {
                if !app_state.session.is_loading() {
                    insert_text(&mut textarea, &text);
                }
            }
            Event::KeyboardCharInput(input) => {
                if app_state.toast.as_ref().is_some_and(|toast| {
                    return toast.text.contains('\n');
                }) {
                    app_state.toast = None;
                }
                if !app_state.session.is_loading() {
                    textarea.input(input);
                }
            }
            Event::UIScrollDown() => {
                app_state.scroll.down();
            }
            Event::UIScrollUp() => {
                app_state.scroll.up();
            }
            Event::UIScrollPageDown() => {
                app_state.scroll.down_page();
            }
            Event::UIScrollPageUp() => {
                app_state.scroll.up_page();
            }
            Event::UIScrollLast() => {
                app_state.scroll.last();
            }
            Event::UIResize() | Event::UITick() => {}
        }

        if let Some(text) = app_state.take_restorable_input() {
            textarea = TextArea::with_title(app_state.input_title());
            insert_text(&mut textarea, &text);
        }
    }

    return Ok(());
}

pub fn destruct_terminal_for_panic() {
    let _ = disable_raw_mode();
    let _ = crossterm::execute!(
        io::stdout(),
        LeaveAlternateScreen,
        DisableMouseCapture,
        DisableBracketedPaste
    );
    let _ = crossterm::execute!(io::stdout(), cursor::Show);
}

pub async fn start(
    mut app_state: AppState,
    tx: mpsc::UnboundedSender<Action>,
    rx: mpsc::UnboundedReceiver<Event>,
) -> Result<()> {
    let stdout = io::stdout();
    let mut stdout = stdout.lock();

    enable_raw_mode()?;
    crossterm::execute!(
        stdout,
        EnterAlternateScreen,
        EnableMouseCapture,
        EnableBracketedPaste
    )?;
    let term_backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(term_backend)?;

    let res = start_loop(&mut terminal, &mut app_state, tx, rx).await;

    disable_raw_mode()?;
    crossterm::execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture,
        DisableBracketedPaste
    )?;
    terminal.show_cursor()?;

    return res;
}
