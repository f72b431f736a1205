//! Keyboard handling for browse and query-editing modes.

use crate::app::{App, AppEvent, InputMode};
use crate::news::FilterMode;
use crate::util::validate_link;
use anyhow::{Context, Result};
use crossterm::event::{KeyCode, KeyModifiers};
use tokio::sync::mpsc;

use super::events::spawn_refresh;
use super::Action;

/// Longest search text accepted from the keyboard, in characters.
const MAX_QUERY_CHARS: usize = 256;

pub(super) fn handle_input(
    app: &mut App,
    code: KeyCode,
    modifiers: KeyModifiers,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Result<Action> {
    if modifiers.contains(KeyModifiers::CONTROL) && code == KeyCode::Char('c') {
        return Ok(Action::Quit);
    }

    match app.input_mode {
        InputMode::EditingQuery => Ok(handle_query_input(app, code, event_tx)),
        InputMode::Browse => handle_browse_input(app, code, event_tx),
    }
}

fn handle_query_input(app: &mut App, code: KeyCode, event_tx: &mpsc::Sender<AppEvent>) -> Action {
    match code {
        KeyCode::Enter => {
            if app.commit_query() {
                tracing::info!(query = %app.query, "Search query changed");
            }
            app.select_first();
            spawn_refresh(app, event_tx);
        }
        KeyCode::Esc => app.cancel_editing(),
        KeyCode::Backspace => {
            app.query_input.pop();
        }
        KeyCode::Char(c) => {
            if app.query_input.chars().count() < MAX_QUERY_CHARS {
                app.query_input.push(c);
            } else {
                app.set_status(format!("検索ワードは{MAX_QUERY_CHARS}文字までです"));
            }
        }
        _ => {}
    }
    Action::Continue
}

fn handle_browse_input(
    app: &mut App,
    code: KeyCode,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Result<Action> {
    match code {
        KeyCode::Char('q') => return Ok(Action::Quit),
        KeyCode::Char('/') => app.start_editing(),
        KeyCode::Char('f') => set_filter(app, app.filter.next(), event_tx),
        KeyCode::Char('1') => set_filter(app, FilterMode::All, event_tx),
        KeyCode::Char('2') => set_filter(app, FilterMode::Official, event_tx),
        KeyCode::Char('3') => set_filter(app, FilterMode::Search, event_tx),
        KeyCode::Char('r') => {
            app.set_status("更新中...");
            spawn_refresh(app, event_tx);
        }
        KeyCode::Char('j') | KeyCode::Down => app.select_next(),
        KeyCode::Char('k') | KeyCode::Up => app.select_prev(),
        KeyCode::Char('g') | KeyCode::Home => app.select_first(),
        KeyCode::Char('G') | KeyCode::End => app.select_last(),
        KeyCode::Char('o') | KeyCode::Enter => open_selected(app)?,
        _ => {}
    }
    Ok(Action::Continue)
}

fn set_filter(app: &mut App, filter: FilterMode, event_tx: &mpsc::Sender<AppEvent>) {
    if app.filter == filter {
        return;
    }
    app.filter = filter;
    app.select_first();
    tracing::debug!(filter = ?filter, "Filter changed");
    spawn_refresh(app, event_tx);
}

fn open_selected(app: &mut App) -> Result<()> {
    let Some(record) = app.selected_record() else {
        return Ok(());
    };
    let url = validate_link(&record.link)?;
    open::that(url.as_str()).with_context(|| format!("Failed to open {url}"))?;
    app.set_status("ブラウザで開きました");
    Ok(())
}
