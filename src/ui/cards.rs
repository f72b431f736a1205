//! News card list and per-source fetch status.

use crate::app::App;
use crate::feed::NewsRecord;
use crate::news::SourceOutcome;
use crate::util::{strip_control_chars, strip_tags, truncate_chars, truncate_to_width};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

/// Shown when a refresh completes with nothing to display.
pub const NO_RESULTS: &str =
    "ニュースが見つかりませんでした。検索ワードを変更するか、しばらく待ってから再試行してください。";

/// One status line per source, in the style of the fetch log.
pub fn outcome_line(outcome: &SourceOutcome) -> String {
    let name = match &outcome.query {
        Some(query) => format!("{} ('{}')", outcome.source, query),
        None => outcome.source.to_string(),
    };
    match outcome.records {
        Some(n) => format!("✅ {name}: 取得成功 ({n}件)"),
        None => format!("⚠️ {name}: 取得失敗 (または更新なし)"),
    }
}

/// Summary as shown on a card: tags stripped, then cut to `max_chars`.
pub fn card_summary(record: &NewsRecord, max_chars: usize) -> String {
    let plain = strip_tags(&strip_control_chars(&record.summary));
    truncate_chars(&plain, max_chars).into_owned()
}

fn card<'a>(record: &'a NewsRecord, width: usize, max_chars: usize, selected: bool) -> ListItem<'a> {
    let title_style = if selected {
        Style::default()
            .fg(Color::White)
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default()
            .fg(Color::LightBlue)
            .add_modifier(Modifier::BOLD)
    };

    let title = strip_control_chars(&record.title);
    let summary = card_summary(record, max_chars);

    let mut lines = vec![
        Line::from(Span::styled(
            record.source.label(),
            Style::default()
                .fg(Color::Gray)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            truncate_to_width(&title, width).into_owned(),
            title_style,
        )),
        Line::from(Span::styled(
            record.published.as_str(),
            Style::default().fg(Color::DarkGray),
        )),
    ];
    if !summary.is_empty() {
        lines.push(Line::from(truncate_to_width(&summary, width).into_owned()));
    }
    lines.push(Line::default());

    ListItem::new(Text::from(lines))
}

fn render_outcomes(f: &mut Frame, outcomes: &[SourceOutcome], area: Rect) {
    let lines: Vec<Line> = outcomes
        .iter()
        .map(|o| {
            let color = if o.succeeded() {
                Color::Green
            } else {
                Color::Yellow
            };
            Line::from(Span::styled(outcome_line(o), Style::default().fg(color)))
        })
        .collect();
    f.render_widget(Paragraph::new(lines), area);
}

/// Render the status lines and the card list.
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title(format!(
        " ニュース ({}件) ",
        app.records.len()
    ));

    if app.records.is_empty() {
        let text = if app.loading {
            "ニュースを取得中...".to_string()
        } else {
            let mut lines: Vec<String> = app.outcomes.iter().map(outcome_line).collect();
            lines.push(String::new());
            lines.push(NO_RESULTS.to_string());
            lines.join("\n")
        };
        let msg = Paragraph::new(text)
            .block(block)
            .style(Style::default().fg(Color::Yellow))
            .wrap(Wrap { trim: false });
        f.render_widget(msg, area);
        return;
    }

    let area = if app.outcomes.is_empty() {
        area
    } else {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(app.outcomes.len().min(4) as u16),
                Constraint::Min(0),
            ])
            .split(area);
        render_outcomes(f, &app.outcomes, chunks[0]);
        chunks[1]
    };

    let width = area.width.saturating_sub(4) as usize;
    let items: Vec<ListItem> = app
        .records
        .iter()
        .enumerate()
        .map(|(i, record)| card(record, width, app.summary_max_chars, i == app.selected))
        .collect();

    let list = List::new(items).block(block);
    let mut state = ListState::default().with_selected(Some(app.selected));
    f.render_stateful_widget(list, area, &mut state);
}
