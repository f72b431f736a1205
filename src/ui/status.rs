use crate::app::{App, InputMode};
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    widgets::Paragraph,
    Frame,
};
use std::borrow::Cow;

/// Render the status bar
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    if area.width < 1 || area.height < 1 {
        return;
    }

    let text: Cow<'_, str> = if let Some((msg, _)) = &app.status_message {
        Cow::Borrowed(&**msg)
    } else {
        match app.input_mode {
            InputMode::EditingQuery => Cow::Borrowed("検索ワードを入力 | ENTER 確定 | ESC キャンセル"),
            InputMode::Browse => Cow::Borrowed(
                "[/]検索 [f]フィルタ [1-3]選択 [r]更新 [o]開く [j/k]移動 [q]終了",
            ),
        }
    };

    let style = Style::default().bg(Color::DarkGray).fg(Color::White);
    f.render_widget(Paragraph::new(text).style(style), area);
}
