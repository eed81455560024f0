use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use crate::app::{EditorContext, ToastLevel};
use crate::editor::{Field, Surface, position};

use super::TerminalSurface;

pub fn render_status_bar(ctx: &EditorContext<TerminalSurface>, frame: &mut Frame, area: Rect) {
    if let Some(file) = ctx.pending_delete.as_deref() {
        let prompt = Paragraph::new(format!(" Delete {file}? (y/N)"))
            .style(Style::default().bg(Color::Red).fg(Color::White));
        frame.render_widget(prompt, area);
        return;
    }

    let filename = ctx.active_file().unwrap_or("untitled");
    let modified = if ctx.session.is_modified() {
        " [modified]"
    } else {
        ""
    };
    let mode = if ctx.session.can_edit() { "" } else { " [view]" };
    let pos = position(&ctx.surface);
    let field = match ctx.surface.caret().field {
        Field::Title => "title",
        Field::Body => "body",
    };

    let status = format!(
        " [{}]  {}{}{}  {} Ln {}, Col {}",
        ctx.connection.label(),
        filename,
        modified,
        mode,
        field,
        pos.line + 1,
        pos.offset + 1
    );

    let status_bar =
        Paragraph::new(status).style(Style::default().bg(Color::DarkGray).fg(Color::White));

    frame.render_widget(status_bar, area);
}

pub fn render_toast_bar(ctx: &EditorContext<TerminalSurface>, frame: &mut Frame, area: Rect) {
    let Some((message, level)) = ctx.active_toast() else {
        return;
    };
    let (prefix, style) = match level {
        ToastLevel::Info => (
            "[info]",
            Style::default().bg(Color::DarkGray).fg(Color::White),
        ),
        ToastLevel::Warning => (
            "[warn]",
            Style::default().bg(Color::Yellow).fg(Color::Black),
        ),
        ToastLevel::Error => ("[error]", Style::default().bg(Color::Red).fg(Color::White)),
    };
    let toast = Paragraph::new(format!("{prefix} {message}")).style(style);
    frame.render_widget(toast, area);
}
