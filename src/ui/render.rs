use std::ops::Range;

use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::app::{EditorContext, Focus};
use crate::editor::{Field, Surface, position};

use super::{DOCUMENT_WIDTH_PERCENT, RESULTS_WIDTH_PERCENT, TerminalSurface, status};

/// Rows of the document pane used by the title, tags and borders.
const DOCUMENT_HEADER_ROWS: u16 = 4;

const CARET_STYLE: Style = Style::new().bg(Color::White).fg(Color::Black);
const OVERLAY_STYLE: Style = Style::new().bg(Color::Yellow).fg(Color::Black);

struct Areas {
    query: Rect,
    results: Rect,
    document: Rect,
    toast: Rect,
    status: Rect,
}

fn split_areas(area: Rect) -> Areas {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(area);
    let columns = split_main_columns(rows[1]);
    Areas {
        query: rows[0],
        results: columns[0],
        document: columns[1],
        toast: rows[2],
        status: rows[3],
    }
}

pub fn split_main_columns(area: Rect) -> std::rc::Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(RESULTS_WIDTH_PERCENT),
            Constraint::Percentage(DOCUMENT_WIDTH_PERCENT),
        ])
        .split(area)
}

/// Body lines visible in a terminal of the given height.
pub fn body_rows(height: u16) -> usize {
    let middle = height.saturating_sub(3);
    usize::from(middle.saturating_sub(DOCUMENT_HEADER_ROWS)).max(1)
}

/// Render the complete UI.
pub fn render(ctx: &EditorContext<TerminalSurface>, frame: &mut Frame) {
    let areas = split_areas(frame.area());
    render_query_bar(ctx, frame, areas.query);
    render_results(ctx, frame, areas.results);
    render_document(ctx, frame, areas.document);
    status::render_toast_bar(ctx, frame, areas.toast);
    status::render_status_bar(ctx, frame, areas.status);
}

fn focus_border(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    }
}

fn render_query_bar(ctx: &EditorContext<TerminalSurface>, frame: &mut Frame, area: Rect) {
    let mut spans = vec![
        Span::styled("> ", Style::default().fg(Color::Cyan)),
        Span::raw(ctx.query.clone()),
    ];
    if ctx.focus == Focus::Query {
        spans.push(Span::styled(" ", CARET_STYLE));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_results(ctx: &EditorContext<TerminalSurface>, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .title(format!("Results ({})", ctx.results.len()))
        .borders(Borders::ALL);
    let inner_rows = usize::from(area.height.saturating_sub(2));
    let inner_width = usize::from(area.width.saturating_sub(2));
    let selected = ctx.results.selected_index();

    let mut lines: Vec<Line> = Vec::new();
    for (idx, entry) in ctx
        .results
        .entries()
        .iter()
        .enumerate()
        .skip(ctx.results.scroll_offset())
    {
        if lines.len() >= inner_rows {
            break;
        }
        let is_selected = selected == Some(idx);
        let marker = if is_selected { ">" } else { " " };
        let header_style = if is_selected {
            Style::default().fg(Color::Cyan).bold().reversed()
        } else {
            Style::default().fg(Color::Cyan).bold()
        };
        let header = format!("{marker} {}", entry.header());
        lines.push(Line::styled(fit_width(&header, inner_width), header_style));
        for snippet in entry.visible_snippets(ctx.max_snippets) {
            let row = format!("    {}", snippet.display());
            lines.push(Line::styled(
                fit_width(&row, inner_width),
                Style::default().fg(Color::Gray),
            ));
        }
    }
    lines.truncate(inner_rows);

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_document(ctx: &EditorContext<TerminalSurface>, frame: &mut Frame, area: Rect) {
    let focused = matches!(ctx.focus, Focus::Document | Focus::TagPrompt);
    let block = Block::default()
        .title(ctx.active_file().unwrap_or("untitled").to_string())
        .borders(Borders::ALL)
        .border_style(focus_border(focused));
    let inner = block.inner(area);
    frame.render_widget(Clear, area);
    frame.render_widget(block, area);

    let surface = &ctx.surface;
    let document = surface.document();
    let caret = surface.caret();
    let pos = position(surface);
    let show_caret = ctx.focus == Focus::Document;

    let mut lines: Vec<Line> = Vec::new();

    let width = usize::from(inner.width);

    let title_text = document.title_text();
    let title_caret = (show_caret && caret.field == Field::Title).then_some(pos.offset);
    let title_start = title_caret.map_or(0, |c| scroll_start(&title_text, c, width));
    let title_style = Style::default().bold();
    let mut title = line_spans(&title_text, &[], title_caret, title_start);
    for span in &mut title {
        span.style = title_style.patch(span.style);
    }
    lines.push(Line::from(title));
    lines.push(tag_line(ctx));

    let body = &document.body;
    let body_caret = show_caret && caret.field == Field::Body;
    // Every body row shares the caret line's horizontal scroll.
    let column_start = match body.line(pos.line) {
        Some(line) if body_caret => scroll_start(&line.text(), pos.offset, width),
        _ => 0,
    };
    let start = surface.scroll_offset();
    let end = (start + surface.body_rows()).min(body.line_count());
    for (idx, line) in body.lines().iter().enumerate().take(end).skip(start) {
        let line_caret = (body_caret && pos.line == idx).then_some(pos.offset);
        lines.push(Line::from(line_spans(
            &line.text(),
            &line.overlay_ranges(),
            line_caret,
            column_start,
        )));
    }

    frame.render_widget(Paragraph::new(lines), inner);
}

fn tag_line(ctx: &EditorContext<TerminalSurface>) -> Line<'static> {
    let tag_style = Style::default().fg(Color::Black).bg(Color::Green);
    let mut spans = Vec::new();
    for tag in &ctx.document().tags {
        spans.push(Span::styled(format!("#{tag}"), tag_style));
        spans.push(Span::raw(" "));
    }
    if ctx.focus == Focus::TagPrompt {
        spans.push(Span::styled(format!("#{}", ctx.tag_input), tag_style));
        spans.push(Span::styled(" ", CARET_STYLE));
    }
    Line::from(spans)
}

/// Cut `text` to at most `width` columns, marking the cut with an ellipsis.
fn fit_width(text: &str, width: usize) -> String {
    if UnicodeWidthStr::width(text) <= width {
        return text.to_string();
    }
    let budget = width.saturating_sub(1);
    let mut used = 0;
    let mut out = String::new();
    for ch in text.chars() {
        let w = UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        out.push(ch);
    }
    if width > 0 {
        out.push('…');
    }
    out
}

/// First character to show so the caret cell fits within `width` columns.
fn scroll_start(text: &str, caret: usize, width: usize) -> usize {
    let widths: Vec<usize> = text
        .chars()
        .take(caret)
        .map(|ch| UnicodeWidthChar::width(ch).unwrap_or(0))
        .collect();
    let mut used = 1;
    let mut start = widths.len();
    while start > 0 && used + widths[start - 1] <= width {
        start -= 1;
        used += widths[start];
    }
    start
}

/// Split a line into spans from character `start` on, styling overlay ranges
/// and the caret cell.
fn line_spans(
    text: &str,
    overlays: &[Range<usize>],
    caret: Option<usize>,
    start: usize,
) -> Vec<Span<'static>> {
    let style_at = |idx: usize| {
        if caret == Some(idx) {
            CARET_STYLE
        } else if overlays.iter().any(|r| r.contains(&idx)) {
            OVERLAY_STYLE
        } else {
            Style::default()
        }
    };

    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut run = String::new();
    let mut run_style = Style::default();
    let mut len = 0;
    for (idx, ch) in text.chars().enumerate() {
        len = idx + 1;
        if idx < start {
            continue;
        }
        let style = style_at(idx);
        if style != run_style && !run.is_empty() {
            spans.push(Span::styled(std::mem::take(&mut run), run_style));
        }
        run_style = style;
        run.push(ch);
    }
    if !run.is_empty() {
        spans.push(Span::styled(run, run_style));
    }
    if caret.is_some_and(|c| c >= len) {
        spans.push(Span::styled(" ", CARET_STYLE));
    }
    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_spans_plain() {
        let spans = line_spans("abc", &[], None, 0);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].content, "abc");
    }

    #[test]
    fn test_line_spans_caret_mid_line() {
        let spans = line_spans("abc", &[], Some(1), 0);
        let parts: Vec<_> = spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(parts, vec!["a", "b", "c"]);
        assert_eq!(spans[1].style, CARET_STYLE);
    }

    #[test]
    fn test_line_spans_caret_at_end_adds_cell() {
        let spans = line_spans("ab", &[], Some(2), 0);
        assert_eq!(spans.last().unwrap().content, " ");
        assert_eq!(spans.last().unwrap().style, CARET_STYLE);
    }

    #[test]
    fn test_line_spans_overlay() {
        let spans = line_spans("see this", &[4..8], None, 0);
        assert_eq!(spans[1].content, "this");
        assert_eq!(spans[1].style, OVERLAY_STYLE);
    }

    #[test]
    fn test_line_spans_skips_scrolled_columns() {
        let spans = line_spans("abcdef", &[3..5], Some(6), 2);
        let parts: Vec<_> = spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(parts, vec!["c", "de", "f", " "]);
        assert_eq!(spans[1].style, OVERLAY_STYLE);
        assert_eq!(spans[3].style, CARET_STYLE);
    }

    #[test]
    fn test_scroll_start_keeps_caret_cell_in_view() {
        assert_eq!(scroll_start("short", 3, 10), 0);
        assert_eq!(scroll_start("abcdefghij", 10, 4), 7);
        assert_eq!(scroll_start("abcdefghij", 5, 4), 2);
        assert_eq!(scroll_start("日本語テキスト", 4, 5), 2);
    }

    #[test]
    fn test_fit_width() {
        assert_eq!(fit_width("short", 10), "short");
        assert_eq!(fit_width("a longer line", 6), "a lon…");
        assert_eq!(fit_width("日本語テキスト", 5), "日本…");
        assert_eq!(fit_width("abc", 0), "");
    }

    #[test]
    fn test_body_rows() {
        assert_eq!(body_rows(24), 17);
        assert_eq!(body_rows(2), 1);
    }
}
