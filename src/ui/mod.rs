use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::Style;
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState};
use ratatui::Frame;
use regex::Regex;
use strum::IntoEnumIterator;
use time::format_description::well_known::Rfc3339;
use time::{Duration, OffsetDateTime};
use unicode_width::UnicodeWidthChar;

use crate::app::state::{AppState, SortColumn};
use crate::config::Theme;
use crate::feed::FeedStatus;
use crate::highlight::build_match_regex;
use crate::records::{derive_tags, Period, RunRecord, SplitColumn};
use crate::timefmt;

const WORLD_CELL_WIDTH: usize = 24;

pub fn draw_app(frame: &mut Frame, state: &AppState, table_state: &mut TableState) {
    let theme = Theme::resolve(state.theme);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(5),
            Constraint::Length(10),
            Constraint::Length(2),
        ])
        .split(frame.size());

    frame.render_widget(build_period_bar(state, &theme), vertical[0]);

    let rows = state.visible_rows();
    table_state.select(if rows.is_empty() {
        None
    } else {
        Some(state.selected.min(rows.len() - 1))
    });
    let table = build_table(state, &rows, &theme);
    frame.render_stateful_widget(table, vertical[1], table_state);

    frame.render_widget(build_detail(state, &theme), vertical[2]);
    frame.render_widget(build_status(state, &rows, &theme), vertical[3]);
}

fn build_period_bar<'a>(state: &AppState, theme: &Theme) -> Paragraph<'a> {
    let mut spans = Vec::new();
    for (index, period) in Period::iter().enumerate() {
        let label = format!(" [{}] {} ", index + 1, period.label());
        if period == state.snapshot.period {
            spans.push(Span::styled(label, theme.accent));
        } else {
            spans.push(Span::styled(label, theme.dim));
        }
    }
    if state.is_loading() {
        spans.push(Span::styled("  updating…", theme.loading));
    }
    Paragraph::new(Line::from(spans)).style(theme.base)
}

fn build_table<'a>(state: &AppState, rows: &[&RunRecord], theme: &Theme) -> Table<'a> {
    let highlight = build_match_regex(state.search.query.trim());

    let header_cells: Vec<Cell> = table_columns(state)
        .into_iter()
        .map(|(title, sorted)| {
            if sorted {
                Cell::from(format!("{title} {}", state.direction.arrow())).style(theme.accent)
            } else {
                Cell::from(title).style(theme.header)
            }
        })
        .collect();
    let header = Row::new(header_cells).height(1);

    let body: Vec<Row> = rows
        .iter()
        .map(|record| {
            let mut cells = Vec::with_capacity(11);
            cells.push(Cell::from(Line::from(world_spans(
                record,
                highlight.as_ref(),
                theme,
            ))));
            cells.push(time_cell(record.final_igt, theme));
            for column in SplitColumn::iter() {
                cells.push(time_cell(record.split(column), theme));
            }
            cells.push(time_cell(record.final_rta, theme));
            cells.push(Cell::from(Span::styled(
                relative_date(record.date),
                theme.dim,
            )));
            cells.push(Cell::from(Line::from(tag_spans(record, theme))));
            Row::new(cells).height(1)
        })
        .collect();

    let title = if body.is_empty() {
        "Records (none for this view)"
    } else {
        "Records"
    };

    Table::new(body, column_widths())
        .header(header)
        .block(Block::default().title(title).borders(Borders::ALL))
        .style(theme.base)
        .highlight_style(theme.selected_row)
        .highlight_symbol("▸ ")
}

fn table_columns(state: &AppState) -> Vec<(&'static str, bool)> {
    let mut columns = vec![
        ("World", false),
        ("IGT", state.sort == SortColumn::Igt),
    ];
    for column in SplitColumn::iter() {
        columns.push((column.title(), state.sort == SortColumn::Split(column)));
    }
    columns.push(("RTA", state.sort == SortColumn::Rta));
    columns.push(("Date", state.sort == SortColumn::Date));
    columns.push(("Tags", false));
    columns
}

fn column_widths() -> Vec<Constraint> {
    let mut widths = vec![Constraint::Min(14), Constraint::Length(8)];
    for column in SplitColumn::iter() {
        widths.push(Constraint::Length(column.title().len() as u16 + 2));
    }
    widths.push(Constraint::Length(8));
    widths.push(Constraint::Length(10));
    widths.push(Constraint::Min(18));
    widths
}

fn time_cell<'a>(ms: i64, theme: &Theme) -> Cell<'a> {
    let label = timefmt::format_split(ms);
    if label == timefmt::NOT_REACHED {
        Cell::from(Span::styled(label, theme.dim))
    } else {
        Cell::from(label)
    }
}

fn world_spans<'a>(record: &RunRecord, highlight: Option<&Regex>, theme: &Theme) -> Vec<Span<'a>> {
    let name = truncate_to_width(&record.world_name, WORLD_CELL_WIDTH);
    match highlight {
        Some(regex) => highlight_text(&name, regex, theme.base, theme.highlight),
        None => vec![Span::styled(name, theme.base)],
    }
}

fn tag_spans<'a>(record: &RunRecord, theme: &Theme) -> Vec<Span<'a>> {
    let mut spans = Vec::new();
    for tag in derive_tags(record) {
        if !spans.is_empty() {
            spans.push(Span::raw(" "));
        }
        spans.push(Span::styled(tag.label, theme.tag(tag.category)));
    }
    spans
}

fn build_detail<'a>(state: &AppState, theme: &Theme) -> Paragraph<'a> {
    let text: Text = match state.selected_record() {
        Some(record) => {
            let mut lines = Vec::new();
            let mut header = vec![Span::styled(record.world_name.clone(), theme.header)];
            header.push(Span::raw("  "));
            header.extend(tag_spans(record, theme));
            lines.push(Line::from(header));
            lines.push(Line::from(Span::styled(
                format!(
                    "{} • category {} • saved {}",
                    absolute_date(record.date),
                    record.category,
                    relative_date(record.date)
                ),
                theme.dim,
            )));
            lines.push(Line::from(""));

            lines.push(split_detail_line("IGT", record.final_igt, theme));
            for column in SplitColumn::iter() {
                lines.push(split_detail_line(
                    column.title(),
                    record.split(column),
                    theme,
                ));
            }
            lines.push(split_detail_line("RTA", record.final_rta, theme));
            if record.retimed_igt != 0 && record.retimed_igt != record.final_igt {
                lines.push(split_detail_line("Retimed", record.retimed_igt, theme));
            }
            if !record.source_path.is_empty() {
                lines.push(Line::from(Span::styled(
                    record.source_path.clone(),
                    theme.dim,
                )));
            }
            Text::from(lines)
        }
        None => Text::from("Select a run to see split details."),
    };

    Paragraph::new(text)
        .style(theme.base)
        .block(Block::default().title("Run").borders(Borders::ALL))
}

fn split_detail_line<'a>(label: &str, ms: i64, theme: &Theme) -> Line<'a> {
    let value = timefmt::format_split_detail(ms);
    let value_style = if value == timefmt::NOT_REACHED {
        theme.dim
    } else {
        theme.base
    };
    Line::from(vec![
        Span::styled(format!("{label:<13}"), theme.dim),
        Span::styled(value, value_style),
    ])
}

fn build_status<'a>(state: &AppState, rows: &[&RunRecord], theme: &Theme) -> Paragraph<'a> {
    let total = state.snapshot.records.len();
    let mut spans = vec![Span::raw(format!(
        "{} of {} runs • sort {} {}",
        rows.len(),
        total,
        state.sort.title(),
        state.direction.arrow()
    ))];

    if !state.excluded_empty.is_empty() {
        let columns: Vec<&str> = state
            .excluded_empty
            .iter()
            .map(|column| column.title())
            .collect();
        spans.push(Span::raw(" • hide empty: "));
        spans.push(Span::styled(columns.join(", "), theme.accent));
    }
    if let Some(version) = &state.version_filter {
        spans.push(Span::raw(" • version "));
        spans.push(Span::styled(version.clone(), theme.accent));
    }
    if state.search.active || !state.search.query.is_empty() {
        spans.push(Span::raw(" • /"));
        spans.push(Span::styled(state.search.query.clone(), theme.accent));
        if state.search.active {
            spans.push(Span::styled("▌", theme.accent));
        }
    }

    match state.snapshot.status {
        FeedStatus::Loading => {
            spans.push(Span::styled("  updating…", theme.loading));
        }
        FeedStatus::Error => {
            let message = state
                .snapshot
                .error
                .clone()
                .unwrap_or_else(|| "update failed".to_string());
            spans.push(Span::raw("  "));
            spans.push(Span::styled(format!("✗ {message} (r to retry)"), theme.error));
        }
        FeedStatus::Idle | FeedStatus::Success => {}
    }

    let first = Line::from(spans);
    let second = match &state.status_message {
        Some(message) => Line::from(Span::styled(message.clone(), theme.accent)),
        None => Line::from(Span::styled(
            "1-5 period • r update • s/S sort • f hide empty • v version • / search • t theme • q quit",
            theme.dim,
        )),
    };

    Paragraph::new(Text::from(vec![first, second])).style(theme.base)
}

fn highlight_text<'a>(
    text: &str,
    regex: &Regex,
    base: Style,
    highlight: Style,
) -> Vec<Span<'a>> {
    let mut spans = Vec::new();
    let mut cursor = 0;
    for found in regex.find_iter(text) {
        if found.start() > cursor {
            spans.push(Span::styled(text[cursor..found.start()].to_string(), base));
        }
        spans.push(Span::styled(found.as_str().to_string(), highlight));
        cursor = found.end();
    }
    if cursor < text.len() {
        spans.push(Span::styled(text[cursor..].to_string(), base));
    }
    if spans.is_empty() {
        spans.push(Span::styled(text.to_string(), base));
    }
    spans
}

/// Truncates to a display-cell budget, appending `…` when the name is cut.
fn truncate_to_width(text: &str, max_width: usize) -> String {
    let total: usize = text.chars().filter_map(UnicodeWidthChar::width).sum();
    if total <= max_width {
        return text.to_string();
    }
    let mut width = 0;
    let mut out = String::new();
    for ch in text.chars() {
        let ch_width = ch.width().unwrap_or(0);
        if width + ch_width > max_width.saturating_sub(1) {
            break;
        }
        width += ch_width;
        out.push(ch);
    }
    out.push('…');
    out
}

fn relative_date(epoch_ms: i64) -> String {
    let Ok(then) = OffsetDateTime::from_unix_timestamp(epoch_ms / 1000) else {
        return epoch_ms.to_string();
    };
    let now = OffsetDateTime::now_utc();
    let diff = now - then;
    if diff.is_negative() || diff < Duration::seconds(45) {
        return "just now".to_string();
    }
    if diff < Duration::minutes(90) {
        let mins = diff.whole_minutes().max(1);
        return format!("{mins}m ago");
    }
    if diff < Duration::hours(36) {
        let hours = diff.whole_hours().max(1);
        return format!("{hours}h ago");
    }
    if diff < Duration::days(10) {
        let days = diff.whole_days().max(1);
        return format!("{days}d ago");
    }
    then.date().to_string()
}

fn absolute_date(epoch_ms: i64) -> String {
    OffsetDateTime::from_unix_timestamp(epoch_ms / 1000)
        .map(|dt| dt.format(&Rfc3339).unwrap_or_else(|_| epoch_ms.to_string()))
        .unwrap_or_else(|_| epoch_ms.to_string())
}
