//! Keyed row table; nested peer lists render as multi-line cells.

use ratatui::Frame;
use ratatui::layout::{Constraint, Rect};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, BorderType, Borders, Cell as UiCell, Row as UiRow, Table};

use meshview_core::{Cell, SubTable, TableRowState};

use crate::theme;

/// Text lines of one cell. A sub-table yields its header line followed by
/// one line per sub-row, columns padded to a common width.
pub fn cell_lines(cell: &Cell) -> Vec<String> {
    match cell {
        Cell::Text(text) => vec![text.clone()],
        Cell::SubTable(sub) => sub_table_lines(sub),
    }
}

fn sub_table_lines(sub: &SubTable) -> Vec<String> {
    let widths: Vec<usize> = sub
        .headers
        .iter()
        .enumerate()
        .map(|(col, header)| {
            sub.rows
                .iter()
                .filter_map(|row| row.get(col))
                .map(|value| value.chars().count())
                .chain(std::iter::once(header.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let format_row = |values: &[String]| {
        values
            .iter()
            .zip(&widths)
            .map(|(value, width)| format!("{value:<width$}"))
            .collect::<Vec<_>>()
            .join(" ")
            .trim_end()
            .to_owned()
    };

    std::iter::once(format_row(&sub.headers))
        .chain(sub.rows.iter().map(|row| format_row(row.as_slice())))
        .collect()
}

fn ui_cell(cell: &Cell) -> UiCell<'static> {
    let lines = cell_lines(cell);
    match cell {
        Cell::Text(_) => UiCell::from(lines.into_iter().next().unwrap_or_default()),
        Cell::SubTable(_) => {
            let mut lines = lines.into_iter();
            let header = lines
                .next()
                .map(|h| Line::from(Span::styled(h, theme::sub_header())));
            let text: Text<'static> = header.into_iter().chain(lines.map(Line::from)).collect();
            UiCell::from(text)
        }
    }
}

/// Height of a row: its tallest cell.
pub fn row_height(cells: &[Cell]) -> u16 {
    let lines = cells.iter().map(Cell::height).max().unwrap_or(1);
    u16::try_from(lines).unwrap_or(u16::MAX)
}

pub fn render(frame: &mut Frame, area: Rect, title: &str, table: &TableRowState, focused: bool) {
    let header = UiRow::new(
        table
            .headers()
            .iter()
            .map(|h| UiCell::from(h.clone()).style(theme::table_header())),
    );

    let rows: Vec<UiRow> = table
        .rows()
        .map(|(_, cells)| {
            UiRow::new(cells.iter().map(ui_cell))
                .height(row_height(cells))
                .style(theme::table_row())
        })
        .collect();

    let widths = vec![Constraint::Fill(1); table.headers().len().max(1)];
    let block = Block::default()
        .title(format!(" {title} ({}) ", table.len()))
        .title_style(theme::title_style())
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(if focused {
            theme::border_focused()
        } else {
            theme::border_default()
        });

    frame.render_widget(Table::new(rows, widths).header(header).block(block), area);
}
