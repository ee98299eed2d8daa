//! Colour legend, one dot per category.

use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::theme;

pub const ENTRIES: &[(&str, Color)] = &[
    ("installed", theme::INSTALLED),
    ("uninstalled", theme::UNINSTALLED),
    ("unreachable", theme::UNREACHABLE),
    ("wired link", theme::WIRED_LINK),
    ("lossless wireless", theme::LOSSLESS_WIRELESS),
    ("unreachable neighbour", theme::UNREACHABLE_NEIGHBOUR),
    ("current", theme::CURRENT),
    ("neighbour", theme::NEIGHBOUR),
    ("other", theme::OTHER),
    ("selected", theme::SELECTED),
    ("route", theme::ROUTE),
];

pub fn lines() -> Vec<Line<'static>> {
    ENTRIES
        .iter()
        .map(|(label, color)| {
            Line::from(vec![
                Span::styled("● ", Style::default().fg(*color)),
                Span::styled(*label, theme::table_row()),
            ])
        })
        .collect()
}
