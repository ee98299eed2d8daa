//! Mesh palette and semantic styling for the TUI.

use ratatui::style::{Color, Modifier, Style};

// ── Core Palette ──────────────────────────────────────────────────────

pub const GRAY: Color = Color::Rgb(0x77, 0x77, 0x77); // #777
pub const LIGHT_GRAY: Color = Color::Rgb(0xAC, 0xAC, 0xA7); // #ACACA7
pub const BLUE: Color = Color::Rgb(0x00, 0x33, 0xff); // #03f
pub const LIGHT_BLUE: Color = Color::Rgb(0x81, 0xF7, 0xD8); // #81F7D8
pub const VIOLET: Color = Color::Rgb(0xcc, 0x00, 0xff); // #c0f
pub const PINK: Color = Color::Rgb(0xff, 0x66, 0x99); // #f69
pub const GREEN: Color = Color::Rgb(0x44, 0xdd, 0x44); // #4d4
pub const LIGHT_GREEN: Color = Color::Rgb(0x88, 0xee, 0x88); // #8e8
pub const YELLOW: Color = Color::Rgb(0xff, 0xff, 0x00); // #ff0
pub const ORANGE: Color = Color::Rgb(0xff, 0x99, 0x00); // #f90
pub const RED: Color = Color::Rgb(0xff, 0x33, 0x00); // #f30

// ── Legend Colors ─────────────────────────────────────────────────────

pub const INSTALLED: Color = GREEN;
pub const UNINSTALLED: Color = LIGHT_GREEN;
pub const UNREACHABLE: Color = LIGHT_GRAY;
pub const WIRED_LINK: Color = YELLOW;
pub const LOSSLESS_WIRELESS: Color = ORANGE;
pub const UNREACHABLE_NEIGHBOUR: Color = RED;
pub const CURRENT: Color = PINK;
pub const NEIGHBOUR: Color = VIOLET;
pub const OTHER: Color = BLUE;
pub const SELECTED: Color = BLUE;
pub const ROUTE: Color = GRAY;

// ── Semantic Styles ───────────────────────────────────────────────────

pub fn title_style() -> Style {
    Style::default().fg(LIGHT_BLUE).add_modifier(Modifier::BOLD)
}

pub fn border_focused() -> Style {
    Style::default().fg(PINK)
}

pub fn border_default() -> Style {
    Style::default().fg(GRAY)
}

pub fn table_header() -> Style {
    Style::default()
        .fg(LIGHT_BLUE)
        .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
}

pub fn table_row() -> Style {
    Style::default().fg(LIGHT_GRAY)
}

/// Header line of a nested sub-table.
pub fn sub_header() -> Style {
    Style::default().fg(GRAY).add_modifier(Modifier::ITALIC)
}

pub fn key_hint() -> Style {
    Style::default().fg(GRAY)
}

pub fn key_hint_key() -> Style {
    Style::default().fg(LIGHT_BLUE).add_modifier(Modifier::BOLD)
}
