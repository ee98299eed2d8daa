//! Connection status indicator: ● / ○ with the good/bad colour.

use ratatui::style::{Color, Style};
use ratatui::text::Span;

use meshview_core::{Status, StatusTone};

use crate::theme;

pub fn tone_color(tone: StatusTone) -> Color {
    match tone {
        StatusTone::Good => theme::GREEN,
        StatusTone::Bad => theme::RED,
    }
}

/// Styled status dot followed by the status text.
pub fn status_span(status: &Status) -> Span<'static> {
    let symbol = match status.tone {
        StatusTone::Good => "●",
        StatusTone::Bad => "○",
    };
    Span::styled(
        format!("{symbol} {}", status.text),
        Style::default().fg(tone_color(status.tone)),
    )
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn connected_is_green() {
        let span = status_span(&Status::connected());
        assert_eq!(span.content, "● connected");
        assert_eq!(span.style.fg, Some(theme::GREEN));
    }

    #[test]
    fn disconnected_is_red() {
        let span = status_span(&Status::disconnected(Some("connection closed (1006)".into())));
        assert_eq!(span.content, "○ disconnected");
        assert_eq!(span.style.fg, Some(theme::RED));
    }
}
