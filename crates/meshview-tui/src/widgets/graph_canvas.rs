//! Node/link graph drawn on a braille canvas.
//!
//! Layout coordinates live in the viewport (origin top-left, y down) and
//! are drawn unscaled onto the canvas, whose y axis points up. Zoom only
//! narrows the canvas region on screen.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::Span;
use ratatui::widgets::canvas::{Canvas, Circle, Context, Line as CanvasLine};
use ratatui::widgets::{Block, BorderType, Borders};

use meshview_core::{Engine, LayoutEngine, Point, Size};

use crate::theme;

/// Node dot radius, in canvas units.
const NODE_RADIUS: f64 = 5.0;

/// Map a layout position onto canvas coordinates.
pub fn to_canvas(p: Point, canvas: Size) -> (f64, f64) {
    (p.x, canvas.height - p.y)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::as_conversions)]
pub fn render<E: LayoutEngine>(frame: &mut Frame, area: Rect, engine: &Engine<E>) {
    let layout = engine.layout();
    let canvas_size = layout.canvas();
    let (x_bounds, y_bounds) = layout.visible_bounds();
    let title = format!(
        " Topology  ·  {} nodes  {} links  ·  zoom {}% ",
        engine.graph().node_count(),
        engine.graph().links().len(),
        (layout.zoom() * 100.0).round() as u32,
    );
    let block = Block::default()
        .title(title)
        .title_style(theme::title_style())
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(theme::border_default());

    let canvas = Canvas::default()
        .block(block)
        .x_bounds(x_bounds)
        .y_bounds(y_bounds)
        .paint(|ctx: &mut Context<'_>| paint(ctx, engine, canvas_size));

    frame.render_widget(canvas, area);
}

fn paint<E: LayoutEngine>(ctx: &mut Context<'_>, engine: &Engine<E>, canvas: Size) {
    let at = |id: &str| engine.position(id).map(|p| to_canvas(p, canvas));

    for link in engine.graph().links() {
        let (Some((x1, y1)), Some((x2, y2))) = (at(&link.source), at(&link.target)) else {
            continue;
        };
        ctx.draw(&CanvasLine {
            x1,
            y1,
            x2,
            y2,
            color: theme::WIRED_LINK,
        });
    }

    // Nodes on top of links.
    ctx.layer();

    for node in engine.graph().nodes() {
        let Some((x, y)) = at(&node.id) else {
            continue;
        };
        ctx.draw(&Circle {
            x,
            y,
            radius: NODE_RADIUS,
            color: theme::INSTALLED,
        });
        ctx.print(
            x + NODE_RADIUS + 2.0,
            y,
            Span::styled(node.id.clone(), Style::default().fg(theme::LIGHT_GRAY)),
        );
    }
}
