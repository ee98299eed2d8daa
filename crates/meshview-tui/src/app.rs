//! Application core: one task owning the engine, multiplexing terminal
//! events, layout/render clocks, and the snapshot feed.

use std::time::Duration;

use chrono::Utc;
use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
};
use tokio::sync::watch;
use tracing::{debug, info};

use meshview_core::{Engine, FeedEvent, FeedHandle, SnapshotCategory, Status};

use crate::action::Action;
use crate::event::{Event, EventReader};
use crate::theme;
use crate::tui::Tui;
use crate::widgets::{graph_canvas, keyed_table, legend, status_indicator};

/// Layout integration rate (~30 Hz).
const LAYOUT_TICK: Duration = Duration::from_millis(33);
/// Redraw rate (20 FPS).
const RENDER_TICK: Duration = Duration::from_millis(50);
const LEGEND_WIDTH: u16 = 26;

/// Top-level application state and event loop.
pub struct App {
    engine: Engine,
    /// `None` once the feed task has exited.
    feed: Option<FeedHandle>,
    feed_url: String,
    status: watch::Receiver<Status>,
    focus: SnapshotCategory,
    running: bool,
}

impl App {
    pub fn new(engine: Engine, feed: Option<FeedHandle>) -> Self {
        let status = engine.status().subscribe();
        let feed_url = feed
            .as_ref()
            .map(|f| f.url().to_string())
            .unwrap_or_default();
        Self {
            engine,
            feed,
            feed_url,
            status,
            focus: SnapshotCategory::Node,
            running: true,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut tui = Tui::enter()?;

        let mut events = EventReader::new(LAYOUT_TICK, RENDER_TICK);
        info!("TUI event loop started");

        while self.running {
            tokio::select! {
                event = events.next() => {
                    let Some(event) = event else {
                        break;
                    };
                    match event {
                        Event::Key(key) => {
                            if let Some(action) = map_key(key) {
                                self.process_action(action);
                            }
                        }
                        Event::LayoutTick => {
                            self.engine.tick();
                        }
                        Event::Render | Event::Resize => {
                            tui.draw(|frame| self.render(frame))?;
                        }
                    }
                }
                feed_event = next_feed_event(self.feed.as_mut()) => {
                    self.handle_feed_event(feed_event);
                }
            }
        }

        events.stop();
        if let Some(feed) = &self.feed {
            feed.shutdown();
        }
        info!("TUI event loop ended");
        tui.exit()
    }

    fn handle_feed_event(&mut self, event: Option<FeedEvent>) {
        match event {
            Some(event) => {
                self.engine.handle_feed_event(event);
            }
            None => {
                debug!("feed task exited");
                self.feed = None;
            }
        }
    }

    fn process_action(&mut self, action: Action) {
        match action {
            Action::Quit => self.running = false,
            Action::FocusNext => {
                self.focus = match self.focus {
                    SnapshotCategory::Node => SnapshotCategory::Neighbour,
                    SnapshotCategory::Neighbour => SnapshotCategory::Node,
                };
            }
            Action::ZoomIn => self.engine.zoom_in(),
            Action::ZoomOut => self.engine.zoom_out(),
            Action::RestartLayout => self.engine.restart_layout(),
        }
    }

    // ── Rendering ────────────────────────────────────────────────────

    fn render(&self, frame: &mut Frame) {
        let [top, tables, status_area] = Layout::vertical([
            Constraint::Min(12),
            Constraint::Percentage(45),
            Constraint::Length(1),
        ])
        .areas(frame.area());

        let [graph_area, legend_area] =
            Layout::horizontal([Constraint::Min(20), Constraint::Length(LEGEND_WIDTH)])
                .areas(top);

        graph_canvas::render(frame, graph_area, &self.engine);
        self.render_legend(frame, legend_area);
        self.render_tables(frame, tables);
        self.render_status_bar(frame, status_area);
    }

    fn render_legend(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(" Legend ")
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_default());
        frame.render_widget(Paragraph::new(legend::lines()).block(block), area);
    }

    fn render_tables(&self, frame: &mut Frame, area: Rect) {
        let weight = |category| if category == self.focus { 2 } else { 1 };
        let [nodes, neighbours] = Layout::vertical([
            Constraint::Fill(weight(SnapshotCategory::Node)),
            Constraint::Fill(weight(SnapshotCategory::Neighbour)),
        ])
        .areas(area);

        for (category, area, title) in [
            (SnapshotCategory::Node, nodes, "Nodes"),
            (SnapshotCategory::Neighbour, neighbours, "Neighbours"),
        ] {
            keyed_table::render(
                frame,
                area,
                title,
                self.engine.table(category),
                category == self.focus,
            );
        }
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let status = self.status.borrow().clone();
        let stats = self.engine.stats();

        let mut spans = vec![Span::raw(" "), status_indicator::status_span(&status)];
        if let Some(detail) = &status.detail {
            spans.push(Span::styled(format!(" ({detail})"), theme::key_hint()));
        }
        if !self.feed_url.is_empty() {
            spans.push(Span::styled(format!(" │ {}", self.feed_url), theme::table_row()));
        }
        spans.push(Span::styled(
            format!(" │ {} snapshots", stats.applied),
            theme::table_row(),
        ));
        if let Some(age) = stats
            .last_applied
            .and_then(|at| (Utc::now() - at).to_std().ok())
        {
            let age = Duration::from_secs(age.as_secs());
            spans.push(Span::styled(
                format!(", updated {} ago", humantime::format_duration(age)),
                theme::table_row(),
            ));
        }
        let unknown = self.engine.diagnostics().len();
        if unknown > 0 {
            spans.push(Span::styled(
                format!(" │ {unknown} diagnostics"),
                ratatui::style::Style::default().fg(theme::UNREACHABLE_NEIGHBOUR),
            ));
        }

        spans.push(Span::styled(" │ ", theme::key_hint()));
        for (key, label) in [("q", "quit"), ("Tab", "focus"), ("+/-", "zoom"), ("r", "relayout")] {
            spans.push(Span::styled(key, theme::key_hint_key()));
            spans.push(Span::styled(format!(" {label}  "), theme::key_hint()));
        }

        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }
}

/// Pending forever when there is no feed, so `select!` keeps serving the
/// terminal.
async fn next_feed_event(feed: Option<&mut FeedHandle>) -> Option<FeedEvent> {
    match feed {
        Some(feed) => feed.next_event().await,
        None => std::future::pending().await,
    }
}

/// Global key bindings.
fn map_key(key: KeyEvent) -> Option<Action> {
    match (key.modifiers, key.code) {
        (KeyModifiers::CONTROL, KeyCode::Char('c')) | (_, KeyCode::Char('q')) => {
            Some(Action::Quit)
        }
        (_, KeyCode::Tab) => Some(Action::FocusNext),
        (_, KeyCode::Char('+' | '=')) => Some(Action::ZoomIn),
        (_, KeyCode::Char('-')) => Some(Action::ZoomOut),
        (_, KeyCode::Char('r')) => Some(Action::RestartLayout),
        _ => None,
    }
}
