// ── Layout adapter ──
//
// Hands reconciled graph state to a pluggable layout engine and decides
// when integration restarts. The engine owns positions; the adapter never
// mutates `GraphState`.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::trace;

use crate::graph::GraphState;

/// Default repulsive charge magnitude.
pub const DEFAULT_CHARGE: f64 = 1000.0;
/// Default rest length of a link spring.
pub const DEFAULT_LINK_DISTANCE: f64 = 120.0;
/// Default viewport the layout integrates within.
pub const DEFAULT_VIEWPORT: Size = Size::new(450.0, 400.0);
/// Default drawing surface the viewport is mapped onto.
pub const DEFAULT_CANVAS: Size = Size::new(600.0, 400.0);

/// Zoom range of the canvas view.
const MIN_ZOOM: f64 = 0.25;
const MAX_ZOOM: f64 = 4.0;

// ── Geometry ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn center(self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }
}

// ── Configuration ────────────────────────────────────────────────────

/// When a layout pass restarts integration.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum RestartPolicy {
    /// Restart on every update, even when nothing structural changed.
    #[default]
    Always,
    /// Restart only when nodes or links were added or removed.
    OnChange,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub charge: f64,
    pub link_distance: f64,
    pub viewport: Size,
    pub canvas: Size,
    pub restart: RestartPolicy,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            charge: DEFAULT_CHARGE,
            link_distance: DEFAULT_LINK_DISTANCE,
            viewport: DEFAULT_VIEWPORT,
            canvas: DEFAULT_CANVAS,
            restart: RestartPolicy::default(),
        }
    }
}

// ── Engine seam ──────────────────────────────────────────────────────

/// A physics integrator turning a node/link set into positions over time.
pub trait LayoutEngine {
    /// Apply charge, link distance and viewport size.
    fn configure(&mut self, config: &LayoutConfig);

    /// Replace the node/link set. Positions of surviving ids are kept.
    fn set_graph(&mut self, graph: &GraphState);

    /// Reheat the simulation.
    fn start(&mut self);

    /// Advance one step. Returns `false` once the simulation has cooled.
    fn tick(&mut self) -> bool;

    fn position(&self, id: &str) -> Option<Point>;

    /// Current simulation temperature; zero when stopped.
    fn alpha(&self) -> f64;
}

// ── Adapter ──────────────────────────────────────────────────────────

/// Pushes graph updates into a [`LayoutEngine`] according to a [`RestartPolicy`].
#[derive(Debug)]
pub struct LayoutAdapter<E> {
    engine: E,
    config: LayoutConfig,
    zoom: f64,
    restarts: u64,
}

impl<E: LayoutEngine> LayoutAdapter<E> {
    pub fn new(mut engine: E, config: LayoutConfig) -> Self {
        engine.configure(&config);
        Self {
            engine,
            config,
            zoom: 1.0,
            restarts: 0,
        }
    }

    /// Push the current graph and restart integration if the policy says so.
    /// Returns whether integration restarted.
    pub fn apply(&mut self, graph: &GraphState, structure_changed: bool) -> bool {
        self.engine.set_graph(graph);

        let restart = match self.config.restart {
            RestartPolicy::Always => true,
            RestartPolicy::OnChange => structure_changed,
        };
        if restart {
            self.restart();
        }
        trace!(
            nodes = graph.node_count(),
            links = graph.links().len(),
            restart,
            "layout pass"
        );
        restart
    }

    /// Unconditionally reheat the simulation.
    pub fn restart(&mut self) {
        self.engine.start();
        self.restarts += 1;
    }

    /// Advance one integration step. Returns whether the layout is still moving.
    pub fn tick(&mut self) -> bool {
        self.engine.tick()
    }

    pub fn position(&self, id: &str) -> Option<Point> {
        self.engine.position(id)
    }

    /// Magnify the canvas view. Positions and the simulation are untouched.
    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Canvas region shown at the current zoom as `(x_bounds, y_bounds)`,
    /// centred on the canvas. Zoom 1 shows the whole canvas.
    pub fn visible_bounds(&self) -> ([f64; 2], [f64; 2]) {
        let center = self.config.canvas.center();
        let half_width = center.x / self.zoom;
        let half_height = center.y / self.zoom;
        (
            [center.x - half_width, center.x + half_width],
            [center.y - half_height, center.y + half_height],
        )
    }

    pub fn canvas(&self) -> Size {
        self.config.canvas
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn restarts(&self) -> u64 {
        self.restarts
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }
}

// ── Tests ────────────────────────────────────────────────────────────
