// ── Force-directed layout ──
//
// A velocity-Verlet integrator in the style of the classic d3 force layout:
// link springs, gravity toward the viewport centre, pairwise charge and
// friction, all scaled by a cooling `alpha`. Bodies are keyed by node id so
// positions survive graph updates.

use indexmap::IndexMap;

use crate::graph::GraphState;
use crate::layout::{LayoutConfig, LayoutEngine, Point, Size};

/// Temperature a restarted simulation starts at.
const START_ALPHA: f64 = 0.1;
/// Per-tick cooling factor.
const ALPHA_DECAY: f64 = 0.99;
/// Below this temperature the simulation stops.
const ALPHA_MIN: f64 = 0.005;
const FRICTION: f64 = 0.9;
const GRAVITY: f64 = 0.1;
const LINK_STRENGTH: f64 = 1.0;
/// Radius (relative to the smaller viewport side) new nodes are placed on.
const SPAWN_RADIUS: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Body {
    x: f64,
    y: f64,
    px: f64,
    py: f64,
    weight: f64,
}

impl Body {
    fn at(p: Point) -> Self {
        Self {
            x: p.x,
            y: p.y,
            px: p.x,
            py: p.y,
            weight: 0.0,
        }
    }
}

/// Built-in [`LayoutEngine`].
#[derive(Debug, Clone)]
pub struct ForceLayout {
    charge: f64,
    link_distance: f64,
    size: Size,
    bodies: IndexMap<String, Body>,
    links: Vec<(usize, usize)>,
    alpha: f64,
    spawned: u64,
}

impl Default for ForceLayout {
    fn default() -> Self {
        let config = LayoutConfig::default();
        Self {
            charge: config.charge,
            link_distance: config.link_distance,
            size: config.viewport,
            bodies: IndexMap::new(),
            links: Vec::new(),
            alpha: 0.0,
            spawned: 0,
        }
    }
}

impl ForceLayout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Spawn point for the n-th node ever placed: a golden-angle walk on a
    /// circle around the centre, so successive nodes never coincide.
    #[allow(clippy::cast_precision_loss, clippy::as_conversions)]
    fn spawn_point(&self, n: u64) -> Point {
        let center = self.size.center();
        let radius = self.size.width.min(self.size.height) * SPAWN_RADIUS;
        let angle = n as f64 * 2.399_963_229_728_653;
        // Slight radial spread keeps colinear triples out of the start state.
        let r = radius * (1.0 + 0.05 * (n as f64 * 7.3).sin());
        Point::new(center.x + r * angle.cos(), center.y + r * angle.sin())
    }

    fn apply_links(&mut self) {
        let alpha = self.alpha;
        for &(s, t) in &self.links {
            let (Some(source), Some(target)) = (
                self.bodies.get_index(s).map(|(_, b)| *b),
                self.bodies.get_index(t).map(|(_, b)| *b),
            ) else {
                continue;
            };
            let mut dx = target.x - source.x;
            let mut dy = target.y - source.y;
            let l2 = dx * dx + dy * dy;
            if l2 <= 0.0 {
                continue;
            }
            let l = l2.sqrt();
            let scale = alpha * LINK_STRENGTH * (l - self.link_distance) / l;
            dx *= scale;
            dy *= scale;

            let total = source.weight + target.weight;
            let k = if total > 0.0 { source.weight / total } else { 0.5 };
            if let Some((_, b)) = self.bodies.get_index_mut(t) {
                b.x -= dx * k;
                b.y -= dy * k;
            }
            if let Some((_, b)) = self.bodies.get_index_mut(s) {
                b.x += dx * (1.0 - k);
                b.y += dy * (1.0 - k);
            }
        }
    }

    fn apply_gravity(&mut self) {
        let k = self.alpha * GRAVITY;
        let center = self.size.center();
        for body in self.bodies.values_mut() {
            body.x += (center.x - body.x) * k;
            body.y += (center.y - body.y) * k;
        }
    }

    /// Pairwise repulsion applied to the previous position, which the
    /// Verlet step turns into velocity.
    fn apply_charge(&mut self) {
        let strength = self.alpha * self.charge;
        let n = self.bodies.len();
        for i in 0..n {
            for j in (i + 1)..n {
                let (Some((_, a)), Some((_, b))) =
                    (self.bodies.get_index(i), self.bodies.get_index(j))
                else {
                    continue;
                };
                let dx = b.x - a.x;
                let dy = b.y - a.y;
                let d2 = (dx * dx + dy * dy).max(1.0);
                let k = strength / d2;
                if let Some((_, a)) = self.bodies.get_index_mut(i) {
                    a.px += dx * k;
                    a.py += dy * k;
                }
                if let Some((_, b)) = self.bodies.get_index_mut(j) {
                    b.px -= dx * k;
                    b.py -= dy * k;
                }
            }
        }
    }

    fn integrate(&mut self) {
        for body in self.bodies.values_mut() {
            let x = body.x;
            let y = body.y;
            body.x -= (body.px - x) * FRICTION;
            body.y -= (body.py - y) * FRICTION;
            body.px = x;
            body.py = y;
        }
    }
}

impl LayoutEngine for ForceLayout {
    fn configure(&mut self, config: &LayoutConfig) {
        self.charge = config.charge;
        self.link_distance = config.link_distance;
        self.size = config.viewport;
    }

    fn set_graph(&mut self, graph: &GraphState) {
        let mut bodies = IndexMap::with_capacity(graph.node_count());
        for node in graph.nodes() {
            let body = match self.bodies.get(&node.id) {
                Some(body) => *body,
                None => {
                    let p = self.spawn_point(self.spawned);
                    self.spawned += 1;
                    Body::at(p)
                }
            };
            bodies.insert(node.id.clone(), body);
        }

        self.links = graph
            .links()
            .iter()
            .filter_map(|link| {
                Some((
                    bodies.get_index_of(&link.source)?,
                    bodies.get_index_of(&link.target)?,
                ))
            })
            .collect();

        for body in bodies.values_mut() {
            body.weight = 0.0;
        }
        for &(s, t) in &self.links {
            for index in [s, t] {
                if let Some((_, body)) = bodies.get_index_mut(index) {
                    body.weight += 1.0;
                }
            }
        }

        self.bodies = bodies;
    }

    fn start(&mut self) {
        self.alpha = START_ALPHA;
    }

    fn tick(&mut self) -> bool {
        if self.alpha < ALPHA_MIN {
            self.alpha = 0.0;
            return false;
        }

        self.apply_links();
        self.apply_gravity();
        self.apply_charge();
        self.integrate();

        self.alpha *= ALPHA_DECAY;
        true
    }

    fn position(&self, id: &str) -> Option<Point> {
        self.bodies.get(id).map(|b| Point::new(b.x, b.y))
    }

    fn alpha(&self) -> f64 {
        self.alpha
    }
}

// ── Tests ────────────────────────────────────────────────────────────
