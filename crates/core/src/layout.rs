//! Force-directed layout for the element graph.
//!
//! Follows the d3-force velocity-Verlet model: every tick applies many-body
//! repulsion, link springs and centering, then integrates velocities with
//! damping while `alpha` cools toward `alpha_target`. Nodes with a pinned
//! position (`fx`/`fy`) stay put; dragging is expressed as pin updates so the
//! layout never restarts from scratch.

use std::collections::HashMap;
use std::f64::consts::PI;

use serde::Serialize;
use tracing::{debug, warn};

use crate::types::{ElementType, GraphData};

const INITIAL_RADIUS: f64 = 10.0;
const ALPHA_MIN: f64 = 0.001;
const VELOCITY_DECAY: f64 = 0.4;
/// Alpha target while a node is being dragged
const DRAG_ALPHA_TARGET: f64 = 0.3;
const DISTANCE_MIN2: f64 = 1.0;

/// Tunables for the simulation.
#[derive(Clone, Copy, Debug)]
pub struct ForceParams {
    /// Many-body strength; negative repels
    pub charge: f64,
    /// Rest length of link springs
    pub link_distance: f64,
    /// Center of the panel the graph is drawn in
    pub center: (f64, f64),
}

impl Default for ForceParams {
    fn default() -> Self {
        Self {
            charge: -30.0,
            link_distance: 30.0,
            center: (0.0, 0.0),
        }
    }
}

/// Simulated node: position, velocity and optional pin
#[derive(Clone, Debug, Serialize)]
pub struct SimNode {
    pub id: String,
    #[serde(skip)]
    pub element: ElementType,
    #[serde(rename = "type")]
    pub kind: String,
    pub length: f64,
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub fx: Option<f64>,
    pub fy: Option<f64>,
}

/// Link with endpoints resolved to node indices, plus its spring constants.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct SimLink {
    pub source: usize,
    pub target: usize,
    #[serde(skip)]
    strength: f64,
    #[serde(skip)]
    bias: f64,
}

/// Force simulation state. Drive it with [`Simulation::tick`].
#[derive(Clone, Debug)]
pub struct Simulation {
    nodes: Vec<SimNode>,
    links: Vec<SimLink>,
    index: HashMap<String, usize>,
    params: ForceParams,
    alpha: f64,
    alpha_target: f64,
    alpha_decay: f64,
}

impl Simulation {
    /// Build a simulation from graph data.
    ///
    /// Links whose endpoints do not name an existing node are dropped with a
    /// warning. Duplicate node ids keep the first occurrence for link lookup.
    pub fn new(data: &GraphData, params: ForceParams) -> Self {
        let mut index = HashMap::with_capacity(data.nodes.len());
        let initial_angle = PI * (3.0 - 5f64.sqrt());

        let nodes: Vec<SimNode> = data
            .nodes
            .iter()
            .enumerate()
            .map(|(i, n)| {
                if index.insert(n.id.clone(), i).is_some() {
                    warn!(id = %n.id, "duplicate graph node id");
                }
                // Phyllotaxis placement, deterministic and overlap-free.
                let radius = INITIAL_RADIUS * (0.5 + i as f64).sqrt();
                let angle = i as f64 * initial_angle;
                SimNode {
                    id: n.id.clone(),
                    element: n.element(),
                    kind: n.kind.clone(),
                    length: n.length,
                    x: params.center.0 + radius * angle.cos(),
                    y: params.center.1 + radius * angle.sin(),
                    vx: 0.0,
                    vy: 0.0,
                    fx: None,
                    fy: None,
                }
            })
            .collect();
        // Re-insert in reverse so the first occurrence wins.
        for (i, n) in nodes.iter().enumerate().rev() {
            index.insert(n.id.clone(), i);
        }

        let mut resolved: Vec<(usize, usize)> = Vec::with_capacity(data.links.len());
        for link in &data.links {
            match (index.get(&link.source), index.get(&link.target)) {
                (Some(&s), Some(&t)) => resolved.push((s, t)),
                _ => warn!(
                    source = %link.source,
                    target = %link.target,
                    "dropping link with unknown endpoint"
                ),
            }
        }

        let mut degree = vec![0usize; nodes.len()];
        for &(s, t) in &resolved {
            degree[s] += 1;
            degree[t] += 1;
        }
        let links = resolved
            .into_iter()
            .map(|(s, t)| {
                let (ds, dt) = (degree[s] as f64, degree[t] as f64);
                SimLink {
                    source: s,
                    target: t,
                    strength: 1.0 / ds.min(dt),
                    bias: ds / (ds + dt),
                }
            })
            .collect();

        debug!(nodes = nodes.len(), "force simulation created");
        Self {
            nodes,
            links,
            index,
            params,
            alpha: 1.0,
            alpha_target: 0.0,
            alpha_decay: 1.0 - ALPHA_MIN.powf(1.0 / 300.0),
        }
    }

    pub fn nodes(&self) -> &[SimNode] {
        &self.nodes
    }

    pub fn links(&self) -> &[SimLink] {
        &self.links
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Cooled down and not being held warm by a drag.
    pub fn is_settled(&self) -> bool {
        self.alpha < ALPHA_MIN && self.alpha_target < ALPHA_MIN
    }

    pub fn node(&self, id: &str) -> Option<&SimNode> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    /// Advance the simulation by one step.
    pub fn tick(&mut self) {
        self.alpha += (self.alpha_target - self.alpha) * self.alpha_decay;
        let alpha = self.alpha;

        self.apply_links(alpha);
        self.apply_many_body(alpha);
        self.apply_center();

        for n in &mut self.nodes {
            match n.fx {
                Some(fx) => {
                    n.x = fx;
                    n.vx = 0.0;
                }
                None => {
                    n.vx *= 1.0 - VELOCITY_DECAY;
                    n.x += n.vx;
                }
            }
            match n.fy {
                Some(fy) => {
                    n.y = fy;
                    n.vy = 0.0;
                }
                None => {
                    n.vy *= 1.0 - VELOCITY_DECAY;
                    n.y += n.vy;
                }
            }
        }
    }

    /// Tick until alpha cools below the threshold or `max_ticks` is reached.
    /// Returns the number of ticks run.
    pub fn run(&mut self, max_ticks: usize) -> usize {
        let mut ticks = 0;
        while !self.is_settled() && ticks < max_ticks {
            self.tick();
            ticks += 1;
        }
        ticks
    }

    /// Pin a node under the pointer and reheat the layout.
    pub fn drag_start(&mut self, id: &str, x: f64, y: f64) -> bool {
        let Some(&i) = self.index.get(id) else {
            return false;
        };
        self.alpha_target = DRAG_ALPHA_TARGET;
        let n = &mut self.nodes[i];
        n.fx = Some(x);
        n.fy = Some(y);
        true
    }

    /// Move the pin of a dragged node.
    pub fn drag(&mut self, id: &str, x: f64, y: f64) -> bool {
        let Some(&i) = self.index.get(id) else {
            return false;
        };
        let n = &mut self.nodes[i];
        n.fx = Some(x);
        n.fy = Some(y);
        true
    }

    /// Release the pin and let the layout cool down again.
    pub fn drag_end(&mut self, id: &str) -> bool {
        let Some(&i) = self.index.get(id) else {
            return false;
        };
        self.alpha_target = 0.0;
        let n = &mut self.nodes[i];
        n.fx = None;
        n.fy = None;
        true
    }

    fn apply_links(&mut self, alpha: f64) {
        let distance = self.params.link_distance;
        for (k, link) in self.links.iter().enumerate() {
            let (s, t) = (&self.nodes[link.source], &self.nodes[link.target]);
            let mut x = t.x + t.vx - s.x - s.vx;
            let mut y = t.y + t.vy - s.y - s.vy;
            if x == 0.0 {
                x = jiggle(k);
            }
            if y == 0.0 {
                y = jiggle(k + 1);
            }
            let l = (x * x + y * y).sqrt();
            let l = (l - distance) / l * alpha * link.strength;
            x *= l;
            y *= l;

            let t = &mut self.nodes[link.target];
            t.vx -= x * link.bias;
            t.vy -= y * link.bias;
            let s = &mut self.nodes[link.source];
            s.vx += x * (1.0 - link.bias);
            s.vy += y * (1.0 - link.bias);
        }
    }

    fn apply_many_body(&mut self, alpha: f64) {
        let strength = self.params.charge;
        let n = self.nodes.len();
        for i in 0..n {
            let (xi, yi) = (self.nodes[i].x, self.nodes[i].y);
            let (mut dvx, mut dvy) = (0.0, 0.0);
            for j in 0..n {
                if i == j {
                    continue;
                }
                let mut x = self.nodes[j].x - xi;
                let mut y = self.nodes[j].y - yi;
                if x == 0.0 {
                    x = jiggle(i * n + j);
                }
                if y == 0.0 {
                    y = jiggle(j * n + i);
                }
                let mut l = x * x + y * y;
                if l < DISTANCE_MIN2 {
                    l = (DISTANCE_MIN2 * l).sqrt();
                }
                dvx += x * strength * alpha / l;
                dvy += y * strength * alpha / l;
            }
            self.nodes[i].vx += dvx;
            self.nodes[i].vy += dvy;
        }
    }

    fn apply_center(&mut self) {
        let n = self.nodes.len();
        if n == 0 {
            return;
        }
        let (sx, sy) = self
            .nodes
            .iter()
            .fold((0.0, 0.0), |(ax, ay), node| (ax + node.x, ay + node.y));
        let dx = sx / n as f64 - self.params.center.0;
        let dy = sy / n as f64 - self.params.center.1;
        for node in &mut self.nodes {
            node.x -= dx;
            node.y -= dy;
        }
    }
}

/// Tiny deterministic offset used to separate coincident points.
fn jiggle(seed: usize) -> f64 {
    let s = (seed % 7) as f64 + 1.0;
    if seed % 2 == 0 {
        s * 1e-6
    } else {
        -s * 1e-6
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{GraphLink, GraphNode};

    fn node(id: &str, kind: &str, length: f64) -> GraphNode {
        GraphNode {
            id: id.into(),
            kind: kind.into(),
            length,
        }
    }

    fn link(s: &str, t: &str) -> GraphLink {
        GraphLink {
            source: s.into(),
            target: t.into(),
        }
    }

    fn chain() -> GraphData {
        GraphData {
            nodes: vec![
                node("f0", "fiveprime", 2.0),
                node("s0", "stem", 4.0),
                node("h0", "hairpin", 5.0),
            ],
            links: vec![link("f0", "s0"), link("s0", "h0")],
        }
    }

    fn dist(a: &SimNode, b: &SimNode) -> f64 {
        ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt()
    }

    #[test]
    fn test_settles_within_budget() {
        let mut sim = Simulation::new(&chain(), ForceParams::default());
        let ticks = sim.run(1000);
        assert!(sim.is_settled());
        assert!(ticks <= 301, "took {ticks} ticks");
    }

    #[test]
    fn test_centered_on_panel() {
        let params = ForceParams {
            center: (400.0, 300.0),
            ..ForceParams::default()
        };
        let mut sim = Simulation::new(&chain(), params);
        sim.run(300);
        let n = sim.nodes().len() as f64;
        let mx = sim.nodes().iter().map(|n| n.x).sum::<f64>() / n;
        let my = sim.nodes().iter().map(|n| n.y).sum::<f64>() / n;
        assert!((mx - 400.0).abs() < 1.0, "mean x {mx}");
        assert!((my - 300.0).abs() < 1.0, "mean y {my}");
    }

    #[test]
    fn test_unresolved_links_dropped() {
        let mut data = chain();
        data.links.push(link("s0", "nowhere"));
        data.links.push(link("ghost", "h0"));
        let mut sim = Simulation::new(&data, ForceParams::default());
        assert_eq!(sim.links().len(), 2);
        sim.run(50);
        assert!(sim.nodes().iter().all(|n| n.x.is_finite() && n.y.is_finite()));
    }

    #[test]
    fn test_linked_nodes_closer_than_unlinked() {
        let data = GraphData {
            nodes: vec![node("a", "stem", 1.0), node("b", "stem", 1.0), node("c", "stem", 1.0)],
            links: vec![link("a", "b")],
        };
        let mut sim = Simulation::new(&data, ForceParams::default());
        sim.run(300);
        let a = sim.node("a").unwrap();
        let b = sim.node("b").unwrap();
        let c = sim.node("c").unwrap();
        assert!(dist(a, b) < dist(a, c));
    }

    #[test]
    fn test_drag_pins_then_releases() {
        let mut sim = Simulation::new(&chain(), ForceParams::default());
        sim.run(300);
        assert!(sim.drag_start("h0", 100.0, -50.0));
        sim.tick();
        let h = sim.node("h0").unwrap();
        assert_eq!((h.x, h.y), (100.0, -50.0));
        assert!(!sim.is_settled());

        assert!(sim.drag("h0", 120.0, -40.0));
        for _ in 0..20 {
            sim.tick();
        }
        let h = sim.node("h0").unwrap();
        assert_eq!((h.x, h.y), (120.0, -40.0));

        // Other nodes keep their layout state instead of restarting from
        // the initial placement.
        let s = sim.node("s0").unwrap();
        assert!(s.fx.is_none());

        assert!(sim.drag_end("h0"));
        let h = sim.node("h0").unwrap();
        assert!(h.fx.is_none() && h.fy.is_none());
        sim.run(2000);
        assert!(sim.is_settled());
    }

    #[test]
    fn test_drag_unknown_node() {
        let mut sim = Simulation::new(&chain(), ForceParams::default());
        assert!(!sim.drag_start("zz", 0.0, 0.0));
        assert!(!sim.drag("zz", 0.0, 0.0));
        assert!(!sim.drag_end("zz"));
    }

    #[test]
    fn test_empty_graph() {
        let mut sim = Simulation::new(&GraphData::default(), ForceParams::default());
        sim.run(10);
        assert!(sim.nodes().is_empty());
    }

    #[test]
    fn test_duplicate_ids_first_wins() {
        let data = GraphData {
            nodes: vec![node("x", "stem", 1.0), node("x", "hairpin", 1.0)],
            links: vec![],
        };
        let sim = Simulation::new(&data, ForceParams::default());
        assert_eq!(sim.nodes().len(), 2);
        assert_eq!(sim.node("x").unwrap().kind, "stem");
    }
}
