//! The scene graph: an identity-keyed set of drawable nodes.
//!
//! Points, axis lines, tick marks, controller visuals and the decorative
//! object all go through the same `add`/`remove` calls. Insertion order is
//! irrelevant; renderers iterate in id order so frames are reproducible.

use crate::data::types::LineVertex;
use crate::plot::bounds::hex_to_rgb;
use crate::plot::points::PointCloud;
use glam::{Quat, Vec3};
use std::collections::{BTreeMap, HashMap};
use std::f32::consts::{PI, TAU};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

/// Position and orientation in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    pub orientation: Quat,
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
        }
    }
}

impl Pose {
    /// Pointing direction; controllers and heads look down their local -Z.
    #[inline]
    pub fn forward(&self) -> Vec3 {
        self.orientation * Vec3::NEG_Z
    }

    #[inline]
    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        self.position + self.orientation * p
    }
}

/// A colored open polyline.
#[derive(Debug, Clone, PartialEq)]
pub struct Polyline {
    pub vertices: Vec<Vec3>,
    pub color: u32,
}

impl Polyline {
    fn append_segments(&self, out: &mut Vec<LineVertex>) {
        let color = hex_to_rgb(self.color);
        for pair in self.vertices.windows(2) {
            out.push(LineVertex { position: pair[0].into(), color });
            out.push(LineVertex { position: pair[1].into(), color });
        }
    }
}

/// Visual representation of a tracked hand controller.
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerVisual {
    pub controller: u32,
    pub pose: Pose,
    pub color: u32,
}

impl ControllerVisual {
    /// Idle mesh color (red).
    pub const COLOR_IDLE: u32 = 0xDB3236;
    /// Mesh color while the primary button is held (yellow).
    pub const COLOR_ACTIVE: u32 = 0xF4C20D;
    /// Length of the pointer ray drawn from the tip.
    pub const RAY_LENGTH: f32 = 1.0;

    pub fn new(controller: u32) -> Self {
        Self {
            controller,
            pose: Pose::default(),
            color: Self::COLOR_IDLE,
        }
    }

    fn append_segments(&self, out: &mut Vec<LineVertex>) {
        const SIDES: usize = 6;
        let color = hex_to_rgb(self.color);
        let mut seg = |a: Vec3, b: Vec3| {
            out.push(LineVertex { position: self.pose.transform_point(a).into(), color });
            out.push(LineVertex { position: self.pose.transform_point(b).into(), color });
        };

        // Hexagonal cone, tip forward.
        let ring = |r: f32, z: f32, i: usize| {
            let a = i as f32 / SIDES as f32 * TAU;
            Vec3::new(r * a.cos(), r * a.sin(), z)
        };
        for i in 0..SIDES {
            let j = (i + 1) % SIDES;
            seg(ring(0.05, 0.05, i), ring(0.05, 0.05, j));
            seg(ring(0.005, -0.05, i), ring(0.005, -0.05, j));
            seg(ring(0.05, 0.05, i), ring(0.005, -0.05, i));
        }

        // Handle: a square prism behind the cone.
        let h = 0.015;
        let corners = [(-h, -h), (h, -h), (h, h), (-h, h)];
        for i in 0..corners.len() {
            let (x0, y0) = corners[i];
            let (x1, y1) = corners[(i + 1) % corners.len()];
            seg(Vec3::new(x0, y0, 0.0), Vec3::new(x1, y1, 0.0));
            seg(Vec3::new(x0, y0, 0.1), Vec3::new(x1, y1, 0.1));
            seg(Vec3::new(x0, y0, 0.0), Vec3::new(x0, y0, 0.1));
        }

        // Pointer ray used for panel interaction and picking.
        seg(Vec3::new(0.0, 0.0, -0.05), Vec3::new(0.0, 0.0, -0.05 - Self::RAY_LENGTH));
    }
}

/// The ambient decorative torus knot.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoration {
    pub position: Vec3,
    /// Yaw in radians, kept within (-PI, PI].
    pub rotation_y: f32,
    pub color: u32,
}

impl Default for Decoration {
    fn default() -> Self {
        Self {
            position: Vec3::new(-0.25, 1.4, -1.5),
            rotation_y: 0.0,
            color: 0xCCCCCC,
        }
    }
}

impl Decoration {
    const RADIUS: f32 = 0.4;
    const SEGMENTS: usize = 256;
    const P: f32 = 2.0;
    const Q: f32 = 3.0;

    /// Spin by `step` radians, wrapping back into (-PI, PI].
    pub fn spin(&mut self, step: f32) {
        self.rotation_y += step;
        if self.rotation_y > PI {
            self.rotation_y -= TAU;
        }
    }

    fn knot_point(u: f32) -> Vec3 {
        let qu = Self::Q / Self::P * u;
        let r = Self::RADIUS * (2.0 + qu.cos()) * 0.5;
        Vec3::new(r * u.cos(), r * u.sin(), Self::RADIUS * qu.sin() * 0.5)
    }

    fn append_segments(&self, out: &mut Vec<LineVertex>) {
        let color = hex_to_rgb(self.color);
        let rot = Quat::from_rotation_y(self.rotation_y);
        let at = |i: usize| {
            let u = i as f32 / Self::SEGMENTS as f32 * Self::P * TAU;
            self.position + rot * Self::knot_point(u)
        };
        for i in 0..Self::SEGMENTS {
            out.push(LineVertex { position: at(i).into(), color });
            out.push(LineVertex { position: at(i + 1).into(), color });
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    PointCloud,
    AxisLine,
    TickMark,
    ControllerVisual,
    Decoration,
}

#[derive(Debug, Clone)]
pub enum SceneNode {
    PointCloud(PointCloud),
    AxisLine(Polyline),
    TickMark(Polyline),
    ControllerVisual(ControllerVisual),
    Decoration(Decoration),
}

impl SceneNode {
    pub fn kind(&self) -> NodeKind {
        match self {
            SceneNode::PointCloud(_) => NodeKind::PointCloud,
            SceneNode::AxisLine(_) => NodeKind::AxisLine,
            SceneNode::TickMark(_) => NodeKind::TickMark,
            SceneNode::ControllerVisual(_) => NodeKind::ControllerVisual,
            SceneNode::Decoration(_) => NodeKind::Decoration,
        }
    }

    /// Appends this node's line geometry as a segment list. Point clouds
    /// contribute nothing here; they have their own pipeline.
    pub fn append_line_segments(&self, out: &mut Vec<LineVertex>) {
        match self {
            SceneNode::PointCloud(_) => {}
            SceneNode::AxisLine(line) | SceneNode::TickMark(line) => line.append_segments(out),
            SceneNode::ControllerVisual(visual) => visual.append_segments(out),
            SceneNode::Decoration(deco) => deco.append_segments(out),
        }
    }
}

#[derive(Debug, Default)]
pub struct SceneGraph {
    nodes: BTreeMap<NodeId, SceneNode>,
    names: HashMap<String, NodeId>,
    next_id: u64,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, node: SceneNode) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, node);
        id
    }

    /// Adds a node reachable later through `find`. A node previously holding
    /// the name keeps existing but loses the name.
    pub fn add_named(&mut self, name: &str, node: SceneNode) -> NodeId {
        let id = self.add(node);
        self.names.insert(name.to_owned(), id);
        id
    }

    pub fn remove(&mut self, id: NodeId) -> Option<SceneNode> {
        self.names.retain(|_, v| *v != id);
        self.nodes.remove(&id)
    }

    #[inline]
    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.names.get(name).copied()
    }

    #[inline]
    pub fn get(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(&id)
    }

    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(&id)
    }

    pub fn count(&self, kind: NodeKind) -> usize {
        self.nodes.values().filter(|n| n.kind() == kind).count()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Collects the segment list for all line-like nodes.
    pub fn line_segments(&self) -> Vec<LineVertex> {
        let mut out = Vec::new();
        for node in self.nodes.values() {
            node.append_line_segments(&mut out);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(color: u32) -> SceneNode {
        SceneNode::AxisLine(Polyline {
            vertices: vec![Vec3::ZERO, Vec3::X, Vec3::new(1.0, 1.0, 0.0)],
            color,
        })
    }

    #[test]
    fn add_find_remove() {
        let mut scene = SceneGraph::new();
        let a = scene.add_named("Axis", line(0xFF0000));
        let b = scene.add(line(0x00FF00));
        assert_ne!(a, b);
        assert_eq!(scene.find("Axis"), Some(a));
        assert_eq!(scene.count(NodeKind::AxisLine), 2);

        assert!(scene.remove(a).is_some());
        assert_eq!(scene.find("Axis"), None);
        assert!(scene.remove(a).is_none());
        assert_eq!(scene.len(), 1);
    }

    #[test]
    fn polyline_expands_into_segment_pairs() {
        let mut scene = SceneGraph::new();
        scene.add(line(0xFF0000));
        let segs = scene.line_segments();
        assert_eq!(segs.len(), 4);
        assert_eq!(segs[1].position, [1.0, 0.0, 0.0]);
        assert_eq!(segs[2].position, [1.0, 0.0, 0.0]);
        assert_eq!(segs[0].color, [1.0, 0.0, 0.0]);
    }

    #[test]
    fn decoration_spin_wraps() {
        let mut deco = Decoration::default();
        deco.rotation_y = PI - 0.001;
        deco.spin(0.002);
        assert!(deco.rotation_y < 0.0);
        assert!(deco.rotation_y > -PI);
    }

    #[test]
    fn controller_ray_follows_pose() {
        let mut visual = ControllerVisual::new(1);
        visual.pose.position = Vec3::new(1.0, 2.0, 3.0);
        let mut segs = Vec::new();
        visual.append_segments(&mut segs);
        let tip = segs.last().unwrap().position;
        assert!((tip[2] - (3.0 - 0.05 - ControllerVisual::RAY_LENGTH)).abs() < 1e-5);
        assert_eq!(segs.last().unwrap().color, hex_to_rgb(ControllerVisual::COLOR_IDLE));
    }
}
