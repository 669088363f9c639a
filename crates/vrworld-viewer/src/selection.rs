//! Point selection: which points are toggled on, and ray picking against the
//! point buffer.

use crate::plot::PointBuffer;
use glam::Vec3;
use std::collections::BTreeSet;

/// Smallest pick radius, so tiny points stay selectable.
const MIN_PICK_RADIUS: f32 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit length.
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Ray parameter of the closest approach to `p`, and the distance there.
    #[inline]
    pub fn closest_approach(&self, p: Vec3) -> (f32, f32) {
        let t = (p - self.origin).dot(self.direction);
        (t, self.at(t).distance(p))
    }
}

/// The set of selected point indices.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    selected: BTreeSet<usize>,
}

impl SelectionState {
    /// Flips membership of `index`; returns whether it is now selected.
    pub fn toggle(&mut self, index: usize) -> bool {
        if self.selected.remove(&index) {
            false
        } else {
            self.selected.insert(index);
            true
        }
    }

    #[inline]
    pub fn contains(&self, index: usize) -> bool {
        self.selected.contains(&index)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.selected.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }
}

/// Index of the point hit by `ray`: the nearest one in front of the origin
/// within `radius` of the ray. Ties go to the lower index.
pub fn pick(ray: &Ray, buffer: &PointBuffer, radius: f32) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for i in 0..buffer.len() {
        let (t, dist) = ray.closest_approach(buffer.position(i));
        // Written so a NaN distance never counts as a hit.
        if !(t > 0.0 && dist <= radius) {
            continue;
        }
        if best.map_or(true, |(_, bt)| t < bt) {
            best = Some((i, t));
        }
    }
    best.map(|(i, _)| i)
}

/// Collects pick rays from the active pointing devices and applies them once
/// per frame.
#[derive(Debug, Default)]
pub struct SelectionTracker {
    state: SelectionState,
    pending: Vec<Ray>,
}

impl SelectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a pick to be resolved on the next `update`.
    pub fn queue_pick(&mut self, ray: Ray) {
        self.pending.push(ray);
    }

    #[inline]
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    #[inline]
    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    /// Drops the selection, e.g. because the buffer it indexes was rebuilt.
    pub fn clear(&mut self) {
        self.state.clear();
        self.pending.clear();
    }

    /// Resolves queued picks in arrival order, toggling each hit point.
    /// Returns whether the selection changed.
    pub fn update(&mut self, buffer: &PointBuffer, point_size: f32) -> bool {
        let radius = point_size.max(MIN_PICK_RADIUS);
        let mut changed = false;
        for ray in self.pending.drain(..) {
            if let Some(index) = pick(&ray, buffer, radius) {
                let now = self.state.toggle(index);
                log::debug!("Point {} {}", index, if now { "selected" } else { "deselected" });
                changed = true;
            }
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Dataset;
    use crate::plot::{points, PlotSize};

    fn buffer() -> PointBuffer {
        let ds = Dataset::new(
            [0, 1, 2],
            vec![],
            vec![
                vec![4.0, 4.0, 4.0], // (10, 5, 10)
                vec![2.0, 2.0, 2.0], // (5, 2.5, 5)
                vec![1.0, 1.0, 1.0], // (2.5, 1.25, 2.5)
            ],
        )
        .unwrap();
        points::build(&ds, 0, 1, 2, &PlotSize::default()).unwrap().buffer
    }

    #[test]
    fn toggle_flips_membership() {
        let mut s = SelectionState::default();
        assert!(s.toggle(3));
        assert!(s.contains(3));
        assert!(!s.toggle(3));
        assert!(s.is_empty());
    }

    #[test]
    fn pick_prefers_nearest_along_ray() {
        let buf = buffer();
        // From far beyond the plot back through all three points.
        let target = buf.position(1);
        let origin = Vec3::new(20.0, 10.0, 20.0);
        let ray = Ray::new(origin, Vec3::ZERO - origin);
        assert!(ray.closest_approach(target).1 < 1e-4);
        assert_eq!(pick(&ray, &buf, 0.1), Some(0));

        let miss = Ray::new(origin, Vec3::Y);
        assert_eq!(pick(&miss, &buf, 0.1), None);
    }

    #[test]
    fn points_behind_the_origin_are_ignored() {
        let buf = buffer();
        let ray = Ray::new(Vec3::new(6.0, 3.0, 6.0), Vec3::new(1.0, 0.5, 1.0));
        assert_eq!(pick(&ray, &buf, 0.1), Some(0));
    }

    #[test]
    fn update_is_deterministic_and_toggles() {
        let buf = buffer();
        let ray = Ray::new(Vec3::new(5.0, 2.5, -5.0), Vec3::Z);

        let mut a = SelectionTracker::new();
        let mut b = SelectionTracker::new();
        a.queue_pick(ray);
        b.queue_pick(ray);
        assert!(a.update(&buf, 0.1));
        assert!(b.update(&buf, 0.1));
        assert_eq!(a.state(), b.state());
        assert!(a.state().contains(1));

        a.queue_pick(ray);
        assert!(a.update(&buf, 0.1));
        assert!(a.state().is_empty());

        // Nothing queued: nothing changes.
        assert!(!a.update(&buf, 0.1));
    }
}
