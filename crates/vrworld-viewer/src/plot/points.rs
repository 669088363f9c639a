//! Dataset-to-point-cloud mapping.
//!
//! Positions and colors are normalized against the running maximum of each
//! selected column, so the first row to set a new maximum lands exactly on
//! the plot extent of that axis.

use crate::data::Dataset;
use crate::error::Result;
use crate::plot::bounds::{Axis, NormalizationBounds, PlotSize};
use crate::selection::SelectionState;
use glam::Vec3;

/// Which point attributes must be re-uploaded by the renderer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirtyAttributes {
    pub position: bool,
    pub color: bool,
    pub size: bool,
    pub selected: bool,
}

impl DirtyAttributes {
    pub const ALL: Self = Self {
        position: true,
        color: true,
        size: true,
        selected: true,
    };

    #[inline]
    pub fn any(&self) -> bool {
        self.position || self.color || self.size || self.selected
    }
}

/// Four parallel attribute arrays for N points. Never resized once built.
#[derive(Debug, Clone, PartialEq)]
pub struct PointBuffer {
    positions: Vec<f32>,
    colors: Vec<f32>,
    sizes: Vec<f32>,
    selected: Vec<f32>,
    dirty: DirtyAttributes,
}

impl PointBuffer {
    fn with_len(n: usize) -> Self {
        Self {
            positions: vec![0.0; n * 3],
            colors: vec![0.0; n * 3],
            sizes: vec![0.0; n],
            selected: vec![0.0; n],
            dirty: DirtyAttributes::ALL,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    #[inline]
    pub fn position(&self, i: usize) -> Vec3 {
        Vec3::from_slice(&self.positions[i * 3..i * 3 + 3])
    }

    #[inline]
    pub fn color(&self, i: usize) -> [f32; 3] {
        [self.colors[i * 3], self.colors[i * 3 + 1], self.colors[i * 3 + 2]]
    }

    #[inline]
    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    #[inline]
    pub fn colors(&self) -> &[f32] {
        &self.colors
    }

    #[inline]
    pub fn sizes(&self) -> &[f32] {
        &self.sizes
    }

    #[inline]
    pub fn selected(&self) -> &[f32] {
        &self.selected
    }

    #[inline]
    pub fn is_selected(&self, i: usize) -> bool {
        self.selected[i] != 0.0
    }

    #[inline]
    pub fn dirty(&self) -> DirtyAttributes {
        self.dirty
    }

    /// Flags every attribute for re-upload.
    #[inline]
    pub fn mark_all_dirty(&mut self) {
        self.dirty = DirtyAttributes::ALL;
    }
}

/// A built point cloud together with the bounds it was normalized against.
#[derive(Debug, Clone, PartialEq)]
pub struct PointCloud {
    pub buffer: PointBuffer,
    pub bounds: NormalizationBounds,
    /// Column indices plotted on X, Y and Z.
    pub columns: [usize; 3],
    pub point_size: f32,
}

/// Maps `value` into [0, 1]-ish space against the current bound of `axis`.
/// A degenerate axis collapses to zero.
#[inline]
fn normalized(value: f64, bounds: &NormalizationBounds, axis: Axis) -> f64 {
    match bounds.divisor(axis) {
        Ok(d) => value / d,
        Err(_) => 0.0,
    }
}

/// Plot-space coordinate for a normalized value, or `None` if it does not
/// fit in an `f32`.
#[inline]
fn plot_coordinate(n: f64, extent: f32) -> Option<f32> {
    let v = (n * extent as f64) as f32;
    v.is_finite().then_some(v)
}

/// Builds the point buffer for `dataset` with the given X/Y/Z columns.
///
/// Fails with `InvalidArgument` before allocating when the dataset is empty
/// or a column index is out of range.
pub fn build(
    dataset: &Dataset,
    x_col: usize,
    y_col: usize,
    z_col: usize,
    plot: &PlotSize,
) -> Result<PointCloud> {
    let columns = [x_col, y_col, z_col];
    dataset.check_axes(columns)?;

    let mut buffer = PointBuffer::with_len(dataset.len());
    let mut bounds = NormalizationBounds::default();
    let point_size = plot.point_size();

    let mut overflowed = 0usize;

    for (i, record) in dataset.records().iter().enumerate() {
        for axis in Axis::ALL {
            bounds.observe(axis, record[columns[axis.index()]]);
        }

        for axis in Axis::ALL {
            let n = normalized(record[columns[axis.index()]], &bounds, axis);
            buffer.positions[i * 3 + axis.index()] =
                plot_coordinate(n, plot.along(axis)).unwrap_or_else(|| {
                    overflowed += 1;
                    0.0
                });
            buffer.colors[i * 3 + axis.index()] = n.clamp(0.0, 1.0) as f32;
        }
        buffer.sizes[i] = point_size;
    }

    if overflowed > 0 {
        log::warn!(
            "{} coordinates on columns {:?} are out of range for the plot; drawn at 0.",
            overflowed,
            columns
        );
    }

    let degenerate = bounds.degenerate_axes();
    if !degenerate.is_empty() {
        log::warn!(
            "No positive values on axis {:?} (columns {:?}); those coordinates are drawn at 0.",
            degenerate,
            columns
        );
    }

    log::debug!(
        "Built {} points | largest=({}, {}, {}) entry={}",
        buffer.len(),
        bounds.largest_x,
        bounds.largest_y,
        bounds.largest_z,
        bounds.largest_entry()
    );

    Ok(PointCloud {
        buffer,
        bounds,
        columns,
        point_size,
    })
}

/// Rewrites the selection flags from `selection`. No other attribute is touched.
pub fn refresh(buffer: &mut PointBuffer, selection: &SelectionState) {
    let mut changed = false;
    for (i, flag) in buffer.selected.iter_mut().enumerate() {
        let want = if selection.contains(i) { 1.0 } else { 0.0 };
        if *flag != want {
            *flag = want;
            changed = true;
        }
    }
    if changed {
        buffer.dirty.selected = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VizError;

    fn sample() -> Dataset {
        Dataset::new(
            [0, 1, 2],
            vec!["colA".into(), "colB".into(), "colC".into()],
            vec![
                vec![1.0, 2.0, 3.0],
                vec![4.0, 8.0, 12.0],
                vec![2.0, 4.0, 6.0],
            ],
        )
        .unwrap()
    }

    #[test]
    fn end_to_end_example() {
        let cloud = build(&sample(), 0, 1, 2, &PlotSize::default()).unwrap();

        assert_eq!(cloud.bounds.largest_x, 4.0);
        assert_eq!(cloud.bounds.largest_y, 8.0);
        assert_eq!(cloud.bounds.largest_z, 12.0);
        assert_eq!(cloud.bounds.largest_entry(), 12.0);

        assert_eq!(cloud.buffer.position(1), Vec3::new(10.0, 5.0, 10.0));
        assert_eq!(cloud.buffer.color(1), [1.0, 1.0, 1.0]);

        // Normalized against the running maximum, not the final one.
        assert_eq!(cloud.buffer.position(2), Vec3::new(5.0, 2.5, 5.0));
        assert_eq!(cloud.buffer.color(2), [0.5, 0.5, 0.5]);
    }

    #[test]
    fn first_row_sets_the_maximum() {
        let cloud = build(&sample(), 0, 1, 2, &PlotSize::default()).unwrap();
        assert_eq!(cloud.buffer.color(0), [1.0, 1.0, 1.0]);
        assert_eq!(cloud.buffer.position(0), Vec3::new(10.0, 5.0, 10.0));
    }

    #[test]
    fn buffer_lengths_match_row_count() {
        let cloud = build(&sample(), 2, 0, 1, &PlotSize::default()).unwrap();
        let n = 3;
        assert_eq!(cloud.buffer.positions().len(), n * 3);
        assert_eq!(cloud.buffer.colors().len(), n * 3);
        assert_eq!(cloud.buffer.sizes().len(), n);
        assert_eq!(cloud.buffer.selected().len(), n);
        assert!(cloud.buffer.sizes().iter().all(|s| (*s - 0.1).abs() < 1e-6));
    }

    #[test]
    fn colors_stay_in_unit_range() {
        let ds = Dataset::new(
            [0, 1, 2],
            vec![],
            vec![
                vec![0.5, 9.0, 0.0],
                vec![3.0, 1.0, 7.0],
                vec![0.0, 0.0, 0.0],
                vec![2.5, 10.0, 3.5],
            ],
        )
        .unwrap();
        let cloud = build(&ds, 0, 1, 2, &PlotSize::default()).unwrap();
        assert!(cloud
            .buffer
            .colors()
            .iter()
            .all(|c| (0.0..=1.0).contains(c)));
    }

    #[test]
    fn zero_column_collapses_to_origin_without_nan() {
        let ds = Dataset::new(
            [0, 1, 2],
            vec![],
            vec![vec![0.0, 1.0, 2.0], vec![0.0, 2.0, 4.0]],
        )
        .unwrap();
        let cloud = build(&ds, 0, 1, 2, &PlotSize::default()).unwrap();

        assert!(cloud.buffer.positions().iter().all(|v| v.is_finite()));
        assert_eq!(cloud.buffer.position(0).x, 0.0);
        assert_eq!(cloud.buffer.position(1).x, 0.0);
        assert_eq!(cloud.bounds.degenerate_axes(), vec![Axis::X]);
    }

    #[test]
    fn negative_outlier_stays_finite() {
        let ds = Dataset::new(
            [0, 1, 2],
            vec![],
            vec![vec![1e-300, 1.0, 1.0], vec![-1.0, 1.0, 1.0]],
        )
        .unwrap();
        let cloud = build(&ds, 0, 1, 2, &PlotSize::default()).unwrap();

        assert!(cloud.buffer.positions().iter().all(|v| v.is_finite()));
        assert!(cloud.buffer.colors().iter().all(|c| (0.0..=1.0).contains(c)));
        assert_eq!(cloud.buffer.position(0), Vec3::new(10.0, 5.0, 10.0));
        assert_eq!(cloud.buffer.position(1), Vec3::new(0.0, 5.0, 10.0));
        assert_eq!(cloud.buffer.color(1), [0.0, 1.0, 1.0]);
    }

    #[test]
    fn out_of_range_column_is_invalid() {
        let err = build(&sample(), 0, 1, 3, &PlotSize::default()).unwrap_err();
        assert!(matches!(err, VizError::InvalidArgument(_)));
    }

    #[test]
    fn refresh_only_touches_selection() {
        let mut cloud = build(&sample(), 0, 1, 2, &PlotSize::default()).unwrap();
        let before = cloud.buffer.clone();
        cloud.buffer.dirty = DirtyAttributes::default();
        assert!(!cloud.buffer.dirty().any());

        let mut sel = SelectionState::default();
        sel.toggle(2);
        sel.toggle(7);
        refresh(&mut cloud.buffer, &sel);

        assert_eq!(cloud.buffer.selected(), &[0.0, 0.0, 1.0]);
        assert_eq!(cloud.buffer.positions(), before.positions());
        assert_eq!(cloud.buffer.colors(), before.colors());
        assert_eq!(cloud.buffer.sizes(), before.sizes());
        assert_eq!(
            cloud.buffer.dirty(),
            DirtyAttributes {
                selected: true,
                ..Default::default()
            }
        );
        assert!(cloud.buffer.dirty().any());
    }
}
