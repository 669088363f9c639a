//! Dataset visualization: normalized point cloud plus reference axes.

pub mod axes;
pub mod bounds;
pub mod points;

pub use self::bounds::{Axis, NormalizationBounds, PlotSize};
pub use self::points::{PointBuffer, PointCloud};

use crate::data::Dataset;
use crate::error::Result;
use crate::scene::{NodeId, SceneGraph, SceneNode};

/// Scene name under which the point cloud is registered.
pub const POINTS_NODE_NAME: &str = "PointsSystem";

/// Scene nodes owned by the current visualization.
#[derive(Debug, Clone)]
pub struct PlotHandles {
    pub cloud: NodeId,
    pub annotations: Vec<NodeId>,
    pub columns: [usize; 3],
    pub bounds: NormalizationBounds,
}

impl PlotHandles {
    fn remove_from(&self, scene: &mut SceneGraph) {
        scene.remove(self.cloud);
        for id in &self.annotations {
            scene.remove(*id);
        }
    }
}

/// Draws `dataset` along `columns`, replacing `current`.
///
/// The new geometry is built before anything is removed, so on error the
/// previous visualization stays in the scene untouched.
pub fn draw_dataset(
    scene: &mut SceneGraph,
    current: &mut Option<PlotHandles>,
    dataset: &Dataset,
    columns: [usize; 3],
    plot: &PlotSize,
) -> Result<()> {
    let cloud = points::build(dataset, columns[0], columns[1], columns[2], plot)?;
    let bounds = cloud.bounds;

    if let Some(prev) = current.take() {
        prev.remove_from(scene);
    }

    let cloud_id = scene.add_named(POINTS_NODE_NAME, SceneNode::PointCloud(cloud));
    let annotations = axes::annotate(&bounds, plot)
        .into_iter()
        .map(|node| scene.add(node))
        .collect();

    log::info!(
        "Drew {} points on columns {:?} (largest entry {})",
        dataset.len(),
        columns,
        bounds.largest_entry()
    );

    *current = Some(PlotHandles {
        cloud: cloud_id,
        annotations,
        columns,
        bounds,
    });
    Ok(())
}
