//! Tracked hand controllers: lifecycle, button state and visuals.

use crate::error::{Result, VizError};
use crate::scene::{ControllerVisual, NodeId, Pose, SceneGraph, SceneNode};
use crate::selection::{Ray, SelectionTracker};
use crate::ui::panel::ControlPanel;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub struct ControllerState {
    pub id: u32,
    pub pressed: bool,
    pub pose: Pose,
    /// Scene node holding this controller's visual.
    pub node: NodeId,
}

impl ControllerState {
    /// The pointing ray, from the controller tip along its forward axis.
    pub fn ray(&self) -> Ray {
        Ray::new(self.pose.position, self.pose.forward())
    }
}

/// Everything the controller handlers mutate, borrowed from the session.
pub struct ControllerTargets<'a> {
    pub scene: &'a mut SceneGraph,
    pub panel: &'a mut ControlPanel,
    pub selection: &'a mut SelectionTracker,
}

#[derive(Debug, Default)]
pub struct Controllers {
    by_id: BTreeMap<u32, ControllerState>,
}

impl Controllers {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn get(&self, id: u32) -> Option<&ControllerState> {
        self.by_id.get(&id)
    }

    fn state_mut(&mut self, id: u32) -> Result<&mut ControllerState> {
        self.by_id
            .get_mut(&id)
            .ok_or_else(|| VizError::Controller(format!("unknown controller {}", id)))
    }

    pub fn connect(&mut self, id: u32, t: &mut ControllerTargets<'_>) -> Result<()> {
        if self.by_id.contains_key(&id) {
            return Err(VizError::Controller(format!(
                "controller {} is already connected",
                id
            )));
        }
        let node = t.scene.add(SceneNode::ControllerVisual(ControllerVisual::new(id)));
        t.panel.register(id);
        self.by_id.insert(
            id,
            ControllerState {
                id,
                pressed: false,
                pose: Pose::default(),
                node,
            },
        );
        log::info!("Controller {} connected", id);
        Ok(())
    }

    pub fn disconnect(&mut self, id: u32, t: &mut ControllerTargets<'_>) -> Result<()> {
        let state = self
            .by_id
            .remove(&id)
            .ok_or_else(|| VizError::Controller(format!("unknown controller {}", id)))?;
        t.scene.remove(state.node);
        t.panel.unregister(id);
        log::info!("Controller {} disconnected", id);
        Ok(())
    }

    pub fn press(&mut self, id: u32, t: &mut ControllerTargets<'_>) -> Result<()> {
        let state = self.state_mut(id)?;
        state.pressed = true;
        let (node, ray) = (state.node, state.ray());
        set_visual_color(t.scene, node, ControllerVisual::COLOR_ACTIVE);
        t.panel.pressed(id, true);
        t.selection.queue_pick(ray);
        Ok(())
    }

    pub fn release(&mut self, id: u32, t: &mut ControllerTargets<'_>) -> Result<()> {
        let state = self.state_mut(id)?;
        state.pressed = false;
        let node = state.node;
        set_visual_color(t.scene, node, ControllerVisual::COLOR_IDLE);
        t.panel.pressed(id, false);
        Ok(())
    }

    pub fn moved(&mut self, id: u32, pose: Pose, scene: &mut SceneGraph) -> Result<()> {
        let state = self.state_mut(id)?;
        state.pose = pose;
        if let Some(SceneNode::ControllerVisual(visual)) = scene.get_mut(state.node) {
            visual.pose = pose;
        }
        Ok(())
    }
}

fn set_visual_color(scene: &mut SceneGraph, node: NodeId, color: u32) {
    if let Some(SceneNode::ControllerVisual(visual)) = scene.get_mut(node) {
        visual.color = color;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::NodeKind;
    use glam::Vec3;

    struct Fixture {
        scene: SceneGraph,
        panel: ControlPanel,
        selection: SelectionTracker,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                scene: SceneGraph::new(),
                panel: ControlPanel::new(),
                selection: SelectionTracker::new(),
            }
        }

        fn targets(&mut self) -> ControllerTargets<'_> {
            ControllerTargets {
                scene: &mut self.scene,
                panel: &mut self.panel,
                selection: &mut self.selection,
            }
        }
    }

    fn visual_color(scene: &SceneGraph, node: NodeId) -> u32 {
        match scene.get(node) {
            Some(SceneNode::ControllerVisual(v)) => v.color,
            other => panic!("not a controller visual: {:?}", other),
        }
    }

    #[test]
    fn connect_then_disconnect_leaves_no_visuals() {
        let mut fx = Fixture::new();
        let mut ctl = Controllers::new();
        ctl.connect(1, &mut fx.targets()).unwrap();
        assert_eq!(fx.scene.count(NodeKind::ControllerVisual), 1);
        assert_eq!(fx.panel.target_count(), 1);

        ctl.disconnect(1, &mut fx.targets()).unwrap();
        assert_eq!(fx.scene.count(NodeKind::ControllerVisual), 0);
        assert_eq!(fx.panel.target_count(), 0);
        assert!(ctl.is_empty());
    }

    #[test]
    fn press_and_release_switch_color_and_panel_state() {
        let mut fx = Fixture::new();
        let mut ctl = Controllers::new();
        ctl.connect(2, &mut fx.targets()).unwrap();
        let node = ctl.get(2).unwrap().node;

        ctl.press(2, &mut fx.targets()).unwrap();
        assert_eq!(visual_color(&fx.scene, node), ControllerVisual::COLOR_ACTIVE);
        assert!(fx.panel.is_pressed(2));
        assert!(fx.selection.has_pending());

        ctl.release(2, &mut fx.targets()).unwrap();
        assert_eq!(visual_color(&fx.scene, node), ControllerVisual::COLOR_IDLE);
        assert!(!fx.panel.is_pressed(2));
        assert!(!ctl.get(2).unwrap().pressed);
    }

    #[test]
    fn unknown_ids_are_rejected_without_side_effects() {
        let mut fx = Fixture::new();
        let mut ctl = Controllers::new();
        assert!(matches!(
            ctl.press(9, &mut fx.targets()),
            Err(VizError::Controller(_))
        ));
        assert!(ctl.disconnect(9, &mut fx.targets()).is_err());
        assert!(fx.scene.is_empty());
        assert!(!fx.selection.has_pending());
    }

    #[test]
    fn double_connect_keeps_one_visual() {
        let mut fx = Fixture::new();
        let mut ctl = Controllers::new();
        ctl.connect(1, &mut fx.targets()).unwrap();
        assert!(ctl.connect(1, &mut fx.targets()).is_err());
        assert_eq!(fx.scene.count(NodeKind::ControllerVisual), 1);
    }

    #[test]
    fn move_updates_visual_pose_and_ray() {
        let mut fx = Fixture::new();
        let mut ctl = Controllers::new();
        ctl.connect(1, &mut fx.targets()).unwrap();
        let pose = Pose {
            position: Vec3::new(1.0, 1.0, 1.0),
            orientation: glam::Quat::IDENTITY,
        };
        ctl.moved(1, pose, &mut fx.scene).unwrap();
        let state = ctl.get(1).unwrap();
        assert_eq!(state.ray().direction, Vec3::NEG_Z);
        match fx.scene.get(state.node) {
            Some(SceneNode::ControllerVisual(v)) => assert_eq!(v.pose, pose),
            _ => panic!("visual missing"),
        }
    }
}
