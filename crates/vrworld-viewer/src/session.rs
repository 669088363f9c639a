//! Everything a running visualization owns, passed explicitly to the
//! scheduler, input handlers, UI and renderer.

use crate::camera::Camera;
use crate::data::Dataset;
use crate::error::{Result, VizError};
use crate::input::controller::Controllers;
use crate::input::headset::{DisplayDescriptor, TimingSource, VrSession};
use crate::input::pointer::{self, PointerState};
use crate::input::trackball::TrackballControls;
use crate::plot::{self, points, PlotHandles, PlotSize, PointCloud};
use crate::scene::{Decoration, NodeId, SceneGraph, SceneNode};
use crate::selection::SelectionTracker;
use crate::ui::panel::ControlPanel;
use glam::{Vec2, Vec3};

pub struct SessionContext {
    pub scene: SceneGraph,
    pub camera: Camera,
    pub trackball: TrackballControls,
    pub pointer: PointerState,
    pub selection: SelectionTracker,
    pub controllers: Controllers,
    pub panel: ControlPanel,
    pub vr: VrSession,
    /// Last controller event that could not be applied, shown on the HUD.
    pub input_error: Option<String>,
    /// Set once bootstrap has finished; key presses are ignored before that.
    pub keyboard_enabled: bool,
    pub decoration: Option<NodeId>,
    pub plot: Option<PlotHandles>,
    pub plot_size: PlotSize,
    pub dataset: Option<Dataset>,
    pub timing: TimingSource,
    /// Window size in physical pixels.
    pub viewport: (u32, u32),
}

impl SessionContext {
    pub fn new(viewport: (u32, u32), plot_size: PlotSize) -> Self {
        let mut camera = Camera::new(1.0);
        camera.set_viewport(viewport.0, viewport.1);
        Self {
            scene: SceneGraph::new(),
            camera,
            trackball: TrackballControls::new(plot_size.center()),
            pointer: PointerState::default(),
            selection: SelectionTracker::new(),
            controllers: Controllers::new(),
            panel: ControlPanel::new(),
            vr: VrSession::default(),
            input_error: None,
            keyboard_enabled: false,
            decoration: None,
            plot: None,
            plot_size,
            dataset: None,
            timing: TimingSource::Window,
            viewport,
        }
    }

    /// Adds the decorative knot unless it is already present.
    pub fn install_decoration(&mut self) -> NodeId {
        if let Some(id) = self.decoration {
            return id;
        }
        let id = self.scene.add(SceneNode::Decoration(Decoration::default()));
        self.decoration = Some(id);
        id
    }

    pub fn decoration(&self) -> Option<&Decoration> {
        match self.scene.get(self.decoration?) {
            Some(SceneNode::Decoration(d)) => Some(d),
            _ => None,
        }
    }

    pub fn decoration_mut(&mut self) -> Option<&mut Decoration> {
        match self.scene.get_mut(self.decoration?) {
            Some(SceneNode::Decoration(d)) => Some(d),
            _ => None,
        }
    }

    /// Rebuilds the plot from the loaded dataset along `columns`. Selection
    /// indices refer to the old buffer and are dropped on success.
    pub fn draw_dataset(&mut self, columns: [usize; 3]) -> Result<()> {
        let dataset = self
            .dataset
            .as_ref()
            .ok_or_else(|| VizError::Dataset("no dataset loaded".into()))?;
        plot::draw_dataset(&mut self.scene, &mut self.plot, dataset, columns, &self.plot_size)?;
        self.selection.clear();
        self.trackball.target = self.plot_size.center();
        Ok(())
    }

    pub fn point_cloud(&self) -> Option<&PointCloud> {
        match self.scene.get(self.plot.as_ref()?.cloud) {
            Some(SceneNode::PointCloud(c)) => Some(c),
            _ => None,
        }
    }

    pub fn point_cloud_mut(&mut self) -> Option<&mut PointCloud> {
        match self.scene.get_mut(self.plot.as_ref()?.cloud) {
            Some(SceneNode::PointCloud(c)) => Some(c),
            _ => None,
        }
    }

    #[inline]
    pub fn point_count(&self) -> usize {
        self.point_cloud().map_or(0, |c| c.buffer.len())
    }

    /// Column labels, or empty without a dataset.
    pub fn column_labels(&self) -> &[String] {
        self.dataset.as_ref().map(|d| d.labels()).unwrap_or(&[])
    }

    /// Queues a selection pick through the window pixel `pos`.
    pub fn queue_pointer_pick(&mut self, pos: Vec2) {
        let (w, h) = self.viewport;
        if w == 0 || h == 0 {
            return;
        }
        let ndc = pointer::to_ndc(pos, Vec2::new(w as f32, h as f32));
        let ray = self.camera.ray_from_ndc(ndc);
        self.selection.queue_pick(ray);
    }

    /// Resolves pending picks and mirrors the selection into the point
    /// buffer. Returns whether the selection changed.
    pub fn update_selection(&mut self) -> bool {
        let Some(cloud_id) = self.plot.as_ref().map(|h| h.cloud) else {
            // Nothing to hit.
            self.selection.clear();
            return false;
        };
        match self.scene.get_mut(cloud_id) {
            Some(SceneNode::PointCloud(cloud)) => {
                let changed = self.selection.update(&cloud.buffer, cloud.point_size);
                points::refresh(&mut cloud.buffer, self.selection.state());
                changed
            }
            _ => false,
        }
    }

    pub fn mark_points_dirty(&mut self) {
        if let Some(cloud) = self.point_cloud_mut() {
            cloud.buffer.mark_all_dirty();
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.viewport = (width, height);
        self.camera.set_viewport(width, height);
    }

    /// Puts the camera in front of the plot at standing height.
    pub fn place_camera_for_plot(&mut self) {
        let p = self.plot_size;
        self.camera.position = Vec3::new(1.2 * p.x, crate::camera::USER_HEIGHT_M, 1.2 * p.z);
        self.camera.look_at(p.center());
    }

    /// Reacts to the headset probe outcome. Failures only downgrade to the
    /// window timing source.
    pub fn apply_probe_outcome(&mut self, outcome: Result<DisplayDescriptor>) {
        match outcome {
            Ok(display) => {
                let (w, h) = display.render_size();
                log::info!(
                    "VR display '{}' ready: {} Hz, render size {}x{}",
                    display.name,
                    display.refresh_hz,
                    w,
                    h
                );
                if let Some(stage) = &display.stage {
                    log::info!("Stage area {:.1} x {:.1} m", stage.size_x_m, stage.size_z_m);
                }
                self.timing = TimingSource::Headset {
                    refresh_hz: display.refresh_hz,
                };
                let p = self.plot_size;
                self.camera.position = Vec3::new(p.x / 2.0, p.y * 1.5, self.camera.position.z);
                self.camera.look_at(p.center());
            }
            Err(e) => {
                log::warn!("VR headset unavailable: {}", e);
                self.timing = TimingSource::Window;
            }
        }
    }

    /// Aspect ratio of one stereo eye: the headset's per-eye size when one is
    /// present, otherwise half the window.
    pub fn eye_aspect(&self) -> f32 {
        match self.vr.display() {
            Some(d) if d.eye_height > 0 => d.eye_width as f32 / d.eye_height as f32,
            _ => {
                let (w, h) = self.viewport;
                (w as f32 * 0.5) / h.max(1) as f32
            }
        }
    }

    /// Pixel size of the side-by-side stereo target: the headset's render
    /// size when one is present, otherwise the window.
    pub fn stereo_target_size(&self) -> (u32, u32) {
        match self.vr.display() {
            Some(d) => d.render_size(),
            None => self.viewport,
        }
    }

    pub fn enter_vr(&mut self) -> Result<()> {
        self.vr.enter(&self.camera)?;
        log::info!("Entered VR presentation");
        Ok(())
    }

    pub fn exit_vr(&mut self) {
        if self.vr.presenting {
            self.vr.exit(&mut self.camera);
            log::info!("Left VR presentation");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::headset::{HeadsetState, SimulatedHeadset};
    use crate::scene::NodeKind;
    use crate::selection::Ray;

    fn session_with_data() -> SessionContext {
        let mut s = SessionContext::new((800, 600), PlotSize::default());
        s.dataset = Some(
            Dataset::new(
                [0, 1, 2],
                vec![],
                vec![vec![4.0, 8.0, 12.0], vec![2.0, 4.0, 6.0]],
            )
            .unwrap(),
        );
        s.draw_dataset([0, 1, 2]).unwrap();
        s
    }

    #[test]
    fn draw_without_dataset_fails() {
        let mut s = SessionContext::new((800, 600), PlotSize::default());
        assert!(matches!(s.draw_dataset([0, 1, 2]), Err(VizError::Dataset(_))));
        assert_eq!(s.point_count(), 0);
    }

    #[test]
    fn selection_reaches_the_buffer() {
        let mut s = session_with_data();
        s.selection
            .queue_pick(Ray::new(Vec3::new(10.0, 5.0, -3.0), Vec3::Z));
        assert!(s.update_selection());
        let cloud = s.point_cloud().unwrap();
        assert!(cloud.buffer.is_selected(0));
        assert!(!cloud.buffer.is_selected(1));
    }

    #[test]
    fn redraw_clears_selection() {
        let mut s = session_with_data();
        s.selection
            .queue_pick(Ray::new(Vec3::new(10.0, 5.0, -3.0), Vec3::Z));
        s.update_selection();
        s.draw_dataset([2, 1, 0]).unwrap();
        assert!(s.selection.state().is_empty());
        assert_eq!(s.scene.count(NodeKind::PointCloud), 1);
    }

    #[test]
    fn decoration_is_installed_once() {
        let mut s = SessionContext::new((800, 600), PlotSize::default());
        let a = s.install_decoration();
        let b = s.install_decoration();
        assert_eq!(a, b);
        assert_eq!(s.scene.count(NodeKind::Decoration), 1);
        s.decoration_mut().unwrap().rotation_y = 0.5;
        assert_eq!(s.decoration().unwrap().rotation_y, 0.5);
    }

    #[test]
    fn headset_success_switches_timing_and_moves_camera() {
        let mut s = SessionContext::new((800, 600), PlotSize::default());
        s.camera.position.z = 12.0;
        s.apply_probe_outcome(Ok(SimulatedHeadset::new(90.0).descriptor));
        assert_eq!(s.timing, TimingSource::Headset { refresh_hz: 90.0 });
        assert!(s.camera.position.abs_diff_eq(Vec3::new(5.0, 7.5, 12.0), 1e-6));
    }

    #[test]
    fn headset_failure_keeps_window_timing() {
        let mut s = SessionContext::new((800, 600), PlotSize::default());
        let before = s.camera.clone();
        s.apply_probe_outcome(Err(VizError::Headset("none".into())));
        assert_eq!(s.timing, TimingSource::Window);
        assert_eq!(s.camera, before);
    }

    #[test]
    fn enter_and_exit_vr() {
        let mut s = SessionContext::new((800, 600), PlotSize::default());
        assert!(s.enter_vr().is_err());
        s.vr.headset = HeadsetState::Present(SimulatedHeadset::new(90.0).descriptor);
        s.enter_vr().unwrap();
        assert!(s.vr.presenting);
        assert!((s.eye_aspect() - 0.9).abs() < 1e-6);
        assert_eq!(s.stereo_target_size(), (2160, 1200));
        s.camera.yaw = 0.4;
        s.exit_vr();
        assert!(!s.vr.presenting);
        assert_eq!(s.camera.yaw, 0.0);
    }

    #[test]
    fn stereo_target_follows_the_window_without_a_headset() {
        let s = SessionContext::new((800, 600), PlotSize::default());
        assert_eq!(s.stereo_target_size(), (800, 600));
    }
}
