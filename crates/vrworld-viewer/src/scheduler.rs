//! The per-frame update/render loop.
//!
//! One `tick` runs input, selection and geometry updates in a fixed order,
//! hands the session to a `FrameSink` for drawing, and asks the sink for the
//! next frame from whichever timing source is active.

use crate::input::headset::TimingSource;
use crate::input::DeviceInput;
use crate::session::SessionContext;

/// Longest frame delta ever reported, in milliseconds.
pub const MAX_DELTA_MS: f64 = 500.0;
/// Timestamp assumed when the timing source supplies none.
pub const FALLBACK_TIMESTAMP_MS: f64 = 15.0;
/// Decoration spin per tick, in radians.
pub const DECORATION_SPIN_RAD: f32 = 0.002;

/// Smoothing factor for the FPS estimate.
const FPS_ALPHA: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderView {
    /// The window view from the session camera.
    Standard,
    /// Left/right eye views for the headset.
    Stereo,
}

/// Where frames go.
pub trait FrameSink {
    fn render(&mut self, session: &SessionContext, views: &[RenderView]);
    fn request_frame(&mut self, timing: &TimingSource);
}

#[derive(Debug)]
pub struct FrameScheduler {
    state: SchedulerState,
    last_ms: f64,
    fps: f32,
    frames: u64,
}

impl Default for FrameScheduler {
    fn default() -> Self {
        Self {
            state: SchedulerState::Idle,
            last_ms: 0.0,
            fps: 0.0,
            frames: 0,
        }
    }
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Idle -> Running. Later calls do nothing.
    pub fn start(&mut self) {
        if self.state == SchedulerState::Idle {
            self.state = SchedulerState::Running;
            log::info!("Frame loop started");
        }
    }

    #[inline]
    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Smoothed frames per second.
    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }

    /// Advances the clock to `timestamp_ms` and returns the clamped delta.
    fn advance_clock(&mut self, timestamp_ms: Option<f64>) -> f64 {
        let now = timestamp_ms.unwrap_or(FALLBACK_TIMESTAMP_MS);
        let delta = (now - self.last_ms).min(MAX_DELTA_MS).max(0.0);
        self.last_ms = now;

        if delta > 0.0 {
            let inst = (1000.0 / delta) as f32;
            self.fps = if self.frames == 0 {
                inst
            } else {
                self.fps + FPS_ALPHA * (inst - self.fps)
            };
        }
        delta
    }

    /// Runs one frame. Does nothing until `start` has been called.
    pub fn tick(
        &mut self,
        session: &mut SessionContext,
        input: &mut DeviceInput,
        timestamp_ms: Option<f64>,
        sink: &mut dyn FrameSink,
    ) {
        if self.state == SchedulerState::Idle {
            return;
        }

        let delta = self.advance_clock(timestamp_ms);
        log::trace!("tick {} delta={:.1}ms", self.frames, delta);

        if let Some(deco) = session.decoration_mut() {
            deco.spin(DECORATION_SPIN_RAD);
        }

        session.trackball.update(&mut session.camera);
        input.poll(session);

        session.update_selection();
        session.mark_points_dirty();

        if session.vr.presenting {
            session.vr.controls.update(&mut session.camera);
            sink.render(session, &[RenderView::Standard, RenderView::Stereo]);
        } else {
            sink.render(session, &[RenderView::Standard]);
        }

        sink.request_frame(&session.timing);
        self.frames += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Dataset;
    use crate::input::headset::{HeadsetState, SimulatedHeadset};
    use crate::input::InputEvent;
    use crate::plot::PlotSize;
    use crate::scene::{NodeKind, Pose};
    use crate::selection::Ray;
    use glam::Vec3;

    #[derive(Default)]
    struct Recorder {
        renders: Vec<Vec<RenderView>>,
        requests: Vec<TimingSource>,
        /// Whether the cloud's selected flags were current when rendered.
        saw_selection: Vec<bool>,
        dirty_at_render: Vec<bool>,
    }

    impl FrameSink for Recorder {
        fn render(&mut self, session: &SessionContext, views: &[RenderView]) {
            self.renders.push(views.to_vec());
            if let Some(cloud) = session.point_cloud() {
                self.saw_selection.push(cloud.buffer.is_selected(0));
                self.dirty_at_render.push(cloud.buffer.dirty().position);
            }
        }

        fn request_frame(&mut self, timing: &TimingSource) {
            self.requests.push(*timing);
        }
    }

    fn session() -> SessionContext {
        let mut s = SessionContext::new((800, 600), PlotSize::default());
        s.dataset = Some(
            Dataset::new([0, 1, 2], vec![], vec![vec![4.0, 8.0, 12.0]]).unwrap(),
        );
        s.draw_dataset([0, 1, 2]).unwrap();
        s.install_decoration();
        s
    }

    #[test]
    fn idle_tick_is_a_no_op() {
        let mut sched = FrameScheduler::new();
        let mut s = session();
        let mut input = DeviceInput::new();
        let mut sink = Recorder::default();
        sched.tick(&mut s, &mut input, Some(16.0), &mut sink);
        assert!(sink.renders.is_empty());
        assert!(sink.requests.is_empty());
        assert_eq!(s.decoration().unwrap().rotation_y, 0.0);
    }

    #[test]
    fn delta_is_clamped() {
        let mut sched = FrameScheduler::new();
        sched.start();
        assert_eq!(sched.advance_clock(Some(100.0)), 100.0);
        assert_eq!(sched.advance_clock(Some(10_100.0)), MAX_DELTA_MS);
        assert_eq!(sched.advance_clock(Some(10_116.0)), 16.0);
    }

    #[test]
    fn missing_timestamp_counts_as_fifteen() {
        let mut sched = FrameScheduler::new();
        assert_eq!(sched.advance_clock(None), 15.0);
    }

    #[test]
    fn start_is_one_way() {
        let mut sched = FrameScheduler::new();
        assert_eq!(sched.state(), SchedulerState::Idle);
        sched.start();
        sched.start();
        assert_eq!(sched.state(), SchedulerState::Running);
    }

    #[test]
    fn tick_updates_before_rendering() {
        let mut sched = FrameScheduler::new();
        sched.start();
        let mut s = session();
        let mut input = DeviceInput::new();
        let mut sink = Recorder::default();

        s.selection
            .queue_pick(Ray::new(Vec3::new(10.0, 5.0, -5.0), Vec3::Z));
        sched.tick(&mut s, &mut input, Some(16.0), &mut sink);

        assert_eq!(sink.renders, vec![vec![RenderView::Standard]]);
        assert_eq!(sink.saw_selection, vec![true]);
        assert_eq!(sink.dirty_at_render, vec![true]);
        assert_eq!(sink.requests, vec![TimingSource::Window]);
        assert!((s.decoration().unwrap().rotation_y - DECORATION_SPIN_RAD).abs() < 1e-7);
    }

    #[test]
    fn controller_events_are_drained_within_the_tick() {
        let mut sched = FrameScheduler::new();
        sched.start();
        let mut s = session();
        let mut input = DeviceInput::new();
        let mut sink = Recorder::default();

        let tx = input.sender();
        tx.send(InputEvent::ControllerConnected(1)).unwrap();
        tx.send(InputEvent::ControllerMoved(
            1,
            Pose {
                position: Vec3::new(10.0, 5.0, 12.0),
                orientation: glam::Quat::IDENTITY,
            },
        ))
        .unwrap();
        tx.send(InputEvent::ButtonPressed(1)).unwrap();
        sched.tick(&mut s, &mut input, Some(16.0), &mut sink);

        assert_eq!(s.scene.count(NodeKind::ControllerVisual), 1);
        assert_eq!(sink.saw_selection, vec![true]);
    }

    #[test]
    fn presenting_renders_stereo_and_tracks_head() {
        let mut sched = FrameScheduler::new();
        sched.start();
        let mut s = session();
        s.vr.headset = HeadsetState::Present(SimulatedHeadset::new(90.0).descriptor);
        s.apply_probe_outcome(Ok(SimulatedHeadset::new(90.0).descriptor));
        s.enter_vr().unwrap();

        let mut input = DeviceInput::new();
        input
            .sender()
            .send(InputEvent::HeadPose(Pose {
                position: Vec3::new(0.0, 1.6, 0.0),
                orientation: glam::Quat::from_rotation_y(0.25),
            }))
            .unwrap();

        let mut sink = Recorder::default();
        sched.tick(&mut s, &mut input, None, &mut sink);

        assert_eq!(
            sink.renders,
            vec![vec![RenderView::Standard, RenderView::Stereo]]
        );
        assert_eq!(sink.requests, vec![TimingSource::Headset { refresh_hz: 90.0 }]);
        let head_forward = glam::Quat::from_rotation_y(0.25) * Vec3::NEG_Z;
        assert!(s.camera.world_direction().abs_diff_eq(head_forward, 1e-5));
    }

    #[test]
    fn fps_tracks_steady_frames() {
        let mut sched = FrameScheduler::new();
        sched.start();
        let mut s = session();
        let mut input = DeviceInput::new();
        let mut sink = Recorder::default();
        for i in 1..=50 {
            sched.tick(&mut s, &mut input, Some(i as f64 * 20.0), &mut sink);
        }
        assert!((sched.fps() - 50.0).abs() < 0.5);
    }
}
