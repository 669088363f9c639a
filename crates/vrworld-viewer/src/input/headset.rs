//! VR headset capability probe, presenting state and head tracking.
//!
//! The probe runs once per session on its own thread. Its single outcome is
//! handed back over a channel and picked up by the frame loop at a tick
//! boundary, so the camera/timing mutation it triggers is ordered before the
//! next tick reads them.

use crate::camera::{Camera, USER_HEIGHT_M};
use crate::error::{Result, VizError};
use crate::scene::Pose;
use crossbeam_channel::{bounded, Receiver, TryRecvError};
use futures::future::BoxFuture;
use glam::Vec3;
use std::time::Duration;

/// Physical play-area dimensions reported by a headset.
#[derive(Debug, Clone, PartialEq)]
pub struct StageParameters {
    pub size_x_m: f32,
    pub size_z_m: f32,
}

/// What a successful probe reports about the display.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayDescriptor {
    pub name: String,
    pub refresh_hz: f32,
    /// Per-eye render target size in pixels.
    pub eye_width: u32,
    pub eye_height: u32,
    pub stage: Option<StageParameters>,
}

impl DisplayDescriptor {
    /// Side-by-side render size for both eyes.
    #[inline]
    pub fn render_size(&self) -> (u32, u32) {
        (self.eye_width * 2, self.eye_height)
    }
}

/// Host VR API boundary: resolves once with a usable display or rejects.
pub trait HeadsetProbe: Send + 'static {
    fn probe(self: Box<Self>) -> BoxFuture<'static, Result<DisplayDescriptor>>;
}

/// Always rejects; the session keeps the window timing source.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHeadset;

impl HeadsetProbe for NoHeadset {
    fn probe(self: Box<Self>) -> BoxFuture<'static, Result<DisplayDescriptor>> {
        Box::pin(async { Err(VizError::Headset("no VR display available".into())) })
    }
}

/// Resolves with a fixed display, for desktop testing of the VR path.
#[derive(Debug, Clone)]
pub struct SimulatedHeadset {
    pub descriptor: DisplayDescriptor,
}

impl SimulatedHeadset {
    pub fn new(refresh_hz: f32) -> Self {
        Self {
            descriptor: DisplayDescriptor {
                name: "Simulated HMD".into(),
                refresh_hz,
                eye_width: 1080,
                eye_height: 1200,
                stage: Some(StageParameters {
                    size_x_m: 3.0,
                    size_z_m: 3.0,
                }),
            },
        }
    }
}

impl HeadsetProbe for SimulatedHeadset {
    fn probe(self: Box<Self>) -> BoxFuture<'static, Result<DisplayDescriptor>> {
        let descriptor = self.descriptor;
        Box::pin(async move { Ok(descriptor) })
    }
}

/// Receiving end of a spawned probe. Yields its outcome exactly once.
#[derive(Debug)]
pub struct ProbeHandle {
    rx: Receiver<Result<DisplayDescriptor>>,
    resolved: bool,
}

impl ProbeHandle {
    /// Non-blocking. `None` while the probe is still running or after the
    /// outcome was already delivered.
    pub fn poll(&mut self) -> Option<Result<DisplayDescriptor>> {
        if self.resolved {
            return None;
        }
        let outcome = match self.rx.try_recv() {
            Ok(outcome) => outcome,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => Err(VizError::Headset(
                "probe thread exited without an answer".into(),
            )),
        };
        self.resolved = true;
        Some(outcome)
    }

    #[inline]
    pub fn is_resolved(&self) -> bool {
        self.resolved
    }
}

/// Starts `probe` on a background thread and returns immediately.
pub fn spawn_probe(probe: Box<dyn HeadsetProbe>) -> ProbeHandle {
    let (tx, rx) = bounded(1);
    let tx_thread = tx.clone();

    let spawned = std::thread::Builder::new()
        .name("headset-probe".into())
        .spawn(move || {
            let outcome = pollster::block_on(probe.probe());
            // The session may already be gone; nothing to report to then.
            let _ = tx_thread.send(outcome);
        });

    if let Err(e) = spawned {
        let _ = tx.send(Err(VizError::Headset(format!(
            "failed to start headset probe: {}",
            e
        ))));
    }

    ProbeHandle {
        rx,
        resolved: false,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum HeadsetState {
    Probing,
    Absent,
    Present(DisplayDescriptor),
}

/// What drives the next frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimingSource {
    /// The window's redraw cycle.
    Window,
    /// The headset's display refresh.
    Headset { refresh_hz: f32 },
}

impl TimingSource {
    /// Pacing interval; `None` means "as soon as the window allows".
    pub fn frame_interval(&self) -> Option<Duration> {
        match self {
            TimingSource::Window => None,
            TimingSource::Headset { refresh_hz } if *refresh_hz > 0.0 => {
                Some(Duration::from_secs_f32(1.0 / refresh_hz))
            }
            TimingSource::Headset { .. } => None,
        }
    }
}

/// Applies the tracked head pose to the camera while presenting.
#[derive(Debug, Clone)]
pub struct VrControls {
    pub standing: bool,
    pub user_height: f32,
    /// World position of the tracking-space origin.
    origin: Vec3,
    head_pose: Option<Pose>,
}

impl Default for VrControls {
    fn default() -> Self {
        Self {
            standing: true,
            user_height: USER_HEIGHT_M,
            origin: Vec3::ZERO,
            head_pose: None,
        }
    }
}

impl VrControls {
    /// Anchors tracking space under the camera's current position.
    pub fn anchor_to(&mut self, camera: &Camera) {
        let drop = if self.standing { self.user_height } else { 0.0 };
        self.origin = camera.position - Vec3::Y * drop;
    }

    pub fn set_head_pose(&mut self, pose: Pose) {
        self.head_pose = Some(pose);
    }

    /// Moves the camera to the latest head pose. Returns whether a pose was
    /// available.
    pub fn update(&mut self, camera: &mut Camera) -> bool {
        match self.head_pose {
            Some(pose) => {
                camera.position = self.origin + pose.position;
                camera.set_orientation(pose.orientation);
                true
            }
            None => false,
        }
    }
}

/// Headset-related session state.
#[derive(Debug)]
pub struct VrSession {
    pub headset: HeadsetState,
    pub presenting: bool,
    pub controls: VrControls,
    /// Last user-facing VR error, shown with a "learn more" hint.
    pub last_error: Option<String>,
    probe: Option<ProbeHandle>,
}

impl Default for VrSession {
    fn default() -> Self {
        Self {
            headset: HeadsetState::Absent,
            presenting: false,
            controls: VrControls::default(),
            last_error: None,
            probe: None,
        }
    }
}

impl VrSession {
    /// Starts the one-shot capability probe.
    pub fn start_probe(&mut self, probe: Box<dyn HeadsetProbe>) {
        self.headset = HeadsetState::Probing;
        self.probe = Some(spawn_probe(probe));
    }

    /// Takes the probe outcome if it just arrived, updating `headset`.
    pub fn poll_probe(&mut self) -> Option<Result<DisplayDescriptor>> {
        let outcome = self.probe.as_mut()?.poll()?;
        self.probe = None;
        self.headset = match &outcome {
            Ok(display) => HeadsetState::Present(display.clone()),
            Err(_) => HeadsetState::Absent,
        };
        Some(outcome)
    }

    pub fn display(&self) -> Option<&DisplayDescriptor> {
        match &self.headset {
            HeadsetState::Present(d) => Some(d),
            _ => None,
        }
    }

    /// Begins presenting to the headset.
    pub fn enter(&mut self, camera: &Camera) -> Result<()> {
        if self.display().is_none() {
            let err = VizError::Headset("no presentable VR display".into());
            self.last_error = Some(err.to_string());
            return Err(err);
        }
        self.presenting = true;
        self.last_error = None;
        self.controls.anchor_to(camera);
        Ok(())
    }

    /// Stops presenting and levels the camera.
    pub fn exit(&mut self, camera: &mut Camera) {
        if self.presenting {
            self.presenting = false;
            camera.reset_orientation();
        }
    }
}
