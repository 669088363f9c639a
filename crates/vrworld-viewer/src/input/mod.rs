//! Device input: keyboard, mouse trackball and pointer, VR headset and hand
//! controllers.
//!
//! Window events are applied as they arrive (keyboard steps) or accumulated
//! for the next frame (trackball, clicks). Controller and head-tracking events
//! come from the host VR runtime on any thread and are queued until the frame
//! loop drains them.

pub mod controller;
pub mod headset;
pub mod keyboard;
pub mod pointer;
pub mod trackball;

use crate::scene::Pose;
use crate::session::SessionContext;
use controller::ControllerTargets;
use crossbeam_channel::{unbounded, Receiver, Sender};
use glam::Vec2;
use keyboard::NavKey;
use trackball::DragMode;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::PhysicalKey;

/// Events delivered by the VR runtime.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    ControllerConnected(u32),
    ControllerDisconnected(u32),
    ButtonPressed(u32),
    ButtonReleased(u32),
    ControllerMoved(u32, Pose),
    HeadPose(Pose),
}

/// Routes window events into the session and owns the VR event queue.
pub struct DeviceInput {
    tx: Sender<InputEvent>,
    rx: Receiver<InputEvent>,
}

impl Default for DeviceInput {
    fn default() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx }
    }
}

impl DeviceInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Producer handle for a VR runtime thread.
    pub fn sender(&self) -> Sender<InputEvent> {
        self.tx.clone()
    }

    /// Handles a window event the UI did not consume.
    pub fn handle_window_event(&mut self, session: &mut SessionContext, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state != ElementState::Pressed || !session.keyboard_enabled {
                    return;
                }
                if let PhysicalKey::Code(code) = event.physical_key {
                    if let Some(key) = NavKey::from_key_code(code) {
                        keyboard::apply(key, &mut session.camera);
                    }
                }
            }
            WindowEvent::MouseInput { button, state, .. } => {
                let pressed = *state == ElementState::Pressed;
                match button {
                    MouseButton::Left => {
                        if pressed {
                            session.trackball.begin_drag(DragMode::Rotate);
                            session.pointer.pressed();
                        } else {
                            session.trackball.end_drag(DragMode::Rotate);
                            if session.pointer.released() {
                                if let Some(pos) = session.pointer.take_click() {
                                    session.queue_pointer_pick(pos);
                                }
                            }
                        }
                    }
                    MouseButton::Right => {
                        if pressed {
                            session.trackball.begin_drag(DragMode::Pan);
                        } else {
                            session.trackball.end_drag(DragMode::Pan);
                        }
                    }
                    _ => {}
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                let pos = Vec2::new(position.x as f32, position.y as f32);
                let (w, h) = session.viewport;
                session.trackball.cursor_moved(pos, Vec2::new(w as f32, h as f32));
                session.pointer.cursor_moved(pos);
            }
            WindowEvent::CursorLeft { .. } => session.pointer.cursor_left(),
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 120.0,
                };
                session.trackball.scroll(lines);
            }
            _ => {}
        }
    }

    /// Applies queued VR events in arrival order, then picks up the headset
    /// probe outcome if it has arrived.
    pub fn poll(&mut self, session: &mut SessionContext) {
        for event in self.rx.try_iter() {
            dispatch(session, event);
        }
        if let Some(outcome) = session.vr.poll_probe() {
            session.apply_probe_outcome(outcome);
        }
    }
}

fn dispatch(session: &mut SessionContext, event: InputEvent) {
    let SessionContext {
        scene,
        panel,
        selection,
        controllers,
        vr,
        input_error,
        ..
    } = session;

    let mut targets = ControllerTargets {
        scene,
        panel,
        selection,
    };

    let result = match event {
        InputEvent::ControllerConnected(id) => controllers.connect(id, &mut targets),
        InputEvent::ControllerDisconnected(id) => controllers.disconnect(id, &mut targets),
        InputEvent::ButtonPressed(id) => controllers.press(id, &mut targets),
        InputEvent::ButtonReleased(id) => controllers.release(id, &mut targets),
        InputEvent::ControllerMoved(id, pose) => controllers.moved(id, pose, targets.scene),
        InputEvent::HeadPose(pose) => {
            vr.controls.set_head_pose(pose);
            Ok(())
        }
    };

    match result {
        Ok(()) if !matches!(event, InputEvent::HeadPose(_)) => *input_error = None,
        Ok(()) => {}
        Err(e) => {
            log::warn!("Ignoring {:?}: {}", event, e);
            *input_error = Some(e.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plot::PlotSize;
    use crate::scene::NodeKind;

    #[test]
    fn vr_events_apply_in_order() {
        let mut input = DeviceInput::new();
        let mut session = SessionContext::new((800, 600), PlotSize::default());
        let tx = input.sender();

        tx.send(InputEvent::ControllerConnected(4)).unwrap();
        tx.send(InputEvent::ButtonPressed(4)).unwrap();
        tx.send(InputEvent::ButtonReleased(4)).unwrap();
        input.poll(&mut session);

        assert_eq!(session.scene.count(NodeKind::ControllerVisual), 1);
        assert!(!session.panel.is_pressed(4));
        assert!(session.selection.has_pending());

        tx.send(InputEvent::ControllerDisconnected(4)).unwrap();
        input.poll(&mut session);
        assert_eq!(session.scene.count(NodeKind::ControllerVisual), 0);
        assert!(session.controllers.is_empty());
    }

    #[test]
    fn unknown_controller_is_not_fatal() {
        let mut input = DeviceInput::new();
        let mut session = SessionContext::new((800, 600), PlotSize::default());
        input.sender().send(InputEvent::ButtonPressed(11)).unwrap();
        input.poll(&mut session);
        assert!(session.controllers.is_empty());
        assert!(!session.selection.has_pending());
        assert!(session
            .input_error
            .as_deref()
            .is_some_and(|msg| msg.contains("unknown controller 11")));

        // The next event that applies cleanly clears the report.
        input.sender().send(InputEvent::ControllerConnected(11)).unwrap();
        input.poll(&mut session);
        assert_eq!(session.input_error, None);
    }
}
