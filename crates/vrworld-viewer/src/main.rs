//! Entry point for the VR World viewer.

use anyhow::Result;
use clap::Parser;
use std::{sync::Arc, time::Instant};
use vrworld_viewer::{app::App, config::Config};
use winit::{
    event::{Event, StartCause, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::WindowBuilder,
};

fn main() -> Result<()> {
    // Initialize logging; default to "info" if RUST_LOG is unset.
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info")
    ).init();

    let config = Config::parse();

    let event_loop = EventLoop::new()?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title("VR World")
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 720))
            .build(&event_loop)?,
    );

    let mut app = pollster::block_on(App::new(window.clone(), &config))?;

    event_loop.run(move |event, elwt| {
        match event {
            Event::NewEvents(StartCause::ResumeTimeReached { .. }) => {
                window.request_redraw();
            }
            Event::WindowEvent { window_id, event } if window_id == window.id() => {
                if !app.handle_event(&window, &event) {
                    match event {
                        WindowEvent::CloseRequested => elwt.exit(),
                        WindowEvent::KeyboardInput { event, .. } => {
                            if event.physical_key == PhysicalKey::Code(KeyCode::Escape) {
                                elwt.exit();
                            }
                        }
                        WindowEvent::RedrawRequested => match app.frame(&window) {
                            Ok(_) => {}
                            Err(wgpu::SurfaceError::Lost) => {
                                app.resize(app.renderer.gfx.size);
                            }
                            Err(wgpu::SurfaceError::OutOfMemory) => {
                                log::error!("WGPU out of memory – exiting.");
                                elwt.exit();
                            }
                            Err(e) => log::error!("Render error: {:?}", e),
                        },
                        _ => {}
                    }
                }
            }
            Event::AboutToWait => {
                // Headset timing paces frames; the window clock redraws eagerly.
                match app.next_frame_at() {
                    Some(at) if at > Instant::now() => {
                        elwt.set_control_flow(ControlFlow::WaitUntil(at));
                    }
                    _ => {
                        elwt.set_control_flow(ControlFlow::Poll);
                        window.request_redraw();
                    }
                }
            }
            _ => {}
        }
    })?;

    Ok(())
}
