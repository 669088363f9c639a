use crate::{
    bootstrap::{bootstrap, Visualization},
    config::Config,
    data::WorldFile,
    input::headset::TimingSource,
    renderer::Renderer,
    scheduler::{FrameSink, RenderView},
    session::SessionContext,
    ui::{self, UiPaint},
};
use anyhow::Result;
use std::sync::Arc;
use std::time::Instant;
use winit::{event::WindowEvent, window::Window};

pub struct App {
    pub renderer: Renderer,
    pub viz: Visualization,
    pub egui_ctx: egui::Context,
    pub egui_state: egui_winit::State,
    started: Instant,
    next_frame_at: Option<Instant>,
}

/// Borrowed view of the app handed to the scheduler for one tick.
struct WindowSink<'a> {
    renderer: &'a mut Renderer,
    window: &'a Window,
    ui: Option<UiPaint>,
    next_frame_at: &'a mut Option<Instant>,
    result: Result<(), wgpu::SurfaceError>,
}

impl FrameSink for WindowSink<'_> {
    fn render(&mut self, session: &SessionContext, views: &[RenderView]) {
        self.result = self.renderer.render(session, views, self.ui.as_ref());
    }

    fn request_frame(&mut self, timing: &TimingSource) {
        match timing.frame_interval() {
            Some(dt) => *self.next_frame_at = Some(Instant::now() + dt),
            None => {
                *self.next_frame_at = None;
                self.window.request_redraw();
            }
        }
    }
}

impl App {
    pub async fn new(window: Arc<Window>, config: &Config) -> Result<Self> {
        let renderer = Renderer::new(window.clone()).await?;
        let size = renderer.gfx.size;

        let source = WorldFile::new(&config.world_path);
        log::info!("Opening world '{}'", source.path().display());
        let viz = bootstrap(
            &source,
            config.headset_probe(),
            (size.width, size.height),
            config.plot_size(),
        );

        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui_ctx.viewport_id(),
            &*window,
            None,
            None,
        );

        Ok(Self {
            renderer,
            viz,
            egui_ctx,
            egui_state,
            started: Instant::now(),
            next_frame_at: None,
        })
    }

    /// When the headset clock wants the next frame, if it paces frames.
    #[inline]
    pub fn next_frame_at(&self) -> Option<Instant> {
        self.next_frame_at
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.renderer.resize(new_size);
            self.viz.session.resize(new_size.width, new_size.height);
        }
    }

    pub fn handle_event(&mut self, window: &Window, event: &WindowEvent) -> bool {
        let response = self.egui_state.on_window_event(window, event);
        if response.consumed {
            return true;
        }

        self.viz
            .input
            .handle_window_event(&mut self.viz.session, event);

        if let WindowEvent::Resized(physical_size) = event {
            self.resize(*physical_size);
        }

        false
    }

    /// Runs the UI, then one scheduler tick which renders and presents.
    pub fn frame(&mut self, window: &Window) -> Result<(), wgpu::SurfaceError> {
        let egui_input = self.egui_state.take_egui_input(window);
        self.egui_ctx.begin_frame(egui_input);
        let actions = ui::draw(
            &self.egui_ctx,
            &mut self.viz.session,
            self.viz.scheduler.fps(),
        );
        let egui_output = self.egui_ctx.end_frame();
        self.egui_state
            .handle_platform_output(window, egui_output.platform_output);
        let primitives = self
            .egui_ctx
            .tessellate(egui_output.shapes, egui_output.pixels_per_point);

        ui::apply_actions(&mut self.viz.session, &actions);

        let mut sink = WindowSink {
            renderer: &mut self.renderer,
            window,
            ui: Some(UiPaint {
                primitives,
                textures: egui_output.textures_delta,
                pixels_per_point: egui_output.pixels_per_point,
            }),
            next_frame_at: &mut self.next_frame_at,
            result: Ok(()),
        };

        let timestamp_ms = self.started.elapsed().as_secs_f64() * 1000.0;
        self.viz.scheduler.tick(
            &mut self.viz.session,
            &mut self.viz.input,
            Some(timestamp_ms),
            &mut sink,
        );

        sink.result
    }
}
