//! The rendering orchestrator. Owns the GPU context, the depth target, the
//! per-view uniforms and the point/line pipelines, and draws a session for
//! the views the scheduler asks for. The standard view goes to the window;
//! the stereo view goes to a separate eye target so both survive a frame.

pub mod context;
pub mod pipelines;
pub mod targets;
pub mod views;

use self::{
    context::GfxContext,
    pipelines::{lines::LinesPipeline, points::PointsPipeline},
    targets::{DepthTarget, EyeTarget},
    views::ViewBindings,
};
use crate::{scheduler::RenderView, session::SessionContext, ui::UiPaint};
use std::sync::Arc;
use winit::window::Window;

/// Distance between the two eye cameras, meters.
pub const EYE_SEPARATION_M: f32 = 0.064;

const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.02,
    g: 0.02,
    b: 0.03,
    a: 1.0,
};

/// Pixel rectangle a view is drawn into.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Viewport {
    x: f32,
    y: f32,
    w: f32,
    h: f32,
}

/// Left and right eye halves of a side-by-side target.
fn stereo_viewports((width, height): (u32, u32)) -> [Viewport; 2] {
    let (w, h) = (width as f32, height as f32);
    [
        Viewport { x: 0.0, y: 0.0, w: w * 0.5, h },
        Viewport { x: w * 0.5, y: 0.0, w: w * 0.5, h },
    ]
}

pub struct Renderer {
    pub gfx: GfxContext,
    pub depth: DepthTarget,
    eye_target: Option<EyeTarget>,
    views: ViewBindings,
    points: PointsPipeline,
    lines: LinesPipeline,
    pub egui_renderer: egui_wgpu::Renderer,
}

impl Renderer {
    pub async fn new(window: Arc<Window>) -> anyhow::Result<Self> {
        let gfx = GfxContext::new(window).await?;
        let depth = DepthTarget::new(&gfx.device, gfx.size);
        let views = ViewBindings::new(&gfx.device);
        let points = PointsPipeline::new(&gfx.device, &views.layout, gfx.format(), depth.format);
        let lines = LinesPipeline::new(&gfx.device, &views.layout, gfx.format(), depth.format);
        let egui_renderer = egui_wgpu::Renderer::new(&gfx.device, gfx.format(), None, 1);

        Ok(Self {
            gfx,
            depth,
            eye_target: None,
            views,
            points,
            lines,
            egui_renderer,
        })
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.gfx.resize(new_size);
            self.depth.resize(&self.gfx.device, new_size);
        }
    }

    /// Draws `views` of the session, then the UI on top, and presents.
    pub fn render(
        &mut self,
        session: &SessionContext,
        views: &[RenderView],
        ui: Option<&UiPaint>,
    ) -> Result<(), wgpu::SurfaceError> {
        let frame = self.gfx.surface.get_current_texture()?;
        let swap_view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.upload_scene(session);

        let cam = &session.camera;
        let eye_aspect = session.eye_aspect();
        let half = EYE_SEPARATION_M * 0.5;
        self.views.mono.write(&self.gfx.queue, &cam.view_uniform());
        self.views.left.write(&self.gfx.queue, &cam.eye_uniform(-half, eye_aspect));
        self.views.right.write(&self.gfx.queue, &cam.eye_uniform(half, eye_aspect));

        let (w, h) = (self.gfx.config.width as f32, self.gfx.config.height as f32);
        let full = Viewport { x: 0.0, y: 0.0, w, h };

        if views.contains(&RenderView::Stereo) {
            self.ensure_eye_target(session.stereo_target_size());
        }

        let mut encoder = self
            .gfx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        for view in views {
            match view {
                RenderView::Standard => self.scene_pass(
                    &mut encoder,
                    (&swap_view, &self.depth.view),
                    "Standard View Pass",
                    &[(full, &self.views.mono.bind_group)],
                ),
                RenderView::Stereo => {
                    let Some(eye) = &self.eye_target else {
                        continue;
                    };
                    let [left, right] = stereo_viewports(eye.size);
                    self.scene_pass(
                        &mut encoder,
                        (&eye.view, &eye.depth.view),
                        "Stereo View Pass",
                        &[
                            (left, &self.views.left.bind_group),
                            (right, &self.views.right.bind_group),
                        ],
                    );
                }
            }
        }

        if let Some(ui) = ui {
            self.paint_ui(&mut encoder, &swap_view, ui);
        }

        self.gfx.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }

    fn upload_scene(&mut self, session: &SessionContext) {
        match session.point_cloud() {
            Some(cloud) => self.points.upload(&self.gfx.device, &self.gfx.queue, &cloud.buffer),
            None => self.points.clear(),
        }
        let segments = session.scene.line_segments();
        self.lines.upload(&self.gfx.device, &self.gfx.queue, &segments);
    }

    /// Keeps the eye target at `size`, recreating it when the size changes.
    fn ensure_eye_target(&mut self, size: (u32, u32)) {
        let size = (size.0.max(1), size.1.max(1));
        if self.eye_target.as_ref().map(|t| t.size) != Some(size) {
            log::debug!("Stereo eye target {}x{}", size.0, size.1);
            self.eye_target = Some(EyeTarget::new(&self.gfx.device, self.gfx.format(), size));
        }
    }

    fn scene_pass(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        (target, depth): (&wgpu::TextureView, &wgpu::TextureView),
        label: &str,
        viewports: &[(Viewport, &wgpu::BindGroup)],
    ) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: depth,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        for (vp, bind_group) in viewports {
            pass.set_viewport(vp.x, vp.y, vp.w, vp.h, 0.0, 1.0);
            self.lines.draw(&mut pass, bind_group);
            self.points.draw(&mut pass, bind_group);
        }
    }

    fn paint_ui(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
        ui: &UiPaint,
    ) {
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.gfx.config.width, self.gfx.config.height],
            pixels_per_point: ui.pixels_per_point,
        };

        for (id, delta) in &ui.textures.set {
            self.egui_renderer
                .update_texture(&self.gfx.device, &self.gfx.queue, *id, delta);
        }

        self.egui_renderer.update_buffers(
            &self.gfx.device,
            &self.gfx.queue,
            encoder,
            &ui.primitives,
            &screen_descriptor,
        );

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("EGUI Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            self.egui_renderer
                .render(&mut render_pass, &ui.primitives, &screen_descriptor);
        }

        for id in &ui.textures.free {
            self.egui_renderer.free_texture(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stereo_viewports_split_the_eye_target() {
        let [left, right] = stereo_viewports((2160, 1200));
        assert_eq!(left, Viewport { x: 0.0, y: 0.0, w: 1080.0, h: 1200.0 });
        assert_eq!(right, Viewport { x: 1080.0, y: 0.0, w: 1080.0, h: 1200.0 });
    }
}
