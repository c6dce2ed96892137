use glam::Vec2;
use winit::window::{Window, WindowId};

use crate::device::{Gpu, SurfaceErrorAction};
use crate::input::InputState;
use crate::render::{BatchPipelines, Camera, RenderTarget, Renderer, WgpuBackend};
use crate::time::FrameTime;
use crate::window::RuntimeCtx;

use super::app::AppControl;

pub struct WindowCtx<'a> {
    pub id: WindowId,
    pub window: &'a Window,
}

impl WindowCtx<'_> {
    /// Drawable size in physical pixels.
    pub fn physical_size(&self) -> Vec2 {
        let size = self.window.inner_size();
        Vec2::new(size.width as f32, size.height as f32)
    }
}

/// Everything an app sees during one frame.
///
/// `'a` spans the callback; `'w` is the window borrow held by `Gpu<'w>`.
pub struct FrameCtx<'a, 'w> {
    pub window: WindowCtx<'a>,
    pub gpu: &'a mut Gpu<'w>,
    pub input: &'a InputState,
    pub time: FrameTime,
    pub runtime: &'a mut RuntimeCtx,
}

impl FrameCtx<'_, '_> {
    /// Builds batch pipelines for this window's surface format.
    pub fn create_pipelines(&self) -> BatchPipelines {
        BatchPipelines::new(self.gpu.device(), self.gpu.queue(), self.gpu.surface_format())
    }

    /// Acquires the swapchain image, flushes `renderer` into it through
    /// `camera` and presents.
    ///
    /// A lost or outdated surface is reconfigured and the frame's batches are
    /// dropped. Only an out-of-memory surface ends the app.
    pub fn present(
        &mut self,
        renderer: &mut Renderer,
        pipelines: &BatchPipelines,
        camera: &mut Camera,
    ) -> AppControl {
        let mut frame = match self.gpu.begin_frame() {
            Ok(frame) => frame,
            Err(err) => {
                log::debug!("frame skipped: {err}");
                renderer.discard();
                return match self.gpu.handle_surface_error(err) {
                    SurfaceErrorAction::Fatal => {
                        log::error!("surface out of memory; exiting");
                        AppControl::Exit
                    }
                    _ => AppControl::Continue,
                };
            }
        };

        let size = self.gpu.size();
        {
            let rctx = self.gpu.render_ctx();
            let mut target = RenderTarget::new(&mut frame.encoder, &frame.view);
            let mut backend = WgpuBackend::new(&rctx, &mut target, pipelines);
            renderer.flush(&mut backend, size.width, size.height, camera);
        }

        self.window.window.pre_present_notify();
        self.gpu.submit(frame);
        AppControl::Continue
    }
}
