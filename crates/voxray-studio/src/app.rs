use std::path::PathBuf;

use voxray_engine::core::{App, AppControl, FrameCtx};
use voxray_engine::input::InputEvent;
use voxray_raycast::action::{self, InputAction};
use voxray_raycast::gpu::{
    VolumeTexture, WgpuFrame, WgpuLinker, WgpuProgram, WgpuResources, WgpuTextureUploader,
};
use voxray_raycast::volume::ImageStackLoader;
use voxray_raycast::{Viewer, ViewerConfig};

/// Engine app driving one [`Viewer`] with the wgpu backend.
///
/// GPU objects are created lazily on the first frame, the first point where
/// the device is reachable. Shader reloads and volume loads requested through
/// input are deferred to the next frame for the same reason.
pub struct RaycastApp {
    viewer: Viewer<WgpuProgram, VolumeTexture>,
    loader: ImageStackLoader,
    resources: Option<WgpuResources>,
    title: String,
}

impl RaycastApp {
    pub fn new(config: ViewerConfig, volume: Option<PathBuf>) -> Self {
        let mut viewer = Viewer::new(config);
        if let Some(dir) = volume {
            let _ = viewer.apply(InputAction::LoadVolume(dir));
        }
        Self {
            viewer,
            loader: ImageStackLoader::new(),
            resources: None,
            title: String::new(),
        }
    }

    /// First-frame setup. `false` means the viewer cannot run.
    fn ensure_initialized(&mut self, ctx: &FrameCtx<'_, '_>) -> bool {
        if self.resources.is_some() {
            return true;
        }

        let gpu = &*ctx.gpu;
        let mut linker = WgpuLinker::new(gpu.device(), gpu.surface_format());
        if let Err(err) = self.viewer.init_shaders(&mut linker) {
            log::error!("initial shader program failed: {err}");
            return false;
        }
        self.resources = Some(WgpuResources::new(gpu.device(), gpu.queue()));
        true
    }

    fn update_title(&mut self, ctx: &FrameCtx<'_, '_>) {
        let title = format!("voxray | {}", self.viewer.status());
        if title != self.title {
            ctx.window.set_title(&title);
            self.title = title;
        }
    }
}

impl App for RaycastApp {
    fn on_input(&mut self, event: &InputEvent) -> AppControl {
        match action::translate(event) {
            Some(action) => self.viewer.apply(action),
            None => AppControl::Continue,
        }
    }

    fn on_resize(&mut self, width: u32, height: u32) {
        self.viewer.resize(width, height);
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        if !self.ensure_initialized(ctx) {
            return AppControl::Exit;
        }

        if self.viewer.has_pending() {
            let gpu = &*ctx.gpu;
            let mut linker = WgpuLinker::new(gpu.device(), gpu.surface_format());
            let mut uploader = WgpuTextureUploader::new(gpu.device(), gpu.queue());
            self.viewer
                .process_pending(&mut linker, &self.loader, &mut uploader);
        }
        self.update_title(ctx);

        let Some(resources) = self.resources.as_mut() else {
            return AppControl::Exit;
        };
        let viewer = &mut self.viewer;
        ctx.render(|rctx, target| {
            let mut frame = WgpuFrame::new(rctx, target, resources);
            let outcome = viewer.render(&mut frame);
            let draws = frame.finish();
            log::trace!("frame {outcome:?}, {draws} draw call(s)");
        })
    }
}
