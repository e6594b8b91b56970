//! Viewer state: everything the render loop reads, plus the handling of
//! actions and deferred GPU work.

use std::path::{Path, PathBuf};

use voxray_engine::core::AppControl;

use crate::action::{DragButton, InputAction, ParameterSlider};
use crate::camera::{Camera, CameraMode};
use crate::config::ViewerConfig;
use crate::frame::{ClearColor, FrameBackend, FrameOutcome, RenderLoop, Scene};
use crate::shader::{ProgramLinker, ShaderError, ShaderManager};
use crate::transfer::{Light, RedrawNeeded, TransferFunction};
use crate::volume::{self, TextureUploader, Volume, VolumeLoadError, VolumeLoader};

/// Work that needs the GPU and therefore waits for the next frame.
#[derive(Debug, Default, Clone, PartialEq)]
struct Pending {
    reload: bool,
    volume: Option<PathBuf>,
}

/// Owns camera, program, volume and transfer state for one window.
///
/// `P` is the backend program handle and `T` the backend 3D texture.
pub struct Viewer<P, T> {
    camera: Camera,
    shaders: ShaderManager<P>,
    volume: Option<Volume<T>>,
    transfer: TransferFunction,
    light: Light,
    background: ClearColor,
    slider: ParameterSlider,
    render_loop: RenderLoop,
    pending: Pending,
}

fn redraw(_: RedrawNeeded) -> AppControl {
    AppControl::Redraw
}

impl<P, T> Viewer<P, T> {
    pub fn new(config: ViewerConfig) -> Self {
        Self {
            camera: Camera::new(config.projection),
            shaders: ShaderManager::new(config.shaders),
            volume: None,
            transfer: config.transfer,
            light: config.light,
            background: config.background,
            slider: ParameterSlider::default(),
            render_loop: RenderLoop::new(),
            pending: Pending::default(),
        }
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn shaders(&self) -> &ShaderManager<P> {
        &self.shaders
    }

    pub fn volume(&self) -> Option<&Volume<T>> {
        self.volume.as_ref()
    }

    pub fn transfer(&self) -> &TransferFunction {
        &self.transfer
    }

    pub fn light(&self) -> &Light {
        &self.light
    }

    pub fn slider(&self) -> &ParameterSlider {
        &self.slider
    }

    /// Short status line: the selected parameter and its value.
    pub fn status(&self) -> String {
        let p = self.slider.selected();
        p.format(p.get(&self.transfer, &self.light))
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.camera.set_viewport(0, 0, width, height);
    }

    /// Applies one action. GPU-bound requests (shader reload, volume load) are
    /// queued for [`Viewer::process_pending`].
    pub fn apply(&mut self, action: InputAction) -> AppControl {
        match action {
            InputAction::RotateLeft => self.camera.rotate(-1.0),
            InputAction::RotateRight => self.camera.rotate(1.0),
            InputAction::ZoomIn => self.camera.zoom(-1.0),
            InputAction::ZoomOut => self.camera.zoom(1.0),
            InputAction::Wheel(lines) => self.camera.zoom(-lines),

            InputAction::ReloadShaders => self.pending.reload = true,
            InputAction::LoadVolume(dir) => self.pending.volume = Some(dir),

            InputAction::SelectParameter(p) => {
                self.slider.select(p);
                log::info!("selected {}", self.status());
            }
            InputAction::Increase => return self.step_selected(1),
            InputAction::Decrease => return self.step_selected(-1),
            InputAction::SetParameter(p, value) => {
                return redraw(p.set(&mut self.transfer, &mut self.light, value));
            }

            InputAction::PointerPressed { button, x, y } => match button {
                DragButton::Rotate => self.camera.start_rotating(x, y),
                DragButton::Zoom => self.camera.start_zooming(x, y),
            },
            InputAction::PointerReleased { button, x, y } => match button {
                DragButton::Rotate => self.camera.stop_rotating(x, y),
                DragButton::Zoom => self.camera.stop_zooming(x, y),
            },
            InputAction::PointerMoved { x, y } => {
                if self.camera.mode() == CameraMode::Idle {
                    return AppControl::Continue;
                }
                self.camera.set_rotation_x(y);
                self.camera.set_rotation_y(x);
                self.camera.safe_zoom(y);
            }

            InputAction::Quit => return AppControl::Exit,
        }
        AppControl::Redraw
    }

    fn step_selected(&mut self, ticks: i32) -> AppControl {
        let (_, redraw_needed) = self.slider.step(ticks, &mut self.transfer, &mut self.light);
        log::info!("{}", self.status());
        redraw(redraw_needed)
    }

    pub fn has_pending(&self) -> bool {
        self.pending != Pending::default()
    }

    /// Builds the first program. The caller decides what a failure means.
    pub fn init_shaders<L>(&mut self, linker: &mut L) -> Result<(), ShaderError>
    where
        L: ProgramLinker<Program = P>,
    {
        self.shaders.reload(linker)
    }

    /// Rebuilds the program from disk; the previous one stays active on failure.
    pub fn reload_shaders<L>(&mut self, linker: &mut L) -> Result<(), ShaderError>
    where
        L: ProgramLinker<Program = P>,
    {
        self.shaders.reload(linker).inspect_err(|err| {
            log::warn!("shader reload failed, keeping previous program: {err}");
        })
    }

    /// Replaces the volume and refits the camera. Nothing changes on failure.
    pub fn load_volume<L, U>(
        &mut self,
        loader: &L,
        uploader: &mut U,
        dir: &Path,
    ) -> Result<(), VolumeLoadError>
    where
        L: VolumeLoader + ?Sized,
        U: TextureUploader<Texture = T> + ?Sized,
    {
        let loaded = volume::load_volume(loader, uploader, dir)?;
        self.camera.update_model(loaded.bounds.min, loaded.bounds.max);
        self.volume = Some(loaded);
        Ok(())
    }

    /// Runs queued reload and volume requests. Failures are logged and leave
    /// the previous program and volume in place.
    pub fn process_pending<L, VL, U>(&mut self, linker: &mut L, loader: &VL, uploader: &mut U)
    where
        L: ProgramLinker<Program = P>,
        VL: VolumeLoader + ?Sized,
        U: TextureUploader<Texture = T> + ?Sized,
    {
        let pending = std::mem::take(&mut self.pending);
        if pending.reload {
            let _ = self.reload_shaders(linker);
        }
        if let Some(dir) = pending.volume
            && let Err(err) = self.load_volume(loader, uploader, &dir)
        {
            log::warn!("volume load from {} failed: {err}", dir.display());
        }
    }

    /// Renders one frame with the current state.
    pub fn render<B>(&mut self, backend: &mut B) -> FrameOutcome
    where
        B: FrameBackend<Program = P, Texture = T>,
    {
        let scene = Scene {
            camera: &self.camera,
            program: self.shaders.active(),
            volume: self.volume.as_ref(),
            transfer: &self.transfer,
            light: &self.light,
            background: self.background,
        };
        self.render_loop.render_frame(backend, &scene)
    }
}
