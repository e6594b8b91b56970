//! One frame of the raycaster, expressed against an abstract backend.
//!
//! The order of calls is the contract: clear, bind, upload everything, optionally
//! bind the volume with blending, a single draw, then blending off. Because all
//! uploads precede the only draw, no frame can observe partially updated state.

use std::collections::HashSet;

use crate::camera::Camera;
use crate::shader::{SamplerLocation, ShaderProgram, UniformLocation, UniformValue};
use crate::transfer::{LIGHT_UNIFORM, Light, TransferFunction};
use crate::volume::Volume;

pub const PROJECTION_UNIFORM: &str = "projection";
pub const VIEW_UNIFORM: &str = "view";
pub const MODEL_UNIFORM: &str = "model";
pub const VOLUME_SAMPLER: &str = "volume";

/// Texture unit the volume is bound to.
pub const VOLUME_UNIT: u32 = 0;

/// Every value uniform uploaded per frame, in upload order.
pub const UNIFORM_NAMES: [&str; 10] = [
    PROJECTION_UNIFORM,
    VIEW_UNIFORM,
    MODEL_UNIFORM,
    "red_min",
    "red_max",
    "green_min",
    "green_max",
    "blue_min",
    "blue_max",
    LIGHT_UNIFORM,
];

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ClearColor {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl ClearColor {
    pub const WHITE: ClearColor = ClearColor::rgb(1.0, 1.0, 1.0);
    pub const BLACK: ClearColor = ClearColor::rgb(0.0, 0.0, 0.0);

    pub const fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b, a: 1.0 }
    }
}

impl Default for ClearColor {
    fn default() -> Self {
        Self::WHITE
    }
}

/// GPU operations the render loop needs. Calls arrive in frame order.
pub trait FrameBackend {
    type Program;
    type Texture;

    /// Clears color and depth.
    fn clear(&mut self, color: ClearColor);
    fn use_program(&mut self, program: &ShaderProgram<Self::Program>);
    fn set_uniform(&mut self, location: &UniformLocation, value: UniformValue);
    /// Points a sampled texture at a texture unit.
    fn set_sampler(&mut self, location: &SamplerLocation, unit: u32);
    /// Source-alpha / one-minus-source-alpha blending.
    fn enable_alpha_blend(&mut self);
    fn disable_blend(&mut self);
    fn bind_texture_3d(&mut self, unit: u32, texture: &Self::Texture);
    fn draw_cube(&mut self);
}

/// Everything a frame reads. State is borrowed fresh per frame, so any number
/// of changes between two frames collapse into the next one.
pub struct Scene<'a, P, T> {
    pub camera: &'a Camera,
    pub program: Option<&'a ShaderProgram<P>>,
    pub volume: Option<&'a Volume<T>>,
    pub transfer: &'a TransferFunction,
    pub light: &'a Light,
    pub background: ClearColor,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FrameOutcome {
    /// No program yet; only the clear happened.
    Cleared,
    Drawn { with_volume: bool },
}

/// Stateless apart from remembering which missing names were already reported.
#[derive(Debug, Default)]
pub struct RenderLoop {
    reported: HashSet<String>,
}

impl RenderLoop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render_frame<B: FrameBackend>(
        &mut self,
        backend: &mut B,
        scene: &Scene<'_, B::Program, B::Texture>,
    ) -> FrameOutcome {
        backend.clear(scene.background);

        let Some(program) = scene.program else {
            log::trace!("frame skipped: no shader program");
            return FrameOutcome::Cleared;
        };

        let camera = scene.camera;
        backend.use_program(program);
        self.upload(backend, program, PROJECTION_UNIFORM, camera.projection().into());
        self.upload(backend, program, VIEW_UNIFORM, camera.view().into());
        self.upload(backend, program, MODEL_UNIFORM, camera.model().into());

        for (name, value) in scene.transfer.uniforms() {
            self.upload(backend, program, name, UniformValue::F32(value));
        }
        self.upload(backend, program, LIGHT_UNIFORM, scene.light.position.into());

        if let Some(volume) = scene.volume {
            backend.enable_alpha_blend();
            backend.bind_texture_3d(VOLUME_UNIT, &volume.texture);
            match program.sampler_location(VOLUME_SAMPLER) {
                Some(loc) => backend.set_sampler(loc, VOLUME_UNIT),
                None => self.report_missing(VOLUME_SAMPLER),
            }
        }

        backend.draw_cube();
        backend.disable_blend();

        FrameOutcome::Drawn {
            with_volume: scene.volume.is_some(),
        }
    }

    fn upload<B: FrameBackend>(
        &mut self,
        backend: &mut B,
        program: &ShaderProgram<B::Program>,
        name: &str,
        value: UniformValue,
    ) {
        match program.uniform_location(name) {
            Some(loc) if loc.kind == value.kind() => backend.set_uniform(loc, value),
            Some(loc) => {
                if self.reported.insert(name.to_string()) {
                    log::warn!(
                        "uniform `{name}` is declared as {:?} but uploaded as {:?}; skipped",
                        loc.kind,
                        value.kind()
                    );
                }
            }
            None => self.report_missing(name),
        }
    }

    fn report_missing(&mut self, name: &str) {
        if self.reported.insert(name.to_string()) {
            log::debug!("shader program has no `{name}`; skipped");
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::{Mat4, Vec3};

    use super::*;
    use crate::camera::ProjectionParams;
    use crate::testing::{Command, RecordingBackend, RecordingLinker, fixture_program};
    use crate::transfer::{Bound, Channel};
    use crate::volume::Bounds;

    struct Fixture {
        camera: Camera,
        transfer: TransferFunction,
        light: Light,
    }

    impl Fixture {
        fn new() -> Self {
            let mut camera = Camera::new(ProjectionParams::default());
            camera.set_viewport(0, 0, 800, 600);
            Self {
                camera,
                transfer: TransferFunction::default(),
                light: Light::default(),
            }
        }

        fn scene<'a>(
            &'a self,
            program: Option<&'a ShaderProgram<usize>>,
            volume: Option<&'a Volume<u32>>,
        ) -> Scene<'a, usize, u32> {
            Scene {
                camera: &self.camera,
                program,
                volume,
                transfer: &self.transfer,
                light: &self.light,
                background: ClearColor::WHITE,
            }
        }
    }

    fn cube_volume() -> Volume<u32> {
        Volume {
            texture: 7,
            bounds: Bounds::new(Vec3::splat(-1.0), Vec3::splat(1.0)),
        }
    }

    fn mat(value: Option<UniformValue>) -> Mat4 {
        match value {
            Some(UniformValue::Mat4(cols)) => Mat4::from_cols_array(&cols),
            other => panic!("expected mat4, got {other:?}"),
        }
    }

    // ── uninitialized ──

    #[test]
    fn no_program_only_clears() {
        let f = Fixture::new();
        let mut backend = RecordingBackend::default();
        let outcome = RenderLoop::new().render_frame(&mut backend, &f.scene(None, None));

        assert_eq!(outcome, FrameOutcome::Cleared);
        assert_eq!(backend.commands, vec![Command::Clear(ClearColor::WHITE)]);
    }

    // ── no volume ──

    #[test]
    fn no_volume_never_blends_or_binds_textures() {
        let f = Fixture::new();
        let program = fixture_program(&mut RecordingLinker::default());
        let mut backend = RecordingBackend::default();
        let outcome =
            RenderLoop::new().render_frame(&mut backend, &f.scene(Some(&program), None));

        assert_eq!(outcome, FrameOutcome::Drawn { with_volume: false });
        assert_eq!(backend.count(|c| *c == Command::EnableAlphaBlend), 0);
        assert_eq!(
            backend.count(|c| matches!(c, Command::BindTexture3d { .. } | Command::SetSampler(..))),
            0
        );
        assert_eq!(backend.count(|c| *c == Command::DrawCube), 1);
        assert_eq!(backend.commands.last(), Some(&Command::DisableBlend));
    }

    #[test]
    fn all_uniforms_are_uploaded_before_the_draw() {
        let f = Fixture::new();
        let program = fixture_program(&mut RecordingLinker::default());
        let mut backend = RecordingBackend::default();
        RenderLoop::new().render_frame(&mut backend, &f.scene(Some(&program), None));

        let draw = backend.position(|c| *c == Command::DrawCube).unwrap();
        let uploads: Vec<usize> = backend
            .commands
            .iter()
            .enumerate()
            .filter(|(_, c)| matches!(c, Command::SetUniform(..)))
            .map(|(i, _)| i)
            .collect();
        assert_eq!(uploads.len(), UNIFORM_NAMES.len());
        assert!(uploads.iter().all(|&i| i < draw));
        assert_eq!(backend.commands[0], Command::Clear(ClearColor::WHITE));
        assert_eq!(backend.commands[1], Command::UseProgram(1));
    }

    #[test]
    fn threshold_reaches_uniform_exactly() {
        let mut f = Fixture::new();
        let _ = f.transfer.set_threshold(Channel::Red, Bound::Min, 0.2);
        let program = fixture_program(&mut RecordingLinker::default());
        let mut backend = RecordingBackend::default();
        RenderLoop::new().render_frame(&mut backend, &f.scene(Some(&program), None));

        assert_eq!(backend.uploaded("red_min"), Some(UniformValue::F32(0.2)));
        assert_eq!(
            backend.uploaded(LIGHT_UNIFORM),
            Some(UniformValue::Vec3([1.0, 2.0, -2.0]))
        );
    }

    // ── with volume ──

    #[test]
    fn volume_frame_blends_binds_unit_zero_and_draws_once() {
        let mut f = Fixture::new();
        let volume = cube_volume();
        f.camera.update_model(volume.bounds.min, volume.bounds.max);
        f.camera.zoom(2.0);
        f.camera.rotate(1.0);
        let program = fixture_program(&mut RecordingLinker::default());
        let mut backend = RecordingBackend::default();
        let outcome = RenderLoop::new()
            .render_frame(&mut backend, &f.scene(Some(&program), Some(&volume)));

        assert_eq!(outcome, FrameOutcome::Drawn { with_volume: true });
        assert_eq!(backend.count(|c| *c == Command::DrawCube), 1);
        assert_eq!(backend.count(|c| *c == Command::EnableAlphaBlend), 1);
        let enable = backend.position(|c| *c == Command::EnableAlphaBlend).unwrap();
        let draw = backend.position(|c| *c == Command::DrawCube).unwrap();
        let disable = backend.position(|c| *c == Command::DisableBlend).unwrap();
        assert!(enable < draw && draw < disable);

        assert!(backend.commands.contains(&Command::BindTexture3d { unit: 0, texture: 7 }));
        let sampler = *program.sampler_location(VOLUME_SAMPLER).unwrap();
        assert!(backend.commands.contains(&Command::SetSampler(sampler, 0)));

        assert_eq!(mat(backend.uploaded(PROJECTION_UNIFORM)), f.camera.projection());
        assert_eq!(mat(backend.uploaded(VIEW_UNIFORM)), f.camera.view());
        assert_eq!(mat(backend.uploaded(MODEL_UNIFORM)), f.camera.model());
    }

    // ── missing names ──

    #[test]
    fn program_without_uniforms_still_draws() {
        use crate::shader::{ShaderStage, bind_attributes, compile_stage, link};
        use std::path::Path;

        let v = compile_stage(
            ShaderStage::Vertex,
            Path::new("v.wgsl"),
            "@vertex fn vs_main(@location(0) vertex: vec3<f32>) -> @builtin(position) vec4<f32> {
                return vec4<f32>(vertex, 1.0);
            }",
        )
        .unwrap();
        let fs = compile_stage(
            ShaderStage::Fragment,
            Path::new("f.wgsl"),
            "@fragment fn fs_main() -> @location(0) vec4<f32> { return vec4<f32>(1.0); }",
        )
        .unwrap();
        let slots = bind_attributes(&v).unwrap();
        let program = link(&mut RecordingLinker::default(), v, fs, slots).unwrap();

        let f = Fixture::new();
        let volume = cube_volume();
        let mut backend = RecordingBackend::default();
        let mut render = RenderLoop::new();
        render.render_frame(&mut backend, &f.scene(Some(&program), Some(&volume)));
        render.render_frame(&mut backend, &f.scene(Some(&program), Some(&volume)));

        assert_eq!(backend.count(|c| matches!(c, Command::SetUniform(..))), 0);
        assert_eq!(backend.count(|c| *c == Command::DrawCube), 2);
        assert_eq!(render.reported.len(), UNIFORM_NAMES.len() + 1);
    }
}
