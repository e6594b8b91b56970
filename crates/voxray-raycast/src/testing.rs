//! Test doubles shared by the unit tests of this crate.

use std::path::{Path, PathBuf};

use crate::frame::{ClearColor, FrameBackend};
use crate::shader::{
    LinkedStages, ProgramLayout, ProgramLinker, SamplerLocation, ShaderError, ShaderProgram,
    UniformLocation, UniformValue,
};
use crate::volume::{Bounds, TextureUploader, VolumeData, VolumeLoadError, VolumeLoader};

/// Uniform block shared by both fixture stages.
macro_rules! uniforms_wgsl {
    () => {
        "
struct Uniforms {
    projection: mat4x4<f32>,
    view: mat4x4<f32>,
    model: mat4x4<f32>,
    red_min: f32,
    red_max: f32,
    green_min: f32,
    green_max: f32,
    blue_min: f32,
    blue_max: f32,
    light_pos: vec3<f32>,
};

@group(0) @binding(0) var<uniform> u: Uniforms;
"
    };
}

pub(crate) const VERTEX_WGSL: &str = concat!(
    uniforms_wgsl!(),
    "
struct VertexOut {
    @builtin(position) clip: vec4<f32>,
    @location(0) model_pos: vec3<f32>,
};

@vertex
fn vs_main(@location(0) vertex: vec3<f32>, @location(1) normal: vec3<f32>) -> VertexOut {
    var out: VertexOut;
    out.clip = u.projection * u.view * u.model * vec4<f32>(vertex, 1.0);
    out.model_pos = vertex + normal * 0.0;
    return out;
}
"
);

pub(crate) const FRAGMENT_WGSL: &str = concat!(
    uniforms_wgsl!(),
    "
@group(1) @binding(0) var volume: texture_3d<f32>;
@group(1) @binding(1) var volume_sampler: sampler;

@fragment
fn fs_main(@location(0) model_pos: vec3<f32>) -> @location(0) vec4<f32> {
    let s = textureSample(volume, volume_sampler, model_pos * 0.5 + 0.5).r;
    let r = select(0.0, 1.0, s >= u.red_min && s <= u.red_max);
    let g = select(0.0, 1.0, s >= u.green_min && s <= u.green_max);
    let b = select(0.0, 1.0, s >= u.blue_min && s <= u.blue_max);
    return vec4<f32>(r, g, b, 1.0) + vec4<f32>(u.light_pos, 0.0) * 0.0;
}
"
);

/// A scratch directory under the system temp dir, removed on drop.
pub(crate) struct TempDir {
    path: PathBuf,
}

impl TempDir {
    pub(crate) fn new(name: &str) -> Self {
        let path = std::env::temp_dir().join(format!("voxray-{}-{name}", std::process::id()));
        let _ = std::fs::remove_dir_all(&path);
        std::fs::create_dir_all(&path).unwrap();
        Self { path }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn write(&self, file: &str, contents: impl AsRef<[u8]>) -> PathBuf {
        let path = self.path.join(file);
        std::fs::write(&path, contents).unwrap();
        path
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}

// ── backend ──

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Command {
    Clear(ClearColor),
    UseProgram(usize),
    SetUniform(UniformLocation, UniformValue),
    SetSampler(SamplerLocation, u32),
    EnableAlphaBlend,
    DisableBlend,
    BindTexture3d { unit: u32, texture: u32 },
    DrawCube,
}

/// Frame backend that records every call in order.
#[derive(Default)]
pub(crate) struct RecordingBackend {
    pub commands: Vec<Command>,
    layout: Option<ProgramLayout>,
}

impl RecordingBackend {
    pub(crate) fn count(&self, pred: impl Fn(&Command) -> bool) -> usize {
        self.commands.iter().filter(|c| pred(c)).count()
    }

    /// Last value uploaded under `name` through the bound program's layout.
    pub(crate) fn uploaded(&self, name: &str) -> Option<UniformValue> {
        let loc = *self.layout.as_ref()?.uniform_location(name)?;
        self.commands.iter().rev().find_map(|c| match c {
            Command::SetUniform(l, v) if *l == loc => Some(*v),
            _ => None,
        })
    }

    pub(crate) fn position(&self, pred: impl Fn(&Command) -> bool) -> Option<usize> {
        self.commands.iter().position(pred)
    }
}

impl FrameBackend for RecordingBackend {
    type Program = usize;
    type Texture = u32;

    fn clear(&mut self, color: ClearColor) {
        self.commands.push(Command::Clear(color));
    }

    fn use_program(&mut self, program: &ShaderProgram<usize>) {
        self.layout = Some(program.layout().clone());
        self.commands.push(Command::UseProgram(*program.handle()));
    }

    fn set_uniform(&mut self, location: &UniformLocation, value: UniformValue) {
        self.commands.push(Command::SetUniform(*location, value));
    }

    fn set_sampler(&mut self, location: &SamplerLocation, unit: u32) {
        self.commands.push(Command::SetSampler(*location, unit));
    }

    fn enable_alpha_blend(&mut self) {
        self.commands.push(Command::EnableAlphaBlend);
    }

    fn disable_blend(&mut self) {
        self.commands.push(Command::DisableBlend);
    }

    fn bind_texture_3d(&mut self, unit: u32, texture: &u32) {
        self.commands.push(Command::BindTexture3d {
            unit,
            texture: *texture,
        });
    }

    fn draw_cube(&mut self) {
        self.commands.push(Command::DrawCube);
    }
}

// ── linker ──

/// Hands out sequential program ids, or fails with a canned log.
#[derive(Default)]
pub(crate) struct RecordingLinker {
    pub linked: usize,
    pub fail_with: Option<String>,
}

impl ProgramLinker for RecordingLinker {
    type Program = usize;

    fn link(&mut self, _stages: &LinkedStages) -> Result<usize, ShaderError> {
        if let Some(log) = &self.fail_with {
            return Err(ShaderError::link(log.clone()));
        }
        self.linked += 1;
        Ok(self.linked)
    }
}

/// Builds a linked fixture program without touching the filesystem.
pub(crate) fn fixture_program(linker: &mut RecordingLinker) -> ShaderProgram<usize> {
    use crate::shader::{ShaderStage, bind_attributes, compile_stage, link};

    let vertex = compile_stage(ShaderStage::Vertex, Path::new("v.wgsl"), VERTEX_WGSL).unwrap();
    let fragment =
        compile_stage(ShaderStage::Fragment, Path::new("f.wgsl"), FRAGMENT_WGSL).unwrap();
    let slots = bind_attributes(&vertex).unwrap();
    link(linker, vertex, fragment, slots).unwrap()
}

// ── volumes ──

/// Returns a fixed payload, or an error, for any path.
pub(crate) struct FixedLoader {
    pub bounds: Bounds,
    pub fail: bool,
}

impl VolumeLoader for FixedLoader {
    fn load(&self, dir: &Path) -> Result<VolumeData, VolumeLoadError> {
        if self.fail {
            return Err(VolumeLoadError::Empty {
                dir: dir.to_path_buf(),
            });
        }
        Ok(VolumeData {
            width: 2,
            height: 2,
            depth: 2,
            voxels: vec![0; 8],
            bounds: self.bounds,
        })
    }
}

/// Counts uploads and returns the count as the texture id.
#[derive(Default)]
pub(crate) struct RecordingUploader {
    pub uploaded: u32,
    pub fail: bool,
}

impl TextureUploader for RecordingUploader {
    type Texture = u32;

    fn upload(&mut self, _data: &VolumeData) -> Result<u32, VolumeLoadError> {
        if self.fail {
            return Err(VolumeLoadError::Upload("no device".into()));
        }
        self.uploaded += 1;
        Ok(self.uploaded)
    }
}
