//! Name-based reflection over naga modules.
//!
//! WGSL has no `glGetUniformLocation`; the equivalent here is walking the
//! module's `var<uniform>` blocks and resource globals and recording where each
//! named value lives.

use super::compile::CompiledStage;

/// `@group(g) @binding(b)` pair.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct BindingSlot {
    pub group: u32,
    pub binding: u32,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum UniformKind {
    F32,
    I32,
    Vec3,
    Vec4,
    Mat4,
}

impl UniformKind {
    pub fn size(self) -> u32 {
        match self {
            UniformKind::F32 | UniformKind::I32 => 4,
            UniformKind::Vec3 => 12,
            UniformKind::Vec4 => 16,
            UniformKind::Mat4 => 64,
        }
    }

    fn classify(inner: &naga::TypeInner) -> Option<Self> {
        use naga::{Scalar, TypeInner, VectorSize};

        match *inner {
            TypeInner::Scalar(s) if s == Scalar::F32 => Some(UniformKind::F32),
            TypeInner::Scalar(s) if s == Scalar::I32 => Some(UniformKind::I32),
            TypeInner::Vector {
                size: VectorSize::Tri,
                scalar,
            } if scalar == Scalar::F32 => Some(UniformKind::Vec3),
            TypeInner::Vector {
                size: VectorSize::Quad,
                scalar,
            } if scalar == Scalar::F32 => Some(UniformKind::Vec4),
            TypeInner::Matrix {
                columns: VectorSize::Quad,
                rows: VectorSize::Quad,
                scalar,
            } if scalar == Scalar::F32 => Some(UniformKind::Mat4),
            _ => None,
        }
    }
}

/// Where a named uniform lives: which block, at which byte offset.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct UniformLocation {
    pub block: BindingSlot,
    pub offset: u32,
    pub kind: UniformKind,
}

/// A uniform buffer binding and its byte size.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct UniformBlock {
    pub slot: BindingSlot,
    pub size: u32,
}

/// A sampled 3D texture and the sampler that reads it.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct SamplerLocation {
    pub texture: BindingSlot,
    pub sampler: Option<BindingSlot>,
}

/// Value uploaded to a [`UniformLocation`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum UniformValue {
    F32(f32),
    I32(i32),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    /// Column-major.
    Mat4([f32; 16]),
}

impl UniformValue {
    pub fn kind(&self) -> UniformKind {
        match self {
            UniformValue::F32(_) => UniformKind::F32,
            UniformValue::I32(_) => UniformKind::I32,
            UniformValue::Vec3(_) => UniformKind::Vec3,
            UniformValue::Vec4(_) => UniformKind::Vec4,
            UniformValue::Mat4(_) => UniformKind::Mat4,
        }
    }

    /// Writes the value at `offset` inside `block`. Out-of-range writes are dropped.
    pub fn write_into(&self, block: &mut [u8], offset: u32) -> bool {
        let bytes: &[u8] = match self {
            UniformValue::F32(v) => bytemuck::bytes_of(v),
            UniformValue::I32(v) => bytemuck::bytes_of(v),
            UniformValue::Vec3(v) => bytemuck::cast_slice(v),
            UniformValue::Vec4(v) => bytemuck::cast_slice(v),
            UniformValue::Mat4(v) => bytemuck::cast_slice(v),
        };
        let start = offset as usize;
        let Some(dst) = block.get_mut(start..start + bytes.len()) else {
            return false;
        };
        dst.copy_from_slice(bytes);
        true
    }
}

impl From<glam::Mat4> for UniformValue {
    fn from(m: glam::Mat4) -> Self {
        UniformValue::Mat4(m.to_cols_array())
    }
}

impl From<glam::Vec3> for UniformValue {
    fn from(v: glam::Vec3) -> Self {
        UniformValue::Vec3(v.to_array())
    }
}

impl From<f32> for UniformValue {
    fn from(v: f32) -> Self {
        UniformValue::F32(v)
    }
}

pub(crate) struct StageReflection {
    pub uniforms: Vec<(String, UniformLocation)>,
    pub blocks: Vec<UniformBlock>,
    pub textures: Vec<(String, SamplerLocation)>,
}

fn slot(binding: &naga::ResourceBinding) -> BindingSlot {
    BindingSlot {
        group: binding.group,
        binding: binding.binding,
    }
}

pub(crate) fn reflect_resources(stage: &CompiledStage) -> StageReflection {
    let module = &stage.module;
    let mut out = StageReflection {
        uniforms: Vec::new(),
        blocks: Vec::new(),
        textures: Vec::new(),
    };
    let mut samplers: Vec<(Option<String>, BindingSlot)> = Vec::new();

    for (_, var) in module.global_variables.iter() {
        let Some(binding) = var.binding.as_ref() else {
            continue;
        };
        let block = slot(binding);
        let inner = &module.types[var.ty].inner;

        match var.space {
            naga::AddressSpace::Uniform => match inner {
                naga::TypeInner::Struct { members, span } => {
                    out.blocks.push(UniformBlock { slot: block, size: *span });
                    for m in members {
                        let (Some(name), Some(kind)) =
                            (m.name.as_ref(), UniformKind::classify(&module.types[m.ty].inner))
                        else {
                            continue;
                        };
                        out.uniforms.push((
                            name.clone(),
                            UniformLocation {
                                block,
                                offset: m.offset,
                                kind,
                            },
                        ));
                    }
                }
                other => {
                    let Some(kind) = UniformKind::classify(other) else {
                        continue;
                    };
                    // Uniform buffer bindings are sized in 16-byte multiples.
                    let size = kind.size().next_multiple_of(16);
                    out.blocks.push(UniformBlock { slot: block, size });
                    if let Some(name) = var.name.as_ref() {
                        out.uniforms.push((
                            name.clone(),
                            UniformLocation {
                                block,
                                offset: 0,
                                kind,
                            },
                        ));
                    }
                }
            },
            naga::AddressSpace::Handle => match inner {
                naga::TypeInner::Image {
                    dim: naga::ImageDimension::D3,
                    arrayed: false,
                    ..
                } => {
                    if let Some(name) = var.name.as_ref() {
                        out.textures.push((
                            name.clone(),
                            SamplerLocation {
                                texture: block,
                                sampler: None,
                            },
                        ));
                    }
                }
                naga::TypeInner::Sampler { comparison: false } => {
                    samplers.push((var.name.clone(), block));
                }
                _ => {}
            },
            _ => {}
        }
    }

    // Pair each texture with `<name>_sampler`, or else any sampler in its group.
    for (name, loc) in &mut out.textures {
        let wanted = format!("{name}_sampler");
        loc.sampler = samplers
            .iter()
            .find(|(n, _)| n.as_deref() == Some(wanted.as_str()))
            .or_else(|| samplers.iter().find(|(_, s)| s.group == loc.texture.group))
            .map(|(_, s)| *s);
    }

    out
}

/// `(name, location)` of every `@location` input of the stage entry point.
pub(crate) fn entry_inputs(stage: &CompiledStage) -> Vec<(String, u32)> {
    let module = &stage.module;
    let Some(ep) = stage.entry_point() else {
        return Vec::new();
    };

    let mut out = Vec::new();
    for arg in &ep.function.arguments {
        match &arg.binding {
            Some(naga::Binding::Location { location, .. }) => {
                out.push((arg.name.clone().unwrap_or_default(), *location));
            }
            Some(naga::Binding::BuiltIn(_)) => {}
            None => collect_struct_locations(module, arg.ty, &mut out),
        }
    }
    out
}

/// Locations written by the stage entry point's result.
pub(crate) fn entry_outputs(stage: &CompiledStage) -> Vec<(String, u32)> {
    let module = &stage.module;
    let Some(result) = stage.entry_point().and_then(|ep| ep.function.result.as_ref()) else {
        return Vec::new();
    };

    let mut out = Vec::new();
    match &result.binding {
        Some(naga::Binding::Location { location, .. }) => out.push((String::new(), *location)),
        Some(naga::Binding::BuiltIn(_)) => {}
        None => collect_struct_locations(module, result.ty, &mut out),
    }
    out
}

fn collect_struct_locations(
    module: &naga::Module,
    ty: naga::Handle<naga::Type>,
    out: &mut Vec<(String, u32)>,
) {
    if let naga::TypeInner::Struct { members, .. } = &module.types[ty].inner {
        for m in members {
            if let Some(naga::Binding::Location { location, .. }) = &m.binding {
                out.push((m.name.clone().unwrap_or_default(), *location));
            }
        }
    }
}
