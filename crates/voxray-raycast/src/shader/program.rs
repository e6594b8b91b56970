use std::collections::HashMap;
use std::sync::Arc;

use super::compile::CompiledStage;
use super::reflect::{self, SamplerLocation, UniformBlock, UniformLocation};
use super::{ShaderError, ShaderStage};

/// Vertex stage input carrying the cube position.
pub const VERTEX_ATTRIBUTE: &str = "vertex";
pub const VERTEX_SLOT: u32 = 0;
/// Vertex stage input carrying the face normal.
pub const NORMAL_ATTRIBUTE: &str = "normal";
pub const NORMAL_SLOT: u32 = 1;

/// Which of the two fixed attribute slots the vertex stage actually reads.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct AttributeSlots {
    pub vertex: Option<u32>,
    pub normal: Option<u32>,
}

/// Checks that the vertex stage reads its attributes from the fixed slots.
///
/// WGSL pins locations in the source, so "binding" is a verification: an input
/// named `vertex` must sit at slot 0, `normal` at slot 1, and nothing else may
/// be read because the cube mesh only supplies those two streams.
pub fn bind_attributes(vertex: &CompiledStage) -> Result<AttributeSlots, ShaderError> {
    if vertex.stage != ShaderStage::Vertex {
        return Err(ShaderError::link(format!(
            "attributes can only be bound on the vertex stage, got {}",
            vertex.stage
        )));
    }

    let mut slots = AttributeSlots::default();
    for (name, location) in reflect::entry_inputs(vertex) {
        let (expected, slot) = match name.as_str() {
            VERTEX_ATTRIBUTE => (VERTEX_SLOT, &mut slots.vertex),
            NORMAL_ATTRIBUTE => (NORMAL_SLOT, &mut slots.normal),
            _ => {
                return Err(ShaderError::link(format!(
                    "vertex input `{name}` at location {location} has no attribute stream; \
                     only `{VERTEX_ATTRIBUTE}` and `{NORMAL_ATTRIBUTE}` are supplied"
                )));
            }
        };
        if location != expected {
            return Err(ShaderError::link(format!(
                "vertex input `{name}` must be at location {expected}, found {location}"
            )));
        }
        *slot = Some(location);
    }

    Ok(slots)
}

/// Name-indexed view of a linked program's resources.
#[derive(Debug, Clone, Default)]
pub struct ProgramLayout {
    uniforms: HashMap<String, UniformLocation>,
    blocks: Vec<UniformBlock>,
    textures: HashMap<String, SamplerLocation>,
    attributes: AttributeSlots,
}

impl ProgramLayout {
    /// Location of a named uniform, or `None` when the program does not use it.
    pub fn uniform_location(&self, name: &str) -> Option<&UniformLocation> {
        self.uniforms.get(name)
    }

    pub fn sampler_location(&self, name: &str) -> Option<&SamplerLocation> {
        self.textures.get(name)
    }

    /// Uniform buffers, sorted by binding slot.
    pub fn blocks(&self) -> &[UniformBlock] {
        &self.blocks
    }

    pub fn textures(&self) -> impl Iterator<Item = (&str, &SamplerLocation)> {
        self.textures.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn attributes(&self) -> AttributeSlots {
        self.attributes
    }
}

/// Both stages after a successful cross-stage check.
#[derive(Debug, Clone)]
pub struct LinkedStages {
    pub vertex: CompiledStage,
    pub fragment: CompiledStage,
    pub layout: Arc<ProgramLayout>,
}

/// Builds the backend program object from checked stages.
pub trait ProgramLinker {
    type Program;

    fn link(&mut self, stages: &LinkedStages) -> Result<Self::Program, ShaderError>;
}

/// Cross-checks the two stages, merges their resource layout and asks the
/// backend to build the program.
pub fn link<L: ProgramLinker>(
    linker: &mut L,
    vertex: CompiledStage,
    fragment: CompiledStage,
    attributes: AttributeSlots,
) -> Result<ShaderProgram<L::Program>, ShaderError> {
    let outputs = reflect::entry_outputs(&vertex);
    for (name, location) in reflect::entry_inputs(&fragment) {
        if !outputs.iter().any(|(_, l)| *l == location) {
            return Err(ShaderError::link(format!(
                "fragment input `{name}` at location {location} is not written by the vertex stage"
            )));
        }
    }

    let mut layout = ProgramLayout {
        attributes,
        ..ProgramLayout::default()
    };
    for stage in [&vertex, &fragment] {
        merge(&mut layout, reflect::reflect_resources(stage))?;
    }
    layout.blocks.sort_by_key(|b| b.slot);

    let stages = LinkedStages {
        vertex,
        fragment,
        layout: Arc::new(layout),
    };
    let handle = linker.link(&stages)?;

    Ok(ShaderProgram {
        layout: stages.layout,
        handle,
    })
}

fn merge(layout: &mut ProgramLayout, stage: reflect::StageReflection) -> Result<(), ShaderError> {
    for block in stage.blocks {
        match layout.blocks.iter().find(|b| b.slot == block.slot) {
            Some(existing) if existing.size != block.size => {
                return Err(ShaderError::link(format!(
                    "uniform block at group {} binding {} is {} bytes in one stage and {} in the other",
                    block.slot.group, block.slot.binding, existing.size, block.size
                )));
            }
            Some(_) => {}
            None => layout.blocks.push(block),
        }
    }

    for (name, loc) in stage.uniforms {
        match layout.uniforms.get(&name) {
            Some(existing) if *existing != loc => {
                return Err(ShaderError::link(format!(
                    "uniform `{name}` is declared differently in the two stages"
                )));
            }
            Some(_) => {}
            None => {
                layout.uniforms.insert(name, loc);
            }
        }
    }

    for (name, loc) in stage.textures {
        match layout.textures.get(&name) {
            Some(existing) if *existing != loc => {
                return Err(ShaderError::link(format!(
                    "texture `{name}` is bound differently in the two stages"
                )));
            }
            Some(_) => {}
            None => {
                layout.textures.insert(name, loc);
            }
        }
    }

    Ok(())
}

/// A linked program plus the layout used to look up its uniforms.
#[derive(Debug, Clone)]
pub struct ShaderProgram<P> {
    layout: Arc<ProgramLayout>,
    handle: P,
}

impl<P> ShaderProgram<P> {
    pub fn layout(&self) -> &ProgramLayout {
        &self.layout
    }

    pub fn handle(&self) -> &P {
        &self.handle
    }

    pub fn uniform_location(&self, name: &str) -> Option<&UniformLocation> {
        self.layout.uniform_location(name)
    }

    pub fn sampler_location(&self, name: &str) -> Option<&SamplerLocation> {
        self.layout.sampler_location(name)
    }
}
