//! Shader program lifecycle: load → compile → bind attributes → link, plus
//! replace-in-place reload.
//!
//! Programs are written in WGSL, one file per stage. Compilation is done with
//! naga so diagnostics are available as text; linking cross-checks the two
//! stages and then hands them to a [`ProgramLinker`] that builds the GPU object.

mod compile;
mod error;
mod manager;
mod program;
mod reflect;
mod source;

pub use compile::{CompiledStage, compile_stage};
pub use error::{ShaderError, ShaderStage};
pub use manager::ShaderManager;
pub use program::{
    AttributeSlots, LinkedStages, NORMAL_ATTRIBUTE, NORMAL_SLOT, ProgramLayout, ProgramLinker,
    ShaderProgram, VERTEX_ATTRIBUTE, VERTEX_SLOT, bind_attributes, link,
};
pub use reflect::{
    BindingSlot, SamplerLocation, UniformBlock, UniformKind, UniformLocation, UniformValue,
};
pub use source::{FRAGMENT_FILE, ShaderPaths, ShaderSources, VERTEX_FILE};
