use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    /// Entry point each stage file must export.
    pub fn entry_point(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vs_main",
            ShaderStage::Fragment => "fs_main",
        }
    }

    pub(crate) fn naga(self) -> naga::ShaderStage {
        match self {
            ShaderStage::Vertex => naga::ShaderStage::Vertex,
            ShaderStage::Fragment => naga::ShaderStage::Fragment,
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

/// Failure while building a shader program.
///
/// None of these terminate anything: the owner of the [`ShaderManager`](super::ShaderManager)
/// decides whether to keep the previous program or give up.
#[derive(Debug, thiserror::Error)]
pub enum ShaderError {
    #[error("cannot read {stage} shader {}: {source}", path.display())]
    Io {
        stage: ShaderStage,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{stage} shader {} failed to compile:\n{log}", path.display())]
    Compile {
        stage: ShaderStage,
        path: PathBuf,
        log: String,
    },

    #[error("shader program failed to link: {log}")]
    Link { log: String },
}

impl ShaderError {
    pub(crate) fn link(log: impl Into<String>) -> Self {
        ShaderError::Link { log: log.into() }
    }
}
