use std::path::{Path, PathBuf};

use super::{ShaderError, ShaderStage};

pub const VERTEX_FILE: &str = "raycast.vert.wgsl";
pub const FRAGMENT_FILE: &str = "raycast.frag.wgsl";

/// Locations of the two stage files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderPaths {
    pub vertex: PathBuf,
    pub fragment: PathBuf,
}

impl ShaderPaths {
    /// The raycasting shader pair inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            vertex: dir.join(VERTEX_FILE),
            fragment: dir.join(FRAGMENT_FILE),
        }
    }

    pub fn path(&self, stage: ShaderStage) -> &Path {
        match stage {
            ShaderStage::Vertex => &self.vertex,
            ShaderStage::Fragment => &self.fragment,
        }
    }
}

impl Default for ShaderPaths {
    fn default() -> Self {
        Self::in_dir("shaders")
    }
}

/// Source text of both stages, read in one go.
#[derive(Debug, Clone)]
pub struct ShaderSources {
    pub vertex: String,
    pub fragment: String,
}

impl ShaderSources {
    /// Reads both files. Either one being unreadable is a [`ShaderError::Io`].
    pub fn load(paths: &ShaderPaths) -> Result<Self, ShaderError> {
        Ok(Self {
            vertex: read_stage(paths, ShaderStage::Vertex)?,
            fragment: read_stage(paths, ShaderStage::Fragment)?,
        })
    }

    pub fn get(&self, stage: ShaderStage) -> &str {
        match stage {
            ShaderStage::Vertex => &self.vertex,
            ShaderStage::Fragment => &self.fragment,
        }
    }
}

fn read_stage(paths: &ShaderPaths, stage: ShaderStage) -> Result<String, ShaderError> {
    let path = paths.path(stage);
    std::fs::read_to_string(path).map_err(|source| ShaderError::Io {
        stage,
        path: path.to_path_buf(),
        source,
    })
}
