use std::path::{Path, PathBuf};

use super::{ShaderError, ShaderStage};

/// One validated stage.
#[derive(Debug, Clone)]
pub struct CompiledStage {
    pub stage: ShaderStage,
    pub path: PathBuf,
    pub source: String,
    pub module: naga::Module,
}

impl CompiledStage {
    pub(crate) fn entry_point(&self) -> Option<&naga::EntryPoint> {
        let name = self.stage.entry_point();
        self.module
            .entry_points
            .iter()
            .find(|ep| ep.name == name && ep.stage == self.stage.naga())
    }
}

/// Parses and validates a single stage.
///
/// The diagnostic text in [`ShaderError::Compile`] is naga's rendered report,
/// including the offending source line.
pub fn compile_stage(
    stage: ShaderStage,
    path: &Path,
    source: &str,
) -> Result<CompiledStage, ShaderError> {
    let compile_error = |log: String| ShaderError::Compile {
        stage,
        path: path.to_path_buf(),
        log,
    };

    let module = naga::front::wgsl::parse_str(source)
        .map_err(|e| compile_error(e.emit_to_string(source)))?;

    naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::empty(),
    )
    .validate(&module)
    .map_err(|e| compile_error(e.emit_to_string(source)))?;

    let compiled = CompiledStage {
        stage,
        path: path.to_path_buf(),
        source: source.to_string(),
        module,
    };

    if compiled.entry_point().is_none() {
        return Err(compile_error(format!(
            "missing @{stage} entry point `{}`",
            stage.entry_point()
        )));
    }

    Ok(compiled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FRAGMENT_WGSL, VERTEX_WGSL};

    #[test]
    fn valid_stages_compile() {
        assert!(compile_stage(ShaderStage::Vertex, Path::new("v.wgsl"), VERTEX_WGSL).is_ok());
        assert!(compile_stage(ShaderStage::Fragment, Path::new("f.wgsl"), FRAGMENT_WGSL).is_ok());
    }

    #[test]
    fn syntax_error_carries_diagnostic() {
        let err = compile_stage(ShaderStage::Fragment, Path::new("f.wgsl"), "fn fs_main( {")
            .unwrap_err();
        match err {
            ShaderError::Compile { stage, log, .. } => {
                assert_eq!(stage, ShaderStage::Fragment);
                assert!(!log.is_empty());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn type_error_is_compile_error() {
        let src = "@fragment fn fs_main() -> @location(0) vec4<f32> { return 1.0; }";
        let err = compile_stage(ShaderStage::Fragment, Path::new("f.wgsl"), src).unwrap_err();
        assert!(matches!(err, ShaderError::Compile { .. }));
    }

    #[test]
    fn wrong_entry_point_is_rejected() {
        // A valid fragment shader handed in as the vertex stage.
        let err = compile_stage(ShaderStage::Vertex, Path::new("v.wgsl"), FRAGMENT_WGSL)
            .unwrap_err();
        match err {
            ShaderError::Compile { log, .. } => assert!(log.contains("vs_main")),
            other => panic!("unexpected error: {other}"),
        }
    }
}
