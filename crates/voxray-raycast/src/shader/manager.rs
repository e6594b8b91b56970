use super::program::{ShaderProgram, bind_attributes, link};
use super::{ProgramLinker, ShaderError, ShaderPaths, ShaderSources, ShaderStage, compile_stage};

/// Owns the active program and rebuilds it from disk on request.
///
/// A rebuild either fully succeeds and replaces the active program, or fails
/// and leaves it untouched. There is never a moment where the manager holds a
/// partially built program.
#[derive(Debug)]
pub struct ShaderManager<P> {
    paths: ShaderPaths,
    active: Option<ShaderProgram<P>>,
    generation: u64,
}

impl<P> ShaderManager<P> {
    pub fn new(paths: ShaderPaths) -> Self {
        Self {
            paths,
            active: None,
            generation: 0,
        }
    }

    pub fn paths(&self) -> &ShaderPaths {
        &self.paths
    }

    pub fn active(&self) -> Option<&ShaderProgram<P>> {
        self.active.as_ref()
    }

    pub fn is_initialized(&self) -> bool {
        self.active.is_some()
    }

    /// Number of successful builds so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Reads, compiles and links both stages, then swaps the result in.
    ///
    /// Used for the first build too; on failure with no previous program the
    /// manager stays uninitialized.
    pub fn reload<L>(&mut self, linker: &mut L) -> Result<(), ShaderError>
    where
        L: ProgramLinker<Program = P>,
    {
        let program = Self::build(&self.paths, linker)?;
        self.active = Some(program);
        self.generation += 1;
        log::info!(
            "shader program #{} built from {} and {}",
            self.generation,
            self.paths.vertex.display(),
            self.paths.fragment.display()
        );
        Ok(())
    }

    fn build<L>(paths: &ShaderPaths, linker: &mut L) -> Result<ShaderProgram<P>, ShaderError>
    where
        L: ProgramLinker<Program = P>,
    {
        let sources = ShaderSources::load(paths)?;

        let vertex = compile_stage(
            ShaderStage::Vertex,
            paths.path(ShaderStage::Vertex),
            sources.get(ShaderStage::Vertex),
        )?;
        let fragment = compile_stage(
            ShaderStage::Fragment,
            paths.path(ShaderStage::Fragment),
            sources.get(ShaderStage::Fragment),
        )?;

        let attributes = bind_attributes(&vertex)?;
        link(linker, vertex, fragment, attributes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shader::{VERTEX_SLOT, source};
    use crate::testing::{FRAGMENT_WGSL, RecordingLinker, TempDir, VERTEX_WGSL};

    fn shader_dir(name: &str) -> TempDir {
        let dir = TempDir::new(name);
        dir.write(source::VERTEX_FILE, VERTEX_WGSL);
        dir.write(source::FRAGMENT_FILE, FRAGMENT_WGSL);
        dir
    }

    #[test]
    fn first_build_initializes() {
        let dir = shader_dir("manager-first");
        let mut linker = RecordingLinker::default();
        let mut manager = ShaderManager::new(ShaderPaths::in_dir(dir.path()));
        assert!(!manager.is_initialized());

        manager.reload(&mut linker).unwrap();
        assert!(manager.is_initialized());
        assert_eq!(manager.generation(), 1);
        let program = manager.active().unwrap();
        assert_eq!(program.layout().attributes().vertex, Some(VERTEX_SLOT));
        assert_eq!(*program.handle(), 1);
    }

    #[test]
    fn missing_file_leaves_manager_uninitialized() {
        let dir = TempDir::new("manager-missing");
        dir.write(source::VERTEX_FILE, VERTEX_WGSL);
        let mut linker = RecordingLinker::default();
        let mut manager = ShaderManager::new(ShaderPaths::in_dir(dir.path()));

        let err = manager.reload(&mut linker).unwrap_err();
        assert!(matches!(err, ShaderError::Io { stage: ShaderStage::Fragment, .. }));
        assert!(!manager.is_initialized());
        assert_eq!(linker.linked, 0);
    }

    #[test]
    fn broken_reload_keeps_previous_program() {
        let dir = shader_dir("manager-broken");
        let mut linker = RecordingLinker::default();
        let mut manager = ShaderManager::new(ShaderPaths::in_dir(dir.path()));
        manager.reload(&mut linker).unwrap();

        dir.write(source::FRAGMENT_FILE, "@fragment fn fs_main( {");
        let err = manager.reload(&mut linker).unwrap_err();
        assert!(matches!(err, ShaderError::Compile { stage: ShaderStage::Fragment, .. }));
        assert_eq!(*manager.active().unwrap().handle(), 1);
        assert_eq!(manager.generation(), 1);
    }

    #[test]
    fn failed_backend_link_keeps_previous_program() {
        let dir = shader_dir("manager-link");
        let mut linker = RecordingLinker::default();
        let mut manager = ShaderManager::new(ShaderPaths::in_dir(dir.path()));
        manager.reload(&mut linker).unwrap();

        linker.fail_with = Some("out of memory".into());
        assert!(manager.reload(&mut linker).is_err());
        assert_eq!(*manager.active().unwrap().handle(), 1);
    }

    #[test]
    fn successful_reload_replaces_program() {
        let dir = shader_dir("manager-swap");
        let mut linker = RecordingLinker::default();
        let mut manager = ShaderManager::new(ShaderPaths::in_dir(dir.path()));
        manager.reload(&mut linker).unwrap();
        manager.reload(&mut linker).unwrap();

        assert_eq!(*manager.active().unwrap().handle(), 2);
        assert_eq!(manager.generation(), 2);
        let program = manager.active().unwrap();
        for name in crate::frame::UNIFORM_NAMES {
            assert!(program.uniform_location(name).is_some(), "{name}");
        }
        assert!(program.sampler_location(crate::frame::VOLUME_SAMPLER).is_some());
    }
}
