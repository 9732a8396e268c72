//! Shared fixtures for the loader integration tests

#![allow(dead_code)]

use cjs_loader::{
    FileSystem, ModuleArgs, ModuleSystem, ModuleSystemBuilder, NativeEngine, OsFileSystem, Require,
    Result, Value,
};
use std::fs;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A temp directory with a module system rooted in it
pub struct Fixture {
    _dir: tempfile::TempDir,
    pub root: String,
    pub engine: Arc<NativeEngine>,
    pub system: ModuleSystem,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with(|builder| builder)
    }

    pub fn with(configure: impl FnOnce(ModuleSystemBuilder) -> ModuleSystemBuilder) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = OsFileSystem.real_path(dir.path().to_str().unwrap()).unwrap();
        let engine = Arc::new(NativeEngine::new());
        let system = configure(ModuleSystem::builder())
            .cwd(root.clone())
            .engine(engine.clone())
            .build()
            .unwrap();
        Self {
            _dir: dir,
            root,
            engine,
            system,
        }
    }

    pub fn path(&self, rel: &str) -> String {
        format!("{}/{}", self.root, rel)
    }

    pub fn write(&self, rel: &str, content: &str) -> String {
        let file = self.path(rel);
        fs::create_dir_all(std::path::Path::new(&file).parent().unwrap()).unwrap();
        fs::write(&file, content).unwrap();
        file
    }

    /// Create `rel` on disk and run `body` whenever it is compiled
    pub fn module<F>(&self, rel: &str, body: F) -> String
    where
        F: Fn(ModuleArgs<'_>) -> Result<Value> + Send + Sync + 'static,
    {
        let file = self.write(rel, &format!("// {}\n", rel));
        self.engine.register_file(file.clone(), body);
        file
    }

    /// A require rooted at the fixture directory
    pub fn require(&self) -> Require {
        self.system.create_require(&format!("{}/", self.root)).unwrap()
    }
}

pub fn counter() -> Arc<AtomicUsize> {
    Arc::new(AtomicUsize::new(0))
}

pub fn bump(counter: &AtomicUsize) -> usize {
    counter.fetch_add(1, Ordering::SeqCst) + 1
}

pub fn count(counter: &AtomicUsize) -> usize {
    counter.load(Ordering::SeqCst)
}

pub fn set(target: &Value, key: &str, value: impl Into<Value>) {
    target.as_object().unwrap().set(key, value);
}
