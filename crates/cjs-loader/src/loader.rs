// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module loader - resolves, caches and runs modules

use crate::builtins::{self, BuiltinRegistry};
use crate::cache::ModuleCache;
use crate::config::LoaderConfig;
use crate::engine::{AddonLoader, NativeEngine, ScriptEngine};
use crate::error::{ModuleError, Result};
use crate::extensions::Extensions;
use crate::fs::{FileSystem, OsFileSystem};
use crate::hooks::{CompileHook, HookSlot, RequireHook, ResolveFilenameHook, RunMainHook};
use crate::interop::{ForeignModuleLoader, ModuleFormat};
use crate::module::Module;
use crate::path;
use crate::require::Require;
use crate::resolver::{self, ModuleResolver, ResolveContext, ResolveOptions};
use crate::value::{ObjectRef, Value};
use parking_lot::RwLock;
use std::sync::Arc;

/// Id of the synthetic parent used for preloaded modules
pub const PRELOAD_ID: &str = "internal/preload";

/// Process-wide module state: cache, extension handlers, builtins and
/// the replaceable hooks.
///
/// Cloning is cheap and yields a handle to the same state; separate
/// systems built with [`ModuleSystem::builder`] share nothing.
#[derive(Clone)]
pub struct ModuleSystem {
    inner: Arc<SystemInner>,
}

pub(crate) struct SystemInner {
    config: LoaderConfig,
    fs: Arc<dyn FileSystem>,
    resolver: ModuleResolver,
    cache: ModuleCache,
    extensions: Extensions,
    builtins: BuiltinRegistry,
    engine: Arc<dyn ScriptEngine>,
    addons: Option<Arc<dyn AddonLoader>>,
    foreign: Option<Arc<dyn ForeignModuleLoader>>,
    main: RwLock<Option<Module>>,
    resolve_hook: HookSlot<ResolveFilenameHook>,
    require_hook: HookSlot<RequireHook>,
    compile_hook: HookSlot<CompileHook>,
    run_main_hook: HookSlot<RunMainHook>,
}

/// Builder for [`ModuleSystem`]
#[derive(Default)]
pub struct ModuleSystemBuilder {
    config: LoaderConfig,
    fs: Option<Arc<dyn FileSystem>>,
    engine: Option<Arc<dyn ScriptEngine>>,
    addons: Option<Arc<dyn AddonLoader>>,
    foreign: Option<Arc<dyn ForeignModuleLoader>>,
}

impl ModuleSystemBuilder {
    /// Use `config`
    pub fn config(mut self, config: LoaderConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the working directory
    pub fn cwd(mut self, cwd: impl Into<String>) -> Self {
        self.config.cwd = Some(cwd.into());
        self
    }

    /// Use a custom file system
    pub fn file_system(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = Some(fs);
        self
    }

    /// Use `engine` to run module bodies
    pub fn engine(mut self, engine: Arc<dyn ScriptEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Enable `.node` addons
    pub fn addon_loader(mut self, addons: Arc<dyn AddonLoader>) -> Self {
        self.addons = Some(addons);
        self
    }

    /// Enable requiring ES modules
    pub fn foreign_loader(mut self, foreign: Arc<dyn ForeignModuleLoader>) -> Self {
        self.foreign = Some(foreign);
        self
    }

    /// Build the system
    pub fn build(self) -> Result<ModuleSystem> {
        let cwd = self.config.resolved_cwd()?;
        let fs = self.fs.unwrap_or_else(|| Arc::new(OsFileSystem));
        let global_paths = self.config.global_paths(&cwd);
        tracing::debug!(%cwd, ?global_paths, "creating module system");

        let resolver = ModuleResolver::new(
            Arc::clone(&fs),
            cwd,
            global_paths,
            self.config.preserve_symlinks,
        );

        let resolve_hook: ResolveFilenameHook = Arc::new(ModuleSystem::default_resolve_filename);
        let require_hook: RequireHook = Arc::new(Module::default_require);
        let compile_hook: CompileHook = Arc::new(Module::default_compile);
        let run_main_hook: RunMainHook = Arc::new(ModuleSystem::default_run_main);

        Ok(ModuleSystem {
            inner: Arc::new(SystemInner {
                config: self.config,
                fs,
                resolver,
                cache: ModuleCache::new(),
                extensions: Extensions::with_defaults(),
                builtins: BuiltinRegistry::new(),
                engine: self.engine.unwrap_or_else(|| Arc::new(NativeEngine::new())),
                addons: self.addons,
                foreign: self.foreign,
                main: RwLock::new(None),
                resolve_hook: HookSlot::new("resolve_filename", resolve_hook),
                require_hook: HookSlot::new("require", require_hook),
                compile_hook: HookSlot::new("compile", compile_hook),
                run_main_hook: HookSlot::new("run_main", run_main_hook),
            }),
        })
    }
}

impl ModuleSystem {
    /// Start building a system
    pub fn builder() -> ModuleSystemBuilder {
        ModuleSystemBuilder::default()
    }

    /// A system configured from the environment
    pub fn from_env() -> Result<Self> {
        Self::builder().config(LoaderConfig::from_env()).build()
    }

    pub(crate) fn from_inner(inner: Arc<SystemInner>) -> Self {
        Self { inner }
    }

    /// Working directory
    pub fn cwd(&self) -> &str {
        self.inner.resolver.cwd()
    }

    /// Configuration the system was built with
    pub fn config(&self) -> &LoaderConfig {
        &self.inner.config
    }

    /// `Module._cache`
    pub fn cache(&self) -> ModuleCache {
        self.inner.cache.clone()
    }

    /// `Module._extensions`
    pub fn extensions(&self) -> Extensions {
        self.inner.extensions.clone()
    }

    /// Builtin implementations
    pub fn builtins(&self) -> &BuiltinRegistry {
        &self.inner.builtins
    }

    /// File system collaborator
    pub fn file_system(&self) -> &dyn FileSystem {
        self.inner.fs.as_ref()
    }

    /// Script engine collaborator
    pub fn engine(&self) -> &dyn ScriptEngine {
        self.inner.engine.as_ref()
    }

    /// Native addon collaborator, if any
    pub fn addon_loader(&self) -> Option<&dyn AddonLoader> {
        self.inner.addons.as_deref()
    }

    /// `require.main`
    pub fn main(&self) -> Option<Module> {
        self.inner.main.read().clone()
    }

    /// `module.globalPaths`
    pub fn global_paths(&self) -> Vec<String> {
        self.inner.resolver.global_paths().to_vec()
    }

    /// `Module._nodeModulePaths(from)`
    pub fn node_module_paths(&self, from: Option<&str>) -> Result<Vec<String>> {
        self.inner.resolver.node_module_paths(from)
    }

    /// `Module._resolveLookupPaths(request, parent)`
    pub fn resolve_lookup_paths(&self, request: &str, parent: Option<&ResolveContext>) -> Vec<String> {
        self.inner.resolver.resolve_lookup_paths(request, parent)
    }

    /// `Module._resolveFilename`, through the current resolve hook
    pub fn resolve_filename(
        &self,
        request: &str,
        parent: Option<&Module>,
        is_main: bool,
        options: &ResolveOptions,
    ) -> Result<String> {
        let hook = self.resolve_filename_hook();
        hook(self, request, parent, is_main, options).map_err(|err| match parent {
            Some(parent) => err.with_require_stack(parent.require_stack()),
            None => err,
        })
    }

    /// The built-in resolution algorithm
    pub fn default_resolve_filename(
        system: &ModuleSystem,
        request: &str,
        parent: Option<&Module>,
        is_main: bool,
        options: &ResolveOptions,
    ) -> Result<String> {
        let ctx = parent.map(Module::context);
        let extensions = system.inner.extensions.keys();
        system
            .inner
            .resolver
            .resolve_filename(request, ctx.as_ref(), is_main, options, &extensions)
    }

    /// `Module._load(request, parent, isMain)`.
    ///
    /// The new module is cached before its body runs, so a circular
    /// require sees the partially filled exports. A failed load is rolled
    /// back so the next require starts over.
    pub fn load(&self, request: &str, parent: Option<&Module>, is_main: bool) -> Result<Value> {
        let filename = self.resolve_filename(request, parent, is_main, &ResolveOptions::default())?;

        if builtins::is_builtin(&filename) {
            if let Some(cached) = self.inner.cache.get(&filename) {
                return Ok(cached.exports());
            }
            return Ok(self.inner.builtins.exports(&filename));
        }

        if let Some(cached) = self.inner.cache.get(&filename) {
            if let Some(parent) = parent {
                parent.add_child_unique(&cached);
            }
            if !cached.is_loaded() {
                tracing::debug!(%filename, "circular require, returning partial exports");
            }
            return Ok(cached.exports());
        }

        let id = if is_main { "." } else { filename.as_str() };
        let module = Module::new(id, parent, Arc::downgrade(&self.inner));
        if is_main {
            *self.inner.main.write() = Some(module.clone());
        }
        self.inner.cache.set(filename.clone(), module.clone());
        if let Some(parent) = parent {
            parent.push_child(&module);
        }

        tracing::debug!(%filename, "loading module");
        if let Err(err) = module.load(&filename) {
            tracing::debug!(%filename, error = %err, "load failed, removing from cache");
            self.inner.cache.delete_if_same(&filename, &module);
            if let Some(parent) = parent {
                parent.remove_child(&module);
            }
            return Err(err);
        }
        Ok(module.exports())
    }

    /// `new Module(id, parent)`
    pub fn create_module(&self, id: &str, parent: Option<&Module>) -> Module {
        Module::new(id, parent, Arc::downgrade(&self.inner))
    }

    /// `createRequire(filename)`: accepts an absolute path or a `file:` URL.
    ///
    /// A trailing slash names a directory; requests then resolve from
    /// inside it.
    pub fn create_require(&self, filename: &str) -> Result<Require> {
        if filename.starts_with("file:") {
            let url = url::Url::parse(filename)
                .map_err(|e| ModuleError::invalid_argument(format!("invalid file URL '{}': {}", filename, e)))?;
            return self.create_require_from_url(&url);
        }

        if !path::is_absolute(filename) {
            return Err(ModuleError::invalid_argument(format!(
                "The argument 'filename' must be a file URL object, file URL string, or absolute path string. Received '{}'",
                filename
            )));
        }

        let proxy = if filename.ends_with(path::SEP) {
            path::join(filename, "noop.js")
        } else {
            filename.to_string()
        };
        let module = self.create_module(&proxy, None);
        module.set_filename(&proxy);
        module.set_paths(resolver::node_module_paths(self.cwd(), &path::dirname(&proxy)));
        Ok(Require::new(self.clone(), module))
    }

    /// `createRequire(url)`
    pub fn create_require_from_url(&self, url: &url::Url) -> Result<Require> {
        if url.scheme() != "file" {
            return Err(ModuleError::invalid_argument(format!(
                "The URL must be of scheme file. Received '{}'",
                url
            )));
        }
        let file = url
            .to_file_path()
            .map_err(|()| ModuleError::invalid_argument(format!("'{}' is not a file path", url)))?;
        let mut filename = file
            .to_str()
            .ok_or_else(|| ModuleError::invalid_argument("file URL is not valid UTF-8"))?
            .to_string();
        if url.path().ends_with('/') && !filename.ends_with(path::SEP) {
            filename.push(path::SEP);
        }
        self.create_require(&filename)
    }

    /// `Module.runMain(entry)`, through the current run-main hook
    pub fn run_main(&self, entry: &str) -> Result<()> {
        let hook = self.run_main_hook();
        hook(self, entry)
    }

    /// Load `entry` as the main module (id `"."`)
    pub fn default_run_main(system: &ModuleSystem, entry: &str) -> Result<()> {
        let filename = path::resolve(system.cwd(), entry);
        tracing::debug!(%filename, "running main module");
        system.load(&filename, None, true).map(|_| ())
    }

    /// Require each of `requests` before the main module runs
    pub fn preload<S: AsRef<str>>(&self, requests: &[S]) -> Result<()> {
        if requests.is_empty() {
            return Ok(());
        }
        let parent = self.create_module(PRELOAD_ID, None);
        parent.set_paths(resolver::node_module_paths(self.cwd(), self.cwd()));
        for request in requests {
            parent.require(request.as_ref())?;
        }
        Ok(())
    }

    /// `Module.findSourceMap(filename)`. No source maps are tracked, so this is
    /// always `undefined`.
    pub fn find_source_map(&self, filename: &str) -> Value {
        tracing::trace!(filename, "no source map registered");
        Value::Undefined
    }

    /// Format of the file at `filename`; `.js` follows the package scope
    pub fn module_format(&self, filename: &str) -> Result<ModuleFormat> {
        Ok(match ModuleFormat::from_path(filename) {
            ModuleFormat::Unknown if path::extname(filename) == ".js" => {
                let package_type = self.inner.resolver.package_type(filename)?;
                ModuleFormat::from_package_type(package_type.as_deref())
            }
            ModuleFormat::Unknown => ModuleFormat::CommonJs,
            format => format,
        })
    }

    /// Namespace of the foreign module at `filename`
    pub fn foreign_namespace(&self, filename: &str) -> Result<ObjectRef> {
        let foreign = self.inner.foreign.as_ref().ok_or_else(|| ModuleError::ModuleResolution {
            module: filename.to_string(),
            reason: "ES modules cannot be loaded without a foreign module loader".to_string(),
        })?;
        foreign.namespace(filename)
    }

    /// The installed `Module._resolveFilename`
    pub fn resolve_filename_hook(&self) -> ResolveFilenameHook {
        self.inner.resolve_hook.get()
    }

    /// The installed `Module.prototype.require`
    pub fn require_hook(&self) -> RequireHook {
        self.inner.require_hook.get()
    }

    /// The installed `Module.prototype._compile`
    pub fn compile_hook(&self) -> CompileHook {
        self.inner.compile_hook.get()
    }

    /// The installed `Module.runMain`
    pub fn run_main_hook(&self) -> RunMainHook {
        self.inner.run_main_hook.get()
    }

    /// Replace `Module._resolveFilename`, returning the previous function
    pub fn set_resolve_filename<F>(&self, hook: F) -> ResolveFilenameHook
    where
        F: Fn(&ModuleSystem, &str, Option<&Module>, bool, &ResolveOptions) -> Result<String>
            + Send
            + Sync
            + 'static,
    {
        self.inner.resolve_hook.replace(Arc::new(hook))
    }

    /// Replace `Module.prototype.require` for every module
    pub fn set_require<F>(&self, hook: F) -> RequireHook
    where
        F: Fn(&Module, &str) -> Result<Value> + Send + Sync + 'static,
    {
        self.inner.require_hook.replace(Arc::new(hook))
    }

    /// Replace `Module.prototype._compile` for every module
    pub fn set_compile<F>(&self, hook: F) -> CompileHook
    where
        F: Fn(&Module, &str, &str) -> Result<Value> + Send + Sync + 'static,
    {
        self.inner.compile_hook.replace(Arc::new(hook))
    }

    /// Replace `Module.runMain`
    pub fn set_run_main<F>(&self, hook: F) -> RunMainHook
    where
        F: Fn(&ModuleSystem, &str) -> Result<()> + Send + Sync + 'static,
    {
        self.inner.run_main_hook.replace(Arc::new(hook))
    }

    /// Whether two handles refer to the same system
    pub fn ptr_eq(&self, other: &ModuleSystem) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}
