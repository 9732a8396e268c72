// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! The `Module` record

use crate::engine::ModuleArgs;
use crate::error::{ModuleError, Result};
use crate::loader::{ModuleSystem, SystemInner};
use crate::path;
use crate::require::Require;
use crate::resolver::{self, ResolveContext};
use crate::value::{Function, Value};
use crate::wrapper;
use parking_lot::RwLock;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock, Weak};

/// One loaded unit.
///
/// `Module` is a shared handle: clones refer to the same record and
/// compare equal with [`Module::ptr_eq`].
#[derive(Clone)]
pub struct Module {
    inner: Arc<ModuleInner>,
}

struct ModuleInner {
    id: String,
    filename: RwLock<Option<String>>,
    exports: RwLock<Value>,
    loaded: AtomicBool,
    children: RwLock<Vec<Module>>,
    parent: Option<Weak<ModuleInner>>,
    paths: RwLock<Vec<String>>,
    system: Weak<SystemInner>,
    require_fn: OnceLock<Function>,
}

impl Module {
    pub(crate) fn new(id: &str, parent: Option<&Module>, system: Weak<SystemInner>) -> Self {
        Self {
            inner: Arc::new(ModuleInner {
                id: id.to_string(),
                filename: RwLock::new(None),
                exports: RwLock::new(Value::object()),
                loaded: AtomicBool::new(false),
                children: RwLock::new(Vec::new()),
                parent: parent.map(|p| Arc::downgrade(&p.inner)),
                paths: RwLock::new(Vec::new()),
                system,
                require_fn: OnceLock::new(),
            }),
        }
    }

    /// A loaded `{ exports }` record that belongs to no system, as
    /// injected into `require.cache` by host code.
    pub fn detached(key: &str, exports: Value) -> Self {
        let module = Self::new(key, None, Weak::new());
        *module.inner.filename.write() = Some(key.to_string());
        *module.inner.exports.write() = exports;
        module.inner.loaded.store(true, Ordering::Release);
        module
    }

    /// Module id: the filename, `"."` for the main module, or whatever
    /// the creator chose
    pub fn id(&self) -> &str {
        &self.inner.id
    }

    /// Absolute filename, once known
    pub fn filename(&self) -> Option<String> {
        self.inner.filename.read().clone()
    }

    pub(crate) fn set_filename(&self, filename: &str) {
        *self.inner.filename.write() = Some(filename.to_string());
    }

    /// `module.exports`
    pub fn exports(&self) -> Value {
        self.inner.exports.read().clone()
    }

    /// Replace `module.exports`
    pub fn set_exports(&self, exports: Value) {
        *self.inner.exports.write() = exports;
    }

    /// Whether the body finished without error
    pub fn is_loaded(&self) -> bool {
        self.inner.loaded.load(Ordering::Acquire)
    }

    /// Modules this one required, in first-require order
    pub fn children(&self) -> Vec<Module> {
        self.inner.children.read().clone()
    }

    /// The module whose require first loaded this one
    pub fn parent(&self) -> Option<Module> {
        self.inner
            .parent
            .as_ref()
            .and_then(Weak::upgrade)
            .map(|inner| Module { inner })
    }

    /// node_modules search roots for this module's own requires
    pub fn paths(&self) -> Vec<String> {
        self.inner.paths.read().clone()
    }

    /// Replace the search roots
    pub fn set_paths(&self, paths: Vec<String>) {
        *self.inner.paths.write() = paths;
    }

    /// Identity comparison
    pub fn ptr_eq(&self, other: &Module) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// The system this module was created by
    pub fn system(&self) -> Result<ModuleSystem> {
        self.inner
            .system
            .upgrade()
            .map(ModuleSystem::from_inner)
            .ok_or_else(|| ModuleError::Detached(self.inner.id.clone()))
    }

    /// Resolution context describing this module
    pub fn context(&self) -> ResolveContext {
        ResolveContext {
            id: Some(self.inner.id.clone()),
            filename: self.filename(),
            paths: Some(self.paths()),
        }
    }

    pub(crate) fn push_child(&self, child: &Module) {
        self.inner.children.write().push(child.clone());
    }

    pub(crate) fn add_child_unique(&self, child: &Module) {
        let mut children = self.inner.children.write();
        if !children.iter().any(|c| c.ptr_eq(child)) {
            children.push(child.clone());
        }
    }

    pub(crate) fn remove_child(&self, child: &Module) {
        self.inner.children.write().retain(|c| !c.ptr_eq(child));
    }

    /// Filenames up the parent chain, starting with this module
    pub fn require_stack(&self) -> Vec<String> {
        let mut stack = Vec::new();
        let mut current = Some(self.clone());
        while let Some(module) = current {
            stack.push(module.filename().unwrap_or_else(|| module.id().to_string()));
            current = module.parent();
        }
        stack
    }

    /// `module.require(request)`, dispatched through the system's
    /// current require hook
    pub fn require(&self, request: &str) -> Result<Value> {
        let system = self.system()?;
        let hook = system.require_hook();
        hook(self, request)
    }

    /// The built-in require behavior
    pub fn default_require(module: &Module, request: &str) -> Result<Value> {
        if request.is_empty() {
            return Err(ModuleError::invalid_argument(
                "The argument 'id' must be a non-empty string",
            ));
        }
        module.system()?.load(request, Some(module), false)
    }

    /// Load `filename` into this module through the extension handler
    /// that matches it
    pub fn load(&self, filename: &str) -> Result<()> {
        let system = self.system()?;
        self.set_filename(filename);
        self.set_paths(resolver::node_module_paths(
            system.cwd(),
            &path::dirname(filename),
        ));

        let extensions = system.extensions();
        let ext = extensions.find_longest_registered(filename);
        let handler = extensions
            .get(&ext)
            .or_else(|| extensions.get(crate::extensions::DEFAULT_EXTENSION))
            .ok_or_else(|| ModuleError::ModuleResolution {
                module: filename.to_string(),
                reason: format!("no handler registered for '{}'", ext),
            })?;

        tracing::trace!(filename, ext = %ext, "dispatching to extension handler");
        handler(self, filename)?;
        self.inner.loaded.store(true, Ordering::Release);
        Ok(())
    }

    /// `module._compile(content, filename)`, dispatched through the
    /// system's current compile hook. Returns the body's return value.
    pub fn compile(&self, content: &str, filename: &str) -> Result<Value> {
        let system = self.system()?;
        let hook = system.compile_hook();
        hook(self, content, filename)
    }

    /// Wrap `content` and run it with the five CommonJS arguments
    pub fn default_compile(module: &Module, content: &str, filename: &str) -> Result<Value> {
        let system = module.system()?;
        let wrapped = wrapper::wrap(Some(content));
        let dirname = path::dirname(filename);
        let require = Require::new(system.clone(), module.clone());
        let args = ModuleArgs {
            exports: module.exports(),
            require: &require,
            module,
            filename,
            dirname: &dirname,
        };
        system.engine().run(&wrapped, filename, args)
    }

    /// This module's `require` as a callable value.
    ///
    /// The same function is returned on every call. It does not keep the
    /// module alive.
    pub fn require_function(&self) -> Function {
        self.inner
            .require_fn
            .get_or_init(|| {
                let weak = Arc::downgrade(&self.inner);
                Function::new("require", move |args| {
                    let module = weak
                        .upgrade()
                        .map(|inner| Module { inner })
                        .ok_or_else(|| ModuleError::Detached("require".to_string()))?;
                    let request = args.first().and_then(Value::as_str).ok_or_else(|| {
                        ModuleError::invalid_argument("The \"id\" argument must be of type string")
                    })?;
                    module.require(request)
                })
            })
            .clone()
    }
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module")
            .field("id", &self.inner.id)
            .field("filename", &self.filename())
            .field("loaded", &self.is_loaded())
            .field("children", &self.inner.children.read().len())
            .finish()
    }
}
