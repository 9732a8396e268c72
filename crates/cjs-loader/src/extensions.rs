// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Per-extension compilers (`Module._extensions`)

use crate::error::{ModuleError, Result};
use crate::interop::{self, ModuleFormat};
use crate::module::Module;
use crate::path;
use crate::value::Value;
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::sync::Arc;

/// Compiles the file at `filename` into `module`, setting its exports
pub type ExtensionHandler = Arc<dyn Fn(&Module, &str) -> Result<()> + Send + Sync>;

/// Extension used when a filename matches nothing registered
pub const DEFAULT_EXTENSION: &str = ".js";

/// `require.extensions` / `Module._extensions`.
///
/// Registration order is also the probe order used during resolution.
/// Clones share the same map.
#[derive(Clone)]
pub struct Extensions {
    handlers: Arc<RwLock<IndexMap<String, ExtensionHandler>>>,
}

impl Extensions {
    /// A map with no handlers
    pub fn empty() -> Self {
        Self {
            handlers: Arc::new(RwLock::new(IndexMap::new())),
        }
    }

    /// The built-in `.js`, `.json` and `.node` handlers
    pub fn with_defaults() -> Self {
        let extensions = Self::empty();
        extensions.insert(".js", compile_js);
        extensions.insert(".json", compile_json);
        extensions.insert(".node", compile_addon);
        extensions
    }

    /// Register or replace the handler for `ext` (leading dot included)
    pub fn insert<F>(&self, ext: &str, handler: F) -> Option<ExtensionHandler>
    where
        F: Fn(&Module, &str) -> Result<()> + Send + Sync + 'static,
    {
        self.handlers.write().insert(ext.to_string(), Arc::new(handler))
    }

    /// Remove the handler for `ext`
    pub fn remove(&self, ext: &str) -> Option<ExtensionHandler> {
        self.handlers.write().shift_remove(ext)
    }

    /// The handler for `ext`
    pub fn get(&self, ext: &str) -> Option<ExtensionHandler> {
        self.handlers.read().get(ext).cloned()
    }

    /// Whether `ext` has a handler
    pub fn contains(&self, ext: &str) -> bool {
        self.handlers.read().contains_key(ext)
    }

    /// Registered extensions in probe order
    pub fn keys(&self) -> Vec<String> {
        self.handlers.read().keys().cloned().collect()
    }

    /// The longest registered extension `filename` ends with.
    ///
    /// `a.foo.bar` tries `.foo.bar` then `.bar`; a leading dot in the
    /// basename never starts an extension. Falls back to `.js`.
    pub fn find_longest_registered(&self, filename: &str) -> String {
        let name = path::basename(filename);
        let handlers = self.handlers.read();
        let mut start = 0;
        while let Some(offset) = name[start..].find('.') {
            let idx = start + offset;
            start = idx + 1;
            if idx == 0 {
                continue;
            }
            let ext = &name[idx..];
            if handlers.contains_key(ext) {
                return ext.to_string();
            }
        }
        DEFAULT_EXTENSION.to_string()
    }

    /// Whether two handles share storage
    pub fn ptr_eq(&self, other: &Extensions) -> bool {
        Arc::ptr_eq(&self.handlers, &other.handlers)
    }
}

impl Default for Extensions {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// `.js`: wrap and run CommonJS source; foreign modules yield their
/// default-like export.
pub fn compile_js(module: &Module, filename: &str) -> Result<()> {
    let system = module.system()?;
    if system.module_format(filename)? == ModuleFormat::Esm {
        let namespace = system.foreign_namespace(filename)?;
        module.set_exports(interop::default_like_export(&namespace));
        return Ok(());
    }

    let content = system.file_system().read_to_string(filename)?;
    module.compile(&content, filename)?;
    Ok(())
}

/// `.json`: parse the file and use the result as exports
pub fn compile_json(module: &Module, filename: &str) -> Result<()> {
    let system = module.system()?;
    let content = system.file_system().read_to_string(filename)?;
    let content = content.strip_prefix('\u{feff}').unwrap_or(&content);
    let json: serde_json::Value =
        serde_json::from_str(content).map_err(|e| ModuleError::InvalidModuleFormat {
            path: filename.to_string(),
            reason: e.to_string(),
        })?;
    module.set_exports(Value::from_json(&json));
    Ok(())
}

/// `.node`: hand the file to the host's addon loader
pub fn compile_addon(module: &Module, filename: &str) -> Result<()> {
    let system = module.system()?;
    let loader = system.addon_loader().ok_or_else(|| ModuleError::ModuleResolution {
        module: filename.to_string(),
        reason: "Native addons (.node) are not supported".to_string(),
    })?;
    module.set_exports(loader.load(filename)?);
    Ok(())
}
