// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Script execution collaborators.
//!
//! The loader produces wrapped source text; running it is delegated to a
//! [`ScriptEngine`]. Errors raised by a module body must come back
//! unchanged so they reach the outermost `require` caller verbatim.

use crate::error::{ModuleError, Result};
use crate::module::Module;
use crate::require::Require;
use crate::value::Value;
use crate::wrapper;
use dashmap::DashMap;
use std::sync::Arc;

/// The five CommonJS wrapper arguments
pub struct ModuleArgs<'a> {
    /// `exports`: the module's exports at the time the body starts
    pub exports: Value,
    /// `require`: bound to the running module
    pub require: &'a Require,
    /// `module`
    pub module: &'a Module,
    /// `__filename`
    pub filename: &'a str,
    /// `__dirname`
    pub dirname: &'a str,
}

impl ModuleArgs<'_> {
    /// `require(request)` from inside the body
    pub fn require(&self, request: &str) -> Result<Value> {
        self.require.call(request)
    }
}

/// Compiles and runs wrapped module source
pub trait ScriptEngine: Send + Sync {
    /// Evaluate `wrapped` (the output of [`wrapper::wrap`]) and invoke the
    /// resulting function with `args`, returning the function's result.
    fn run(&self, wrapped: &str, filename: &str, args: ModuleArgs<'_>) -> Result<Value>;
}

/// Loads `.node` native addons
pub trait AddonLoader: Send + Sync {
    /// Load the addon at `filename` and return its exports
    fn load(&self, filename: &str) -> Result<Value>;
}

/// A module body implemented by the host
pub type ModuleBody = Arc<dyn Fn(ModuleArgs<'_>) -> Result<Value> + Send + Sync>;

/// Engine whose module bodies are host closures.
///
/// Bodies are looked up by filename first, then by the exact source text
/// inside the wrapper. Embedders use it for modules implemented natively;
/// it is also the engine used throughout the test suite.
#[derive(Default)]
pub struct NativeEngine {
    by_file: DashMap<String, ModuleBody>,
    by_source: DashMap<String, ModuleBody>,
}

impl NativeEngine {
    /// Create an engine with no bodies
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the body run for `filename`
    pub fn register_file<F>(&self, filename: impl Into<String>, body: F)
    where
        F: Fn(ModuleArgs<'_>) -> Result<Value> + Send + Sync + 'static,
    {
        self.by_file.insert(filename.into(), Arc::new(body));
    }

    /// Register the body run for a given source text
    pub fn register_source<F>(&self, source: impl Into<String>, body: F)
    where
        F: Fn(ModuleArgs<'_>) -> Result<Value> + Send + Sync + 'static,
    {
        self.by_source.insert(source.into(), Arc::new(body));
    }

    fn lookup(&self, filename: &str, source: &str) -> Option<ModuleBody> {
        // Clone out of the map: bodies re-enter the engine through require.
        self.by_file
            .get(filename)
            .map(|body| Arc::clone(body.value()))
            .or_else(|| self.by_source.get(source).map(|body| Arc::clone(body.value())))
    }
}

impl ScriptEngine for NativeEngine {
    fn run(&self, wrapped: &str, filename: &str, args: ModuleArgs<'_>) -> Result<Value> {
        let source = wrapper::unwrap_body(wrapped).ok_or_else(|| ModuleError::Script {
            filename: filename.to_string(),
            message: "source is not a CommonJS wrapper".to_string(),
        })?;
        let body = self.lookup(filename, source).ok_or_else(|| ModuleError::Script {
            filename: filename.to_string(),
            message: "no native body registered".to_string(),
        })?;
        tracing::trace!(filename, "running native body");
        body(args)
    }
}
