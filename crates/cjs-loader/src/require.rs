// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! CommonJS require() implementation

use crate::builtins;
use crate::cache::ModuleCache;
use crate::error::Result;
use crate::extensions::Extensions;
use crate::loader::ModuleSystem;
use crate::module::Module;
use crate::resolver::ResolveOptions;
use crate::value::{Function, Value};
use std::fmt;

/// A `require` function bound to one module
#[derive(Clone)]
pub struct Require {
    system: ModuleSystem,
    module: Module,
}

impl Require {
    pub(crate) fn new(system: ModuleSystem, module: Module) -> Self {
        Self { system, module }
    }

    /// `require(request)`
    pub fn call(&self, request: &str) -> Result<Value> {
        self.module.require(request)
    }

    /// `require.resolve(request)` - get the resolved path without loading
    pub fn resolve(&self, request: &str) -> Result<String> {
        self.resolve_with(request, &ResolveOptions::default())
    }

    /// `require.resolve(request, { paths })`
    pub fn resolve_with(&self, request: &str, options: &ResolveOptions) -> Result<String> {
        self.system
            .resolve_filename(request, Some(&self.module), false, options)
    }

    /// `require.resolve.paths(request)`; `None` for builtins
    pub fn resolve_paths(&self, request: &str) -> Option<Vec<String>> {
        if builtins::is_builtin(request) {
            return None;
        }
        Some(
            self.system
                .resolve_lookup_paths(request, Some(&self.module.context())),
        )
    }

    /// `require.cache` - the module cache shared by the whole system
    pub fn cache(&self) -> ModuleCache {
        self.system.cache()
    }

    /// `require.extensions`
    pub fn extensions(&self) -> Extensions {
        self.system.extensions()
    }

    /// `require.main` - the main module
    pub fn main(&self) -> Option<Module> {
        self.system.main()
    }

    /// The module this function is bound to
    pub fn module(&self) -> &Module {
        &self.module
    }

    /// This require as a callable value
    pub fn as_function(&self) -> Function {
        self.module.require_function()
    }
}

impl fmt::Debug for Require {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Require")
            .field("module", &self.module.id())
            .field("filename", &self.module.filename())
            .finish()
    }
}
