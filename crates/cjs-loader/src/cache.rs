// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module cache for require()

use crate::module::Module;
use crate::value::Value;
use dashmap::DashMap;
use std::sync::Arc;

/// `require.cache`.
///
/// Keys are resolved filenames for file modules and the literal spelling
/// for builtins, so `"fs"` and `"node:fs"` are distinct entries. Clones
/// share the same storage.
#[derive(Clone, Default)]
pub struct ModuleCache {
    /// Cache mapping keys to modules
    cache: Arc<DashMap<String, Module>>,
}

impl ModuleCache {
    /// Create a new empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a cached module by key
    pub fn get(&self, key: &str) -> Option<Module> {
        self.cache.get(key).map(|entry| entry.clone())
    }

    /// Check if a module is cached
    pub fn has(&self, key: &str) -> bool {
        self.cache.contains_key(key)
    }

    /// Add a module to the cache, returning the entry it replaced
    pub fn set(&self, key: impl Into<String>, module: Module) -> Option<Module> {
        self.cache.insert(key.into(), module)
    }

    /// Inject a `{ exports }` record under `key`
    pub fn set_exports(&self, key: impl Into<String>, exports: Value) -> Module {
        let key = key.into();
        let module = Module::detached(&key, exports);
        self.cache.insert(key, module.clone());
        module
    }

    /// Remove a module from the cache; missing keys are not an error
    pub fn delete(&self, key: &str) -> Option<Module> {
        self.cache.remove(key).map(|(_, v)| v)
    }

    /// Remove `key` only while it still maps to `module`
    pub(crate) fn delete_if_same(&self, key: &str, module: &Module) -> bool {
        self.cache
            .remove_if(key, |_, cached| cached.ptr_eq(module))
            .is_some()
    }

    /// Clear the entire cache
    pub fn clear(&self) {
        self.cache.clear();
    }

    /// Get all cache keys
    pub fn keys(&self) -> Vec<String> {
        self.cache.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Get the number of cached modules
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Whether two handles share storage
    pub fn ptr_eq(&self, other: &ModuleCache) -> bool {
        Arc::ptr_eq(&self.cache, &other.cache)
    }
}
