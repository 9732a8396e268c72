// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Replaceable behaviors shared by every module in a system.
//!
//! Each slot holds one function reference. Callers read the slot at call
//! time, so replacing it affects all later calls, including calls made by
//! modules loaded before the replacement. Setters hand back the previous
//! function so a replacement can delegate to it.

use crate::error::Result;
use crate::loader::ModuleSystem;
use crate::module::Module;
use crate::resolver::ResolveOptions;
use crate::value::Value;
use parking_lot::RwLock;
use std::sync::Arc;

/// `Module._resolveFilename(request, parent, isMain, options)`
pub type ResolveFilenameHook =
    Arc<dyn Fn(&ModuleSystem, &str, Option<&Module>, bool, &ResolveOptions) -> Result<String> + Send + Sync>;

/// `Module.prototype.require(request)`
pub type RequireHook = Arc<dyn Fn(&Module, &str) -> Result<Value> + Send + Sync>;

/// `Module.prototype._compile(content, filename)`
pub type CompileHook = Arc<dyn Fn(&Module, &str, &str) -> Result<Value> + Send + Sync>;

/// `Module.runMain(entry)`
pub type RunMainHook = Arc<dyn Fn(&ModuleSystem, &str) -> Result<()> + Send + Sync>;

/// A function-reference cell
pub struct HookSlot<T> {
    name: &'static str,
    current: RwLock<T>,
}

impl<T: Clone> HookSlot<T> {
    pub(crate) fn new(name: &'static str, initial: T) -> Self {
        Self {
            name,
            current: RwLock::new(initial),
        }
    }

    /// The function currently installed.
    ///
    /// Returned by value so the lock is released before it runs; hooks
    /// re-enter the loader.
    pub fn get(&self) -> T {
        self.current.read().clone()
    }

    /// Install `hook`, returning the one it replaces
    pub fn replace(&self, hook: T) -> T {
        tracing::debug!(hook = self.name, "replacing hook");
        std::mem::replace(&mut *self.current.write(), hook)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_returns_previous() {
        let slot: HookSlot<Arc<dyn Fn() -> u32 + Send + Sync>> = HookSlot::new("test", Arc::new(|| 1));
        let previous = slot.replace(Arc::new(|| 2));
        assert_eq!(previous(), 1);
        assert_eq!((slot.get())(), 2);
    }

    #[test]
    fn test_replacement_can_chain() {
        let slot: HookSlot<Arc<dyn Fn(u32) -> u32 + Send + Sync>> =
            HookSlot::new("test", Arc::new(|n| n + 1));
        let previous = slot.get();
        slot.replace(Arc::new(move |n| previous(n) * 10));
        assert_eq!((slot.get())(1), 20);
    }
}
