// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Built-in module names and their exports

use crate::error::{ModuleError, Result};
use crate::value::Value;
use dashmap::DashMap;
use std::sync::Arc;

/// Prefix accepted in front of every builtin name
pub const NODE_PREFIX: &str = "node:";

/// Builtin module names in canonical (unprefixed) form, sorted
pub const BUILTIN_MODULES: &[&str] = &[
    "_http_agent",
    "_http_client",
    "_http_common",
    "_http_incoming",
    "_http_outgoing",
    "_http_server",
    "_stream_duplex",
    "_stream_passthrough",
    "_stream_readable",
    "_stream_transform",
    "_stream_wrap",
    "_stream_writable",
    "_tls_common",
    "_tls_wrap",
    "assert",
    "assert/strict",
    "async_hooks",
    "buffer",
    "child_process",
    "cluster",
    "console",
    "constants",
    "crypto",
    "dgram",
    "diagnostics_channel",
    "dns",
    "dns/promises",
    "domain",
    "events",
    "fs",
    "fs/promises",
    "http",
    "http2",
    "https",
    "inspector",
    "inspector/promises",
    "module",
    "net",
    "os",
    "path",
    "path/posix",
    "path/win32",
    "perf_hooks",
    "process",
    "punycode",
    "querystring",
    "readline",
    "readline/promises",
    "repl",
    "stream",
    "stream/consumers",
    "stream/promises",
    "stream/web",
    "string_decoder",
    "sys",
    "timers",
    "timers/promises",
    "tls",
    "trace_events",
    "tty",
    "url",
    "util",
    "util/types",
    "v8",
    "vm",
    "wasi",
    "worker_threads",
    "zlib",
];

/// Builtins that only exist behind the `node:` prefix
pub const PREFIX_ONLY_MODULES: &[&str] = &["sea", "sqlite", "test", "test/reporters"];

/// isBuiltin(name)
pub fn is_builtin(name: &str) -> bool {
    match name.strip_prefix(NODE_PREFIX) {
        Some(rest) => {
            BUILTIN_MODULES.binary_search(&rest).is_ok() || PREFIX_ONLY_MODULES.contains(&rest)
        }
        None => BUILTIN_MODULES.binary_search(&name).is_ok(),
    }
}

/// Canonical name used to share one instance between `x` and `node:x`
pub fn canonical_name(name: &str) -> &str {
    name.strip_prefix(NODE_PREFIX).unwrap_or(name)
}

/// builtinModules
pub fn builtin_modules() -> Vec<String> {
    BUILTIN_MODULES.iter().map(|name| name.to_string()).collect()
}

/// Produces the exports of a builtin on first use
pub type BuiltinFactory = Arc<dyn Fn() -> Value + Send + Sync>;

/// Registry of builtin implementations provided by the host.
///
/// Each builtin is instantiated at most once. The instance is shared by
/// the bare and `node:` spellings; `require.cache` overrides are handled by
/// the loader per literal spelling and never reach this registry.
#[derive(Default)]
pub struct BuiltinRegistry {
    factories: DashMap<String, BuiltinFactory>,
    instances: DashMap<String, Value>,
}

impl BuiltinRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Provide the implementation of a builtin
    pub fn register<F>(&self, name: &str, factory: F) -> Result<()>
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        if !is_builtin(name) {
            return Err(ModuleError::invalid_argument(format!(
                "'{}' is not a builtin module",
                name
            )));
        }
        let canonical = canonical_name(name).to_string();
        self.instances.remove(&canonical);
        self.factories.insert(canonical, Arc::new(factory));
        Ok(())
    }

    /// Exports for a builtin, instantiating it on first use.
    ///
    /// Builtins without a registered implementation get an empty object.
    pub fn exports(&self, name: &str) -> Value {
        let canonical = canonical_name(name);
        if let Some(existing) = self.instances.get(canonical) {
            return existing.clone();
        }

        let factory = self.factories.get(canonical).map(|f| Arc::clone(f.value()));
        let value = match factory {
            Some(factory) => factory(),
            None => {
                tracing::debug!(builtin = canonical, "no implementation registered, using empty exports");
                Value::object()
            }
        };
        self.instances
            .entry(canonical.to_string())
            .or_insert(value)
            .clone()
    }

    /// Whether a builtin has been instantiated
    pub fn is_instantiated(&self, name: &str) -> bool {
        self.instances.contains_key(canonical_name(name))
    }
}
