// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! # cjs-loader
//!
//! A CommonJS module resolution and loading engine.
//!
//! The crate turns `require` specifiers into executed modules with the
//! Node.js semantics host code relies on:
//!
//! - `node_modules` search, extension probing and `package.json` `main`
//! - a shared module cache with stable identities and circular-require
//!   tolerance
//! - pluggable per-extension compilers (`.js`, `.json`, `.node`)
//! - replaceable resolve, require, compile and run-main hooks
//! - `createRequire` from a path or `file:` URL
//!
//! Running module bodies is delegated to a [`ScriptEngine`]. The bundled
//! [`NativeEngine`] runs host closures registered per file.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use cjs_loader::{ModuleSystem, NativeEngine, Value};
//! use std::sync::Arc;
//!
//! let engine = Arc::new(NativeEngine::new());
//! engine.register_file("/app/main.js", |args| {
//!     let fs = args.require("fs")?;
//!     args.module.set_exports(fs);
//!     Ok(Value::Undefined)
//! });
//!
//! let system = ModuleSystem::builder().cwd("/app").engine(engine).build()?;
//! system.run_main("main.js")?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod builtins;
pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod extensions;
pub mod fs;
pub mod hooks;
pub mod interop;
pub mod loader;
pub mod module;
pub mod path;
pub mod require;
pub mod resolver;
pub mod value;
pub mod wrapper;

// Re-exports
pub use builtins::{builtin_modules, is_builtin, BuiltinRegistry, BUILTIN_MODULES};
pub use cache::ModuleCache;
pub use config::LoaderConfig;
pub use engine::{AddonLoader, ModuleArgs, NativeEngine, ScriptEngine};
pub use error::{ModuleError, Result};
pub use extensions::{ExtensionHandler, Extensions};
pub use fs::{FileKind, FileSystem, OsFileSystem};
pub use interop::{ForeignModuleLoader, ModuleFormat};
pub use loader::{ModuleSystem, ModuleSystemBuilder};
pub use module::Module;
pub use require::Require;
pub use resolver::{node_module_paths, ResolveContext, ResolveOptions};
pub use value::{Function, ObjectRef, Value};
pub use wrapper::{wrap, WRAPPER_HEAD, WRAPPER_TAIL};

/// Version of the loader
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
