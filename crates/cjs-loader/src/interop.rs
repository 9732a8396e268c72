// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Interop with non-CommonJS module formats
//!
//! Only the edge is implemented here: deciding which format a file is in,
//! and which single value a `require` of a foreign module evaluates to.

use crate::error::Result;
use crate::path;
use crate::value::{ObjectRef, Value};

/// Export name a foreign module uses to pick its CommonJS value
pub const MODULE_EXPORTS_KEY: &str = "module.exports";

/// Module format detection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleFormat {
    /// CommonJS module (require/module.exports)
    CommonJs,
    /// ECMAScript module (import/export)
    Esm,
    /// JSON file
    Json,
    /// Native addon
    Addon,
    /// Decided by the nearest package.json
    Unknown,
}

impl ModuleFormat {
    /// Detect module format from file extension
    pub fn from_path(filename: &str) -> Self {
        match path::extname(filename) {
            ".mjs" => ModuleFormat::Esm,
            ".cjs" => ModuleFormat::CommonJs,
            ".json" => ModuleFormat::Json,
            ".node" => ModuleFormat::Addon,
            _ => ModuleFormat::Unknown,
        }
    }

    /// Detect module format from package.json "type" field
    pub fn from_package_type(type_field: Option<&str>) -> Self {
        match type_field {
            Some("module") => ModuleFormat::Esm,
            _ => ModuleFormat::CommonJs,
        }
    }
}

/// Loads foreign (ES) modules and exposes their namespace
pub trait ForeignModuleLoader: Send + Sync {
    /// Evaluate the module at `filename` and return its namespace object
    fn namespace(&self, filename: &str) -> Result<ObjectRef>;
}

/// The value `require` returns for a foreign module.
///
/// An explicit `"module.exports"` export wins; a namespace whose only
/// export is `default` collapses to that value; anything else is returned
/// as the namespace object.
pub fn default_like_export(namespace: &ObjectRef) -> Value {
    if let Some(value) = namespace.get(MODULE_EXPORTS_KEY) {
        return value;
    }
    if namespace.len() == 1 {
        if let Some(value) = namespace.get("default") {
            return value;
        }
    }
    Value::Object(namespace.clone())
}
