// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Error types for the module loader

use crate::value::Value;
use thiserror::Error;

/// Result type for module loader operations
pub type Result<T> = std::result::Result<T, ModuleError>;

/// Errors that can occur while resolving, loading or running a module
#[derive(Debug, Error)]
pub enum ModuleError {
    /// No candidate matched during resolution
    #[error("Cannot find module '{request}'{}{}", render_searched(.searched), render_stack(.require_stack))]
    ModuleNotFound {
        /// The request as passed to `require`
        request: String,
        /// Directories that were searched, in order
        searched: Vec<String>,
        /// Filenames of the requiring modules, innermost first
        require_stack: Vec<String>,
    },

    /// Malformed input to a loader operation
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A structured-data handler could not parse a file
    #[error("{path}: {reason}")]
    InvalidModuleFormat {
        /// File that failed to parse
        path: String,
        /// Parser message
        reason: String,
    },

    /// The module resolved but cannot be loaded by this host
    #[error("Error loading module '{module}': {reason}")]
    ModuleResolution {
        /// Module filename or specifier
        module: String,
        /// Reason for failure
        reason: String,
    },

    /// File system error
    #[error("File system error: {0}")]
    Fs(#[from] std::io::Error),

    /// A value thrown by a module body
    #[error("Uncaught {0}")]
    Thrown(Value),

    /// The script engine rejected the wrapped source
    #[error("Failed to run '{filename}': {message}")]
    Script {
        /// Filename handed to the engine
        filename: String,
        /// Engine message
        message: String,
    },

    /// The module system backing a module has been dropped
    #[error("Module '{0}' is detached from its module system")]
    Detached(String),
}

impl ModuleError {
    /// Create a module not found error with no search detail
    pub fn module_not_found(request: impl Into<String>) -> Self {
        Self::ModuleNotFound {
            request: request.into(),
            searched: Vec::new(),
            require_stack: Vec::new(),
        }
    }

    /// Create an invalid argument error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Wrap a thrown value
    pub fn thrown(value: impl Into<Value>) -> Self {
        Self::Thrown(value.into())
    }

    /// Attach a require stack to a not-found error; other errors pass through
    pub fn with_require_stack(self, stack: Vec<String>) -> Self {
        match self {
            Self::ModuleNotFound {
                request, searched, ..
            } => Self::ModuleNotFound {
                request,
                searched,
                require_stack: stack,
            },
            other => other,
        }
    }

    /// Node.js-compatible error code
    pub fn code(&self) -> &'static str {
        match self {
            Self::ModuleNotFound { .. } => "MODULE_NOT_FOUND",
            Self::InvalidArgument(_) => "ERR_INVALID_ARG_VALUE",
            Self::InvalidModuleFormat { .. } => "ERR_INVALID_MODULE_FORMAT",
            Self::ModuleResolution { .. } => "ERR_UNSUPPORTED_MODULE",
            Self::Fs(_) => "ERR_FS",
            Self::Thrown(_) => "ERR_UNCAUGHT",
            Self::Script { .. } => "ERR_SCRIPT",
            Self::Detached(_) => "ERR_DETACHED_MODULE",
        }
    }

    /// Whether this is a resolution failure
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ModuleNotFound { .. })
    }
}

fn render_searched(searched: &[String]) -> String {
    if searched.is_empty() {
        return String::new();
    }
    let mut out = String::from("\nSearched in:");
    for dir in searched {
        out.push_str("\n- ");
        out.push_str(dir);
    }
    out
}

fn render_stack(stack: &[String]) -> String {
    if stack.is_empty() {
        return String::new();
    }
    let mut out = String::from("\nRequire stack:");
    for filename in stack {
        out.push_str("\n- ");
        out.push_str(filename);
    }
    out
}
