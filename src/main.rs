// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! cjs CLI - inspect how CommonJS requests resolve
//!
//! ## Usage
//!
//! ```bash
//! # Where does `require("lodash")` from src/index.js land?
//! cjs resolve lodash --from src/index.js
//!
//! # node_modules directories searched from a directory
//! cjs paths src/lib
//!
//! # Builtins
//! cjs builtins
//! cjs is-builtin node:test
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand};
use cjs_loader::{LoaderConfig, ModuleSystem, ResolveContext, ResolveOptions, VERSION};
use owo_colors::OwoColorize;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(
    name = "cjs",
    about = "CommonJS module resolution, from the command line",
    version = VERSION,
    author = "Pegasus Heavy Industries"
)]
struct Cli {
    /// JSON loader configuration (cwd, nodePath, homeDir, prefix, preserveSymlinks)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Working directory; defaults to the process cwd
    #[arg(long, global = true)]
    cwd: Option<String>,

    /// Enable verbose logging
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve a request to a filename or builtin name
    Resolve {
        /// The request, as passed to require()
        request: String,

        /// File the request is made from
        #[arg(long)]
        from: Option<String>,

        /// Search from these directories instead
        #[arg(long = "path")]
        paths: Vec<String>,
    },

    /// List the node_modules directories searched from a directory
    Paths {
        /// Starting directory
        from: String,
    },

    /// Show the lookup paths for a request
    LookupPaths {
        /// The request
        request: String,

        /// File the request is made from
        #[arg(long)]
        from: Option<String>,
    },

    /// Print module source wrapped in the CommonJS function wrapper
    Wrap {
        /// Source file; the body is `undefined` when omitted
        file: Option<PathBuf>,
    },

    /// List builtin module names
    Builtins,

    /// Check whether a name is a builtin module
    IsBuiltin {
        /// Module name, with or without the node: prefix
        name: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("cjs_loader=debug,cjs=debug")
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter("cjs_loader=warn")
            .with_writer(std::io::stderr)
            .init();
    }

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", "Error".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    match &cli.command {
        Command::Resolve {
            request,
            from,
            paths,
        } => {
            let system = build_system(&cli)?;
            let require = system.create_require(&parent_file(&system, from.as_deref()))?;
            let options = ResolveOptions {
                paths: (!paths.is_empty()).then(|| paths.clone()),
            };
            let resolved = require.resolve_with(request, &options)?;
            if cjs_loader::is_builtin(&resolved) {
                println!("{} {}", resolved, "(builtin)".dimmed());
            } else {
                println!("{}", resolved);
            }
        }
        Command::Paths { from } => {
            let system = build_system(&cli)?;
            for dir in system.node_module_paths(Some(from))? {
                println!("{}", dir);
            }
        }
        Command::LookupPaths { request, from } => {
            let system = build_system(&cli)?;
            let filename = parent_file(&system, from.as_deref());
            let ctx = ResolveContext {
                id: Some(filename.clone()),
                paths: Some(cjs_loader::node_module_paths(
                    system.cwd(),
                    &cjs_loader::path::dirname(&filename),
                )),
                filename: Some(filename),
            };
            let paths = system.resolve_lookup_paths(request, Some(&ctx));
            if paths.is_empty() {
                println!("{}", "(none)".dimmed());
            }
            for dir in paths {
                println!("{}", dir);
            }
        }
        Command::Wrap { file } => {
            let source = match file {
                Some(file) => Some(
                    std::fs::read_to_string(file)
                        .with_context(|| format!("failed to read {}", file.display()))?,
                ),
                None => None,
            };
            println!("{}", cjs_loader::wrap(source.as_deref()));
        }
        Command::Builtins => {
            for name in cjs_loader::builtin_modules() {
                println!("{}", name);
            }
        }
        Command::IsBuiltin { name } => {
            if !cjs_loader::is_builtin(name) {
                println!("{}", "false".red());
                return Ok(ExitCode::FAILURE);
            }
            println!("{}", "true".green());
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn build_system(cli: &Cli) -> anyhow::Result<ModuleSystem> {
    let mut config = match &cli.config {
        Some(file) => LoaderConfig::from_file(file)
            .with_context(|| format!("failed to load config {}", file.display()))?,
        None => LoaderConfig::default(),
    };
    if let Some(cwd) = &cli.cwd {
        config.cwd = Some(cwd.clone());
    }
    let config = config.merge(LoaderConfig::from_env());
    tracing::debug!(?config, "loader configuration");
    Ok(ModuleSystem::builder().config(config).build()?)
}

/// Absolute file a request is made from; a synthetic file in cwd by default
fn parent_file(system: &ModuleSystem, from: Option<&str>) -> String {
    match from {
        Some(file) => cjs_loader::path::resolve(system.cwd(), file),
        None => cjs_loader::path::join(system.cwd(), "[eval]"),
    }
}
