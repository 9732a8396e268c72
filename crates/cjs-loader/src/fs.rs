// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! File system access used by resolution and the file handlers

use std::io;

/// What a path points at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// Regular file
    File,
    /// Directory
    Directory,
}

/// File system collaborator.
///
/// The loader never touches `std::fs` directly, so hosts can serve modules
/// from archives or memory.
pub trait FileSystem: Send + Sync {
    /// Stat a path; `None` when it does not exist
    fn stat(&self, path: &str) -> Option<FileKind>;

    /// Read a file as UTF-8 text
    fn read_to_string(&self, path: &str) -> io::Result<String>;

    /// Resolve symlinks to a canonical absolute path
    fn real_path(&self, path: &str) -> io::Result<String>;

    /// Whether a path exists
    fn exists(&self, path: &str) -> bool {
        self.stat(path).is_some()
    }

    /// Whether a path is a directory
    fn is_dir(&self, path: &str) -> bool {
        self.stat(path) == Some(FileKind::Directory)
    }

    /// Whether a path is a regular file
    fn is_file(&self, path: &str) -> bool {
        self.stat(path) == Some(FileKind::File)
    }
}

/// The host operating system's file system
#[derive(Debug, Default, Clone, Copy)]
pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
    fn stat(&self, path: &str) -> Option<FileKind> {
        let meta = std::fs::metadata(path).ok()?;
        if meta.is_dir() {
            Some(FileKind::Directory)
        } else {
            Some(FileKind::File)
        }
    }

    fn read_to_string(&self, path: &str) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn real_path(&self, path: &str) -> io::Result<String> {
        let canonical = std::fs::canonicalize(path)?;
        canonical
            .into_os_string()
            .into_string()
            .map_err(|raw| io::Error::new(io::ErrorKind::InvalidData, format!("non UTF-8 path: {:?}", raw)))
    }
}
