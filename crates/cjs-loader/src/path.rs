// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! POSIX path algebra on strings.
//!
//! Module identities are strings (`module.filename`, cache keys), so path
//! handling stays in `&str` land rather than `std::path`, whose component
//! model does not agree with Node's `path.posix` on edge cases such as
//! `dirname("file\\here.js")`. Only `/` is a separator.

/// Path segment separator
pub const SEP: char = '/';

/// path.isAbsolute(path)
pub fn is_absolute(path: &str) -> bool {
    path.starts_with(SEP)
}

/// path.normalize(path), without trailing-slash preservation
pub fn normalize(path: &str) -> String {
    let absolute = is_absolute(path);
    let mut components: Vec<&str> = Vec::new();

    for component in path.split(SEP) {
        match component {
            "" | "." => continue,
            ".." => {
                if !components.is_empty() && components.last() != Some(&"..") {
                    components.pop();
                } else if !absolute {
                    components.push("..");
                }
            }
            c => components.push(c),
        }
    }

    let joined = components.join("/");
    if absolute {
        format!("/{}", joined)
    } else if joined.is_empty() {
        ".".to_string()
    } else {
        joined
    }
}

/// path.join(base, segment)
pub fn join(base: &str, segment: &str) -> String {
    match (base.is_empty(), segment.is_empty()) {
        (true, true) => ".".to_string(),
        (true, false) => normalize(segment),
        (false, true) => normalize(base),
        (false, false) => normalize(&format!("{}/{}", base, segment)),
    }
}

/// path.resolve(base, path) where `base` is already absolute
pub fn resolve(base: &str, path: &str) -> String {
    if is_absolute(path) {
        normalize(path)
    } else if path.is_empty() {
        normalize(base)
    } else {
        normalize(&format!("{}/{}", base, path))
    }
}

/// path.dirname(path)
pub fn dirname(path: &str) -> String {
    if path.is_empty() {
        return ".".to_string();
    }
    let bytes = path.as_bytes();
    let has_root = bytes[0] == b'/';
    let mut end = None;
    let mut matched_slash = true;

    for i in (1..bytes.len()).rev() {
        if bytes[i] == b'/' {
            if !matched_slash {
                end = Some(i);
                break;
            }
        } else {
            matched_slash = false;
        }
    }

    match end {
        None if has_root => "/".to_string(),
        None => ".".to_string(),
        Some(1) if has_root => "//".to_string(),
        Some(end) => path[..end].to_string(),
    }
}

/// path.basename(path)
pub fn basename(path: &str) -> &str {
    let trimmed = path.trim_end_matches(SEP);
    match trimmed.rfind(SEP) {
        Some(idx) => &trimmed[idx + 1..],
        None => trimmed,
    }
}

/// path.extname(path)
pub fn extname(path: &str) -> &str {
    let base = basename(path);
    match base.rfind('.') {
        Some(0) | None => "",
        Some(idx) => &base[idx..],
    }
}

/// Whether a request is written relative to the requiring module
/// (`.`, `..`, `./x`, `../x`).
pub fn is_relative_request(request: &str) -> bool {
    request == "."
        || request == ".."
        || request.starts_with("./")
        || request.starts_with("../")
}

/// Whether a request can only name a directory (`./dir/`, `..`, `x/.`)
pub fn names_directory(request: &str) -> bool {
    request.ends_with(SEP)
        || request == "."
        || request == ".."
        || request.ends_with("/.")
        || request.ends_with("/..")
}
