// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! CommonJS function wrapper

/// Opening half of the wrapper (`Module.wrapper[0]`)
pub const WRAPPER_HEAD: &str = "(function (exports, require, module, __filename, __dirname) { ";

/// Closing half of the wrapper (`Module.wrapper[1]`)
pub const WRAPPER_TAIL: &str = "\n});";

/// Wrap module source in the CommonJS function wrapper.
///
/// `None` produces the wrapper around the text `undefined`.
pub fn wrap(script: Option<&str>) -> String {
    let body = script.unwrap_or("undefined");
    let mut out = String::with_capacity(WRAPPER_HEAD.len() + body.len() + WRAPPER_TAIL.len());
    out.push_str(WRAPPER_HEAD);
    out.push_str(body);
    out.push_str(WRAPPER_TAIL);
    out
}

/// Recover the body from text produced by [`wrap`]
pub fn unwrap_body(wrapped: &str) -> Option<&str> {
    wrapped
        .strip_prefix(WRAPPER_HEAD)
        .and_then(|rest| rest.strip_suffix(WRAPPER_TAIL))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_without_script() {
        assert_eq!(
            wrap(None),
            "(function (exports, require, module, __filename, __dirname) { undefined\n});"
        );
    }

    #[test]
    fn test_wrap_round_trip() {
        let body = "exports.foo = 1; return 42";
        let wrapped = wrap(Some(body));
        assert!(wrapped.starts_with(WRAPPER_HEAD));
        assert_eq!(unwrap_body(&wrapped), Some(body));
        assert_eq!(unwrap_body("exports.foo = 1"), None);
    }
}
