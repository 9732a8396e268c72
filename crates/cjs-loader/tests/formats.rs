//! JSON, addons, foreign modules and createRequire

mod common;

use cjs_loader::interop::MODULE_EXPORTS_KEY;
use cjs_loader::{
    AddonLoader, ForeignModuleLoader, LoaderConfig, ModuleError, ObjectRef, ResolveOptions, Result,
    Value,
};
use common::{Fixture, bump, count, counter, set};
use std::sync::Arc;

struct Namespaces;

impl ForeignModuleLoader for Namespaces {
    fn namespace(&self, filename: &str) -> Result<ObjectRef> {
        let ns = ObjectRef::new();
        if filename.ends_with("cat.mjs") {
            ns.set(MODULE_EXPORTS_KEY, Value::Symbol("meow".into()));
            ns.set("default", "ignored");
        } else if filename.ends_with("answer.js") {
            ns.set("default", 42.0);
        } else {
            ns.set("default", 1.0);
            ns.set("named", 2.0);
        }
        Ok(ns)
    }
}

struct Addons;

impl AddonLoader for Addons {
    fn load(&self, filename: &str) -> Result<Value> {
        let exports = Value::object();
        set(&exports, "addon", filename);
        Ok(exports)
    }
}

#[test]
fn test_json_module() {
    let fx = Fixture::new();
    fx.write("data.json", "\u{feff}{ \"name\": \"cjs\", \"list\": [1, 2] }");
    let req = fx.require();
    let data = req.call("./data").unwrap();
    assert_eq!(data.get("name"), Value::from("cjs"));
    match data.get("list") {
        Value::Array(list) => assert_eq!(list.to_vec(), vec![Value::Number(1.0), Value::Number(2.0)]),
        other => panic!("expected an array, got {:?}", other),
    }
    assert_eq!(req.call("./data.json").unwrap(), data);
}

#[test]
fn test_json_keeps_key_order() {
    let fx = Fixture::new();
    fx.write("pkg.json", r#"{ "zeta": 1, "alpha": { "y": true, "b": false }, "mid": 3 }"#);
    let data = fx.require().call("./pkg.json").unwrap();
    assert_eq!(data.as_object().unwrap().keys(), vec!["zeta", "alpha", "mid"]);
    assert_eq!(data.get("alpha").as_object().unwrap().keys(), vec!["y", "b"]);
}

#[test]
fn test_invalid_json_is_fatal() {
    let fx = Fixture::new();
    let file = fx.write("broken.json", "{ \"a\": ");
    let err = fx.require().call("./broken.json").unwrap_err();
    assert_eq!(err.code(), "ERR_INVALID_MODULE_FORMAT");
    assert!(err.to_string().starts_with(&file));
    assert!(!fx.system.cache().has(&file));
}

#[test]
fn test_addon_requires_loader() {
    let fx = Fixture::new();
    fx.write("native.node", "");
    let err = fx.require().call("./native.node").unwrap_err();
    assert!(matches!(err, ModuleError::ModuleResolution { .. }));

    let fx = Fixture::with(|b| b.addon_loader(Arc::new(Addons)));
    let file = fx.write("native.node", "");
    let exports = fx.require().call("./native").unwrap();
    assert_eq!(exports.get("addon"), Value::from(file));
}

#[test]
fn test_foreign_module_default_like_export() {
    let fx = Fixture::with(|b| b.foreign_loader(Arc::new(Namespaces)));
    fx.write("cat.mjs", "export default 'ignored'");
    fx.write("ns.mjs", "export default 1; export const named = 2;");

    let req = fx.require();
    assert_eq!(req.call("./cat.mjs").unwrap(), Value::Symbol("meow".into()));
    let ns = req.call("./ns.mjs").unwrap();
    assert_eq!(ns.get("named"), Value::Number(2.0));
}

#[test]
fn test_js_follows_package_type() {
    let fx = Fixture::with(|b| b.foreign_loader(Arc::new(Namespaces)));
    fx.write("esm/package.json", r#"{ "type": "module" }"#);
    fx.write("esm/answer.js", "export default 42");
    fx.module("cjs/plain.js", |args| {
        set(&args.exports, "plain", true);
        Ok(Value::Undefined)
    });

    let req = fx.require();
    assert_eq!(req.call("./esm/answer").unwrap(), Value::Number(42.0));
    assert_eq!(req.call("./cjs/plain").unwrap().get("plain"), Value::Boolean(true));
}

#[test]
fn test_foreign_module_without_loader() {
    let fx = Fixture::new();
    fx.write("cat.mjs", "");
    let err = fx.require().call("./cat.mjs").unwrap_err();
    assert_eq!(err.code(), "ERR_UNSUPPORTED_MODULE");
}

#[test]
fn test_create_require_trailing_slash_and_url() {
    let fx = Fixture::new();
    let target = fx.module("sub/x.js", |args| {
        args.module.set_exports(Value::from("x"));
        Ok(Value::Undefined)
    });

    let by_dir = fx.system.create_require(&fx.path("sub/")).unwrap();
    assert_eq!(by_dir.resolve("./x").unwrap(), target);

    let by_file = fx.system.create_require(&fx.path("sub/anything.js")).unwrap();
    assert_eq!(by_file.resolve("./x").unwrap(), target);

    let by_url = fx
        .system
        .create_require(&format!("file://{}", fx.path("sub/")))
        .unwrap();
    assert_eq!(by_url.call("./x").unwrap(), Value::from("x"));
    assert!(by_url.cache().ptr_eq(&by_dir.cache()));
    assert!(by_url.extensions().ptr_eq(&fx.system.extensions()));
}

#[test]
fn test_resolve_builtins_and_paths() {
    let fx = Fixture::new();
    let req = fx.require();
    assert_eq!(req.resolve("fs").unwrap(), "fs");
    assert_eq!(req.resolve("node:fs").unwrap(), "node:fs");
    assert_eq!(req.resolve_paths("fs"), None);
    assert_eq!(req.resolve_paths("./x"), Some(vec![fx.root.clone()]));
    assert_eq!(req.resolve_paths("pkg").unwrap()[0], fx.path("node_modules"));
}

#[test]
fn test_not_found_carries_require_stack() {
    let fx = Fixture::new();
    fx.module("outer.js", |args| args.require("./missing"));
    let err = fx.require().call("./outer").unwrap_err();
    match &err {
        ModuleError::ModuleNotFound {
            request,
            require_stack,
            ..
        } => {
            assert_eq!(request, "./missing");
            assert_eq!(require_stack[0], fx.path("outer.js"));
            assert_eq!(require_stack[1], fx.path("noop.js"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(err.code(), "MODULE_NOT_FOUND");
    assert!(err.to_string().contains("Require stack:"));
}

#[test]
fn test_absolute_not_found_lists_base() {
    let fx = Fixture::new();
    let missing = fx.path("nowhere/../nowhere/thing");
    let err = fx.require().call(&missing).unwrap_err();
    match &err {
        ModuleError::ModuleNotFound { searched, .. } => {
            assert_eq!(searched, &vec![fx.path("nowhere/thing")]);
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(err.to_string().contains("Searched in:"));
}

#[cfg(unix)]
#[test]
fn test_symlink_resolves_to_real_path() {
    let fx = Fixture::new();
    let runs = counter();
    let seen = runs.clone();
    let real = fx.module("real.js", move |_| {
        bump(&seen);
        Ok(Value::Undefined)
    });
    std::os::unix::fs::symlink(&real, fx.path("link.js")).unwrap();

    let req = fx.require();
    assert_eq!(req.resolve("./link").unwrap(), real);
    assert_eq!(req.call("./link").unwrap(), req.call("./real").unwrap());
    assert_eq!(count(&runs), 1);
    assert!(!fx.system.cache().has(&fx.path("link.js")));
}

#[cfg(unix)]
#[test]
fn test_preserve_symlinks_keeps_link_path() {
    let config = LoaderConfig {
        preserve_symlinks: true,
        ..Default::default()
    };
    let fx = Fixture::with(move |b| b.config(config));
    let real = fx.write("real.js", "");
    let link = fx.path("link.js");
    std::os::unix::fs::symlink(&real, &link).unwrap();

    let req = fx.require();
    assert_eq!(req.resolve("./link").unwrap(), link);
    assert_eq!(req.resolve("./real").unwrap(), real);
}

#[test]
fn test_resolve_with_paths_option() {
    let fx = Fixture::new();
    let target = fx.write("vendor/node_modules/dep/index.js", "");
    let req = fx.require();
    assert!(req.resolve("dep").is_err());

    let options = ResolveOptions {
        paths: Some(vec![fx.path("vendor")]),
    };
    assert_eq!(req.resolve_with("dep", &options).unwrap(), target);
}

#[test]
fn test_global_paths_from_config() {
    let dir = tempfile::tempdir().unwrap();
    let global = dir.path().to_str().unwrap().to_string();
    let lib = format!("{}/shared.js", global);
    std::fs::write(&lib, "").unwrap();

    let config = LoaderConfig {
        node_path: vec![global.clone()],
        ..Default::default()
    };
    let fx = Fixture::with(move |b| b.config(config));
    assert_eq!(fx.system.global_paths(), vec![global]);
    assert!(fx.require().resolve("shared").unwrap().ends_with("/shared.js"));
}
