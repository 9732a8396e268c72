//! Replaceable behaviors: resolve, require, compile, run-main, extensions

mod common;

use cjs_loader::{Module, ModuleError, ModuleSystem, Require, Value};
use common::{Fixture, bump, count, counter, set};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[test]
fn test_compile_returns_body_result() {
    let fx = Fixture::new();
    fx.engine.register_source("module.exports = 'replaced'", |args| {
        args.module.set_exports(Value::from("replaced"));
        Ok(Value::Undefined)
    });
    fx.engine.register_source("return where", |args| {
        Ok(Value::from(format!("{}|{}", args.filename, args.dirname)))
    });

    let module = fx.system.create_module("anonymous", None);
    let before = module.exports();
    let result = module
        .compile("module.exports = 'replaced'", "/synthetic/file.js")
        .unwrap();
    assert!(result.is_undefined());
    assert_ne!(module.exports(), before);
    assert_eq!(module.exports(), Value::from("replaced"));

    let result = module.compile("return where", "/synthetic/dir/file.js").unwrap();
    assert_eq!(result, Value::from("/synthetic/dir/file.js|/synthetic/dir"));
}

#[test]
fn test_compile_passes_the_module_arguments() {
    let fx = Fixture::new();
    let module = fx.system.create_module("args", None);
    let expected = module.clone();
    fx.engine.register_source("inspect", move |args| {
        assert!(args.module.ptr_eq(&expected));
        assert!(args.require.module().ptr_eq(&expected));
        assert_eq!(args.exports, expected.exports());
        Ok(Value::Boolean(true))
    });
    assert_eq!(module.compile("inspect", "/x/y.js").unwrap(), Value::Boolean(true));
}

#[test]
fn test_compile_override_sees_every_load() {
    let fx = Fixture::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let log = seen.clone();
    fx.system.set_compile(move |module, content, filename| {
        log.lock().push(filename.to_string());
        Module::default_compile(module, content, filename)
    });

    fx.module("a.js", |args| {
        set(&args.exports, "a", true);
        Ok(Value::Undefined)
    });
    let exports = fx.require().call("./a").unwrap();
    assert_eq!(exports.get("a"), Value::Boolean(true));
    assert_eq!(seen.lock().as_slice(), &[fx.path("a.js")]);
}

#[test]
fn test_resolve_override_applies_to_loaded_modules() {
    let fx = Fixture::new();
    let saved: Arc<Mutex<Option<Require>>> = Arc::new(Mutex::new(None));
    let slot = saved.clone();
    fx.module("early.js", move |args| {
        *slot.lock() = Some(args.require.clone());
        Ok(Value::Undefined)
    });
    let target = fx.module("target.js", |args| {
        args.module.set_exports(Value::from("target"));
        Ok(Value::Undefined)
    });

    fx.require().call("./early").unwrap();
    let early_require = saved.lock().clone().unwrap();
    assert!(early_require.call("virtual").unwrap_err().is_not_found());

    let previous = fx
        .system
        .set_resolve_filename(move |system, request, parent, is_main, options| {
            if request == "virtual" {
                return Ok(target.clone());
            }
            ModuleSystem::default_resolve_filename(system, request, parent, is_main, options)
        });

    assert_eq!(early_require.call("virtual").unwrap(), Value::from("target"));
    assert_eq!(early_require.resolve("virtual").unwrap(), fx.path("target.js"));

    fx.system
        .set_resolve_filename(move |s, r, p, m, o| previous(s, r, p, m, o));
    assert!(early_require.resolve("virtual").unwrap_err().is_not_found());
    assert!(early_require.call("virtual").is_err());
}

#[test]
fn test_require_override_is_shared_by_all_modules() {
    let fx = Fixture::new();
    let previous = fx.system.set_require(|module, request| {
        if request == "magic" {
            return Ok(Value::from("magic!"));
        }
        Module::default_require(module, request)
    });

    fx.module("user.js", |args| {
        let magic = args.require("magic")?;
        set(&args.exports, "magic", magic);
        Ok(Value::Undefined)
    });
    let req = fx.require();
    assert_eq!(req.call("magic").unwrap(), Value::from("magic!"));
    assert_eq!(req.call("./user").unwrap().get("magic"), Value::from("magic!"));
    assert_eq!(req.as_function().call(&[Value::from("magic")]).unwrap(), Value::from("magic!"));

    fx.system.set_require(move |m, r| previous(m, r));
    assert!(req.call("magic").unwrap_err().is_not_found());
}

#[test]
fn test_run_main_override_chains() {
    let fx = Fixture::new();
    let ran = counter();
    let r = ran.clone();
    fx.module("main.js", move |args| {
        bump(&r);
        assert_eq!(args.module.id(), ".");
        assert!(args.require.main().unwrap().ptr_eq(args.module));
        Ok(Value::Undefined)
    });

    let wrapped = Arc::new(AtomicBool::new(false));
    let flag = wrapped.clone();
    let previous = fx.system.run_main_hook();
    fx.system.set_run_main(move |system, entry| {
        flag.store(true, Ordering::SeqCst);
        previous(system, entry)
    });

    fx.system.run_main("main.js").unwrap();
    assert!(wrapped.load(Ordering::SeqCst));
    assert_eq!(count(&ran), 1);

    let main = fx.system.main().unwrap();
    assert_eq!(main.id(), ".");
    assert_eq!(main.filename().as_deref(), Some(fx.path("main.js").as_str()));
    assert!(fx.require().main().unwrap().ptr_eq(&main));
}

#[test]
fn test_run_main_override_that_never_delegates() {
    let fx = Fixture::new();
    let ran = counter();
    let r = ran.clone();
    fx.module("main.js", move |_| {
        bump(&r);
        Ok(Value::Undefined)
    });
    fx.system.set_run_main(|_, _| Ok(()));
    fx.system.run_main("main.js").unwrap();
    assert_eq!(count(&ran), 0);
    assert!(fx.system.main().is_none());
}

#[test]
fn test_preload_runs_before_main() {
    let fx = Fixture::new();
    let order = Arc::new(Mutex::new(Vec::new()));
    let log = order.clone();
    fx.module("setup.js", move |args| {
        log.lock().push("setup");
        assert_eq!(args.module.parent().unwrap().id(), "internal/preload");
        Ok(Value::Undefined)
    });
    let log = order.clone();
    fx.module("main.js", move |_| {
        log.lock().push("main");
        Ok(Value::Undefined)
    });

    fx.system.preload(&["./setup.js"]).unwrap();
    fx.system.run_main("main.js").unwrap();
    assert_eq!(order.lock().as_slice(), &["setup", "main"]);
    assert!(fx.system.cache().has(&fx.path("setup.js")));
}

#[test]
fn test_extensions_are_shared() {
    let fx = Fixture::new();
    let req = fx.require();
    assert!(req.extensions().ptr_eq(&fx.system.extensions()));
    assert!(req.cache().ptr_eq(&fx.system.cache()));

    req.extensions().insert(".txt", |module, filename| {
        let text = std::fs::read_to_string(filename)?;
        module.set_exports(Value::from(text.trim().to_string()));
        Ok(())
    });
    assert!(fx.system.extensions().contains(".txt"));

    let notes = fx.write("notes.txt", "hello\n");
    assert_eq!(req.resolve("./notes").unwrap(), notes);
    assert_eq!(req.call("./notes").unwrap(), Value::from("hello"));
}

#[test]
fn test_unknown_extension_uses_js_handler() {
    let fx = Fixture::new();
    fx.module("script.coffee", |args| {
        set(&args.exports, "via", "js");
        Ok(Value::Undefined)
    });
    let exports = fx.require().call("./script.coffee").unwrap();
    assert_eq!(exports.get("via"), Value::from("js"));
}

#[test]
fn test_replaced_js_handler_is_used() {
    let fx = Fixture::new();
    let runs = counter();
    let r = runs.clone();
    fx.system.extensions().insert(".js", move |module, _| {
        bump(&r);
        module.set_exports(Value::Null);
        Ok(())
    });
    fx.write("plain.js", "");
    assert_eq!(fx.require().call("./plain").unwrap(), Value::Null);
    assert_eq!(count(&runs), 1);
}

#[test]
fn test_unregistered_body_is_a_script_error() {
    let fx = Fixture::new();
    fx.write("orphan.js", "");
    let err = fx.require().call("./orphan").unwrap_err();
    assert!(matches!(err, ModuleError::Script { .. }));
}
