//! Tool behaviour tests
//!
//! Drive every built-in tool through the dispatcher against either the
//! stateful [`FakeConan`] or a [`ScriptedRunner`] that records the exact
//! command line.

use std::path::Path;
use std::sync::Arc;

use conan_exec::{ExecError, MissingProgram, ProcessRunner};
use conan_mcp::{Conan, Dispatcher, Error, ToolRequest, ToolResult, builtin_registry};
use conan_test_utils::fake::linux_settings;
use conan_test_utils::{FakeConan, ScriptedRunner};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tempfile::TempDir;

fn dispatcher_for(runner: Arc<dyn conan_exec::CommandRunner>, work_dir: &Path) -> Dispatcher {
    let conan = Arc::new(Conan::new(runner, work_dir));
    Dispatcher::new(Arc::new(builtin_registry(conan).unwrap()))
}

fn request(tool: &str, arguments: Value) -> ToolRequest {
    ToolRequest::from_value(tool, arguments).unwrap()
}

// ==========================================================================
// Profiles
// ==========================================================================

#[tokio::test]
async fn test_get_default_profile() {
    let temp = TempDir::new().unwrap();
    let fake = Arc::new(FakeConan::new());
    let dispatcher = dispatcher_for(fake.clone(), temp.path());

    let profile = dispatcher
        .try_dispatch(request("get_conan_profile", json!({})))
        .await
        .unwrap();

    assert_eq!(profile["host"]["settings"]["build_type"], "Release");
    assert_eq!(fake.calls()[0].value_of("--profile"), None);
}

#[tokio::test]
async fn test_get_named_profile() {
    let temp = TempDir::new().unwrap();
    let fake = Arc::new(FakeConan::new().with_profile("debug", linux_settings("Debug")));
    let dispatcher = dispatcher_for(fake.clone(), temp.path());

    let profile = dispatcher
        .try_dispatch(request("get_conan_profile", json!({"profile": "debug"})))
        .await
        .unwrap();

    assert_eq!(profile["host"]["settings"]["build_type"], "Debug");
    assert_eq!(fake.calls()[0].value_of("--profile"), Some("debug"));
}

#[tokio::test]
async fn test_get_unknown_profile_is_profile_not_found() {
    let temp = TempDir::new().unwrap();
    let dispatcher = dispatcher_for(Arc::new(FakeConan::new()), temp.path());

    let err = dispatcher
        .try_dispatch(request("get_conan_profile", json!({"profile": "nonexistent"})))
        .await
        .unwrap_err();

    match err {
        Error::ProfileNotFound(name) => assert_eq!(name, "nonexistent"),
        other => panic!("expected ProfileNotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn test_null_profile_means_default() {
    let temp = TempDir::new().unwrap();
    let fake = Arc::new(FakeConan::new());
    let dispatcher = dispatcher_for(fake.clone(), temp.path());

    dispatcher
        .try_dispatch(request("get_conan_profile", json!({"profile": null})))
        .await
        .unwrap();

    assert!(!fake.calls()[0].has_arg("--profile"));
}

#[tokio::test]
async fn test_profile_show_command_line() {
    let temp = TempDir::new().unwrap();
    let runner = Arc::new(ScriptedRunner::new().ok("{\"host\": {}, \"build\": {}}"));
    let dispatcher = dispatcher_for(runner.clone(), temp.path());

    dispatcher
        .try_dispatch(request("get_conan_profile", json!({"profile": "arm"})))
        .await
        .unwrap();

    assert_eq!(
        runner.single_call_args(),
        ["profile", "show", "--format=json", "--profile", "arm"]
    );
    assert_eq!(runner.calls()[0].get_current_dir(), Some(temp.path()));
}

#[tokio::test]
async fn test_list_profiles_keeps_manager_order() {
    let temp = TempDir::new().unwrap();
    let fake = FakeConan::new()
        .with_profile("zeta", linux_settings("Release"))
        .with_profile("alpha", linux_settings("Debug"));
    let dispatcher = dispatcher_for(Arc::new(fake), temp.path());

    let names = dispatcher
        .try_dispatch(request("list_conan_profiles", json!({})))
        .await
        .unwrap();

    assert_eq!(names, json!(["default", "zeta", "alpha"]));
}

#[tokio::test]
async fn test_list_profiles_empty() {
    let temp = TempDir::new().unwrap();
    let runner = Arc::new(ScriptedRunner::new().ok("[]"));
    let dispatcher = dispatcher_for(runner, temp.path());

    let names = dispatcher
        .try_dispatch(request("list_conan_profiles", json!({})))
        .await
        .unwrap();

    assert_eq!(names, json!([]));
}

#[tokio::test]
async fn test_listed_profile_round_trips() {
    let temp = TempDir::new().unwrap();
    let fake = FakeConan::new()
        .with_profile("armv8", linux_settings("Release"))
        .with_profile("debug", linux_settings("Debug"));
    let dispatcher = dispatcher_for(Arc::new(fake), temp.path());

    let names = dispatcher
        .try_dispatch(request("list_conan_profiles", json!({})))
        .await
        .unwrap();

    for name in names.as_array().unwrap() {
        let profile = dispatcher
            .try_dispatch(request("get_conan_profile", json!({"profile": name})))
            .await
            .unwrap_or_else(|e| panic!("listed profile {name} not found: {e}"));
        assert!(profile["host"]["settings"].is_object(), "{name}: {profile}");
    }
}

#[tokio::test]
async fn test_default_profile_matches_named_default() {
    let temp = TempDir::new().unwrap();
    let dispatcher = dispatcher_for(Arc::new(FakeConan::new()), temp.path());

    let implicit = dispatcher
        .try_dispatch(request("get_conan_profile", json!({})))
        .await
        .unwrap();
    let named = dispatcher
        .try_dispatch(request("get_conan_profile", json!({"profile": "default"})))
        .await
        .unwrap();

    assert_eq!(implicit, named);
}

// ==========================================================================
// conan_new
// ==========================================================================

#[tokio::test]
async fn test_conan_new_creates_files() {
    let temp = TempDir::new().unwrap();
    let dispatcher = dispatcher_for(Arc::new(FakeConan::new()), temp.path());

    let payload = dispatcher
        .try_dispatch(request(
            "conan_new",
            json!({"template": "cmake_lib", "name": "mylib", "output_dir": "mylib"}),
        ))
        .await
        .unwrap();

    let project = temp.path().join("mylib");
    assert!(project.join("conanfile.py").is_file());
    assert!(project.join("src/mylib.cpp").is_file());
    assert_eq!(payload["template"], "cmake_lib");
    assert_eq!(payload["version"], "1.0");
    assert_eq!(payload["output_dir"], project.display().to_string());
    let created = payload["created_files"].as_array().unwrap();
    assert!(created.contains(&json!("conanfile.py")));
    assert!(created.contains(&json!("CMakeLists.txt")));
    assert!(payload.get("warning").is_none());
}

#[tokio::test]
async fn test_conan_new_refuses_to_overwrite() {
    let temp = TempDir::new().unwrap();
    let fake = Arc::new(FakeConan::new());
    let dispatcher = dispatcher_for(fake.clone(), temp.path());
    let args = json!({"template": "cmake_exe", "name": "app"});

    dispatcher
        .try_dispatch(request("conan_new", args.clone()))
        .await
        .unwrap();
    std::fs::write(temp.path().join("conanfile.py"), "# edited").unwrap();

    let err = dispatcher
        .try_dispatch(request("conan_new", args))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::FileExists(_)), "got {err:?}");
    assert_eq!(
        std::fs::read_to_string(temp.path().join("conanfile.py")).unwrap(),
        "# edited"
    );
}

#[tokio::test]
async fn test_conan_new_force_overwrites() {
    let temp = TempDir::new().unwrap();
    let fake = Arc::new(FakeConan::new());
    let dispatcher = dispatcher_for(fake.clone(), temp.path());
    std::fs::write(temp.path().join("conanfile.py"), "# old").unwrap();

    dispatcher
        .try_dispatch(request(
            "conan_new",
            json!({"template": "basic", "name": "pkg", "force": true}),
        ))
        .await
        .unwrap();

    assert!(fake.calls()[0].has_arg("--force"));
    let content = std::fs::read_to_string(temp.path().join("conanfile.py")).unwrap();
    assert!(content.contains("name = \"pkg\""));
}

#[tokio::test]
async fn test_conan_new_invalid_template_never_runs_conan() {
    let temp = TempDir::new().unwrap();
    let fake = Arc::new(FakeConan::new());
    let dispatcher = dispatcher_for(fake.clone(), temp.path());

    let err = dispatcher
        .try_dispatch(request(
            "conan_new",
            json!({"template": "gradle_app", "name": "x"}),
        ))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::InvalidTemplate(ref t) if t == "gradle_app"));
    assert!(err.to_string().contains("cmake_lib"));
    assert_eq!(fake.call_count(), 0);
    assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_conan_new_missing_name_never_runs_conan() {
    let temp = TempDir::new().unwrap();
    let fake = Arc::new(FakeConan::new());
    let dispatcher = dispatcher_for(fake.clone(), temp.path());

    let err = dispatcher
        .try_dispatch(request("conan_new", json!({"template": "cmake_lib"})))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::MissingParameter(ref p) if p == "name"));
    assert_eq!(fake.call_count(), 0);
}

#[tokio::test]
async fn test_conan_new_wrong_type_for_force() {
    let temp = TempDir::new().unwrap();
    let fake = Arc::new(FakeConan::new());
    let dispatcher = dispatcher_for(fake.clone(), temp.path());

    let result = dispatcher
        .dispatch(request(
            "conan_new",
            json!({"template": "cmake_lib", "name": "x", "force": "yes"}),
        ))
        .await;

    match result {
        ToolResult::Failure(message) => {
            assert!(message.contains("force"), "got: {message}");
            assert!(message.contains("boolean"), "got: {message}");
        }
        ToolResult::Success(v) => panic!("expected failure, got {v}"),
    }
    assert_eq!(fake.call_count(), 0);
}

#[tokio::test]
async fn test_conan_new_requires_command_line_and_warning() {
    let temp = TempDir::new().unwrap();
    let runner = Arc::new(ScriptedRunner::new().ok("File saved: conanfile.py\n"));
    let dispatcher = dispatcher_for(runner.clone(), temp.path());

    let payload = dispatcher
        .try_dispatch(request(
            "conan_new",
            json!({
                "template": "cmake_lib",
                "name": "mylib",
                "version": "2.1",
                "requires": ["fmt/12.0.0", "openssl/3.6.0"]
            }),
        ))
        .await
        .unwrap();

    assert_eq!(
        runner.single_call_args(),
        [
            "new",
            "cmake_lib",
            "-d",
            "name=mylib",
            "-d",
            "version=2.1",
            "-d",
            "requires=fmt/12.0.0",
            "-d",
            "requires=openssl/3.6.0"
        ]
    );
    assert_eq!(payload["created_files"], json!(["conanfile.py"]));
    let warning = payload["warning"].as_str().unwrap();
    assert!(warning.contains("fmt/12.0.0"));
    assert!(warning.contains("list_conan_packages"));
}

#[tokio::test]
async fn test_conan_new_repeat_then_force() {
    let temp = TempDir::new().unwrap();
    let fake = Arc::new(FakeConan::new());
    let dispatcher = dispatcher_for(fake.clone(), temp.path());
    let args = json!({
        "template": "cmake_exe",
        "name": "app",
        "requires": ["fmt/12.0.0"],
        "output_dir": "fresh"
    });
    let project = temp.path().join("fresh");
    assert!(!project.exists());

    let payload = dispatcher
        .try_dispatch(request("conan_new", args.clone()))
        .await
        .unwrap();
    assert!(project.join("conanfile.py").is_file());
    assert!(project.join("CMakeLists.txt").is_file());
    assert!(project.join("src/main.cpp").is_file());
    assert!(payload["warning"].as_str().unwrap().contains("fmt/12.0.0"));

    let err = dispatcher
        .try_dispatch(request("conan_new", args.clone()))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::FileExists(_)), "got {err:?}");

    let mut forced = args;
    forced["force"] = json!(true);
    let payload = dispatcher
        .try_dispatch(request("conan_new", forced))
        .await
        .unwrap();
    assert_eq!(payload["output_dir"], project.display().to_string());
    assert!(fake.calls()[2].has_arg("--force"));
    assert_eq!(fake.call_count(), 3);
}

// ==========================================================================
// list_conan_packages
// ==========================================================================

#[tokio::test]
async fn test_list_packages_defaults() {
    let temp = TempDir::new().unwrap();
    let runner = Arc::new(ScriptedRunner::new().ok("{\"conancenter\": {}}"));
    let dispatcher = dispatcher_for(runner.clone(), temp.path());

    let result = dispatcher
        .try_dispatch(request("list_conan_packages", json!({"name": "zlib"})))
        .await
        .unwrap();

    assert_eq!(result, json!({"conancenter": {}}));
    assert_eq!(
        runner.single_call_args(),
        ["list", "zlib/*", "--format=json", "--remote", "*"]
    );
}

#[tokio::test]
async fn test_list_packages_with_filters() {
    let temp = TempDir::new().unwrap();
    let runner = Arc::new(ScriptedRunner::new().ok("{}"));
    let dispatcher = dispatcher_for(runner.clone(), temp.path());

    dispatcher
        .try_dispatch(request(
            "list_conan_packages",
            json!({
                "name": "zlib",
                "version": "1.2.11",
                "remote": "conancenter",
                "filter_settings": ["arch=armv8", "os=Windows"],
                "filter_options": ["*:shared=True"]
            }),
        ))
        .await
        .unwrap();

    assert_eq!(
        runner.single_call_args(),
        [
            "list",
            "zlib/1.2.11:*",
            "--format=json",
            "--remote",
            "conancenter",
            "-fs",
            "arch=armv8",
            "-fs",
            "os=Windows",
            "-fo",
            "*:shared=True"
        ]
    );
}

#[tokio::test]
async fn test_list_packages_comma_separated_filters() {
    let temp = TempDir::new().unwrap();
    let runner = Arc::new(ScriptedRunner::new().ok("{}"));
    let dispatcher = dispatcher_for(runner.clone(), temp.path());

    dispatcher
        .try_dispatch(request(
            "list_conan_packages",
            json!({
                "name": "zlib",
                "remote": "",
                "filter_settings": "arch=armv8,os=Windows",
                "filter_options": "*:shared=True"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(
        runner.single_call_args(),
        [
            "list",
            "zlib/*",
            "--format=json",
            "-fs",
            "arch=armv8",
            "-fs",
            "os=Windows",
            "-fo",
            "*:shared=True"
        ]
    );
}

#[tokio::test]
async fn test_list_packages_full_reference() {
    let temp = TempDir::new().unwrap();
    let runner = Arc::new(ScriptedRunner::new().ok("{}"));
    let dispatcher = dispatcher_for(runner.clone(), temp.path());

    dispatcher
        .try_dispatch(request(
            "list_conan_packages",
            json!({
                "name": "zlib",
                "version": "1.2.11",
                "user": "*",
                "channel": "*",
                "recipe_revision": "*",
                "package_id": "*",
                "package_revision": "*",
                "remote": ""
            }),
        ))
        .await
        .unwrap();

    assert_eq!(
        runner.single_call_args(),
        ["list", "zlib/1.2.11@*/*#*:*#*", "--format=json"]
    );
}

// ==========================================================================
// check_conan_dependencies_licenses
// ==========================================================================

#[tokio::test]
async fn test_licenses_command_line_and_report() {
    let temp = TempDir::new().unwrap();
    let graph = json!({
        "graph": {
            "nodes": {
                "0": {"ref": "conanfile", "context": "host", "license": null},
                "1": {"ref": "fmt/10.0.0", "context": "host", "license": "MIT"},
                "2": {"ref": "cmake/3.28.0", "context": "build", "license": "BSD-3-Clause"}
            },
            "root": {"0": "None"}
        }
    });
    let runner = Arc::new(ScriptedRunner::new().ok(graph.to_string()));
    let dispatcher = dispatcher_for(runner.clone(), temp.path());

    let report = dispatcher
        .try_dispatch(request(
            "check_conan_dependencies_licenses",
            json!({
                "path": "conanfile.py",
                "remote": "conancenter",
                "build_profile": "default",
                "host_profile": "linux"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(report, json!({"fmt/10.0.0": "MIT"}));
    assert_eq!(
        runner.single_call_args(),
        [
            "graph".to_string(),
            "info".to_string(),
            temp.path().join("conanfile.py").display().to_string(),
            "--format=json".to_string(),
            "--remote".to_string(),
            "conancenter".to_string(),
            "-pr:b".to_string(),
            "default".to_string(),
            "-pr:h".to_string(),
            "linux".to_string()
        ]
    );
}

#[tokio::test]
async fn test_licenses_relative_to_work_dir_argument() {
    let temp = TempDir::new().unwrap();
    let runner = Arc::new(ScriptedRunner::new().ok(r#"{"graph": {"nodes": {}, "root": {}}}"#));
    let dispatcher = dispatcher_for(runner.clone(), temp.path());

    dispatcher
        .try_dispatch(request(
            "check_conan_dependencies_licenses",
            json!({"path": "conanfile.txt", "work_dir": "app"}),
        ))
        .await
        .unwrap();

    let expected = temp.path().join("app").join("conanfile.txt");
    assert_eq!(
        runner.single_call_args()[2],
        expected.display().to_string()
    );
}

// ==========================================================================
// Failure classification
// ==========================================================================

#[tokio::test]
async fn test_underlying_error_is_verbatim() {
    let temp = TempDir::new().unwrap();
    let stderr = "ERROR: Unable to connect to remote conancenter";
    let runner = Arc::new(ScriptedRunner::new().fail(1, stderr));
    let dispatcher = dispatcher_for(runner, temp.path());

    let result = dispatcher
        .dispatch(request("list_conan_packages", json!({"name": "zlib"})))
        .await;

    assert_eq!(result, ToolResult::Failure(format!("conan error: {stderr}")));
}

#[tokio::test]
async fn test_missing_executable_is_dependency_unavailable() {
    let temp = TempDir::new().unwrap();
    let dispatcher = dispatcher_for(Arc::new(MissingProgram::new("conan")), temp.path());

    for (tool, args) in [
        ("get_conan_profile", json!({})),
        ("list_conan_profiles", json!({})),
        ("conan_new", json!({"template": "basic", "name": "x"})),
    ] {
        let err = dispatcher
            .try_dispatch(request(tool, args))
            .await
            .unwrap_err();
        assert!(
            matches!(err, Error::DependencyUnavailable(_)),
            "{tool}: got {err:?}"
        );
    }
}

#[cfg(unix)]
#[tokio::test]
async fn test_missing_work_dir_is_not_dependency_unavailable() {
    let temp = TempDir::new().unwrap();
    let work_dir = temp.path().join("removed");
    let dispatcher = dispatcher_for(Arc::new(ProcessRunner::new("/bin/sh")), &work_dir);

    let err = dispatcher
        .try_dispatch(request("list_conan_profiles", json!({})))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Io(_)), "got {err:?}");
    assert!(err.to_string().contains("removed"), "got {err}");
}

#[tokio::test]
async fn test_timeout_is_underlying_error() {
    let temp = TempDir::new().unwrap();
    let runner = Arc::new(ScriptedRunner::new().error(ExecError::Timeout { seconds: 5.0 }));
    let dispatcher = dispatcher_for(runner, temp.path());

    let err = dispatcher
        .try_dispatch(request("list_conan_profiles", json!({})))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::UnderlyingToolError(_)), "got {err:?}");
}

#[tokio::test]
async fn test_unknown_tool() {
    let temp = TempDir::new().unwrap();
    let fake = Arc::new(FakeConan::new());
    let dispatcher = dispatcher_for(fake.clone(), temp.path());

    let err = dispatcher
        .try_dispatch(request("conan_install", json!({})))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::UnknownTool(ref t) if t == "conan_install"));
    assert_eq!(fake.call_count(), 0);
}
