//! Integration tests for the winsvc-agent command surface.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// A command isolated from the user's configuration.
pub fn agent(home: &TempDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("winsvc-agent"));
    cmd.env("NO_COLOR", "1")
        .env("WINSVC_AGENT_CONFIG", home.path().join("config.yaml"))
        .env_remove("WINSVC_AGENT_DISABLE_AUTO_UPDATE")
        .env_remove("JAVA_HOME")
        .env_remove("RUST_LOG");
    cmd
}

fn home() -> TempDir {
    tempfile::tempdir().unwrap()
}

// --- Help and version tests ---

#[test]
fn test_cli_no_args_shows_help_and_exits_two() {
    let home = home();
    agent(&home).assert().code(2).stderr(predicate::str::contains(
        "Install and keep current the service wrapper",
    ));
}

#[test]
fn test_cli_help_lists_commands() {
    let home = home();
    let output = agent(&home).arg("--help").assert().success().get_output().stdout.clone();
    let help = String::from_utf8(output).unwrap();
    for name in ["install", "update", "render", "service-id", "config", "version"] {
        assert!(help.contains(name), "missing {name} in:\n{help}");
    }
}

#[test]
fn test_update_help_hides_platform_override() {
    let home = home();
    agent(&home)
        .args(["update", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--identity"))
        .stdout(predicate::str::contains("assume-windows").not());
}

#[test]
fn test_version_command_shows_version() {
    let home = home();
    agent(&home)
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("winsvc-agent 0.1.0"));
}

#[test]
fn test_version_command_json_lists_bundled_resources() {
    let home = home();
    let output = agent(&home)
        .args(["--json", "version"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let value: serde_json::Value = serde_json::from_slice(&output).expect("valid JSON");
    assert_eq!(value["version"], "0.1.0");
    let bundled = value["bundled"].as_array().expect("bundled array");
    assert!(bundled.iter().any(|n| n == "agent-service.xml"));
    assert!(bundled.iter().any(|n| n == "agent-service.exe.config"));
}

#[test]
fn test_unknown_command_exits_with_error() {
    let home = home();
    agent(&home)
        .arg("nonexistent")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

// --- service-id ---

#[cfg(unix)]
#[test]
fn test_service_id_replaces_separators() {
    let home = home();
    agent(&home)
        .args(["service-id", "/srv/agent"])
        .assert()
        .success()
        .stdout("agentsvc-_srv_agent\n");
}

#[cfg(unix)]
#[test]
fn test_service_id_prefix_flag_and_json() {
    let home = home();
    agent(&home)
        .args(["--json", "service-id", "/srv/agent", "--prefix", "ci"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""service_id":"ci-_srv_agent""#));
}

#[test]
fn test_service_id_rejects_invalid_prefix() {
    let home = home();
    agent(&home)
        .args(["service-id", "agent", "--prefix", "bad prefix"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid value"));
}

// --- render ---

#[cfg(unix)]
#[test]
fn test_render_prints_crlf_descriptor() {
    let home = home();
    let output = agent(&home)
        .args(["render", "--root", "/srv/agent", "--java", "java", "--", "-url", "https://ci"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let xml = String::from_utf8(output).unwrap();
    assert!(xml.contains("<id>agentsvc-_srv_agent</id>\r\n"), "{xml}");
    assert!(xml.contains("<executable>java</executable>"));
    assert!(xml.contains(r#"-jar "%BASE%\agent.jar" -url https://ci</arguments>"#));
    assert!(!xml.replace("\r\n", "").contains('\n'));
    assert!(xml.contains("<!-- <download from=\"TODO:payloadJarURL\""));
}

#[test]
fn test_render_https_payload_url_enables_download() {
    let home = home();
    agent(&home)
        .args([
            "render",
            "--root",
            "agent",
            "--payload-url",
            "https://ci.example/jnlpJars/agent.jar?a=1&b=2",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            r#"<download from="https://ci.example/jnlpJars/agent.jar?a=1&amp;b=2" to="%BASE%\agent.jar"/>"#,
        ))
        .stdout(predicate::str::contains("<!-- <download").not());
}

#[test]
fn test_render_http_payload_url_is_commented_out() {
    let home = home();
    agent(&home)
        .args(["render", "--root", "agent", "--payload-url", "http://ci/agent.jar"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            r#"<!-- <download from="http://ci/agent.jar" to="%BASE%\agent.jar"/> -->"#,
        ));
}

#[test]
fn test_render_writes_output_file() {
    let home = home();
    let out = home.path().join("agent-service.xml");
    agent(&home)
        .args(["render", "--root", "agent", "--output"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote"));
    let xml = std::fs::read_to_string(&out).unwrap();
    assert!(xml.starts_with("<!--\r\n"));
}

#[test]
fn test_render_rejects_lowercase_macro_name() {
    let home = home();
    agent(&home)
        .args(["render", "--root", "agent", "--macro", "lower=x"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("invalid macro name"));
}

#[test]
fn test_render_unresolved_override_template_fails() {
    let home = home();
    let bundle = home.path().join("bundle");
    std::fs::create_dir(&bundle).unwrap();
    std::fs::write(
        bundle.join("agent-service.xml"),
        "<service><id>@ID@</id><x>@CUSTOM@</x><y>@PAYLOAD_DOWNLOAD@</y></service>\n",
    )
    .unwrap();
    std::fs::write(
        home.path().join("config.yaml"),
        format!("bundle:\n  dir: {}\n", bundle.display()),
    )
    .unwrap();

    // CUSTOM is not required, so it is left alone.
    agent(&home)
        .args(["render", "--root", "agent"])
        .assert()
        .success()
        .stdout(predicate::str::contains("<x>@CUSTOM@</x>"));

    // Once its value refers to a macro nobody supplies, rendering fails.
    agent(&home)
        .args(["--json", "render", "--root", "agent", "--macro", "CUSTOM=@AGENT_SECRET@"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("UNRESOLVED_MACROS"))
        .stderr(predicate::str::contains(
            "Unresolved macros in the XML file: AGENT_SECRET",
        ));
}

// --- install ---

#[cfg(unix)]
#[test]
fn test_install_on_non_windows_host_reports_missing_prerequisite() {
    let home = home();
    let root = home.path().join("agent");
    agent(&home)
        .args(["--json", "install", "--yes"])
        .arg(&root)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("PREREQUISITE_MISSING"))
        .stderr(predicate::str::contains(".NET Framework"));
    assert!(!root.exists());
}
