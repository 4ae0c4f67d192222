//! First-time installation flow with doubled prerequisites and controller.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::fs;
use std::path::Path;

use winsvc_agent::application::services::provision::{
    InstallPorts, InstallRequest, install_service,
};
use winsvc_agent::domain::{InstallError, TemplateError};
use winsvc_agent::domain::layout::{DESCRIPTOR, PAYLOAD_JAR, WRAPPER_CONFIG, WRAPPER_EXE};
use winsvc_agent::domain::template::DescriptorRequest;
use winsvc_agent::infra::fs::LocalFs;
use winsvc_agent::infra::shutdown::ShutdownSequence;

use crate::mocks::{
    FixedPrerequisites, MemBundle, RecordingController, RecordingReporter, exe_with_version,
};

fn request(root: &Path) -> InstallRequest {
    InstallRequest {
        root: root.to_path_buf(),
        descriptor: DescriptorRequest {
            service_id: "agentsvc-test".to_string(),
            java: "java".to_string(),
            vm_args: None,
            args: "-url https://ci".to_string(),
            ..DescriptorRequest::default()
        },
        payload_jar: None,
        payload_url: Ok(Some("https://ci/jnlpJars/agent.jar".to_string())),
    }
}

#[tokio::test]
async fn test_install_deploys_files_and_defers_start() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("agent");
    let jar = dir.path().join("payload.jar");
    fs::write(&jar, b"PK jar").unwrap();

    let bundle = MemBundle::with_exe(exe_with_version(2, 0, 0));
    let controller = RecordingController::default();
    let shutdown = ShutdownSequence::new();
    let reporter = RecordingReporter::default();
    let ports = InstallPorts {
        prerequisites: &FixedPrerequisites(None),
        fs: &LocalFs,
        bundle: &bundle,
        controller: &controller,
        deferred: &shutdown,
        reporter: &reporter,
    };
    let mut req = request(&root);
    req.payload_jar = Some(jar);

    let outcome = install_service(&ports, req).await.unwrap();

    assert_eq!(outcome.service_id, "agentsvc-test");
    assert!(outcome.payload_copied);
    assert_eq!(fs::read(root.join(WRAPPER_EXE)).unwrap(), exe_with_version(2, 0, 0));
    assert!(root.join(WRAPPER_CONFIG).is_file());
    assert_eq!(fs::read(root.join(PAYLOAD_JAR)).unwrap(), b"PK jar");

    let xml = fs::read_to_string(root.join(DESCRIPTOR)).unwrap();
    assert!(xml.contains("<id>agentsvc-test</id>\r\n"));
    assert!(xml.contains("<download from=\"https://ci/jnlpJars/agent.jar\""));
    assert!(!xml.contains('@'), "{xml}");

    // Only install runs inline; start waits for the shutdown sequence.
    assert_eq!(controller.subcommands(), ["install"]);
    assert_eq!(shutdown.len(), 1);
    shutdown.drain().await;
    assert_eq!(controller.subcommands(), ["install", "start"]);
}

#[tokio::test]
async fn test_install_keeps_existing_payload() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join(PAYLOAD_JAR), b"existing").unwrap();
    let other = dir.path().join("other.jar");
    fs::write(&other, b"other").unwrap();

    let bundle = MemBundle::with_exe(exe_with_version(2, 0, 0));
    let controller = RecordingController::default();
    let ports = InstallPorts {
        prerequisites: &FixedPrerequisites(None),
        fs: &LocalFs,
        bundle: &bundle,
        controller: &controller,
        deferred: &ShutdownSequence::new(),
        reporter: &RecordingReporter::default(),
    };
    let mut req = request(dir.path());
    req.payload_jar = Some(other);

    let outcome = install_service(&ports, req).await.unwrap();

    assert!(!outcome.payload_copied);
    assert_eq!(fs::read(dir.path().join(PAYLOAD_JAR)).unwrap(), b"existing");
}

#[tokio::test]
async fn test_install_without_payload_warns() {
    let dir = tempfile::tempdir().unwrap();
    let bundle = MemBundle::with_exe(exe_with_version(2, 0, 0));
    let reporter = RecordingReporter::default();
    let ports = InstallPorts {
        prerequisites: &FixedPrerequisites(None),
        fs: &LocalFs,
        bundle: &bundle,
        controller: &RecordingController::default(),
        deferred: &ShutdownSequence::new(),
        reporter: &reporter,
    };

    let outcome = install_service(&ports, request(dir.path())).await.unwrap();

    assert!(!outcome.payload_copied);
    let warnings = reporter.warnings();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains(PAYLOAD_JAR));
}

#[tokio::test]
async fn test_missing_prerequisite_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("agent");
    let bundle = MemBundle::with_exe(exe_with_version(2, 0, 0));
    let controller = RecordingController::default();
    let ports = InstallPorts {
        prerequisites: &FixedPrerequisites(Some(".NET Framework 2.0 or later")),
        fs: &LocalFs,
        bundle: &bundle,
        controller: &controller,
        deferred: &ShutdownSequence::new(),
        reporter: &RecordingReporter::default(),
    };

    let err = install_service(&ports, request(&root)).await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<InstallError>(),
        Some(InstallError::PrerequisiteMissing { .. })
    ));
    assert!(!root.exists());
    assert!(controller.subcommands().is_empty());
}

#[tokio::test]
async fn test_uncreatable_root_is_root_creation_error() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("file");
    fs::write(&blocker, b"not a directory").unwrap();
    let bundle = MemBundle::with_exe(exe_with_version(2, 0, 0));
    let ports = InstallPorts {
        prerequisites: &FixedPrerequisites(None),
        fs: &LocalFs,
        bundle: &bundle,
        controller: &RecordingController::default(),
        deferred: &ShutdownSequence::new(),
        reporter: &RecordingReporter::default(),
    };

    let err = install_service(&ports, request(&blocker.join("agent")))
        .await
        .unwrap_err();

    assert!(
        matches!(
            err.downcast_ref::<InstallError>(),
            Some(InstallError::RootCreation { .. })
        ),
        "{err:#}"
    );
}

#[tokio::test]
async fn test_failed_install_is_fatal_and_nothing_deferred() {
    let dir = tempfile::tempdir().unwrap();
    let bundle = MemBundle::with_exe(exe_with_version(2, 0, 0));
    let shutdown = ShutdownSequence::new();
    let ports = InstallPorts {
        prerequisites: &FixedPrerequisites(None),
        fs: &LocalFs,
        bundle: &bundle,
        controller: &RecordingController::exiting("install", 1060),
        deferred: &shutdown,
        reporter: &RecordingReporter::default(),
    };

    let err = install_service(&ports, request(dir.path())).await.unwrap_err();

    match err.downcast_ref::<InstallError>() {
        Some(InstallError::ServiceInstall { code, output }) => {
            assert_eq!(code, "1060");
            assert_eq!(output, "install exited 1060");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(shutdown.is_empty());
}

#[tokio::test]
async fn test_failed_start_is_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let bundle = MemBundle::with_exe(exe_with_version(2, 0, 0));
    let controller = RecordingController::exiting("start", 1);
    let shutdown = ShutdownSequence::new();
    let ports = InstallPorts {
        prerequisites: &FixedPrerequisites(None),
        fs: &LocalFs,
        bundle: &bundle,
        controller: &controller,
        deferred: &shutdown,
        reporter: &RecordingReporter::default(),
    };

    install_service(&ports, request(dir.path())).await.unwrap();
    shutdown.drain().await;

    assert_eq!(controller.subcommands(), ["install", "start"]);
}

#[tokio::test]
async fn test_unresolved_template_macro_fails_before_install() {
    let dir = tempfile::tempdir().unwrap();
    let bundle = MemBundle::with_exe(exe_with_version(2, 0, 0));
    let controller = RecordingController::default();
    let ports = InstallPorts {
        prerequisites: &FixedPrerequisites(None),
        fs: &LocalFs,
        bundle: &bundle,
        controller: &controller,
        deferred: &ShutdownSequence::new(),
        reporter: &RecordingReporter::default(),
    };
    let root = dir.path().join("agent");
    let mut req = request(&root);
    req.descriptor.explicit.insert(
        "PAYLOAD_DOWNLOAD".to_string(),
        "<download from=\"@AGENT_URL@\"/>".to_string(),
    );

    let err = install_service(&ports, req).await.unwrap_err();

    assert_eq!(
        err.downcast_ref::<TemplateError>(),
        Some(&TemplateError::UnresolvedMacros {
            names: vec!["AGENT_URL".to_string()]
        })
    );
    assert!(controller.subcommands().is_empty());
    assert!(!root.exists(), "nothing may be written on a template error");
}

#[tokio::test]
async fn test_missing_bundled_config_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("agent");
    let bundle = MemBundle::with_exe(exe_with_version(2, 0, 0)).without(WRAPPER_CONFIG);
    let controller = RecordingController::default();
    let ports = InstallPorts {
        prerequisites: &FixedPrerequisites(None),
        fs: &LocalFs,
        bundle: &bundle,
        controller: &controller,
        deferred: &ShutdownSequence::new(),
        reporter: &RecordingReporter::default(),
    };

    let err = install_service(&ports, request(&root)).await.unwrap_err();

    assert!(
        matches!(
            err.downcast_ref::<TemplateError>(),
            Some(TemplateError::MissingResource { .. })
        ),
        "{err:#}"
    );
    assert!(!root.exists());
    assert!(controller.subcommands().is_empty());
}
