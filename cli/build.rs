/// Assemble `$OUT_DIR/bundle/` so `include_dir!()` always has a directory.
///
/// The descriptor template and wrapper config come from `assets/`. The
/// wrapper executable itself is not checked in; when `WINSVC_WRAPPER_EXE`
/// points at a release binary at build time it is embedded too, otherwise
/// it must be supplied at runtime through `bundle.dir`.
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const WRAPPER_EXE: &str = "agent-service.exe";

fn main() {
    let manifest: PathBuf = env!("CARGO_MANIFEST_DIR").into();
    let out: PathBuf = env::var_os("OUT_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| panic!("OUT_DIR not set"));
    let bundle = out.join("bundle");

    fs::create_dir_all(&bundle).unwrap_or_else(|e| panic!("create {}: {e}", bundle.display()));
    copy_assets(&manifest.join("assets"), &bundle);

    if let Some(exe) = env::var_os("WINSVC_WRAPPER_EXE") {
        let exe = PathBuf::from(exe);
        fs::copy(&exe, bundle.join(WRAPPER_EXE))
            .unwrap_or_else(|e| panic!("copy {}: {e}", exe.display()));
    } else {
        // Drop an executable embedded by an earlier build.
        let _ = fs::remove_file(bundle.join(WRAPPER_EXE));
    }

    println!("cargo::rerun-if-changed=assets");
    println!("cargo::rerun-if-env-changed=WINSVC_WRAPPER_EXE");
}

fn copy_assets(from: &Path, to: &Path) {
    let entries = fs::read_dir(from).unwrap_or_else(|e| panic!("read {}: {e}", from.display()));
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_file() {
            let name = entry.file_name();
            fs::copy(&path, to.join(&name))
                .unwrap_or_else(|e| panic!("copy {}: {e}", path.display()));
        }
    }
}
