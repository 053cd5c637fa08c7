//! `autoiso build` driven end to end against a scripted `xorriso`.

#![allow(clippy::expect_used)]

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;

/// Answers `-version`, fabricates a GRUB tree on extract and concatenates
/// the patched boot config and user-data into the output on repack.
#[cfg(unix)]
const FAKE_XORRISO: &str = r#"#!/bin/sh
case "$1" in
  -version)
    echo "xorriso 1.5.6 : RockRidge filesystem manipulator, libburnia project."
    exit 0
    ;;
  -osirrox)
    for last in "$@"; do :; done
    mkdir -p "$last/boot/grub/i386-pc" "$last/casper"
    printf 'menuentry "Install" {\n  linux /casper/vmlinuz quiet ---\n}\n' > "$last/boot/grub/grub.cfg"
    printf 'eltorito' > "$last/boot/grub/i386-pc/eltorito.img"
    exit 0
    ;;
  -as)
    out=""
    prev=""
    for arg in "$@"; do
      if [ "$prev" = "-o" ]; then out="$arg"; fi
      prev="$arg"
      tree="$arg"
    done
    cat "$tree/boot/grub/grub.cfg" "$tree/nocloud/user-data" > "$out"
    exit 0
    ;;
esac
echo "unexpected arguments: $*" >&2
exit 64
"#;

struct Sandbox {
    dir: tempfile::TempDir,
}

impl Sandbox {
    fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = dir.path().join("ubuntu-24.04-live-server-amd64.iso");
        std::fs::write(&source, b"not really an image").expect("write source");
        Self { dir }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn source(&self) -> PathBuf {
        self.path().join("ubuntu-24.04-live-server-amd64.iso")
    }

    fn config(&self) -> PathBuf {
        self.path().join("config.yaml")
    }

    fn autoiso(&self) -> Command {
        let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("autoiso"));
        cmd.env("NO_COLOR", "1")
            .env("AUTOISO_CONFIG", self.config())
            .current_dir(self.path());
        cmd
    }

    fn pin_tool(&self, tool: &Path) {
        self.autoiso()
            .args(["config", "set", "tool.path"])
            .arg(tool)
            .assert()
            .success();
    }

    #[cfg(unix)]
    fn install_fake_tool(&self) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let tool = self.path().join("xorriso");
        std::fs::write(&tool, FAKE_XORRISO).expect("write tool");
        std::fs::set_permissions(&tool, std::fs::Permissions::from_mode(0o755)).expect("chmod");
        self.pin_tool(&tool);
        tool
    }
}

#[test]
fn test_missing_tool_reports_guidance() {
    let sb = Sandbox::new();
    sb.pin_tool(&sb.path().join("no-such-xorriso"));
    sb.autoiso()
        .args(["build", "--username", "dev", "--hostname", "devbox", "--source"])
        .arg(sb.source())
        .assert()
        .failure()
        .stderr(predicate::str::contains("xorriso is not available"))
        .stderr(predicate::str::contains("xorriso"));
}

#[test]
fn test_missing_tool_json_code() {
    let sb = Sandbox::new();
    sb.pin_tool(&sb.path().join("no-such-xorriso"));
    let output = sb
        .autoiso()
        .args(["--json", "build", "--username", "dev", "--hostname", "devbox", "--source"])
        .arg(sb.source())
        .output()
        .expect("run");
    assert!(!output.status.success());
    let v: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(v["code"], "TOOLING_UNAVAILABLE");
}

#[cfg(unix)]
#[test]
fn test_build_end_to_end() {
    let sb = Sandbox::new();
    sb.install_fake_tool();
    let output = sb.path().join("out").join("devbox.iso");
    let staging = sb.path().join("staging");

    sb.autoiso()
        .args(["build", "--username", "dev", "--hostname", "devbox"])
        .args(["--ssh-key", "ssh-ed25519 AAAAC3Nza dev@laptop"])
        .arg("--source")
        .arg(sb.source())
        .arg("--output")
        .arg(&output)
        .arg("--staging-dir")
        .arg(&staging)
        .assert()
        .success()
        .stdout(predicate::str::contains("Autoinstall image ready"))
        .stdout(predicate::str::contains("UBUNTU_AUTOINSTALL_24_04"));

    let image = std::fs::read_to_string(&output).expect("output image");
    assert!(image.contains(r"autoinstall ds=nocloud\;s=/cdrom/nocloud/ ---"));
    assert!(image.contains("#cloud-config"));
    assert!(image.contains("hostname: devbox"));

    let sidecar = std::fs::read_to_string(sb.path().join("out").join("devbox.iso.sha256"))
        .expect("checksum sidecar");
    assert!(sidecar.ends_with("  devbox.iso\n"));
    assert_eq!(sidecar.split_whitespace().next().map(str::len), Some(64));

    let leftovers: Vec<_> = std::fs::read_dir(&staging).expect("staging").collect();
    assert!(leftovers.is_empty(), "work area must be removed");
}

#[cfg(unix)]
#[test]
fn test_build_json_without_checksum() {
    let sb = Sandbox::new();
    sb.install_fake_tool();

    let run = sb
        .autoiso()
        .args(["--json", "build", "--username", "dev", "--hostname", "devbox"])
        .arg("--no-checksum")
        .arg("--source")
        .arg(sb.source())
        .output()
        .expect("run");
    assert!(run.status.success(), "{}", String::from_utf8_lossy(&run.stderr));

    let v: serde_json::Value = serde_json::from_slice(&run.stdout).expect("valid JSON");
    let expected = sb.path().join("ubuntu-24.04-live-server-amd64-autoinstall.iso");
    assert_eq!(v["output"], expected.display().to_string());
    assert_eq!(v["boot"]["bios"], "grub");
    assert_eq!(v["boot"]["uefi"], false);
    assert!(v["sha256"].is_null());
    assert!(expected.is_file());
    assert!(!sb.path().join("ubuntu-24.04-live-server-amd64-autoinstall.iso.sha256").exists());
}

#[cfg(unix)]
#[test]
fn test_build_missing_source_is_invalid_input() {
    let sb = Sandbox::new();
    sb.install_fake_tool();
    let output = sb
        .autoiso()
        .args(["--json", "build", "--username", "dev", "--hostname", "devbox", "--source"])
        .arg(sb.path().join("missing.iso"))
        .output()
        .expect("run");
    assert!(!output.status.success());
    let v: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(v["code"], "INVALID_INPUT");
    assert!(
        v["message"]
            .as_str()
            .expect("message")
            .contains("source image not found")
    );
}

#[cfg(unix)]
#[test]
fn test_build_without_profile_identity_fails_before_extraction() {
    let sb = Sandbox::new();
    sb.install_fake_tool();
    let staging = sb.path().join("staging");
    sb.autoiso()
        .args(["build", "--hostname", "devbox", "--source"])
        .arg(sb.source())
        .arg("--staging-dir")
        .arg(&staging)
        .assert()
        .failure()
        .stderr(predicate::str::contains("username"));
    assert!(!staging.exists(), "no work area before validation passes");
}
