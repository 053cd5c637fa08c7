//! Shared mock infrastructure for unit tests.
//!
//! `FakeXorriso` stands in for the real tool: `-extract` fabricates an
//! extracted tree, `-as mkisofs` writes a small output file and snapshots
//! the tree it was asked to pack.

#![allow(dead_code, clippy::expect_used)]

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Output};
use std::time::Duration;

use anyhow::Result;
use autoiso::application::ports::{CommandRunner, ProgressReporter};
use tokio_util::sync::CancellationToken;

// ── Cross-platform ExitStatus construction ───────────────────────────────────

#[cfg(unix)]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;
    ExitStatus::from_raw(code << 8)
}

#[cfg(windows)]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;
    #[allow(clippy::cast_sign_loss)]
    ExitStatus::from_raw(code as u32)
}

// ── Output constructors ──────────────────────────────────────────────────────

pub fn ok_output(stdout: &[u8]) -> Output {
    Output {
        status: exit_status(0),
        stdout: stdout.to_vec(),
        stderr: Vec::new(),
    }
}

pub fn err_output(code: i32, stderr: &[u8]) -> Output {
    Output {
        status: exit_status(code),
        stdout: Vec::new(),
        stderr: stderr.to_vec(),
    }
}

pub const XORRISO_BANNER: &[u8] =
    b"xorriso 1.5.6 : RockRidge filesystem manipulator, libburnia project.\n";

pub const GRUB_CFG: &str = "\
set timeout=30
menuentry \"Try or Install Ubuntu Server\" {
\tset gfxpayload=keep
\tlinux\t/casper/vmlinuz  ---
\tinitrd\t/casper/initrd
}
";

pub const LOOPBACK_CFG: &str = "\
menuentry \"Try or Install Ubuntu Server\" {
\tlinux\t/casper/vmlinuz iso-scan/filename=${iso_path} ---
}
";

// ── Fake source trees ────────────────────────────────────────────────────────

/// Shape of the tree `-extract` fabricates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SourceTree {
    /// 20.04+ style: GRUB for BIOS and UEFI, loopback config present.
    #[default]
    Grub,
    /// GRUB tree without a loopback config.
    GrubNoLoopback,
    /// GRUB tree whose loopback config has no kernel separator.
    GrubLoopbackWithoutSeparator,
    /// GRUB tree whose loopback config is not valid UTF-8.
    GrubLoopbackNotUtf8,
    /// Older ISOLINUX tree with an EFI image.
    Isolinux,
    /// No recognised boot configuration at all.
    NoBootConfig,
    /// Primary boot config present but without a kernel separator.
    NoSeparator,
    /// Primary config already carrying the autoinstall fragment.
    AlreadyPatched,
}

fn write(root: &Path, rel: &str, content: &[u8]) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("mkdir");
    }
    std::fs::write(path, content).expect("write");
}

/// Populate `root` like an extracted Ubuntu server image.
pub fn fabricate_tree(root: &Path, kind: SourceTree) {
    write(root, "casper/vmlinuz", b"kernel");
    write(root, ".disk/info", b"Ubuntu-Server 24.04 LTS");
    match kind {
        SourceTree::Grub
        | SourceTree::GrubNoLoopback
        | SourceTree::GrubLoopbackWithoutSeparator
        | SourceTree::GrubLoopbackNotUtf8
        | SourceTree::AlreadyPatched
        | SourceTree::NoSeparator => {
            write(root, "boot/grub/i386-pc/eltorito.img", b"eltorito");
            write(root, "boot/grub/i386-pc/boot_hybrid.img", b"mbr");
            write(root, "boot/grub/efi.img", b"efi");
        }
        SourceTree::Isolinux => {
            write(root, "isolinux/isolinux.bin", b"isolinux");
            write(root, "isolinux/isohdpfx.bin", b"mbr");
            write(root, "boot/grub/efi.img", b"efi");
        }
        SourceTree::NoBootConfig => {}
    }
    match kind {
        SourceTree::Grub => {
            write(root, "boot/grub/grub.cfg", GRUB_CFG.as_bytes());
            write(root, "boot/grub/loopback.cfg", LOOPBACK_CFG.as_bytes());
        }
        SourceTree::GrubNoLoopback => {
            write(root, "boot/grub/grub.cfg", GRUB_CFG.as_bytes());
        }
        SourceTree::GrubLoopbackWithoutSeparator => {
            write(root, "boot/grub/grub.cfg", GRUB_CFG.as_bytes());
            write(root, "boot/grub/loopback.cfg", b"source /boot/grub/grub.cfg\n");
        }
        SourceTree::GrubLoopbackNotUtf8 => {
            write(root, "boot/grub/grub.cfg", GRUB_CFG.as_bytes());
            write(root, "boot/grub/loopback.cfg", b"\xff\xfe linux /casper/vmlinuz ---\n");
        }
        SourceTree::Isolinux => {
            write(
                root,
                "isolinux/txt.cfg",
                b"label live\n  kernel /casper/vmlinuz\n  append initrd=/casper/initrd quiet ---\n",
            );
        }
        SourceTree::NoSeparator => {
            write(root, "boot/grub/grub.cfg", b"menuentry \"x\" {\n\tlinux /casper/vmlinuz quiet\n}\n");
        }
        SourceTree::AlreadyPatched => {
            let patched = GRUB_CFG.replace(
                "---",
                r"autoinstall ds=nocloud\;s=/cdrom/nocloud/ ---",
            );
            write(root, "boot/grub/grub.cfg", patched.as_bytes());
        }
        SourceTree::NoBootConfig => {}
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        // Extracted images are read-only.
        for rel in ["boot/grub/grub.cfg", "isolinux/txt.cfg", "casper/vmlinuz"] {
            let path = root.join(rel);
            if path.exists() {
                std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o444))
                    .expect("chmod");
            }
        }
    }
}

/// What the tree looked like when repack was invoked.
#[derive(Debug, Clone, Default)]
pub struct RepackSnapshot {
    pub tree: PathBuf,
    pub output: PathBuf,
    pub primary_cfg: Option<String>,
    pub loopback_cfg: Option<String>,
    pub user_data: Option<String>,
    pub meta_data: Option<Vec<u8>>,
}

fn read_opt(path: &Path) -> Option<String> {
    std::fs::read_to_string(path).ok()
}

// ── Fake xorriso ─────────────────────────────────────────────────────────────

/// Scripted stand-in for the mastering tool.
#[derive(Default)]
pub struct FakeXorriso {
    pub tree: SourceTree,
    pub fail_extract: bool,
    pub fail_repack: bool,
    /// Repack "succeeds" without writing anything.
    pub empty_repack: bool,
    /// Banner printed by `-version`; `None` prints nothing useful.
    pub banner: Option<Vec<u8>>,
    /// Fired while extracting, as if the user hit Ctrl-C mid-stage.
    pub cancel_during_extract: Option<CancellationToken>,
    pub calls: RefCell<Vec<Vec<String>>>,
    pub snapshot: RefCell<Option<RepackSnapshot>>,
}

impl FakeXorriso {
    pub fn new(tree: SourceTree) -> Self {
        Self {
            tree,
            banner: Some(XORRISO_BANNER.to_vec()),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.borrow().clone()
    }

    /// Calls other than the version probe.
    pub fn mastering_calls(&self) -> Vec<Vec<String>> {
        self.calls()
            .into_iter()
            .filter(|c| c.get(1).map(String::as_str) != Some("-version"))
            .collect()
    }

    pub fn snapshot(&self) -> RepackSnapshot {
        self.snapshot.borrow().clone().expect("repack was invoked")
    }

    fn record(&self, program: &str, args: &[&str]) {
        let mut call = vec![program.to_string()];
        call.extend(args.iter().map(ToString::to_string));
        self.calls.borrow_mut().push(call);
    }

    fn extract(&self, args: &[&str]) -> Output {
        if self.fail_extract {
            return err_output(5, b"xorriso : FAILURE : Cannot determine attributes of source file");
        }
        let dest = Path::new(args.last().expect("destination"));
        fabricate_tree(dest, self.tree);
        if let Some(token) = &self.cancel_during_extract {
            token.cancel();
        }
        ok_output(b"xorriso : UPDATE : 42 files restored")
    }

    fn repack(&self, args: &[&str]) -> Output {
        let out_idx = args.iter().position(|a| *a == "-o").expect("-o flag") + 1;
        let output = PathBuf::from(args[out_idx]);
        let tree = PathBuf::from(args.last().expect("tree"));
        *self.snapshot.borrow_mut() = Some(RepackSnapshot {
            primary_cfg: read_opt(&tree.join("boot/grub/grub.cfg"))
                .or_else(|| read_opt(&tree.join("isolinux/txt.cfg"))),
            loopback_cfg: read_opt(&tree.join("boot/grub/loopback.cfg")),
            user_data: read_opt(&tree.join("nocloud/user-data")),
            meta_data: std::fs::read(tree.join("nocloud/meta-data")).ok(),
            tree,
            output: output.clone(),
        });
        if self.fail_repack {
            if let Some(parent) = output.parent() {
                // Real xorriso leaves a truncated file behind on failure.
                let _ = std::fs::create_dir_all(parent);
                let _ = std::fs::write(&output, b"partial");
            }
            return err_output(32, b"libisofs: FAILURE : Image size exceeds limit");
        }
        if !self.empty_repack {
            std::fs::write(&output, b"ISO9660 image bytes").expect("write output");
        }
        ok_output(b"")
    }
}

impl CommandRunner for FakeXorriso {
    async fn run(
        &self,
        program: &str,
        args: &[&str],
        cancel: &CancellationToken,
    ) -> Result<Output> {
        self.record(program, args);
        if cancel.is_cancelled() {
            anyhow::bail!("{program} cancelled");
        }
        if args.contains(&"-extract") {
            return Ok(self.extract(args));
        }
        if args.first() == Some(&"-as") {
            return Ok(self.repack(args));
        }
        anyhow::bail!("unexpected invocation: {args:?}")
    }

    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        _timeout: Duration,
    ) -> Result<Output> {
        self.record(program, args);
        match (&self.banner, args) {
            (Some(banner), ["-version"]) => Ok(ok_output(banner)),
            (None, ["-version"]) => Ok(ok_output(b"")),
            _ => anyhow::bail!("unexpected probe: {args:?}"),
        }
    }
}

/// Create an executable-looking file for `ToolDetector::at`.
pub fn fake_tool(dir: &Path) -> PathBuf {
    let path = dir.join("xorriso");
    std::fs::write(&path, b"#!/bin/sh\n").expect("write tool");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).expect("chmod");
    }
    path
}

// ── Recording reporter ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Step(String),
    Success(String),
    Warn(String),
}

#[derive(Default)]
pub struct RecordingReporter {
    pub events: RefCell<Vec<Event>>,
}

impl RecordingReporter {
    pub fn warnings(&self) -> Vec<String> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| match e {
                Event::Warn(m) => Some(m.clone()),
                _ => None,
            })
            .collect()
    }
}

impl ProgressReporter for RecordingReporter {
    fn step(&self, message: &str) {
        self.events.borrow_mut().push(Event::Step(message.to_string()));
    }
    fn success(&self, message: &str) {
        self.events
            .borrow_mut()
            .push(Event::Success(message.to_string()));
    }
    fn warn(&self, message: &str) {
        self.events.borrow_mut().push(Event::Warn(message.to_string()));
    }
}
