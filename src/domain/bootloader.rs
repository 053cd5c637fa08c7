//! Boot configuration patching and boot catalog argument computation.
//!
//! Pure functions over file contents and an existence predicate so they can
//! be tested without an extracted image tree.

use std::sync::LazyLock;

use regex::{Captures, Regex};

// ── Data-source layout ───────────────────────────────────────────────────────

/// Directory at the image root the installer probes for its documents.
pub const DATASOURCE_DIR: &str = "nocloud";
pub const USER_DATA_FILE: &str = "user-data";
pub const META_DATA_FILE: &str = "meta-data";

/// Token separating kernel arguments from init arguments.
pub const KERNEL_SEPARATOR: &str = "---";

/// Kernel command-line fragment pointing the installer at the injected
/// data-source directory. The `;` is escaped for GRUB.
pub const AUTOINSTALL_FRAGMENT: &str = r"autoinstall ds=nocloud\;s=/cdrom/nocloud/";

/// Primary boot configuration candidates, in lookup order.
pub const PRIMARY_BOOT_CONFIGS: &[&str] = &[
    "boot/grub/grub.cfg",
    "EFI/boot/grub.cfg",
    "isolinux/txt.cfg",
];

/// Used by the loopback boot path only; not present on every image.
pub const SECONDARY_BOOT_CONFIG: &str = "boot/grub/loopback.cfg";

// ── Patching ─────────────────────────────────────────────────────────────────

#[allow(clippy::expect_used)] // Pattern is a compile-time constant
static SEPARATOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)(^|[ \t])---([ \t\r]|$)").expect("valid separator pattern")
});

/// Result of applying the autoinstall patch to a boot configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchOutcome {
    /// The fragment was inserted; carries the new content.
    Patched(String),
    /// The fragment is already present. Nothing to do.
    AlreadyPatched,
    /// No kernel argument separator found, so there is nowhere to insert.
    NoSeparator,
}

/// Insert [`AUTOINSTALL_FRAGMENT`] immediately before every kernel argument
/// separator, unless the fragment is already present anywhere in `content`.
#[must_use]
pub fn patch_boot_config(content: &str) -> PatchOutcome {
    if content.contains(AUTOINSTALL_FRAGMENT) {
        return PatchOutcome::AlreadyPatched;
    }
    if !SEPARATOR_RE.is_match(content) {
        return PatchOutcome::NoSeparator;
    }
    let patched = SEPARATOR_RE.replace_all(content, |caps: &Captures<'_>| {
        format!(
            "{}{AUTOINSTALL_FRAGMENT} {KERNEL_SEPARATOR}{}",
            &caps[1], &caps[2]
        )
    });
    PatchOutcome::Patched(patched.into_owned())
}

/// First primary boot configuration for which `exists` holds.
pub fn find_primary_boot_config(exists: impl Fn(&str) -> bool) -> Option<&'static str> {
    PRIMARY_BOOT_CONFIGS.iter().copied().find(|p| exists(p))
}

// ── Boot catalog ─────────────────────────────────────────────────────────────

const GRUB_BIOS_IMAGE: &str = "boot/grub/i386-pc/eltorito.img";
const GRUB_HYBRID_MBR: &str = "boot/grub/i386-pc/boot_hybrid.img";
const GRUB_BOOT_CATALOG: &str = "boot.catalog";

const ISOLINUX_BIN: &str = "isolinux/isolinux.bin";
const ISOLINUX_HYBRID_MBR: &str = "isolinux/isohdpfx.bin";
const ISOLINUX_BOOT_CATALOG: &str = "isolinux/boot.cat";

const EFI_IMAGES: &[&str] = &["boot/grub/efi.img", "EFI/boot/efi.img"];

/// Legacy BIOS boot path found in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BiosBoot {
    Grub { hybrid_mbr: bool },
    Isolinux { hybrid_mbr: bool },
}

/// Boot images present in an extracted tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BootLayout {
    pub bios: Option<BiosBoot>,
    pub uefi_image: Option<&'static str>,
}

impl BootLayout {
    /// Inspect the tree through `exists` (paths relative to the tree root).
    pub fn detect(exists: impl Fn(&str) -> bool) -> Self {
        let bios = if exists(GRUB_BIOS_IMAGE) {
            Some(BiosBoot::Grub {
                hybrid_mbr: exists(GRUB_HYBRID_MBR),
            })
        } else if exists(ISOLINUX_BIN) {
            Some(BiosBoot::Isolinux {
                hybrid_mbr: exists(ISOLINUX_HYBRID_MBR),
            })
        } else {
            None
        };
        let uefi_image = EFI_IMAGES.iter().copied().find(|p| exists(p));
        Self { bios, uefi_image }
    }

    #[must_use]
    pub fn is_bootable(&self) -> bool {
        self.bios.is_some() || self.uefi_image.is_some()
    }

    /// `xorriso -as mkisofs` boot arguments.
    ///
    /// `tree_root` is the host path of the extracted tree; hybrid MBR
    /// templates are read from the host, El Torito images from the tree.
    #[must_use]
    pub fn mkisofs_args(&self, tree_root: &str) -> Vec<String> {
        let host = |rel: &str| format!("{}/{rel}", tree_root.trim_end_matches('/'));
        let mut args: Vec<String> = Vec::new();

        match self.bios {
            Some(BiosBoot::Grub { hybrid_mbr }) => {
                if hybrid_mbr {
                    args.extend(["--grub2-mbr".to_string(), host(GRUB_HYBRID_MBR)]);
                }
                args.extend(
                    [
                        "-b",
                        GRUB_BIOS_IMAGE,
                        "-c",
                        GRUB_BOOT_CATALOG,
                        "-no-emul-boot",
                        "-boot-load-size",
                        "4",
                        "-boot-info-table",
                        "--grub2-boot-info",
                    ]
                    .map(String::from),
                );
            }
            Some(BiosBoot::Isolinux { hybrid_mbr }) => {
                if hybrid_mbr {
                    args.extend(["-isohybrid-mbr".to_string(), host(ISOLINUX_HYBRID_MBR)]);
                }
                args.extend(
                    [
                        "-b",
                        ISOLINUX_BIN,
                        "-c",
                        ISOLINUX_BOOT_CATALOG,
                        "-no-emul-boot",
                        "-boot-load-size",
                        "4",
                        "-boot-info-table",
                    ]
                    .map(String::from),
                );
            }
            None => {}
        }

        if let Some(efi) = self.uefi_image {
            args.extend(["-eltorito-alt-boot", "-e", efi, "-no-emul-boot"].map(String::from));
            if matches!(self.bios, Some(BiosBoot::Isolinux { hybrid_mbr: true })) {
                args.push("-isohybrid-gpt-basdat".to_string());
            }
        }

        args
    }
}

// ── Unit tests ───────────────────────────────────────────────────────────────
