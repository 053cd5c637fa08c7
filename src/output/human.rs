//! Human-readable terminal renderer.

use std::path::Path;

use owo_colors::OwoColorize as _;

use crate::domain::bootloader::{BiosBoot, BootLayout, META_DATA_FILE, USER_DATA_FILE};
use crate::domain::config::AutoisoConfig;
use crate::domain::health::DoctorChecks;
use crate::image::BuildOutcome;
use crate::infra::config::CONFIG_ENV;
use crate::output::OutputContext;

/// Renders results as human-readable terminal output using `OutputContext`.
pub struct HumanRenderer<'a> {
    ctx: &'a OutputContext,
}

impl<'a> HumanRenderer<'a> {
    /// Create a new `HumanRenderer` wrapping the given output context.
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self { ctx }
    }

    /// Render the CLI version information.
    pub fn render_version(&self, version: &str) {
        if self.ctx.quiet {
            return;
        }
        println!("autoiso {version}");
    }

    /// Render a build summary.
    pub fn render_build(&self, outcome: &BuildOutcome, checksum: Option<&str>) {
        if self.ctx.quiet {
            return;
        }
        println!();
        self.ctx.header("Autoinstall image ready");
        println!();
        self.ctx.kv("Output:   ", &outcome.output.display().to_string());
        self.ctx.kv("Size:     ", &format_size(outcome.size));
        self.ctx.kv("Volume ID:", &outcome.volume_id);
        self.ctx.kv("Boot:     ", &format_boot_layout(&outcome.boot));
        if let Some(sum) = checksum {
            self.ctx.kv("SHA-256:  ", sum);
        }
        println!();
    }

    /// Print `user-data` as-is, or confirm where both documents went.
    ///
    /// The document itself is the command's result, so `quiet` does not
    /// suppress it.
    pub fn render_documents(&self, user_data: &str, written_to: Option<&Path>) {
        match written_to {
            Some(dir) => self.ctx.success(&format!(
                "Wrote {USER_DATA_FILE} and {META_DATA_FILE} to {}",
                dir.display()
            )),
            None => print!("{user_data}"),
        }
    }

    /// Render doctor check results.
    pub fn render_doctor(&self, checks: &DoctorChecks, issues: &[String]) {
        println!();
        println!("  {}", "autoiso Health Check".style(self.ctx.styles.header));
        println!();

        println!("  Tooling:");
        if checks.tool.found {
            let path = checks
                .tool
                .path
                .as_deref()
                .map(|p| p.display().to_string())
                .unwrap_or_default();
            let ver = checks.tool.version.as_deref().unwrap_or("unknown");
            self.print_check(true, &format!("xorriso {ver} ({path})"));
        } else {
            let reason = checks.tool.reason.as_deref().unwrap_or("not found");
            self.print_check(false, &format!("xorriso {reason}"));
            if let Some(guidance) = &checks.tool.guidance {
                for line in guidance.lines() {
                    println!("      {line}");
                }
            }
        }
        println!();

        println!("  Environment:");
        self.print_check(
            checks.staging.writable,
            &format!("Staging directory {}", checks.staging.path.display()),
        );
        let config_label = checks.config.path.as_deref().map_or_else(
            || "Configuration file".to_string(),
            |p| format!("Configuration {}", p.display()),
        );
        self.print_check(checks.config.valid, &config_label);
        println!();

        if issues.is_empty() {
            println!(
                "  {} Ready to build images",
                "✓".style(self.ctx.styles.success)
            );
        } else {
            println!(
                "  {} Found {} issue(s):",
                "✗".style(self.ctx.styles.failure),
                issues.len()
            );
            for issue in issues {
                println!("    - {issue}");
            }
        }
        println!();
    }

    /// Render the effective configuration.
    pub fn render_config(&self, config: &AutoisoConfig, path: &Path) {
        println!();
        println!(
            "  {}",
            format!("Configuration ({})", path.display()).style(self.ctx.styles.header)
        );
        println!();
        println!(
            "  {:<20} {}",
            "build.staging_dir:",
            config.staging_dir().display()
        );
        println!("  {:<20} {}", "build.checksum:", config.build.checksum);
        println!(
            "  {:<20} {}",
            "tool.path:",
            config
                .tool
                .path
                .as_deref()
                .map_or_else(|| "(search PATH)".to_string(), |p| p.display().to_string())
        );
        println!();
        println!("  {}", "Environment:".style(self.ctx.styles.label));
        for var in [CONFIG_ENV, "AUTOISO_LOG", "NO_COLOR"] {
            println!(
                "    {:<18} {}",
                format!("{var}:"),
                std::env::var(var).unwrap_or_else(|_| "(not set)".to_string())
            );
        }
        println!();
    }

    fn print_check(&self, ok: bool, msg: &str) {
        if ok {
            println!("    {} {msg}", "✓".style(self.ctx.styles.success));
        } else {
            println!("    {} {msg}", "✗".style(self.ctx.styles.failure));
        }
    }
}

/// One-line description of the boot images carried over into the output.
#[must_use]
pub fn format_boot_layout(layout: &BootLayout) -> String {
    let bios = match layout.bios {
        Some(BiosBoot::Grub { hybrid_mbr: true }) => Some("BIOS (GRUB, hybrid MBR)"),
        Some(BiosBoot::Grub { hybrid_mbr: false }) => Some("BIOS (GRUB)"),
        Some(BiosBoot::Isolinux { hybrid_mbr: true }) => Some("BIOS (ISOLINUX, hybrid MBR)"),
        Some(BiosBoot::Isolinux { hybrid_mbr: false }) => Some("BIOS (ISOLINUX)"),
        None => None,
    };
    match (bios, layout.uefi_image.is_some()) {
        (Some(b), true) => format!("{b} + UEFI"),
        (Some(b), false) => b.to_string(),
        (None, true) => "UEFI".to_string(),
        (None, false) => "not bootable".to_string(),
    }
}

/// Human-readable byte count using binary units.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KiB", "MiB", "GiB", "TiB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = UNITS[0];
    for next in &UNITS[1..] {
        if value < 1024.0 {
            break;
        }
        value /= 1024.0;
        unit = next;
    }
    format!("{value:.1} {unit}")
}
