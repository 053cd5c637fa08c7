//! End-to-end build pipeline: tool check → validate → extract → generate →
//! inject → patch bootloader → repack.
//!
//! Every stage runs to completion before the next one starts. Any failure
//! aborts the build; the work area is removed on every exit path and the
//! final output path is only ever written by an atomic rename.

use std::path::{Path, PathBuf};

use tokio_util::sync::CancellationToken;

use crate::application::ports::{CommandRunner, ProgressReporter};
use crate::domain::autoinstall::AutoinstallDocumentBuilder;
use crate::domain::bootloader::{
    BootLayout, DATASOURCE_DIR, META_DATA_FILE, PRIMARY_BOOT_CONFIGS, PatchOutcome,
    SECONDARY_BOOT_CONFIG, USER_DATA_FILE, find_primary_boot_config, patch_boot_config,
};
use crate::domain::error::{BuildError, BuildStage};
use crate::domain::options::ImageOptions;
use crate::domain::profile::UserProfile;

use super::mastering::{Xorriso, path_str};
use super::tool::ToolDetector;
use super::workarea::WorkArea;

/// What a successful build produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOutcome {
    pub output: PathBuf,
    pub size: u64,
    pub volume_id: String,
    pub boot: BootLayout,
}

/// Orchestrates one image build at a time.
pub struct ImageBuilder<'a, R: CommandRunner, P: ProgressReporter> {
    detector: ToolDetector<R>,
    documents: AutoinstallDocumentBuilder,
    staging_root: PathBuf,
    reporter: &'a P,
    cancel: CancellationToken,
}

impl<'a, R: CommandRunner, P: ProgressReporter> ImageBuilder<'a, R, P> {
    pub fn new(detector: ToolDetector<R>, staging_root: impl Into<PathBuf>, reporter: &'a P) -> Self {
        Self {
            detector,
            documents: AutoinstallDocumentBuilder::new(),
            staging_root: staging_root.into(),
            reporter,
            cancel: CancellationToken::new(),
        }
    }

    /// Abort between stages, and kill the running tool, once `token` fires.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// The detector, with whatever the last `build` found.
    #[must_use]
    pub fn detector(&self) -> &ToolDetector<R> {
        &self.detector
    }

    /// Run the whole pipeline.
    ///
    /// `options` is validated in place, so defaulted fields are visible to
    /// the caller afterwards.
    ///
    /// # Errors
    ///
    /// Returns the first [`BuildError`] raised by any stage.
    pub async fn build(
        &mut self,
        profile: &UserProfile,
        options: &mut ImageOptions,
    ) -> Result<BuildOutcome, BuildError> {
        self.enter(BuildStage::ToolCheck)?;
        self.reporter.step("Checking for xorriso...");
        let tool = self.detector.detect().await?.to_path_buf();
        self.reporter.success(&format!(
            "Found {} {}",
            tool.display(),
            self.detector.version().unwrap_or_default()
        ));

        self.enter(BuildStage::OptionValidation)?;
        options.validate()?;
        profile.validate()?;

        self.enter(BuildStage::WorkArea)?;
        let work = WorkArea::create(&self.staging_root)?;

        let result = self.run_stages(&work, &tool, profile, options).await;

        if let Err(e) = work.close() {
            tracing::warn!(error = %e, "work area cleanup failed");
            self.reporter.warn(&format!("Could not remove work area: {e}"));
        }
        result
    }

    async fn run_stages(
        &self,
        work: &WorkArea,
        tool: &Path,
        profile: &UserProfile,
        options: &ImageOptions,
    ) -> Result<BuildOutcome, BuildError> {
        let root = work.path();
        let xorriso = Xorriso::new(self.detector.runner(), path_str(tool)?, &self.cancel);

        self.enter(BuildStage::Extraction)?;
        self.reporter.step(&format!(
            "Extracting {}...",
            options.source_image_path.display()
        ));
        xorriso.extract(&options.source_image_path, root).await?;
        work.make_writable()?;
        self.reporter.success("Source image extracted");

        self.enter(BuildStage::DocumentGeneration)?;
        let document = self.documents.generate(Some(profile), Some(options))?;
        let user_data = document
            .to_user_data()
            .map_err(|e| BuildError::Serialization(e.to_string()))?;
        let meta_data = self.documents.generate_meta_data();

        self.enter(BuildStage::Injection)?;
        inject_documents(root, &user_data, &meta_data)?;
        self.reporter.success(&format!(
            "Autoinstall documents written to /{DATASOURCE_DIR}/"
        ));

        self.enter(BuildStage::BootloaderPatch)?;
        self.patch_bootloader(root)?;

        self.enter(BuildStage::OutputDirectory)?;
        let out_dir = options.output_directory();
        std::fs::create_dir_all(&out_dir).map_err(|e| {
            BuildError::fs(format!("creating output directory {}", out_dir.display()), e)
        })?;

        self.enter(BuildStage::Repack)?;
        let boot = BootLayout::detect(|rel| root.join(rel).is_file());
        if !boot.is_bootable() {
            self.reporter
                .warn("No boot images found in the source; the output will not be bootable");
        }
        let volume_id = options.volume_id();
        self.reporter.step(&format!(
            "Building {}...",
            options.output_image_path.display()
        ));
        let size = repack_atomically(
            &xorriso,
            root,
            &out_dir,
            &options.output_image_path,
            &volume_id,
            &boot,
        )
        .await?;
        self.reporter.success(&format!(
            "Image written to {}",
            options.output_image_path.display()
        ));

        Ok(BuildOutcome {
            output: options.output_image_path.clone(),
            size,
            volume_id,
            boot,
        })
    }

    fn enter(&self, stage: BuildStage) -> Result<(), BuildError> {
        if self.cancel.is_cancelled() {
            return Err(BuildError::Cancelled(stage));
        }
        tracing::debug!(%stage, "entering stage");
        Ok(())
    }

    fn patch_bootloader(&self, root: &Path) -> Result<(), BuildError> {
        let primary = find_primary_boot_config(|rel| root.join(rel).is_file()).ok_or_else(|| {
            BuildError::BootloaderNotFound(format!(
                "none of {} exist in the extracted image",
                PRIMARY_BOOT_CONFIGS.join(", ")
            ))
        })?;

        match patch_file(&root.join(primary))? {
            PatchOutcome::NoSeparator => {
                return Err(BuildError::BootloaderNotFound(format!(
                    "{primary} has no kernel argument separator"
                )));
            }
            PatchOutcome::AlreadyPatched => {
                self.reporter.success(&format!("{primary} already patched"));
            }
            PatchOutcome::Patched(_) => {
                self.reporter.success(&format!("Patched {primary}"));
            }
        }

        let secondary = root.join(SECONDARY_BOOT_CONFIG);
        if !secondary.is_file() {
            tracing::debug!("no {SECONDARY_BOOT_CONFIG} in this image");
            return Ok(());
        }
        match patch_file(&secondary) {
            Ok(PatchOutcome::NoSeparator) => {
                tracing::warn!("{SECONDARY_BOOT_CONFIG} has no kernel argument separator");
                self.reporter.warn(&format!(
                    "{SECONDARY_BOOT_CONFIG} has no kernel argument separator; left unchanged"
                ));
            }
            Ok(_) => tracing::debug!("{SECONDARY_BOOT_CONFIG} patched"),
            Err(e) => {
                tracing::warn!(error = %e, "{SECONDARY_BOOT_CONFIG} patch failed");
                self.reporter
                    .warn(&format!("Could not patch {SECONDARY_BOOT_CONFIG}: {e}"));
            }
        }
        Ok(())
    }
}

/// Write `user-data` and `meta-data` into the data-source directory.
fn inject_documents(root: &Path, user_data: &[u8], meta_data: &[u8]) -> Result<(), BuildError> {
    let dir = root.join(DATASOURCE_DIR);
    std::fs::create_dir_all(&dir)
        .map_err(|e| BuildError::fs(format!("creating {}", dir.display()), e))?;
    for (name, bytes) in [(USER_DATA_FILE, user_data), (META_DATA_FILE, meta_data)] {
        let path = dir.join(name);
        std::fs::write(&path, bytes)
            .map_err(|e| BuildError::fs(format!("writing {}", path.display()), e))?;
    }
    Ok(())
}

/// Apply the autoinstall patch to one boot configuration file in place.
fn patch_file(path: &Path) -> Result<PatchOutcome, BuildError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| BuildError::fs(format!("reading {}", path.display()), e))?;
    let outcome = patch_boot_config(&content);
    if let PatchOutcome::Patched(new) = &outcome {
        std::fs::write(path, new)
            .map_err(|e| BuildError::fs(format!("writing {}", path.display()), e))?;
    }
    Ok(outcome)
}

/// Repack into a scratch directory beside the output, then rename into place.
///
/// The scratch directory is dropped (and removed) on every path, so a
/// failed repack never leaves anything at `output`.
async fn repack_atomically<R: CommandRunner>(
    xorriso: &Xorriso<'_, R>,
    tree: &Path,
    out_dir: &Path,
    output: &Path,
    volume_id: &str,
    boot: &BootLayout,
) -> Result<u64, BuildError> {
    let scratch = tempfile::Builder::new()
        .prefix(".autoiso-repack-")
        .tempdir_in(out_dir)
        .map_err(|e| BuildError::fs(format!("creating scratch dir in {}", out_dir.display()), e))?;
    let file_name = output.file_name().unwrap_or(output.as_os_str());
    let staged = scratch.path().join(file_name);

    xorriso.repack(tree, &staged, volume_id, boot).await?;

    let size = std::fs::metadata(&staged)
        .map_err(|e| BuildError::fs(format!("repack produced no {}", staged.display()), e))?
        .len();
    if size == 0 {
        return Err(BuildError::fs(
            format!("repack produced an empty {}", staged.display()),
            std::io::Error::other("zero-length image"),
        ));
    }

    replace_output(&staged, output)?;
    Ok(size)
}

/// Move `staged` over `output`. On Unix the rename replaces an existing
/// image in one step, so the old image stays readable until the new one
/// is in place.
fn replace_output(staged: &Path, output: &Path) -> Result<(), BuildError> {
    // Windows refuses to rename onto an existing file.
    #[cfg(not(unix))]
    {
        if output.exists() {
            std::fs::remove_file(output)
                .map_err(|e| BuildError::fs(format!("replacing {}", output.display()), e))?;
        }
    }
    std::fs::rename(staged, output)
        .map_err(|e| BuildError::fs(format!("moving image to {}", output.display()), e))
}
