//! `autoiso render`: preview the first-boot documents without an image.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;

use crate::app::AppContext;
use crate::commands::{InstallArgs, ProfileArgs};
use crate::domain::autoinstall::AutoinstallDocumentBuilder;
use crate::domain::bootloader::{META_DATA_FILE, USER_DATA_FILE};
use crate::domain::options::ImageOptions;

/// Arguments for the render command.
#[derive(Args, Debug)]
pub struct RenderArgs {
    #[command(flatten)]
    pub install: InstallArgs,

    #[command(flatten)]
    pub profile: ProfileArgs,

    /// Write user-data and meta-data into DIR instead of printing
    #[arg(long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,
}

/// Run the render command.
///
/// # Errors
///
/// Returns an error for an invalid profile or choice, or if the documents
/// cannot be written.
pub fn run(app: &AppContext, args: &RenderArgs) -> Result<ExitCode> {
    let profile = args.profile.resolve()?;
    let mut options = ImageOptions::default();
    args.install.apply(&mut options);
    options.validate_choices()?;

    let documents = AutoinstallDocumentBuilder::new();
    let user_data = documents
        .generate(Some(&profile), Some(&options))?
        .to_user_data()
        .context("serializing autoinstall document")?;
    let meta_data = documents.generate_meta_data();

    if let Some(dir) = &args.out_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("cannot create {}", dir.display()))?;
        for (name, bytes) in [(USER_DATA_FILE, &user_data), (META_DATA_FILE, &meta_data)] {
            let path = dir.join(name);
            std::fs::write(&path, bytes)
                .with_context(|| format!("cannot write {}", path.display()))?;
        }
    }

    app.renderer().render_documents(
        &String::from_utf8_lossy(&user_data),
        &String::from_utf8_lossy(&meta_data),
        args.out_dir.as_deref(),
    )?;
    Ok(ExitCode::SUCCESS)
}
