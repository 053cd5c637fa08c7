//! SHA-256 sidecar files for built images.

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use sha2::{Digest, Sha256};
use tokio_util::sync::CancellationToken;

/// Compute the SHA256 hex digest of a file.
///
/// Reads the file in 64 KB chunks to avoid loading large images into memory.
///
/// `cancel` is checked between chunks.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or read, or once `cancel`
/// fires.
pub fn sha256_file(path: &Path, cancel: &CancellationToken) -> Result<String> {
    let mut file =
        std::fs::File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; 65536];
    loop {
        if cancel.is_cancelled() {
            bail!("checksum of {} cancelled", path.display());
        }
        let n = file.read(&mut buf).context("reading file")?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex_encode(&hasher.finalize()))
}

/// Write `<image>.sha256` in `sha256sum -c` format and return its path.
///
/// Only the file name is recorded so the pair can be moved together.
///
/// # Errors
///
/// Returns an error if the image cannot be hashed or the sidecar written.
/// Nothing is written when `cancel` fires mid-hash.
pub fn write_sidecar(image: &Path, cancel: &CancellationToken) -> Result<(PathBuf, String)> {
    let hash = sha256_file(image, cancel)?;
    let name = image
        .file_name()
        .context("image path has no file name")?
        .to_string_lossy();
    let mut sidecar = image.as_os_str().to_owned();
    sidecar.push(".sha256");
    let sidecar = PathBuf::from(sidecar);
    std::fs::write(&sidecar, format!("{hash}  {name}\n"))
        .with_context(|| format!("writing {}", sidecar.display()))?;
    Ok((sidecar, hash))
}

fn hex_encode(bytes: &[u8]) -> String {
    use std::fmt::Write as _;
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut s, b| {
        let _ = write!(s, "{b:02x}");
        s
    })
}
