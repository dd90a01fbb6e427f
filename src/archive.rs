use anyhow::{Context, Result, bail};
use std::io::Read;
use std::path::Path;
use zip::ZipArchive;

/// Extract a zip archive into `dest`, returning the number of files written.
///
/// Entry paths are validated with `enclosed_name` so an archive cannot write
/// outside the destination directory.
pub fn extract_zip(zip_path: &Path, dest: &Path) -> Result<usize> {
    let file = std::fs::File::open(zip_path)
        .with_context(|| format!("Failed to open archive {}", zip_path.display()))?;
    let mut archive = ZipArchive::new(file).context("Upload is not a valid zip archive")?;

    let mut extracted = 0;
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let Some(relative) = entry.enclosed_name() else {
            bail!("Archive entry '{}' escapes the extraction directory", entry.name());
        };
        let target = dest.join(relative);

        if entry.is_dir() {
            std::fs::create_dir_all(&target)?;
            continue;
        }

        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut contents = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut contents)?;
        std::fs::write(&target, contents)
            .with_context(|| format!("Failed to write {}", target.display()))?;
        extracted += 1;
    }

    Ok(extracted)
}
