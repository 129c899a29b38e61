//! Saving exported blobs.

use pathdraw_core::Blob;

/// Write `blob` into `dir` under its suggested name, returning the full path. An existing file of
/// the same name gets a numeric suffix instead of being overwritten.
pub fn save(blob: &Blob, dir: &std::path::Path) -> std::io::Result<std::path::PathBuf> {
    std::fs::create_dir_all(dir)?;
    let mut path = dir.join(&blob.filename);
    let mut suffix = 1u32;
    while path.try_exists()? {
        let stem = blob
            .filename
            .rsplit_once('.')
            .map_or(blob.filename.as_str(), |(stem, _)| stem);
        path = dir.join(format!("{stem}-{suffix}.{}", blob.format.extension()));
        suffix += 1;
    }
    std::fs::write(&path, &blob.bytes)?;
    log::info!("saved {} ({} bytes)", path.display(), blob.bytes.len());
    Ok(path)
}
