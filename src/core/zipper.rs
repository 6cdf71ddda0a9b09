use crate::utils::error::Result;
use std::fs::File;
use std::io;
use std::path::Path;
use walkdir::WalkDir;
use zip::write::{SimpleFileOptions, ZipWriter};

/// Zips every file below `source` into `destination`.
///
/// Entry names are relative to `source` and use '/' separators; directories
/// are implied by the names and get no entry of their own. Symlinks are not
/// followed. A file that disappears during the walk aborts the whole zip.
/// Returns the number of entries written.
pub fn zip_directory(source: &Path, destination: &Path) -> Result<usize> {
    let mut zip = ZipWriter::new(File::create(destination)?);
    let mut count = 0;

    let walker = WalkDir::new(source)
        .follow_links(false)
        .sort_by_file_name();
    for entry in walker {
        let entry = entry.map_err(io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        // the zip may be written inside the directory being zipped
        if path == destination {
            continue;
        }
        let relative = path.strip_prefix(source).unwrap_or(path);
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        tracing::debug!("Writing '{}' to zip file", name);
        zip.start_file(name, SimpleFileOptions::default())?;
        let mut input = File::open(path)?;
        io::copy(&mut input, &mut zip)?;
        count += 1;
    }

    zip.finish()?;
    Ok(count)
}
