//! Local payload generation for the write workload.

use crate::error::BenchError;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Bytes per megabyte of payload
pub const MB: usize = 1024 * 1024;

/// Generate `num_files` payloads of exactly `size_mb` megabytes of
/// pseudo-random bytes under `directory`.
///
/// Files are named `test_file_{i}.dat` and returned in creation order. Any
/// I/O failure is fatal to the run. Before the error is returned, the files
/// this call already wrote are removed; anything else in `directory` is
/// left alone.
pub fn generate_payloads(
    directory: &Path,
    num_files: usize,
    size_mb: u64,
) -> Result<Vec<PathBuf>, BenchError> {
    fs::create_dir_all(directory).map_err(|source| BenchError::StagingDirectory {
        path: directory.to_path_buf(),
        source,
    })?;

    info!(
        "Generating {} test files of {}MB each in {:?}",
        num_files, size_mb, directory
    );

    let mut rng = StdRng::from_entropy();
    let mut chunk = vec![0u8; MB];
    let mut files = Vec::with_capacity(num_files);

    for i in 0..num_files {
        let path = directory.join(format!("test_file_{}.dat", i));
        if let Err(source) = write_payload(&path, size_mb, &mut rng, &mut chunk) {
            discard_written(&files, &path);
            return Err(BenchError::PayloadWrite { path, source });
        }
        debug!("Generated payload {:?}", path);
        files.push(path);
    }

    Ok(files)
}

/// Undo a generation that failed at `failed`. A regular file at `failed`
/// is the truncated payload; a directory there belongs to someone else.
fn discard_written(written: &[PathBuf], failed: &Path) {
    for file in written {
        if let Err(e) = fs::remove_file(file) {
            warn!("Failed to remove test file {:?}: {}", file, e);
        }
    }
    if failed.is_file() {
        let _ = fs::remove_file(failed);
    }
}

fn write_payload(
    path: &Path,
    size_mb: u64,
    rng: &mut StdRng,
    chunk: &mut [u8],
) -> std::io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for _ in 0..size_mb {
        rng.fill_bytes(chunk);
        writer.write_all(chunk)?;
    }
    writer.flush()
}

/// Remove generated payloads and then the staging directory itself.
///
/// Best effort: failures are logged and otherwise ignored. The directory is
/// only removed once it is empty, so unrelated files a user kept there
/// survive.
pub fn cleanup_payloads(directory: &Path, files: &[PathBuf]) {
    if !directory.exists() {
        return;
    }

    info!("Cleaning up test files in {:?}", directory);
    for file in files {
        if let Err(e) = fs::remove_file(file) {
            warn!("Failed to remove test file {:?}: {}", file, e);
        }
    }

    if let Err(e) = fs::remove_dir(directory) {
        debug!("Staging directory {:?} not removed: {}", directory, e);
    }
}
