//! File transforms: tar extraction, part concatenation, gz decompression
//!
//! Every transform checks the shutdown flag before starting, sets it on its
//! own failure, and removes its input file(s) whether it succeeded or not.

use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};

use caduceus_core::error::{CaduceusError, CaduceusResult};
use caduceus_core::shutdown::ShutdownSignal;
use flate2::read::GzDecoder;
use tracing::{info, warn};

/// Extract the named members of a `.tar.gz` archive next to it.
pub fn extract_from_tar(
    path: &Path,
    members: &[&str],
    shutdown: &ShutdownSignal,
) -> CaduceusResult<()> {
    guarded(path, shutdown, || try_extract_from_tar(path, members))
}

fn try_extract_from_tar(path: &Path, members: &[&str]) -> CaduceusResult<()> {
    let directory = path
        .parent()
        .ok_or_else(|| preparation_error(path, "archive has no parent directory"))?;

    info!(archive = %path.display(), "extracting files");

    let file = File::open(path).map_err(|err| preparation_error(path, &err.to_string()))?;
    let mut archive = tar::Archive::new(GzDecoder::new(BufReader::new(file)));

    for entry in archive
        .entries()
        .map_err(|err| preparation_error(path, &err.to_string()))?
    {
        let mut entry = entry.map_err(|err| preparation_error(path, &err.to_string()))?;
        let entry_path = entry
            .path()
            .map_err(|err| preparation_error(path, &err.to_string()))?
            .into_owned();

        let keep = entry_path
            .to_str()
            .map(|name| members.contains(&name))
            .unwrap_or(false);

        if keep {
            entry
                .unpack(directory.join(&entry_path))
                .map_err(|err| preparation_error(path, &err.to_string()))?;
        }
    }

    Ok(())
}

/// Decompress `foo.gz` into `foo`.
pub fn decompress_gz(path: &Path, shutdown: &ShutdownSignal) -> CaduceusResult<()> {
    guarded(path, shutdown, || try_decompress_gz(path))
}

fn try_decompress_gz(path: &Path) -> CaduceusResult<()> {
    let output_path = path.with_extension("");
    info!(file = %output_path.display(), "decompressing");

    let input = File::open(path).map_err(|err| preparation_error(path, &err.to_string()))?;
    let mut decoder = GzDecoder::new(BufReader::new(input));

    let output =
        File::create(&output_path).map_err(|err| preparation_error(path, &err.to_string()))?;
    let mut writer = BufWriter::new(output);

    io::copy(&mut decoder, &mut writer)
        .map_err(|err| preparation_error(path, &err.to_string()))?;

    Ok(())
}

/// Concatenate `foo.0, foo.1, ...` into `foo` in numeric order. The part
/// files are removed afterwards on every path.
pub fn concatenate_parts(path: &Path, shutdown: &ShutdownSignal) -> CaduceusResult<()> {
    let parts = numbered_parts(path)?;

    if shutdown.is_set() {
        return Err(CaduceusError::NeighbouringProcess);
    }

    let result = try_concatenate_parts(path, &parts);
    delete_files(&parts);

    result.map_err(|err| {
        shutdown.set();
        err
    })
}

fn try_concatenate_parts(path: &Path, parts: &[PathBuf]) -> CaduceusResult<()> {
    info!(file = %path.display(), parts = parts.len(), "concatenating parts");

    let output = File::create(path).map_err(|err| preparation_error(path, &err.to_string()))?;
    let mut writer = BufWriter::new(output);

    for part in parts {
        let mut input =
            File::open(part).map_err(|err| preparation_error(part, &err.to_string()))?;
        io::copy(&mut input, &mut writer)
            .map_err(|err| preparation_error(part, &err.to_string()))?;
    }

    Ok(())
}

/// Reassemble the TrEMBL part files and decompress the combined archive.
pub fn prepare_trembl(path: &Path, shutdown: &ShutdownSignal) -> CaduceusResult<()> {
    concatenate_parts(path, shutdown)?;
    decompress_gz(path, shutdown)
}

/// `<path>.0 .. <path>.N` in numeric order.
pub fn numbered_parts(path: &Path) -> CaduceusResult<Vec<PathBuf>> {
    let directory = path
        .parent()
        .ok_or_else(|| preparation_error(path, "file has no parent directory"))?;
    let prefix = format!(
        "{}.",
        path.file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| preparation_error(path, "file has no name"))?
    );

    let mut parts: Vec<(u64, PathBuf)> = Vec::new();
    for entry in
        std::fs::read_dir(directory).map_err(|err| preparation_error(path, &err.to_string()))?
    {
        let entry = entry.map_err(|err| preparation_error(path, &err.to_string()))?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };

        if let Some(suffix) = name.strip_prefix(&prefix) {
            if let Ok(number) = suffix.parse::<u64>() {
                parts.push((number, entry.path()));
            }
        }
    }

    parts.sort_by_key(|(number, _)| *number);
    Ok(parts.into_iter().map(|(_, part)| part).collect())
}

/// Run `operation`, observing the shutdown contract, and remove the input
/// file afterwards on every path.
fn guarded(
    path: &Path,
    shutdown: &ShutdownSignal,
    operation: impl FnOnce() -> CaduceusResult<()>,
) -> CaduceusResult<()> {
    let result = if shutdown.is_set() {
        Err(CaduceusError::NeighbouringProcess)
    } else {
        operation()
            .map(|()| info!(file = %path.display(), "file prepared successfully"))
            .map_err(|err| {
                shutdown.set();
                err
            })
    };

    delete_file(path);
    result
}

fn preparation_error(path: &Path, reason: &str) -> CaduceusError {
    CaduceusError::FilePreparation(format!(
        "unable to prepare file {}: {reason}",
        path.display()
    ))
}

fn delete_files(paths: &[PathBuf]) {
    for path in paths {
        delete_file(path);
    }
}

fn delete_file(path: &Path) {
    if let Err(err) = std::fs::remove_file(path) {
        if err.kind() != io::ErrorKind::NotFound {
            warn!(file = %path.display(), error = %err, "unable to remove file");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::TempDir;

    fn gzip(payload: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(payload).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn decompress_gz_writes_base_name_and_removes_input() {
        let dir = TempDir::new().unwrap();
        let gz_path = dir.path().join("uniprot_sprot.fasta.gz");
        std::fs::write(&gz_path, gzip(b">sp|P1|X OS=Y OX=1\nMALW\n")).unwrap();

        decompress_gz(&gz_path, &ShutdownSignal::new()).unwrap();

        let output = std::fs::read(dir.path().join("uniprot_sprot.fasta")).unwrap();
        assert_eq!(output, b">sp|P1|X OS=Y OX=1\nMALW\n");
        assert!(!gz_path.exists());
    }

    #[test]
    fn corrupt_gz_sets_shutdown_and_still_removes_input() {
        let dir = TempDir::new().unwrap();
        let gz_path = dir.path().join("broken.gz");
        std::fs::write(&gz_path, b"definitely not gzip").unwrap();

        let shutdown = ShutdownSignal::new();
        let result = decompress_gz(&gz_path, &shutdown);

        assert!(matches!(result, Err(CaduceusError::FilePreparation(_))));
        assert!(shutdown.is_set());
        assert!(!gz_path.exists());
    }

    #[test]
    fn shutdown_already_set_aborts_before_work() {
        let dir = TempDir::new().unwrap();
        let gz_path = dir.path().join("untouched.gz");
        std::fs::write(&gz_path, gzip(b"payload")).unwrap();

        let shutdown = ShutdownSignal::new();
        shutdown.set();
        let result = decompress_gz(&gz_path, &shutdown);

        assert!(matches!(result, Err(CaduceusError::NeighbouringProcess)));
        assert!(!dir.path().join("untouched").exists());
    }

    #[test]
    fn parts_sort_numerically_not_lexically() {
        let dir = TempDir::new().unwrap();
        let base = dir.path().join("archive.gz");
        for part in [0, 1, 2, 10, 11] {
            std::fs::write(dir.path().join(format!("archive.gz.{part}")), [part as u8]).unwrap();
        }

        let parts = numbered_parts(&base).unwrap();

        let suffixes: Vec<_> = parts
            .iter()
            .map(|part| part.extension().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(suffixes, vec!["0", "1", "2", "10", "11"]);
    }

    #[test]
    fn extract_pulls_only_the_requested_members() {
        let dir = TempDir::new().unwrap();
        let archive_path = dir.path().join("new_taxdump.tar.gz");

        let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
        for (name, content) in [("names.dmp", "names"), ("citations.dmp", "citations")] {
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder
                .append_data(&mut header, name, content.as_bytes())
                .unwrap();
        }
        let archive_bytes = builder.into_inner().unwrap().finish().unwrap();
        std::fs::write(&archive_path, archive_bytes).unwrap();

        extract_from_tar(&archive_path, &["names.dmp"], &ShutdownSignal::new()).unwrap();

        assert!(dir.path().join("names.dmp").exists());
        assert!(!dir.path().join("citations.dmp").exists());
        assert!(!archive_path.exists());
    }
}
