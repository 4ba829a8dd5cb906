//! Archive extraction, grounded in `vx-installer::formats::{tar,zip}`'s
//! per-format handlers but consolidated into one module (this executor only
//! needs tar/tar.gz and zip — no 7z/msi/pkg, which were installer-specific
//! vendor formats vx needed and this system's recipe steps don't name).

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ExecError, Result};
use crate::path_guard::guarded_join;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArchiveKind {
    Tar,
    TarGz,
    Zip,
}

fn detect(path: &Path) -> Option<ArchiveKind> {
    let name = path.file_name()?.to_str()?;
    if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
        Some(ArchiveKind::TarGz)
    } else if name.ends_with(".tar") {
        Some(ArchiveKind::Tar)
    } else if name.ends_with(".zip") {
        Some(ArchiveKind::Zip)
    } else {
        None
    }
}

/// Extract `archive_path` into `dest_dir` (already joined and validated by
/// the caller against the staging root), returning the extracted file
/// paths. Every entry path is re-validated against `dest_dir` individually
/// — an archive can carry `../` or symlink entries regardless of where the
/// archive file itself lives.
pub fn extract(archive_path: &Path, dest_dir: &Path, step_index: usize) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dest_dir)?;
    match detect(archive_path) {
        Some(ArchiveKind::Tar) => {
            let file = fs::File::open(archive_path)?;
            extract_tar(file, dest_dir, step_index)
        }
        Some(ArchiveKind::TarGz) => {
            let file = fs::File::open(archive_path)?;
            let decoder = flate2::read::GzDecoder::new(file);
            extract_tar(decoder, dest_dir, step_index)
        }
        Some(ArchiveKind::Zip) => extract_zip(archive_path, dest_dir, step_index),
        None => Err(ExecError::UnsupportedArchiveFormat {
            path: archive_path.display().to_string(),
        }),
    }
}

fn extract_tar<R: std::io::Read>(reader: R, dest_dir: &Path, step_index: usize) -> Result<Vec<PathBuf>> {
    let mut archive = tar::Archive::new(reader);
    let mut extracted = Vec::new();

    for entry in archive.entries()? {
        let mut entry = entry?;
        let entry_path = entry.path()?.to_string_lossy().into_owned();
        let target = guarded_join(dest_dir, &entry_path, step_index, "extract")?;

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        if entry.header().entry_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            entry.unpack(&target)?;
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                let mode = entry.header().mode()?;
                if mode & 0o111 != 0 {
                    let mut perms = fs::metadata(&target)?.permissions();
                    perms.set_mode(mode);
                    fs::set_permissions(&target, perms)?;
                }
            }
            extracted.push(target);
        }
    }
    Ok(extracted)
}

fn extract_zip(archive_path: &Path, dest_dir: &Path, step_index: usize) -> Result<Vec<PathBuf>> {
    let file = fs::File::open(archive_path)?;
    let mut archive = zip::ZipArchive::new(file)?;
    let mut extracted = Vec::new();

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let Some(enclosed) = entry.enclosed_name().map(|p| p.to_path_buf()) else {
            continue;
        };
        let target = guarded_join(dest_dir, &enclosed.to_string_lossy(), step_index, "extract")?;

        if entry.is_dir() {
            fs::create_dir_all(&target)?;
            continue;
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = fs::File::create(&target)?;
        std::io::copy(&mut entry, &mut out)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = entry.unix_mode() {
                fs::set_permissions(&target, fs::Permissions::from_mode(mode))?;
            }
        }
        extracted.push(target);
    }
    Ok(extracted)
}
