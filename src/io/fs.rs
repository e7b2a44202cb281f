use anyhow::{bail, Context, Result};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub fn assert_not_stdout(path: &Path) -> Result<()> {
    if path == Path::new("-") {
        bail!("[io::fs] stdout is not supported; provide a real file path.");
    }
    Ok(())
}

/// Write-then-rename wrapper, so a failed run never leaves a half-written
/// output behind.
pub struct PendingWrite {
    target: PathBuf,
    tmp: Option<(NamedTempFile, bool)>, // (file, need_fsync_dir)
}

pub fn open_for_write(target: &Path, force: bool) -> Result<PendingWrite> {
    assert_not_stdout(target)?;
    let parent = target.parent().filter(|p| !p.as_os_str().is_empty());
    if let Some(parent) = parent {
        fs::create_dir_all(parent)
            .with_context(|| format!("[io::fs] create dir {}", parent.display()))?;
    }
    if !force && target.exists() {
        bail!("[io::fs] Refusing to overwrite existing file: {} (use --force)", target.display());
    }
    let tmp = NamedTempFile::new_in(parent.unwrap_or(Path::new(".")))
        .context("[io::fs] create temp file")?;

    Ok(PendingWrite { target: target.to_path_buf(), tmp: Some((tmp, parent.is_some())) })
}

impl PendingWrite {
    fn file(&mut self) -> io::Result<&mut NamedTempFile> {
        self.tmp.as_mut()
            .map(|(file, _)| file)
            .ok_or_else(|| io::Error::other("write already finalized"))
    }

    /// Flush, fsync and move the temporary file into place.
    pub fn finalize(mut self) -> Result<()> {
        let (tmp, need_fsync_dir) = self.tmp.take()
            .context("[io::fs] write already finalized")?;
        tmp.as_file().sync_all().ok(); // best-effort fsync file
        tmp.persist(&self.target)
            .with_context(|| format!("[io::fs] rename to {}", self.target.display()))?;
        if need_fsync_dir {
            if let Some(dir) = self.target.parent() {
                let _ = File::open(dir).and_then(|f| f.sync_all());
            }
        }
        Ok(())
    }
}

impl Write for PendingWrite {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file()?.write(buf)
    }
    fn flush(&mut self) -> io::Result<()> {
        self.file()?.flush()
    }
}
