//! Input sources for dump files.
//!
//! A freedb dump is laid out as `<partition>/<checksum>` either as an
//! extracted directory tree or inside a (usually bzip2-compressed) tarball.
//! Both are walked sequentially and handed to a visitor one entry at a time.

use anyhow::{bail, Context, Result};
use bzip2::read::MultiBzDecoder;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Metadata for one entry of a source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryMeta {
    /// Path relative to the source root (or as stored in the archive).
    pub path: PathBuf,
    pub size: u64,
    /// False for directories, symlinks and other special entries.
    pub is_file: bool,
}

impl EntryMeta {
    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name().and_then(|n| n.to_str())
    }

    /// Name of the directory the entry sits in, e.g. "rock" for "rock/a50d0c0c".
    pub fn partition(&self) -> Option<&str> {
        self.path
            .parent()
            .and_then(|p| p.file_name())
            .and_then(|n| n.to_str())
    }
}

/// Visitor called once per entry with the entry's bytes.
pub type Visit<'a> = dyn FnMut(&EntryMeta, &mut dyn Read) -> Result<()> + 'a;

pub trait DumpSource {
    /// Human-readable description for logs.
    fn describe(&self) -> String;

    /// Visit every entry in order. An error from `visit` stops the walk and
    /// is returned unchanged.
    fn for_each_entry(&mut self, visit: &mut Visit<'_>) -> Result<()>;
}

// ============================================================================
// Directory trees
// ============================================================================

pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl DumpSource for DirectorySource {
    fn describe(&self) -> String {
        format!("directory {}", self.root.display())
    }

    fn for_each_entry(&mut self, visit: &mut Visit<'_>) -> Result<()> {
        let walker = WalkDir::new(&self.root)
            .follow_links(false)
            .min_depth(1)
            .sort_by_file_name();

        for entry in walker {
            let entry = entry.with_context(|| format!("Failed to walk {}", self.root.display()))?;
            let path = entry.path();
            let rel = path.strip_prefix(&self.root).unwrap_or(path).to_path_buf();
            let is_file = entry.file_type().is_file();
            let size = if is_file {
                entry
                    .metadata()
                    .with_context(|| format!("Failed to stat {}", path.display()))?
                    .len()
            } else {
                0
            };
            let meta = EntryMeta {
                path: rel,
                size,
                is_file,
            };

            if is_file {
                let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
                visit(&meta, &mut BufReader::new(file))?;
            } else {
                visit(&meta, &mut std::io::empty())?;
            }
        }
        Ok(())
    }
}

// ============================================================================
// Tar archives
// ============================================================================

pub struct ArchiveSource {
    path: PathBuf,
}

impl ArchiveSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn is_bzip2(&self) -> bool {
        let name = self
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        name.ends_with(".bz2") || name.ends_with(".tbz2") || name.ends_with(".tbz")
    }
}

impl DumpSource for ArchiveSource {
    fn describe(&self) -> String {
        format!("archive {}", self.path.display())
    }

    fn for_each_entry(&mut self, visit: &mut Visit<'_>) -> Result<()> {
        let file = File::open(&self.path)
            .with_context(|| format!("Failed to open archive {}", self.path.display()))?;
        let reader: Box<dyn Read> = if self.is_bzip2() {
            Box::new(MultiBzDecoder::new(BufReader::new(file)))
        } else {
            Box::new(BufReader::new(file))
        };

        let mut archive = tar::Archive::new(reader);
        let entries = archive
            .entries()
            .with_context(|| format!("Failed to read archive {}", self.path.display()))?;
        for entry in entries {
            let mut entry = entry.context("Corrupt archive entry")?;
            let meta = EntryMeta {
                path: entry.path().context("Invalid archive entry path")?.into_owned(),
                size: entry.size(),
                is_file: entry.header().entry_type().is_file(),
            };
            visit(&meta, &mut entry)?;
        }
        Ok(())
    }
}

/// Pick a source for `path`: directories are walked, files are read as tar
/// archives.
pub fn open_source(path: &Path) -> Result<Box<dyn DumpSource>> {
    let meta = std::fs::metadata(path)
        .with_context(|| format!("Failed to stat dump path {}", path.display()))?;
    if meta.is_dir() {
        Ok(Box::new(DirectorySource::new(path)))
    } else if meta.is_file() {
        Ok(Box::new(ArchiveSource::new(path)))
    } else {
        bail!("Dump path {} is neither a directory nor a file", path.display());
    }
}
