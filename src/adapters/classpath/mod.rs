//! Classpath resolver: binary class name -> class-file bytes, over an
//! ordered list of directories and jar/zip archives.
//!
//! Broken entries are soft failures. They are logged and skipped at
//! construction, and lookups against them resolve as not found.

use crate::domain::ports::ClassSource;
use anyhow::{Context, Result};
use memmap2::Mmap;
use std::fs::File;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};
use walkdir::WalkDir;
use zip::ZipArchive;

const CLASS_SUFFIX: &str = ".class";

type MappedArchive = ZipArchive<Cursor<Mmap>>;

/// One usable classpath element.
pub enum ClasspathEntry {
    Directory(PathBuf),
    Archive {
        path: PathBuf,
        archive: Mutex<MappedArchive>,
    },
}

impl ClasspathEntry {
    pub fn path(&self) -> &Path {
        match self {
            ClasspathEntry::Directory(path) => path,
            ClasspathEntry::Archive { path, .. } => path,
        }
    }

    fn open_archive(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open archive: {}", path.display()))?;
        // SAFETY: the mapping is read-only and lives as long as the archive reader.
        let mmap = unsafe { Mmap::map(&file) }
            .with_context(|| format!("Failed to map archive: {}", path.display()))?;
        let archive = ZipArchive::new(Cursor::new(mmap))
            .with_context(|| format!("Corrupt archive: {}", path.display()))?;
        Ok(ClasspathEntry::Archive {
            path: path.to_path_buf(),
            archive: Mutex::new(archive),
        })
    }

    /// Archive reader; a lock poisoned by a panicking reader is recovered.
    fn lock<'a>(path: &Path, archive: &'a Mutex<MappedArchive>) -> MutexGuard<'a, MappedArchive> {
        archive.lock().unwrap_or_else(|poisoned| {
            warn!("Recovering poisoned archive lock: {}", path.display());
            poisoned.into_inner()
        })
    }

    fn resolve(&self, name: &str) -> Option<Vec<u8>> {
        let relative = format!("{name}{CLASS_SUFFIX}");
        match self {
            ClasspathEntry::Directory(dir) => std::fs::read(dir.join(&relative)).ok(),
            ClasspathEntry::Archive { path, archive } => {
                let mut archive = Self::lock(path, archive);
                let mut entry = archive.by_name(&relative).ok()?;
                let mut bytes = Vec::with_capacity(entry.size() as usize);
                match entry.read_to_end(&mut bytes) {
                    Ok(_) => Some(bytes),
                    Err(e) => {
                        warn!("Unreadable entry {relative} in {}: {e}", path.display());
                        None
                    }
                }
            }
        }
    }

    fn class_names(&self) -> Vec<String> {
        match self {
            ClasspathEntry::Directory(dir) => WalkDir::new(dir)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
                .filter_map(|e| {
                    let relative = e.path().strip_prefix(dir).ok()?;
                    let parts: Vec<_> = relative
                        .components()
                        .map(|c| c.as_os_str().to_string_lossy().into_owned())
                        .collect();
                    class_name_of(&parts.join("/"))
                })
                .collect(),
            ClasspathEntry::Archive { path, archive } => Self::lock(path, archive)
                .file_names()
                .filter_map(class_name_of)
                .collect(),
        }
    }
}

/// Class name for an entry path, skipping metadata classes.
fn class_name_of(entry: &str) -> Option<String> {
    let name = entry.strip_suffix(CLASS_SUFFIX)?;
    if name.starts_with("META-INF/")
        || name.ends_with("module-info")
        || name.ends_with("package-info")
    {
        return None;
    }
    Some(name.to_string())
}

/// Ordered classpath; the first entry providing a name wins.
pub struct ClasspathResolver {
    entries: Vec<ClasspathEntry>,
}

impl ClasspathResolver {
    /// Build from filesystem paths. Never fails: unusable paths are skipped
    /// with a warning, so building twice from the same paths yields the same
    /// resolver.
    pub fn new<P: AsRef<Path>>(paths: &[P]) -> Self {
        let mut entries = Vec::new();
        for path in paths {
            let path = path.as_ref();
            if path.is_dir() {
                debug!("Classpath directory: {}", path.display());
                entries.push(ClasspathEntry::Directory(path.to_path_buf()));
            } else if !path.exists() {
                warn!("Classpath entry does not exist, skipping: {}", path.display());
            } else if path.extension().is_some_and(|ext| ext == "class") {
                warn!("Bare class file on classpath, skipping: {}", path.display());
            } else {
                match ClasspathEntry::open_archive(path) {
                    Ok(entry) => {
                        debug!("Classpath archive: {}", path.display());
                        entries.push(entry);
                    }
                    Err(e) => warn!("Skipping classpath entry: {e:#}"),
                }
            }
        }
        Self { entries }
    }

    pub fn entries(&self) -> &[ClasspathEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ClassSource for ClasspathResolver {
    fn resolve(&self, name: &str) -> Option<Vec<u8>> {
        self.entries.iter().find_map(|entry| entry.resolve(name))
    }

    fn class_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.iter().flat_map(|e| e.class_names()).collect();
        names.sort();
        names.dedup();
        names
    }
}
