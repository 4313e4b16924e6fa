//! Persistence media for the store document
//!
//! The store always hands a backend the complete document. The file backend
//! writes a sibling temporary file and renames it over the target, so a
//! failed or interrupted write leaves the previous document intact.

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::content_record::StoreDocument;
use crate::errors::{ContentError, ContentResult, SafeLock};

pub trait StoreBackend: Send + Sync {
    /// Read the whole document. `None` means the medium holds nothing yet.
    fn load(&self) -> ContentResult<Option<StoreDocument>>;

    /// Durably replace the whole document
    fn save(&self, document: &StoreDocument) -> ContentResult<()>;

    fn describe(&self) -> String;
}

/// A single pretty-printed JSON document on disk
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "content.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl StoreBackend for JsonFileBackend {
    fn load(&self) -> ContentResult<Option<StoreDocument>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(ContentError::store_io(
                    format!("reading {}", self.path.display()),
                    e,
                ))
            }
        };

        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| ContentError::encoding(format!("parsing {}", self.path.display()), e))
    }

    fn save(&self, document: &StoreDocument) -> ContentResult<()> {
        let serialized = serde_json::to_string_pretty(document)
            .map_err(|e| ContentError::encoding("serializing store document", e))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| ContentError::store_io("creating data directory", e))?;
        }

        let temp = self.temp_path();
        let write_temp = || -> std::io::Result<()> {
            let mut file = File::create(&temp)?;
            file.write_all(serialized.as_bytes())?;
            file.sync_all()
        };
        if let Err(e) = write_temp() {
            let _ = fs::remove_file(&temp);
            return Err(ContentError::store_io(
                format!("writing {}", temp.display()),
                e,
            ));
        }

        fs::rename(&temp, &self.path).map_err(|e| {
            let _ = fs::remove_file(&temp);
            ContentError::store_io(format!("replacing {}", self.path.display()), e)
        })
    }

    fn describe(&self) -> String {
        format!("json file {}", self.path.display())
    }
}

/// Volatile backend for tests and dry runs. Writes can be made to fail on demand.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    document: Mutex<Option<StoreDocument>>,
    fail_writes: AtomicBool,
    saves: AtomicUsize,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(document: StoreDocument) -> Self {
        Self {
            document: Mutex::new(Some(document)),
            ..Self::default()
        }
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful saves so far
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Snapshot of the last durably saved document
    pub fn document(&self) -> ContentResult<Option<StoreDocument>> {
        Ok(self.document.safe_lock()?.clone())
    }
}

impl StoreBackend for MemoryBackend {
    fn load(&self) -> ContentResult<Option<StoreDocument>> {
        self.document()
    }

    fn save(&self, document: &StoreDocument) -> ContentResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(ContentError::store_io(
                "writing in-memory document",
                std::io::Error::new(ErrorKind::Other, "simulated write failure"),
            ));
        }
        *self.document.safe_lock()? = Some(document.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn describe(&self) -> String {
        "in-memory".to_string()
    }
}
