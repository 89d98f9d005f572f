//! On-disk reference database: one file per ref.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use tracing::warn;
use walkdir::WalkDir;

use crate::error::{RefError, RefResult};
use crate::traits::{RefDatabase, RefUpdateFn};
use crate::types::RefValue;

const LOCK_SUFFIX: &str = ".lock";
const LOCK_ATTEMPTS: u32 = 500;
const LOCK_BACKOFF: Duration = Duration::from_millis(10);

/// A [`RefDatabase`] storing each ref as a file under `root`.
///
/// The file for `refs/heads/master` is `<root>/refs/heads/master` and holds
/// either a hex id or `ref: <target>`.
///
/// Every mutation first creates `<ref>.lock` exclusively. The new value is
/// written into the lock file, synced, and renamed over the ref, which also
/// releases the lock. Any number of handles, in this process or another,
/// can share one directory: [`RefDatabase::update`] is atomic across all of
/// them. A writer waits a bounded time for a held lock before failing with
/// [`RefError::Locked`]; a lock file left behind by a crashed writer has to
/// be removed by hand.
#[derive(Debug)]
pub struct FileRefDatabase {
    root: PathBuf,
}

/// An exclusively created `<ref>.lock` file, removed on drop unless it was
/// renamed into place.
struct RefLock {
    path: PathBuf,
    file: Option<File>,
}

impl RefLock {
    /// Write `value` into the lock file and rename it over `target`.
    fn commit(mut self, target: &Path, value: &RefValue) -> RefResult<()> {
        if let Some(mut file) = self.file.take() {
            writeln!(file, "{}", value.render())?;
            file.sync_all()?;
        }
        fs::rename(&self.path, target)?;
        self.path = PathBuf::new();
        Ok(())
    }
}

impl Drop for RefLock {
    fn drop(&mut self) {
        self.file.take();
        if !self.path.as_os_str().is_empty() {
            let _ = fs::remove_file(&self.path);
        }
    }
}

impl FileRefDatabase {
    pub fn open(root: impl Into<PathBuf>) -> RefResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn ref_path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    fn lock_path(&self, name: &str) -> PathBuf {
        let mut path = OsString::from(self.ref_path(name));
        path.push(LOCK_SUFFIX);
        PathBuf::from(path)
    }

    fn lock(&self, name: &str) -> RefResult<RefLock> {
        let path = self.lock_path(name);
        let parent = path.parent().ok_or_else(|| RefError::InvalidName {
            name: name.to_string(),
            reason: "ref path has no parent".into(),
        })?;
        for _ in 0..LOCK_ATTEMPTS {
            fs::create_dir_all(parent)?;
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => {
                    return Ok(RefLock {
                        path,
                        file: Some(file),
                    })
                }
                // held by another writer, or its directory was pruned under us
                Err(e) if matches!(e.kind(), ErrorKind::AlreadyExists | ErrorKind::NotFound) => {
                    thread::sleep(LOCK_BACKOFF);
                }
                Err(e) => return Err(e.into()),
            }
        }
        warn!(name = %name, lock = %path.display(), "gave up waiting for ref lock");
        Err(RefError::Locked(name.to_string()))
    }

    fn read_file(&self, name: &str) -> RefResult<Option<RefValue>> {
        let path = self.ref_path(name);
        if path.is_dir() {
            return Ok(None);
        }
        match fs::read_to_string(&path) {
            Ok(content) => RefValue::parse(name, &content).map(Some),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Remove the ref file. The caller holds the lock.
    fn remove_file(&self, name: &str) -> RefResult<()> {
        match fs::remove_file(self.ref_path(name)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Drop directories left empty above `name`, so a later ref may reuse
    /// the name. A directory holding another writer's lock is not empty.
    fn prune_dirs(&self, name: &str) {
        let path = self.ref_path(name);
        let mut dir = path.parent();
        while let Some(d) = dir {
            if d == self.root || fs::remove_dir(d).is_err() {
                break;
            }
            dir = d.parent();
        }
    }
}

impl RefDatabase for FileRefDatabase {
    fn read(&self, name: &str) -> RefResult<Option<RefValue>> {
        self.read_file(name)
    }

    fn write(&self, name: &str, value: RefValue) -> RefResult<()> {
        let lock = self.lock(name)?;
        lock.commit(&self.ref_path(name), &value)
    }

    fn delete(&self, name: &str) -> RefResult<Option<RefValue>> {
        let lock = self.lock(name)?;
        let previous = self.read_file(name)?;
        if previous.is_some() {
            self.remove_file(name)?;
        }
        drop(lock);
        self.prune_dirs(name);
        Ok(previous)
    }

    fn list(&self, prefix: &str) -> RefResult<Vec<(String, RefValue)>> {
        let mut out = Vec::new();
        let walker = WalkDir::new(&self.root)
            .min_depth(1)
            .into_iter()
            .filter_entry(|e| !e.file_name().to_string_lossy().starts_with('.'));
        for entry in walker {
            let entry = entry.map_err(|e| RefError::Io(e.into()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(&self.root) else {
                continue;
            };
            let name = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            if !name.starts_with(prefix) || name.ends_with(LOCK_SUFFIX) {
                continue;
            }
            if let Some(value) = self.read_file(&name)? {
                out.push((name, value));
            }
        }
        out.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(out)
    }

    fn update(&self, name: &str, f: &mut RefUpdateFn<'_>) -> RefResult<Option<RefValue>> {
        let lock = self.lock(name)?;
        let previous = self.read_file(name)?;
        match f(previous.as_ref())? {
            Some(value) => lock.commit(&self.ref_path(name), &value)?,
            None => {
                if previous.is_some() {
                    self.remove_file(name)?;
                }
                drop(lock);
                self.prune_dirs(name);
            }
        }
        Ok(previous)
    }
}
