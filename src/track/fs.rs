use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;

pub const TRACK_EXTENSION: &str = "gpx";

/// Names live in one flat directory: no separators, no dotfiles.
pub fn valid_track_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(['/', '\\']) && !name.starts_with('.')
}

/// Flat namespace of track files.
pub trait Filesystem {
    type File: Write;

    /// Creates a new file; fails if `name` already exists.
    fn create(&self, name: &str) -> io::Result<Self::File>;

    /// Flushes and releases a file obtained from [`Filesystem::create`].
    fn close(&self, mut file: Self::File) -> io::Result<()> {
        file.flush()
    }

    fn exists(&self, name: &str) -> bool;
    fn list(&self) -> io::Result<Vec<String>>;
    fn remove(&self, name: &str) -> io::Result<()>;
}

/// Track files stored as plain files under one directory.
#[derive(Debug, Clone)]
pub struct DiskFs {
    root: PathBuf,
}

impl DiskFs {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn path_for(&self, name: &str) -> io::Result<PathBuf> {
        if !valid_track_name(name) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid track name: {name}"),
            ));
        }
        Ok(self.root.join(name))
    }
}

impl Filesystem for DiskFs {
    type File = File;

    fn create(&self, name: &str) -> io::Result<File> {
        let path = self.path_for(name)?;
        std::fs::create_dir_all(&self.root)?;
        OpenOptions::new().write(true).create_new(true).open(path)
    }

    fn close(&self, mut file: File) -> io::Result<()> {
        file.flush()?;
        file.sync_all()
    }

    fn exists(&self, name: &str) -> bool {
        self.path_for(name).map(|p| p.is_file()).unwrap_or(false)
    }

    fn list(&self) -> io::Result<Vec<String>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in self.root.read_dir()? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            if path.extension().and_then(|e| e.to_str()) != Some(TRACK_EXTENSION) {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    fn remove(&self, name: &str) -> io::Result<()> {
        std::fs::remove_file(self.path_for(name)?)
    }
}

#[cfg(test)]
pub use memory::MemoryFs;

#[cfg(test)]
mod memory {
    use std::collections::BTreeMap;
    use std::io::{self, Write};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    use super::Filesystem;

    #[derive(Debug, Default)]
    struct Inner {
        files: Mutex<BTreeMap<String, Vec<u8>>>,
        fail_create: AtomicBool,
        fail_writes: AtomicBool,
    }

    /// Shared in-memory filesystem; clones see the same files.
    #[derive(Debug, Default, Clone)]
    pub struct MemoryFs {
        inner: Arc<Inner>,
    }

    impl MemoryFs {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn set_fail_create(&self, fail: bool) {
            self.inner.fail_create.store(fail, Ordering::SeqCst);
        }

        pub fn set_fail_writes(&self, fail: bool) {
            self.inner.fail_writes.store(fail, Ordering::SeqCst);
        }

        pub fn contents(&self, name: &str) -> Option<String> {
            let files = self.inner.files.lock().unwrap();
            files
                .get(name)
                .map(|b| String::from_utf8_lossy(b).into_owned())
        }
    }

    pub struct MemoryFile {
        name: String,
        inner: Arc<Inner>,
    }

    impl Write for MemoryFile {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.inner.fail_writes.load(Ordering::SeqCst) {
                return Err(io::Error::other("injected write failure"));
            }
            let mut files = self.inner.files.lock().unwrap();
            files
                .entry(self.name.clone())
                .or_default()
                .extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Filesystem for MemoryFs {
        type File = MemoryFile;

        fn create(&self, name: &str) -> io::Result<MemoryFile> {
            if self.inner.fail_create.load(Ordering::SeqCst) {
                return Err(io::Error::other("injected create failure"));
            }
            let mut files = self.inner.files.lock().unwrap();
            if files.contains_key(name) {
                return Err(io::Error::from(io::ErrorKind::AlreadyExists));
            }
            files.insert(name.to_string(), Vec::new());
            Ok(MemoryFile {
                name: name.to_string(),
                inner: self.inner.clone(),
            })
        }

        fn exists(&self, name: &str) -> bool {
            self.inner.files.lock().unwrap().contains_key(name)
        }

        fn list(&self) -> io::Result<Vec<String>> {
            Ok(self.inner.files.lock().unwrap().keys().cloned().collect())
        }

        fn remove(&self, name: &str) -> io::Result<()> {
            self.inner
                .files
                .lock()
                .unwrap()
                .remove(name)
                .map(|_| ())
                .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn disk_fs_lifecycle() {
        let dir = tempdir().unwrap();
        let fs = DiskFs::new(dir.path().join("tracks"));
        assert!(fs.list().unwrap().is_empty());

        let mut file = fs.create("a.gpx").unwrap();
        file.write_all(b"<gpx/>").unwrap();
        fs.close(file).unwrap();
        std::fs::write(dir.path().join("tracks").join("notes.txt"), "x").unwrap();

        assert!(fs.exists("a.gpx"));
        assert_eq!(fs.list().unwrap(), vec!["a.gpx".to_string()]);
        assert_eq!(
            fs.create("a.gpx").unwrap_err().kind(),
            io::ErrorKind::AlreadyExists
        );

        fs.remove("a.gpx").unwrap();
        assert!(!fs.exists("a.gpx"));
    }

    #[test]
    fn disk_fs_rejects_path_escapes() {
        let dir = tempdir().unwrap();
        let fs = DiskFs::new(dir.path().to_path_buf());
        for name in ["../evil.gpx", "sub/x.gpx", ".hidden", ""] {
            assert_eq!(
                fs.create(name).unwrap_err().kind(),
                io::ErrorKind::InvalidInput,
                "{name}"
            );
            assert!(!fs.exists(name));
        }
    }
}
