use crate::error::StorageError;
use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::pin::Pin;

pub type StorageFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StorageError>> + Send + 'a>>;

/// Byte-level access to the knowledge tree. Paths are relative to the root
/// and already validated by the caller.
pub trait Storage: Send + Sync {
    fn root(&self) -> &Path;

    /// `None` when the file does not exist.
    fn read<'a>(&'a self, path: &'a str) -> StorageFuture<'a, Option<String>>;

    /// Atomic replace; parents are created as needed.
    fn write<'a>(&'a self, path: &'a str, content: &'a str) -> StorageFuture<'a, ()>;

    /// Sorted entry names, directories suffixed with `/`. `None` when the path
    /// is not a directory.
    fn list<'a>(&'a self, path: &'a str) -> StorageFuture<'a, Option<Vec<String>>>;

    /// Every regular file below the root, relative, skipping dot-directories.
    fn files(&self) -> StorageFuture<'_, Vec<String>>;

    /// Whether `path` resolves (through symlinks) to somewhere under the root.
    fn contains<'a>(&'a self, path: &'a str) -> StorageFuture<'a, bool>;
}

pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn full(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }
}

fn read_err(path: &Path, source: std::io::Error) -> StorageError {
    StorageError::Read {
        path: path.display().to_string(),
        source,
    }
}

fn write_err(path: &Path, source: std::io::Error) -> StorageError {
    StorageError::Write {
        path: path.display().to_string(),
        source,
    }
}

async fn write_atomic(path: &Path, content: &str) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| write_err(parent, e))?;
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp_path = path.with_file_name(format!(".{file_name}.tmp"));
    tokio::fs::write(&temp_path, content)
        .await
        .map_err(|e| write_err(&temp_path, e))?;

    if let Err(rename_error) = tokio::fs::rename(&temp_path, path).await {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(write_err(path, rename_error));
    }
    Ok(())
}

impl Storage for LocalStorage {
    fn root(&self) -> &Path {
        &self.root
    }

    fn read<'a>(&'a self, path: &'a str) -> StorageFuture<'a, Option<String>> {
        Box::pin(async move {
            let full = self.full(path);
            match tokio::fs::read_to_string(&full).await {
                Ok(text) => Ok(Some(text)),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
                Err(e) => Err(read_err(&full, e)),
            }
        })
    }

    fn write<'a>(&'a self, path: &'a str, content: &'a str) -> StorageFuture<'a, ()> {
        Box::pin(async move { write_atomic(&self.full(path), content).await })
    }

    fn list<'a>(&'a self, path: &'a str) -> StorageFuture<'a, Option<Vec<String>>> {
        Box::pin(async move {
            let full = self.full(path);
            match tokio::fs::metadata(&full).await {
                Ok(meta) if meta.is_dir() => {}
                Ok(_) => return Ok(None),
                Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
                Err(e) => return Err(read_err(&full, e)),
            }

            let mut reader = tokio::fs::read_dir(&full)
                .await
                .map_err(|e| read_err(&full, e))?;
            let mut names = Vec::new();
            while let Some(entry) = reader.next_entry().await.map_err(|e| read_err(&full, e))? {
                let mut name = entry.file_name().to_string_lossy().into_owned();
                if entry.file_type().await.is_ok_and(|t| t.is_dir()) {
                    name.push('/');
                }
                names.push(name);
            }
            names.sort();
            Ok(Some(names))
        })
    }

    fn files(&self) -> StorageFuture<'_, Vec<String>> {
        Box::pin(async move {
            let mut out = Vec::new();
            let mut pending = vec![String::new()];
            while let Some(dir) = pending.pop() {
                let full = if dir.is_empty() {
                    self.root.clone()
                } else {
                    self.full(&dir)
                };
                let mut reader = match tokio::fs::read_dir(&full).await {
                    Ok(reader) => reader,
                    Err(e) if e.kind() == ErrorKind::NotFound => continue,
                    Err(e) => return Err(read_err(&full, e)),
                };
                while let Some(entry) = reader.next_entry().await.map_err(|e| read_err(&full, e))? {
                    let name = entry.file_name().to_string_lossy().into_owned();
                    let rel = if dir.is_empty() {
                        name.clone()
                    } else {
                        format!("{dir}/{name}")
                    };
                    match entry.file_type().await {
                        Ok(t) if t.is_dir() && !name.starts_with('.') => pending.push(rel),
                        Ok(t) if t.is_file() => out.push(rel),
                        _ => {}
                    }
                }
            }
            out.sort();
            Ok(out)
        })
    }

    fn contains<'a>(&'a self, path: &'a str) -> StorageFuture<'a, bool> {
        Box::pin(async move {
            let Ok(root) = tokio::fs::canonicalize(&self.root).await else {
                return Ok(false);
            };
            // Nonexistent targets are judged by their deepest existing ancestor.
            let mut ancestor = self.full(path);
            loop {
                match tokio::fs::canonicalize(&ancestor).await {
                    Ok(resolved) => return Ok(resolved.starts_with(&root)),
                    Err(e) if e.kind() == ErrorKind::NotFound => {
                        if !ancestor.pop() {
                            return Ok(false);
                        }
                    }
                    Err(e) => return Err(read_err(&ancestor, e)),
                }
            }
        })
    }
}
