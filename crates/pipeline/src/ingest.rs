//! Ingestion adapter: read source files and register them with the engine

use crate::error::{Error, Result};
use bytes::Bytes;
use diagnostics::*;
use engine::{FileFormat, Session, TableContent};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub enum FileOrigin {
    Path(PathBuf),
    Memory(Bytes),
}

/// A file to register, under the logical table name `name`
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub format: FileFormat,
    pub origin: FileOrigin,
}

impl SourceFile {
    /// Named after the file name; format taken from the extension
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let format = detect_format(&path).ok_or_else(|| Error::UnknownFormat { name: name.clone() })?;
        Ok(Self {
            name,
            format,
            origin: FileOrigin::Path(path),
        })
    }

    #[must_use]
    pub fn from_bytes(name: impl Into<String>, format: FileFormat, bytes: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            format,
            origin: FileOrigin::Memory(bytes.into()),
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// The complete file contents
    pub async fn read(&self) -> Result<Bytes> {
        match &self.origin {
            FileOrigin::Memory(bytes) => Ok(bytes.clone()),
            FileOrigin::Path(path) => tokio::fs::read(path)
                .await
                .map(Bytes::from)
                .map_err(|source| Error::ReadFile {
                    path: path.clone(),
                    source,
                }),
        }
    }
}

fn detect_format(path: &Path) -> Option<FileFormat> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(FileFormat::from_extension)
}

/// Register every file on the session, returning the table names in input
/// order.
///
/// Fails with [`Error::NoFiles`] before touching the session when `files` is
/// empty. A file that cannot be read aborts the whole call; files registered
/// before it stay registered.
pub async fn register_files(session: &mut Session, files: &[SourceFile]) -> Result<Vec<String>> {
    if files.is_empty() {
        return Err(Error::NoFiles);
    }

    let mut names = Vec::with_capacity(files.len());
    for file in files {
        let bytes = file.read().await?;
        let name = file.name.clone();
        let format = file.format.as_str();
        let size = bytes.len();
        debug!(
            "Registering {name} as {format} ({size} bytes)",
            name: &name,
            format: format,
            size: size
        );

        session
            .register_table(&file.name, TableContent::new(file.format, bytes))
            .await?;
        names.push(file.name.clone());
    }

    let count = names.len();
    info!("Registered {count} files", count: count);
    Ok(names)
}
