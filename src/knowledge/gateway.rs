use super::rules::{AccessMode, AccessRules};
use super::storage::{LocalStorage, Storage};
use crate::config::KnowledgeConfig;
use crate::error::{AccessError, Result};
use serde::Deserialize;
use std::path::{Component, Path};
use std::sync::Arc;
use strum::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum WriteMode {
    #[default]
    Overwrite,
    Append,
}

/// What a successful read produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    File(String),
    Directory(Vec<String>),
}

impl ReadOutcome {
    pub fn into_text(self) -> String {
        match self {
            Self::File(text) => text,
            Self::Directory(entries) if entries.is_empty() => "(empty directory)".into(),
            Self::Directory(entries) => entries.join("\n"),
        }
    }
}

/// Access-checked view of the knowledge store. Every read and write is
/// validated against the full rule set before storage is touched.
pub struct KnowledgeGateway {
    storage: Arc<dyn Storage>,
    rules: AccessRules,
}

impl KnowledgeGateway {
    pub fn new(storage: Arc<dyn Storage>, rules: AccessRules) -> Self {
        Self { storage, rules }
    }

    pub fn local(root: &Path, config: &KnowledgeConfig) -> std::result::Result<Self, AccessError> {
        Ok(Self::new(
            Arc::new(LocalStorage::new(root)),
            AccessRules::from_config(config)?,
        ))
    }

    pub fn rules(&self) -> &AccessRules {
        &self.rules
    }

    pub fn storage(&self) -> Arc<dyn Storage> {
        Arc::clone(&self.storage)
    }

    /// Turn a caller-supplied path into a clean root-relative one.
    pub fn normalize(&self, raw: &str) -> std::result::Result<String, AccessError> {
        let raw = raw.trim();
        if raw.contains('\0') {
            return Err(AccessError::Traversal(raw.replace('\0', "\\0")));
        }
        let lower = raw.to_lowercase();
        if lower.contains("..%2f") || lower.contains("%2f..") {
            return Err(AccessError::Traversal(raw.to_string()));
        }

        let candidate = Path::new(raw);
        let relative = if candidate.is_absolute() {
            candidate
                .strip_prefix(self.storage.root())
                .map_err(|_| AccessError::Traversal(raw.to_string()))?
        } else {
            candidate
        };

        let mut parts = Vec::new();
        for component in relative.components() {
            match component {
                Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(AccessError::Traversal(raw.to_string()));
                }
            }
        }
        Ok(parts.join("/"))
    }

    async fn authorize(&self, raw: &str, mode: AccessMode) -> Result<String> {
        let path = self.normalize(raw)?;
        self.rules.check(&path, mode)?;
        if !self.storage.contains(&path).await? {
            return Err(AccessError::Traversal(path).into());
        }
        Ok(path)
    }

    pub async fn read(&self, raw: &str) -> Result<ReadOutcome> {
        let path = self.authorize(raw, AccessMode::Read).await?;

        if let Some(entries) = self.storage.list(&path).await? {
            let visible = entries
                .into_iter()
                .filter(|name| {
                    let child = format!("{path}/{}", name.trim_end_matches('/'));
                    !self.rules.is_blocked(&child)
                })
                .collect();
            return Ok(ReadOutcome::Directory(visible));
        }

        match self.storage.read(&path).await? {
            Some(text) => Ok(ReadOutcome::File(text)),
            None => Err(AccessError::NotFound(path).into()),
        }
    }

    /// Read a file, treating "missing" and "not allowed" alike as absent.
    pub async fn read_optional(&self, raw: &str) -> Option<String> {
        match self.read(raw).await {
            Ok(ReadOutcome::File(text)) => Some(text),
            Ok(ReadOutcome::Directory(_)) => None,
            Err(e) => {
                tracing::debug!(path = raw, error = %e, "Optional knowledge read skipped");
                None
            }
        }
    }

    pub async fn write(&self, raw: &str, content: &str, mode: WriteMode) -> Result<String> {
        let path = self.authorize(raw, AccessMode::Write).await?;

        let body = match mode {
            WriteMode::Overwrite => content.to_string(),
            WriteMode::Append => match self.storage.read(&path).await? {
                Some(existing) if existing.is_empty() => content.to_string(),
                Some(existing) if existing.ends_with('\n') => format!("{existing}{content}"),
                Some(existing) => format!("{existing}\n{content}"),
                None => content.to_string(),
            },
        };

        self.storage.write(&path, &body).await?;
        tracing::info!(path = %path, mode = %mode, bytes = body.len(), "Knowledge store write");
        Ok(path)
    }

    /// Readable files, for the manifest handed to the oracle.
    pub async fn list_readable(&self) -> Result<Vec<String>> {
        let files = self.storage.files().await?;
        Ok(files
            .into_iter()
            .filter(|path| self.rules.permits(path, AccessMode::Read))
            .collect())
    }

    pub fn access_summary(&self) -> String {
        format!(
            "knowledge root: {}\n{}",
            self.storage.root().display(),
            self.rules.summary()
        )
    }
}
