//! On-disk cache entries and their projection into the document root
//!
//! Layout:
//!
//! ```text
//! <cache_root>/
//!   <docId>/metadata.json
//!   <docId>/docs/**/*.md
//!   .staging/<docId>/...      (in-progress writes, renamed into place)
//! <docs_root>/
//!   <docName>/**/*.md         (disposable copy of one entry's docs)
//! ```

use crate::storage::metadata::{BackendPage, CacheMetadata, METADATA_FILENAME};
use crate::storage::paths::{infer_title, resolve_within, url_for_relative_path, MappedPath};
use crate::storage::StorageError;
use crate::url::is_doc_id;
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

const DOCS_DIR: &str = "docs";
const STAGING_DIR: &str = ".staging";

/// Local docset cache plus the user facing document root
#[derive(Debug, Clone)]
pub struct LocalCache {
    cache_root: PathBuf,
    docs_root: PathBuf,
}

impl LocalCache {
    pub fn new(cache_root: impl Into<PathBuf>, docs_root: impl Into<PathBuf>) -> Self {
        Self {
            cache_root: cache_root.into(),
            docs_root: docs_root.into(),
        }
    }

    pub fn cache_root(&self) -> &Path {
        &self.cache_root
    }

    pub fn docs_root(&self) -> &Path {
        &self.docs_root
    }

    /// Directory of one cache entry; the id must be a well-formed docId
    pub fn entry_dir(&self, doc_id: &str) -> Result<PathBuf, StorageError> {
        if !is_doc_id(doc_id) {
            return Err(StorageError::InvalidDocId(doc_id.to_string()));
        }
        Ok(self.cache_root.join(doc_id))
    }

    pub fn entry_docs_dir(&self, doc_id: &str) -> Result<PathBuf, StorageError> {
        Ok(self.entry_dir(doc_id)?.join(DOCS_DIR))
    }

    /// Where a docset is installed for the user
    pub fn install_dir(&self, doc_name: &str) -> Result<PathBuf, StorageError> {
        Ok(resolve_within(&self.docs_root, Path::new(doc_name))?)
    }

    /// Whether an entry has readable metadata and a docs tree
    pub fn has_docs(&self, doc_id: &str) -> bool {
        match (self.read_metadata(doc_id), self.entry_docs_dir(doc_id)) {
            (Ok(Some(_)), Ok(docs)) => docs.is_dir(),
            _ => false,
        }
    }

    /// Reads an entry's metadata; `Ok(None)` when there is no entry
    pub fn read_metadata(&self, doc_id: &str) -> Result<Option<CacheMetadata>, StorageError> {
        let path = self.entry_dir(doc_id)?.join(METADATA_FILENAME);
        if !path.is_file() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&raw)?))
    }

    /// Lists every readable entry, newest first
    ///
    /// Entries with missing or malformed metadata are skipped with a warning.
    pub fn list_entries(&self) -> Result<Vec<CacheMetadata>, StorageError> {
        if !self.cache_root.is_dir() {
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        for dir_entry in fs::read_dir(&self.cache_root)? {
            let dir_entry = dir_entry?;
            if !dir_entry.file_type()?.is_dir() {
                continue;
            }
            let name = dir_entry.file_name().to_string_lossy().into_owned();
            if !is_doc_id(&name) {
                continue;
            }

            match self.read_metadata(&name) {
                Ok(Some(meta)) => entries.push(meta),
                Ok(None) => {}
                Err(e) => tracing::warn!("Skipping cache entry {}: {}", name, e),
            }
        }

        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(entries)
    }

    /// Creates an empty staging area for `doc_id` and returns its docs dir
    pub fn prepare_staging(&self, doc_id: &str) -> Result<PathBuf, StorageError> {
        let staging = self.staging_dir(doc_id)?;
        remove_dir_if_exists(&staging)?;
        let docs = staging.join(DOCS_DIR);
        fs::create_dir_all(&docs)?;
        Ok(docs)
    }

    /// Drops a staging area without touching the committed entry
    pub fn discard_staging(&self, doc_id: &str) -> Result<(), StorageError> {
        remove_dir_if_exists(&self.staging_dir(doc_id)?)?;
        Ok(())
    }

    /// Writes metadata into the staging area and swaps it in as the entry
    ///
    /// Any previous entry for the same docId is replaced.
    pub fn commit(&self, metadata: &CacheMetadata) -> Result<PathBuf, StorageError> {
        let staging = self.staging_dir(&metadata.doc_id)?;
        if !staging.join(DOCS_DIR).is_dir() {
            return Err(StorageError::MissingEntry(metadata.doc_id.clone()));
        }

        let json = serde_json::to_string_pretty(metadata)?;
        fs::write(staging.join(METADATA_FILENAME), json)?;

        let entry = self.entry_dir(&metadata.doc_id)?;
        remove_dir_if_exists(&entry)?;
        fs::rename(&staging, &entry)?;

        tracing::debug!("Committed cache entry {}", entry.display());
        Ok(entry)
    }

    /// Copies an entry's docs into `<docs_root>/<doc_name>`, replacing it
    ///
    /// Returns the install directory and the number of files copied.
    pub fn install(&self, doc_id: &str, doc_name: &str) -> Result<(PathBuf, usize), StorageError> {
        let src = self.entry_docs_dir(doc_id)?;
        if !src.is_dir() {
            return Err(StorageError::MissingEntry(doc_id.to_string()));
        }

        let dest = self.install_dir(doc_name)?;
        let copied = copy_dir(&src, &dest)?;
        Ok((dest, copied))
    }

    /// Rebuilds the backend page set from an entry's Markdown files
    pub fn read_pages(&self, metadata: &CacheMetadata) -> Result<Vec<BackendPage>, StorageError> {
        let docs = self.entry_docs_dir(&metadata.doc_id)?;
        if !docs.is_dir() {
            return Ok(Vec::new());
        }

        let source_url = Url::parse(&metadata.source_url).ok();
        let mut files = Vec::new();
        collect_markdown_files(&docs, &mut files)?;
        files.sort();

        let mut pages = Vec::new();
        for file in files {
            let contents = match fs::read_to_string(&file) {
                Ok(c) if !c.trim().is_empty() => c,
                Ok(_) => continue,
                Err(e) => {
                    tracing::warn!("Skipping unreadable file {}: {}", file.display(), e);
                    continue;
                }
            };

            let relative = file
                .strip_prefix(&docs)
                .map(|p| p.to_string_lossy().replace('\\', "/"))
                .unwrap_or_default();
            let url = match &source_url {
                Some(base) => url_for_relative_path(&relative, base),
                None => metadata.source_url.clone(),
            };

            pages.push(BackendPage {
                url,
                title: infer_title(&contents),
                content_markdown: contents,
            });
        }

        Ok(pages)
    }

    fn staging_dir(&self, doc_id: &str) -> Result<PathBuf, StorageError> {
        if !is_doc_id(doc_id) {
            return Err(StorageError::InvalidDocId(doc_id.to_string()));
        }
        Ok(self.cache_root.join(STAGING_DIR).join(doc_id))
    }
}

/// Writes one Markdown document at its mapped location under `root`
pub async fn write_document(
    root: &Path,
    mapped: &MappedPath,
    contents: &str,
) -> Result<PathBuf, StorageError> {
    let target = resolve_within(root, Path::new(&mapped.relative()))?;
    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&target, contents).await?;
    Ok(target)
}

/// Recursively copies regular files from `src` into a fresh `dest`
///
/// `dest` is removed first. Symbolic links are skipped with a warning.
/// Returns the number of files copied.
pub fn copy_dir(src: &Path, dest: &Path) -> Result<usize, StorageError> {
    remove_dir_if_exists(dest)?;
    copy_tree(src, dest)
}

fn copy_tree(src: &Path, dest: &Path) -> Result<usize, StorageError> {
    fs::create_dir_all(dest)?;
    let mut copied = 0;

    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        let from = entry.path();
        let to = dest.join(entry.file_name());

        if file_type.is_symlink() {
            tracing::warn!("Skipping symbolic link during copy: {}", from.display());
        } else if file_type.is_dir() {
            copied += copy_tree(&from, &to)?;
        } else if file_type.is_file() {
            fs::copy(&from, &to)?;
            copied += 1;
        }
    }

    Ok(copied)
}

fn collect_markdown_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), StorageError> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        let path = entry.path();

        if file_type.is_dir() {
            collect_markdown_files(&path, out)?;
        } else if file_type.is_file()
            && path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("md"))
        {
            out.push(path);
        }
    }
    Ok(())
}

fn remove_dir_if_exists(path: &Path) -> std::io::Result<()> {
    match fs::remove_dir_all(path) {
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}
