use std::{
    fs, io,
    path::{Path, PathBuf},
};

use glance_core::{
    codec::{
        CodecError, decode_document, decode_progress, decode_settings, encode_document,
        encode_progress, encode_settings,
    },
    document::{Document, DocumentId},
    settings::{ReaderSettings, ReadingProgress, SettingsStore},
    store::DocumentStore,
};
use log::debug;
use thiserror::Error;

const DOCUMENTS_DIR: &str = "documents";
const PROGRESS_DIR: &str = "progress";
const SETTINGS_FILE: &str = "settings.bin";
const DOCUMENT_EXT: &str = "doc";
const PROGRESS_EXT: &str = "pos";

#[derive(Debug, Error)]
pub enum FileStoreError {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    #[error("bad record: {0}")]
    Codec(#[from] CodecError),
    #[error("document id {0:?} is not a valid file name")]
    InvalidId(String),
}

/// One record file per document and per reading position under a data
/// directory.
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, FileStoreError> {
        let root = root.into();
        fs::create_dir_all(root.join(DOCUMENTS_DIR))?;
        fs::create_dir_all(root.join(PROGRESS_DIR))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn record_path(&self, dir: &str, id: &DocumentId, ext: &str) -> Result<PathBuf, FileStoreError> {
        if !is_valid_id(id.as_str()) {
            return Err(FileStoreError::InvalidId(id.to_string()));
        }
        Ok(self.root.join(dir).join(format!("{}.{ext}", id.as_str())))
    }
}

/// Turn a file name into a document id: lowercase ASCII letters and digits
/// separated by single dashes.
pub fn slug_id(name: &str) -> DocumentId {
    let mut slug = String::with_capacity(name.len());
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    if slug.is_empty() {
        slug.push_str("document");
    }
    DocumentId::new(slug)
}

fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 128
        && id
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_'))
}

fn read_record(path: &Path) -> Result<Option<Vec<u8>>, FileStoreError> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(error) => Err(error.into()),
    }
}

/// Write through a sibling temp file so a crash never leaves half a record.
fn write_record(path: &Path, bytes: &[u8]) -> Result<(), FileStoreError> {
    let staging = path.with_extension("tmp");
    fs::write(&staging, bytes)?;
    fs::rename(&staging, path)?;
    debug!("store: wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

fn remove_record(path: &Path) -> Result<(), FileStoreError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(error) => Err(error.into()),
    }
}

impl DocumentStore for FileStore {
    type Error = FileStoreError;

    fn document_ids(&mut self) -> Result<Vec<DocumentId>, Self::Error> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(self.root.join(DOCUMENTS_DIR))? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(DOCUMENT_EXT) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                ids.push(DocumentId::new(stem));
            }
        }
        ids.sort();
        Ok(ids)
    }

    fn load_document(&mut self, id: &DocumentId) -> Result<Option<Document>, Self::Error> {
        let path = self.record_path(DOCUMENTS_DIR, id, DOCUMENT_EXT)?;
        match read_record(&path)? {
            Some(bytes) => Ok(Some(decode_document(&bytes)?)),
            None => Ok(None),
        }
    }

    fn save_document(&mut self, document: &Document) -> Result<(), Self::Error> {
        let path = self.record_path(DOCUMENTS_DIR, &document.id, DOCUMENT_EXT)?;
        write_record(&path, &encode_document(document))
    }

    fn delete_document(&mut self, id: &DocumentId) -> Result<(), Self::Error> {
        remove_record(&self.record_path(DOCUMENTS_DIR, id, DOCUMENT_EXT)?)?;
        self.delete_progress(id)
    }

    fn load_progress(&mut self, id: &DocumentId) -> Result<Option<ReadingProgress>, Self::Error> {
        let path = self.record_path(PROGRESS_DIR, id, PROGRESS_EXT)?;
        match read_record(&path)? {
            Some(bytes) => Ok(Some(decode_progress(&bytes)?)),
            None => Ok(None),
        }
    }

    fn save_progress(
        &mut self,
        id: &DocumentId,
        progress: &ReadingProgress,
    ) -> Result<(), Self::Error> {
        let path = self.record_path(PROGRESS_DIR, id, PROGRESS_EXT)?;
        write_record(&path, &encode_progress(progress))
    }

    fn delete_progress(&mut self, id: &DocumentId) -> Result<(), Self::Error> {
        remove_record(&self.record_path(PROGRESS_DIR, id, PROGRESS_EXT)?)
    }
}

impl SettingsStore for FileStore {
    type Error = FileStoreError;

    fn load(&mut self) -> Result<Option<ReaderSettings>, Self::Error> {
        match read_record(&self.root.join(SETTINGS_FILE))? {
            Some(bytes) => Ok(Some(decode_settings(&bytes)?)),
            None => Ok(None),
        }
    }

    fn save(&mut self, settings: &ReaderSettings) -> Result<(), Self::Error> {
        write_record(&self.root.join(SETTINGS_FILE), &encode_settings(settings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugs_file_names() {
        assert_eq!(slug_id("My Book (2nd ed).txt").as_str(), "my-book-2nd-ed-txt");
        assert_eq!(slug_id("___").as_str(), "document");
    }

    #[test]
    fn records_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let document = Document::from_text("notes", "Notes", "Read this. Then that.");
        let progress = ReadingProgress {
            token_index: 2,
            word_index: 2,
            bookmarks: Vec::new(),
        };

        {
            let mut store = FileStore::open(dir.path()).unwrap();
            store.save_document(&document).unwrap();
            store.save_progress(&document.id, &progress).unwrap();
            SettingsStore::save(&mut store, &ReaderSettings::default()).unwrap();
        }

        let mut store = FileStore::open(dir.path()).unwrap();
        assert_eq!(store.document_ids().unwrap(), [document.id.clone()]);
        assert_eq!(store.load_document(&document.id).unwrap(), Some(document.clone()));
        assert_eq!(store.load_progress(&document.id).unwrap(), Some(progress));
        assert_eq!(
            SettingsStore::load(&mut store).unwrap(),
            Some(ReaderSettings::default())
        );

        store.delete_document(&document.id).unwrap();
        assert!(store.document_ids().unwrap().is_empty());
        assert_eq!(store.load_progress(&document.id).unwrap(), None);
    }

    #[test]
    fn rejects_path_like_ids() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::open(dir.path()).unwrap();
        let result = store.load_document(&DocumentId::new("../escape"));
        assert!(matches!(result, Err(FileStoreError::InvalidId(_))));
    }

    #[test]
    fn damaged_record_is_a_codec_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::open(dir.path()).unwrap();
        fs::write(dir.path().join(DOCUMENTS_DIR).join("bad.doc"), b"nope").unwrap();
        let result = store.load_document(&DocumentId::new("bad"));
        assert!(matches!(result, Err(FileStoreError::Codec(CodecError::Truncated))));
    }

    #[test]
    fn errors_keep_their_source() {
        use std::error::Error as _;

        let error = FileStoreError::from(CodecError::Corrupted);
        assert!(error.source().is_some());
        assert!(error.to_string().starts_with("bad record: "));

        let error = FileStoreError::InvalidId(String::from("a/b"));
        assert!(error.source().is_none());
        assert_eq!(error.to_string(), "document id \"a/b\" is not a valid file name");
    }
}
