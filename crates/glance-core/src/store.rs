//! Persistence seam for documents and reading progress.

use alloc::{collections::BTreeMap, vec::Vec};
use core::fmt;

use crate::{
    codec::{
        CodecError, decode_document, decode_progress, decode_settings, encode_document,
        encode_progress, encode_settings,
    },
    document::{Document, DocumentId},
    settings::{ReaderSettings, ReadingProgress, SettingsStore},
};

/// Abstract document and progress persistence backend.
///
/// The reader never treats a failure here as fatal; it keeps working on its
/// in-memory copy and reports the degradation.
pub trait DocumentStore {
    type Error: fmt::Debug;

    fn document_ids(&mut self) -> Result<Vec<DocumentId>, Self::Error>;
    fn load_document(&mut self, id: &DocumentId) -> Result<Option<Document>, Self::Error>;
    fn save_document(&mut self, document: &Document) -> Result<(), Self::Error>;
    fn delete_document(&mut self, id: &DocumentId) -> Result<(), Self::Error>;

    fn load_progress(&mut self, id: &DocumentId) -> Result<Option<ReadingProgress>, Self::Error>;
    fn save_progress(
        &mut self,
        id: &DocumentId,
        progress: &ReadingProgress,
    ) -> Result<(), Self::Error>;
    fn delete_progress(&mut self, id: &DocumentId) -> Result<(), Self::Error>;
}

/// Store keeping encoded records in memory.
///
/// Records go through the binary codec so a round trip behaves exactly like a
/// persistent backend would.
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: BTreeMap<DocumentId, Vec<u8>>,
    progress: BTreeMap<DocumentId, Vec<u8>>,
    settings: Option<Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw record access, for importing records produced elsewhere.
    pub fn insert_document_record(&mut self, id: DocumentId, record: Vec<u8>) {
        self.documents.insert(id, record);
    }
}

impl DocumentStore for MemoryStore {
    type Error = CodecError;

    fn document_ids(&mut self) -> Result<Vec<DocumentId>, Self::Error> {
        Ok(self.documents.keys().cloned().collect())
    }

    fn load_document(&mut self, id: &DocumentId) -> Result<Option<Document>, Self::Error> {
        self.documents
            .get(id)
            .map(|record| decode_document(record))
            .transpose()
    }

    fn save_document(&mut self, document: &Document) -> Result<(), Self::Error> {
        self.documents
            .insert(document.id.clone(), encode_document(document));
        Ok(())
    }

    fn delete_document(&mut self, id: &DocumentId) -> Result<(), Self::Error> {
        self.documents.remove(id);
        self.progress.remove(id);
        Ok(())
    }

    fn load_progress(&mut self, id: &DocumentId) -> Result<Option<ReadingProgress>, Self::Error> {
        self.progress
            .get(id)
            .map(|record| decode_progress(record))
            .transpose()
    }

    fn save_progress(
        &mut self,
        id: &DocumentId,
        progress: &ReadingProgress,
    ) -> Result<(), Self::Error> {
        self.progress.insert(id.clone(), encode_progress(progress));
        Ok(())
    }

    fn delete_progress(&mut self, id: &DocumentId) -> Result<(), Self::Error> {
        self.progress.remove(id);
        Ok(())
    }
}

impl SettingsStore for MemoryStore {
    type Error = CodecError;

    fn load(&mut self) -> Result<Option<ReaderSettings>, Self::Error> {
        self.settings
            .as_deref()
            .map(decode_settings)
            .transpose()
    }

    fn save(&mut self, settings: &ReaderSettings) -> Result<(), Self::Error> {
        self.settings = Some(encode_settings(settings));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Bookmark;
    use alloc::vec;

    #[test]
    fn documents_and_progress_round_trip() {
        let mut store = MemoryStore::new();
        let document = Document::from_text("essay", "Essay", "One two.\n\nThree.");
        store.save_document(&document).unwrap();

        let progress = ReadingProgress {
            token_index: 3,
            word_index: 2,
            bookmarks: vec![Bookmark {
                word_index: 1,
                note: None,
            }],
        };
        store.save_progress(&document.id, &progress).unwrap();

        assert_eq!(store.document_ids().unwrap(), [document.id.clone()]);
        assert_eq!(store.load_document(&document.id).unwrap(), Some(document.clone()));
        assert_eq!(store.load_progress(&document.id).unwrap(), Some(progress));

        store.delete_document(&document.id).unwrap();
        assert_eq!(store.load_document(&document.id).unwrap(), None);
        assert_eq!(store.load_progress(&document.id).unwrap(), None);
    }

    #[test]
    fn damaged_record_surfaces_codec_error() {
        let mut store = MemoryStore::new();
        let id = DocumentId::new("broken");
        store.insert_document_record(id.clone(), vec![1, 2, 3]);
        assert_eq!(store.load_document(&id), Err(CodecError::Truncated));
    }

    #[test]
    fn settings_start_empty() {
        let mut store = MemoryStore::new();
        assert_eq!(SettingsStore::load(&mut store).unwrap(), None);

        let settings = ReaderSettings {
            wpm: 500,
            ..ReaderSettings::default()
        };
        SettingsStore::save(&mut store, &settings).unwrap();
        assert_eq!(SettingsStore::load(&mut store).unwrap(), Some(settings));
    }
}
