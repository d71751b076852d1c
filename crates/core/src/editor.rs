//! Editor-side reconciliation of draft section content against what was
//! last persisted.
//!
//! Dirtiness is structural: both sides are normalized first, so retyping the
//! same value (or pasting differently-ordered JSON) does not mark a section
//! dirty. There is no autosave and no automatic retry; the caller drives
//! every save.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;

use crate::content::{normalize, SectionContent, SectionType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionStatus {
    Clean,
    Dirty,
    Saving,
}

#[derive(Debug, Error)]
#[error("{0}")]
pub struct PersistError(pub String);

/// The persistence collaborator a save is submitted through.
#[async_trait]
pub trait SectionPersister: Send + Sync {
    async fn save_section(&self, section_id: i64, content_json: &str) -> Result<(), PersistError>;
}

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("section {0} is not open in the editor")]
    UnknownSection(i64),
    #[error("failed to persist section {section_id}: {source}")]
    Persist {
        section_id: i64,
        source: PersistError,
    },
}

/// A save ready to submit: the normalized snapshot and its serialized form.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingSave {
    pub section_id: i64,
    pub content: SectionContent,
    pub payload: String,
}

#[derive(Debug, Clone)]
struct SectionState {
    section_type: SectionType,
    last_persisted: SectionContent,
    draft: SectionContent,
    status: SectionStatus,
    in_flight: Option<SectionContent>,
    error: Option<String>,
}

impl SectionState {
    fn recompute_status(&mut self) {
        if self.status == SectionStatus::Saving {
            return;
        }
        self.status = if self.draft == self.last_persisted {
            SectionStatus::Clean
        } else {
            SectionStatus::Dirty
        };
    }
}

/// Per-open-section draft tracking for one editor.
#[derive(Default)]
pub struct EditorReconciliation {
    sections: HashMap<i64, SectionState>,
}

impl EditorReconciliation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a section with its stored content. Both snapshots start from the
    /// normalized stored value, so a freshly opened section is clean.
    pub fn open_section(&mut self, section_id: i64, section_type: SectionType, stored_json: &str) {
        let persisted = normalize(section_type, stored_json);
        self.sections.insert(
            section_id,
            SectionState {
                section_type,
                draft: persisted.clone(),
                last_persisted: persisted,
                status: SectionStatus::Clean,
                in_flight: None,
                error: None,
            },
        );
    }

    /// Apply a local edit. The raw JSON is normalized immediately; a section
    /// becomes dirty only if the normalized draft differs from what was last
    /// persisted.
    pub fn edit(&mut self, section_id: i64, raw_json: &str) {
        let Some(state) = self.sections.get_mut(&section_id) else {
            return;
        };
        state.draft = normalize(state.section_type, raw_json);
        state.error = None;
        state.recompute_status();
    }

    pub fn status(&self, section_id: i64) -> Option<SectionStatus> {
        self.sections.get(&section_id).map(|state| state.status)
    }

    pub fn is_dirty(&self, section_id: i64) -> bool {
        self.sections
            .get(&section_id)
            .is_some_and(|state| state.draft != state.last_persisted)
    }

    pub fn any_dirty(&self) -> bool {
        self.sections
            .values()
            .any(|state| state.draft != state.last_persisted)
    }

    pub fn draft(&self, section_id: i64) -> Option<&SectionContent> {
        self.sections.get(&section_id).map(|state| &state.draft)
    }

    pub fn last_persisted(&self, section_id: i64) -> Option<&SectionContent> {
        self.sections
            .get(&section_id)
            .map(|state| &state.last_persisted)
    }

    pub fn error(&self, section_id: i64) -> Option<&str> {
        self.sections
            .get(&section_id)
            .and_then(|state| state.error.as_deref())
    }

    /// Start a save for a dirty section: marks it saving and hands back the
    /// snapshot to submit. Clean and unknown sections yield nothing.
    pub fn begin_save(&mut self, section_id: i64) -> Option<PendingSave> {
        let state = self.sections.get_mut(&section_id)?;
        if state.draft == state.last_persisted {
            return None;
        }

        state.status = SectionStatus::Saving;
        state.error = None;
        state.in_flight = Some(state.draft.clone());

        let content = state.draft.clone();
        Some(PendingSave {
            section_id,
            payload: content.to_json_string(),
            content,
        })
    }

    /// Resolve an in-flight save. Success promotes the submitted snapshot to
    /// `last_persisted` for this section only; failure keeps both snapshots
    /// and flags the error so the caller can retry with the same draft.
    pub fn complete_save(&mut self, section_id: i64, outcome: Result<(), PersistError>) {
        let Some(state) = self.sections.get_mut(&section_id) else {
            return;
        };
        let in_flight = state.in_flight.take();
        state.status = SectionStatus::Dirty;

        match outcome {
            Ok(()) => {
                if let Some(saved) = in_flight {
                    state.last_persisted = saved;
                }
                state.error = None;
            }
            Err(err) => {
                state.error = Some(err.0);
            }
        }
        state.recompute_status();
    }

    /// Submit one section's draft through the persistence collaborator.
    /// A clean section is a no-op.
    pub async fn save(
        &mut self,
        section_id: i64,
        persister: &dyn SectionPersister,
    ) -> Result<(), SaveError> {
        if !self.sections.contains_key(&section_id) {
            return Err(SaveError::UnknownSection(section_id));
        }
        let Some(pending) = self.begin_save(section_id) else {
            return Ok(());
        };

        let outcome = persister.save_section(section_id, &pending.payload).await;
        let result = match &outcome {
            Ok(()) => Ok(()),
            Err(err) => Err(SaveError::Persist {
                section_id,
                source: PersistError(err.0.clone()),
            }),
        };
        self.complete_save(section_id, outcome);
        result
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct RecordingPersister {
        saved: Mutex<Vec<(i64, String)>>,
        fail: Mutex<bool>,
    }

    #[async_trait]
    impl SectionPersister for RecordingPersister {
        async fn save_section(
            &self,
            section_id: i64,
            content_json: &str,
        ) -> Result<(), PersistError> {
            if *self.fail.lock().unwrap() {
                return Err(PersistError("store unavailable".to_string()));
            }
            self.saved
                .lock()
                .unwrap()
                .push((section_id, content_json.to_string()));
            Ok(())
        }
    }

    fn open_hero(editor: &mut EditorReconciliation, id: i64) {
        editor.open_section(id, SectionType::Hero, r#"{"headline":"Fresh bread daily"}"#);
    }

    #[test]
    fn opened_sections_start_clean() {
        let mut editor = EditorReconciliation::new();
        open_hero(&mut editor, 1);
        assert_eq!(editor.status(1), Some(SectionStatus::Clean));
        assert!(!editor.is_dirty(1));
    }

    #[test]
    fn edits_mark_dirty_only_on_structural_change() {
        let mut editor = EditorReconciliation::new();
        open_hero(&mut editor, 1);

        editor.edit(1, r#"{"headline":"New headline"}"#);
        assert_eq!(editor.status(1), Some(SectionStatus::Dirty));

        // Back to the persisted value: clean again.
        editor.edit(1, r#"{"headline":"Fresh bread daily"}"#);
        assert_eq!(editor.status(1), Some(SectionStatus::Clean));
    }

    #[test]
    fn equivalent_garbage_stays_clean() {
        let mut editor = EditorReconciliation::new();
        editor.open_section(1, SectionType::Menu, "{}");

        // Normalizes to the same defaulted content as the stored blob.
        editor.edit(1, "not json");
        assert_eq!(editor.status(1), Some(SectionStatus::Clean));
    }

    #[tokio::test]
    async fn successful_save_promotes_only_that_section() {
        let mut editor = EditorReconciliation::new();
        open_hero(&mut editor, 1);
        open_hero(&mut editor, 2);
        editor.edit(1, r#"{"headline":"One"}"#);
        editor.edit(2, r#"{"headline":"Two"}"#);

        let persister = RecordingPersister::default();
        editor.save(1, &persister).await.unwrap();

        assert_eq!(editor.status(1), Some(SectionStatus::Clean));
        assert_eq!(editor.status(2), Some(SectionStatus::Dirty));

        let saved = persister.saved.lock().unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].0, 1);
        // The submitted payload is the normalized draft.
        assert!(saved[0].1.contains(r#""headline":"One""#));
        assert!(saved[0].1.contains(r#""ctas""#));
    }

    #[tokio::test]
    async fn failed_save_keeps_snapshots_and_flags_error() {
        let mut editor = EditorReconciliation::new();
        open_hero(&mut editor, 1);
        editor.edit(1, r#"{"headline":"One"}"#);
        let before_draft = editor.draft(1).cloned();
        let before_persisted = editor.last_persisted(1).cloned();

        let persister = RecordingPersister::default();
        *persister.fail.lock().unwrap() = true;

        let err = editor.save(1, &persister).await.unwrap_err();
        assert!(matches!(err, SaveError::Persist { section_id: 1, .. }));
        assert_eq!(editor.status(1), Some(SectionStatus::Dirty));
        assert_eq!(editor.error(1), Some("store unavailable"));
        assert_eq!(editor.draft(1).cloned(), before_draft);
        assert_eq!(editor.last_persisted(1).cloned(), before_persisted);

        // Retry with the same draft succeeds and clears the error.
        *persister.fail.lock().unwrap() = false;
        editor.save(1, &persister).await.unwrap();
        assert_eq!(editor.status(1), Some(SectionStatus::Clean));
        assert_eq!(editor.error(1), None);
    }

    #[tokio::test]
    async fn saving_a_clean_section_is_a_no_op() {
        let mut editor = EditorReconciliation::new();
        open_hero(&mut editor, 1);

        let persister = RecordingPersister::default();
        editor.save(1, &persister).await.unwrap();
        assert!(persister.saved.lock().unwrap().is_empty());

        assert!(matches!(
            editor.save(99, &persister).await,
            Err(SaveError::UnknownSection(99))
        ));
    }

    #[test]
    fn two_phase_save_exposes_the_saving_state() {
        let mut editor = EditorReconciliation::new();
        open_hero(&mut editor, 1);
        editor.edit(1, r#"{"headline":"One"}"#);

        let pending = editor.begin_save(1).expect("dirty section yields a pending save");
        assert_eq!(editor.status(1), Some(SectionStatus::Saving));

        // A late edit while the request is in flight.
        editor.edit(1, r#"{"headline":"Two"}"#);
        assert_eq!(editor.status(1), Some(SectionStatus::Saving));

        editor.complete_save(pending.section_id, Ok(()));
        // The submitted snapshot persisted, but the late edit is still unsaved.
        assert_eq!(editor.status(1), Some(SectionStatus::Dirty));
        assert!(editor.is_dirty(1));
    }
}
