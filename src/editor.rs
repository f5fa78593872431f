// src/editor.rs
//! Editor controller: owns the active selection and the draft, and turns a
//! submit into classify-then-persist against the repository.
//!
//! A submit is split into [`Editor::begin_submit`] and [`Editor::finish_submit`]
//! so an event loop can run the classifier in the background and hand the
//! result back later. [`Editor::submit`] does both in one call.

use crate::classifier::{self, Classify};
use crate::error::{ClassifyError, EditorError, RepoError};
use crate::models::{Draft, Entry, EntryId};
use crate::repository::Repository;
use crate::store::KeyValueStore;
use log;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorState {
    Idle,
    Editing,
    Classifying,
}

/// Everything a background classification needs, captured at submit time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitTicket {
    seq: u64,
    target: Option<EntryId>,
    pub text: String,
    pub images: Vec<String>,
}

impl SubmitTicket {
    pub fn target(&self) -> Option<EntryId> {
        self.target
    }
}

#[derive(Debug)]
struct InFlight {
    seq: u64,
    // Set by `new_entry` while classifying: the result is saved but not shown.
    detached: bool,
}

#[derive(Debug)]
pub struct Editor {
    state: EditorState,
    selection: Option<EntryId>,
    draft: Draft,
    emotions: Vec<String>,
    in_flight: Option<InFlight>,
    next_seq: u64,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}

impl Editor {
    pub fn new() -> Self {
        Self {
            state: EditorState::Idle,
            selection: None,
            draft: Draft::default(),
            emotions: Vec::new(),
            in_flight: None,
            next_seq: 0,
        }
    }

    /// Initial selection on startup: the requested id if it exists, otherwise
    /// the newest entry. Unknown or unparsable ids are ignored.
    pub fn open_with<S: KeyValueStore>(repo: &Repository<S>, requested: Option<&str>) -> Self {
        let mut editor = Self::new();
        let requested = requested.and_then(|raw| {
            let found = repo.load_all().iter().find(|e| e.id.to_string() == raw.trim());
            if found.is_none() {
                log::debug!("Requested entry {:?} not found, ignoring", raw);
            }
            found
        });
        if let Some(entry) = requested.or_else(|| repo.load_all().first()) {
            editor.show(entry);
        }
        editor
    }

    pub fn state(&self) -> EditorState {
        self.state
    }

    pub fn selection(&self) -> Option<EntryId> {
        self.selection
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    /// Emotions of the last submitted or selected entry.
    pub fn emotions(&self) -> &[String] {
        &self.emotions
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn can_submit(&self) -> bool {
        !self.is_busy() && self.draft.is_submittable()
    }

    fn show(&mut self, entry: &Entry) {
        self.selection = Some(entry.id);
        self.draft = Draft::from_entry(entry);
        self.emotions = entry.emotions.clone();
        if self.in_flight.is_none() {
            self.state = EditorState::Editing;
        }
    }

    fn touch(&mut self) {
        if self.state == EditorState::Idle {
            self.state = EditorState::Editing;
        }
    }

    pub fn select_entry<S: KeyValueStore>(&mut self, repo: &Repository<S>, id: EntryId) -> Result<(), EditorError> {
        if self.is_busy() {
            return Err(EditorError::Busy);
        }
        match repo.find_by_id(id) {
            Some(entry) => {
                self.show(entry);
                Ok(())
            }
            None => {
                log::warn!("Selected entry {} does not exist, starting a new entry", id);
                self.new_entry();
                Err(EditorError::NotFound(id))
            }
        }
    }

    pub fn new_entry(&mut self) {
        if let Some(in_flight) = self.in_flight.as_mut() {
            in_flight.detached = true;
        }
        self.selection = None;
        self.draft = Draft::default();
        self.emotions.clear();
        self.state = EditorState::Editing;
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.draft.text = text.into();
        self.touch();
    }

    pub fn text_mut(&mut self) -> &mut String {
        self.touch();
        &mut self.draft.text
    }

    /// Appends decoded images; arrival order does not matter.
    pub fn attach_images(&mut self, payloads: Vec<String>) {
        self.draft.images.extend(payloads);
        self.touch();
    }

    pub fn clear_images(&mut self) {
        self.draft.images.clear();
    }

    pub fn remove_image(&mut self, index: usize) -> Option<String> {
        if index < self.draft.images.len() {
            Some(self.draft.images.remove(index))
        } else {
            None
        }
    }

    /// Drops a selection that no longer exists, e.g. after remove or clear all.
    pub fn reconcile<S: KeyValueStore>(&mut self, repo: &Repository<S>) {
        if let Some(id) = self.selection {
            if repo.find_by_id(id).is_none() {
                log::info!("Entry {} disappeared, resetting editor", id);
                self.new_entry();
            }
        }
    }

    pub fn begin_submit(&mut self) -> Result<SubmitTicket, EditorError> {
        if self.is_busy() {
            log::debug!("Submit rejected: classification already in flight");
            return Err(EditorError::Busy);
        }
        if !self.draft.is_submittable() {
            return Err(EditorError::BlankText);
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.in_flight = Some(InFlight { seq, detached: false });
        self.state = EditorState::Classifying;
        Ok(SubmitTicket {
            seq,
            target: self.selection,
            text: self.draft.text.clone(),
            images: self.draft.images.clone(),
        })
    }

    /// Persists a submission once classification has finished. A failed
    /// classification still saves the entry, labelled with the fallback emotion.
    pub fn finish_submit<S: KeyValueStore>(
        &mut self,
        repo: &mut Repository<S>,
        ticket: SubmitTicket,
        outcome: Result<Vec<String>, ClassifyError>,
    ) -> Result<Entry, EditorError> {
        let detached = match &self.in_flight {
            Some(in_flight) if in_flight.seq == ticket.seq => in_flight.detached,
            _ => return Err(EditorError::StaleTicket),
        };
        self.in_flight = None;
        self.state = EditorState::Editing;

        let emotions = classifier::recover(outcome);
        let saved = match ticket.target {
            Some(id) => repo.update(id, ticket.text, emotions, ticket.images),
            None => repo.create(ticket.text, emotions, ticket.images),
        };

        match saved {
            Ok(entry) => {
                if !detached {
                    self.show(&entry);
                }
                Ok(entry)
            }
            Err(RepoError::NotFound(id)) => {
                // Removed while we were classifying; keep the text as a new draft.
                if !detached && self.selection == Some(id) {
                    self.selection = None;
                    self.emotions.clear();
                }
                Err(EditorError::NotFound(id))
            }
            Err(e @ RepoError::IdsExhausted) | Err(e @ RepoError::Store(_)) => Err(e.into()),
        }
    }

    pub async fn submit<S: KeyValueStore, C: Classify>(
        &mut self,
        repo: &mut Repository<S>,
        classifier: &C,
    ) -> Result<Entry, EditorError> {
        let ticket = self.begin_submit()?;
        let outcome = classifier.classify(&ticket.text).await;
        self.finish_submit(repo, ticket, outcome)
    }
}
