// src/views.rs
//! Read-only projections over the repository used by the sidebar and the
//! search screen. Neither keeps a copy of the collection; both are recomputed
//! from the repository and watch its revision to know when to re-sync.

use crate::models::{Entry, EntryId};
use crate::repository::Repository;
use crate::store::KeyValueStore;

const PREVIEW_CHARS: usize = 40;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListItem {
    pub id: EntryId,
    pub title: String,
    pub date: String,
    pub emotions: Vec<String>,
    pub image_count: usize,
    pub active: bool,
}

impl ListItem {
    fn from_entry(entry: &Entry, selection: Option<EntryId>) -> Self {
        let preview = entry.preview();
        let title = if preview.chars().count() > PREVIEW_CHARS {
            let cut: String = preview.chars().take(PREVIEW_CHARS).collect();
            format!("{}…", cut.trim_end())
        } else {
            preview.to_string()
        };
        let date = entry
            .created_at()
            .map(|d| d.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| entry.date.clone());
        ListItem {
            id: entry.id,
            title,
            date,
            emotions: entry.emotions.clone(),
            image_count: entry.images.len(),
            active: selection == Some(entry.id),
        }
    }
}

/// Tracks the last repository revision a view rendered.
#[derive(Debug, Default, Clone, Copy)]
pub struct RevisionWatch {
    seen: Option<u64>,
}

impl RevisionWatch {
    /// True the first time it sees a new revision.
    pub fn changed<S: KeyValueStore>(&mut self, repo: &Repository<S>) -> bool {
        let current = repo.revision();
        if self.seen == Some(current) {
            return false;
        }
        self.seen = Some(current);
        true
    }
}

/// Every entry, newest first, with the editor's selection highlighted.
#[derive(Debug, Default)]
pub struct SidebarView {
    watch: RevisionWatch,
}

impl SidebarView {
    pub fn items<S: KeyValueStore>(&self, repo: &Repository<S>, selection: Option<EntryId>) -> Vec<ListItem> {
        repo.load_all()
            .iter()
            .map(|e| ListItem::from_entry(e, selection))
            .collect()
    }

    pub fn highlighted_index<S: KeyValueStore>(&self, repo: &Repository<S>, selection: Option<EntryId>) -> Option<usize> {
        selection.and_then(|id| repo.position(id))
    }

    pub fn needs_resync<S: KeyValueStore>(&mut self, repo: &Repository<S>) -> bool {
        self.watch.changed(repo)
    }
}

/// Live substring search. Results are recomputed on every call; there is no
/// debounce because filtering is cheap.
#[derive(Debug, Default)]
pub struct SearchView {
    query: String,
    watch: RevisionWatch,
}

impl SearchView {
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    pub fn push_char(&mut self, c: char) {
        self.query.push(c);
    }

    pub fn pop_char(&mut self) {
        self.query.pop();
    }

    pub fn results<'a, S: KeyValueStore>(&self, repo: &'a Repository<S>) -> Vec<&'a Entry> {
        repo.filter_by_text(&self.query)
    }

    pub fn items<S: KeyValueStore>(&self, repo: &Repository<S>, selection: Option<EntryId>) -> Vec<ListItem> {
        self.results(repo)
            .into_iter()
            .map(|e| ListItem::from_entry(e, selection))
            .collect()
    }

    pub fn needs_resync<S: KeyValueStore>(&mut self, repo: &Repository<S>) -> bool {
        self.watch.changed(repo)
    }
}
