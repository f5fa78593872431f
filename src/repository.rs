// src/repository.rs
use crate::error::{RepoError, RepoResult};
use crate::models::{Collection, Entry, EntryId};
use crate::store::{EntryStorage, KeyValueStore};
use chrono::{DateTime, Utc};
use log;

/// Hands out ids that double as creation timestamps (ms since epoch) and never
/// repeat, even when the clock has not advanced between calls.
#[derive(Debug, Clone, Default)]
pub struct IdAllocator {
    last: EntryId,
}

impl IdAllocator {
    pub fn seeded_from(entries: &[Entry]) -> Self {
        Self {
            last: entries.iter().map(|e| e.id).max().unwrap_or(0),
        }
    }

    /// `None` once the id space is used up.
    pub fn next(&mut self, now: DateTime<Utc>) -> Option<EntryId> {
        let id = now.timestamp_millis().max(self.last.checked_add(1)?);
        self.last = id;
        Some(id)
    }
}

/// Owns the working copy of the journal. Every mutation is built on a copy,
/// written through the storage adapter, and only then swapped in.
pub struct Repository<S: KeyValueStore> {
    storage: EntryStorage<S>,
    entries: Collection,
    ids: IdAllocator,
    revision: u64,
}

impl<S: KeyValueStore> Repository<S> {
    pub fn open(storage: EntryStorage<S>) -> Self {
        let entries = storage.load();
        let ids = IdAllocator::seeded_from(&entries);
        Self {
            storage,
            entries,
            ids,
            revision: 0,
        }
    }

    pub fn storage(&self) -> &EntryStorage<S> {
        &self.storage
    }

    pub fn load_all(&self) -> &[Entry] {
        &self.entries
    }

    /// Bumped on every committed change; views compare it to know when to redraw.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops the working copy and re-reads what is persisted.
    pub fn reload(&mut self) {
        self.entries = self.storage.load();
        let reseeded = IdAllocator::seeded_from(&self.entries);
        if reseeded.last > self.ids.last {
            self.ids = reseeded;
        }
        self.revision += 1;
    }

    pub fn find_by_id(&self, id: EntryId) -> Option<&Entry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn position(&self, id: EntryId) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }

    /// Case-insensitive substring match on `text`, in collection order.
    pub fn filter_by_text(&self, query: &str) -> Vec<&Entry> {
        if query.is_empty() {
            return self.entries.iter().collect();
        }
        let needle = query.to_lowercase();
        self.entries
            .iter()
            .filter(|e| e.text.to_lowercase().contains(&needle))
            .collect()
    }

    pub fn create(&mut self, text: String, emotions: Vec<String>, images: Vec<String>) -> RepoResult<Entry> {
        self.create_at(Utc::now(), text, emotions, images)
    }

    pub(crate) fn create_at(
        &mut self,
        now: DateTime<Utc>,
        text: String,
        emotions: Vec<String>,
        images: Vec<String>,
    ) -> RepoResult<Entry> {
        let mut ids = self.ids.clone();
        let id = ids.next(now).ok_or_else(|| {
            log::error!("No entry id left after {}", self.ids.last);
            RepoError::IdsExhausted
        })?;
        let entry = Entry::new(id, now, text, emotions, images);

        let mut next = Vec::with_capacity(self.entries.len() + 1);
        next.push(entry.clone());
        next.extend(self.entries.iter().cloned());

        self.commit(next)?;
        self.ids = ids;
        log::info!("Created entry {}", entry.id);
        Ok(entry)
    }

    pub fn update(
        &mut self,
        id: EntryId,
        text: String,
        emotions: Vec<String>,
        images: Vec<String>,
    ) -> RepoResult<Entry> {
        let idx = self.position(id).ok_or_else(|| {
            log::warn!("Update requested for unknown entry {}", id);
            RepoError::NotFound(id)
        })?;

        let mut next = self.entries.clone();
        let entry = &mut next[idx];
        entry.text = text;
        entry.emotions = emotions;
        entry.images = images;
        let updated = entry.clone();

        self.commit(next)?;
        log::info!("Updated entry {}", id);
        Ok(updated)
    }

    pub fn remove(&mut self, id: EntryId) -> RepoResult<()> {
        let idx = self.position(id).ok_or(RepoError::NotFound(id))?;
        let mut next = self.entries.clone();
        next.remove(idx);
        self.commit(next)?;
        log::info!("Removed entry {}", id);
        Ok(())
    }

    pub fn clear_all(&mut self) -> RepoResult<()> {
        self.storage.clear()?;
        self.entries.clear();
        self.revision += 1;
        log::info!("Cleared all entries");
        Ok(())
    }

    fn commit(&mut self, next: Collection) -> RepoResult<()> {
        if let Err(e) = self.storage.save(&next) {
            log::error!("Persisting journal failed, keeping previous state: {}", e);
            return Err(RepoError::Store(e));
        }
        self.entries = next;
        self.revision += 1;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::error::{StoreError, StoreResult};
    use crate::store::{KeyValueStore, MemoryKvStore};
    use std::io;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    /// Memory storage whose writes can be switched off.
    #[derive(Clone, Default)]
    pub struct FlakyKvStore {
        pub inner: MemoryKvStore,
        pub fail_writes: Arc<AtomicBool>,
    }

    impl FlakyKvStore {
        pub fn set_failing(&self, failing: bool) {
            self.fail_writes.store(failing, Ordering::SeqCst);
        }

        fn check(&self) -> StoreResult<()> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(StoreError::Io(io::Error::new(io::ErrorKind::Other, "disk full")));
            }
            Ok(())
        }
    }

    impl KeyValueStore for FlakyKvStore {
        fn get(&self, key: &str) -> StoreResult<Option<String>> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> StoreResult<()> {
            self.check()?;
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> StoreResult<()> {
            self.check()?;
            self.inner.remove(key)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::FlakyKvStore;
    use super::*;
    use crate::store::MemoryKvStore;
    use chrono::TimeZone;
    use std::collections::HashSet;

    fn memory_repo() -> Repository<MemoryKvStore> {
        Repository::open(EntryStorage::new(MemoryKvStore::new()))
    }

    #[test]
    fn test_create_prepends_and_persists() {
        let mut repo = memory_repo();
        repo.create("older".into(), vec![], vec![]).unwrap();
        let newest = repo.create("Feeling fine".into(), vec![], vec![]).unwrap();

        assert_eq!(repo.load_all()[0], newest);
        assert_eq!(repo.load_all()[1].text, "older");
        assert_eq!(repo.storage().load(), repo.load_all());
    }

    #[test]
    fn test_rapid_creates_get_unique_ids() {
        let mut repo = memory_repo();
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        for i in 0..50 {
            repo.create_at(now, format!("entry {}", i), vec![], vec![]).unwrap();
        }
        let ids: HashSet<_> = repo.load_all().iter().map(|e| e.id).collect();
        assert_eq!(ids.len(), 50);
        // Newest first means ids descend.
        assert!(repo.load_all().windows(2).all(|w| w[0].id > w[1].id));
    }

    #[test]
    fn test_id_allocator_follows_clock_when_ahead() {
        let mut ids = IdAllocator::default();
        let t1 = Utc.timestamp_millis_opt(1_000).unwrap();
        let t2 = Utc.timestamp_millis_opt(5_000).unwrap();
        assert_eq!(ids.next(t1), Some(1_000));
        assert_eq!(ids.next(t1), Some(1_001));
        assert_eq!(ids.next(t2), Some(5_000));
    }

    #[test]
    fn test_create_after_max_id_errors_instead_of_overflowing() {
        let kv = MemoryKvStore::new();
        kv.set(
            crate::store::ENTRIES_KEY,
            &format!(r#"[{{"id":{},"text":"last","date":"2025-06-01T12:00:00.000Z"}}]"#, i64::MAX),
        )
        .unwrap();
        let mut repo = Repository::open(EntryStorage::new(kv.clone()));
        let before = kv.get(crate::store::ENTRIES_KEY).unwrap();

        let err = repo.create("next".into(), vec![], vec![]).unwrap_err();
        assert!(matches!(err, RepoError::IdsExhausted));
        assert_eq!(repo.len(), 1);
        assert_eq!(kv.get(crate::store::ENTRIES_KEY).unwrap(), before);
    }

    #[test]
    fn test_ids_never_reuse_stored_ones_after_reopen() {
        let kv = MemoryKvStore::new();
        let mut repo = Repository::open(EntryStorage::new(kv.clone()));
        let far_future = Utc.with_ymd_and_hms(2999, 1, 1, 0, 0, 0).unwrap();
        let stored = repo.create_at(far_future, "from the future".into(), vec![], vec![]).unwrap();

        let mut reopened = Repository::open(EntryStorage::new(kv));
        let fresh = reopened.create("today".into(), vec![], vec![]).unwrap();
        assert!(fresh.id > stored.id);
    }

    #[test]
    fn test_update_keeps_id_date_and_position() {
        let mut repo = memory_repo();
        let a = repo.create("a".into(), vec![], vec![]).unwrap();
        let b = repo.create("b".into(), vec![], vec![]).unwrap();
        repo.create("c".into(), vec![], vec![]).unwrap();

        let updated = repo
            .update(b.id, "b2".into(), vec!["joy".into()], vec!["data:image/png;base64,AA".into()])
            .unwrap();

        assert_eq!(updated.id, b.id);
        assert_eq!(updated.date, b.date);
        assert_eq!(repo.position(b.id), Some(1));
        assert_eq!(repo.load_all()[1].text, "b2");
        assert_eq!(repo.load_all()[1].emotions, vec!["joy".to_string()]);
        assert_eq!(repo.find_by_id(a.id).unwrap().text, "a");
        assert_eq!(repo.storage().load(), repo.load_all());
    }

    #[test]
    fn test_update_missing_id_is_not_found_and_changes_nothing() {
        let mut repo = memory_repo();
        repo.create("only".into(), vec![], vec![]).unwrap();
        let before = repo.storage().load();
        let revision = repo.revision();

        let err = repo.update(42, "x".into(), vec![], vec![]).unwrap_err();
        assert!(matches!(err, RepoError::NotFound(42)));
        assert_eq!(repo.storage().load(), before);
        assert_eq!(repo.revision(), revision);
    }

    #[test]
    fn test_failed_save_rolls_back_create() {
        let kv = FlakyKvStore::default();
        let mut repo = Repository::open(EntryStorage::new(kv.clone()));
        repo.create("kept".into(), vec![], vec![]).unwrap();

        kv.set_failing(true);
        let err = repo.create("lost".into(), vec![], vec![]).unwrap_err();
        assert!(matches!(err, RepoError::Store(_)));
        assert_eq!(repo.len(), 1);
        assert_eq!(repo.load_all()[0].text, "kept");

        let first = repo.load_all()[0].id;
        assert!(repo.update(first, "changed".into(), vec![], vec![]).is_err());
        assert_eq!(repo.load_all()[0].text, "kept");
        assert!(repo.clear_all().is_err());
        assert_eq!(repo.len(), 1);

        kv.set_failing(false);
        assert_eq!(repo.storage().load(), repo.load_all());
    }

    #[test]
    fn test_filter_by_text() {
        let mut repo = memory_repo();
        repo.create("Feeling great today".into(), vec![], vec![]).unwrap();
        let exam = repo.create("Worried about exam".into(), vec![], vec![]).unwrap();

        let hits = repo.filter_by_text("exam");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, exam.id);

        assert_eq!(repo.filter_by_text("FEELING").len(), 1);
        assert!(repo.filter_by_text("nothing like this").is_empty());

        let all: Vec<Entry> = repo.filter_by_text("").into_iter().cloned().collect();
        assert_eq!(all, repo.load_all());
    }

    #[test]
    fn test_load_all_is_idempotent() {
        let mut repo = memory_repo();
        repo.create("x".into(), vec![], vec![]).unwrap();
        let first = repo.load_all().to_vec();
        assert_eq!(repo.load_all(), first.as_slice());
    }

    #[test]
    fn test_remove_and_clear_all() {
        let mut repo = memory_repo();
        let a = repo.create("a".into(), vec![], vec![]).unwrap();
        repo.create("b".into(), vec![], vec![]).unwrap();

        repo.remove(a.id).unwrap();
        assert!(repo.find_by_id(a.id).is_none());
        assert!(matches!(repo.remove(a.id), Err(RepoError::NotFound(_))));

        repo.clear_all().unwrap();
        assert!(repo.load_all().is_empty());
        assert!(repo.storage().load().is_empty());
    }

    #[test]
    fn test_reload_sees_external_writes() {
        let kv = MemoryKvStore::new();
        let mut repo = Repository::open(EntryStorage::new(kv.clone()));
        let mut other = Repository::open(EntryStorage::new(kv));
        other.create("written elsewhere".into(), vec![], vec![]).unwrap();

        assert!(repo.is_empty());
        let revision = repo.revision();
        repo.reload();
        assert_eq!(repo.len(), 1);
        assert!(repo.revision() > revision);
    }
}
