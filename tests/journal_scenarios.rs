use mood_journal::classifier::{Classify, EmotionClient};
use mood_journal::config::ClassifierConfig;
use mood_journal::editor::Editor;
use mood_journal::error::{ClassifyError, RepoError};
use mood_journal::models::Entry;
use mood_journal::repository::Repository;
use mood_journal::store::{EntryStorage, FileKvStore, KeyValueStore, MemoryKvStore};
use mood_journal::views::{SearchView, SidebarView};
use serde_json::json;
use tempfile::tempdir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn file_repo(dir: &std::path::Path) -> Repository<FileKvStore> {
    Repository::open(EntryStorage::new(FileKvStore::new(dir)))
}

struct Unavailable;

impl Classify for Unavailable {
    async fn classify(&self, _text: &str) -> Result<Vec<String>, ClassifyError> {
        Err(ClassifyError::Malformed("connection reset".into()))
    }
}

#[test]
fn created_entry_is_first_after_reload() {
    let dir = tempdir().unwrap();
    let mut repo = file_repo(dir.path());
    repo.create("earlier".into(), vec![], vec![]).unwrap();
    repo.create("Just now".into(), vec![], vec![]).unwrap();

    let reopened = file_repo(dir.path());
    assert_eq!(reopened.load_all()[0].text, "Just now");
    assert_eq!(reopened.load_all(), repo.load_all());
}

#[test]
fn exam_search_scenario() {
    let dir = tempdir().unwrap();
    let mut repo = file_repo(dir.path());
    repo.create("Feeling great today".into(), vec![], vec![]).unwrap();
    let second = repo.create("Worried about exam".into(), vec![], vec![]).unwrap();

    let hits = repo.filter_by_text("exam");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, second.id);
}

#[test]
fn update_unknown_id_leaves_file_untouched() {
    let dir = tempdir().unwrap();
    let mut repo = file_repo(dir.path());
    repo.create("only entry".into(), vec![], vec![]).unwrap();
    let stored = std::fs::read_to_string(dir.path().join("journalEntries.json")).unwrap();

    let err = repo.update(1, "ghost".into(), vec![], vec![]).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(1)));
    assert_eq!(
        std::fs::read_to_string(dir.path().join("journalEntries.json")).unwrap(),
        stored
    );
}

#[test]
fn clear_all_then_load_is_empty() {
    let dir = tempdir().unwrap();
    let mut repo = file_repo(dir.path());
    repo.create("a".into(), vec![], vec![]).unwrap();
    repo.create("b".into(), vec![], vec![]).unwrap();
    repo.clear_all().unwrap();

    assert!(repo.load_all().is_empty());
    assert!(file_repo(dir.path()).load_all().is_empty());
}

#[test]
fn persisted_form_matches_memory_byte_for_byte() {
    let kv = MemoryKvStore::new();
    let mut repo = Repository::open(EntryStorage::new(kv.clone()));
    let first = repo.create("one".into(), vec!["joy".into()], vec![]).unwrap();
    repo.create("two".into(), vec![], vec!["data:image/gif;base64,R0lG".into()]).unwrap();
    repo.update(first.id, "one, edited".into(), vec!["anger".into()], vec![]).unwrap();

    let raw = kv.get("journalEntries").unwrap().unwrap();
    assert_eq!(raw, serde_json::to_string(repo.load_all()).unwrap());
    let parsed: Vec<Entry> = serde_json::from_str(&raw).unwrap();
    assert_eq!(parsed, repo.load_all());
}

#[tokio::test]
async fn unavailable_classifier_still_saves_entry_as_neutral() {
    let dir = tempdir().unwrap();
    let mut repo = file_repo(dir.path());
    let mut editor = Editor::new();
    editor.set_text("Can't tell how I feel");

    let entry = editor.submit(&mut repo, &Unavailable).await.unwrap();
    assert_eq!(entry.emotions, vec!["Neutral".to_string()]);
    assert_eq!(file_repo(dir.path()).load_all()[0].emotions, vec!["Neutral".to_string()]);
}

#[tokio::test]
async fn editor_and_views_stay_consistent_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/detect_emotions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "emotions": ["joy", "surprise"] })))
        .mount(&server)
        .await;
    let client = EmotionClient::new(&ClassifierConfig {
        endpoint: format!("{}/detect_emotions", server.uri()),
        timeout_seconds: 5,
    })
    .unwrap();

    let dir = tempdir().unwrap();
    let mut repo = file_repo(dir.path());
    let mut editor = Editor::new();
    let mut sidebar = SidebarView::default();
    let mut search = SearchView::default();
    assert!(sidebar.needs_resync(&repo));

    editor.set_text("Passed the exam!");
    let created = editor.submit(&mut repo, &client).await.unwrap();
    assert_eq!(created.emotions, vec!["joy".to_string(), "surprise".to_string()]);

    editor.new_entry();
    editor.set_text("Quiet evening");
    editor.submit(&mut repo, &client).await.unwrap();

    // Re-open the first entry and edit it; its place in the list must not move.
    editor.select_entry(&repo, created.id).unwrap();
    editor.set_text("Passed the exam with honours!");
    let updated = editor.submit(&mut repo, &client).await.unwrap();
    assert_eq!(updated.id, created.id);
    assert_eq!(updated.date, created.date);

    assert!(sidebar.needs_resync(&repo));
    let items = sidebar.items(&repo, editor.selection());
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].title, "Quiet evening");
    assert!(items[1].active);

    search.set_query("HONOURS");
    let hits = search.results(&repo);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, created.id);

    assert_eq!(file_repo(dir.path()).load_all(), repo.load_all());
}
