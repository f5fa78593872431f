// src/tui.rs
use crate::classifier::Classify;
use crate::editor::{Editor, EditorState, SubmitTicket};
use crate::error::{AppResult, ClassifyError, EditorError, TuiError};
use crate::images::{self, EncodedImages};
use crate::repository::Repository;
use crate::store::KeyValueStore;
use crate::theme::{self, Theme};
use crate::views::{self, SearchView, SidebarView};

use arboard; // For clipboard
use chrono::Local;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
};
use std::io::{stdout, Stdout};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use log;

const NORMAL_KEYS: &str =
    "(q) Quit | (r) Reload | (j/k) Nav | (Enter) Edit | (n) New | (/) Search | (a) Attach | (x) Drop img | (d) Del | (C) Clear all | (y) Copy | (t) Theme";

#[derive(PartialEq, Debug, Clone, Copy)]
pub enum InputMode {
    Normal,
    Editing,
    Search,
    AttachImages,
    ConfirmClear,
}

struct PendingSubmit {
    ticket: SubmitTicket,
    rx: oneshot::Receiver<Result<Vec<String>, ClassifyError>>,
}

struct Palette {
    fg: Color,
    bg: Color,
    muted: Color,
    accent: Color,
    highlight_bg: Color,
}

impl Palette {
    fn for_theme(theme: Theme) -> Self {
        if theme.is_light() {
            Palette {
                fg: Color::Black,
                bg: Color::White,
                muted: Color::DarkGray,
                accent: Color::Indexed(61),
                highlight_bg: Color::Gray,
            }
        } else {
            Palette {
                fg: Color::White,
                bg: Color::Rgb(0x20, 0x21, 0x23),
                muted: Color::Gray,
                accent: Color::Indexed(99),
                highlight_bg: Color::Rgb(0x44, 0x46, 0x54),
            }
        }
    }
}

fn emotion_color(label: &str) -> Color {
    match label.to_ascii_lowercase().as_str() {
        "joy" => Color::Rgb(0xfa, 0xcc, 0x15),
        "sadness" => Color::Rgb(0x3b, 0x82, 0xf6),
        "anger" => Color::Rgb(0xef, 0x44, 0x44),
        "fear" => Color::Rgb(0x93, 0x33, 0xea),
        "disgust" => Color::Rgb(0x10, 0xb9, 0x81),
        "surprise" => Color::Rgb(0xf9, 0x73, 0x16),
        _ => Color::Rgb(0x6b, 0x72, 0x80),
    }
}

fn emotion_spans(emotions: &[String]) -> Vec<Span<'static>> {
    let mut spans = Vec::with_capacity(emotions.len() * 2);
    for (i, label) in emotions.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw(" "));
        }
        spans.push(Span::styled(
            format!(" {} ", label),
            Style::default().fg(Color::Black).bg(emotion_color(label)),
        ));
    }
    spans
}

pub struct App<S: KeyValueStore, C: Classify> {
    should_quit: bool,
    repo: Repository<S>,
    editor: Editor,
    sidebar: SidebarView,
    list_state: ListState,
    search: SearchView,
    search_state: ListState,
    input_mode: InputMode,
    path_input: String,
    app_status: String,
    theme: Theme,
    classifier: C,
    clipboard_enabled: bool,
    pending_submit: Option<PendingSubmit>,
    images_tx: mpsc::UnboundedSender<EncodedImages>,
    images_rx: mpsc::UnboundedReceiver<EncodedImages>,
    images_loading: usize,
}

impl<S, C> App<S, C>
where
    S: KeyValueStore,
    C: Classify + Clone + Send + Sync + 'static,
{
    /// `requested` pre-selects an entry by id, if it exists.
    pub fn new(repo: Repository<S>, classifier: C, clipboard_enabled: bool, requested: Option<&str>) -> Self {
        let editor = Editor::open_with(&repo, requested);
        let theme = theme::load_theme(repo.storage().kv());
        let (images_tx, images_rx) = mpsc::unbounded_channel();
        let app_status = if repo.is_empty() {
            "Journal empty. Press (n) to write your first entry.".to_string()
        } else {
            format!("Loaded {} entries.", repo.len())
        };
        let mut app = App {
            should_quit: false,
            repo,
            editor,
            sidebar: SidebarView::default(),
            list_state: ListState::default(),
            search: SearchView::default(),
            search_state: ListState::default(),
            input_mode: InputMode::Normal,
            path_input: String::new(),
            app_status,
            theme,
            classifier,
            clipboard_enabled,
            pending_submit: None,
            images_tx,
            images_rx,
            images_loading: 0,
        };
        app.sync_sidebar();
        app
    }

    fn copy_to_clipboard(&mut self, content: String, what: &str) {
        if !self.clipboard_enabled {
            self.app_status = "Clipboard is disabled in the configuration.".to_string();
            return;
        }
        match arboard::Clipboard::new() {
            Ok(mut clipboard) => match clipboard.set_text(content) {
                Ok(_) => {
                    self.app_status = format!("{} copied to clipboard!", what);
                    log::info!("Copied {} to clipboard.", what);
                }
                Err(err) => {
                    self.app_status = format!("Error copying {}: {}", what, err);
                    log::error!("Error setting clipboard text for {}: {}", what, err);
                }
            },
            Err(err) => {
                self.app_status = format!("Error initializing clipboard: {}", err);
                log::error!("Error initializing clipboard: {}", err);
            }
        }
    }

    pub fn on_key(&mut self, key_event: KeyEvent) {
        log::debug!("Key event received: {:?}", key_event);
        match self.input_mode {
            InputMode::Normal => self.on_key_normal(key_event),
            InputMode::Editing => self.on_key_editing(key_event),
            InputMode::Search => self.on_key_search(key_event),
            InputMode::AttachImages => self.on_key_attach(key_event),
            InputMode::ConfirmClear => self.on_key_confirm_clear(key_event),
        }
    }

    fn on_key_normal(&mut self, key_event: KeyEvent) {
        match key_event.code {
            KeyCode::Char('q') => {
                self.flush_pending_submit();
                self.should_quit = true;
            }
            KeyCode::Char('r') => self.reload_entries(),
            KeyCode::Char('j') | KeyCode::Down => self.move_selection(1),
            KeyCode::Char('k') | KeyCode::Up => self.move_selection(-1),
            KeyCode::Enter | KeyCode::Char('e') | KeyCode::Char('i') => {
                self.input_mode = InputMode::Editing;
                self.app_status = "Editing... (Enter) Submit | (Alt+Enter) Newline | (Esc) Done".to_string();
            }
            KeyCode::Char('n') => {
                self.editor.new_entry();
                self.sync_sidebar();
                self.input_mode = InputMode::Editing;
                self.app_status = "New entry. How are you feeling today? (Esc) Done".to_string();
                log::info!("Started a new entry");
            }
            KeyCode::Char('s') => self.submit(),
            KeyCode::Char('/') => {
                self.input_mode = InputMode::Search;
                self.sync_search();
                self.app_status = "Search: type to filter | (Up/Down) Nav | (Enter) Open | (Esc) Back".to_string();
            }
            KeyCode::Char('a') => {
                self.input_mode = InputMode::AttachImages;
                self.path_input.clear();
            }
            KeyCode::Char('x') => {
                let last = self.editor.draft().images.len().checked_sub(1);
                match last.and_then(|idx| self.editor.remove_image(idx)) {
                    Some(_) => self.app_status = "Removed last image from the draft.".to_string(),
                    None => self.app_status = "No images attached.".to_string(),
                }
            }
            KeyCode::Char('d') => self.delete_selected(),
            KeyCode::Char('C') => {
                if self.repo.is_empty() {
                    self.app_status = "Nothing to clear.".to_string();
                } else {
                    self.input_mode = InputMode::ConfirmClear;
                }
            }
            KeyCode::Char('y') => {
                let text = self.editor.draft().text.clone();
                if text.is_empty() {
                    self.app_status = "Nothing to copy.".to_string();
                } else {
                    self.copy_to_clipboard(text, "Entry text");
                }
            }
            KeyCode::Char('t') => self.cycle_theme(),
            _ => {}
        }
    }

    fn on_key_editing(&mut self, key_event: KeyEvent) {
        match key_event.code {
            KeyCode::Esc => {
                self.input_mode = InputMode::Normal;
                self.app_status = String::new();
            }
            KeyCode::Enter
                if key_event.modifiers.intersects(KeyModifiers::SHIFT | KeyModifiers::ALT) =>
            {
                self.editor.text_mut().push('\n');
            }
            KeyCode::Enter => self.submit(),
            KeyCode::Char(c) => {
                self.editor.text_mut().push(c);
            }
            KeyCode::Backspace => {
                self.editor.text_mut().pop();
            }
            _ => {}
        }
    }

    fn on_key_search(&mut self, key_event: KeyEvent) {
        match key_event.code {
            KeyCode::Esc => {
                self.input_mode = InputMode::Normal;
                self.app_status = String::new();
            }
            KeyCode::Down => self.move_search_selection(1),
            KeyCode::Up => self.move_search_selection(-1),
            KeyCode::Enter => {
                let hit = self
                    .search_state
                    .selected()
                    .and_then(|idx| self.search.results(&self.repo).get(idx).map(|e| e.id));
                if let Some(id) = hit {
                    match self.editor.select_entry(&self.repo, id) {
                        Ok(()) => {
                            self.input_mode = InputMode::Normal;
                            self.app_status = "Opened entry from search.".to_string();
                        }
                        Err(e) => self.report_editor_error(e),
                    }
                    self.sync_sidebar();
                }
            }
            KeyCode::Char(c) => {
                self.search.push_char(c);
                self.sync_search();
            }
            KeyCode::Backspace => {
                self.search.pop_char();
                self.sync_search();
            }
            _ => {}
        }
    }

    fn on_key_attach(&mut self, key_event: KeyEvent) {
        match key_event.code {
            KeyCode::Esc => {
                self.input_mode = InputMode::Normal;
                self.path_input.clear();
                self.app_status = "Attach cancelled.".to_string();
            }
            KeyCode::Enter => {
                let paths: Vec<PathBuf> = self.path_input.split_whitespace().map(PathBuf::from).collect();
                self.path_input.clear();
                self.input_mode = InputMode::Normal;
                if paths.is_empty() {
                    self.app_status = "No image paths given.".to_string();
                    return;
                }
                self.app_status = format!("Reading {} image(s)...", paths.len());
                self.spawn_image_reads(paths);
            }
            KeyCode::Char(c) => self.path_input.push(c),
            KeyCode::Backspace => {
                self.path_input.pop();
            }
            _ => {}
        }
    }

    fn on_key_confirm_clear(&mut self, key_event: KeyEvent) {
        self.input_mode = InputMode::Normal;
        if let KeyCode::Char('y') | KeyCode::Char('Y') = key_event.code {
            match self.repo.clear_all() {
                Ok(()) => {
                    self.app_status = "All journal entries have been cleared.".to_string();
                }
                Err(e) => {
                    self.app_status = format!("Failed to clear entries: {}", e);
                    log::error!("Failed to clear entries: {}", e);
                }
            }
            self.editor.reconcile(&self.repo);
            self.sync_sidebar();
        } else {
            self.app_status = "Clear cancelled.".to_string();
        }
    }

    fn submit(&mut self) {
        match self.editor.begin_submit() {
            Ok(ticket) => {
                let (tx, rx) = oneshot::channel();
                let classifier = self.classifier.clone();
                let text = ticket.text.clone();
                tokio::spawn(async move {
                    let outcome = classifier.classify(&text).await;
                    // The app may have quit in the meantime.
                    let _ = tx.send(outcome);
                });
                self.pending_submit = Some(PendingSubmit { ticket, rx });
                self.app_status = "Analyzing...".to_string();
            }
            Err(e) => self.report_editor_error(e),
        }
    }

    /// Saves an in-flight submit before quitting. A classification that has
    /// not answered yet is abandoned and the entry is stored as neutral.
    fn flush_pending_submit(&mut self) {
        let Some(mut pending) = self.pending_submit.take() else {
            return;
        };
        let outcome = match pending.rx.try_recv() {
            Ok(outcome) => outcome,
            Err(_) => {
                log::info!("Quitting while analyzing; saving entry without waiting for emotions");
                Err(ClassifyError::Aborted)
            }
        };
        self.complete_submit(pending.ticket, outcome);
    }

    fn reload_entries(&mut self) {
        if self.editor.is_busy() {
            self.app_status = "Wait for the analysis to finish before reloading.".to_string();
            return;
        }
        self.repo.reload();
        self.editor.reconcile(&self.repo);
        self.sync_sidebar();
        self.app_status = format!("Reloaded {} entries.", self.repo.len());
    }

    fn spawn_image_reads(&mut self, paths: Vec<PathBuf>) {
        let tx = self.images_tx.clone();
        self.images_loading += 1;
        tokio::spawn(async move {
            let encoded = images::encode_images(paths).await;
            let _ = tx.send(encoded);
        });
    }

    /// Picks up finished background work. Called once per loop iteration.
    pub fn poll_background(&mut self) {
        if let Some(mut pending) = self.pending_submit.take() {
            match pending.rx.try_recv() {
                Ok(outcome) => self.complete_submit(pending.ticket, outcome),
                Err(oneshot::error::TryRecvError::Empty) => self.pending_submit = Some(pending),
                Err(oneshot::error::TryRecvError::Closed) => {
                    self.complete_submit(pending.ticket, Err(ClassifyError::Aborted))
                }
            }
        }
        while let Ok(encoded) = self.images_rx.try_recv() {
            self.receive_images(encoded);
        }
    }

    fn complete_submit(&mut self, ticket: SubmitTicket, outcome: Result<Vec<String>, ClassifyError>) {
        let updating = ticket.target().is_some();
        match self.editor.finish_submit(&mut self.repo, ticket, outcome) {
            Ok(entry) => {
                self.app_status = format!(
                    "Entry {}. Detected: {}",
                    if updating { "updated" } else { "saved" },
                    entry.emotions.join(", ")
                );
            }
            Err(e) => self.report_editor_error(e),
        }
        self.sync_sidebar();
    }

    fn receive_images(&mut self, encoded: EncodedImages) {
        self.images_loading = self.images_loading.saturating_sub(1);
        let added = encoded.payloads.len();
        self.editor.attach_images(encoded.payloads);
        self.app_status = if encoded.failures.is_empty() {
            format!("Attached {} image(s).", added)
        } else {
            let first = encoded.failures[0].to_string();
            format!("Attached {} image(s), {} failed: {}", added, encoded.failures.len(), first)
        };
    }

    fn report_editor_error(&mut self, err: EditorError) {
        self.app_status = match &err {
            EditorError::Busy => "Still analyzing the previous submission...".to_string(),
            EditorError::BlankText => "Write something before submitting.".to_string(),
            EditorError::NotFound(_) => "That entry no longer exists. Your text is kept as a new entry.".to_string(),
            EditorError::Store(e) => format!("Failed to save: {}. Your draft is kept, submit again to retry.", e),
            EditorError::StaleTicket => "Ignored an outdated submission.".to_string(),
            EditorError::IdsExhausted => "Cannot create more entries: no ids left.".to_string(),
        };
        log::warn!("Editor error: {}", err);
    }

    fn delete_selected(&mut self) {
        let Some(id) = self.editor.selection() else {
            self.app_status = "No entry selected to delete.".to_string();
            return;
        };
        if self.editor.is_busy() {
            self.app_status = "Wait for the analysis to finish before deleting.".to_string();
            return;
        }
        match self.repo.remove(id) {
            Ok(()) => {
                self.editor.reconcile(&self.repo);
                self.app_status = "Entry deleted.".to_string();
            }
            Err(e) => {
                self.app_status = format!("Failed to delete entry: {}", e);
                log::error!("Failed to delete entry {}: {}", id, e);
            }
        }
        self.sync_sidebar();
    }

    fn cycle_theme(&mut self) {
        let next = match self.theme {
            Theme::System => Theme::Light,
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::System,
        };
        match theme::save_theme(self.repo.storage().kv(), next) {
            Ok(()) => {
                self.theme = next;
                self.app_status = format!("Theme: {}", next);
            }
            Err(e) => self.app_status = format!("Failed to save theme: {}", e),
        }
    }

    fn move_selection(&mut self, delta: i32) {
        let num_entries = self.repo.len();
        if num_entries == 0 {
            self.list_state.select(None);
            return;
        }
        let current = self.list_state.selected();
        let new_index = match current {
            Some(idx) => (idx as i32 + delta).clamp(0, num_entries as i32 - 1) as usize,
            None => 0,
        };
        let id = self.repo.load_all()[new_index].id;
        match self.editor.select_entry(&self.repo, id) {
            Ok(()) => self.list_state.select(Some(new_index)),
            Err(e) => self.report_editor_error(e),
        }
    }

    fn move_search_selection(&mut self, delta: i32) {
        let count = self.search.results(&self.repo).len();
        if count == 0 {
            self.search_state.select(None);
            return;
        }
        let current = self.search_state.selected().unwrap_or(0) as i32;
        self.search_state
            .select(Some((current + delta).clamp(0, count as i32 - 1) as usize));
    }

    fn sync_sidebar(&mut self) {
        let highlighted = self.sidebar.highlighted_index(&self.repo, self.editor.selection());
        self.list_state.select(highlighted);
    }

    fn sync_search(&mut self) {
        let count = self.search.results(&self.repo).len();
        let selected = match self.search_state.selected() {
            _ if count == 0 => None,
            Some(idx) if idx < count => Some(idx),
            _ => Some(0),
        };
        self.search_state.select(selected);
    }

    /// Re-syncs list highlights if the repository changed since the last frame.
    fn refresh_views(&mut self) {
        if self.sidebar.needs_resync(&self.repo) {
            self.sync_sidebar();
        }
        if self.search.needs_resync(&self.repo) {
            self.sync_search();
        }
    }

    #[cfg(test)]
    async fn settle(&mut self) {
        if let Some(pending) = self.pending_submit.take() {
            let outcome = pending.rx.await.unwrap_or(Err(ClassifyError::Aborted));
            self.complete_submit(pending.ticket, outcome);
        }
        while self.images_loading > 0 {
            match self.images_rx.recv().await {
                Some(encoded) => self.receive_images(encoded),
                None => break,
            }
        }
    }
}

/// Runs the terminal UI until the user quits. Must be called from within a
/// tokio runtime; background work is spawned onto it.
pub fn run_tui<S, C>(mut app: App<S, C>) -> AppResult<()>
where
    S: KeyValueStore,
    C: Classify + Clone + Send + Sync + 'static,
{
    log::info!("Initializing TUI...");
    enable_raw_mode().map_err(|e| { log::error!("Failed to enable raw mode: {}", e); TuiError::Io(e) })?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .map_err(|e| { log::error!("Failed to setup terminal screen: {}", e); TuiError::Io(e) })?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).map_err(|e| { log::error!("Failed to create terminal: {}", e); TuiError::Io(e) })?;

    log::info!("Starting TUI application loop.");
    let res = run_app_loop(&mut terminal, &mut app);
    log::info!("TUI application loop finished.");

    disable_raw_mode().map_err(|e| { log::error!("Failed to disable raw mode: {}", e); TuiError::Io(e) })?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .map_err(|e| { log::error!("Failed to restore terminal screen: {}", e); TuiError::Io(e) })?;

    res?;
    log::info!("TUI shutdown complete.");
    Ok(())
}

fn run_app_loop<S, C>(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App<S, C>) -> Result<(), TuiError>
where
    S: KeyValueStore,
    C: Classify + Clone + Send + Sync + 'static,
{
    while !app.should_quit {
        app.poll_background();
        app.refresh_views();
        terminal.draw(|f| ui(f, app)).map_err(|e| { log::error!("Terminal draw error: {}", e); TuiError::Io(e) })?;

        if event::poll(Duration::from_millis(100)).map_err(|e| { log::error!("Event poll error: {}", e); TuiError::Io(e) })? {
            if let Event::Key(key_event) = event::read().map_err(|e| { log::error!("Event read error: {}", e); TuiError::Io(e) })? {
                if key_event.kind == KeyEventKind::Press {
                    app.on_key(key_event);
                }
            }
        }
    }
    Ok(())
}

fn list_items(items: Vec<views::ListItem>, palette: &Palette) -> Vec<ListItem<'static>> {
    items
        .into_iter()
        .map(|item| {
            let mut meta = vec![Span::styled(item.date, Style::default().fg(palette.muted))];
            if item.image_count > 0 {
                meta.push(Span::styled(format!("  [{} img]", item.image_count), Style::default().fg(palette.muted)));
            }
            let title_style = if item.active {
                Style::default().fg(palette.accent).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(palette.fg)
            };
            ListItem::new(vec![
                Line::from(Span::styled(item.title, title_style)),
                Line::from(meta),
                Line::from(emotion_spans(&item.emotions)),
            ])
        })
        .collect()
}

fn draw_sidebar<S: KeyValueStore, C: Classify>(f: &mut Frame, area: Rect, app: &mut App<S, C>, palette: &Palette) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!("Mood Journal ({})", app.repo.len()));

    if app.repo.is_empty() {
        let empty = Paragraph::new("No entries yet.")
            .block(block)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        f.render_widget(empty, area);
        return;
    }

    let items = list_items(app.sidebar.items(&app.repo, app.editor.selection()), palette);
    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(palette.highlight_bg))
        .highlight_symbol("> ");
    f.render_stateful_widget(list, area, &mut app.list_state);
}

fn draw_editor<S: KeyValueStore, C: Classify>(f: &mut Frame, area: Rect, app: &App<S, C>, palette: &Palette) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(5),
            Constraint::Length(1),
            Constraint::Length(3),
        ])
        .split(area);

    let header = Line::from(vec![
        Span::styled("How are you feeling today?", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("  "),
        Span::styled(Local::now().format("%Y-%m-%d %H:%M:%S").to_string(), Style::default().fg(palette.muted)),
    ]);
    f.render_widget(Paragraph::new(header), chunks[0]);

    let editing = app.input_mode == InputMode::Editing;
    let draft = app.editor.draft();
    let body = if draft.text.is_empty() && !editing {
        Text::from(Span::styled("What are you currently thinking about?", Style::default().fg(palette.muted)))
    } else if editing {
        Text::from(format!("{}▋", draft.text))
    } else {
        Text::from(draft.text.clone())
    };
    let title = match (app.editor.state(), app.editor.selection()) {
        (EditorState::Classifying, _) => "Analyzing...",
        (_, Some(_)) => "Update Entry",
        (_, None) => "New Entry",
    };
    let text_block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(if editing { Style::default().fg(palette.accent) } else { Style::default() });
    f.render_widget(Paragraph::new(body).block(text_block).wrap(Wrap { trim: false }), chunks[1]);

    let mut images_line = format!("Images: {}", draft.images.len());
    if app.images_loading > 0 {
        images_line.push_str("  (reading...)");
    }
    f.render_widget(
        Paragraph::new(Span::styled(images_line, Style::default().fg(palette.muted))),
        chunks[2],
    );

    let emotions_block = Block::default().borders(Borders::ALL).title("Detected Emotions");
    f.render_widget(
        Paragraph::new(Line::from(emotion_spans(app.editor.emotions()))).block(emotions_block),
        chunks[3],
    );
}

fn draw_search<S: KeyValueStore, C: Classify>(f: &mut Frame, area: Rect, app: &mut App<S, C>, palette: &Palette) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    let input = Paragraph::new(format!("{}▋", app.search.query()))
        .block(Block::default().borders(Borders::ALL).title("Search Your Journal"));
    f.render_widget(input, chunks[0]);

    let items = app.search.items(&app.repo, app.editor.selection());
    if items.is_empty() {
        let none = Paragraph::new("No matching journal entries found.")
            .block(Block::default().borders(Borders::ALL))
            .alignment(Alignment::Center);
        f.render_widget(none, chunks[1]);
        return;
    }
    let list = List::new(list_items(items, palette))
        .block(Block::default().borders(Borders::ALL).title("Results"))
        .highlight_style(Style::default().bg(palette.highlight_bg))
        .highlight_symbol("> ");
    f.render_stateful_widget(list, chunks[1], &mut app.search_state);
}

fn draw_popup(f: &mut Frame, title: &str, body: String) {
    let area = centered_rect(60, 20, f.size());
    f.render_widget(Clear, area);
    let popup = Paragraph::new(body)
        .block(Block::default().title(title.to_string()).borders(Borders::ALL))
        .wrap(Wrap { trim: true });
    f.render_widget(popup, area);
}

/// Renders the UI widgets based on the application mode.
fn ui<S: KeyValueStore, C: Classify>(f: &mut Frame, app: &mut App<S, C>) {
    let palette = Palette::for_theme(app.theme);
    f.render_widget(Block::default().style(Style::default().fg(palette.fg).bg(palette.bg)), f.size());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(3)])
        .split(f.size());
    let main_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(chunks[0]);

    draw_sidebar(f, main_chunks[0], app, &palette);
    if app.input_mode == InputMode::Search {
        draw_search(f, main_chunks[1], app, &palette);
    } else {
        draw_editor(f, main_chunks[1], app, &palette);
    }

    let status_text = match app.input_mode {
        InputMode::Normal if app.app_status.is_empty() => NORMAL_KEYS.to_string(),
        InputMode::Normal => format!("{} | {}", app.app_status, NORMAL_KEYS),
        _ => app.app_status.clone(),
    };
    let status_paragraph = Paragraph::new(status_text)
        .block(Block::default().borders(Borders::ALL).title("Status"))
        .wrap(Wrap { trim: true });
    f.render_widget(status_paragraph, chunks[1]);

    match app.input_mode {
        InputMode::AttachImages => draw_popup(
            f,
            "Attach Images",
            format!("Image paths (space separated):\n{}▋\n\n(Enter) Attach | (Esc) Cancel", app.path_input),
        ),
        InputMode::ConfirmClear => draw_popup(
            f,
            "Clear Journal",
            format!("Delete all {} journal entries? (y/N)", app.repo.len()),
        ),
        _ => {}
    }
}

/// Helper to create a centered rect for popups.
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
