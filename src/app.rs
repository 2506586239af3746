use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::config::Config;
use crate::store::{ModuleStore, StoreError};
use crate::ui::{DialogRequest, ModuleDialog, TerminalGuard};
use crate::wizard::ModuleWizard;

/// Outcome of a spawned create call
type SubmitResult = Result<(), StoreError>;

/// Outcome of a spawned module listing
type ListResult = Result<Vec<String>, StoreError>;

/// Run a store call on the runtime and send its result on `tx`.
///
/// A call that panics or is cancelled still reports, as
/// [`StoreError::Interrupted`], so the receiver is never left waiting.
fn spawn_store_call<T, F>(
    store_name: String,
    tx: mpsc::UnboundedSender<Result<T, StoreError>>,
    call: F,
) where
    T: Send + 'static,
    F: Future<Output = Result<T, StoreError>> + Send + 'static,
{
    let handle = tokio::spawn(call);
    tokio::spawn(async move {
        let result = match handle.await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(store = %store_name, error = %e, "Store task failed");
                Err(StoreError::interrupted(store_name, e.to_string()))
            }
        };
        // Receiver is gone only when the app is shutting down
        let _ = tx.send(result);
    });
}

/// Module list plus the wizard dialog
pub struct App {
    config: Config,
    store: Arc<dyn ModuleStore>,
    dialog: ModuleDialog,
    modules: Vec<String>,
    list_state: ListState,
    status: Option<String>,
    /// Set by the wizard after each created module
    refresh_requested: Arc<AtomicBool>,
    results_tx: mpsc::UnboundedSender<SubmitResult>,
    results_rx: mpsc::UnboundedReceiver<SubmitResult>,
    modules_tx: mpsc::UnboundedSender<ListResult>,
    modules_rx: mpsc::UnboundedReceiver<ListResult>,
    /// A listing is in progress
    refreshing: bool,
    should_quit: bool,
}

impl App {
    pub fn new(config: Config, store: Arc<dyn ModuleStore>) -> Self {
        let refresh_requested = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&refresh_requested);
        let wizard = ModuleWizard::new().with_on_created(move || {
            flag.store(true, Ordering::SeqCst);
        });
        let (results_tx, results_rx) = mpsc::unbounded_channel();
        let (modules_tx, modules_rx) = mpsc::unbounded_channel();

        Self {
            config,
            store,
            dialog: ModuleDialog::new(wizard),
            modules: Vec::new(),
            list_state: ListState::default(),
            status: None,
            refresh_requested,
            results_tx,
            results_rx,
            modules_tx,
            modules_rx,
            refreshing: false,
            should_quit: false,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut guard = TerminalGuard::new()?;
        let tick_rate = Duration::from_millis(self.config.ui.tick_rate_ms);

        while !self.should_quit {
            while let Ok(result) = self.results_rx.try_recv() {
                self.apply_submit_result(result);
            }
            while let Ok(result) = self.modules_rx.try_recv() {
                self.apply_modules(result);
            }
            self.start_refresh_if_requested();

            guard.terminal().draw(|f| self.render(f))?;

            if event::poll(tick_rate)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key);
                    }
                }
            }
        }

        guard.restore();
        Ok(())
    }

    /// Spawn a listing when one was requested and none is running
    fn start_refresh_if_requested(&mut self) {
        if self.refreshing || !self.refresh_requested.swap(false, Ordering::SeqCst) {
            return;
        }
        self.refreshing = true;
        let store = Arc::clone(&self.store);
        let tx = self.modules_tx.clone();
        spawn_store_call(self.store.name().to_string(), tx, async move {
            store.list().await
        });
    }

    fn apply_modules(&mut self, result: ListResult) {
        self.refreshing = false;
        match result {
            Ok(modules) => {
                tracing::debug!(
                    store = self.store.name(),
                    count = modules.len(),
                    "Loaded modules"
                );
                self.modules = modules;
                let selected = match self.list_state.selected() {
                    _ if self.modules.is_empty() => None,
                    Some(i) => Some(i.min(self.modules.len() - 1)),
                    None => Some(0),
                };
                self.list_state.select(selected);
            }
            Err(e) => {
                tracing::warn!(store = self.store.name(), error = %e, "Failed to list modules");
                self.status = Some(format!("Failed to list modules: {e}"));
            }
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        if self.dialog.visible {
            if let Some(DialogRequest::Submit(request)) = self.dialog.handle_key(key) {
                let store = Arc::clone(&self.store);
                let tx = self.results_tx.clone();
                spawn_store_call(self.store.name().to_string(), tx, async move {
                    store.create(&request).await
                });
            }
            return;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('n') => {
                self.status = None;
                self.dialog.show();
            }
            KeyCode::Char('r') => self.refresh_requested.store(true, Ordering::SeqCst),
            KeyCode::Down | KeyCode::Char('j') => self.select_offset(1),
            KeyCode::Up | KeyCode::Char('k') => self.select_offset(-1),
            _ => {}
        }
    }

    fn apply_submit_result(&mut self, result: SubmitResult) {
        if let Some(created) = self.dialog.complete_submission(result) {
            self.status = Some(created.message());
        }
    }

    fn select_offset(&mut self, offset: isize) {
        if self.modules.is_empty() {
            return;
        }
        let last = self.modules.len() - 1;
        let current = self.list_state.selected().unwrap_or(0);
        let next = current.saturating_add_signed(offset).min(last);
        self.list_state.select(Some(next));
    }

    fn render(&mut self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Min(3),    // Module list
                Constraint::Length(1), // Status bar
            ])
            .split(frame.area());

        let header = Paragraph::new(Line::from(vec![
            Span::styled(
                "Module Wizard",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("  store: {}", self.store.name()),
                Style::default().fg(Color::DarkGray),
            ),
        ]))
        .block(Block::default().borders(Borders::ALL));
        frame.render_widget(header, chunks[0]);

        let items: Vec<ListItem> = self
            .modules
            .iter()
            .map(|name| ListItem::new(name.as_str()))
            .collect();
        let list = List::new(items)
            .block(
                Block::default()
                    .title(format!(" Modules ({}) ", self.modules.len()))
                    .borders(Borders::ALL),
            )
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
        frame.render_stateful_widget(list, chunks[1], &mut self.list_state);

        let status = match &self.status {
            Some(message) => Line::from(Span::styled(
                message.as_str(),
                Style::default().fg(Color::Green),
            )),
            None => Line::from(vec![
                Span::styled("n", Style::default().fg(Color::Yellow)),
                Span::raw(" new module  "),
                Span::styled("r", Style::default().fg(Color::Yellow)),
                Span::raw(" refresh  "),
                Span::styled("q", Style::default().fg(Color::Yellow)),
                Span::raw(" quit"),
            ]),
        };
        frame.render_widget(Paragraph::new(status), chunks[2]);

        self.dialog.render(frame);
    }
}
