//! Main application state and event loop.
//!
//! The loop is synchronous: it owns the [`Poller`], ticks it once a
//! second, and dispatches the actual HTTP work onto a tokio runtime.
//! Results come back over channels and are drained between frames, so
//! every piece of feed state is touched from exactly one thread.

use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use vigil_core::{VigilConfig, VigilError};
use vigil_feed::{
    AlertFragment, BackoffPolicy, ConnectionState, FeedClient, FeedError, FeedEvent, FetchTicket,
    LiveSocket, NotificationPermission, Phase, Poller, PollerConfig, SocketEvent, TickOutcome,
};

use crate::alert_panel::{AckModal, AlertSelection, render_ack_modal, render_alert_panel};
use crate::event::{AppEvent, InputHandler};
use crate::status_bar::{StatusSnapshot, render_failure_banner, render_status_bar};

/// Result type for TUI operations.
pub type AppResult<T> = Result<T, VigilError>;

const FRAME_DURATION: Duration = Duration::from_millis(100);
const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Terminal bell, rung on arrival when sound is enabled.
const BELL: &str = "\x07";

/// Outcome of an acknowledge request, sent back from the runtime.
struct AckOutcome {
    fingerprint: String,
    result: Result<(), FeedError>,
}

/// The Vigil console application.
pub struct App {
    config: VigilConfig,
    poller: Poller,
    client: Arc<FeedClient>,
    runtime: tokio::runtime::Runtime,

    input: InputHandler,
    selection: AlertSelection,
    modal: Option<AckModal>,

    socket_state: ConnectionState,
    permission: NotificationPermission,
    sound_enabled: bool,

    fetch_tx: mpsc::UnboundedSender<(u64, Result<AlertFragment, FeedError>)>,
    fetch_rx: mpsc::UnboundedReceiver<(u64, Result<AlertFragment, FeedError>)>,
    ack_tx: mpsc::UnboundedSender<AckOutcome>,
    ack_rx: mpsc::UnboundedReceiver<AckOutcome>,
    socket_rx: Option<mpsc::UnboundedReceiver<SocketEvent>>,

    should_quit: bool,
    last_tick: Instant,
}

impl App {
    /// Create the application from a loaded configuration.
    pub fn new(config: VigilConfig) -> AppResult<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .map_err(|e| VigilError::internal(format!("failed to start runtime: {e}")))?;

        let client = FeedClient::new(&config.server, config.poll.timeout_secs)
            .map_err(|e| VigilError::internal(format!("failed to build HTTP client: {e}")))?;

        let interval = Duration::from_secs(config.poll.interval_secs);
        let poller = Poller::new(PollerConfig {
            interval_secs: config.poll.interval_secs,
            backoff: BackoffPolicy::for_poll(
                interval,
                Duration::from_secs(config.poll.backoff_max_secs),
                config.poll.backoff_multiplier,
            ),
        });

        let permission = if config.notifications.desktop {
            NotificationPermission::GrantedEnabled
        } else {
            NotificationPermission::GrantedDisabled
        };

        let (fetch_tx, fetch_rx) = mpsc::unbounded_channel();
        let (ack_tx, ack_rx) = mpsc::unbounded_channel();

        Ok(Self {
            sound_enabled: config.notifications.sound,
            config,
            poller,
            client: Arc::new(client),
            runtime,
            input: InputHandler::new(),
            selection: AlertSelection::new(),
            modal: None,
            socket_state: ConnectionState::default(),
            permission,
            fetch_tx,
            fetch_rx,
            ack_tx,
            ack_rx,
            socket_rx: None,
            should_quit: false,
            last_tick: Instant::now(),
        })
    }

    /// Run the main application loop.
    pub fn run(&mut self) -> AppResult<()> {
        crossterm::terminal::enable_raw_mode()
            .map_err(|e| VigilError::TerminalInit {
                message: e.to_string(),
            })?;
        let mut stdout = io::stdout();
        crossterm::execute!(
            stdout,
            crossterm::terminal::EnterAlternateScreen,
            crossterm::event::EnableFocusChange
        )
        .map_err(|e| VigilError::TerminalInit {
            message: e.to_string(),
        })?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).map_err(|e| VigilError::TerminalInit {
            message: e.to_string(),
        })?;

        self.start_socket();
        // First paint should not wait out a full interval.
        if let Some(ticket) = self.poller.force_refresh() {
            self.dispatch_fetch(ticket);
        }

        let result = self.run_loop(&mut terminal);

        crossterm::terminal::disable_raw_mode().map_err(|e| VigilError::TerminalRestore {
            message: e.to_string(),
        })?;
        crossterm::execute!(
            terminal.backend_mut(),
            crossterm::terminal::LeaveAlternateScreen,
            crossterm::event::DisableFocusChange
        )
        .map_err(|e| VigilError::TerminalRestore {
            message: e.to_string(),
        })?;
        terminal.show_cursor().map_err(|e| VigilError::TerminalRestore {
            message: e.to_string(),
        })?;

        result
    }

    fn run_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> AppResult<()> {
        while !self.should_quit {
            let frame_start = Instant::now();

            if self.last_tick.elapsed() >= TICK_INTERVAL {
                self.last_tick = Instant::now();
                self.on_tick();
            }

            self.drain_fetch_results();
            self.drain_socket_events();
            self.drain_ack_results();

            terminal
                .draw(|frame| self.draw(frame))
                .map_err(|e| VigilError::internal(format!("draw failed: {e}")))?;

            let elapsed = frame_start.elapsed();
            let timeout = FRAME_DURATION.saturating_sub(elapsed).max(Duration::from_millis(10));
            let ready = event::poll(timeout)
                .map_err(|e| VigilError::internal(format!("event poll failed: {e}")))?;
            if ready {
                match event::read()
                    .map_err(|e| VigilError::internal(format!("event read failed: {e}")))?
                {
                    Event::Key(key) => {
                        let app_event = self.input.handle_key(key);
                        self.handle_app_event(app_event);
                    }
                    Event::FocusGained => self.poller.set_visible(true),
                    Event::FocusLost => self.poller.set_visible(false),
                    _ => {}
                }
            }
        }
        Ok(())
    }

    /// Advance the poll countdown by one second.
    fn on_tick(&mut self) {
        match self.poller.tick() {
            TickOutcome::StartFetch(ticket) => self.dispatch_fetch(ticket),
            TickOutcome::Deferred => debug!("refresh deferred while unfocused"),
            TickOutcome::Suppressed => debug!("refresh suppressed, fetch in flight"),
            TickOutcome::Waiting { .. } => {}
        }
    }

    /// Hand a fetch ticket to the runtime; the result comes back over
    /// the fetch channel tagged with the ticket's sequence number.
    fn dispatch_fetch(&self, ticket: FetchTicket) {
        let client = Arc::clone(&self.client);
        let tx = self.fetch_tx.clone();
        self.runtime.spawn(async move {
            let result = client.fetch_fragment().await;
            let _ = tx.send((ticket.seq, result));
        });
    }

    fn start_socket(&mut self) {
        if !self.config.socket.enabled {
            info!("live socket disabled by configuration");
            return;
        }

        let backoff = BackoffPolicy::for_socket(
            Duration::from_secs(self.config.socket.reconnect_base_secs),
            Duration::from_secs(self.config.socket.reconnect_max_secs),
        );
        let socket = LiveSocket::new(self.config.server.socket_url.clone(), backoff);

        let (tx, rx) = mpsc::unbounded_channel();
        self.socket_rx = Some(rx);
        self.runtime.spawn(socket.run(tx));
    }

    fn drain_fetch_results(&mut self) {
        while let Ok((seq, result)) = self.fetch_rx.try_recv() {
            let events = self.poller.complete(seq, result);
            self.process_feed_events(&events);
        }
    }

    fn drain_socket_events(&mut self) {
        let Some(rx) = self.socket_rx.as_mut() else {
            return;
        };

        let mut fragments = Vec::new();
        while let Ok(event) = rx.try_recv() {
            self.socket_state.observe(&event);
            if let SocketEvent::Fragment(fragment) = event {
                fragments.push(fragment);
            }
        }

        for fragment in fragments {
            let events = self.poller.apply_push(fragment);
            self.process_feed_events(&events);
        }
    }

    fn drain_ack_results(&mut self) {
        while let Ok(outcome) = self.ack_rx.try_recv() {
            match outcome.result {
                Ok(()) => {
                    info!(fingerprint = %outcome.fingerprint, "alert acknowledged");
                    self.modal = None;
                    self.input.set_modal_mode(false);
                    // Pull the updated list right away instead of
                    // waiting out the countdown.
                    if let Some(ticket) = self.poller.force_refresh() {
                        self.dispatch_fetch(ticket);
                    }
                }
                Err(e) => {
                    warn!(fingerprint = %outcome.fingerprint, error = %e, "acknowledge failed");
                    if let Some(modal) = self.modal.as_mut() {
                        modal.submitting = false;
                        modal.error = Some(e.to_string());
                    }
                }
            }
        }
    }

    fn process_feed_events(&mut self, events: &[FeedEvent]) {
        for event in events {
            match event {
                FeedEvent::Applied { count, .. } => {
                    debug!(count, "fragment applied");
                    let rows = self
                        .poller
                        .feed()
                        .latest()
                        .map(|f| f.rows().len())
                        .unwrap_or(0);
                    self.selection.clamp(rows);
                }
                FeedEvent::ArrivalSignal { newly_arrived } => {
                    info!(newly_arrived, "new alerts arrived");
                    self.raise_arrival_signal(*newly_arrived);
                }
                FeedEvent::FetchFailed {
                    message,
                    retry_in_secs,
                    ..
                } => {
                    warn!(%message, retry_in_secs, "refresh failed");
                }
                FeedEvent::ErrorCleared => info!("refresh recovered"),
                FeedEvent::StaleDiscarded { seq } => debug!(seq, "stale response discarded"),
            }
        }
    }

    /// Ring the bell and/or emit a desktop notification, gated on the
    /// user toggles.
    fn raise_arrival_signal(&self, newly_arrived: usize) {
        use std::io::Write;

        if self.sound_enabled {
            let mut stdout = io::stdout();
            let _ = stdout.write_all(BELL.as_bytes());
            let _ = stdout.flush();
        }

        if self.permission.can_send() {
            // OSC 9 desktop notification; terminals without support
            // ignore the sequence.
            let mut stdout = io::stdout();
            let _ = write!(
                stdout,
                "\x1b]9;Vigil: {newly_arrived} new alert{}\x07",
                if newly_arrived == 1 { "" } else { "s" }
            );
            let _ = stdout.flush();
        }
    }

    fn handle_app_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Quit | AppEvent::ForceQuit => self.should_quit = true,

            AppEvent::Refresh => {
                if let Some(ticket) = self.poller.force_refresh() {
                    self.dispatch_fetch(ticket);
                }
            }

            AppEvent::NavigateUp => self.selection.move_up(),
            AppEvent::NavigateDown => {
                let rows = self.row_count();
                self.selection.move_down(rows);
            }

            AppEvent::OpenAcknowledge => self.open_acknowledge(),

            AppEvent::ToggleSound => {
                self.sound_enabled = !self.sound_enabled;
            }
            AppEvent::ToggleDesktop => {
                self.permission = self.permission.toggle();
            }

            AppEvent::TextInput(c) => {
                if let Some(modal) = self.modal.as_mut() {
                    if !modal.submitting {
                        modal.comment.push(c);
                    }
                }
            }
            AppEvent::Backspace => {
                if let Some(modal) = self.modal.as_mut() {
                    if !modal.submitting {
                        modal.comment.pop();
                    }
                }
            }
            AppEvent::Submit => self.submit_acknowledge(),
            AppEvent::Cancel => {
                self.modal = None;
                self.input.set_modal_mode(false);
            }

            AppEvent::None => {}
        }
    }

    fn open_acknowledge(&mut self) {
        let fingerprint = self
            .poller
            .feed()
            .latest()
            .map(|f| f.rows())
            .and_then(|rows| {
                self.selection
                    .selected_fingerprint(&rows)
                    .map(str::to_string)
            });

        match fingerprint {
            Some(fp) => self.modal = Some(AckModal::new(fp)),
            None => {
                // Nothing selected; 'a' does nothing
                self.input.set_modal_mode(false);
            }
        }
    }

    fn submit_acknowledge(&mut self) {
        let Some(modal) = self.modal.as_mut() else {
            return;
        };
        if modal.submitting {
            return;
        }
        if modal.comment.trim().is_empty() {
            modal.error = Some("a comment is required".to_string());
            return;
        }

        modal.submitting = true;
        modal.error = None;

        let fingerprint = modal.fingerprint.clone();
        let comment = modal.comment.clone();
        let client = Arc::clone(&self.client);
        let tx = self.ack_tx.clone();
        self.runtime.spawn(async move {
            let result = client.acknowledge(&fingerprint, &comment).await;
            if let Err(e) = &result {
                error!(%fingerprint, error = %e, "acknowledge request failed");
            }
            let _ = tx.send(AckOutcome {
                fingerprint,
                result,
            });
        });
    }

    fn row_count(&self) -> usize {
        self.poller
            .feed()
            .latest()
            .map(|f| f.rows().len())
            .unwrap_or(0)
    }

    fn status_snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            phase: self.poller.phase(),
            countdown: self.poller.countdown(),
            last_success: self.poller.feed().last_success(),
            last_error: self.poller.last_error().map(str::to_string),
            socket_connected: self.socket_state.connected,
            socket_enabled: self.config.socket.enabled,
            sound_enabled: self.sound_enabled,
            permission: self.permission,
            visible: self.poller.is_visible(),
        }
    }

    /// Draw the UI: alert list, optional failure banner, status bar.
    fn draw(&mut self, frame: &mut Frame) {
        let snapshot = self.status_snapshot();
        let has_banner = snapshot.phase == Phase::Error;

        let mut constraints = vec![Constraint::Min(3)];
        if has_banner {
            constraints.push(Constraint::Length(2));
        }
        constraints.push(Constraint::Length(2));

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(frame.area());

        let (rows, count) = match self.poller.feed().latest() {
            Some(fragment) => (fragment.rows(), fragment.count),
            None => (Vec::new(), 0),
        };
        render_alert_panel(frame, chunks[0], &rows, count, &self.selection);

        if has_banner {
            render_failure_banner(frame, chunks[1], &snapshot);
        }
        render_status_bar(frame, chunks[chunks.len() - 1], &snapshot);

        if let Some(modal) = &self.modal {
            render_ack_modal(frame, frame.area(), modal);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> App {
        App::new(VigilConfig::default().without_socket()).unwrap()
    }

    #[test]
    fn test_quit_events_stop_the_loop() {
        let mut app = app();
        app.handle_app_event(AppEvent::Quit);
        assert!(app.should_quit);
    }

    #[test]
    fn test_toggles_flip_state() {
        let mut app = app();
        let sound = app.sound_enabled;
        app.handle_app_event(AppEvent::ToggleSound);
        assert_eq!(app.sound_enabled, !sound);

        assert_eq!(app.permission, NotificationPermission::GrantedDisabled);
        app.handle_app_event(AppEvent::ToggleDesktop);
        assert_eq!(app.permission, NotificationPermission::GrantedEnabled);
    }

    #[test]
    fn test_acknowledge_with_empty_list_does_not_open_modal() {
        let mut app = app();
        app.handle_app_event(AppEvent::OpenAcknowledge);
        assert!(app.modal.is_none());
    }

    #[test]
    fn test_submit_requires_comment() {
        let mut app = app();
        app.modal = Some(AckModal::new("fp-1"));
        app.handle_app_event(AppEvent::Submit);

        let modal = app.modal.as_ref().unwrap();
        assert!(!modal.submitting);
        assert!(modal.error.is_some());
    }

    #[test]
    fn test_cancel_closes_modal() {
        let mut app = app();
        app.modal = Some(AckModal::new("fp-1"));
        app.handle_app_event(AppEvent::Cancel);
        assert!(app.modal.is_none());
    }

    #[test]
    fn test_modal_text_input() {
        let mut app = app();
        app.modal = Some(AckModal::new("fp-1"));
        app.handle_app_event(AppEvent::TextInput('o'));
        app.handle_app_event(AppEvent::TextInput('k'));
        app.handle_app_event(AppEvent::Backspace);

        assert_eq!(app.modal.as_ref().unwrap().comment, "o");
    }
}
