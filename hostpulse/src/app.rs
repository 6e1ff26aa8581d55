//! App state and main loop: the single dispatcher that funnels transport,
//! retrieval and keyboard events into the view coordinator, then draws.

use std::{
    io,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use anyhow::Context;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use hostpulse::{
    config::ClientConfig,
    history::HistoricalLoader,
    ConnectionState, TimeRange, TransportEvent, TransportManager, ViewCoordinator, ViewEvent,
    ViewMode,
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

const INPUT_TICK: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Quit,
    View(ViewEvent),
}

/// Map a key press onto an operator command.
pub fn key_action(code: KeyCode) -> Option<Action> {
    match code {
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Some(Action::Quit),
        KeyCode::Char('r') | KeyCode::Char('R') => {
            Some(Action::View(ViewEvent::SetViewMode(ViewMode::RealTime)))
        }
        KeyCode::Char('h') | KeyCode::Char('H') => {
            Some(Action::View(ViewEvent::SetViewMode(ViewMode::Historical)))
        }
        KeyCode::Char(c @ '1'..='3') => {
            let idx = c as usize - '1' as usize;
            Some(Action::View(ViewEvent::SetTimeRange(TimeRange::ALL[idx])))
        }
        _ => None,
    }
}

pub struct App {
    config: ClientConfig,
    view: ViewCoordinator,
    loader: HistoricalLoader,
    // Set while a current-snapshot fallback request is in flight.
    fallback_busy: Arc<AtomicBool>,
    should_quit: bool,
    dirty: bool,
}

impl App {
    pub fn new(config: ClientConfig) -> anyhow::Result<Self> {
        let loader = HistoricalLoader::new(config.api_url.clone())
            .context("building http client")?;
        Ok(Self {
            view: ViewCoordinator::new(config.window_capacity, config.history_cap),
            loader,
            config,
            fallback_busy: Arc::new(AtomicBool::new(false)),
            should_quit: false,
            dirty: true,
        })
    }

    pub async fn run(&mut self) -> anyhow::Result<()> {
        let (transport_tx, mut transport_rx) = mpsc::unbounded_channel::<TransportEvent>();
        let (view_tx, mut view_rx) = mpsc::unbounded_channel::<ViewEvent>();

        let mut transport = TransportManager::new(
            self.config.push_url.as_str(),
            self.config.retry_delay,
            transport_tx,
        );
        transport.open();
        self.spawn_health_check();

        // Terminal setup
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;

        let res = self
            .event_loop(&mut terminal, &mut transport_rx, &mut view_rx, &view_tx)
            .await;

        transport.close();

        // Teardown
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        res
    }

    async fn event_loop<B: ratatui::backend::Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
        transport_rx: &mut UnboundedReceiver<TransportEvent>,
        view_rx: &mut UnboundedReceiver<ViewEvent>,
        view_tx: &UnboundedSender<ViewEvent>,
    ) -> anyhow::Result<()> {
        let mut input_tick = tokio::time::interval(INPUT_TICK);
        let mut fallback_tick = tokio::time::interval(self.config.fallback_poll);
        fallback_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                Some(ev) = transport_rx.recv() => self.handle(ev.into(), view_tx),
                Some(ev) = view_rx.recv() => self.handle(ev, view_tx),
                _ = fallback_tick.tick() => self.poll_fallback(view_tx),
                _ = input_tick.tick() => {
                    // Input (non-blocking)
                    while event::poll(Duration::ZERO)? {
                        match event::read()? {
                            Event::Key(k) if k.kind == KeyEventKind::Press => {
                                match key_action(k.code) {
                                    Some(Action::Quit) => self.should_quit = true,
                                    Some(Action::View(ev)) => self.handle(ev, view_tx),
                                    None => {}
                                }
                            }
                            Event::Resize(_, _) => self.dirty = true,
                            _ => {}
                        }
                    }
                    if self.dirty {
                        let snap = self.view.snapshot();
                        terminal.draw(|f| crate::ui::draw(f, &snap))?;
                        self.dirty = false;
                    }
                }
            }
            if self.should_quit {
                break;
            }
        }
        Ok(())
    }

    fn handle(&mut self, ev: ViewEvent, view_tx: &UnboundedSender<ViewEvent>) {
        if let Some(req) = self.view.dispatch(ev) {
            self.loader.spawn_load(req, view_tx.clone());
        }
        self.dirty = true;
    }

    /// Poll the current-snapshot endpoint while the push channel is down.
    fn poll_fallback(&self, view_tx: &UnboundedSender<ViewEvent>) {
        if self.view.connection() == ConnectionState::Connected {
            return;
        }
        if self.fallback_busy.swap(true, Ordering::SeqCst) {
            return;
        }
        let loader = self.loader.clone();
        let busy = Arc::clone(&self.fallback_busy);
        let tx = view_tx.clone();
        tokio::spawn(async move {
            match loader.fetch_current().await {
                Ok(sample) => {
                    let _ = tx.send(ViewEvent::FallbackSample(sample));
                }
                Err(e) => debug!("fallback poll failed: {e}"),
            }
            busy.store(false, Ordering::SeqCst);
        });
    }

    fn spawn_health_check(&self) {
        let loader = self.loader.clone();
        tokio::spawn(async move {
            match loader.health().await {
                Ok(h) => info!(status = %h.status, service = %h.service, version = %h.version, "metrics server reachable"),
                Err(e) => warn!("health check failed: {e}"),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_map_to_commands() {
        assert_eq!(key_action(KeyCode::Char('q')), Some(Action::Quit));
        assert_eq!(key_action(KeyCode::Esc), Some(Action::Quit));
        assert!(matches!(
            key_action(KeyCode::Char('h')),
            Some(Action::View(ViewEvent::SetViewMode(ViewMode::Historical)))
        ));
        assert!(matches!(
            key_action(KeyCode::Char('r')),
            Some(Action::View(ViewEvent::SetViewMode(ViewMode::RealTime)))
        ));
        assert!(matches!(
            key_action(KeyCode::Char('3')),
            Some(Action::View(ViewEvent::SetTimeRange(TimeRange::Month)))
        ));
        assert!(matches!(
            key_action(KeyCode::Char('2')),
            Some(Action::View(ViewEvent::SetTimeRange(TimeRange::HalfMonth)))
        ));
        assert_eq!(key_action(KeyCode::Char('4')), None);
    }

    #[test]
    fn history_request_goes_through_dispatcher() {
        let config = ClientConfig::new("ws://127.0.0.1:1/ws/metrics", None).unwrap();
        let mut app = App::new(config).unwrap();
        let req = app
            .view
            .dispatch(ViewEvent::SetViewMode(ViewMode::Historical))
            .unwrap();
        assert_eq!(req.range, TimeRange::Week);
        assert!(app.view.snapshot().loading_history);
    }
}
