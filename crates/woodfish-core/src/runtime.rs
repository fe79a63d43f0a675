//! Async driver for [`MeritEngine`].
//!
//! One task owns the engine. Commands, timer deadlines and oracle
//! completions are multiplexed with `select!`, so every engine call runs to
//! completion before the next one starts. Oracle calls run on spawned tasks
//! and report back tagged with their outcome id or quote ticket.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{sleep, sleep_until, Instant};
use tracing::{debug, info};

use crate::error::Result;
use crate::events::Event;
use crate::fortune::FortuneRecord;
use crate::oracle::{AnyOracle, Oracle};
use crate::random::RngSource;
use crate::session::{EngineView, MeritEngine, OutcomeId, Point, QuoteTicket};
use crate::signals::TapSignals;
use crate::storage::{Config, MeritState};

/// Input from the UI layer.
#[derive(Debug)]
pub enum Command {
    Tap { x: f64, y: f64 },
    ToggleAutoTap,
    ToggleSound,
    ViewLastFortune,
    Dismiss,
    RequestQuote,
    SetViewport { width: f64, height: f64 },
    /// Reply with the current view.
    View(oneshot::Sender<EngineView>),
    Shutdown,
}

#[derive(Debug)]
enum Completion {
    Fortune(OutcomeId, FortuneRecord),
    Quote(QuoteTicket, String),
}

pub struct Runtime<O: Oracle> {
    engine: MeritEngine,
    oracle: Arc<O>,
    reveal_delay: Duration,
    started: Instant,
}

impl<O: Oracle> Runtime<O> {
    /// The engine clock starts at zero now.
    pub fn new(engine: MeritEngine, oracle: O, reveal_delay: Duration) -> Self {
        Self {
            engine,
            oracle: Arc::new(oracle),
            reveal_delay,
            started: Instant::now(),
        }
    }

    pub fn engine(&self) -> &MeritEngine {
        &self.engine
    }

    fn now_ms(&self) -> u64 {
        u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    /// Run until `Shutdown` or until every command sender is dropped, then
    /// hand the engine back. Outstanding oracle calls are abandoned.
    pub async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        events: mpsc::Sender<Event>,
    ) -> MeritEngine {
        let (done_tx, mut done_rx) = mpsc::unbounded_channel();
        info!("runtime started");

        loop {
            let deadline = self
                .engine
                .next_deadline()
                .map(|ms| self.started + Duration::from_millis(ms));

            let emitted = tokio::select! {
                cmd = commands.recv() => match cmd {
                    None | Some(Command::Shutdown) => break,
                    Some(cmd) => self.apply(cmd),
                },
                Some(done) = done_rx.recv() => self.complete(done),
                _ = wait_for(deadline) => {
                    let now = self.now_ms();
                    self.engine.tick(now)
                }
            };

            for event in emitted {
                self.spawn_requests(&event, &done_tx);
                if events.send(event).await.is_err() {
                    debug!("event receiver dropped");
                }
            }
        }

        info!(lifetime = self.engine.merit().lifetime_count(), "runtime stopped");
        self.engine
    }

    fn apply(&mut self, cmd: Command) -> Vec<Event> {
        let now = self.now_ms();
        // Timers that fell due before this command take effect first.
        let mut events = self.engine.tick(now);
        let event = match cmd {
            Command::Tap { x, y } => self.engine.process_tap(Point::new(x, y), false, now),
            Command::ToggleAutoTap => self.engine.toggle_auto_tap(now),
            Command::ToggleSound => Some(self.engine.toggle_sound()),
            Command::ViewLastFortune => self.engine.view_last_fortune(),
            Command::Dismiss => self.engine.dismiss(now),
            Command::RequestQuote => self.engine.request_quote(),
            Command::SetViewport { width, height } => {
                self.engine.set_viewport(width, height);
                None
            }
            Command::View(reply) => {
                let _ = reply.send(self.engine.view());
                None
            }
            Command::Shutdown => None,
        };
        events.extend(event);
        events
    }

    fn complete(&mut self, done: Completion) -> Vec<Event> {
        let event = match done {
            Completion::Fortune(id, fortune) => self.engine.complete_fortune(id, fortune),
            Completion::Quote(ticket, text) => self.engine.complete_quote(ticket, text),
        };
        event.into_iter().collect()
    }

    fn spawn_requests(&self, event: &Event, done: &mpsc::UnboundedSender<Completion>) {
        match event {
            Event::FortuneRequested { outcome_id, .. } => {
                let (id, oracle, done, delay) =
                    (*outcome_id, Arc::clone(&self.oracle), done.clone(), self.reveal_delay);
                tokio::spawn(async move {
                    let (_, fortune) = tokio::join!(sleep(delay), oracle.fortune());
                    let _ = done.send(Completion::Fortune(id, fortune));
                });
            }
            Event::QuoteRequested { ticket, .. } => {
                let (ticket, oracle, done) = (*ticket, Arc::clone(&self.oracle), done.clone());
                tokio::spawn(async move {
                    let text = oracle.short_quote().await;
                    let _ = done.send(Completion::Quote(ticket, text));
                });
            }
            _ => {}
        }
    }
}

impl Runtime<AnyOracle> {
    /// Runtime over the on-disk merit state, with timings and oracle taken
    /// from `config`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened.
    pub fn from_config(config: &Config, signals: impl TapSignals + 'static) -> Result<Self> {
        let engine = MeritEngine::new(
            config.engine_settings(),
            MeritState::open()?,
            RngSource::from_entropy(),
            signals,
        );
        let oracle = AnyOracle::from_config(config);
        if oracle.is_offline() {
            tracing::warn!("no API key set (GEMINI_API_KEY, API_KEY or oracle.api_key), using offline oracle");
        }
        Ok(Self::new(engine, oracle, config.reveal_delay()))
    }
}

async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(at) => sleep_until(at).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fortune::Luck;
    use crate::random::ScriptedSource;
    use crate::session::{EngineSettings, OutcomeMode};
    use crate::signals::SilentSignals;
    use crate::storage::{MemoryStore, MeritState, KEY_IS_GOLDEN, KEY_LIFETIME_COUNT};

    struct FixedOracle(FortuneRecord);

    impl Oracle for FixedOracle {
        async fn short_quote(&self) -> String {
            "一念清净".to_string()
        }

        async fn fortune(&self) -> FortuneRecord {
            self.0.clone()
        }
    }

    fn top_fortune() -> FortuneRecord {
        FortuneRecord {
            luck: Luck::Daikichi,
            ..FortuneRecord::fallback()
        }
    }

    fn engine(roll: f64, store: MemoryStore) -> MeritEngine {
        MeritEngine::new(
            EngineSettings::default(),
            MeritState::load(store),
            ScriptedSource::new([roll]),
            SilentSignals,
        )
    }

    async fn next_of_kind(rx: &mut mpsc::Receiver<Event>, kind: &str) -> Event {
        loop {
            let event = rx.recv().await.expect("channel closed");
            if event.kind() == kind {
                return event;
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn significant_session_reveals_fortune_after_delay() {
        let store = MemoryStore::new();
        let runtime = Runtime::new(
            engine(0.0, store.clone()),
            FixedOracle(top_fortune()),
            Duration::from_millis(1_500),
        );
        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let (ev_tx, mut ev_rx) = mpsc::channel(256);
        let handle = tokio::spawn(runtime.run(cmd_rx, ev_tx));

        for _ in 0..5 {
            cmd_tx.send(Command::Tap { x: 100.0, y: 400.0 }).await.unwrap();
        }

        let raised = next_of_kind(&mut ev_rx, "OutcomeRaised").await;
        match raised {
            Event::OutcomeRaised { outcome, .. } => {
                assert_eq!(outcome.mode, OutcomeMode::FortuneDraw);
                assert_eq!(outcome.session_merit, 5);
            }
            other => panic!("unexpected {other:?}"),
        }

        let revealed_at = Instant::now();
        match next_of_kind(&mut ev_rx, "FortuneRevealed").await {
            Event::FortuneRevealed { golden_unlocked, .. } => assert!(golden_unlocked),
            other => panic!("unexpected {other:?}"),
        }
        assert!(revealed_at.elapsed() >= Duration::from_millis(1_500));

        cmd_tx.send(Command::Shutdown).await.unwrap();
        let engine = handle.await.unwrap();
        assert!(engine.merit().is_golden());
        assert_eq!(engine.merit().lifetime_count(), 5);
        let persisted = store.snapshot();
        assert_eq!(persisted.get(KEY_IS_GOLDEN).map(String::as_str), Some("true"));
        assert_eq!(persisted.get(KEY_LIFETIME_COUNT).map(String::as_str), Some("5"));
    }

    #[tokio::test(start_paused = true)]
    async fn dismissed_draw_drops_late_fortune() {
        let runtime = Runtime::new(
            engine(0.0, MemoryStore::new()),
            FixedOracle(top_fortune()),
            Duration::from_millis(1_500),
        );
        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let (ev_tx, mut ev_rx) = mpsc::channel(256);
        let handle = tokio::spawn(runtime.run(cmd_rx, ev_tx));

        for _ in 0..5 {
            cmd_tx.send(Command::Tap { x: 0.0, y: 0.0 }).await.unwrap();
        }
        next_of_kind(&mut ev_rx, "OutcomeRaised").await;
        cmd_tx.send(Command::Dismiss).await.unwrap();
        next_of_kind(&mut ev_rx, "OutcomeDismissed").await;

        sleep(Duration::from_secs(3)).await;
        cmd_tx.send(Command::Shutdown).await.unwrap();
        let engine = handle.await.unwrap();
        assert!(engine.merit().last_fortune().is_none());
        assert!(!engine.merit().is_golden());
    }

    #[tokio::test(start_paused = true)]
    async fn resized_viewport_moves_auto_tap_feedback() {
        let runtime = Runtime::new(
            engine(99.0, MemoryStore::new()),
            FixedOracle(FortuneRecord::fallback()),
            Duration::ZERO,
        );
        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let (ev_tx, mut ev_rx) = mpsc::channel(64);
        let handle = tokio::spawn(runtime.run(cmd_rx, ev_tx));

        cmd_tx
            .send(Command::SetViewport { width: 200.0, height: 400.0 })
            .await
            .unwrap();
        cmd_tx.send(Command::ToggleAutoTap).await.unwrap();
        match next_of_kind(&mut ev_rx, "Tapped").await {
            Event::Tapped { automatic, feedback, .. } => {
                assert!(automatic);
                assert_eq!(feedback.position, Point::new(100.0, 120.0));
            }
            other => panic!("unexpected {other:?}"),
        }

        cmd_tx.send(Command::Shutdown).await.unwrap();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn quote_round_trip_and_view() {
        let runtime = Runtime::new(
            engine(99.0, MemoryStore::new()),
            FixedOracle(FortuneRecord::fallback()),
            Duration::ZERO,
        );
        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let (ev_tx, mut ev_rx) = mpsc::channel(64);
        let handle = tokio::spawn(runtime.run(cmd_rx, ev_tx));

        cmd_tx.send(Command::RequestQuote).await.unwrap();
        match next_of_kind(&mut ev_rx, "QuoteUpdated").await {
            Event::QuoteUpdated { text, .. } => assert_eq!(text, "一念清净"),
            other => panic!("unexpected {other:?}"),
        }

        let (reply_tx, reply_rx) = oneshot::channel();
        cmd_tx.send(Command::View(reply_tx)).await.unwrap();
        let view = reply_rx.await.unwrap();
        assert_eq!(view.quote, "一念清净");
        assert!(!view.quote_loading);

        drop(cmd_tx);
        handle.await.unwrap();
    }
}
