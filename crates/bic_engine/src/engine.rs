//! BCI Engine - lifecycle, timers and publication
//!
//! The engine runs one background task per `start()`. That task is the only
//! place the session is stepped, so generation, history sampling and
//! classification never overlap. Two timers live inside it:
//! - the generation ticker (fixed period)
//! - the settle timer, pushed back on every snapshot change and fired once
//!   the snapshot has been quiet for the settle delay
//!
//! `stop()` signals the task and waits for it to exit, so nothing is
//! published after it returns.

use bic_core::{
    BciConfig, BiometricSnapshot, ConfigError, ConnectionStatus, HistoryPoint, MentalState,
    SchedulerConfig, Tab, UserIntent,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::session::Session;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

type SnapshotHandler = Box<dyn Fn(&BiometricSnapshot) + Send + Sync>;
type StateHandler = Box<dyn Fn(&MentalState) + Send + Sync>;

/// State shared between the engine handle and its scheduler task
struct Shared {
    session: Mutex<Session>,
    snapshot_tx: watch::Sender<BiometricSnapshot>,
    state_tx: watch::Sender<MentalState>,
    history_tx: watch::Sender<Vec<HistoryPoint>>,
    snapshot_handlers: RwLock<Vec<SnapshotHandler>>,
    state_handlers: RwLock<Vec<StateHandler>>,
}

impl Shared {
    /// Generation tick: new snapshot, optional history point, publish.
    async fn generate(&self) {
        let (snapshot, history) = {
            let mut session = self.session.lock().await;
            let outcome = session.tick();
            tracing::trace!(
                tick = session.ticks(),
                stress = outcome.snapshot.stress,
                focus = outcome.snapshot.focus,
                fatigue = outcome.snapshot.fatigue,
                "Generated snapshot"
            );
            let history = outcome
                .history_point
                .map(|_| session.history().snapshot());
            (outcome.snapshot, history)
        };

        if let Some(points) = history {
            self.history_tx.send_replace(points);
        }
        self.publish_snapshot(&snapshot).await;
    }

    async fn inject(&self, snapshot: BiometricSnapshot) {
        let installed = self.session.lock().await.replace_snapshot(snapshot);
        tracing::debug!("Installed external snapshot");
        self.publish_snapshot(&installed).await;
    }

    /// Settle timer fired: classify the latest snapshot.
    async fn classify(&self) {
        let (verdict, current) = {
            let mut session = self.session.lock().await;
            let verdict = session.settle();
            (verdict, session.state().label)
        };

        match verdict {
            Some(state) => {
                tracing::debug!("Classified as {}", state.label);
                self.state_tx.send_replace(state.clone());
                for handler in self.state_handlers.read().await.iter() {
                    handler(&state);
                }
            }
            None => tracing::trace!("No rule matched, keeping {}", current),
        }
    }

    async fn publish_snapshot(&self, snapshot: &BiometricSnapshot) {
        self.snapshot_tx.send_replace(*snapshot);
        for handler in self.snapshot_handlers.read().await.iter() {
            handler(snapshot);
        }
    }
}

/// Handle to a running scheduler task
struct Runner {
    stop_tx: oneshot::Sender<()>,
    inject_tx: mpsc::Sender<BiometricSnapshot>,
    handle: JoinHandle<()>,
}

/// The simulator: owns the session and drives it on a timer.
pub struct BciEngine {
    shared: Arc<Shared>,
    timing: SchedulerConfig,
    runner: Mutex<Option<Runner>>,
    running: AtomicBool,
    active_tab: watch::Sender<Tab>,
}

impl BciEngine {
    /// Build an idle engine. Invalid configuration is rejected here.
    pub fn new(config: BciConfig) -> Result<Self, EngineError> {
        Self::with_session(Session::new(&config)?, config.scheduler)
    }

    /// Build an idle engine around an existing session. Timer settings are
    /// validated here, before any task can be spawned with them.
    pub fn with_session(session: Session, timing: SchedulerConfig) -> Result<Self, EngineError> {
        timing.validate()?;
        let (snapshot_tx, _) = watch::channel(*session.snapshot());
        let (state_tx, _) = watch::channel(session.state().clone());
        let (history_tx, _) = watch::channel(session.history().snapshot());
        let (active_tab, _) = watch::channel(Tab::default());

        Ok(Self {
            shared: Arc::new(Shared {
                session: Mutex::new(session),
                snapshot_tx,
                state_tx,
                history_tx,
                snapshot_handlers: RwLock::new(Vec::new()),
                state_handlers: RwLock::new(Vec::new()),
            }),
            timing,
            runner: Mutex::new(None),
            running: AtomicBool::new(false),
            active_tab,
        })
    }

    /// Start generating and classifying. No-op if already running.
    pub async fn start(&self) {
        let mut runner = self.runner.lock().await;
        if runner.is_some() {
            tracing::debug!("Engine already running");
            return;
        }

        let (stop_tx, stop_rx) = oneshot::channel();
        let (inject_tx, inject_rx) = mpsc::channel(16);
        let handle = tokio::spawn(run_scheduler(
            Arc::clone(&self.shared),
            self.timing.clone(),
            stop_rx,
            inject_rx,
        ));

        *runner = Some(Runner {
            stop_tx,
            inject_tx,
            handle,
        });
        self.running.store(true, Ordering::SeqCst);
        tracing::info!(
            "Engine started (tick={}ms, settle={}ms)",
            self.timing.tick_interval_ms,
            self.timing.settle_delay_ms
        );
    }

    /// Stop both timers and wait for the scheduler task to exit.
    /// No-op if already stopped.
    pub async fn stop(&self) {
        let mut guard = self.runner.lock().await;
        let Some(runner) = guard.take() else {
            return;
        };

        // The task may already be gone; either way we still join it.
        let _ = runner.stop_tx.send(());
        if let Err(e) = runner.handle.await {
            tracing::warn!("Scheduler task ended abnormally: {}", e);
        }
        self.running.store(false, Ordering::SeqCst);
        tracing::info!("Engine stopped");
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn connection_status(&self) -> ConnectionStatus {
        if self.is_running() {
            ConnectionStatus::Connected
        } else {
            ConnectionStatus::Disconnected
        }
    }

    /// Feed an externally chosen snapshot into the running session. It is
    /// clamped, published and classified after the settle delay, like a
    /// generated one. Ignored while the engine is stopped.
    pub async fn set_snapshot(&self, snapshot: BiometricSnapshot) -> anyhow::Result<()> {
        let runner = self.runner.lock().await;
        let Some(runner) = runner.as_ref() else {
            tracing::debug!("Engine stopped, ignoring snapshot");
            return Ok(());
        };
        runner
            .inject_tx
            .send(snapshot)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to send snapshot: {}", e))
    }

    pub fn current_snapshot(&self) -> BiometricSnapshot {
        *self.shared.snapshot_tx.borrow()
    }

    /// Chart points, oldest first
    pub fn history(&self) -> Vec<HistoryPoint> {
        self.shared.history_tx.borrow().clone()
    }

    pub fn current_state(&self) -> MentalState {
        self.shared.state_tx.borrow().clone()
    }

    pub fn subscribe_snapshot(&self) -> watch::Receiver<BiometricSnapshot> {
        self.shared.snapshot_tx.subscribe()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<MentalState> {
        self.shared.state_tx.subscribe()
    }

    pub fn subscribe_history(&self) -> watch::Receiver<Vec<HistoryPoint>> {
        self.shared.history_tx.subscribe()
    }

    /// Register a callback run on the scheduler task for every new snapshot.
    /// Handlers must not block.
    pub async fn on_snapshot_change<F>(&self, handler: F)
    where
        F: Fn(&BiometricSnapshot) + Send + Sync + 'static,
    {
        self.shared
            .snapshot_handlers
            .write()
            .await
            .push(Box::new(handler));
    }

    /// Register a callback run on the scheduler task whenever a rule fires.
    /// Handlers must not block.
    pub async fn on_state_change<F>(&self, handler: F)
    where
        F: Fn(&MentalState) + Send + Sync + 'static,
    {
        self.shared.state_handlers.write().await.push(Box::new(handler));
    }

    /// Accept a dashboard intent. Only the active tab is recorded; the
    /// simulation itself is unaffected.
    pub fn handle_intent(&self, intent: UserIntent) {
        match intent {
            UserIntent::SwitchTab(tab) => {
                self.active_tab.send_replace(tab);
                tracing::debug!("Switched to tab {}", tab);
            }
            UserIntent::AcceptSuggestion => {
                tracing::info!("Suggestion accepted ({})", self.current_state().label);
            }
            UserIntent::ModifySuggestion => {
                tracing::info!("Suggestion modification requested ({})", self.current_state().label);
            }
        }
    }

    pub fn active_tab(&self) -> Tab {
        *self.active_tab.borrow()
    }
}

/// Scheduler loop. Runs until `stop_rx` fires or its sender is dropped.
async fn run_scheduler(
    shared: Arc<Shared>,
    timing: SchedulerConfig,
    mut stop_rx: oneshot::Receiver<()>,
    mut inject_rx: mpsc::Receiver<BiometricSnapshot>,
) {
    let tick_every = timing.tick_interval();
    let settle_delay = timing.settle_delay();

    let mut ticker = time::interval_at(Instant::now() + tick_every, tick_every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    // The snapshot present at start gets classified once it settles too.
    let settle = time::sleep(settle_delay);
    tokio::pin!(settle);
    let mut settle_pending = true;

    loop {
        tokio::select! {
            biased;

            _ = &mut stop_rx => break,

            _ = ticker.tick() => {
                shared.generate().await;
                settle.as_mut().reset(Instant::now() + settle_delay);
                settle_pending = true;
            }

            Some(snapshot) = inject_rx.recv() => {
                shared.inject(snapshot).await;
                settle.as_mut().reset(Instant::now() + settle_delay);
                settle_pending = true;
            }

            () = &mut settle, if settle_pending => {
                settle_pending = false;
                shared.classify().await;
            }
        }
    }

    tracing::trace!("Scheduler loop exited");
}
