// src/core/scheduler.rs
use crate::core::engine::TradingEngine;
use crate::core::state::SharedState;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

struct ActiveLoop {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// Fixed-interval driver for the trading engine.
///
/// At most one tick runs at any time: a tick that comes due while another is
/// still in flight (including one left over from a previous start) is skipped.
pub struct SchedulerLoop {
    engine: Arc<TradingEngine>,
    poll_interval: Duration,
    tick_gate: Arc<Mutex<()>>,
    active: Mutex<Option<ActiveLoop>>,
    /// Bumped by every start and stop; a loop only owns `running` while it matches.
    generation: Arc<AtomicU64>,
}

/// Clears `running` when the loop task ends on its own, panics included.
struct RunningFlag {
    state: SharedState,
    generation: Arc<AtomicU64>,
    owner: u64,
}

impl Drop for RunningFlag {
    fn drop(&mut self) {
        if self.generation.load(Ordering::SeqCst) == self.owner {
            self.state.set_running(false);
            self.state.log_warn("Scheduler loop ended unexpectedly");
        }
    }
}

impl SchedulerLoop {
    pub fn new(engine: Arc<TradingEngine>, poll_interval: Duration) -> Self {
        Self {
            engine,
            poll_interval: poll_interval.max(Duration::from_millis(1)),
            tick_gate: Arc::new(Mutex::new(())),
            active: Mutex::new(None),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Starts ticking now and then every poll interval. Returns `false` when a
    /// schedule was already running.
    pub async fn start(&self) -> bool {
        let mut active = self.active.lock().await;
        if active.as_ref().is_some_and(|a| !a.handle.is_finished()) {
            return false;
        }

        let state = self.engine.state();
        state.set_running(true);
        state.log(format!(
            "Bot started. Watching the market every {}s...",
            self.poll_interval.as_secs()
        ));

        let owner = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let flag = RunningFlag {
            state: state.clone(),
            generation: self.generation.clone(),
            owner,
        };

        let (shutdown, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(run_loop(
            self.engine.clone(),
            self.tick_gate.clone(),
            self.poll_interval,
            shutdown_rx,
            flag,
        ));

        *active = Some(ActiveLoop { shutdown, handle });
        true
    }

    /// Prevents further ticks. A tick already in flight runs to completion.
    /// Returns `false` when nothing was running.
    pub async fn stop(&self) -> bool {
        let Some(active) = self.active.lock().await.take() else {
            return false;
        };

        self.generation.fetch_add(1, Ordering::SeqCst);
        let _ = active.shutdown.send(true);
        // The handle is dropped, not aborted: in-flight I/O is never cancelled.
        drop(active.handle);

        let state = self.engine.state();
        state.set_running(false);
        state.log("Bot stopped.");
        true
    }

    pub async fn is_active(&self) -> bool {
        self.active
            .lock()
            .await
            .as_ref()
            .is_some_and(|a| !a.handle.is_finished())
    }

    /// Runs one guarded tick outside the schedule. Returns `false` if skipped.
    pub async fn tick_now(&self) -> bool {
        run_guarded(&self.engine, &self.tick_gate).await
    }
}

async fn run_loop(
    engine: Arc<TradingEngine>,
    gate: Arc<Mutex<()>>,
    poll_interval: Duration,
    mut shutdown: watch::Receiver<bool>,
    _flag: RunningFlag,
) {
    let mut ticker = tokio::time::interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        // The first interval tick completes immediately.
        tokio::select! {
            _ = ticker.tick() => {}
            _ = shutdown.changed() => break,
        }
        if *shutdown.borrow() {
            break;
        }
        run_guarded(&engine, &gate).await;
    }

    info!("Scheduler loop exited");
}

/// Tick boundary: every error ends up in the log buffer, none escapes.
async fn run_guarded(engine: &TradingEngine, gate: &Mutex<()>) -> bool {
    let Ok(_permit) = gate.try_lock() else {
        engine
            .state()
            .log_warn("Previous tick still running, skipping this one");
        return false;
    };

    let tick_id = Uuid::new_v4();
    let span = info_span!("tick", %tick_id);
    if let Err(e) = engine.tick().instrument(span).await {
        engine.state().log_error(format!("Bot loop error: {}", e));
    }
    true
}
