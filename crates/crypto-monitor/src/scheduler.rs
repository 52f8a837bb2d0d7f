//! Scheduler
//!
//! Drives the poll cycle: fetch → detect alerts → maybe report → remember.
//! The `LastPrices` slot lives behind a `tokio::sync::Mutex` held for the
//! whole cycle, so a second trigger waits for the in-flight one to finish.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{Local, Timelike};
use tokio::sync::{Mutex, watch};
use tokio::time::{MissedTickBehavior, interval};

use crate::advice::AdviceGenerator;
use crate::channel::{ChatChannel, notify};
use crate::config::MonitorConfig;
use crate::detector::{detect_alerts, should_report};
use crate::model::{Alert, Snapshot};
use crate::report;
use crate::service::MarketDataService;

/// Whether a cycle is in flight
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    CycleRunning,
}

/// What one cycle did
#[derive(Clone, Debug, Default)]
pub struct CycleOutcome {
    /// Provider that served the snapshot; `None` when every provider failed
    pub source: Option<String>,

    pub alerts: Vec<Alert>,

    pub report_sent: bool,

    /// Combined provider failure, if the fetch failed
    pub error: Option<String>,
}

/// On-demand report flavours
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReportKind {
    /// Prices plus advice
    Full,
    /// Prices and top gainers only
    Prices,
}

/// Clears the running flag even if the cycle unwinds
struct RunningGuard<'a>(&'a AtomicBool);

impl<'a> RunningGuard<'a> {
    fn enter(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Periodic market monitor
pub struct Scheduler {
    config: MonitorConfig,
    service: MarketDataService,
    advice: AdviceGenerator,
    channel: Arc<dyn ChatChannel>,
    last_prices: Mutex<Option<Snapshot>>,
    running: AtomicBool,
}

impl Scheduler {
    pub fn new(
        config: MonitorConfig,
        service: MarketDataService,
        advice: AdviceGenerator,
        channel: Arc<dyn ChatChannel>,
    ) -> Self {
        Self {
            config,
            service,
            advice,
            channel,
            last_prices: Mutex::new(None),
            running: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn service(&self) -> &MarketDataService {
        &self.service
    }

    pub fn advice(&self) -> &AdviceGenerator {
        &self.advice
    }

    pub fn state(&self) -> SchedulerState {
        if self.running.load(Ordering::SeqCst) {
            SchedulerState::CycleRunning
        } else {
            SchedulerState::Idle
        }
    }

    /// Snapshot kept from the last successful cycle; waits for an in-flight cycle
    pub async fn last_snapshot(&self) -> Option<Snapshot> {
        self.last_prices.lock().await.clone()
    }

    /// One cycle using the current local hour
    pub async fn run_cycle(&self) -> CycleOutcome {
        self.cycle_at(Local::now().hour()).await
    }

    /// One cycle as if the local hour were `hour`
    pub async fn cycle_at(&self, hour: u32) -> CycleOutcome {
        let mut last = self.last_prices.lock().await;
        let _running = RunningGuard::enter(&self.running);

        tracing::info!("Market check started");
        let mut outcome = CycleOutcome::default();

        let snapshot = match self.service.get_market_data().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::error!("Market check failed: {}", e);
                notify(self.channel.as_ref(), &report::error_message(&e.user_message())).await;
                outcome.error = Some(e.to_string());
                return outcome;
            }
        };
        outcome.source = Some(snapshot.source.clone());

        outcome.alerts = detect_alerts(&snapshot, last.as_ref(), self.config.alert_threshold);
        if !outcome.alerts.is_empty() {
            tracing::info!("{} price alert(s)", outcome.alerts.len());
            notify(self.channel.as_ref(), &report::alert_message(&outcome.alerts)).await;
        }

        if self.config.is_report_hour(hour)
            && should_report(&snapshot, last.as_ref(), self.config.report_min_change)
        {
            let advice = self.advice.advice(&snapshot).await;
            outcome.report_sent =
                notify(self.channel.as_ref(), &report::full_report(&snapshot, &advice.text)).await;
        }

        *last = Some(snapshot);
        tracing::info!(
            "Market check finished: {} alert(s), report sent: {}",
            outcome.alerts.len(),
            outcome.report_sent
        );
        outcome
    }

    /// Run one cycle in its own task; a panic is logged and reported as `None`
    pub async fn trigger(self: &Arc<Self>) -> Option<CycleOutcome> {
        let scheduler = Arc::clone(self);
        match tokio::spawn(async move { scheduler.run_cycle().await }).await {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                tracing::error!("Market check aborted: {}", e);
                None
            }
        }
    }

    /// Fetch and format a report without touching `LastPrices`
    ///
    /// Queues behind an in-flight cycle like any other trigger.
    pub async fn report_now(&self, kind: ReportKind) -> String {
        let _last = self.last_prices.lock().await;

        match self.service.get_market_data().await {
            Ok(snapshot) => match kind {
                ReportKind::Full => {
                    let advice = self.advice.advice(&snapshot).await;
                    report::full_report(&snapshot, &advice.text)
                }
                ReportKind::Prices => report::prices_report(&snapshot, self.config.top_gainers_limit),
            },
            Err(e) => report::error_message(&e.user_message()),
        }
    }

    /// Tick every `CHECK_INTERVAL_MIN` until `shutdown` flips
    ///
    /// The first tick fires immediately. Shutdown is only observed between
    /// cycles; an in-flight cycle always completes.
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = interval(self.config.check_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::info!(
            "Scheduler started: every {} min, reports at {:?}",
            self.config.check_interval_min,
            self.config.report_hours
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.trigger().await;
                }
                changed = shutdown.changed() => {
                    let stop = changed.is_err() || *shutdown.borrow();
                    if stop {
                        break;
                    }
                }
            }
        }

        tracing::info!("Scheduler stopped");
    }
}
