/*!
The periodic update loop.

Every tick samples the simulator, converts to protocol units and sends an
attitude sentence. Once every `update_rate_hz` ticks a position sentence is
sent first, so position goes out at 1 Hz whatever the tick rate.

Ticks run to completion one at a time. The only other thread is the stop
handler, which clears the running flag; the loop notices before scheduling
the next tick.
*/

use crate::broadcaster::{Broadcaster, Transport};
use crossbeam_channel::tick;
use shared::sentence::{attitude_sentence, position_sentence};
use shared::{AircraftVariables, BridgeError, ProtocolSample, Result, TelemetrySource};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Scheduler lifecycle. STOPPED is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Running,
    Stopped,
}

/// Why the loop ended without an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The running flag was cleared
    Requested,
    /// The simulator link went down
    SourceClosed,
}

/// Gates the 1 Hz position sentence within the faster tick cadence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateCycle {
    position_phase: u32,
    update_rate_hz: u32,
}

impl UpdateCycle {
    pub fn new(update_rate_hz: u32) -> Result<Self> {
        if update_rate_hz == 0 {
            return Err(BridgeError::config("update rate must be at least 1 Hz"));
        }
        Ok(Self {
            position_phase: 0,
            update_rate_hz,
        })
    }

    pub fn position_due(&self) -> bool {
        self.position_phase == 0
    }

    pub fn advance(&mut self) {
        self.position_phase = (self.position_phase + 1) % self.update_rate_hz;
    }

    pub fn period(&self) -> Duration {
        Duration::from_secs(1) / self.update_rate_hz
    }
}

/// Running totals for the session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BridgeStats {
    pub ticks: u64,
    pub position_sentences: u64,
    pub attitude_sentences: u64,
}

/// Owns the source, the variable cache and the broadcaster for one session
pub struct UpdateScheduler<S: TelemetrySource, T: Transport> {
    /// `None` once released
    source: Option<S>,
    variables: AircraftVariables,
    broadcaster: Broadcaster<T>,
    cycle: UpdateCycle,
    running: Arc<AtomicBool>,
    state: SchedulerState,
    stats: BridgeStats,
    stats_every_ticks: u64,
    last_sample: ProtocolSample,
}

impl<S: TelemetrySource, T: Transport> UpdateScheduler<S, T> {
    /// Register all variables against `source` and enter RUNNING.
    ///
    /// On a registration failure the source is disconnected before the
    /// error is returned.
    pub fn new(mut source: S, broadcaster: Broadcaster<T>, update_rate_hz: u32) -> Result<Self> {
        let cycle = match UpdateCycle::new(update_rate_hz) {
            Ok(cycle) => cycle,
            Err(e) => {
                source.disconnect();
                return Err(e);
            }
        };

        let variables = match AircraftVariables::register(&mut source) {
            Ok(variables) => variables,
            Err(e) => {
                error!("❌ Variable registration failed: {}", e);
                source.disconnect();
                return Err(e);
            }
        };

        Ok(Self {
            source: Some(source),
            variables,
            broadcaster,
            cycle,
            running: Arc::new(AtomicBool::new(true)),
            state: SchedulerState::Running,
            stats: BridgeStats::default(),
            stats_every_ticks: 0,
            last_sample: ProtocolSample::default(),
        })
    }

    /// Log statistics every `seconds` of ticks (0 disables)
    pub fn with_stats_interval(mut self, seconds: u64) -> Self {
        self.stats_every_ticks = seconds.saturating_mul(self.cycle.update_rate_hz as u64);
        self
    }

    /// Get a reference to the running flag for external control
    pub fn get_running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn stats(&self) -> BridgeStats {
        self.stats
    }

    pub fn variables(&self) -> &AircraftVariables {
        &self.variables
    }

    pub fn broadcaster(&self) -> &Broadcaster<T> {
        &self.broadcaster
    }

    /// Most recently sent sample
    pub fn last_sample(&self) -> ProtocolSample {
        self.last_sample
    }

    /// Run one update cycle: sample, convert, send.
    ///
    /// Nothing is sent if the link went down while advancing; cached values
    /// would otherwise go out as fresh telemetry.
    pub fn tick(&mut self) -> Result<()> {
        let source = match (self.state, self.source.as_mut()) {
            (SchedulerState::Running, Some(source)) => source,
            _ => return Err(BridgeError::connection("scheduler is stopped")),
        };

        source.advance();
        if !source.is_live() {
            debug!("Source went down before tick {}, nothing sent", self.stats.ticks);
            return Ok(());
        }

        let raw = self.variables.sample(source);
        let sample = ProtocolSample::from(&raw);

        if self.cycle.position_due() {
            self.broadcaster.send(&position_sentence(&sample))?;
            self.stats.position_sentences += 1;
        }

        self.broadcaster.send(&attitude_sentence(&sample))?;
        self.stats.attitude_sentences += 1;

        self.cycle.advance();
        self.stats.ticks += 1;
        self.last_sample = sample;

        if self.stats_every_ticks > 0 && self.stats.ticks % self.stats_every_ticks == 0 {
            self.log_stats();
        }

        Ok(())
    }

    /// Whether another tick should be scheduled
    fn should_continue(&self) -> Option<StopReason> {
        if !self.running.load(Ordering::SeqCst) {
            return Some(StopReason::Requested);
        }
        match &self.source {
            Some(source) if source.is_live() => None,
            _ => Some(StopReason::SourceClosed),
        }
    }

    /// Tick until stopped. The first tick runs immediately; the rest follow
    /// a fixed-rate ticker so the cadence doesn't drift.
    pub fn run(&mut self) -> Result<StopReason> {
        let period = self.cycle.period();
        info!("▶️ Update loop started: {:.1} Hz, {} destination(s)",
              1.0 / period.as_secs_f64(), self.broadcaster.destinations().len());

        let ticker = tick(period);
        let started = Instant::now();

        let outcome = loop {
            if let Err(e) = self.tick() {
                error!("❌ Tick {} failed: {}", self.stats.ticks, e);
                break Err(e);
            }

            if let Some(reason) = self.should_continue() {
                break Ok(reason);
            }

            if ticker.recv().is_err() {
                break Ok(StopReason::Requested);
            }

            // The flag may have been cleared during the wait
            if let Some(reason) = self.should_continue() {
                break Ok(reason);
            }
        };

        match outcome {
            Ok(StopReason::Requested) => info!("🛑 Stop requested"),
            Ok(StopReason::SourceClosed) => warn!("⚠️ Simulator link lost"),
            Err(_) => {}
        }

        self.stop();
        info!("   Duration: {:.1}s", started.elapsed().as_secs_f64());
        outcome
    }

    /// Enter STOPPED and release the source. Safe to call more than once;
    /// the source is disconnected only the first time.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if self.state == SchedulerState::Stopped {
            return;
        }
        self.state = SchedulerState::Stopped;

        if let Some(mut source) = self.source.take() {
            source.disconnect();
            debug!("Telemetry source released");
        }
        self.log_stats();
    }

    fn log_stats(&self) {
        info!("📊 Ticks: {}, XGPS: {}, XATT: {}, datagrams: {}, send errors: {}",
              self.stats.ticks, self.stats.position_sentences, self.stats.attitude_sentences,
              self.broadcaster.datagrams_sent(), self.broadcaster.send_errors());

        let fallbacks = self.variables.total_fallbacks();
        if fallbacks > 0 {
            for variable in self.variables.iter().filter(|v| v.fallbacks() > 0) {
                info!("   {} fallbacks: {}", variable.name(), variable.fallbacks());
            }
        }
    }
}

impl<S: TelemetrySource, T: Transport> Drop for UpdateScheduler<S, T> {
    fn drop(&mut self) {
        self.stop();
    }
}
