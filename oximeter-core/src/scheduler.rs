//! Two-State Acquisition Scheduler
//!
//! ## State Machine
//!
//! ```text
//!                 advance() failed
//!            ┌──────────────────────────┐
//!            │                          ▼
//!      ┌──────────┐               ┌──────────────┐
//! ───> │ Reading  │ <──────────── │ ErrorBackoff │
//!      └──────────┘  next tick    └──────────────┘
//!       100 ms timer                5 s timer
//! ```
//!
//! - **Reading**: each tick slides the window by one block, runs both
//!   estimates and publishes the pair (sentinels included). Calculation and
//!   publish failures are tolerated; only a sensor fault leaves this state.
//! - **ErrorBackoff**: the next tick of the slow timer returns to Reading
//!   unconditionally. The window is not touched.
//!
//! Each state has its own [`PeriodicTimer`]; switching state stops one and
//! starts the other.
//!
//! ## Bring-Up
//!
//! A scheduler only exists after [`bring_up`] succeeded: sensor init,
//! configuration and a complete first window. Failure there is fatal and
//! no scheduler is returned.
//!
//! ## Re-entrancy
//!
//! [`AcquisitionScheduler::tick`] takes `&mut self`. A tick that blocks on
//! the sensor for a full second simply delays the next `poll`; it can
//! never overlap itself.

use core::convert::Infallible;

use crate::{
    config::AcquisitionConfig,
    errors::{SensorError, SensorResult},
    store::{AtomicTryLock, SharedVitalsStore},
    traits::{DelayMs, PeriodicTimer, PpgSensor, TryLock},
    vitals::{VitalsCalculator, VitalsReading},
    window::SampleWindow,
};

/// Scheduler state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AcquisitionState {
    /// Normal acquisition at the read rate
    Reading,
    /// Waiting out a sensor fault at the backoff rate
    ErrorBackoff,
}

/// What a single tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Window advanced and the resulting pair was published
    Published(VitalsReading),
    /// Window advanced but the slot was busy; the pair was dropped
    SaveSkipped(VitalsReading),
    /// Refill failed; now in [`AcquisitionState::ErrorBackoff`]
    SensorFault(SensorError),
    /// Backoff elapsed; now in [`AcquisitionState::Reading`]
    Resumed,
}

/// Timer pair driving the two states
#[derive(Debug)]
pub struct SchedulerTimers<T> {
    /// Fast timer for [`AcquisitionState::Reading`]
    pub read: T,
    /// Slow timer for [`AcquisitionState::ErrorBackoff`]
    pub backoff: T,
}

/// Producer-side loop driver
pub struct AcquisitionScheduler<'a, S, T, L = AtomicTryLock>
where
    S: PpgSensor,
    T: PeriodicTimer,
    L: TryLock,
{
    sensor: S,
    window: SampleWindow,
    calculator: VitalsCalculator,
    store: &'a SharedVitalsStore<L>,
    timers: SchedulerTimers<T>,
    state: AcquisitionState,
}

impl<'a, S, T, L> AcquisitionScheduler<'a, S, T, L>
where
    S: PpgSensor,
    T: PeriodicTimer,
    L: TryLock,
{
    /// Start in Reading with an already filled window
    ///
    /// Arms both timers and starts the read timer.
    pub fn new(
        sensor: S,
        window: SampleWindow,
        store: &'a SharedVitalsStore<L>,
        mut timers: SchedulerTimers<T>,
        config: &AcquisitionConfig,
    ) -> Self {
        timers.read.arm(config.read_period());
        timers.backoff.arm(config.backoff_period());
        timers.backoff.stop();
        timers.read.start();

        Self {
            sensor,
            window,
            calculator: VitalsCalculator::new(config.sampling_frequency_hz),
            store,
            timers,
            state: AcquisitionState::Reading,
        }
    }

    /// Run one tick of the current state
    pub fn tick(&mut self) -> TickOutcome {
        match self.state {
            AcquisitionState::Reading => self.read_tick(),
            AcquisitionState::ErrorBackoff => {
                self.enter(AcquisitionState::Reading);
                TickOutcome::Resumed
            }
        }
    }

    /// Run a tick if the active timer has fired
    pub fn poll(&mut self) -> nb::Result<TickOutcome, Infallible> {
        match self.state {
            AcquisitionState::Reading => self.timers.read.wait()?,
            AcquisitionState::ErrorBackoff => self.timers.backoff.wait()?,
        }
        Ok(self.tick())
    }

    /// Acquire until power-off
    pub fn run(&mut self) -> ! {
        loop {
            let _ = nb::block!(self.poll());
        }
    }

    /// Current state
    pub fn state(&self) -> AcquisitionState {
        self.state
    }

    /// Current window
    pub fn window(&self) -> &SampleWindow {
        &self.window
    }

    /// Timer pair
    pub fn timers(&self) -> &SchedulerTimers<T> {
        &self.timers
    }

    /// Mutable access to the timer pair
    pub fn timers_mut(&mut self) -> &mut SchedulerTimers<T> {
        &mut self.timers
    }

    /// Mutable access to the sensor
    pub fn sensor_mut(&mut self) -> &mut S {
        &mut self.sensor
    }

    fn read_tick(&mut self) -> TickOutcome {
        if let Err(error) = self.window.advance(&mut self.sensor) {
            log_warn!("sensor fault, backing off: {}", error);
            self.enter(AcquisitionState::ErrorBackoff);
            return TickOutcome::SensorFault(error);
        }

        let reading = self.calculator.calculate(&self.window);
        let vitals = reading.snapshot();

        match self.store.publish(vitals.spo2_percent, vitals.heart_rate_bpm) {
            Ok(()) => TickOutcome::Published(reading),
            Err(error) => {
                log_warn!("{}", error);
                TickOutcome::SaveSkipped(reading)
            }
        }
    }

    fn enter(&mut self, next: AcquisitionState) {
        if self.state == next {
            return;
        }

        match next {
            AcquisitionState::Reading => {
                self.timers.backoff.stop();
                self.timers.read.start();
            }
            AcquisitionState::ErrorBackoff => {
                self.timers.read.stop();
                self.timers.backoff.start();
            }
        }

        log_info!("acquisition {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}

/// Bring the sensor up and construct the scheduler
///
/// Runs `init`, settles, writes the default configuration, settles again
/// and fills the first window. A trial SpO2 estimate on that window is
/// logged when it fails but does not abort start-up.
pub fn bring_up<'a, S, D, T, L>(
    mut sensor: S,
    delay: &mut D,
    store: &'a SharedVitalsStore<L>,
    timers: SchedulerTimers<T>,
    config: &AcquisitionConfig,
) -> SensorResult<AcquisitionScheduler<'a, S, T, L>>
where
    S: PpgSensor,
    D: DelayMs,
    T: PeriodicTimer,
    L: TryLock,
{
    sensor.init();
    delay.delay_ms(config.settle_ms);

    sensor.default_config().map_err(|error| {
        log_warn!("sensor configuration failed: {:?}", error);
        SensorError::ConfigRejected
    })?;
    delay.delay_ms(config.settle_ms);

    let window = SampleWindow::initialize(&mut sensor)?;

    let calculator = VitalsCalculator::new(config.sampling_frequency_hz);
    if let Err(error) = calculator.oxygen_saturation(window.infrared(), window.red()) {
        log_info!("first window has no SpO2 estimate yet: {}", error);
    }

    log_info!("sensor up, acquisition starting");
    Ok(AcquisitionScheduler::new(sensor, window, store, timers, config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ManualTimer, RecordingDelay, ScriptedSensor, SwitchLock};
    use crate::vitals::VitalsSnapshot;
    use crate::window::REFILLS_TO_FLUSH;
    use crate::CalculationError;

    fn timers() -> SchedulerTimers<ManualTimer> {
        SchedulerTimers {
            read: ManualTimer::default(),
            backoff: ManualTimer::default(),
        }
    }

    fn start<L: TryLock>(
        sensor: ScriptedSensor,
        store: &SharedVitalsStore<L>,
    ) -> AcquisitionScheduler<'_, ScriptedSensor, ManualTimer, L> {
        bring_up(
            sensor,
            &mut RecordingDelay::default(),
            store,
            timers(),
            &AcquisitionConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn bring_up_settles_twice_and_starts_reading() {
        let store = SharedVitalsStore::new();
        let mut delay = RecordingDelay::default();
        let scheduler = bring_up(
            ScriptedSensor::pulsing(),
            &mut delay,
            &store,
            timers(),
            &AcquisitionConfig::default(),
        )
        .unwrap();

        assert_eq!(delay.calls(), &[100, 100]);
        assert_eq!(scheduler.state(), AcquisitionState::Reading);
        assert!(scheduler.timers().read.is_running());
        assert!(!scheduler.timers().backoff.is_running());
        assert_eq!(scheduler.timers().read.period_ms(), Some(100));
        assert_eq!(scheduler.timers().backoff.period_ms(), Some(5_000));

        // Nothing is published during bring-up
        assert_eq!(store.fetch(), Ok(VitalsSnapshot::INVALID));
    }

    #[test]
    fn bring_up_fails_on_config() {
        let store = SharedVitalsStore::new();
        let result = bring_up(
            ScriptedSensor::pulsing().reject_config(),
            &mut RecordingDelay::default(),
            &store,
            timers(),
            &AcquisitionConfig::default(),
        );
        assert_eq!(result.err(), Some(SensorError::ConfigRejected));
    }

    #[test]
    fn bring_up_fails_on_first_window() {
        let store = SharedVitalsStore::new();
        let result = bring_up(
            ScriptedSensor::pulsing().fail_read_at(30),
            &mut RecordingDelay::default(),
            &store,
            timers(),
            &AcquisitionConfig::default(),
        );
        assert_eq!(result.err(), Some(SensorError::ReadFailed { index: 30 }));
    }

    #[test]
    fn reading_tick_publishes_vitals() {
        let store = SharedVitalsStore::new();
        let mut scheduler = start(ScriptedSensor::pulsing(), &store);

        match scheduler.tick() {
            TickOutcome::Published(reading) => {
                assert_eq!(reading.snapshot(), VitalsSnapshot::new(100, 75));
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(store.fetch(), Ok(VitalsSnapshot::new(100, 75)));
        assert_eq!(scheduler.state(), AcquisitionState::Reading);
    }

    #[test]
    fn poor_signal_publishes_sentinels_and_keeps_reading() {
        let store = SharedVitalsStore::new();
        store.publish(97, 70).unwrap();
        let mut scheduler = start(ScriptedSensor::flat(), &store);

        let outcome = scheduler.tick();
        match outcome {
            TickOutcome::Published(reading) => {
                assert_eq!(reading.spo2, Err(CalculationError::NoValidRatio));
                assert!(reading.heart_rate.is_err());
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(store.fetch(), Ok(VitalsSnapshot::INVALID));
        assert_eq!(scheduler.state(), AcquisitionState::Reading);
    }

    #[test]
    fn busy_slot_is_tolerated() {
        let lock = SwitchLock::default();
        let store = SharedVitalsStore::with_lock(&lock);
        let mut scheduler = start(ScriptedSensor::pulsing(), &store);

        lock.set_busy(true);
        assert!(matches!(scheduler.tick(), TickOutcome::SaveSkipped(_)));
        lock.set_busy(false);

        assert_eq!(scheduler.state(), AcquisitionState::Reading);
        assert_eq!(store.fetch(), Ok(VitalsSnapshot::INVALID));
    }

    #[test]
    fn sensor_fault_backs_off_once_then_resumes() {
        let store = SharedVitalsStore::new();
        let mut scheduler = start(ScriptedSensor::pulsing().fail_read_at(110), &store);

        let outcome = scheduler.tick();
        assert_eq!(outcome, TickOutcome::SensorFault(SensorError::ReadFailed { index: 85 }));
        assert_eq!(scheduler.state(), AcquisitionState::ErrorBackoff);
        assert!(!scheduler.timers().read.is_running());
        assert!(scheduler.timers().backoff.is_running());
        assert_eq!(store.stats().published.load(core::sync::atomic::Ordering::Relaxed), 0);

        assert_eq!(scheduler.tick(), TickOutcome::Resumed);
        assert_eq!(scheduler.state(), AcquisitionState::Reading);
        assert!(scheduler.timers().read.is_running());
        assert!(!scheduler.timers().backoff.is_running());

        assert!(matches!(scheduler.tick(), TickOutcome::Published(_)));
    }

    #[test]
    fn fault_publishes_nothing_valid_until_window_flushed() {
        let store = SharedVitalsStore::new();
        let mut scheduler = start(ScriptedSensor::pulsing().fail_read_at(110), &store);

        assert!(matches!(scheduler.tick(), TickOutcome::SensorFault(_)));
        assert_eq!(scheduler.tick(), TickOutcome::Resumed);

        let mut stale_ticks = 0;
        loop {
            match scheduler.tick() {
                TickOutcome::Published(reading) if reading.is_complete() => break,
                TickOutcome::Published(reading) => {
                    assert_eq!(reading.first_error(), Some(CalculationError::StaleWindow));
                    assert_eq!(store.fetch(), Ok(VitalsSnapshot::INVALID));
                    stale_ticks += 1;
                }
                other => panic!("unexpected outcome {:?}", other),
            }
            assert!(stale_ticks <= usize::from(REFILLS_TO_FLUSH), "window never recovered");
        }

        assert_eq!(stale_ticks, usize::from(REFILLS_TO_FLUSH) - 1);
        assert!(!scheduler.window().is_stale());
        assert_eq!(store.fetch(), Ok(VitalsSnapshot::new(100, 75)));
    }

    #[test]
    fn poll_follows_the_active_timer() {
        let store = SharedVitalsStore::new();
        let mut scheduler = start(ScriptedSensor::pulsing().fail_read_at(110), &store);

        assert!(matches!(scheduler.poll(), Err(nb::Error::WouldBlock)));

        scheduler.timers_mut().read.fire();
        assert!(matches!(scheduler.poll(), Ok(TickOutcome::SensorFault(_))));

        // Read timer firing has no effect while backing off
        scheduler.timers_mut().read.fire();
        assert!(matches!(scheduler.poll(), Err(nb::Error::WouldBlock)));

        scheduler.timers_mut().backoff.fire();
        assert_eq!(scheduler.poll(), Ok(TickOutcome::Resumed));
    }
}
