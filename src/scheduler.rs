// Time-stepped execution of motion commands
//
// A command is spread over `max(|pulses|) / speed` milliseconds. Each tick
// maps wall time to a fraction of the run and hands the model only the
// increment since the previous tick, so the increments of a run telescope to
// exactly the commanded rotation.

use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::config::DEFAULT_TICK_PERIOD;
use crate::kinematics::{KinematicModel, LEFT, RIGHT};
use crate::messages::MotionCommand;

/// Receives the scheduler's notifications
pub trait MotionObserver {
    /// Entered (`true`) or left (`false`) the running state
    fn running_changed(&mut self, running: bool);

    /// The model moved; a redraw is due
    fn state_changed(&mut self);
}

/// Ignores every notification
impl MotionObserver for () {
    fn running_changed(&mut self, _running: bool) {}
    fn state_changed(&mut self) {}
}

/// Notification recorded by an event buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionEvent {
    RunningChanged(bool),
    StateChanged,
}

/// Buffers notifications so an async caller can act on them after the tick
impl MotionObserver for Vec<MotionEvent> {
    fn running_changed(&mut self, running: bool) {
        self.push(MotionEvent::RunningChanged(running));
    }

    fn state_changed(&mut self) {
        self.push(MotionEvent::StateChanged);
    }
}

/// One motion in flight
#[derive(Debug, Clone, Copy)]
struct ActiveRun {
    started_at: Instant,
    duration: Duration,
    /// Total rotation of each wheel over the whole run, radians
    distance: [f64; 2],
    /// Fraction already handed to the model
    previous_fraction: f64,
}

impl ActiveRun {
    fn fraction_at(&self, now: Instant) -> f64 {
        let elapsed = now.saturating_duration_since(self.started_at);
        if elapsed >= self.duration {
            1.0
        } else {
            elapsed.as_secs_f64() / self.duration.as_secs_f64()
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum RunState {
    Idle,
    Running(ActiveRun),
}

#[derive(Debug, Clone)]
pub struct MotionScheduler {
    state: RunState,
    tick_period: Duration,
}

impl Default for MotionScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_TICK_PERIOD)
    }
}

impl MotionScheduler {
    pub fn new(tick_period: Duration) -> Self {
        Self {
            state: RunState::Idle,
            tick_period,
        }
    }

    /// How often the host is expected to call [`tick`](Self::tick)
    pub fn tick_period(&self) -> Duration {
        self.tick_period
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, RunState::Running(_))
    }

    /// Length of the run in flight, if any
    pub fn duration(&self) -> Option<Duration> {
        match self.state {
            RunState::Running(run) => Some(run.duration),
            RunState::Idle => None,
        }
    }

    /// Fraction of the run already applied to the model (0 when idle)
    pub fn progress(&self) -> f64 {
        match self.state {
            RunState::Running(run) => run.previous_fraction,
            RunState::Idle => 0.0,
        }
    }

    /// Run time of a command: the busiest wheel at `speed` pulses per
    /// millisecond, truncated to whole milliseconds.
    pub fn duration_for(command: &MotionCommand) -> Duration {
        let max_pulses = command.pulses[LEFT]
            .unsigned_abs()
            .max(command.pulses[RIGHT].unsigned_abs());
        let millis = max_pulses as f64 / command.speed_pulses_per_ms;
        if millis.is_finite() && millis > 0.0 {
            Duration::from_millis(millis as u64)
        } else {
            Duration::ZERO
        }
    }

    /// Start `command`, preempting any run in flight.
    ///
    /// The rotation not yet consumed by a preempted run is discarded. A
    /// command with zero duration leaves the scheduler idle without a
    /// running notification.
    pub fn command_motion(
        &mut self,
        model: &mut KinematicModel,
        command: MotionCommand,
        now: Instant,
        observer: &mut impl MotionObserver,
    ) {
        if let RunState::Running(run) = self.state {
            info!(
                "Preempting motion at {:.1}% of {}ms",
                run.previous_fraction * 100.0,
                run.duration.as_millis()
            );
            self.stop(model, observer);
        }

        let duration = Self::duration_for(&command);
        if duration.is_zero() {
            debug!("Ignoring zero-length motion {:?}", command.pulses);
            return;
        }

        let geometry = model.geometry();
        let distance = command.pulses.map(|p| geometry.pulses_to_radians(p));
        model.begin_motion(distance);

        info!(
            "Starting motion {:?} over {}ms",
            command.pulses,
            duration.as_millis()
        );
        self.state = RunState::Running(ActiveRun {
            started_at: now,
            duration,
            distance,
            previous_fraction: 0.0,
        });
        observer.running_changed(true);
    }

    /// Advance the run in flight to `now`. Does nothing while idle.
    pub fn tick(
        &mut self,
        model: &mut KinematicModel,
        now: Instant,
        observer: &mut impl MotionObserver,
    ) {
        let RunState::Running(run) = &mut self.state else {
            return;
        };

        let fraction = run.fraction_at(now);
        if fraction <= run.previous_fraction {
            return;
        }

        model.advance(fraction - run.previous_fraction, run.distance);
        run.previous_fraction = fraction;
        observer.state_changed();

        if fraction >= 1.0 {
            debug!("Motion complete after {}ms", run.duration.as_millis());
            self.stop(model, observer);
        }
    }

    fn stop(&mut self, model: &mut KinematicModel, observer: &mut impl MotionObserver) {
        self.state = RunState::Idle;
        model.finish_motion();
        observer.running_changed(false);
    }
}
