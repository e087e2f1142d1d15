use std::time::{Duration, Instant};

pub trait Clock {
    fn now(&self) -> Instant;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Instant {
        (**self).now()
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Timer {
    /// The recurring game step.
    Tick,
    /// The one-shot timer that ends a pause after a mistake.
    Resume,
}

/// Keeps the recurring tick and the resume timer. Nothing runs on its own:
/// the game loop asks which timer is due and acts on it.
pub struct Scheduler<C: Clock> {
    clock: C,
    interval: Duration,
    next_tick: Instant,
    resume_at: Option<Instant>,
    frozen_at: Option<Instant>,
}

impl<C: Clock> Scheduler<C> {
    pub fn new(clock: C, interval: Duration) -> Self {
        let next_tick = clock.now() + interval;
        Scheduler { clock, interval, next_tick, resume_at: None, frozen_at: None }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Changes the tick rate; the next tick is one new interval from now.
    /// While frozen the countdown starts from the freeze, since `thaw` adds
    /// the frozen time back.
    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
        self.next_tick = self.frozen_at.unwrap_or_else(|| self.clock.now()) + interval;
    }

    pub fn schedule_resume(&mut self, delay: Duration) {
        self.resume_at = Some(self.clock.now() + delay);
    }

    /// Returns the next due timer, resume first. Call repeatedly until it
    /// yields `None`.
    pub fn poll(&mut self) -> Option<Timer> {
        if self.frozen_at.is_some() {
            return None;
        }

        let now = self.clock.now();

        if let Some(at) = self.resume_at {
            if now >= at {
                self.resume_at = None;
                return Some(Timer::Resume);
            }
        }

        if now >= self.next_tick {
            self.next_tick += self.interval;
            // After a stall, skip the missed ticks instead of replaying them
            if self.next_tick <= now {
                self.next_tick = now + self.interval;
            }
            return Some(Timer::Tick);
        }

        None
    }

    /// How long the loop may block on input before a timer is due.
    pub fn time_until_next(&self) -> Duration {
        if self.frozen_at.is_some() {
            return self.interval;
        }

        let deadline = match self.resume_at {
            Some(at) if at < self.next_tick => at,
            _ => self.next_tick,
        };
        deadline.saturating_duration_since(self.clock.now())
    }

    /// Stops both timers until `thaw`.
    pub fn freeze(&mut self) {
        if self.frozen_at.is_none() {
            self.frozen_at = Some(self.clock.now());
        }
    }

    /// Restarts the timers, pushing their deadlines back by the time spent frozen.
    pub fn thaw(&mut self) {
        if let Some(since) = self.frozen_at.take() {
            let frozen_for = self.clock.now().saturating_duration_since(since);
            self.next_tick += frozen_for;
            self.resume_at = self.resume_at.map(|at| at + frozen_for);
        }
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen_at.is_some()
    }
}

#[cfg(test)]
pub struct ManualClock {
    origin: Instant,
    elapsed: std::cell::Cell<Duration>,
}

#[cfg(test)]
impl ManualClock {
    pub fn new() -> Self {
        ManualClock { origin: Instant::now(), elapsed: std::cell::Cell::new(Duration::ZERO) }
    }

    pub fn advance(&self, by: Duration) {
        self.elapsed.set(self.elapsed.get() + by);
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.elapsed.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_tick_fires_on_interval() {
        let clock = ManualClock::new();
        let mut scheduler = Scheduler::new(&clock, ms(100));

        assert_eq!(scheduler.poll(), None);
        clock.advance(ms(99));
        assert_eq!(scheduler.poll(), None);
        clock.advance(ms(1));
        assert_eq!(scheduler.poll(), Some(Timer::Tick));
        assert_eq!(scheduler.poll(), None);

        clock.advance(ms(100));
        assert_eq!(scheduler.poll(), Some(Timer::Tick));
    }

    #[test]
    fn test_no_burst_after_stall() {
        let clock = ManualClock::new();
        let mut scheduler = Scheduler::new(&clock, ms(100));

        clock.advance(ms(1000));
        assert_eq!(scheduler.poll(), Some(Timer::Tick));
        assert_eq!(scheduler.poll(), None);
        assert_eq!(scheduler.time_until_next(), ms(100));
    }

    #[test]
    fn test_resume_fires_once_after_delay() {
        let clock = ManualClock::new();
        let mut scheduler = Scheduler::new(&clock, ms(100));
        scheduler.schedule_resume(ms(250));

        clock.advance(ms(100));
        assert_eq!(scheduler.poll(), Some(Timer::Tick));
        clock.advance(ms(200));
        // Both are due; resume comes first
        assert_eq!(scheduler.poll(), Some(Timer::Resume));
        assert_eq!(scheduler.poll(), Some(Timer::Tick));
        assert_eq!(scheduler.poll(), None);
        clock.advance(ms(1000));
        assert_eq!(scheduler.poll(), Some(Timer::Tick));
        assert_eq!(scheduler.poll(), None);
    }

    #[test]
    fn test_time_until_next_prefers_earlier_deadline() {
        let clock = ManualClock::new();
        let mut scheduler = Scheduler::new(&clock, ms(100));
        assert_eq!(scheduler.time_until_next(), ms(100));

        scheduler.schedule_resume(ms(30));
        assert_eq!(scheduler.time_until_next(), ms(30));

        clock.advance(ms(50));
        assert_eq!(scheduler.time_until_next(), Duration::ZERO);
    }

    #[test]
    fn test_freeze_shifts_both_timers() {
        let clock = ManualClock::new();
        let mut scheduler = Scheduler::new(&clock, ms(100));
        scheduler.schedule_resume(ms(150));

        clock.advance(ms(50));
        scheduler.freeze();
        assert!(scheduler.is_frozen());
        clock.advance(ms(500));
        assert_eq!(scheduler.poll(), None);

        scheduler.thaw();
        assert!(!scheduler.is_frozen());
        assert_eq!(scheduler.time_until_next(), ms(50));

        clock.advance(ms(50));
        assert_eq!(scheduler.poll(), Some(Timer::Tick));
        clock.advance(ms(50));
        assert_eq!(scheduler.poll(), Some(Timer::Resume));
    }

    #[test]
    fn test_set_interval_restarts_countdown() {
        let clock = ManualClock::new();
        let mut scheduler = Scheduler::new(&clock, ms(200));

        clock.advance(ms(150));
        scheduler.set_interval(ms(80));
        assert_eq!(scheduler.interval(), ms(80));
        clock.advance(ms(79));
        assert_eq!(scheduler.poll(), None);
        clock.advance(ms(1));
        assert_eq!(scheduler.poll(), Some(Timer::Tick));
    }

    #[test]
    fn test_set_interval_while_frozen() {
        let clock = ManualClock::new();
        let mut scheduler = Scheduler::new(&clock, ms(130));

        scheduler.freeze();
        clock.advance(ms(500));
        scheduler.set_interval(ms(80));
        scheduler.thaw();

        assert_eq!(scheduler.time_until_next(), ms(80));
        clock.advance(ms(80));
        assert_eq!(scheduler.poll(), Some(Timer::Tick));
    }
}
