use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CtEvent, KeyEvent};
use log::warn;

/// Terminal input and clock ticks, each stamped with when it happened
#[derive(Clone, Debug)]
pub enum AppEvent {
    /// `at` is taken when the reader sees the key, so time spent queued
    /// behind a redraw is not charged to the participant
    Key { key: KeyEvent, at: Instant },
    Resize,
    Tick(Instant),
}

impl AppEvent {
    pub fn key(key: KeyEvent) -> Self {
        AppEvent::Key {
            key,
            at: Instant::now(),
        }
    }
}

/// Source of terminal events
pub trait EventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError>;
}

/// Reads crossterm events on a background thread
pub struct CrosstermEventSource {
    rx: Receiver<AppEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            let evt = match event::read() {
                Ok(CtEvent::Key(key)) => AppEvent::key(key),
                Ok(CtEvent::Resize(_, _)) => AppEvent::Resize,
                Ok(_) => continue,
                Err(e) => {
                    warn!("terminal event reader stopped: {e}");
                    break;
                }
            };
            if tx.send(evt).is_err() {
                break;
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Longest wait between ticks while no deadline is pending
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Channel-fed source for headless runs
pub struct TestEventSource {
    rx: Receiver<AppEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<AppEvent>) -> Self {
        Self { rx }
    }
}

impl EventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Something the runner can drive: a session front end with timed phases.
///
/// Handlers return true when the screen needs redrawing.
pub trait Driven {
    type Error;

    fn on_key(&mut self, key: KeyEvent, at: Instant) -> Result<bool, Self::Error>;
    fn on_tick(&mut self, now: Instant) -> Result<bool, Self::Error>;
    /// When the next timed transition is due, if any
    fn deadline(&self) -> Option<Instant>;
    fn is_finished(&self) -> bool;
}

/// Waits for input, waking early for pending deadlines
pub struct Runner<E: EventSource, T: Ticker> {
    event_source: E,
    ticker: T,
}

impl<E: EventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
        }
    }

    /// How long to block: the tick interval, cut short by `deadline`
    pub fn wait_for(&self, deadline: Option<Instant>, now: Instant) -> Duration {
        let interval = self.ticker.interval();
        match deadline {
            Some(d) => d.saturating_duration_since(now).min(interval),
            None => interval,
        }
    }

    /// Next event, or a tick once the wait runs out
    pub fn step(&self, deadline: Option<Instant>) -> AppEvent {
        let wait = self.wait_for(deadline, Instant::now());
        match self.event_source.recv_timeout(wait) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                AppEvent::Tick(Instant::now())
            }
        }
    }

    /// Feed events to `app` until it finishes, calling `redraw` on changes
    pub fn run<D, F>(&self, app: &mut D, mut redraw: F) -> Result<(), D::Error>
    where
        D: Driven,
        F: FnMut(&D) -> Result<(), D::Error>,
    {
        redraw(app)?;
        while !app.is_finished() {
            let changed = match self.step(app.deadline()) {
                AppEvent::Key { key, at } => app.on_key(key, at)?,
                AppEvent::Resize => true,
                AppEvent::Tick(now) => app.on_tick(now)?,
            };
            if changed && !app.is_finished() {
                redraw(app)?;
            }
        }
        Ok(())
    }
}
