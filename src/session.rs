use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use log::{debug, info};

use crate::combo::{TargetCombo, TrialGenerator};
use crate::error::SessionError;
use crate::keys;
use crate::scoring::{Aggregator, Report, ScoringRule, TrialOutcome};

#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub trial_count: usize,
    pub max_combo_size: usize,
    pub inter_trial_delay: Duration,
    pub end_delay: Duration,
    pub scoring_rule: ScoringRule,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            trial_count: 10,
            max_combo_size: 3,
            inter_trial_delay: Duration::from_millis(500),
            end_delay: Duration::from_millis(2000),
            scoring_rule: ScoringRule::Exact,
        }
    }
}

impl SessionConfig {
    /// Combination size for the trial that follows `completed` finished trials.
    ///
    /// The run is split into `max_combo_size` equal stretches; sessions shorter
    /// than that step up on every trial.
    pub fn level_for(&self, completed: usize) -> usize {
        let step = (self.trial_count / self.max_combo_size.max(1)).max(1);
        (1 + completed / step).min(self.max_combo_size)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    Idle,
    AwaitingKeys,
    /// Trial scored, next one appears at `resume_at`
    Scoring { resume_at: Instant },
    /// All trials done, the session closes at `close_at`
    Complete { close_at: Instant },
    Finished,
}

/// What a call into the session changed
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    None,
    TrialStarted(TargetCombo),
    TrialScored(TrialOutcome),
    SessionComplete { last: TrialOutcome, report: Report },
    Finished,
}

#[derive(Debug, Clone)]
struct Trial {
    target: TargetCombo,
    started_at: Instant,
}

/// One participant run: trials, pressed keys and running statistics
#[derive(Debug)]
pub struct Session {
    config: SessionConfig,
    generator: TrialGenerator,
    phase: Phase,
    trial: Option<Trial>,
    pressed: BTreeSet<String>,
    aggregator: Aggregator,
    report: Option<Report>,
}

impl Session {
    pub fn new(config: SessionConfig, generator: TrialGenerator) -> Self {
        let aggregator = Aggregator::new(config.scoring_rule, config.max_combo_size);
        Self {
            config,
            generator,
            phase: Phase::Idle,
            trial: None,
            pressed: BTreeSet::new(),
            aggregator,
            report: None,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn target(&self) -> Option<&TargetCombo> {
        self.trial.as_ref().map(|t| &t.target)
    }

    pub fn pressed(&self) -> &BTreeSet<String> {
        &self.pressed
    }

    pub fn trials_completed(&self) -> usize {
        self.aggregator.trials_completed()
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    pub fn report(&self) -> Option<&Report> {
        self.report.as_ref()
    }

    pub fn has_started(&self) -> bool {
        self.phase != Phase::Idle
    }

    pub fn has_finished(&self) -> bool {
        self.phase == Phase::Finished
    }

    /// When `tick` next has work to do
    pub fn deadline(&self) -> Option<Instant> {
        match self.phase {
            Phase::Scoring { resume_at } => Some(resume_at),
            Phase::Complete { close_at } => Some(close_at),
            _ => None,
        }
    }

    pub fn start(&mut self, now: Instant) -> Result<Transition, SessionError> {
        if self.phase != Phase::Idle {
            return Err(SessionError::AlreadyStarted);
        }
        info!(
            "session started: {} trials, combos up to {} keys, {} scoring",
            self.config.trial_count, self.config.max_combo_size, self.config.scoring_rule
        );
        self.aggregator = Aggregator::new(self.config.scoring_rule, self.config.max_combo_size);
        self.report = None;
        self.begin_trial(1, now)
    }

    pub fn on_press(&mut self, raw: &str, now: Instant) -> Result<Transition, SessionError> {
        if self.phase != Phase::AwaitingKeys {
            return Ok(Transition::None);
        }

        // letters are already lowercased here, so a shifted `A` matches `a`
        let token = keys::normalize(raw);
        debug!("press {raw} -> {token}");
        self.pressed.insert(token);

        let target_len = self.trial.as_ref().map_or(0, |t| t.target.len());
        if self.pressed.len() == target_len {
            return self.score_trial(now);
        }
        Ok(Transition::None)
    }

    pub fn on_release(&mut self, raw: &str) -> Transition {
        let token = keys::normalize(raw);
        debug!("release {raw} -> {token}");
        self.pressed.remove(&token);
        Transition::None
    }

    /// Handle the delayed transitions once their deadline has passed
    pub fn tick(&mut self, now: Instant) -> Result<Transition, SessionError> {
        match self.phase {
            Phase::Scoring { resume_at } if now >= resume_at => {
                let level = self.config.level_for(self.trials_completed());
                self.begin_trial(level, now)
            }
            Phase::Complete { close_at } if now >= close_at => {
                self.phase = Phase::Finished;
                Ok(Transition::Finished)
            }
            _ => Ok(Transition::None),
        }
    }

    /// Stop immediately, nothing is reported
    pub fn abort(&mut self) -> Transition {
        if self.phase != Phase::Finished {
            info!(
                "session aborted after {} of {} trials",
                self.trials_completed(),
                self.config.trial_count
            );
        }
        self.phase = Phase::Finished;
        Transition::Finished
    }

    fn begin_trial(&mut self, level: usize, now: Instant) -> Result<Transition, SessionError> {
        let target = self.generator.generate(level)?;
        debug!(
            "trial {} of {}: {target}",
            self.trials_completed() + 1,
            self.config.trial_count
        );
        self.pressed.clear();
        self.trial = Some(Trial {
            target: target.clone(),
            started_at: now,
        });
        self.phase = Phase::AwaitingKeys;
        Ok(Transition::TrialStarted(target))
    }

    fn score_trial(&mut self, now: Instant) -> Result<Transition, SessionError> {
        let Some(trial) = self.trial.take() else {
            return Ok(Transition::None);
        };
        let elapsed = now.saturating_duration_since(trial.started_at);
        let pressed = std::mem::take(&mut self.pressed);
        let outcome = self.aggregator.record(trial.target, pressed, elapsed);
        info!(
            "trial {} scored {:.2} in {:.3}s",
            self.trials_completed(),
            outcome.correctness,
            elapsed.as_secs_f64()
        );

        if self.trials_completed() >= self.config.trial_count {
            let report = self.aggregator.report(self.config.trial_count)?;
            self.report = Some(report.clone());
            self.phase = Phase::Complete {
                close_at: now + self.config.end_delay,
            };
            return Ok(Transition::SessionComplete {
                last: outcome,
                report,
            });
        }

        self.phase = Phase::Scoring {
            resume_at: now + self.config.inter_trial_delay,
        };
        Ok(Transition::TrialScored(outcome))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn config(trials: usize, max: usize) -> SessionConfig {
        SessionConfig {
            trial_count: trials,
            max_combo_size: max,
            inter_trial_delay: Duration::from_millis(500),
            end_delay: Duration::from_millis(2000),
            scoring_rule: ScoringRule::Exact,
        }
    }

    fn started(trials: usize, max: usize) -> (Session, Instant) {
        let mut session = Session::new(config(trials, max), TrialGenerator::new(Some(11)));
        let t0 = Instant::now();
        session.start(t0).unwrap();
        (session, t0)
    }

    fn press_target(session: &mut Session, now: Instant) -> Transition {
        let keys: Vec<String> = session.target().unwrap().keys().to_vec();
        let mut last = Transition::None;
        for k in keys {
            last = session.on_press(&k, now).unwrap();
        }
        last
    }

    #[test]
    fn test_deadline_follows_phase() {
        let (mut session, t0) = started(3, 3);
        assert_eq!(session.deadline(), None);
        press_target(&mut session, t0);
        assert_eq!(session.deadline(), Some(t0 + Duration::from_millis(500)));
        session.abort();
        assert_eq!(session.deadline(), None);
    }

    #[test]
    fn test_shifted_named_key_releases_cleanly() {
        let (mut session, mut now) = started(3, 3);
        for _ in 0..2 {
            press_target(&mut session, now);
            now += Duration::from_millis(500);
            session.tick(now).unwrap();
        }
        assert_eq!(session.target().unwrap().len(), 3);

        session.on_press("Shift_L", now).unwrap();
        session.on_press("Return", now).unwrap();
        session.on_release("Return");
        let pressed: Vec<_> = session.pressed().iter().cloned().collect();
        assert_eq!(pressed, vec![keys::SHIFT.to_string()]);
        assert_eq!(session.phase(), &Phase::AwaitingKeys);
    }

    #[test]
    fn test_level_schedule() {
        let cfg = config(10, 3);
        let levels: Vec<_> = (0..10).map(|c| cfg.level_for(c)).collect();
        assert_eq!(levels, vec![1, 1, 1, 2, 2, 2, 3, 3, 3, 3]);
    }

    #[test]
    fn test_level_monotonic_and_bounded() {
        for (trials, max) in [(10, 3), (3, 3), (2, 5), (100, 7), (1, 1)] {
            let cfg = config(trials, max);
            let mut prev = 0;
            for c in 0..trials {
                let level = cfg.level_for(c);
                assert!(level >= prev);
                assert!((1..=max).contains(&level));
                prev = level;
            }
        }
    }

    #[test]
    fn test_idle_until_started() {
        let mut session = Session::new(config(3, 3), TrialGenerator::new(Some(1)));
        assert_eq!(session.phase(), &Phase::Idle);
        assert!(!session.has_started());
        assert_eq!(session.on_press("a", Instant::now()).unwrap(), Transition::None);
        assert!(session.pressed().is_empty());
    }

    #[test]
    fn test_start_twice_fails() {
        let (mut session, t0) = started(3, 3);
        assert_matches!(session.start(t0), Err(SessionError::AlreadyStarted));
    }

    #[test]
    fn test_first_trial_is_single_key() {
        let (session, _) = started(3, 3);
        assert_eq!(session.phase(), &Phase::AwaitingKeys);
        assert_eq!(session.target().unwrap().len(), 1);
    }

    #[test]
    fn test_correct_press_scores_and_waits() {
        let (mut session, t0) = started(3, 3);
        let t1 = t0 + Duration::from_millis(400);
        let outcome = assert_matches!(press_target(&mut session, t1), Transition::TrialScored(o) => o);
        assert_eq!(outcome.correctness, 1.0);
        assert_eq!(outcome.elapsed, Duration::from_millis(400));
        assert_matches!(session.phase(), Phase::Scoring { .. });
        assert!(session.pressed().is_empty());

        // still waiting before the delay runs out
        assert_eq!(session.tick(t1 + Duration::from_millis(100)).unwrap(), Transition::None);
        let next = session.tick(t1 + Duration::from_millis(500)).unwrap();
        let target = assert_matches!(next, Transition::TrialStarted(t) => t);
        assert_eq!(target.len(), 2);
    }

    #[test]
    fn test_wrong_letter_with_right_count_ends_trial() {
        let (mut session, t0) = started(3, 3);
        let target = session.target().unwrap().keys()[0].clone();
        let wrong = if target == "a" { "b" } else { "a" };
        let outcome = assert_matches!(
            session.on_press(wrong, t0).unwrap(),
            Transition::TrialScored(o) => o
        );
        assert_eq!(outcome.correctness, 0.0);
        assert_eq!(session.trials_completed(), 1);
    }

    #[test]
    fn test_release_removes_key() {
        let (mut session, t0) = started(6, 3);
        for _ in 0..2 {
            press_target(&mut session, t0);
            session.tick(t0 + Duration::from_secs(1)).unwrap();
        }
        // two keys needed now, one held then released never completes
        assert_eq!(session.target().unwrap().len(), 2);
        session.on_press("Shift_L", t0).unwrap();
        session.on_release("Shift_R");
        assert!(session.pressed().is_empty());
    }

    #[test]
    fn test_shift_context_lowercases() {
        let (mut session, t0) = started(6, 3);
        press_target(&mut session, t0);
        session.tick(t0 + Duration::from_secs(1)).unwrap();
        assert_eq!(session.target().unwrap().len(), 1);
        press_target(&mut session, t0);
        session.tick(t0 + Duration::from_secs(2)).unwrap();
        // level 2 now: press a shifted letter without completing
        let target = session.target().unwrap().clone();
        assert_eq!(target.len(), 2);
        let letter = target.keys()[1].to_uppercase();
        session.on_press("Shift_L", t0).unwrap();
        session.on_press(&letter, t0 + Duration::from_millis(300)).unwrap();
        let bucket = session.aggregator().bucket(2).unwrap();
        assert_eq!(bucket.trials, 1);
        let expected = if target.keys()[0] == keys::SHIFT { 1.0 } else { 0.0 };
        assert_eq!(bucket.correctness, expected);
    }

    #[test]
    fn test_presses_ignored_between_trials() {
        let (mut session, t0) = started(3, 3);
        press_target(&mut session, t0);
        assert_eq!(session.on_press("z", t0).unwrap(), Transition::None);
        assert!(session.pressed().is_empty());
        assert_eq!(session.trials_completed(), 1);
    }

    #[test]
    fn test_full_session_completes_and_finishes() {
        let (mut session, t0) = started(3, 3);
        let mut now = t0;
        let mut report = None;
        for i in 0..3 {
            now += Duration::from_secs(1);
            match press_target(&mut session, now) {
                Transition::TrialScored(_) => {
                    now += Duration::from_millis(500);
                    assert_matches!(session.tick(now).unwrap(), Transition::TrialStarted(_));
                }
                Transition::SessionComplete { report: r, .. } => {
                    assert_eq!(i, 2);
                    report = Some(r);
                }
                other => panic!("unexpected transition {other:?}"),
            }
        }
        let report = report.unwrap();
        assert_eq!(report.overall.accuracy, 1.0);
        assert_eq!(report.by_size.iter().map(|s| s.trials).sum::<usize>(), 3);
        assert_matches!(session.phase(), Phase::Complete { .. });
        assert_eq!(session.tick(now + Duration::from_millis(1999)).unwrap(), Transition::None);
        assert_eq!(session.tick(now + Duration::from_secs(2)).unwrap(), Transition::Finished);
        assert!(session.has_finished());
    }

    #[test]
    fn test_abort_skips_report() {
        let (mut session, _) = started(3, 3);
        assert_eq!(session.abort(), Transition::Finished);
        assert!(session.has_finished());
        assert!(session.report().is_none());
    }
}
