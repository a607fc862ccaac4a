use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::time::Duration;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::combo::TargetCombo;
use crate::error::SessionError;

/// How a finished trial's pressed keys are compared against the target
#[derive(
    Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, ValueEnum, strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ScoringRule {
    /// all-or-nothing: 1 only when the sets are identical
    #[default]
    Exact,
    /// share of target keys that were held
    Proportional,
}

impl ScoringRule {
    pub fn score(&self, pressed: &BTreeSet<String>, target: &TargetCombo) -> f64 {
        let target_set = target.as_set();
        match self {
            ScoringRule::Exact => {
                let same = pressed.len() == target_set.len()
                    && pressed.iter().all(|k| target_set.contains(k.as_str()));
                if same {
                    1.0
                } else {
                    0.0
                }
            }
            ScoringRule::Proportional => {
                if target_set.is_empty() {
                    return 0.0;
                }
                let matched = pressed
                    .iter()
                    .filter(|k| target_set.contains(k.as_str()))
                    .count();
                matched as f64 / target_set.len() as f64
            }
        }
    }
}

/// Running totals for one bucket of trials
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Tally {
    pub correctness: f64,
    pub elapsed_secs: f64,
    pub trials: usize,
}

impl Tally {
    fn add(&mut self, correctness: f64, elapsed: Duration) {
        self.correctness += correctness;
        self.elapsed_secs += elapsed.as_secs_f64();
        self.trials += 1;
    }

    pub fn avg_time(&self) -> Option<f64> {
        (self.trials > 0).then(|| self.elapsed_secs / self.trials as f64)
    }

    pub fn accuracy(&self) -> Option<f64> {
        (self.trials > 0).then(|| self.correctness / self.trials as f64)
    }
}

/// The result of one completed trial
#[derive(Debug, Clone, PartialEq)]
pub struct TrialOutcome {
    pub target: TargetCombo,
    pub pressed: BTreeSet<String>,
    pub elapsed: Duration,
    pub correctness: f64,
}

/// Per-key-count and session-wide statistics
#[derive(Debug, Clone)]
pub struct Aggregator {
    rule: ScoringRule,
    by_size: BTreeMap<usize, Tally>,
    overall: Tally,
}

impl Aggregator {
    pub fn new(rule: ScoringRule, max_combo_size: usize) -> Self {
        let by_size = (1..=max_combo_size).map(|n| (n, Tally::default())).collect();
        Self {
            rule,
            by_size,
            overall: Tally::default(),
        }
    }

    /// Score a trial and fold it into the bucket for its size and the overall totals
    pub fn record(
        &mut self,
        target: TargetCombo,
        pressed: BTreeSet<String>,
        elapsed: Duration,
    ) -> TrialOutcome {
        let correctness = self.rule.score(&pressed, &target);
        self.by_size
            .entry(target.len())
            .or_default()
            .add(correctness, elapsed);
        self.overall.add(correctness, elapsed);

        TrialOutcome {
            target,
            pressed,
            elapsed,
            correctness,
        }
    }

    pub fn overall(&self) -> &Tally {
        &self.overall
    }

    pub fn bucket(&self, size: usize) -> Option<&Tally> {
        self.by_size.get(&size)
    }

    pub fn trials_completed(&self) -> usize {
        self.overall.trials
    }

    /// Summarize the session.
    ///
    /// The overall average time is spread over the configured trial count while
    /// the overall accuracy uses the completed count.
    pub fn report(&self, configured_trials: usize) -> Result<Report, SessionError> {
        if self.overall.trials == 0 {
            return Err(SessionError::NoTrialsCompleted);
        }

        let overall = Summary {
            key_count: KeyCount::Overall,
            avg_time: self.overall.elapsed_secs / configured_trials.max(1) as f64,
            accuracy: self.overall.correctness / self.overall.trials as f64,
            trials: self.overall.trials,
        };

        let by_size = self
            .by_size
            .iter()
            .filter_map(|(&size, tally)| {
                Some(Summary {
                    key_count: KeyCount::Size(size),
                    avg_time: tally.avg_time()?,
                    accuracy: tally.accuracy()?,
                    trials: tally.trials,
                })
            })
            .collect();

        Ok(Report { overall, by_size })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCount {
    Overall,
    Size(usize),
}

impl fmt::Display for KeyCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyCount::Overall => write!(f, "Overall"),
            KeyCount::Size(n) => write!(f, "{n}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub key_count: KeyCount,
    pub avg_time: f64,
    pub accuracy: f64,
    pub trials: usize,
}

/// End-of-session statistics, `Overall` first then one entry per size with trials
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub overall: Summary,
    pub by_size: Vec<Summary>,
}

impl Report {
    pub fn summaries(&self) -> impl Iterator<Item = &Summary> {
        std::iter::once(&self.overall).chain(self.by_size.iter())
    }

    pub fn rows(&self, participant_id: &str, trial_label: &str) -> Vec<OutputRow> {
        self.summaries()
            .map(|s| OutputRow {
                participant_id: participant_id.to_string(),
                trial_label: trial_label.to_string(),
                avg_time: s.avg_time,
                accuracy: s.accuracy,
                key_count: s.key_count.to_string(),
            })
            .collect()
    }
}

/// One line of the results file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputRow {
    pub participant_id: String,
    pub trial_label: String,
    pub avg_time: f64,
    pub accuracy: f64,
    pub key_count: String,
}
