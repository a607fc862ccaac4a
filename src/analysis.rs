//! Offline analysis of accumulated results files.
//!
//! Reads the rows appended by experiment runs, tags each participant as novice
//! or experienced, and produces per-participant means, per-group summaries and
//! overall descriptive statistics.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::io;
use std::path::Path;

use itertools::Itertools;
use log::debug;

use crate::error::AnalysisError;
use crate::util::{mean, quantile, sample_std_dev};

pub const DEFAULT_NOVICES: [&str; 3] = ["Wolverine", "Tony Stark", "Batman1"];

/// One data line of a results file
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    pub participant_id: String,
    pub trial: String,
    pub avg_time: f64,
    pub correctness_rate: f64,
    /// `None` for `Overall` rows
    pub key_count: Option<f64>,
    pub combination_correctness: f64,
    /// Position of the row among the participant's rows, in file order
    pub adjusted_trial: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Metric {
    AvgTime,
    CorrectnessRate,
    NumKeys,
    CombinationCorrectness,
}

impl Metric {
    pub const ALL: [Metric; 4] = [
        Metric::AvgTime,
        Metric::CorrectnessRate,
        Metric::NumKeys,
        Metric::CombinationCorrectness,
    ];

    pub fn value(&self, row: &ResultRow) -> Option<f64> {
        match self {
            Metric::AvgTime => Some(row.avg_time),
            Metric::CorrectnessRate => Some(row.correctness_rate),
            Metric::NumKeys => row.key_count,
            Metric::CombinationCorrectness => Some(row.combination_correctness),
        }
    }

    fn values(&self, rows: &[&ResultRow]) -> Vec<f64> {
        rows.iter().filter_map(|r| self.value(r)).collect()
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Metric::AvgTime => "Avg_Time",
            Metric::CorrectnessRate => "Correctness_Rate",
            Metric::NumKeys => "Num_Keys",
            Metric::CombinationCorrectness => "Combination_Correctness",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, strum_macros::Display)]
pub enum Group {
    Experienced,
    Novice,
}

/// Count, mean, spread and quartiles of one metric
#[derive(Debug, Clone, PartialEq)]
pub struct Describe {
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub median: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

impl Describe {
    pub fn of(values: &[f64]) -> Self {
        Self {
            count: values.len(),
            mean: mean(values),
            std: sample_std_dev(values),
            min: quantile(values, 0.0),
            q25: quantile(values, 0.25),
            median: quantile(values, 0.5),
            q75: quantile(values, 0.75),
            max: quantile(values, 1.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParticipantMeans {
    pub participant_id: String,
    pub rows: usize,
    pub means: BTreeMap<Metric, Option<f64>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupSummary {
    pub group: Group,
    pub participants: usize,
    /// (mean, sample std) per metric
    pub stats: BTreeMap<Metric, (Option<f64>, Option<f64>)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub participants: Vec<ParticipantMeans>,
    pub groups: Vec<GroupSummary>,
    pub overall: BTreeMap<Metric, Describe>,
}

pub fn load<P: AsRef<Path>>(path: P) -> Result<Vec<ResultRow>, AnalysisError> {
    let file = std::fs::File::open(path)?;
    read_rows(file)
}

/// Parse result rows, skipping repeated header lines and anything without a
/// numeric time or correctness.
pub fn read_rows<R: io::Read>(reader: R) -> Result<Vec<ResultRow>, AnalysisError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut rows = Vec::new();

    for record in rdr.records() {
        let record = record?;
        let line = record.position().map_or(0, |p| p.line());
        if record.len() != 5 && record.len() != 6 {
            return Err(AnalysisError::ColumnCount {
                line,
                found: record.len(),
            });
        }

        let number = |idx: usize| record.get(idx).and_then(|v| v.parse::<f64>().ok());
        let (Some(avg_time), Some(correctness_rate)) = (number(2), number(3)) else {
            debug!("skipping non-data line {line}");
            continue;
        };

        let participant_id = record[0].to_string();
        let counter = seen.entry(participant_id.clone()).or_insert(0);
        let adjusted_trial = *counter;
        *counter += 1;

        rows.push(ResultRow {
            participant_id,
            trial: record[1].to_string(),
            avg_time,
            correctness_rate,
            key_count: number(4),
            combination_correctness: number(5).unwrap_or(correctness_rate),
            adjusted_trial,
        });
    }

    Ok(rows)
}

pub fn group_of(participant_id: &str, novices: &[String]) -> Group {
    if novices.iter().any(|n| n == participant_id) {
        Group::Novice
    } else {
        Group::Experienced
    }
}

pub fn analyze(rows: &[ResultRow], novices: &[String]) -> Result<Analysis, AnalysisError> {
    if rows.is_empty() {
        return Err(AnalysisError::NoRows);
    }

    let by_participant: BTreeMap<&str, Vec<&ResultRow>> = rows
        .iter()
        .map(|r| (r.participant_id.as_str(), r))
        .into_group_map()
        .into_iter()
        .collect();

    let participants = by_participant
        .iter()
        .map(|(id, rows)| ParticipantMeans {
            participant_id: id.to_string(),
            rows: rows.len(),
            means: Metric::ALL
                .iter()
                .map(|m| (*m, mean(&m.values(rows))))
                .collect(),
        })
        .collect();

    let by_group: BTreeMap<Group, Vec<&ResultRow>> = rows
        .iter()
        .map(|r| (group_of(&r.participant_id, novices), r))
        .into_group_map()
        .into_iter()
        .collect();

    let groups = by_group
        .iter()
        .map(|(group, rows)| GroupSummary {
            group: *group,
            participants: rows.iter().map(|r| &r.participant_id).unique().count(),
            stats: Metric::ALL
                .iter()
                .map(|m| {
                    let values = m.values(rows);
                    (*m, (mean(&values), sample_std_dev(&values)))
                })
                .collect(),
        })
        .collect();

    let all: Vec<&ResultRow> = rows.iter().collect();
    let overall = Metric::ALL
        .iter()
        .map(|m| (*m, Describe::of(&m.values(&all))))
        .collect();

    Ok(Analysis {
        participants,
        groups,
        overall,
    })
}

/// Avg time against adjusted trial, one series per participant in order of appearance
pub fn performance_series(rows: &[ResultRow]) -> Vec<(String, Vec<(f64, f64)>)> {
    rows.iter()
        .map(|r| r.participant_id.as_str())
        .unique()
        .map(|id| {
            let points = rows
                .iter()
                .filter(|r| r.participant_id == id)
                .map(|r| (r.adjusted_trial as f64, r.avg_time))
                .collect();
            (id.to_string(), points)
        })
        .collect()
}

fn cell(v: Option<f64>) -> String {
    v.map_or_else(|| "NaN".to_string(), |v| format!("{v:.6}"))
}

impl Analysis {
    pub fn summary_text(&self) -> String {
        let width = 24;
        let mut out = String::new();

        out.push_str("Mean Statistics Per Participant:\n\n");
        out.push_str(&format!("{:<20}{:>6}", "Participant_ID", "Rows"));
        for m in Metric::ALL {
            out.push_str(&format!("{:>width$}", m.to_string()));
        }
        out.push('\n');
        for p in &self.participants {
            out.push_str(&format!("{:<20}{:>6}", p.participant_id, p.rows));
            for m in Metric::ALL {
                let value = cell(p.means.get(&m).copied().flatten());
                out.push_str(&format!("{value:>width$}"));
            }
            out.push('\n');
        }

        out.push_str("\nPerformance Summary by Group:\n\n");
        out.push_str(&format!("{:<14}{:>8}", "Group", "People"));
        for m in Metric::ALL {
            out.push_str(&format!(
                "{:>width$}{:>width$}",
                format!("{m} mean"),
                format!("{m} std")
            ));
        }
        out.push('\n');
        for g in &self.groups {
            out.push_str(&format!("{:<14}{:>8}", g.group.to_string(), g.participants));
            for m in Metric::ALL {
                let (avg, std) = g.stats.get(&m).copied().unwrap_or((None, None));
                out.push_str(&format!("{:>width$}{:>width$}", cell(avg), cell(std)));
            }
            out.push('\n');
        }

        out.push_str("\nOverall Statistics:\n\n");
        out.push_str(&format!("{:<8}", ""));
        for m in Metric::ALL {
            out.push_str(&format!("{:>width$}", m.to_string()));
        }
        out.push('\n');
        let stat_rows: [(&str, fn(&Describe) -> Option<f64>); 7] = [
            ("mean", |d| d.mean),
            ("std", |d| d.std),
            ("min", |d| d.min),
            ("25%", |d| d.q25),
            ("50%", |d| d.median),
            ("75%", |d| d.q75),
            ("max", |d| d.max),
        ];
        out.push_str(&format!("{:<8}", "count"));
        for m in Metric::ALL {
            let count = self.overall.get(&m).map_or(0, |d| d.count);
            out.push_str(&format!("{:>width$}", format!("{count}.000000")));
        }
        out.push('\n');
        for (label, pick) in stat_rows {
            out.push_str(&format!("{label:<8}"));
            for m in Metric::ALL {
                let value = cell(self.overall.get(&m).and_then(pick));
                out.push_str(&format!("{value:>width$}"));
            }
            out.push('\n');
        }

        out
    }
}
