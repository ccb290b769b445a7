//! Accuracy, latency, tension, intensity and score statistics over a batch run.

use super::executor::BatchRecord;
use crate::task::TaskKind;
use crate::types::IntensityLevel;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Summary statistics over a sample of values.
///
/// Quantiles interpolate linearly between closest ranks; `std_dev` is the
/// sample standard deviation (n - 1).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SummaryStats {
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub median: f64,
    pub p90: f64,
    pub p95: f64,
    pub std_dev: f64,
}

impl SummaryStats {
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let n = sorted.len();
        let mean = sorted.iter().sum::<f64>() / n as f64;
        let std_dev = if n > 1 {
            (sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64).sqrt()
        } else {
            0.0
        };
        Some(Self {
            count: n,
            mean,
            min: sorted[0],
            max: sorted[n - 1],
            median: quantile(&sorted, 0.5),
            p90: quantile(&sorted, 0.9),
            p95: quantile(&sorted, 0.95),
            std_dev,
        })
    }
}

/// Linear-interpolated quantile of an ascending, non-empty slice.
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * frac
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LabelAccuracy {
    pub count: usize,
    pub correct: usize,
    pub accuracy: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfusionPair {
    pub expected: String,
    pub predicted: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelTension {
    pub label: String,
    pub mean_tension: f64,
    pub count: usize,
}

/// Intensity levels predicted for samples of one expected emotion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelIntensity {
    pub label: String,
    pub count: usize,
    /// Count per level, in `IntensityLevel::ALL` order.
    pub counts: Vec<(IntensityLevel, usize)>,
    /// Ties resolve to the lower level.
    pub most_common: IntensityLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Successful samples whose prediction is a known label.
    pub valid_predictions: usize,
    pub undeterminable: usize,
    /// Accuracy over valid predictions.
    pub accuracy: Option<f64>,
    pub per_label: BTreeMap<String, LabelAccuracy>,
    pub top_confusions: Vec<ConfusionPair>,
    /// Per-task response latency in milliseconds.
    pub latency_ms: Vec<(TaskKind, SummaryStats)>,
    pub tension: Option<SummaryStats>,
    pub tension_by_label: Vec<LabelTension>,
    /// Predicted intensity levels over all samples; empty when no sample
    /// carries one.
    pub intensity_counts: Vec<(IntensityLevel, usize)>,
    pub intensity_by_label: Vec<LabelIntensity>,
    /// Degree scores from the score task.
    pub score: Option<SummaryStats>,
}

const TOP_CONFUSIONS: usize = 10;

impl BatchReport {
    pub fn from_records(records: &[BatchRecord]) -> Self {
        let succeeded = records.iter().filter(|r| r.is_success()).count();

        let mut per_label: BTreeMap<String, LabelAccuracy> = BTreeMap::new();
        let mut confusions: BTreeMap<(String, String), usize> = BTreeMap::new();
        let mut valid = 0usize;
        let mut correct = 0usize;
        let mut undeterminable = 0usize;

        for record in records {
            let Some(label) = record.predicted_label() else {
                continue;
            };
            let Some(predicted) = label.as_known() else {
                undeterminable += 1;
                continue;
            };
            valid += 1;
            let entry = per_label.entry(record.expected_label.clone()).or_default();
            entry.count += 1;
            if predicted == record.expected_label {
                correct += 1;
                entry.correct += 1;
            } else {
                *confusions
                    .entry((record.expected_label.clone(), predicted.to_string()))
                    .or_default() += 1;
            }
        }
        for stats in per_label.values_mut() {
            stats.accuracy = stats.correct as f64 / stats.count as f64;
        }

        let mut top_confusions: Vec<ConfusionPair> = confusions
            .into_iter()
            .map(|((expected, predicted), count)| ConfusionPair {
                expected,
                predicted,
                count,
            })
            .collect();
        top_confusions.sort_by(|a, b| b.count.cmp(&a.count));
        top_confusions.truncate(TOP_CONFUSIONS);

        let latency_ms = TaskKind::ALL
            .iter()
            .filter_map(|kind| {
                let values: Vec<f64> = records
                    .iter()
                    .filter_map(|r| r.result.as_ref()?.output(*kind))
                    .map(|o| o.latency_ms as f64)
                    .collect();
                SummaryStats::from_values(&values).map(|s| (*kind, s))
            })
            .collect();

        let tensions: Vec<(&str, f64)> = records
            .iter()
            .filter_map(|r| Some((r.expected_label.as_str(), r.tension()?)))
            .collect();
        let tension =
            SummaryStats::from_values(&tensions.iter().map(|(_, t)| *t).collect::<Vec<_>>());

        let mut by_label: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
        for &(label, t) in &tensions {
            let entry = by_label.entry(label).or_default();
            entry.0 += t;
            entry.1 += 1;
        }
        let mut tension_by_label: Vec<LabelTension> = by_label
            .into_iter()
            .map(|(label, (sum, count))| LabelTension {
                label: label.to_string(),
                mean_tension: sum / count as f64,
                count,
            })
            .collect();
        tension_by_label.sort_by(|a, b| b.mean_tension.total_cmp(&a.mean_tension));

        let intensities: Vec<(&str, IntensityLevel)> = records
            .iter()
            .filter_map(|r| Some((r.expected_label.as_str(), r.intensity()?)))
            .collect();
        let intensity_counts = if intensities.is_empty() {
            Vec::new()
        } else {
            level_counts(intensities.iter().map(|(_, level)| *level))
        };
        let mut levels_by_label: BTreeMap<&str, Vec<IntensityLevel>> = BTreeMap::new();
        for &(label, level) in &intensities {
            levels_by_label.entry(label).or_default().push(level);
        }
        let intensity_by_label = levels_by_label
            .into_iter()
            .map(|(label, levels)| {
                let counts = level_counts(levels.iter().copied());
                let most_common = most_common_level(&counts);
                LabelIntensity {
                    label: label.to_string(),
                    count: levels.len(),
                    counts,
                    most_common,
                }
            })
            .collect();

        let scores: Vec<f64> = records.iter().filter_map(|r| r.score()).collect();

        Self {
            total: records.len(),
            succeeded,
            failed: records.len() - succeeded,
            valid_predictions: valid,
            undeterminable,
            accuracy: (valid > 0).then(|| correct as f64 / valid as f64),
            per_label,
            top_confusions,
            latency_ms,
            tension,
            tension_by_label,
            intensity_counts,
            intensity_by_label,
            score: SummaryStats::from_values(&scores),
        }
    }
}

fn level_counts(levels: impl Iterator<Item = IntensityLevel>) -> Vec<(IntensityLevel, usize)> {
    let mut counts: Vec<(IntensityLevel, usize)> =
        IntensityLevel::ALL.iter().map(|l| (*l, 0)).collect();
    for level in levels {
        if let Some(entry) = counts.iter_mut().find(|(l, _)| *l == level) {
            entry.1 += 1;
        }
    }
    counts
}

fn most_common_level(counts: &[(IntensityLevel, usize)]) -> IntensityLevel {
    let mut best = (IntensityLevel::Low, 0);
    for &(level, count) in counts {
        if count > best.1 {
            best = (level, count);
        }
    }
    best.0
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Batch Summary ===")?;
        writeln!(
            f,
            "Samples: {} ({} succeeded, {} failed)",
            self.total, self.succeeded, self.failed
        )?;

        for (kind, s) in &self.latency_ms {
            writeln!(f, "\n--- {} latency (ms) ---", kind)?;
            writeln!(
                f,
                "mean {:.1} | min {:.0} | max {:.0} | median {:.1} | p90 {:.1} | p95 {:.1}",
                s.mean, s.min, s.max, s.median, s.p90, s.p95
            )?;
        }

        writeln!(f, "\n=== Label Accuracy ===")?;
        match self.accuracy {
            Some(acc) => writeln!(
                f,
                "Overall: {:.2}% ({}/{} valid predictions, {} undeterminable)",
                acc * 100.0,
                self.valid_predictions,
                self.total,
                self.undeterminable
            )?,
            None => writeln!(f, "No valid label predictions")?,
        }
        for (label, s) in &self.per_label {
            writeln!(f, "  {}: {:.2}% (n={})", label, s.accuracy * 100.0, s.count)?;
        }
        if !self.top_confusions.is_empty() {
            writeln!(f, "Top misclassifications:")?;
            for c in &self.top_confusions {
                writeln!(f, "  {} -> {}: {}", c.expected, c.predicted, c.count)?;
            }
        }

        if let Some(t) = &self.tension {
            writeln!(f, "\n=== Tension ===")?;
            writeln!(
                f,
                "n={} | mean {:.4} | min {:.4} | max {:.4} | median {:.4} | std {:.4}",
                t.count, t.mean, t.min, t.max, t.median, t.std_dev
            )?;
            for lt in &self.tension_by_label {
                writeln!(f, "  {}: {:.4} (n={})", lt.label, lt.mean_tension, lt.count)?;
            }
        }

        if !self.intensity_counts.is_empty() {
            writeln!(f, "\n=== Intensity ===")?;
            let total: usize = self.intensity_counts.iter().map(|(_, c)| c).sum();
            for (level, count) in &self.intensity_counts {
                writeln!(
                    f,
                    "  {}: {} ({:.2}%)",
                    level.as_str(),
                    count,
                    *count as f64 * 100.0 / total as f64
                )?;
            }
            for li in &self.intensity_by_label {
                let counts: Vec<String> = li
                    .counts
                    .iter()
                    .map(|(level, c)| format!("{} {}", level.as_str(), c))
                    .collect();
                writeln!(
                    f,
                    "  {}: {} | most common {} (n={})",
                    li.label,
                    counts.join(", "),
                    li.most_common.as_str(),
                    li.count
                )?;
            }
        }

        if let Some(s) = &self.score {
            writeln!(f, "\n=== Emotion Score ===")?;
            writeln!(
                f,
                "n={} | mean {:.4} | min {:.4} | max {:.4} | median {:.4} | std {:.4}",
                s.count, s.mean, s.min, s.max, s.median, s.std_dev
            )?;
        }
        Ok(())
    }
}
