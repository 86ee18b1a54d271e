use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;

/// Score used whenever a ratio has a zero denominator.
pub const ZERO_DIVISION: f64 = 1.0;

/// Precision, recall and F1 for one class (or an average), with its support.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Per-class and averaged classification scores over one split.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationReport {
    pub classes: BTreeMap<usize, ClassMetrics>,
    pub accuracy: f64,
    pub macro_avg: ClassMetrics,
    pub weighted_avg: ClassMetrics,
}

#[derive(Default, Clone, Copy)]
struct Counts {
    true_positive: usize,
    predicted: usize,
    actual: usize,
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        ZERO_DIVISION
    } else {
        num as f64 / den as f64
    }
}

impl ClassificationReport {
    /// Report over every label that appears in either `predicted` or `actual`.
    ///
    /// # Panics
    ///
    /// Panics if `predicted` and `actual` differ in length.
    pub fn from_pairs(predicted: &[usize], actual: &[usize]) -> Self {
        let labels: Vec<usize> = predicted
            .iter()
            .chain(actual)
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        Self::with_labels(predicted, actual, &labels)
    }

    /// Report over an explicit label set. Labels outside the set are ignored
    /// in the per-class rows but still count toward accuracy.
    ///
    /// # Panics
    ///
    /// Panics if `predicted` and `actual` differ in length.
    pub fn with_labels(predicted: &[usize], actual: &[usize], labels: &[usize]) -> Self {
        assert_eq!(
            predicted.len(),
            actual.len(),
            "predicted and actual label lists differ in length"
        );

        let mut counts: BTreeMap<usize, Counts> =
            labels.iter().map(|&l| (l, Counts::default())).collect();
        let mut correct = 0;
        for (&p, &a) in predicted.iter().zip(actual) {
            if p == a {
                correct += 1;
            }
            if let Some(c) = counts.get_mut(&p) {
                c.predicted += 1;
                if p == a {
                    c.true_positive += 1;
                }
            }
            if let Some(c) = counts.get_mut(&a) {
                c.actual += 1;
            }
        }

        let classes: BTreeMap<usize, ClassMetrics> = counts
            .into_iter()
            .map(|(label, c)| {
                let false_positive = c.predicted - c.true_positive;
                let false_negative = c.actual - c.true_positive;
                let metrics = ClassMetrics {
                    precision: ratio(c.true_positive, c.predicted),
                    recall: ratio(c.true_positive, c.actual),
                    f1: ratio(
                        2 * c.true_positive,
                        2 * c.true_positive + false_positive + false_negative,
                    ),
                    support: c.actual,
                };
                (label, metrics)
            })
            .collect();

        let total_support: usize = classes.values().map(|m| m.support).sum();
        let macro_avg = average(&classes, total_support, |_| 1.0);
        let weighted_avg = average(&classes, total_support, |m| m.support as f64);

        ClassificationReport {
            classes,
            accuracy: ratio(correct, actual.len()),
            macro_avg,
            weighted_avg,
        }
    }

    /// Support-weighted mean recall; the model-selection score.
    pub fn weighted_recall(&self) -> f64 {
        self.weighted_avg.recall
    }

    /// Number of samples the report was computed from.
    pub fn total_support(&self) -> usize {
        self.macro_avg.support
    }
}

fn average(
    classes: &BTreeMap<usize, ClassMetrics>,
    support: usize,
    weight: impl Fn(&ClassMetrics) -> f64,
) -> ClassMetrics {
    let total_weight: f64 = classes.values().map(&weight).sum();
    if total_weight == 0.0 {
        return ClassMetrics {
            precision: ZERO_DIVISION,
            recall: ZERO_DIVISION,
            f1: ZERO_DIVISION,
            support,
        };
    }
    let mean = |field: fn(&ClassMetrics) -> f64| {
        classes.values().map(|m| field(m) * weight(m)).sum::<f64>() / total_weight
    };
    ClassMetrics {
        precision: mean(|m| m.precision),
        recall: mean(|m| m.recall),
        f1: mean(|m| m.f1),
        support,
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>12} {:>9} {:>9} {:>9} {:>9}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;
        for (label, m) in &self.classes {
            writeln!(
                f,
                "{:>12} {:>9.4} {:>9.4} {:>9.4} {:>9}",
                label, m.precision, m.recall, m.f1, m.support
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>12} {:>9} {:>9} {:>9.4} {:>9}",
            "accuracy",
            "",
            "",
            self.accuracy,
            self.total_support()
        )?;
        for (name, m) in [("macro avg", &self.macro_avg), ("weighted avg", &self.weighted_avg)] {
            writeln!(
                f,
                "{:>12} {:>9.4} {:>9.4} {:>9.4} {:>9}",
                name, m.precision, m.recall, m.f1, m.support
            )?;
        }
        Ok(())
    }
}
