use std::fmt::{self, Display};

use anyhow::Context;
use fxhash::FxHashMap;
use snapset::{DEFAULT_BUCKET_SIZE, SnapSet};

/// How often each live value came up.
#[derive(Debug, Clone)]
pub struct SampleReport {
    pub draws: u64,
    /// `(value, times drawn)`, sorted by value. Includes values never drawn.
    pub counts: Vec<(String, u64)>,
}

impl Display for SampleReport {
    #[allow(clippy::cast_precision_loss)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.counts.iter().map(|(v, _)| v.len()).max().unwrap_or(0).max(5);
        writeln!(f, "{:<width$}  {:>10}  {:>7}", "value", "draws", "share")?;
        for (value, count) in &self.counts {
            let share = if self.draws == 0 { 0.0 } else { *count as f64 * 100.0 / self.draws as f64 };
            writeln!(f, "{value:<width$}  {count:>10}  {share:>6.2}%")?;
        }
        write!(f, "{} draws over {} values", self.draws, self.counts.len())
    }
}

pub fn run(
    values: Vec<String>,
    deletes: &[String],
    draws: u64,
    seed: Option<u64>,
) -> anyhow::Result<SampleReport> {
    let capacity = values.len().max(DEFAULT_BUCKET_SIZE);
    let mut set: SnapSet<String> = match seed {
        Some(seed) => SnapSet::with_seed(capacity, seed),
        None => SnapSet::new(capacity),
    };

    for value in values {
        let (slot, added) = set.insert_full(value);
        if added {
            tracing::debug!(slot, "inserted");
        } else {
            tracing::warn!(slot, "duplicate value ignored");
        }
    }
    for value in deletes {
        set.delete(value.as_str()).map_or_else(
            || tracing::warn!(%value, "not present, nothing deleted"),
            |slot| tracing::debug!(%value, slot, "deleted"),
        );
    }

    let mut counts: FxHashMap<String, u64> = set.iter().map(|v| (v.clone(), 0)).collect();
    for _ in 0..draws {
        let value = set.get_random().context("Cannot draw samples")?;
        if let Some(count) = counts.get_mut(value) {
            *count += 1;
        }
    }

    let mut counts: Vec<_> = counts.into_iter().collect();
    counts.sort_unstable();
    Ok(SampleReport { draws, counts })
}
