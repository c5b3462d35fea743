use std::{
    fmt::{self, Display},
    path::Path,
    time::{Duration, Instant},
};

use anyhow::{Context, anyhow, bail};
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use snapset::{DEFAULT_BUCKET_SIZE, SnapSet, XorShiftState};

const DEFAULT_OPS: u64 = 1_000_000;
const DEFAULT_UNIVERSE: u64 = 10_000;

/// A workload file as written on disk. Every field is optional.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkloadFile {
    pub ops: Option<u64>,
    pub universe: Option<u64>,
    pub seed: Option<u64>,
    pub insert: Option<u32>,
    pub delete: Option<u32>,
    pub exists: Option<u32>,
    pub random: Option<u32>,
}

impl WorkloadFile {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read workload file {}", path.display()))?;
        toml::from_str(&text)
            .with_context(|| format!("Failed to parse workload file {}", path.display()))
    }
}

/// Values given on the command line, which override the file.
#[derive(Debug, Default, Clone, Copy)]
pub struct Overrides {
    pub ops: Option<u64>,
    pub universe: Option<u64>,
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Insert,
    Delete,
    Exists,
    Random,
}

/// Relative weights of each operation in the workload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpMix {
    pub insert: u32,
    pub delete: u32,
    pub exists: u32,
    pub random: u32,
}

impl OpMix {
    pub const DEFAULT: Self = Self { insert: 4, delete: 3, exists: 2, random: 1 };

    pub const fn total(self) -> u64 {
        self.insert as u64 + self.delete as u64 + self.exists as u64 + self.random as u64
    }

    /// Maps a roll in `0..total()` onto an operation.
    fn pick(self, mut roll: u64) -> Op {
        for (weight, op) in [
            (self.insert, Op::Insert),
            (self.delete, Op::Delete),
            (self.exists, Op::Exists),
        ] {
            if roll < u64::from(weight) {
                return op;
            }
            roll -= u64::from(weight);
        }
        Op::Random
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkloadConfig {
    pub ops: u64,
    pub universe: u64,
    pub seed: Option<u64>,
    pub mix: OpMix,
}

impl WorkloadConfig {
    /// Reads the optional workload file and layers `overrides` on top.
    pub fn resolve(path: Option<&Path>, overrides: Overrides) -> anyhow::Result<Self> {
        let file = match path {
            Some(path) => WorkloadFile::load(path)?,
            None => WorkloadFile::default(),
        };
        Self::merge(&file, overrides)
    }

    pub fn merge(file: &WorkloadFile, overrides: Overrides) -> anyhow::Result<Self> {
        let mix = OpMix {
            insert: file.insert.unwrap_or(OpMix::DEFAULT.insert),
            delete: file.delete.unwrap_or(OpMix::DEFAULT.delete),
            exists: file.exists.unwrap_or(OpMix::DEFAULT.exists),
            random: file.random.unwrap_or(OpMix::DEFAULT.random),
        };
        if mix.total() == 0 {
            bail!("Operation weights sum to zero; at least one of insert/delete/exists/random must be positive");
        }
        let universe = overrides.universe.or(file.universe).unwrap_or(DEFAULT_UNIVERSE);
        if universe == 0 {
            bail!("The value universe must hold at least one value");
        }
        Ok(Self {
            ops: overrides.ops.or(file.ops).unwrap_or(DEFAULT_OPS),
            universe,
            seed: overrides.seed.or(file.seed),
            mix,
        })
    }
}

/// Tallies from a workload run.
#[derive(Debug, Default, Clone)]
pub struct WorkloadReport {
    pub inserts: u64,
    pub inserted_new: u64,
    pub deletes: u64,
    pub deleted_hits: u64,
    pub lookups: u64,
    pub lookup_hits: u64,
    pub draws: u64,
    pub empty_draws: u64,
    pub final_len: usize,
    pub elapsed: Duration,
}

impl WorkloadReport {
    const fn total_ops(&self) -> u64 {
        self.inserts + self.deletes + self.lookups + self.draws
    }
}

#[allow(clippy::cast_precision_loss)]
fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 { 0.0 } else { part as f64 * 100.0 / whole as f64 }
}

impl Display for WorkloadReport {
    #[allow(clippy::cast_precision_loss)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = self.elapsed.as_secs_f64();
        writeln!(f, "inserts : {:>10} ({:.1}% new)", self.inserts, percent(self.inserted_new, self.inserts))?;
        writeln!(f, "deletes : {:>10} ({:.1}% hit)", self.deletes, percent(self.deleted_hits, self.deletes))?;
        writeln!(f, "exists  : {:>10} ({:.1}% hit)", self.lookups, percent(self.lookup_hits, self.lookups))?;
        writeln!(f, "randoms : {:>10} ({} on empty set)", self.draws, self.empty_draws)?;
        writeln!(f, "final   : {:>10} elements", self.final_len)?;
        write!(f, "time    : {secs:>10.3}s")?;
        if secs > 0.0 {
            write!(f, " ({:.0} ops/s)", self.total_ops() as f64 / secs)?;
        }
        Ok(())
    }
}

/// Runs the workload against a fresh set and checks its invariants afterwards.
pub fn run(config: &WorkloadConfig) -> anyhow::Result<WorkloadReport> {
    let (mut driver, mut set): (XorShiftState, SnapSet<u64>) = match config.seed {
        Some(seed) => (
            XorShiftState::seed_from_u64(seed),
            SnapSet::with_seed(DEFAULT_BUCKET_SIZE, seed.wrapping_add(1)),
        ),
        None => (XorShiftState::from_time(), SnapSet::new(DEFAULT_BUCKET_SIZE)),
    };
    tracing::info!(
        ops = config.ops,
        universe = config.universe,
        seed = ?config.seed,
        "starting workload"
    );

    let mut report = WorkloadReport::default();
    let total = config.mix.total();
    let start = Instant::now();
    for _ in 0..config.ops {
        let value = driver.random_range(0..config.universe);
        match config.mix.pick(driver.random_range(0..total)) {
            Op::Insert => {
                report.inserts += 1;
                if set.insert_full(value).1 {
                    report.inserted_new += 1;
                }
            }
            Op::Delete => {
                report.deletes += 1;
                if set.delete(&value).is_some() {
                    report.deleted_hits += 1;
                }
            }
            Op::Exists => {
                report.lookups += 1;
                if set.exists(&value) {
                    report.lookup_hits += 1;
                }
            }
            Op::Random => {
                report.draws += 1;
                match set.get_random() {
                    Ok(v) => {
                        std::hint::black_box(v);
                    }
                    Err(_) => report.empty_draws += 1,
                }
            }
        }
    }
    report.elapsed = start.elapsed();
    report.final_len = set.len();

    set.check_validity()
        .map_err(|e| anyhow!("Set invariants broken after workload: {e}"))?;
    tracing::info!(elapsed = ?report.elapsed, len = report.final_len, "workload finished");
    Ok(report)
}
