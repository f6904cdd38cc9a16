use cubefield_common::Placement;
use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::cancel::CancelToken;
use crate::config::{ConfigError, PackConfig};
use crate::error::PackError;

/// How many samples pass between checks of the cancel flag.
const CANCEL_POLL_INTERVAL: u64 = 1024;

/// A group of newly accepted placements plus running totals.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub placements: Vec<Placement>,
    /// Placements accepted so far, including this batch.
    pub n: usize,
    /// Samples drawn so far, accepted or not.
    pub tests_n: u64,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.placements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    /// Index of this batch's first placement in the packed sequence.
    pub fn first_index(&self) -> usize {
        self.n - self.placements.len()
    }
}

/// Largest radius a sphere centered at `center` may take, or `None` when the
/// center sits too close to (or outside) the unit sphere.
///
/// The boundary slack `1 - |center|` is shrunk by `sqrt(4/3) / 2` and clamped
/// to `max_radius`.
pub fn candidate_radius(center: Vec3, min_radius: f32, max_radius: f32) -> Option<f32> {
    let slack = 1.0 - center.length();
    if slack < min_radius {
        return None;
    }
    let r = ((slack * slack * 4.0 / 3.0).sqrt() / 2.0).min(max_radius);
    (r >= min_radius).then_some(r)
}

/// Start a packing run. The returned iterator does the work lazily.
pub fn generate(config: PackConfig) -> Result<Packer, ConfigError> {
    Packer::new(config)
}

/// Rejection-sampling packer.
///
/// Iterating yields `Ok(Batch)` until `target_count` placements exist. If the
/// attempt cap is hit or the run is cancelled, a single `Err` is yielded and
/// the iterator ends.
pub struct Packer<R = ChaCha8Rng> {
    config: PackConfig,
    rng: R,
    packed: Vec<Placement>,
    tests_n: u64,
    emitted: usize,
    cancel: CancelToken,
    finished: bool,
}

impl Packer<ChaCha8Rng> {
    /// Seeded from `config.seed`, or from the thread RNG when unset.
    pub fn new(config: PackConfig) -> Result<Self, ConfigError> {
        let seed = config.seed.unwrap_or_else(rand::random);
        Self::with_rng(config, ChaCha8Rng::seed_from_u64(seed))
    }
}

impl<R: Rng> Packer<R> {
    pub fn with_rng(config: PackConfig, rng: R) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            packed: Vec::with_capacity(config.target_count),
            config,
            rng,
            tests_n: 0,
            emitted: 0,
            cancel: CancelToken::new(),
            finished: false,
        })
    }

    /// Replace the cancel flag with one shared with another thread.
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn config(&self) -> &PackConfig {
        &self.config
    }

    /// Every placement accepted so far, in acceptance order.
    pub fn placements(&self) -> &[Placement] {
        &self.packed
    }

    pub fn accepted(&self) -> usize {
        self.packed.len()
    }

    pub fn tests_n(&self) -> u64 {
        self.tests_n
    }

    pub fn is_complete(&self) -> bool {
        self.packed.len() == self.config.target_count
    }

    /// Test a candidate center against the boundary and every accepted
    /// placement. Returns the radius it would get.
    fn admit(&self, center: Vec3) -> Option<f32> {
        let min = self.config.min_radius;
        let r = candidate_radius(center, min, self.config.max_radius)?;
        let blocked = self
            .packed
            .iter()
            .any(|o| center.distance(o.center) < r + o.radius + min);
        (!blocked).then_some(r)
    }

    /// Sample until one candidate is accepted.
    fn place_one(&mut self) -> Result<Placement, PackError> {
        let mut attempts: u64 = 0;
        loop {
            if attempts % CANCEL_POLL_INTERVAL == 0 && self.cancel.is_cancelled() {
                return Err(PackError::Cancelled);
            }
            if let Some(max) = self.config.max_attempts {
                if attempts >= max {
                    return Err(PackError::Infeasible {
                        placed: self.packed.len(),
                        attempts,
                    });
                }
            }
            attempts += 1;
            self.tests_n += 1;

            let center = Vec3::new(
                self.rng.gen_range(-1.0f32..1.0),
                self.rng.gen_range(-1.0f32..1.0),
                self.rng.gen_range(-1.0f32..1.0),
            );
            if let Some(radius) = self.admit(center) {
                let placement = Placement { center, radius };
                self.packed.push(placement);
                return Ok(placement);
            }
        }
    }

    fn take_batch(&mut self) -> Batch {
        let start = self.emitted;
        self.emitted = self.packed.len();
        Batch {
            placements: self.packed[start..].to_vec(),
            n: self.packed.len(),
            tests_n: self.tests_n,
        }
    }
}

impl<R: Rng> Iterator for Packer<R> {
    type Item = Result<Batch, PackError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let target = self.config.target_count;
        while self.packed.len() < target {
            if let Err(err) = self.place_one() {
                self.finished = true;
                tracing::warn!(
                    placed = self.packed.len(),
                    tests_n = self.tests_n,
                    "packing stopped: {err}"
                );
                return Some(Err(err));
            }
            let n = self.packed.len();
            if n % self.config.batch_size == 0 || n == target {
                let batch = self.take_batch();
                tracing::debug!(n, tests_n = batch.tests_n, len = batch.len(), "batch ready");
                if n == target {
                    tracing::info!(n, tests_n = self.tests_n, "packing complete");
                }
                return Some(Ok(batch));
            }
        }
        self.finished = true;
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::validate;

    fn seeded(target_count: usize, seed: u64) -> PackConfig {
        PackConfig {
            target_count,
            seed: Some(seed),
            ..PackConfig::default()
        }
    }

    fn collect_ok(packer: Packer) -> Vec<Batch> {
        packer
            .map(|b| b.expect("packing should succeed"))
            .collect()
    }

    #[test]
    fn radius_formula() {
        // At the origin the heuristic gives sqrt(4/3)/2 ~ 0.577, clamped.
        assert_eq!(candidate_radius(Vec3::ZERO, 0.003, 0.3), Some(0.3));
        let r = candidate_radius(Vec3::ZERO, 0.003, 1.0).unwrap();
        assert!((r - (4.0f32 / 3.0).sqrt() / 2.0).abs() < 1e-6);

        let r = candidate_radius(Vec3::new(0.9, 0.0, 0.0), 0.003, 0.3).unwrap();
        assert!((r - 0.1 * (4.0f32 / 3.0).sqrt() / 2.0).abs() < 1e-5);
    }

    #[test]
    fn radius_rejects_near_boundary() {
        assert_eq!(candidate_radius(Vec3::new(0.999, 0.0, 0.0), 0.003, 0.3), None);
        assert_eq!(candidate_radius(Vec3::new(1.0, 1.0, 1.0), 0.003, 0.3), None);
        // slack 0.004 passes the slack test but shrinks below min_radius
        assert_eq!(candidate_radius(Vec3::new(0.996, 0.0, 0.0), 0.003, 0.3), None);
    }

    #[test]
    fn single_placement_is_one_partial_batch() {
        let config = PackConfig {
            target_count: 1,
            min_radius: 0.1,
            max_radius: 0.5,
            seed: Some(1),
            ..PackConfig::default()
        };
        let batches = collect_ok(generate(config).unwrap());
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].len(), 1);
        assert_eq!(batches[0].n, 1);

        let p = batches[0].placements[0];
        assert!(p.radius >= 0.1 && p.radius <= 0.5);
        assert!(p.center.length() + p.radius <= 1.0 + 1e-6);
    }

    #[test]
    fn forty_placements_make_two_full_batches() {
        let config = seeded(40, 2);
        let batches = collect_ok(generate(config.clone()).unwrap());
        assert_eq!(batches.len(), 2);
        assert!(batches.iter().all(|b| b.len() == 20));

        let all: Vec<Placement> = batches
            .iter()
            .flat_map(|b| b.placements.iter().copied())
            .collect();
        let report = validate(&all, config.min_radius, config.max_radius);
        assert!(report.is_valid(), "{report}");
    }

    #[test]
    fn final_batch_holds_remainder() {
        let batches = collect_ok(generate(seeded(45, 3)).unwrap());
        let sizes: Vec<usize> = batches.iter().map(Batch::len).collect();
        assert_eq!(sizes, vec![20, 20, 5]);
    }

    #[test]
    fn counters_are_cumulative() {
        let batches = collect_ok(generate(seeded(100, 4)).unwrap());
        let mut total = 0;
        let mut last_tests = 0;
        for batch in &batches {
            assert_eq!(batch.first_index(), total);
            total += batch.len();
            assert_eq!(batch.n, total);
            assert!(batch.tests_n >= batch.n as u64);
            assert!(batch.tests_n >= last_tests);
            last_tests = batch.tests_n;
        }
        assert_eq!(total, 100);
    }

    #[test]
    fn batches_concatenate_to_packed_sequence() {
        let mut packer = generate(seeded(65, 5)).unwrap();
        let mut streamed = Vec::new();
        for batch in packer.by_ref() {
            streamed.extend(batch.unwrap().placements);
        }
        assert!(packer.is_complete());
        assert_eq!(streamed.as_slice(), packer.placements());
        assert!(packer.next().is_none());
    }

    #[test]
    fn larger_run_keeps_invariants() {
        let config = seeded(600, 6);
        let mut packer = generate(config.clone()).unwrap();
        for batch in packer.by_ref() {
            batch.unwrap();
        }
        let report = validate(packer.placements(), config.min_radius, config.max_radius);
        assert_eq!(report.count, 600);
        assert!(report.is_valid(), "{report}");
    }

    #[test]
    fn same_seed_same_packing() {
        let a = collect_ok(generate(seeded(50, 99)).unwrap());
        let b = collect_ok(generate(seeded(50, 99)).unwrap());
        assert_eq!(a, b);
    }

    #[test]
    fn oversized_fixed_radius_reports_infeasible() {
        let config = PackConfig {
            target_count: 2,
            min_radius: 0.5,
            max_radius: 0.5,
            max_attempts: Some(200_000),
            seed: Some(7),
            ..PackConfig::default()
        };
        let mut packer = generate(config).unwrap();
        match packer.next() {
            Some(Err(PackError::Infeasible { placed, attempts })) => {
                assert_eq!(placed, 1);
                assert_eq!(attempts, 200_000);
            }
            other => panic!("expected infeasible, got {other:?}"),
        }
        assert!(packer.next().is_none());

        let report = validate(packer.placements(), 0.5, 0.5);
        assert!(report.is_valid(), "{report}");
    }

    #[test]
    fn cancelled_run_stops() {
        let cancel = CancelToken::new();
        let mut packer = generate(seeded(10, 8)).unwrap().with_cancel(cancel.clone());
        cancel.cancel();
        assert_eq!(packer.next(), Some(Err(PackError::Cancelled)));
        assert!(packer.next().is_none());
        assert_eq!(packer.accepted(), 0);
    }

    #[test]
    fn invalid_config_is_rejected() {
        assert!(matches!(
            generate(PackConfig::with_target(0)),
            Err(ConfigError::ZeroTarget)
        ));
    }
}
