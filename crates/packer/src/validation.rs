//! Invariant checks for a packed sequence.
//!
//! Used by the CLI to verify a finished run and by tests. Pair checks are
//! O(n^2).

use cubefield_common::Placement;
use std::fmt;

/// Slack allowed on every comparison for `f32` rounding.
const EPS: f32 = 1e-5;

/// Counts of invariant violations found in a packed sequence.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub count: usize,
    /// Placements with radius outside `[min_radius, max_radius]`.
    pub radius_violations: usize,
    /// Placements poking out of the unit sphere (`|c| + r > 1`).
    pub boundary_violations: usize,
    /// Pairs closer than `r_i + r_j + min_radius`.
    pub overlapping_pairs: usize,
    /// Smallest surface gap seen between any two placements.
    pub min_gap: Option<f32>,
    pub smallest_radius: Option<f32>,
    pub largest_radius: Option<f32>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.radius_violations == 0 && self.boundary_violations == 0 && self.overlapping_pairs == 0
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "placements={} radius_violations={} boundary_violations={} overlapping_pairs={}",
            self.count, self.radius_violations, self.boundary_violations, self.overlapping_pairs
        )?;
        if let Some(gap) = self.min_gap {
            write!(f, " min_gap={gap:.5}")?;
        }
        if let (Some(lo), Some(hi)) = (self.smallest_radius, self.largest_radius) {
            write!(f, " radius=[{lo:.4}, {hi:.4}]")?;
        }
        Ok(())
    }
}

/// Check every packing invariant over `placements`.
pub fn validate(placements: &[Placement], min_radius: f32, max_radius: f32) -> ValidationReport {
    let mut report = ValidationReport {
        count: placements.len(),
        ..Default::default()
    };

    for (i, p) in placements.iter().enumerate() {
        if p.radius < min_radius - EPS || p.radius > max_radius + EPS {
            report.radius_violations += 1;
        }
        if p.center.length() + p.radius > 1.0 + EPS {
            report.boundary_violations += 1;
        }
        report.smallest_radius = Some(report.smallest_radius.map_or(p.radius, |r| r.min(p.radius)));
        report.largest_radius = Some(report.largest_radius.map_or(p.radius, |r| r.max(p.radius)));

        for q in &placements[i + 1..] {
            let gap = p.gap(q);
            if gap < min_radius - EPS {
                report.overlapping_pairs += 1;
            }
            report.min_gap = Some(report.min_gap.map_or(gap, |g| g.min(gap)));
        }
    }

    report
}
