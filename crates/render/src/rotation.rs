use std::f32::consts::FRAC_PI_2;
use std::time::Duration;

use glam::{Quat, Vec3};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Length of one eased quarter-turn.
pub const TURN_DURATION: Duration = Duration::from_millis(3000);
/// Pause before each turn, including the first.
pub const TURN_DELAY: Duration = Duration::from_millis(1000);

/// Index pair meaning "no turn about either axis".
const IDENTITY_PAIR: (usize, usize) = (1, 1);

const QUARTER_ANGLES: [f32; 3] = [-FRAC_PI_2, 0.0, FRAC_PI_2];

/// Smooth ease-in/out: `35t^4 - 84t^5 + 70t^6 - 20t^7`.
pub fn ease(t: f32) -> f32 {
    let t2 = t * t;
    let t4 = t2 * t2;
    t4 * (35.0 - 84.0 * t + 70.0 * t2 - 20.0 * t2 * t)
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Waiting { until: Duration },
    Turning { from: Quat, to: Quat, start: Duration },
}

/// Drives the field through random quarter turns about X and Y.
///
/// Each turn combines a turn about X and a turn about Y (each one of
/// -90, 0 or +90 degrees), never the do-nothing pair and never the same pair
/// twice in a row.
#[derive(Debug)]
pub struct RotationAnimator<R = ChaCha8Rng> {
    rotation: Quat,
    phase: Phase,
    prev_pair: (usize, usize),
    rng: R,
    duration: Duration,
    delay: Duration,
}

impl RotationAnimator<ChaCha8Rng> {
    pub fn new() -> Self {
        Self::with_seed(rand::random())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(ChaCha8Rng::seed_from_u64(seed))
    }
}

impl Default for RotationAnimator<ChaCha8Rng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> RotationAnimator<R> {
    pub fn with_rng(rng: R) -> Self {
        Self {
            rotation: Quat::IDENTITY,
            phase: Phase::Waiting { until: TURN_DELAY },
            prev_pair: IDENTITY_PAIR,
            rng,
            duration: TURN_DURATION,
            delay: TURN_DELAY,
        }
    }

    /// Override turn and pause lengths.
    pub fn with_timing(mut self, duration: Duration, delay: Duration) -> Self {
        self.duration = duration;
        self.delay = delay;
        self.phase = Phase::Waiting { until: delay };
        self
    }

    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    pub fn is_turning(&self) -> bool {
        matches!(self.phase, Phase::Turning { .. })
    }

    /// Advance to `elapsed` (time since the animation started) and return
    /// the field rotation.
    pub fn update(&mut self, elapsed: Duration) -> Quat {
        if let Phase::Waiting { until } = self.phase {
            if elapsed < until {
                return self.rotation;
            }
            let to = self.next_target();
            self.phase = Phase::Turning {
                from: self.rotation,
                to,
                start: until,
            };
        }

        if let Phase::Turning { from, to, start } = self.phase {
            let t = if self.duration.is_zero() {
                1.0
            } else {
                (elapsed.saturating_sub(start).as_secs_f32() / self.duration.as_secs_f32())
                    .min(1.0)
            };
            if t >= 1.0 {
                self.rotation = to;
                self.phase = Phase::Waiting {
                    until: elapsed + self.delay,
                };
            } else {
                self.rotation = from.slerp(to, ease(t)).normalize();
            }
        }
        self.rotation
    }

    fn pick_pair(&mut self) -> (usize, usize) {
        loop {
            let pair = (self.rng.gen_range(0..3), self.rng.gen_range(0..3));
            if pair != IDENTITY_PAIR && pair != self.prev_pair {
                self.prev_pair = pair;
                return pair;
            }
        }
    }

    fn next_target(&mut self) -> Quat {
        let (xi, yi) = self.pick_pair();
        let qx = Quat::from_axis_angle(Vec3::X, QUARTER_ANGLES[xi]);
        let qy = Quat::from_axis_angle(Vec3::Y, QUARTER_ANGLES[yi]);
        tracing::trace!(xi, yi, "next field turn");
        (qy * qx * self.rotation).normalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn ease_endpoints() {
        assert_eq!(ease(0.0), 0.0);
        assert!((ease(1.0) - 1.0).abs() < 1e-6);
        assert!((ease(0.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn ease_is_monotonic() {
        let mut prev = 0.0;
        for i in 1..=100 {
            let v = ease(i as f32 / 100.0);
            assert!(v >= prev - 1e-6);
            prev = v;
        }
    }

    #[test]
    fn holds_still_during_first_delay() {
        let mut anim = RotationAnimator::with_seed(1);
        assert_eq!(anim.update(ms(0)), Quat::IDENTITY);
        assert_eq!(anim.update(ms(999)), Quat::IDENTITY);
        assert!(!anim.is_turning());
    }

    #[test]
    fn turn_lands_on_quarter_rotation() {
        let mut anim = RotationAnimator::with_seed(2);
        anim.update(ms(1000));
        assert!(anim.is_turning());
        anim.update(ms(2500));
        let end = anim.update(ms(4000));
        assert!(!anim.is_turning());

        assert!(!end.abs_diff_eq(Quat::IDENTITY, 1e-4));
        // Quarter turns map axes onto axes.
        for axis in [Vec3::X, Vec3::Y, Vec3::Z] {
            let v = end * axis;
            let largest = v.abs().max_element();
            assert!((largest - 1.0).abs() < 1e-4, "{v:?}");
        }
    }

    #[test]
    fn midway_is_between_endpoints() {
        let mut anim = RotationAnimator::with_seed(3);
        anim.update(ms(1000));
        let mid = anim.update(ms(2500));
        let end = anim.update(ms(4000));
        assert!(!mid.abs_diff_eq(Quat::IDENTITY, 1e-3));
        assert!(!mid.abs_diff_eq(end, 1e-3));
    }

    #[test]
    fn waits_between_turns() {
        let mut anim = RotationAnimator::with_seed(4);
        anim.update(ms(1000));
        let first = anim.update(ms(4000));
        assert_eq!(anim.update(ms(4500)), first);
        anim.update(ms(5000));
        assert!(anim.is_turning());
    }

    #[test]
    fn never_repeats_or_idles() {
        let mut anim = RotationAnimator::with_seed(5);
        let mut prev = IDENTITY_PAIR;
        for _ in 0..500 {
            let pair = anim.pick_pair();
            assert_ne!(pair, IDENTITY_PAIR);
            assert_ne!(pair, prev);
            assert!(pair.0 < 3 && pair.1 < 3);
            prev = pair;
        }
    }

    #[test]
    fn custom_timing() {
        let mut anim = RotationAnimator::with_seed(6).with_timing(ms(100), ms(10));
        assert_eq!(anim.update(ms(5)), Quat::IDENTITY);
        anim.update(ms(10));
        assert!(anim.is_turning());
        anim.update(ms(110));
        assert!(!anim.is_turning());
    }
}
