use cubefield_common::Placement;
use glam::{Mat4, Quat, Vec3};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Uniform scale applied to the whole field so the unit ball fits the view.
pub const FIELD_SCALE: f32 = 0.618;

/// Cube size buckets. Each bucket is drawn with its own rounded-box mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SizeClass {
    Small,
    Medium,
    Large,
}

impl SizeClass {
    pub const ALL: [SizeClass; 3] = [SizeClass::Small, SizeClass::Medium, SizeClass::Large];

    pub fn of(radius: f32) -> Self {
        if radius > 0.1 {
            SizeClass::Large
        } else if radius > 0.01 {
            SizeClass::Medium
        } else {
            SizeClass::Small
        }
    }

    /// Corner rounding radius of the 2x2x2 box used for this class.
    pub fn bevel(self) -> f32 {
        match self {
            SizeClass::Small => 0.04,
            SizeClass::Medium => 0.08,
            SizeClass::Large => 0.4,
        }
    }

    pub fn index(self) -> usize {
        match self {
            SizeClass::Small => 0,
            SizeClass::Medium => 1,
            SizeClass::Large => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SizeClass::Small => "small",
            SizeClass::Medium => "medium",
            SizeClass::Large => "large",
        }
    }
}

/// One drawn cube.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubeInstance {
    pub placement: Placement,
    pub color: [f32; 4],
}

impl CubeInstance {
    /// Model matrix in field space (before the field rotation and scale).
    pub fn model_matrix(&self) -> Mat4 {
        let t = self.placement.to_transform();
        Mat4::from_scale_rotation_translation(t.scale, t.rotation, t.position)
    }
}

/// Instances of a single size class, capped at `capacity`.
#[derive(Debug, Clone)]
pub struct InstanceGroup {
    class: SizeClass,
    instances: Vec<CubeInstance>,
    capacity: usize,
}

impl InstanceGroup {
    fn new(class: SizeClass, capacity: usize) -> Self {
        Self {
            class,
            instances: Vec::new(),
            capacity,
        }
    }

    pub fn class(&self) -> SizeClass {
        self.class
    }

    pub fn instances(&self) -> &[CubeInstance] {
        &self.instances
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// The cube field scene: instance groups, field orientation, and run totals.
///
/// Owned by the presenter and passed explicitly to whatever renders it.
#[derive(Debug)]
pub struct CubeScene {
    groups: [InstanceGroup; 3],
    rotation: Quat,
    n: usize,
    tests_n: u64,
    dropped: usize,
    rng: ChaCha8Rng,
}

impl CubeScene {
    /// Empty scene holding up to `capacity` cubes per size class.
    pub fn new(capacity: usize) -> Self {
        Self::with_seed(capacity, rand::random())
    }

    /// Same as [`CubeScene::new`] with reproducible colors.
    pub fn with_seed(capacity: usize, seed: u64) -> Self {
        Self {
            groups: SizeClass::ALL.map(|class| InstanceGroup::new(class, capacity)),
            rotation: Quat::IDENTITY,
            n: 0,
            tests_n: 0,
            dropped: 0,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Add placements in order, each with a random color.
    pub fn ingest(&mut self, placements: &[Placement]) {
        for &placement in placements {
            let color: [f32; 4] = [
                self.rng.gen_range(0.1..1.0),
                self.rng.gen_range(0.1..0.9),
                self.rng.gen_range(0.1..0.8),
                1.0,
            ];
            let group = &mut self.groups[SizeClass::of(placement.radius).index()];
            if group.instances.len() >= group.capacity {
                self.dropped += 1;
                tracing::warn!(class = group.class.name(), "instance group full, dropping cube");
                continue;
            }
            group.instances.push(CubeInstance { placement, color });
        }
    }

    /// Record the worker's running totals for display.
    pub fn set_totals(&mut self, n: usize, tests_n: u64) {
        self.n = n;
        self.tests_n = tests_n;
    }

    pub fn set_rotation(&mut self, rotation: Quat) {
        self.rotation = rotation;
    }

    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    /// Rotation and scale applied to every instance.
    pub fn field_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(Vec3::splat(FIELD_SCALE), self.rotation, Vec3::ZERO)
    }

    pub fn groups(&self) -> &[InstanceGroup] {
        &self.groups
    }

    pub fn group(&self, class: SizeClass) -> &InstanceGroup {
        &self.groups[class.index()]
    }

    pub fn instance_count(&self) -> usize {
        self.groups.iter().map(InstanceGroup::len).sum()
    }

    /// Cubes discarded because their group was full.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn tests_n(&self) -> u64 {
        self.tests_n
    }

    /// Two-line HUD text: cube count and sample count.
    pub fn status_text(&self) -> String {
        format!(
            "{} cubes\n{} tests",
            format_count(self.n as u64),
            format_count(self.tests_n)
        )
    }
}

/// Format with comma thousands separators: `1234567` -> `"1,234,567"`.
pub fn format_count(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
