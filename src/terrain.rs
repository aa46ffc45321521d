//! Terrain height field and corn-field cover registry.
//!
//! The terrain is a closed-form function of (x, z): layered sinusoids plus a
//! deterministic jitter, never stored as a grid and never mutated. Corn
//! fields are axis-aligned rectangles that provide bird cover and bias
//! spawn and search waypoints.

use bevy_ecs::prelude::*;
use rand::Rng;

const MAX_HEIGHT: f32 = 3.0;
const NOISE_SCALE: f32 = 0.08;
const OCTAVES: u32 = 3;
const PERSISTENCE: f32 = 0.6;
const LACUNARITY: f32 = 2.0;
const JITTER_AMPLITUDE: f32 = 0.15;

const CORN_FIELD_COUNT: usize = 3;
const CORN_FIELD_WIDTH: f32 = 30.0;
const CORN_FIELD_DEPTH: f32 = 60.0;
const CORN_RING_INNER: f32 = 60.0;
const CORN_RING_OUTER: f32 = 90.0;

/// Resource wrapper for the immutable height field.
///
/// The field is closed-form and read-only, so it needs no interior
/// mutability; systems take `Res<Terrain>` and query heights directly.
#[derive(Resource, Clone)]
pub struct Terrain(pub HeightField);

impl Terrain {
    pub fn height_at(&self, x: f32, z: f32) -> f32 {
        self.0.height_at(x, z)
    }

    pub fn in_corn_field(&self, x: f32, z: f32) -> bool {
        self.0.in_corn_field(x, z)
    }
}

/// An axis-aligned rectangular corn field.
#[derive(Debug, Clone, Copy)]
pub struct CornField {
    pub min_x: f32,
    pub max_x: f32,
    pub min_z: f32,
    pub max_z: f32,
}

impl CornField {
    pub fn centered(cx: f32, cz: f32, width: f32, depth: f32) -> Self {
        Self {
            min_x: cx - width / 2.0,
            max_x: cx + width / 2.0,
            min_z: cz - depth / 2.0,
            max_z: cz + depth / 2.0,
        }
    }

    pub fn contains(&self, x: f32, z: f32) -> bool {
        x >= self.min_x && x <= self.max_x && z >= self.min_z && z <= self.max_z
    }

    pub fn random_point<R: Rng>(&self, rng: &mut R) -> (f32, f32) {
        (
            rng.gen_range(self.min_x..self.max_x),
            rng.gen_range(self.min_z..self.max_z),
        )
    }
}

/// Closed-form terrain height function plus the corn-field registry.
#[derive(Clone)]
pub struct HeightField {
    corn_fields: Vec<CornField>,
}

impl HeightField {
    /// Build the field with corn fields placed on a ring around the origin.
    /// Placement is derived from `seed` so a given seed always yields the
    /// same layout.
    pub fn new(seed: u64) -> Self {
        let mut corn_fields = Vec::with_capacity(CORN_FIELD_COUNT);
        for i in 0..CORN_FIELD_COUNT {
            // Spread fields around the ring with a seeded angular offset.
            let base = i as f32 / CORN_FIELD_COUNT as f32 * std::f32::consts::TAU;
            let offset = hash01(seed as f32 + i as f32 * 17.3, seed as f32 * 0.37) * 0.8;
            let angle = base + offset;
            let radius = CORN_RING_INNER
                + hash01(seed as f32 * 1.7 + i as f32, i as f32 * 91.7)
                    * (CORN_RING_OUTER - CORN_RING_INNER);
            let cx = angle.cos() * radius;
            let cz = angle.sin() * radius;
            corn_fields.push(CornField::centered(
                cx,
                cz,
                CORN_FIELD_WIDTH,
                CORN_FIELD_DEPTH,
            ));
        }
        Self { corn_fields }
    }

    /// Terrain height at (x, z). Pure function of its arguments:
    /// octave noise, large rolling terms, a radial basin, and a small
    /// position-keyed jitter, clamped to a non-negative floor.
    pub fn height_at(&self, x: f32, z: f32) -> f32 {
        let mut height = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = NOISE_SCALE;
        for _ in 0..OCTAVES {
            height += (x * frequency).sin() * (z * frequency).cos() * amplitude;
            amplitude *= PERSISTENCE;
            frequency *= LACUNARITY;
        }
        height *= MAX_HEIGHT / 2.0;

        // Broad rolling hills.
        height += (x * 0.02).sin() * (z * 0.02).cos() * 2.0;
        height += (x * 0.026).sin() * (z * 0.014).cos() * 1.5;
        // Medium undulation.
        height += (x * 0.05).sin() * (z * 0.05).cos() * 1.0;
        // Shallow basin rising away from the origin.
        height += ((x * x + z * z).sqrt() * 0.01).min(2.0);
        // Position-keyed jitter stands in for per-vertex randomness.
        height += (hash01(x, z) - 0.5) * 2.0 * JITTER_AMPLITUDE;

        height.max(0.0)
    }

    pub fn corn_fields(&self) -> &[CornField] {
        &self.corn_fields
    }

    pub fn in_corn_field(&self, x: f32, z: f32) -> bool {
        self.corn_fields.iter().any(|f| f.contains(x, z))
    }

    /// Pick a random point inside a random corn field. Returns the full
    /// position with y resting just above the terrain.
    pub fn random_corn_field_point<R: Rng>(&self, rng: &mut R, perch: f32) -> Option<(f32, f32, f32)> {
        if self.corn_fields.is_empty() {
            return None;
        }
        let field = &self.corn_fields[rng.gen_range(0..self.corn_fields.len())];
        let (x, z) = field.random_point(rng);
        Some((x, self.height_at(x, z) + perch, z))
    }
}

/// Deterministic pseudo-random value in [0, 1) keyed by two floats.
#[inline]
fn hash01(x: f32, z: f32) -> f32 {
    let h = (x * 12.9898 + z * 78.233).sin() * 43758.5453;
    h.fract().abs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_height_is_deterministic() {
        let field = HeightField::new(42);
        for &(x, z) in &[(0.0, 0.0), (13.7, -42.1), (-80.0, 80.0), (100.0, -100.0)] {
            assert_eq!(field.height_at(x, z), field.height_at(x, z));
        }
    }

    #[test]
    fn test_height_never_below_floor() {
        let field = HeightField::new(7);
        let mut x = -100.0;
        while x <= 100.0 {
            let mut z = -100.0;
            while z <= 100.0 {
                assert!(field.height_at(x, z) >= 0.0, "height dipped below 0 at ({x}, {z})");
                z += 7.3;
            }
            x += 7.3;
        }
    }

    #[test]
    fn test_same_seed_same_corn_fields() {
        let a = HeightField::new(99);
        let b = HeightField::new(99);
        assert_eq!(a.corn_fields().len(), b.corn_fields().len());
        for (fa, fb) in a.corn_fields().iter().zip(b.corn_fields()) {
            assert_eq!(fa.min_x, fb.min_x);
            assert_eq!(fa.min_z, fb.min_z);
        }
    }

    #[test]
    fn test_corn_fields_on_ring() {
        let field = HeightField::new(3);
        assert_eq!(field.corn_fields().len(), 3);
        for f in field.corn_fields() {
            let cx = (f.min_x + f.max_x) / 2.0;
            let cz = (f.min_z + f.max_z) / 2.0;
            let dist = (cx * cx + cz * cz).sqrt();
            assert!(dist >= 59.0 && dist <= 91.0, "field center off ring: {dist}");
        }
    }

    #[test]
    fn test_corn_field_membership() {
        let field = CornField::centered(0.0, 0.0, 30.0, 60.0);
        assert!(field.contains(0.0, 0.0));
        assert!(field.contains(14.9, -29.9));
        assert!(!field.contains(15.1, 0.0));
        assert!(!field.contains(0.0, 30.1));
    }

    #[test]
    fn test_random_corn_point_inside_a_field() {
        let field = HeightField::new(5);
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..50 {
            let (x, y, z) = field.random_corn_field_point(&mut rng, 0.3).unwrap();
            assert!(field.in_corn_field(x, z));
            assert!((y - (field.height_at(x, z) + 0.3)).abs() < 1e-5);
        }
    }
}
