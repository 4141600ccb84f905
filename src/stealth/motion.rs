//! Mouse path generation
//!
//! Turns a start/end pair into a Bezier-shaped point sequence carrying
//! advisory velocity and pacing for each point. Generation never sleeps.

use std::time::Duration;

use bezier_rs::{Bezier, TValue};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::traits::{MouseMotionConfig, Point2D};
use crate::Result;

/// Per-axis spread of the randomized control points
pub const CONTROL_POINT_SPREAD: f64 = 50.0;
/// Per-axis spread of the overshoot point around the target
pub const OVERSHOOT_SPREAD: f64 = 5.0;
/// Per-axis spread of micro-correction points around the target
pub const CORRECTION_SPREAD: f64 = 2.0;

/// Curve samples are `n + 1` points with `n` drawn from this range
const SEGMENTS: std::ops::Range<usize> = 20..30;

const BASE_VELOCITY: f64 = 2.0;
const CRUISE_FACTOR: f64 = 2.5;
const EASE_FRACTION: f64 = 0.2;

/// Pixels covered by one dispatcher step
const PIXELS_PER_STEP: f64 = 10.0;

const OVERSHOOT_DWELL: Duration = Duration::from_millis(20);
const CORRECTION_DWELL: Duration = Duration::from_millis(10);

/// Role of a point within a motion path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointKind {
    /// On the curve between start and end
    Nominal,
    /// Past the target
    Overshoot,
    /// Small adjustment near the target
    Correction,
    /// Final return onto the target after overshoot or corrections
    Settle,
}

/// One point of a motion path with its pacing metadata
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathPoint {
    pub position: Point2D,
    /// Advisory speed scalar from the velocity profile
    pub velocity: f64,
    /// Interpolation steps the dispatcher should use to reach this point
    pub steps: u32,
    /// Pause after reaching this point
    pub dwell: Duration,
    pub kind: PointKind,
}

impl PathPoint {
    fn settled(position: Point2D, kind: PointKind, dwell: Duration) -> Self {
        Self {
            position,
            velocity: 1.0,
            steps: 1,
            dwell,
            kind,
        }
    }
}

/// Ordered point sequence for a single pointer movement
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MotionPath {
    points: Vec<PathPoint>,
}

impl MotionPath {
    pub fn points(&self) -> &[PathPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&PathPoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&PathPoint> {
        self.points.last()
    }

    /// Last point that lies on the nominal curve
    pub fn nominal_end(&self) -> Option<&PathPoint> {
        self.points.iter().rev().find(|p| p.kind == PointKind::Nominal)
    }

    pub fn positions(&self) -> impl Iterator<Item = Point2D> + '_ {
        self.points.iter().map(|p| p.position)
    }

    /// Sum of all dwell times
    pub fn total_dwell(&self) -> Duration {
        self.points.iter().map(|p| p.dwell).sum()
    }

    pub fn into_points(self) -> Vec<PathPoint> {
        self.points
    }
}

/// Evaluate the cubic Bezier defined by `p0..p3` at parameter `t`
pub fn cubic_bezier(t: f64, p0: Point2D, p1: Point2D, p2: Point2D, p3: Point2D) -> Point2D {
    let curve = Bezier::from_cubic_coordinates(p0.x, p0.y, p1.x, p1.y, p2.x, p2.y, p3.x, p3.y);
    evaluate(&curve, t)
}

fn evaluate(curve: &Bezier, t: f64) -> Point2D {
    let point = curve.evaluate(TValue::Parametric(t));
    Point2D::new(point.x, point.y)
}

/// Three-phase velocity profile: ease-in, cruise, ease-out, each perturbed
/// by a uniform factor in `1 ± variance`.
pub fn velocity_at<R: Rng + ?Sized>(progress: f64, variance: f64, rng: &mut R) -> f64 {
    let shape = if progress < EASE_FRACTION {
        1.0 + progress * 2.0
    } else if progress > 1.0 - EASE_FRACTION {
        1.0 + (1.0 - progress) * 2.0
    } else {
        CRUISE_FACTOR
    };

    let perturbation = if variance > 0.0 {
        1.0 + rng.gen_range(-variance..variance)
    } else {
        1.0
    };

    BASE_VELOCITY * shape * perturbation
}

fn jitter<R: Rng + ?Sized>(rng: &mut R, spread: f64) -> f64 {
    rng.gen_range(-spread..=spread)
}

/// Generate a motion path from `start` to `end`.
///
/// Pure given its inputs and the random source.
pub fn generate_path<R: Rng + ?Sized>(
    start: Point2D,
    end: Point2D,
    config: &MouseMotionConfig,
    rng: &mut R,
) -> MotionPath {
    if start == end {
        return MotionPath {
            points: vec![PathPoint::settled(start, PointKind::Nominal, Duration::ZERO)],
        };
    }

    if !config.enabled || !config.use_curve {
        return MotionPath {
            points: vec![
                PathPoint::settled(start, PointKind::Nominal, Duration::ZERO),
                PathPoint::settled(end, PointKind::Nominal, Duration::ZERO),
            ],
        };
    }

    let segments = rng.gen_range(SEGMENTS);

    let control1 = start
        .lerp(&end, 0.3)
        .offset(jitter(rng, CONTROL_POINT_SPREAD), jitter(rng, CONTROL_POINT_SPREAD));
    let control2 = start
        .lerp(&end, 0.7)
        .offset(jitter(rng, CONTROL_POINT_SPREAD), jitter(rng, CONTROL_POINT_SPREAD));
    let curve = Bezier::from_cubic_coordinates(
        start.x, start.y, control1.x, control1.y, control2.x, control2.y, end.x, end.y,
    );

    let total = segments + 1;
    let mut points = Vec::with_capacity(total + 4);
    let mut previous = start;

    for i in 0..total {
        let position = match i {
            0 => start,
            i if i == segments => end,
            i => evaluate(&curve, i as f64 / segments as f64),
        };

        let steps = if i == 0 {
            1
        } else {
            ((previous.distance(&position) / PIXELS_PER_STEP) as u32).max(1)
        };
        let velocity = velocity_at(i as f64 / total as f64, config.velocity_variance, rng);
        let dwell = Duration::from_secs_f64(steps as f64 / velocity * PIXELS_PER_STEP / 1000.0);

        points.push(PathPoint {
            position,
            velocity,
            steps,
            dwell,
            kind: PointKind::Nominal,
        });
        previous = position;
    }

    let mut embellished = false;

    if config.allow_overshoot {
        let overshoot = end.offset(jitter(rng, OVERSHOOT_SPREAD), jitter(rng, OVERSHOOT_SPREAD));
        points.push(PathPoint::settled(overshoot, PointKind::Overshoot, OVERSHOOT_DWELL));
        embellished = true;
    }

    if config.allow_micro_corrections {
        let corrections = rng.gen_range(1..=2);
        for _ in 0..corrections {
            let correction =
                end.offset(jitter(rng, CORRECTION_SPREAD), jitter(rng, CORRECTION_SPREAD));
            points.push(PathPoint::settled(correction, PointKind::Correction, CORRECTION_DWELL));
        }
        embellished = true;
    }

    if embellished {
        points.push(PathPoint::settled(end, PointKind::Settle, Duration::ZERO));
    }

    MotionPath { points }
}

/// Path generator owning its configuration and random source
#[derive(Debug, Clone)]
pub struct PathGenerator {
    config: MouseMotionConfig,
    rng: StdRng,
}

impl PathGenerator {
    pub fn new(config: MouseMotionConfig) -> Result<Self> {
        Self::with_rng(config, StdRng::from_entropy())
    }

    pub fn with_seed(config: MouseMotionConfig, seed: u64) -> Result<Self> {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(config: MouseMotionConfig, rng: StdRng) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, rng })
    }

    pub fn config(&self) -> &MouseMotionConfig {
        &self.config
    }

    pub fn generate(&mut self, start: Point2D, end: Point2D) -> MotionPath {
        let path = generate_path(start, end, &self.config, &mut self.rng);
        tracing::trace!(points = path.len(), "generated motion path");
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn curved_only() -> MouseMotionConfig {
        MouseMotionConfig {
            allow_overshoot: false,
            allow_micro_corrections: false,
            ..Default::default()
        }
    }

    #[test]
    fn test_cubic_bezier_endpoints_and_midpoint() {
        let p0 = Point2D::new(0.0, 0.0);
        let p1 = Point2D::new(33.0, 33.0);
        let p2 = Point2D::new(66.0, 66.0);
        let p3 = Point2D::new(100.0, 100.0);

        let at_start = cubic_bezier(0.0, p0, p1, p2, p3);
        assert!(at_start.distance(&p0) < 1e-9);

        let at_end = cubic_bezier(1.0, p0, p1, p2, p3);
        assert!(at_end.distance(&p3) < 1e-9);

        // 0.375 * 33 + 0.375 * 66 + 0.125 * 100
        let mid = cubic_bezier(0.5, p0, p1, p2, p3);
        assert!((mid.x - 49.625).abs() < 1e-6, "mid.x {}", mid.x);
        assert!((mid.y - 49.625).abs() < 1e-6, "mid.y {}", mid.y);
    }

    #[test]
    fn test_cubic_bezier_evenly_spaced_controls_is_linear() {
        let p0 = Point2D::new(0.0, 0.0);
        let p1 = Point2D::new(100.0 / 3.0, 100.0 / 3.0);
        let p2 = Point2D::new(200.0 / 3.0, 200.0 / 3.0);
        let p3 = Point2D::new(100.0, 100.0);

        let mid = cubic_bezier(0.5, p0, p1, p2, p3);
        assert!(mid.distance(&Point2D::new(50.0, 50.0)) < 1e-6);

        let quarter = cubic_bezier(0.25, p0, p1, p2, p3);
        assert!(quarter.distance(&Point2D::new(25.0, 25.0)) < 1e-6);
    }

    #[test]
    fn test_curved_path_shape() {
        let mut rng = StdRng::seed_from_u64(11);
        let start = Point2D::new(0.0, 0.0);
        let end = Point2D::new(100.0, 100.0);

        for _ in 0..50 {
            let path = generate_path(start, end, &curved_only(), &mut rng);
            assert!(path.len() >= 21 && path.len() <= 30, "len {}", path.len());
            assert_eq!(path.first().unwrap().position, start);
            assert_eq!(path.last().unwrap().position, end);

            let positions: Vec<Point2D> = path.positions().collect();
            for pair in positions.windows(2) {
                assert!(pair[0].distance(&pair[1]) < 50.0);
            }
        }
    }

    #[test]
    fn test_direct_path() {
        let mut rng = StdRng::seed_from_u64(3);
        let config = MouseMotionConfig {
            use_curve: false,
            ..Default::default()
        };
        let path = generate_path(Point2D::new(5.0, 5.0), Point2D::new(300.0, 40.0), &config, &mut rng);
        let positions: Vec<Point2D> = path.positions().collect();
        assert_eq!(positions, vec![Point2D::new(5.0, 5.0), Point2D::new(300.0, 40.0)]);
    }

    #[test]
    fn test_disabled_motion_is_direct() {
        let mut rng = StdRng::seed_from_u64(3);
        let config = MouseMotionConfig {
            enabled: false,
            ..Default::default()
        };
        let path = generate_path(Point2D::new(0.0, 0.0), Point2D::new(10.0, 10.0), &config, &mut rng);
        assert_eq!(path.len(), 2);
    }

    #[test]
    fn test_same_start_and_end() {
        let mut rng = StdRng::seed_from_u64(5);
        let p = Point2D::new(42.0, 24.0);
        let path = generate_path(p, p, &MouseMotionConfig::default(), &mut rng);
        assert_eq!(path.len(), 1);
        assert_eq!(path.first().unwrap().position, p);
    }

    #[test]
    fn test_overshoot_and_corrections() {
        let mut rng = StdRng::seed_from_u64(21);
        let end = Point2D::new(400.0, 250.0);

        for _ in 0..30 {
            let path = generate_path(Point2D::new(10.0, 10.0), end, &MouseMotionConfig::default(), &mut rng);

            let nominal_end = path.nominal_end().unwrap();
            assert!(nominal_end.position.distance(&end) < 1e-6);
            assert_eq!(path.last().unwrap().position, end);
            assert_eq!(path.last().unwrap().kind, PointKind::Settle);

            let overshoots: Vec<_> = path.points().iter().filter(|p| p.kind == PointKind::Overshoot).collect();
            assert_eq!(overshoots.len(), 1);
            assert!((overshoots[0].position.x - end.x).abs() <= OVERSHOOT_SPREAD);
            assert!((overshoots[0].position.y - end.y).abs() <= OVERSHOOT_SPREAD);

            let corrections: Vec<_> = path.points().iter().filter(|p| p.kind == PointKind::Correction).collect();
            assert!((1..=2).contains(&corrections.len()));
            for c in corrections {
                assert!((c.position.x - end.x).abs() <= CORRECTION_SPREAD);
                assert!((c.position.y - end.y).abs() <= CORRECTION_SPREAD);
            }
        }
    }

    #[test]
    fn test_velocity_profile_phases() {
        let mut rng = StdRng::seed_from_u64(9);
        // Without variance the profile is deterministic
        assert!((velocity_at(0.0, 0.0, &mut rng) - 2.0).abs() < 1e-9);
        assert!((velocity_at(0.5, 0.0, &mut rng) - 5.0).abs() < 1e-9);
        assert!((velocity_at(0.95, 0.0, &mut rng) - 2.2).abs() < 1e-9);

        for _ in 0..100 {
            let v = velocity_at(0.5, 0.3, &mut rng);
            assert!(v >= 5.0 * 0.7 && v <= 5.0 * 1.3);
        }
    }

    #[test]
    fn test_pacing_metadata() {
        let mut rng = StdRng::seed_from_u64(17);
        let path = generate_path(Point2D::new(0.0, 0.0), Point2D::new(800.0, 600.0), &curved_only(), &mut rng);
        for point in path.points() {
            assert!(point.steps >= 1);
            assert!(point.velocity > 0.0);
        }
        assert!(path.total_dwell() > Duration::ZERO);
    }

    #[test]
    fn test_generator_is_reproducible() {
        let start = Point2D::new(12.0, 80.0);
        let end = Point2D::new(640.0, 360.0);
        let mut a = PathGenerator::with_seed(MouseMotionConfig::default(), 99).unwrap();
        let mut b = PathGenerator::with_seed(MouseMotionConfig::default(), 99).unwrap();
        assert_eq!(a.generate(start, end), b.generate(start, end));
    }

    #[test]
    fn test_generator_rejects_bad_variance() {
        let config = MouseMotionConfig {
            velocity_variance: 1.5,
            ..Default::default()
        };
        assert!(PathGenerator::new(config).is_err());
    }
}
