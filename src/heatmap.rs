//! Spatial intensity field.
//!
//! Accumulates weighted point observations into a discretized W×H grid and
//! answers normalized intensity and interpolated gradient color at any
//! point. One field per monitored deployment; callers own the value, and
//! there is no module-level instance.

use crate::types::{HeatmapConfig, Observation, Rgba};

/// Normalization ceiling for accumulated cell weight. Cells are clamped to
/// `[0, VALUE_MAX]` after a batch; intensity is `cell / VALUE_MAX`.
pub const VALUE_MAX: f64 = 100.0;

/// Fixed 5-stop rendering gradient: blue → cyan → green → yellow → red.
const GRADIENT: [(f64, [u8; 3]); 5] = [
    (0.0, [0, 0, 255]),
    (0.25, [0, 255, 255]),
    (0.5, [0, 255, 0]),
    (0.75, [255, 255, 0]),
    (1.0, [255, 0, 0]),
];

/// A contributing point: location plus weight in [0, 100].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldPoint {
    pub x: f64,
    pub y: f64,
    pub value: f64,
}

impl From<&Observation> for FieldPoint {
    fn from(obs: &Observation) -> Self {
        FieldPoint {
            x: obs.x,
            y: obs.y,
            value: obs.value,
        }
    }
}

/// Discretized 2D intensity grid, row-major.
///
/// Invariants: every cell stays in `[0, VALUE_MAX]`; a field with no
/// accumulated observations is all-zero; zero-area dimensions are accepted
/// and render as a no-op.
#[derive(Debug, Clone)]
pub struct SpatialField {
    width: u32,
    height: u32,
    cells: Vec<f64>,
    config: HeatmapConfig,
}

impl SpatialField {
    pub fn new(width: u32, height: u32, config: HeatmapConfig) -> Self {
        Self {
            width,
            height,
            cells: vec![0.0; (width as usize) * (height as usize)],
            config,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn config(&self) -> &HeatmapConfig {
        &self.config
    }

    /// Raw cell weights, row-major. Exposed for zone ranking and for
    /// presentation layers that render the grid directly.
    pub fn cells(&self) -> &[f64] {
        &self.cells
    }

    /// Rebind logical dimensions and zero the grid.
    ///
    /// Accumulated weights are tied to the old dimensions, so the caller is
    /// expected to re-accumulate afterwards. Idempotent; zero-area input is
    /// accepted and leaves an empty grid behind.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.cells.clear();
        self.cells
            .resize((width as usize) * (height as usize), 0.0);
    }

    /// Reset the grid to zero, then add a radially decaying contribution for
    /// each point. Overlapping contributions sum; cells are clamped to
    /// `[0, VALUE_MAX]` at the end of the batch.
    ///
    /// Malformed points (non-finite coordinates or weight, weight outside
    /// `[0, 100]`) are dropped with a warning and never abort the batch.
    pub fn accumulate(&mut self, points: &[FieldPoint]) {
        self.cells.fill(0.0);
        if self.cells.is_empty() {
            return;
        }

        let radius = self.config.radius;
        // γ = 1 keeps a linear cone at full blur; lower blur sharpens the
        // falloff while staying continuous (0 at d ≥ r, full value at d = 0).
        let gamma = 1.0 + 2.0 * (1.0 - self.config.blur.clamp(0.0, 1.0));
        let mut dropped = 0usize;

        for point in points {
            if !is_valid_point(point) {
                log::warn!(
                    "dropping invalid observation point (x={}, y={}, value={})",
                    point.x,
                    point.y,
                    point.value
                );
                dropped += 1;
                continue;
            }
            self.splat(point, radius, gamma);
        }

        for cell in &mut self.cells {
            *cell = cell.clamp(0.0, VALUE_MAX);
        }

        if dropped > 0 {
            log::debug!("accumulate dropped {} invalid point(s)", dropped);
        }
    }

    /// Add one point's contribution to every cell within `radius`.
    fn splat(&mut self, point: &FieldPoint, radius: f64, gamma: f64) {
        let col_min = ((point.x - radius).floor().max(0.0)) as u32;
        let row_min = ((point.y - radius).floor().max(0.0)) as u32;
        let col_max = ((point.x + radius).ceil()).min(self.width as f64 - 1.0);
        let row_max = ((point.y + radius).ceil()).min(self.height as f64 - 1.0);
        if col_max < 0.0 || row_max < 0.0 {
            return;
        }
        let (col_max, row_max) = (col_max as u32, row_max as u32);

        for row in row_min..=row_max {
            for col in col_min..=col_max {
                // Distance is measured to the cell center.
                let dx = (col as f64 + 0.5) - point.x;
                let dy = (row as f64 + 0.5) - point.y;
                let dist = (dx * dx + dy * dy).sqrt();
                let t = 1.0 - dist / radius;
                if t <= 0.0 {
                    continue;
                }
                let idx = (row as usize) * (self.width as usize) + col as usize;
                self.cells[idx] += point.value * t.powf(gamma);
            }
        }
    }

    /// Normalized intensity in [0, 1] at a point. Out-of-bounds coordinates
    /// and zero-area grids report 0.
    pub fn intensity_at(&self, x: f64, y: f64) -> f64 {
        if x < 0.0 || y < 0.0 {
            return 0.0;
        }
        let (col, row) = (x as u32, y as u32);
        if col >= self.width || row >= self.height {
            return 0.0;
        }
        let idx = (row as usize) * (self.width as usize) + col as usize;
        self.cells[idx] / VALUE_MAX
    }

    /// Gradient color at a point: blue at zero through red at saturation,
    /// alpha rising from `min_opacity` to `max_opacity` with intensity.
    pub fn query_color(&self, x: f64, y: f64) -> Rgba {
        gradient_color(
            self.intensity_at(x, y),
            self.config.min_opacity,
            self.config.max_opacity,
        )
    }
}

fn is_valid_point(point: &FieldPoint) -> bool {
    point.x.is_finite()
        && point.y.is_finite()
        && point.value.is_finite()
        && (0.0..=VALUE_MAX).contains(&point.value)
}

/// Map a normalized intensity through the fixed 5-stop gradient, linearly
/// interpolating color channels between adjacent stops and alpha between
/// the opacity bounds.
pub fn gradient_color(intensity: f64, min_opacity: f32, max_opacity: f32) -> Rgba {
    let intensity = intensity.clamp(0.0, 1.0);

    let mut lower = GRADIENT[0];
    let mut upper = GRADIENT[GRADIENT.len() - 1];
    for pair in GRADIENT.windows(2) {
        if intensity >= pair[0].0 && intensity <= pair[1].0 {
            lower = pair[0];
            upper = pair[1];
            break;
        }
    }

    let span = upper.0 - lower.0;
    let t = if span > 0.0 {
        (intensity - lower.0) / span
    } else {
        0.0
    };

    let lerp = |a: u8, b: u8| -> u8 { (a as f64 + (b as f64 - a as f64) * t).round() as u8 };

    Rgba {
        r: lerp(lower.1[0], upper.1[0]),
        g: lerp(lower.1[1], upper.1[1]),
        b: lerp(lower.1[2], upper.1[2]),
        a: min_opacity + (max_opacity - min_opacity) * (intensity as f32),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(width: u32, height: u32) -> SpatialField {
        SpatialField::new(width, height, HeatmapConfig::default())
    }

    #[test]
    fn test_empty_accumulate_is_all_zero() {
        let mut f = field(100, 80);
        f.accumulate(&[]);
        assert!(f.cells().iter().all(|&c| c == 0.0));
        let color = f.query_color(50.0, 40.0);
        assert_eq!((color.r, color.g, color.b), (0, 0, 255));
        assert_eq!(color.a, 0.3);
    }

    #[test]
    fn test_single_point_peaks_at_center() {
        let mut f = field(100, 100);
        let p = FieldPoint {
            x: 50.5,
            y: 50.5,
            value: 80.0,
        };
        f.accumulate(&[p]);
        // Cell (50, 50) has its center exactly on the point.
        let peak = f.intensity_at(50.5, 50.5);
        assert!((peak - 0.8).abs() < 1e-9, "peak was {}", peak);
        // Beyond the radius there is no contribution.
        assert_eq!(f.intensity_at(90.0, 90.0), 0.0);
    }

    #[test]
    fn test_falloff_is_monotonic_and_vanishes_at_radius() {
        let mut f = field(120, 40);
        let p = FieldPoint {
            x: 60.5,
            y: 20.5,
            value: 100.0,
        };
        f.accumulate(&[p]);
        let mut last = f64::INFINITY;
        for step in 0..25 {
            let here = f.intensity_at(60.5 + step as f64, 20.5);
            assert!(here <= last, "intensity rose at distance {}", step);
            last = here;
        }
        // d = 25 is exactly the radius.
        assert_eq!(f.intensity_at(60.5 + 25.0, 20.5), 0.0);
    }

    #[test]
    fn test_overlapping_contributions_accumulate_monotonically() {
        let points = vec![
            FieldPoint { x: 30.0, y: 30.0, value: 40.0 },
            FieldPoint { x: 33.0, y: 31.0, value: 35.0 },
            FieldPoint { x: 28.0, y: 29.0, value: 20.0 },
        ];
        let mut full = field(64, 64);
        full.accumulate(&points);

        for point in &points {
            let mut solo = field(64, 64);
            solo.accumulate(&[*point]);
            let combined = full.intensity_at(point.x, point.y);
            let alone = solo.intensity_at(point.x, point.y);
            assert!(
                combined >= alone,
                "combined {} < solo {} at ({}, {})",
                combined,
                alone,
                point.x,
                point.y
            );
        }
    }

    #[test]
    fn test_cells_clamped_to_value_max() {
        let mut f = field(32, 32);
        let stack: Vec<FieldPoint> = (0..5)
            .map(|_| FieldPoint { x: 16.5, y: 16.5, value: 100.0 })
            .collect();
        f.accumulate(&stack);
        assert!(f.cells().iter().all(|&c| c <= VALUE_MAX));
        assert_eq!(f.intensity_at(16.5, 16.5), 1.0);
        let color = f.query_color(16.5, 16.5);
        assert_eq!((color.r, color.g, color.b), (255, 0, 0));
        assert!((color.a - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_malformed_points_dropped_without_aborting_batch() {
        let points = vec![
            FieldPoint { x: f64::NAN, y: 10.0, value: 50.0 },
            FieldPoint { x: 10.0, y: f64::INFINITY, value: 50.0 },
            FieldPoint { x: 10.0, y: 10.0, value: -1.0 },
            FieldPoint { x: 10.0, y: 10.0, value: 101.0 },
            FieldPoint { x: 20.5, y: 20.5, value: 60.0 },
        ];
        let mut f = field(40, 40);
        f.accumulate(&points);
        // Only the last point survives.
        assert!((f.intensity_at(20.5, 20.5) - 0.6).abs() < 1e-9);
        assert_eq!(f.intensity_at(10.0, 10.0), 0.0);
    }

    #[test]
    fn test_resize_then_reaccumulate_is_stable() {
        let points = vec![
            FieldPoint { x: 12.0, y: 8.0, value: 70.0 },
            FieldPoint { x: 40.0, y: 22.0, value: 55.0 },
        ];
        let mut f = field(60, 30);
        f.accumulate(&points);
        let first = f.cells().to_vec();

        f.resize(60, 30);
        f.accumulate(&points);
        assert_eq!(f.cells(), first.as_slice());
    }

    #[test]
    fn test_zero_area_resize_is_a_noop_render() {
        let mut f = field(60, 30);
        f.resize(0, 30);
        let p = FieldPoint { x: 5.0, y: 5.0, value: 90.0 };
        f.accumulate(&[p]);
        assert_eq!(f.intensity_at(5.0, 5.0), 0.0);
        let color = f.query_color(5.0, 5.0);
        assert_eq!((color.r, color.g, color.b), (0, 0, 255));
    }

    #[test]
    fn test_gradient_hits_declared_stops() {
        let cases = [
            (0.0, (0, 0, 255)),
            (0.25, (0, 255, 255)),
            (0.5, (0, 255, 0)),
            (0.75, (255, 255, 0)),
            (1.0, (255, 0, 0)),
        ];
        for (intensity, (r, g, b)) in cases {
            let c = gradient_color(intensity, 0.3, 0.8);
            assert_eq!((c.r, c.g, c.b), (r, g, b), "at intensity {}", intensity);
        }
    }

    #[test]
    fn test_gradient_interpolates_between_stops() {
        // Halfway between blue and cyan.
        let c = gradient_color(0.125, 0.3, 0.8);
        assert_eq!(c.r, 0);
        assert_eq!(c.g, 128);
        assert_eq!(c.b, 255);
        assert!((c.a - 0.3625).abs() < 1e-6);
    }

    #[test]
    fn test_gradient_alpha_spans_opacity_bounds() {
        assert_eq!(gradient_color(0.0, 0.3, 0.8).a, 0.3);
        assert!((gradient_color(1.0, 0.3, 0.8).a - 0.8).abs() < 1e-6);
    }
}
