//! Derived metrics
//!
//! Bounding boxes, move counts, path lengths and time estimates, computed
//! from motion events only.

use serde::{Deserialize, Serialize};

use crate::analysis::AnalysisConfig;
use crate::machine::simulator::MotionEvent;
use crate::machine::state::Point3;

/// Floor for any rate used as a divisor
const MIN_RATE_MM_PER_MIN: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisRange {
    pub min: f64,
    pub max: f64,
}

impl AxisRange {
    pub fn point(value: f64) -> Self {
        Self {
            min: value,
            max: value,
        }
    }

    pub fn include(&mut self, value: f64) {
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    pub fn contains(&self, value: f64) -> bool {
        const EPSILON: f64 = 1e-9;
        value >= self.min - EPSILON && value <= self.max + EPSILON
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }
}

/// Axis-aligned box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox3D {
    pub x: AxisRange,
    pub y: AxisRange,
    pub z: AxisRange,
}

impl BoundingBox3D {
    pub fn from_point(point: Point3) -> Self {
        Self {
            x: AxisRange::point(point.x),
            y: AxisRange::point(point.y),
            z: AxisRange::point(point.z),
        }
    }

    /// Stock block with the origin at its top-left corner and Z0 on the top
    /// face: `x:[0,L] y:[0,W] z:[-H,0]`
    pub fn from_stock_dimensions(length: f64, width: f64, height: f64) -> Self {
        Self {
            x: AxisRange {
                min: 0.0,
                max: length,
            },
            y: AxisRange {
                min: 0.0,
                max: width,
            },
            z: AxisRange {
                min: -height,
                max: 0.0,
            },
        }
    }

    pub fn include(&mut self, point: Point3) {
        self.x.include(point.x);
        self.y.include(point.y);
        self.z.include(point.z);
    }

    pub fn axes(&self) -> [(char, AxisRange); 3] {
        [('X', self.x), ('Y', self.y), ('Z', self.z)]
    }

    fn grow(bbox: &mut Option<Self>, point: Point3) {
        match bbox {
            Some(bbox) => bbox.include(point),
            None => *bbox = Some(Self::from_point(point)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MoveCounts {
    pub rapid: u32,
    pub cut: u32,
}

/// Path lengths in millimetres
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Travel {
    pub rapid_mm: f64,
    pub cut_mm: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    /// In program coordinates as written
    pub bbox: Option<BoundingBox3D>,
    pub bbox_mm: Option<BoundingBox3D>,
    pub move_counts: MoveCounts,
    pub travel: Travel,
    pub estimated_time_s: f64,
}

impl Metrics {
    pub fn from_events(events: &[MotionEvent], config: &AnalysisConfig) -> Self {
        let mut bbox = None;
        let mut bbox_mm = None;
        let mut move_counts = MoveCounts::default();
        let mut travel = Travel::default();
        let mut estimated_time_s = 0.0;

        for event in events {
            BoundingBox3D::grow(&mut bbox, event.from);
            BoundingBox3D::grow(&mut bbox, event.to);
            BoundingBox3D::grow(&mut bbox_mm, event.from_mm());
            BoundingBox3D::grow(&mut bbox_mm, event.to_mm());

            let length = event.length_mm();
            if event.rapid {
                move_counts.rapid += 1;
                travel.rapid_mm += length;
            } else {
                move_counts.cut += 1;
                travel.cut_mm += length;
            }

            estimated_time_s += segment_time_s(event, config);
        }

        Self {
            bbox,
            bbox_mm,
            move_counts,
            travel,
            estimated_time_s,
        }
    }
}

/// Time for one segment in seconds
pub fn segment_time_s(event: &MotionEvent, config: &AnalysisConfig) -> f64 {
    let minutes = if event.rapid {
        let rate = config
            .default_rapid_rate_mm_per_min
            .max(MIN_RATE_MM_PER_MIN);
        match config.rapid_z_rate_mm_per_min {
            Some(z_rate) => {
                let dz = (event.to_mm().z - event.from_mm().z).abs();
                event.xy_length_mm() / rate + dz / z_rate.max(MIN_RATE_MM_PER_MIN)
            }
            None => event.length_mm() / rate,
        }
    } else {
        event.length_mm() / cut_rate_mm_per_min(event, config)
    };

    minutes * 60.0
}

/// Feed used for the time estimate of a cut: the programmed feed capped at
/// the machine maximum, or the configured fallback when no usable feed is set
pub fn cut_rate_mm_per_min(event: &MotionEvent, config: &AnalysisConfig) -> f64 {
    let rate = match event.feed_mm_per_min().filter(|feed| *feed > 0.0) {
        Some(feed) => config
            .max_feed_mm_per_min
            .map_or(feed, |max_feed| feed.min(max_feed)),
        None => config.fallback_feed_mm_per_min,
    };
    rate.max(MIN_RATE_MM_PER_MIN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::simulate;
    use crate::machine::state::Units;
    use crate::parser::parse_program;

    fn metrics(text: &str, config: &AnalysisConfig) -> Metrics {
        let trace = simulate(&parse_program(text), config.default_units);
        Metrics::from_events(&trace.events, config)
    }

    #[test]
    fn test_no_events() {
        let result = metrics("G21\nG90\n", &AnalysisConfig::default());

        assert!(result.bbox.is_none());
        assert!(result.bbox_mm.is_none());
        assert_eq!(result.move_counts, MoveCounts::default());
        assert_eq!(result.estimated_time_s, 0.0);
    }

    #[test]
    fn test_bbox_includes_start_point() {
        let result = metrics("G1 X10 Y5 Z-2 F100\n", &AnalysisConfig::default());
        let bbox = result.bbox.unwrap();

        assert_eq!(bbox.x, AxisRange { min: 0.0, max: 10.0 });
        assert_eq!(bbox.y, AxisRange { min: 0.0, max: 5.0 });
        assert_eq!(bbox.z, AxisRange { min: -2.0, max: 0.0 });
    }

    #[test]
    fn test_bbox_mm_converts_inches() {
        let result = metrics("G20\nG0 X1 Y2\n", &AnalysisConfig::default());

        assert_eq!(result.bbox.unwrap().x.max, 1.0);
        let bbox_mm = result.bbox_mm.unwrap();
        assert!((bbox_mm.x.max - 25.4).abs() < 1e-9);
        assert!((bbox_mm.y.max - 50.8).abs() < 1e-9);
    }

    #[test]
    fn test_rapid_time_uses_rapid_rate() {
        let config = AnalysisConfig {
            default_rapid_rate_mm_per_min: 6000.0,
            ..Default::default()
        };
        // 100 mm at 6000 mm/min = 1 s
        let result = metrics("G0 X100\n", &config);
        assert!((result.estimated_time_s - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_rapid_time_with_separate_z_rate() {
        let config = AnalysisConfig {
            default_rapid_rate_mm_per_min: 3000.0,
            rapid_z_rate_mm_per_min: Some(1500.0),
            ..Default::default()
        };
        // 50 mm XY at 3000 = 1 s, 25 mm Z at 1500 = 1 s
        let result = metrics("G0 X30 Y40 Z25\n", &config);
        assert!((result.estimated_time_s - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_cut_time_capped_by_max_feed() {
        let config = AnalysisConfig {
            max_feed_mm_per_min: Some(600.0),
            ..Default::default()
        };
        // Programmed 1200 but capped at 600: 60 mm takes 6 s
        let result = metrics("G1 X60 F1200\n", &config);
        assert!((result.estimated_time_s - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_cut_without_feed_uses_fallback() {
        let config = AnalysisConfig {
            fallback_feed_mm_per_min: 1000.0,
            ..Default::default()
        };
        let result = metrics("G1 X100\n", &config);
        assert!((result.estimated_time_s - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_imperial_feed_converted() {
        let config = AnalysisConfig {
            default_units: Units::Imperial,
            ..Default::default()
        };
        // 10 in at 10 in/min = 1 min
        let result = metrics("G1 X10 F10\n", &config);
        assert!((result.estimated_time_s - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_counts_and_travel() {
        let result = metrics(
            "G0 X10\nG1 X20 F100\nG1 Y10\n",
            &AnalysisConfig::default(),
        );

        assert_eq!(result.move_counts, MoveCounts { rapid: 1, cut: 2 });
        assert!((result.travel.rapid_mm - 10.0).abs() < 1e-9);
        assert!((result.travel.cut_mm - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_stock_dimensions() {
        let stock = BoundingBox3D::from_stock_dimensions(100.0, 60.0, 12.0);

        assert_eq!(stock.x, AxisRange { min: 0.0, max: 100.0 });
        assert_eq!(stock.z, AxisRange { min: -12.0, max: 0.0 });
        assert!(stock.z.contains(-12.0));
        assert!(!stock.z.contains(0.5));
    }
}
