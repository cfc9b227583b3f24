//! Toolpath previews
//!
//! The plan view drops Z from each motion event and stays in program
//! coordinates. The 3D view keeps every axis, converted to millimetres.

use std::iter::FusedIterator;

use serde::Serialize;

use crate::machine::{MotionEvent, Point3};

/// One plan-view segment, in program coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Segment2D {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
    pub rapid: bool,
    pub line: u32,
}

impl From<&MotionEvent> for Segment2D {
    fn from(event: &MotionEvent) -> Self {
        Self {
            x0: event.from.x,
            y0: event.from.y,
            x1: event.to.x,
            y1: event.to.y,
            rapid: event.rapid,
            line: event.source_line,
        }
    }
}

/// One 3D preview segment in millimetres
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Segment3D {
    pub from: Point3,
    pub to: Point3,
    pub rapid: bool,
    pub line: u32,
}

impl From<&MotionEvent> for Segment3D {
    fn from(event: &MotionEvent) -> Self {
        Self {
            from: event.from_mm(),
            to: event.to_mm(),
            rapid: event.rapid,
            line: event.source_line,
        }
    }
}

/// Lazy projection over a slice of events. Clone it to restart.
#[derive(Debug, Clone)]
pub struct Projection<'a> {
    events: std::slice::Iter<'a, MotionEvent>,
}

impl Iterator for Projection<'_> {
    type Item = Segment2D;

    fn next(&mut self) -> Option<Self::Item> {
        self.events.next().map(Segment2D::from)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.events.size_hint()
    }
}

impl DoubleEndedIterator for Projection<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.events.next_back().map(Segment2D::from)
    }
}

impl ExactSizeIterator for Projection<'_> {}

impl FusedIterator for Projection<'_> {}

/// Project events to 2D segments, one per event, in order
pub fn project(events: &[MotionEvent]) -> Projection<'_> {
    Projection {
        events: events.iter(),
    }
}

/// 3D segments in millimetres, one per event, in order
pub fn segments_mm(
    events: &[MotionEvent],
) -> impl ExactSizeIterator<Item = Segment3D> + Clone + '_ {
    events.iter().map(Segment3D::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::{simulate, Units};
    use crate::parser::parse_program;

    #[test]
    fn test_one_segment_per_event() {
        let trace = simulate(
            &parse_program("G0 X5 Y5 Z5\nG1 Z-1 F100\nG1 X10\n"),
            Units::Metric,
        );
        let segments: Vec<_> = project(&trace.events).collect();

        assert_eq!(segments.len(), trace.events.len());
        assert_eq!(
            segments[0],
            Segment2D {
                x0: 0.0,
                y0: 0.0,
                x1: 5.0,
                y1: 5.0,
                rapid: true,
                line: 1,
            }
        );
        // Pure Z plunge collapses to a point
        assert_eq!((segments[1].x0, segments[1].y0), (segments[1].x1, segments[1].y1));
        assert!(!segments[2].rapid);
    }

    #[test]
    fn test_restartable_and_exact_size() {
        let trace = simulate(&parse_program("G0 X1\nG0 X2\nG0 X3\n"), Units::Metric);
        let projection = project(&trace.events);

        assert_eq!(projection.len(), 3);
        let first: Vec<_> = projection.clone().collect();
        let second: Vec<_> = projection.collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_reverse() {
        let trace = simulate(&parse_program("G0 X1\nG0 X2\n"), Units::Metric);
        let last = project(&trace.events).next_back().unwrap();
        assert_eq!(last.x1, 2.0);
    }

    #[test]
    fn test_empty() {
        assert_eq!(project(&[]).len(), 0);
        assert_eq!(segments_mm(&[]).len(), 0);
    }

    #[test]
    fn test_3d_segments_in_mm() {
        let trace = simulate(
            &parse_program("G20 G90\nG0 X1 Y2\nG1 Z-0.5 F10\n"),
            Units::Metric,
        );
        let segments: Vec<_> = segments_mm(&trace.events).collect();

        assert_eq!(segments.len(), project(&trace.events).len());
        assert_eq!(segments[0].from, Point3::new(0.0, 0.0, 0.0));
        assert_eq!(segments[0].to, Point3::new(25.4, 50.8, 0.0));
        assert!(segments[0].rapid);
        assert_eq!(segments[1].to.z, -12.7);
        assert_eq!(segments[1].line, 3);
    }
}
