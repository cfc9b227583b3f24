//! Lint rules
//!
//! Every rule is a plain function over an immutable [`Trace`]; no rule sees
//! another rule's output.

use crate::analysis::AnalysisConfig;
use crate::lint::{LintFinding, LintReport};
use crate::machine::{MotionEvent, Spindle, Trace};

pub const UNITS_NOT_SET: &str = "units-not-set";
pub const MODE_NOT_SET: &str = "mode-not-set";
pub const WCS_NOT_SET: &str = "wcs-not-set";
pub const CUT_WITHOUT_FEED: &str = "cut-without-feed";
pub const CUT_WITH_SPINDLE_OFF: &str = "cut-with-spindle-off";
pub const UNSAFE_RAPID: &str = "unsafe-rapid";
pub const OUTSIDE_STOCK: &str = "outside-stock";
pub const FEED_EXCEEDS_MAX: &str = "feed-exceeds-max";
pub const SPINDLE_EXCEEDS_MAX: &str = "spindle-exceeds-max";
pub const WCS_MISMATCH: &str = "wcs-mismatch";
pub const NO_PROGRAM_END: &str = "no-program-end";
pub const CODE_AFTER_PROGRAM_END: &str = "code-after-program-end";

type Rule = fn(&Trace, &AnalysisConfig, &mut LintReport);

const RULES: &[Rule] = &[
    units_not_set,
    mode_not_set,
    wcs_not_set,
    cut_without_feed,
    cut_with_spindle_off,
    unsafe_rapid,
    outside_stock,
    feed_exceeds_max,
    spindle_exceeds_max,
    wcs_mismatch,
    no_program_end,
    code_after_program_end,
];

/// Evaluate every rule over `trace` and return the sorted findings
pub fn run_rules(trace: &Trace, config: &AnalysisConfig) -> Vec<LintFinding> {
    let mut report = LintReport::new();
    for rule in RULES {
        rule(trace, config, &mut report);
    }
    report.into_sorted()
}

fn units_not_set(trace: &Trace, _config: &AnalysisConfig, report: &mut LintReport) {
    if !trace.units_seen {
        report.add_warning(
            UNITS_NOT_SET,
            None,
            format!(
                "No units selected (G20/G21); assuming {}",
                trace.default_units.label()
            ),
        );
    }
}

fn mode_not_set(trace: &Trace, _config: &AnalysisConfig, report: &mut LintReport) {
    let Some(first) = trace.events.first() else {
        return;
    };
    if !trace.mode_seen_before_motion {
        report.add_warning(
            MODE_NOT_SET,
            Some(first.source_line),
            "No positioning mode (G90/G91) selected before the first move; assuming absolute"
                .to_string(),
        );
    }
}

fn wcs_not_set(trace: &Trace, _config: &AnalysisConfig, report: &mut LintReport) {
    let Some(first) = trace.events.first() else {
        return;
    };
    if first.state.wcs.is_none() {
        report.add_warning(
            WCS_NOT_SET,
            Some(first.source_line),
            "No work coordinate system (G54-G59) selected before the first move".to_string(),
        );
    }
}

fn cut_without_feed(trace: &Trace, config: &AnalysisConfig, report: &mut LintReport) {
    let cuts = trace.events.iter().filter(|event| event.is_cut());
    for run in runs(cuts, |event| event.feed_rate.is_none_or(|feed| feed <= 0.0)) {
        report.add_error(
            CUT_WITHOUT_FEED,
            Some(run.first.source_line),
            format!(
                "Cut without a feed rate over {}; time estimated at {} mm/min",
                segments(run.len),
                config.fallback_feed_mm_per_min
            ),
        );
    }
}

fn cut_with_spindle_off(trace: &Trace, _config: &AnalysisConfig, report: &mut LintReport) {
    let cuts = trace.events.iter().filter(|event| event.is_cut());
    for run in runs(cuts, |event| event.state.spindle == Spindle::Off) {
        report.add_error(
            CUT_WITH_SPINDLE_OFF,
            Some(run.first.source_line),
            format!("Cut with the spindle off over {}", segments(run.len)),
        );
    }
}

fn unsafe_rapid(trace: &Trace, config: &AnalysisConfig, report: &mut LintReport) {
    let Some(safe_z) = config.safe_z_mm else {
        return;
    };

    for event in trace.events.iter().filter(|event| event.rapid) {
        let z = event.to_mm().z;
        if z < safe_z && event.moves_in_xy() {
            report.add_warning(
                UNSAFE_RAPID,
                Some(event.source_line),
                format!(
                    "Rapid move in XY at Z{:.3} mm, below safe Z {:.3} mm",
                    z, safe_z
                ),
            );
        }
    }
}

fn outside_stock(trace: &Trace, config: &AnalysisConfig, report: &mut LintReport) {
    let Some(stock) = config.stock_bounds_mm else {
        return;
    };

    for (axis, range) in stock.axes() {
        let first_outside = trace.events.iter().find_map(|event| {
            [event.from_mm(), event.to_mm()]
                .into_iter()
                .map(|point| axis_value(axis, point.axes()))
                .find(|value| !range.contains(*value))
                .map(|value| (event.source_line, value))
        });

        if let Some((line, value)) = first_outside {
            report.add_error(
                OUTSIDE_STOCK,
                Some(line),
                format!(
                    "{} reaches {:.3} mm, outside stock [{:.3}, {:.3}] mm",
                    axis, value, range.min, range.max
                ),
            );
        }
    }
}

fn feed_exceeds_max(trace: &Trace, config: &AnalysisConfig, report: &mut LintReport) {
    let Some(max_feed) = config.max_feed_mm_per_min else {
        return;
    };

    let cuts = trace.events.iter().filter(|event| event.is_cut());
    for run in runs(cuts, |event| {
        event.feed_mm_per_min().is_some_and(|feed| feed > max_feed)
    }) {
        let feed = run.first.feed_mm_per_min().unwrap_or_default();
        report.add_warning(
            FEED_EXCEEDS_MAX,
            Some(run.first.source_line),
            format!(
                "Feed {:.0} mm/min exceeds machine maximum {:.0} mm/min over {}",
                feed,
                max_feed,
                segments(run.len)
            ),
        );
    }
}

fn spindle_exceeds_max(trace: &Trace, config: &AnalysisConfig, report: &mut LintReport) {
    let Some(max_rpm) = config.max_spindle_rpm else {
        return;
    };

    let cuts = trace.events.iter().filter(|event| event.is_cut());
    for run in runs(cuts, |event| {
        event.state.spindle_speed.is_some_and(|rpm| rpm > max_rpm)
    }) {
        let rpm = run.first.state.spindle_speed.unwrap_or_default();
        report.add_warning(
            SPINDLE_EXCEEDS_MAX,
            Some(run.first.source_line),
            format!(
                "Spindle speed S{:.0} exceeds machine maximum {:.0} rpm over {}",
                rpm,
                max_rpm,
                segments(run.len)
            ),
        );
    }
}

fn wcs_mismatch(trace: &Trace, config: &AnalysisConfig, report: &mut LintReport) {
    let Some(expected) = config.expected_wcs else {
        return;
    };

    for run in runs(trace.events.iter(), |event| {
        event.state.wcs.is_some_and(|wcs| wcs != expected)
    }) {
        let actual = run.first.state.wcs.unwrap_or(expected);
        report.add_warning(
            WCS_MISMATCH,
            Some(run.first.source_line),
            format!(
                "Motion in {} but the job expects {} over {}",
                wcs_code(actual),
                wcs_code(expected),
                segments(run.len)
            ),
        );
    }
}

fn no_program_end(trace: &Trace, _config: &AnalysisConfig, report: &mut LintReport) {
    if trace.program_end_line.is_none() {
        report.add_info(
            NO_PROGRAM_END,
            None,
            "Program has no M2/M30 program end".to_string(),
        );
    }
}

fn code_after_program_end(trace: &Trace, _config: &AnalysisConfig, report: &mut LintReport) {
    let (Some(end), Some(first)) = (trace.program_end_line, trace.first_line_after_end) else {
        return;
    };
    report.add_info(
        CODE_AFTER_PROGRAM_END,
        Some(first),
        format!(
            "{} command(s) after the program end on line {} were not simulated",
            trace.commands_after_end, end
        ),
    );
}

/// A maximal stretch of consecutive events for which a rule fires
struct Run<'a> {
    first: &'a MotionEvent,
    len: usize,
}

fn runs<'a>(
    events: impl Iterator<Item = &'a MotionEvent>,
    fires: impl Fn(&MotionEvent) -> bool,
) -> Vec<Run<'a>> {
    let mut runs = Vec::new();
    let mut current: Option<Run<'a>> = None;

    for event in events {
        if fires(event) {
            match current.as_mut() {
                Some(run) => run.len += 1,
                None => current = Some(Run { first: event, len: 1 }),
            }
        } else if let Some(run) = current.take() {
            runs.push(run);
        }
    }
    runs.extend(current);

    runs
}

fn segments(count: usize) -> String {
    if count == 1 {
        "1 segment".to_string()
    } else {
        format!("{} segments", count)
    }
}

fn axis_value(axis: char, [x, y, z]: [f64; 3]) -> f64 {
    match axis {
        'X' => x,
        'Y' => y,
        _ => z,
    }
}

fn wcs_code(index: u8) -> String {
    format!("G{}", 53 + u32::from(index))
}
