//! Command classifier
//!
//! Maps the words of one line to commands. Codes outside the supported
//! set are kept as [`Command::Unknown`] and never rejected: controllers
//! accept plenty of vendor codes this engine has no reason to understand.

use crate::parser::ast::{Command, PartialPosition};
use crate::parser::lexer::{Lexeme, Word};

/// Supported codes and their descriptions
pub const SUPPORTED_CODES: &[(&str, &str)] = &[
    ("G0", "Rapid positioning"),
    ("G1", "Linear cut at the programmed feed rate"),
    ("G20", "Units: inches"),
    ("G21", "Units: millimetres"),
    ("G54", "Select work coordinate system 1"),
    ("G55", "Select work coordinate system 2"),
    ("G56", "Select work coordinate system 3"),
    ("G57", "Select work coordinate system 4"),
    ("G58", "Select work coordinate system 5"),
    ("G59", "Select work coordinate system 6"),
    ("G90", "Absolute positioning"),
    ("G91", "Incremental positioning"),
    ("M2", "Program end"),
    ("M3", "Spindle on, clockwise"),
    ("M4", "Spindle on, counter-clockwise"),
    ("M5", "Spindle stop"),
    ("M30", "Program end and rewind"),
];

/// Describe a supported code. Accepts any spelling the lexer accepts
/// (`g00`, `G0`, `M03`).
pub fn describe_code(code: &str) -> Option<&'static str> {
    let canonical = canonical_code(code)?;
    SUPPORTED_CODES
        .iter()
        .find(|(name, _)| *name == canonical)
        .map(|(_, description)| *description)
}

/// Normalize a single G/M word to its canonical spelling (`G01` -> `G1`)
pub fn canonical_code(code: &str) -> Option<String> {
    match crate::parser::lexer::tokenize_line(code).as_slice() {
        [Lexeme::Word(Word { letter, value })] if matches!(*letter, 'G' | 'M') => {
            Some(format_code(*letter, *value))
        }
        _ => None,
    }
}

/// Classify the lexemes of one line into commands, in execution order
pub fn classify(lexemes: &[Lexeme]) -> Vec<Command> {
    let mut line = LineWords::default();

    for lexeme in lexemes {
        match lexeme {
            Lexeme::Word(word) => line.absorb(*word),
            Lexeme::Unknown(text) => line.unknown.push(text.clone()),
        }
    }

    line.into_commands()
}

/// Words of one line, grouped by what they control
#[derive(Debug, Default)]
struct LineWords {
    feed: Option<f64>,
    spindle_speed: Option<f64>,
    spindle: Option<Command>,
    metric: Option<bool>,
    wcs: Option<u8>,
    absolute: Option<bool>,
    rapid: Option<bool>,
    target: PartialPosition,
    program_end: bool,
    unknown: Vec<String>,
}

impl LineWords {
    fn absorb(&mut self, word: Word) {
        match word.letter {
            'G' => self.absorb_g(word.value),
            'M' => self.absorb_m(word.value),
            'F' => self.feed = Some(word.value),
            'S' => self.spindle_speed = Some(word.value),
            'X' => self.target.x = Some(word.value),
            'Y' => self.target.y = Some(word.value),
            'Z' => self.target.z = Some(word.value),
            // N, T, P, ... are not codes
            _ => {}
        }
    }

    fn absorb_g(&mut self, value: f64) {
        match code_number(value) {
            Some(0) => self.rapid = Some(true),
            Some(1) => self.rapid = Some(false),
            Some(20) => self.metric = Some(false),
            Some(21) => self.metric = Some(true),
            Some(n @ 54..=59) => self.wcs = Some((n - 53) as u8),
            Some(90) => self.absolute = Some(true),
            Some(91) => self.absolute = Some(false),
            _ => self.unknown.push(format_code('G', value)),
        }
    }

    fn absorb_m(&mut self, value: f64) {
        match code_number(value) {
            Some(2) | Some(30) => self.program_end = true,
            Some(3) => self.spindle = Some(Command::SpindleOn { cw: true }),
            Some(4) => self.spindle = Some(Command::SpindleOn { cw: false }),
            Some(5) => self.spindle = Some(Command::SpindleOff),
            _ => self.unknown.push(format_code('M', value)),
        }
    }

    fn into_commands(self) -> Vec<Command> {
        let mut commands = Vec::new();
        let moves = self.rapid.is_some() || !self.target.is_empty();

        if !moves {
            if let Some(value) = self.feed {
                commands.push(Command::SetFeedRate { value });
            }
        }
        if let Some(rpm) = self.spindle_speed {
            commands.push(Command::SetSpindleSpeed { rpm });
        }
        if let Some(spindle) = self.spindle {
            commands.push(spindle);
        }
        if let Some(metric) = self.metric {
            commands.push(Command::SetUnits { metric });
        }
        if let Some(index) = self.wcs {
            commands.push(Command::SelectWcs { index });
        }
        if let Some(absolute) = self.absolute {
            commands.push(Command::SetPositioningMode { absolute });
        }

        match self.rapid {
            Some(rapid) => commands.push(Command::Motion {
                rapid,
                target: self.target,
                feed: self.feed,
            }),
            None if moves => commands.push(Command::ModalMotion {
                target: self.target,
                feed: self.feed,
            }),
            None => {}
        }

        commands.extend(
            self.unknown
                .into_iter()
                .map(|code| Command::Unknown { code }),
        );

        if self.program_end {
            commands.push(Command::ProgramEnd);
        }

        commands
    }
}

/// Integral, non-negative code numbers only; `G38.2` has none
fn code_number(value: f64) -> Option<u32> {
    if value >= 0.0 && value.fract() == 0.0 && value < 1000.0 {
        Some(value as u32)
    } else {
        None
    }
}

fn format_code(letter: char, value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}{}", letter, value as i64)
    } else {
        format!("{}{}", letter, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::lexer::tokenize_line;

    fn classify_text(code: &str) -> Vec<Command> {
        classify(&tokenize_line(code))
    }

    #[test]
    fn test_motion_with_feed() {
        let commands = classify_text("G1 X10 Y20 F500");

        assert_eq!(
            commands,
            vec![Command::Motion {
                rapid: false,
                target: PartialPosition {
                    x: Some(10.0),
                    y: Some(20.0),
                    z: None,
                },
                feed: Some(500.0),
            }]
        );
    }

    #[test]
    fn test_leading_zeros() {
        let commands = classify_text("G00 Z5");
        assert!(matches!(commands[0], Command::Motion { rapid: true, .. }));

        let commands = classify_text("M03");
        assert_eq!(commands, vec![Command::SpindleOn { cw: true }]);
    }

    #[test]
    fn test_modal_line_order() {
        let commands = classify_text("G90 G54 G21 G17");

        assert_eq!(
            commands,
            vec![
                Command::SetUnits { metric: true },
                Command::SelectWcs { index: 1 },
                Command::SetPositioningMode { absolute: true },
                Command::Unknown {
                    code: "G17".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_spindle_speed_before_spindle_on() {
        let commands = classify_text("M3 S12000");

        assert_eq!(
            commands,
            vec![
                Command::SetSpindleSpeed { rpm: 12000.0 },
                Command::SpindleOn { cw: true },
            ]
        );
    }

    #[test]
    fn test_standalone_feed() {
        assert_eq!(
            classify_text("F600"),
            vec![Command::SetFeedRate { value: 600.0 }]
        );
    }

    #[test]
    fn test_axis_words_without_motion_code() {
        let commands = classify_text("X5 Y5 F100");

        assert_eq!(
            commands,
            vec![Command::ModalMotion {
                target: PartialPosition {
                    x: Some(5.0),
                    y: Some(5.0),
                    z: None,
                },
                feed: Some(100.0),
            }]
        );
    }

    #[test]
    fn test_program_end_last() {
        let commands = classify_text("M30 M5");
        assert_eq!(commands, vec![Command::SpindleOff, Command::ProgramEnd]);

        assert_eq!(classify_text("M2"), vec![Command::ProgramEnd]);
    }

    #[test]
    fn test_unknown_codes_are_kept() {
        let commands = classify_text("T1 M6");
        assert_eq!(
            commands,
            vec![Command::Unknown {
                code: "M6".to_string()
            }]
        );

        let commands = classify_text("G38.2 Z-5");
        assert!(commands.contains(&Command::Unknown {
            code: "G38.2".to_string()
        }));
    }

    #[test]
    fn test_malformed_word_kept_as_unknown() {
        let commands = classify_text("G1 X10 Qfoo");

        assert_eq!(commands.len(), 2);
        assert!(matches!(
            commands[0],
            Command::Motion {
                rapid: false,
                target: PartialPosition { x: Some(10.0), .. },
                ..
            }
        ));
        assert_eq!(
            commands[1],
            Command::Unknown {
                code: "QFOO".to_string()
            }
        );
    }

    #[test]
    fn test_last_motion_code_wins() {
        let commands = classify_text("G0 G1 X1");
        assert!(matches!(commands[0], Command::Motion { rapid: false, .. }));
    }

    #[test]
    fn test_line_number_word_ignored() {
        assert!(classify_text("N10").is_empty());
    }

    #[test]
    fn test_describe_code() {
        assert_eq!(describe_code("G0"), Some("Rapid positioning"));
        assert_eq!(describe_code("g01"), describe_code("G1"));
        assert_eq!(
            describe_code("G56"),
            Some("Select work coordinate system 3")
        );
        assert_eq!(describe_code("G17"), None);
        assert_eq!(describe_code("X10"), None);
    }

    #[test]
    fn test_canonical_code() {
        assert_eq!(canonical_code("M03").as_deref(), Some("M3"));
        assert_eq!(canonical_code("g38.2").as_deref(), Some("G38.2"));
        assert_eq!(canonical_code("G1 X1"), None);
    }
}
