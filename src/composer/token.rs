//! Token grammar
//!
//! Notes:
//! - `<letter><accidental><duration>`  (e.g., C, C#4, Eb2, G16)
//! - Letters: A-G, accidentals: `#` (sharp) or `b` (flat)
//! - Duration: units of the composer's `unit_samples`, default 1
//!
//! Rests: `R<duration>` (e.g., R, R3)
//!
//! Control commands:
//! - `NEWTRACK`
//! - `TRACK:<n>`
//! - `ECHO:<delay samples>`
//! - `EQ:<n>:MAX`, `EQ:<n>:NORM`
//!
//! Scripts are whitespace separated tokens; a word starting with `#` begins
//! a comment running to the end of its line.

use crate::error::ComposeError;

/// Note letter, named after its natural pitch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PitchClass {
    C,
    D,
    E,
    F,
    G,
    A,
    B,
}

impl PitchClass {
    fn from_letter(letter: char) -> Option<Self> {
        match letter {
            'C' => Some(PitchClass::C),
            'D' => Some(PitchClass::D),
            'E' => Some(PitchClass::E),
            'F' => Some(PitchClass::F),
            'G' => Some(PitchClass::G),
            'A' => Some(PitchClass::A),
            'B' => Some(PitchClass::B),
            _ => None,
        }
    }

    /// Semitones above C of the natural note
    pub fn semitone(&self) -> i8 {
        match self {
            PitchClass::C => 0,
            PitchClass::D => 2,
            PitchClass::E => 4,
            PitchClass::F => 5,
            PitchClass::G => 7,
            PitchClass::A => 9,
            PitchClass::B => 11,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Accidental {
    Natural,
    Sharp,
    Flat,
}

impl Accidental {
    pub fn offset(&self) -> i8 {
        match self {
            Accidental::Natural => 0,
            Accidental::Sharp => 1,
            Accidental::Flat => -1,
        }
    }
}

/// A playable note token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteSpec {
    pub pitch_class: PitchClass,
    pub accidental: Accidental,
    /// Length in duration units (always positive)
    pub duration: u32,
}

impl NoteSpec {
    /// Semitones above the octave's C; -1 for `Cb`, 12 for `B#`
    pub fn semitone(&self) -> i8 {
        self.pitch_class.semitone() + self.accidental.offset()
    }
}

/// How `EQ` reshapes a track
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EqualizeMode {
    /// Clip to the configured ceiling
    Max,
    /// Scale so the peak sample reaches 1.0
    Normalize,
}

/// A track or effect instruction
///
/// Numeric arguments are kept as written; range checks belong to the
/// composer, which knows how many tracks exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    NewTrack,
    SwitchTrack(i64),
    Echo(i64),
    Equalize { track: i64, mode: EqualizeMode },
}

/// A classified token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    Note(NoteSpec),
    /// Silence lasting the given number of duration units
    Rest(u32),
    Control(ControlCommand),
}

fn unrecognized(token: &str) -> ComposeError {
    ComposeError::UnrecognizedToken(token.to_string())
}

/// `-?[0-9]+`
fn is_int_literal(s: &str) -> bool {
    let digits = s.strip_prefix('-').unwrap_or(s);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Parse a control argument; `token` is the whole token, for error reporting
fn parse_int(arg: &str, token: &str) -> Result<i64, ComposeError> {
    if !is_int_literal(arg) {
        return Err(unrecognized(token));
    }
    arg.parse::<i64>().map_err(|_| {
        ComposeError::InvalidParameter(format!("{} in {:?} does not fit in 64 bits", arg, token))
    })
}

/// Parse a note or rest duration (empty means 1)
fn parse_duration(digits: &str, token: &str) -> Result<u32, ComposeError> {
    if digits.is_empty() {
        return Ok(1);
    }
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(unrecognized(token));
    }
    let duration = digits.parse::<u32>().map_err(|_| {
        ComposeError::InvalidParameter(format!("duration {} in {:?} is too long", digits, token))
    })?;
    if duration == 0 {
        return Err(ComposeError::InvalidParameter(format!(
            "zero duration in {:?}",
            token
        )));
    }
    Ok(duration)
}

fn parse_control(token: &str) -> Option<Result<ControlCommand, ComposeError>> {
    if token == "NEWTRACK" {
        return Some(Ok(ControlCommand::NewTrack));
    }
    if let Some(arg) = token.strip_prefix("TRACK:") {
        return Some(parse_int(arg, token).map(ControlCommand::SwitchTrack));
    }
    if let Some(arg) = token.strip_prefix("ECHO:") {
        return Some(parse_int(arg, token).map(ControlCommand::Echo));
    }
    if let Some(args) = token.strip_prefix("EQ:") {
        let result = match args.split_once(':') {
            Some((track, "MAX")) => parse_int(track, token).map(|track| ControlCommand::Equalize {
                track,
                mode: EqualizeMode::Max,
            }),
            Some((track, "NORM")) => parse_int(track, token).map(|track| {
                ControlCommand::Equalize {
                    track,
                    mode: EqualizeMode::Normalize,
                }
            }),
            _ => Err(unrecognized(token)),
        };
        return Some(result);
    }
    None
}

fn parse_note(token: &str) -> Result<Token, ComposeError> {
    let mut chars = token.chars();
    let first = chars.next().ok_or_else(|| unrecognized(token))?;

    if first == 'R' {
        return parse_duration(chars.as_str(), token).map(Token::Rest);
    }

    let pitch_class = PitchClass::from_letter(first).ok_or_else(|| unrecognized(token))?;
    let rest = chars.as_str();
    let (accidental, digits) = if let Some(digits) = rest.strip_prefix('#') {
        (Accidental::Sharp, digits)
    } else if let Some(digits) = rest.strip_prefix('b') {
        (Accidental::Flat, digits)
    } else {
        (Accidental::Natural, rest)
    };

    let duration = parse_duration(digits, token)?;
    Ok(Token::Note(NoteSpec {
        pitch_class,
        accidental,
        duration,
    }))
}

/// Classify one token
///
/// Surrounding whitespace is ignored. Every string maps to exactly one
/// token kind or to an error.
pub fn classify(token: &str) -> Result<Token, ComposeError> {
    let token = token.trim();
    match parse_control(token) {
        Some(command) => command.map(Token::Control),
        None => parse_note(token),
    }
}

/// Split a script into `(line number, token)` pairs, skipping comments
///
/// Line numbers start at 1. Only a word that starts with `#` opens a
/// comment, so sharps like `C#4` are kept.
pub fn tokenize(text: &str) -> impl Iterator<Item = (usize, &str)> + '_ {
    text.lines().enumerate().flat_map(|(index, line)| {
        line.split_whitespace()
            .take_while(|word| !word.starts_with('#'))
            .map(move |word| (index + 1, word))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(token: &str) -> NoteSpec {
        match classify(token).unwrap() {
            Token::Note(spec) => spec,
            other => panic!("{} classified as {:?}", token, other),
        }
    }

    #[test]
    fn test_classify_notes() {
        let spec = note("C4");
        assert_eq!(spec.pitch_class, PitchClass::C);
        assert_eq!(spec.accidental, Accidental::Natural);
        assert_eq!(spec.duration, 4);

        let spec = note("F#16");
        assert_eq!(spec.pitch_class, PitchClass::F);
        assert_eq!(spec.accidental, Accidental::Sharp);
        assert_eq!(spec.duration, 16);
        assert_eq!(spec.semitone(), 6);

        let spec = note("Bb");
        assert_eq!(spec.accidental, Accidental::Flat);
        assert_eq!(spec.duration, 1);
        assert_eq!(spec.semitone(), 10);

        assert_eq!(note("Cb").semitone(), -1);
        assert_eq!(note("B#2").semitone(), 12);
        assert_eq!(note("  G2 ").pitch_class, PitchClass::G);
    }

    #[test]
    fn test_classify_rest() {
        assert_eq!(classify("R").unwrap(), Token::Rest(1));
        assert_eq!(classify("R8").unwrap(), Token::Rest(8));
    }

    #[test]
    fn test_classify_controls() {
        assert_eq!(
            classify("NEWTRACK").unwrap(),
            Token::Control(ControlCommand::NewTrack)
        );
        assert_eq!(
            classify("TRACK:2").unwrap(),
            Token::Control(ControlCommand::SwitchTrack(2))
        );
        assert_eq!(
            classify("TRACK:-1").unwrap(),
            Token::Control(ControlCommand::SwitchTrack(-1))
        );
        assert_eq!(
            classify("ECHO:0").unwrap(),
            Token::Control(ControlCommand::Echo(0))
        );
        assert_eq!(
            classify("EQ:1:MAX").unwrap(),
            Token::Control(ControlCommand::Equalize {
                track: 1,
                mode: EqualizeMode::Max
            })
        );
        assert_eq!(
            classify("EQ:0:NORM").unwrap(),
            Token::Control(ControlCommand::Equalize {
                track: 0,
                mode: EqualizeMode::Normalize
            })
        );
    }

    #[test]
    fn test_unrecognized() {
        for token in [
            "", "ZZZ", "H4", "c4", "C#b", "C4x", "C-1", "Rx", "NEWTRACKS", "newtrack", "TRACK:",
            "TRACK:x", "ECHO:1.5", "EQ:1", "EQ:1:MIN", "EQ:x:MAX", "EQ::NORM", "TRACK:--1",
        ] {
            assert!(
                matches!(classify(token), Err(ComposeError::UnrecognizedToken(_))),
                "{:?} should be unrecognized",
                token
            );
        }
    }

    #[test]
    fn test_out_of_domain_numbers() {
        for token in ["C0", "R0", "D99999999999", "TRACK:99999999999999999999"] {
            assert!(
                matches!(classify(token), Err(ComposeError::InvalidParameter(_))),
                "{:?} should be an invalid parameter",
                token
            );
        }
    }

    #[test]
    fn test_classification_is_deterministic() {
        for token in ["C4", "EQ:0:MAX", "ZZZ", "ECHO:-2"] {
            assert_eq!(classify(token), classify(token));
        }
    }

    #[test]
    fn test_tokenize_script() {
        let script = r#"
# intro
C4 D#2   # first bar
NEWTRACK Eb4
        "#;

        let tokens: Vec<_> = tokenize(script).collect();
        assert_eq!(
            tokens,
            vec![(3, "C4"), (3, "D#2"), (4, "NEWTRACK"), (4, "Eb4")]
        );
    }

    #[test]
    fn test_tokenize_empty() {
        assert_eq!(tokenize("").count(), 0);
        assert_eq!(tokenize("  \n# only a comment\n").count(), 0);
    }
}
