//! Multi-track composer
//!
//! Processes tokens one at a time against a set of tracks. Track 0 exists
//! from the start, `NEWTRACK` adds more, and effects rewrite a track's
//! signal in place. A token that fails leaves every track and the active
//! track index as they were.

use tracing::{debug, info};

use crate::composer::note_maker::{Interpretation, NoteMaker};
use crate::composer::token::{tokenize, ControlCommand, EqualizeMode};
use crate::config::ComposerConfig;
use crate::error::{ComposeError, ConfigError, ScriptError};
use crate::signal::AudioSignal;

pub struct MusicComposer {
    config: ComposerConfig,
    note_maker: NoteMaker,
    /// Always a valid index into `tracks`
    current_track: usize,
    tracks: Vec<AudioSignal>,
}

impl Default for MusicComposer {
    fn default() -> Self {
        Self::with_valid_config(ComposerConfig::default())
    }
}

impl MusicComposer {
    /// Create a composer with a single empty track
    pub fn new(config: ComposerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::with_valid_config(config))
    }

    fn with_valid_config(config: ComposerConfig) -> Self {
        Self {
            note_maker: NoteMaker::new(&config),
            config,
            current_track: 0,
            tracks: vec![AudioSignal::new()],
        }
    }

    pub fn config(&self) -> &ComposerConfig {
        &self.config
    }

    pub fn current_track(&self) -> usize {
        self.current_track
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    pub fn track(&self, index: usize) -> Option<&AudioSignal> {
        self.tracks.get(index)
    }

    pub fn tracks(&self) -> &[AudioSignal] {
        &self.tracks
    }

    /// Apply one token and return the active track afterwards
    ///
    /// Notes and rests are appended to the active track; control tokens
    /// switch tracks or apply effects.
    pub fn process_entry(&mut self, token: &str) -> Result<&AudioSignal, ComposeError> {
        match self.note_maker.interpret(token)? {
            Interpretation::NoteFragment(fragment) => {
                debug!(
                    token,
                    track = self.current_track,
                    samples = fragment.len(),
                    "Appending fragment"
                );
                self.tracks[self.current_track].append(&fragment);
            }
            Interpretation::ControlCommand(command) => {
                debug!(token, ?command, "Processing control command");
                self.process(command)?;
            }
        }
        Ok(&self.tracks[self.current_track])
    }

    /// Apply every token of `text` in order, returning how many were applied
    ///
    /// Stops at the first failing token. Tokens before it remain applied.
    pub fn process_script(&mut self, text: &str) -> Result<usize, ScriptError> {
        let mut applied = 0;
        for (line, token) in tokenize(text) {
            self.process_entry(token).map_err(|source| ScriptError {
                line,
                token: token.to_string(),
                source,
            })?;
            applied += 1;
        }
        Ok(applied)
    }

    /// Mix of all tracks, aligned at time zero
    ///
    /// Returns an independent signal; an empty composer yields silence.
    pub fn music(&self) -> AudioSignal {
        self.tracks
            .iter()
            .fold(AudioSignal::new(), |mut music, track| {
                music.mix(track);
                music
            })
    }

    fn process(&mut self, command: ControlCommand) -> Result<(), ComposeError> {
        match command {
            ControlCommand::NewTrack => {
                self.tracks.push(AudioSignal::new());
                self.current_track = self.tracks.len() - 1;
                info!(track = self.current_track, "Created track");
            }
            ControlCommand::SwitchTrack(index) => {
                self.current_track = self.track_index(index)?;
                info!(track = self.current_track, "Switched track");
            }
            ControlCommand::Echo(delay) => self.echo(delay)?,
            ControlCommand::Equalize { track, mode } => self.equalize(track, mode)?,
        }
        Ok(())
    }

    fn track_index(&self, index: i64) -> Result<usize, ComposeError> {
        usize::try_from(index)
            .ok()
            .filter(|&i| i < self.tracks.len())
            .ok_or(ComposeError::TrackOutOfRange {
                index,
                tracks: self.tracks.len(),
            })
    }

    fn echo(&mut self, delay: i64) -> Result<(), ComposeError> {
        let max_delay = i64::try_from(self.config.max_echo_delay_samples).unwrap_or(i64::MAX);
        if delay > max_delay {
            return Err(ComposeError::InvalidParameter(format!(
                "echo delay {} exceeds {} samples",
                delay, self.config.max_echo_delay_samples
            )));
        }
        let track = &mut self.tracks[self.current_track];
        *track = track.apply_echo(delay, self.config.echo_decay)?;
        info!(
            track = self.current_track,
            delay,
            decay = self.config.echo_decay,
            "Applied echo"
        );
        Ok(())
    }

    fn equalize(&mut self, track_num: i64, mode: EqualizeMode) -> Result<(), ComposeError> {
        let index = self.track_index(track_num)?;
        let track = &mut self.tracks[index];
        match mode {
            EqualizeMode::Max => track.clamp_amplitude(self.config.eq_ceiling),
            EqualizeMode::Normalize => track.normalize(),
        }
        info!(track = index, ?mode, "Equalized track");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn composer() -> MusicComposer {
        MusicComposer::new(ComposerConfig {
            unit_samples: 50,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_starts_with_one_empty_track() {
        let composer = composer();
        assert_eq!(composer.track_count(), 1);
        assert_eq!(composer.current_track(), 0);
        assert!(composer.music().is_empty());
    }

    #[test]
    fn test_note_appends_to_active_track() {
        let mut composer = composer();
        let len = composer.process_entry("C2").unwrap().len();
        assert_eq!(len, 100);
        let len = composer.process_entry("R").unwrap().len();
        assert_eq!(len, 150);
    }

    #[test]
    fn test_new_track_becomes_active() {
        let mut composer = composer();
        composer.process_entry("C").unwrap();
        let active = composer.process_entry("NEWTRACK").unwrap();
        assert!(active.is_empty());
        assert_eq!(composer.track_count(), 2);
        assert_eq!(composer.current_track(), 1);
    }

    #[test]
    fn test_switch_track_out_of_range() {
        let mut composer = composer();
        composer.process_entry("NEWTRACK").unwrap();
        assert_eq!(
            composer.process_entry("TRACK:2"),
            Err(ComposeError::TrackOutOfRange {
                index: 2,
                tracks: 2
            })
        );
        assert!(matches!(
            composer.process_entry("TRACK:-1"),
            Err(ComposeError::TrackOutOfRange { index: -1, .. })
        ));
        assert_eq!(composer.current_track(), 1);
    }

    #[test]
    fn test_echo_extends_active_track() {
        let mut composer = composer();
        let original = composer.process_entry("A2").unwrap().clone();
        let echoed = composer.process_entry("ECHO:30").unwrap();
        assert_eq!(echoed.len(), original.len() + 30);
        for (i, &sample) in original.samples()[70..].iter().enumerate() {
            assert!((echoed.samples()[100 + i] - sample * 0.5).abs() < 1e-6);
        }
    }

    #[test]
    fn test_echo_rejects_bad_delay() {
        let mut composer = composer();
        composer.process_entry("A2").unwrap();
        let before = composer.tracks().to_vec();

        for token in ["ECHO:0", "ECHO:-4", "ECHO:441001"] {
            assert!(matches!(
                composer.process_entry(token),
                Err(ComposeError::InvalidParameter(_))
            ));
        }
        assert_eq!(composer.tracks(), &before[..]);
    }

    #[test]
    fn test_equalize_max_clamps() {
        let mut composer = MusicComposer::new(ComposerConfig {
            unit_samples: 50,
            eq_ceiling: 0.1,
            ..Default::default()
        })
        .unwrap();
        composer.process_entry("C4").unwrap();
        composer.process_entry("EQ:0:MAX").unwrap();
        assert!(composer.track(0).unwrap().peak() <= 0.1);
    }

    #[test]
    fn test_equalize_normalize() {
        let mut composer = composer();
        composer.process_entry("C4").unwrap();
        composer.process_entry("NEWTRACK").unwrap();
        composer.process_entry("EQ:0:NORM").unwrap();
        assert!((composer.track(0).unwrap().peak() - 1.0).abs() < 1e-5);
        // Active track is unaffected by which track was equalized
        assert_eq!(composer.current_track(), 1);

        // Silent tracks are left alone
        composer.process_entry("EQ:1:NORM").unwrap();
        assert!(composer.track(1).unwrap().is_empty());

        assert!(matches!(
            composer.process_entry("EQ:5:NORM"),
            Err(ComposeError::TrackOutOfRange { index: 5, .. })
        ));
    }

    #[test]
    fn test_equalize_normalize_tiny_amplitude() {
        let mut composer = MusicComposer::new(ComposerConfig {
            unit_samples: 40,
            note_amplitude: 1e-40,
            ..Default::default()
        })
        .unwrap();
        composer.process_entry("C2").unwrap();
        assert!(composer.track(0).unwrap().peak() > 0.0);

        composer.process_entry("EQ:0:NORM").unwrap();
        let track = composer.track(0).unwrap();
        assert!(track.samples().iter().all(|s| s.is_finite() && s.abs() <= 1.0));
        assert!((track.peak() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_equalize_normalize_silent_samples() {
        let mut composer = composer();
        composer.process_entry("R4").unwrap();
        composer.process_entry("EQ:0:NORM").unwrap();
        assert_eq!(composer.track(0).unwrap(), &AudioSignal::silence(200));
    }

    #[test]
    fn test_echo_on_empty_track() {
        let mut composer = composer();
        let echoed = composer.process_entry("ECHO:25").unwrap();
        assert_eq!(echoed, &AudioSignal::silence(25));
    }

    #[test]
    fn test_huge_echo_limit() {
        let mut composer = MusicComposer::new(ComposerConfig {
            unit_samples: 50,
            max_echo_delay_samples: usize::MAX,
            ..Default::default()
        })
        .unwrap();
        composer.process_entry("C").unwrap();
        assert_eq!(composer.process_entry("ECHO:10").unwrap().len(), 60);
    }

    #[test]
    fn test_process_script() {
        let mut composer = composer();
        let applied = composer
            .process_script("C2 NEWTRACK  # second voice\nE2 G2\n")
            .unwrap();
        assert_eq!(applied, 4);
        assert_eq!(composer.track(0).unwrap().len(), 100);
        assert_eq!(composer.track(1).unwrap().len(), 200);
        assert_eq!(composer.music().len(), 200);
    }

    #[test]
    fn test_process_script_reports_location() {
        let mut composer = composer();
        let err = composer.process_script("C2\nD2 ZZZ E2").unwrap_err();
        assert_eq!(err.line, 2);
        assert_eq!(err.token, "ZZZ");
        assert_eq!(
            err.source,
            ComposeError::UnrecognizedToken("ZZZ".to_string())
        );
        // C2 and D2 were applied, E2 was not
        assert_eq!(composer.track(0).unwrap().len(), 200);
    }
}
