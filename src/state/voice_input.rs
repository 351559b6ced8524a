//! Message composer: microphone recording plus a text field
//!
//! Recording and typing are mutually exclusive, and both are locked while a
//! request is in flight.

use crate::audio::{encode_wav, AudioError, Microphone};
use crate::models::RecordedAudio;
use log::{debug, info, warn};
use std::time::{Duration, Instant};

/// Hard cap on a single recording
pub const MAX_RECORDING: Duration = Duration::from_secs(30);

/// Notice shown when the microphone cannot be used
pub const MICROPHONE_UNAVAILABLE: &str = "Microphone unavailable";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecorderState {
    #[default]
    Idle,
    Recording,
}

/// Composer state driven by UI events and a per-frame tick
pub struct VoiceInput {
    microphone: Box<dyn Microphone>,
    state: RecorderState,
    started_at: Option<Instant>,
    duration: Duration,
    level: f32,
    text: String,
    notice: Option<&'static str>,
}

impl VoiceInput {
    pub fn new(microphone: Box<dyn Microphone>) -> Self {
        Self {
            microphone,
            state: RecorderState::Idle,
            started_at: None,
            duration: Duration::ZERO,
            level: 0.0,
            text: String::new(),
            notice: None,
        }
    }

    pub fn state(&self) -> RecorderState {
        self.state
    }

    pub fn is_recording(&self) -> bool {
        self.state == RecorderState::Recording
    }

    /// Elapsed recording time, clamped to [`MAX_RECORDING`]
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Live input level, 0.0 - 1.0
    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn notice(&self) -> Option<&'static str> {
        self.notice
    }

    pub fn can_edit_text(&self, is_processing: bool) -> bool {
        !self.is_recording() && !is_processing
    }

    pub fn can_submit_text(&self, is_processing: bool) -> bool {
        self.can_edit_text(is_processing) && !self.text.trim().is_empty()
    }

    pub fn can_toggle_recording(&self, is_processing: bool) -> bool {
        !is_processing
    }

    pub fn push_str(&mut self, input: &str, is_processing: bool) {
        if self.can_edit_text(is_processing) {
            self.text.push_str(input);
        }
    }

    pub fn backspace(&mut self, is_processing: bool) {
        if self.can_edit_text(is_processing) {
            self.text.pop();
        }
    }

    /// Take the trimmed text for sending; blank text stays in the field
    pub fn take_text(&mut self, is_processing: bool) -> Option<String> {
        if !self.can_submit_text(is_processing) {
            return None;
        }
        let text = self.text.trim().to_string();
        self.text.clear();
        Some(text)
    }

    /// Acquire the microphone and start buffering
    pub fn start_recording(&mut self, now: Instant, is_processing: bool) -> Result<(), AudioError> {
        if self.is_recording() || !self.can_toggle_recording(is_processing) {
            return Ok(());
        }

        if let Err(e) = self.microphone.start() {
            warn!("Error starting recording: {}", e);
            self.release_after_failure();
            return Err(e);
        }

        info!("Recording started");
        self.state = RecorderState::Recording;
        self.started_at = Some(now);
        self.duration = Duration::ZERO;
        self.level = 0.0;
        self.notice = None;
        Ok(())
    }

    /// Per-frame update: sample the level, advance the clock, enforce the cap
    ///
    /// Returns the finished recording when the cap ended it. A device failure
    /// discards the capture and sets the notice instead.
    pub fn tick(&mut self, now: Instant) -> Option<RecordedAudio> {
        if !self.is_recording() {
            return None;
        }

        if let Some(error) = self.microphone.failure() {
            warn!("Microphone failed while recording: {}", error);
            self.release_after_failure();
            return None;
        }

        self.level = self.microphone.level();
        if let Some(started_at) = self.started_at {
            let elapsed = now.saturating_duration_since(started_at).min(MAX_RECORDING);
            self.duration = self.duration.max(elapsed);
        }

        if self.duration >= MAX_RECORDING {
            info!("Recording reached {}s cap", MAX_RECORDING.as_secs());
            return self.stop_recording();
        }
        None
    }

    /// Release the microphone and encode what was captured
    ///
    /// Returns `None` when nothing usable was recorded.
    pub fn stop_recording(&mut self) -> Option<RecordedAudio> {
        if !self.is_recording() {
            return None;
        }

        let result = self.microphone.stop();
        self.reset_recording();

        let captured = match result {
            Ok(captured) => captured,
            Err(e) => {
                warn!("Error stopping recording: {}", e);
                self.notice = Some(MICROPHONE_UNAVAILABLE);
                return None;
            }
        };

        if captured.samples.is_empty() {
            info!("Recording captured no audio, discarding");
            return None;
        }

        match encode_wav(&captured.samples, captured.sample_rate) {
            Ok(audio) => Some(audio),
            Err(e) => {
                warn!("Error encoding recording: {}", e);
                None
            }
        }
    }

    /// Release the microphone and throw away what was captured
    pub fn cancel_recording(&mut self) {
        if !self.is_recording() {
            return;
        }
        if let Err(e) = self.microphone.stop() {
            debug!("Error releasing microphone: {}", e);
        }
        self.reset_recording();
        info!("Recording discarded");
    }

    fn release_after_failure(&mut self) {
        // The device may be half-open; stopping is how it is released
        let _ = self.microphone.stop();
        self.reset_recording();
        self.notice = Some(MICROPHONE_UNAVAILABLE);
    }

    fn reset_recording(&mut self) {
        self.state = RecorderState::Idle;
        self.started_at = None;
        self.duration = Duration::ZERO;
        self.level = 0.0;
    }
}

impl Drop for VoiceInput {
    fn drop(&mut self) {
        if self.is_recording() {
            let _ = self.microphone.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::CapturedAudio;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Microphone with scripted behaviour and call counters
    #[derive(Default, Clone)]
    struct FakeMicrophone {
        fail_start: bool,
        fail_later: Arc<Mutex<Option<String>>>,
        samples: Vec<f32>,
        starts: Arc<AtomicUsize>,
        stops: Arc<AtomicUsize>,
    }

    impl Microphone for FakeMicrophone {
        fn start(&mut self) -> Result<(), AudioError> {
            self.starts.fetch_add(1, Ordering::SeqCst);
            if self.fail_start {
                return Err(AudioError::Device("permission denied".to_string()));
            }
            Ok(())
        }

        fn level(&self) -> f32 {
            0.4
        }

        fn failure(&self) -> Option<String> {
            self.fail_later.lock().unwrap().clone()
        }

        fn stop(&mut self) -> Result<CapturedAudio, AudioError> {
            self.stops.fetch_add(1, Ordering::SeqCst);
            Ok(CapturedAudio {
                samples: self.samples.clone(),
                sample_rate: 16000,
            })
        }
    }

    fn with_samples() -> FakeMicrophone {
        FakeMicrophone {
            samples: vec![0.1; 1600],
            ..Default::default()
        }
    }

    #[test]
    fn test_start_stop_produces_wav_blob() {
        let mic = with_samples();
        let stops = mic.stops.clone();
        let mut input = VoiceInput::new(Box::new(mic));
        let t0 = Instant::now();

        input.start_recording(t0, false).unwrap();
        assert!(input.is_recording());
        assert!(input.tick(t0 + Duration::from_millis(500)).is_none());
        assert_eq!(input.level(), 0.4);

        let audio = input.stop_recording().unwrap();
        assert_eq!(&audio.bytes[0..4], b"RIFF");
        assert_eq!(audio.sample_rate, 16000);
        assert!((audio.duration_seconds - 0.1).abs() < 1e-9);
        assert_eq!(input.state(), RecorderState::Idle);
        assert_eq!(stops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_duration_is_monotonic() {
        let mut input = VoiceInput::new(Box::new(with_samples()));
        let t0 = Instant::now();
        input.start_recording(t0, false).unwrap();

        input.tick(t0 + Duration::from_secs(5));
        assert_eq!(input.duration(), Duration::from_secs(5));

        // A tick stamped earlier never rewinds the clock
        input.tick(t0 + Duration::from_secs(3));
        assert_eq!(input.duration(), Duration::from_secs(5));

        input.tick(t0 + Duration::from_secs(7));
        assert_eq!(input.duration(), Duration::from_secs(7));
    }

    #[test]
    fn test_force_stop_at_cap() {
        let mic = with_samples();
        let stops = mic.stops.clone();
        let mut input = VoiceInput::new(Box::new(mic));
        let t0 = Instant::now();
        input.start_recording(t0, false).unwrap();

        assert!(input.tick(t0 + Duration::from_millis(29_999)).is_none());
        assert!(input.is_recording());

        let audio = input.tick(t0 + MAX_RECORDING);
        assert!(audio.is_some());
        assert!(!input.is_recording());
        assert_eq!(stops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_late_tick_clamps_to_cap() {
        let mut input = VoiceInput::new(Box::new(with_samples()));
        let t0 = Instant::now();
        input.start_recording(t0, false).unwrap();

        input.tick(t0 + Duration::from_secs(20));
        assert!(input.tick(t0 + Duration::from_secs(45)).is_some());
        assert_eq!(input.duration(), Duration::ZERO);
    }

    #[test]
    fn test_start_failure_releases_and_reports() {
        let mic = FakeMicrophone {
            fail_start: true,
            ..Default::default()
        };
        let stops = mic.stops.clone();
        let mut input = VoiceInput::new(Box::new(mic));

        assert!(input.start_recording(Instant::now(), false).is_err());
        assert!(!input.is_recording());
        assert_eq!(input.notice(), Some(MICROPHONE_UNAVAILABLE));
        assert_eq!(stops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_device_failure_mid_recording_releases() {
        let mic = with_samples();
        let fail_later = mic.fail_later.clone();
        let stops = mic.stops.clone();
        let mut input = VoiceInput::new(Box::new(mic));
        let t0 = Instant::now();
        input.start_recording(t0, false).unwrap();

        *fail_later.lock().unwrap() = Some("unplugged".to_string());
        assert!(input.tick(t0 + Duration::from_secs(1)).is_none());

        assert!(!input.is_recording());
        assert_eq!(input.notice(), Some(MICROPHONE_UNAVAILABLE));
        assert_eq!(stops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_empty_capture_is_discarded() {
        let mut input = VoiceInput::new(Box::new(FakeMicrophone::default()));
        input.start_recording(Instant::now(), false).unwrap();
        assert!(input.stop_recording().is_none());
        assert!(input.notice().is_none());
    }

    #[test]
    fn test_recording_blocked_while_processing() {
        let mic = with_samples();
        let starts = mic.starts.clone();
        let mut input = VoiceInput::new(Box::new(mic));

        input.start_recording(Instant::now(), true).unwrap();
        assert!(!input.is_recording());
        assert_eq!(starts.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_text_editing_and_submission() {
        let mut input = VoiceInput::new(Box::new(with_samples()));

        input.push_str("  hi there ", false);
        input.backspace(false);
        assert_eq!(input.text(), "  hi there");
        assert_eq!(input.take_text(false).as_deref(), Some("hi there"));
        assert_eq!(input.text(), "");
    }

    #[test]
    fn test_blank_text_is_not_submitted() {
        let mut input = VoiceInput::new(Box::new(with_samples()));
        input.push_str("   ", false);

        assert!(!input.can_submit_text(false));
        assert!(input.take_text(false).is_none());
        assert_eq!(input.text(), "   ");
    }

    #[test]
    fn test_text_locked_while_recording_or_processing() {
        let mut input = VoiceInput::new(Box::new(with_samples()));
        input.push_str("draft", false);

        input.push_str("!", true);
        assert!(input.take_text(true).is_none());

        input.start_recording(Instant::now(), false).unwrap();
        input.push_str("?", false);
        assert!(input.take_text(false).is_none());
        assert_eq!(input.text(), "draft");
    }

    #[test]
    fn test_drop_releases_microphone() {
        let mic = with_samples();
        let stops = mic.stops.clone();
        {
            let mut input = VoiceInput::new(Box::new(mic));
            input.start_recording(Instant::now(), false).unwrap();
        }
        assert_eq!(stops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_cancel_releases_microphone_without_audio() {
        let mic = with_samples();
        let stops = mic.stops.clone();
        let mut input = VoiceInput::new(Box::new(mic));
        let t0 = Instant::now();
        input.start_recording(t0, false).unwrap();

        input.cancel_recording();

        assert_eq!(input.state(), RecorderState::Idle);
        assert_eq!(stops.load(Ordering::SeqCst), 1);
        assert!(input.notice().is_none());
        // The per-frame tick can no longer reach the cap
        assert!(input.tick(t0 + MAX_RECORDING).is_none());

        // Nothing left to release on drop
        drop(input);
        assert_eq!(stops.load(Ordering::SeqCst), 1);
    }
}
