//! Microphone capture using PipeWire
//!
//! Provides microphone capture with real-time level metering.

use super::AudioError;
use log::{debug, warn};
use pipewire as pw;
use pw::spa;
use pw::spa::param::format::{MediaSubtype, MediaType};
use pw::spa::param::format_utils;
use pw::spa::pod::Pod;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

/// Speech rarely exceeds this RMS; it maps to a full level meter
const FULL_SCALE_RMS: f32 = 0.25;

/// Current state of audio capture
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CaptureState {
    Idle,
    Capturing,
    Error,
}

/// Samples collected between start and stop
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CapturedAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

/// A source of recorded speech
///
/// Implementations must release the device on `stop` even when they fail.
pub trait Microphone: Send {
    /// Acquire the device and start buffering
    fn start(&mut self) -> Result<(), AudioError>;

    /// Current input level, 0.0 - 1.0
    fn level(&self) -> f32;

    /// Failure reported by the device after a successful start
    fn failure(&self) -> Option<String> {
        None
    }

    /// Release the device and hand back everything buffered
    fn stop(&mut self) -> Result<CapturedAudio, AudioError>;
}

/// Shared state for audio capture - thread-safe
#[derive(Clone)]
struct SharedCaptureState {
    inner: Arc<Mutex<CaptureStateInner>>,
}

struct CaptureStateInner {
    /// Smoothed RMS volume level
    volume_level: f32,
    /// Captured audio samples (f32, mono)
    samples: Vec<f32>,
    state: CaptureState,
    error: Option<String>,
    /// Sample rate negotiated with PipeWire
    sample_rate: u32,
}

impl SharedCaptureState {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(CaptureStateInner {
                volume_level: 0.0,
                samples: Vec::new(),
                state: CaptureState::Idle,
                error: None,
                sample_rate: 48000,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CaptureStateInner> {
        // A poisoned meter is still a usable meter
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn volume_level(&self) -> f32 {
        self.lock().volume_level
    }

    pub fn state(&self) -> CaptureState {
        self.lock().state
    }

    pub fn error(&self) -> Option<String> {
        self.lock().error.clone()
    }

    pub fn set_state(&self, state: CaptureState) {
        self.lock().state = state;
    }

    pub fn set_error(&self, error: String) {
        let mut inner = self.lock();
        inner.error = Some(error);
        inner.state = CaptureState::Error;
    }

    pub fn reset(&self) {
        let mut inner = self.lock();
        inner.samples.clear();
        inner.volume_level = 0.0;
        inner.error = None;
        inner.state = CaptureState::Idle;
    }

    /// Move the buffered samples out, leaving the buffer empty
    fn take_audio(&self) -> CapturedAudio {
        let mut inner = self.lock();
        CapturedAudio {
            samples: std::mem::take(&mut inner.samples),
            sample_rate: inner.sample_rate,
        }
    }

    /// Process incoming audio samples
    pub fn process_samples(&self, samples: &[f32], sample_rate: u32) {
        if samples.is_empty() {
            return;
        }

        let mut inner = self.lock();
        if sample_rate > 0 {
            inner.sample_rate = sample_rate;
        }

        // Smooth volume level for display
        let rms = calculate_rms(samples);
        inner.volume_level = inner.volume_level * 0.7 + rms * 0.3;

        inner.samples.extend_from_slice(samples);
    }
}

impl Default for SharedCaptureState {
    fn default() -> Self {
        Self::new()
    }
}

/// Microphone capture using PipeWire
pub struct AudioCapture {
    state: SharedCaptureState,
    is_running: Arc<AtomicBool>,
    thread_handle: Option<JoinHandle<()>>,
    sender: Option<pw::channel::Sender<PipeWireCommand>>,
}

enum PipeWireCommand {
    Stop,
}

impl AudioCapture {
    pub fn new() -> Self {
        Self {
            state: SharedCaptureState::new(),
            is_running: Arc::new(AtomicBool::new(false)),
            thread_handle: None,
            sender: None,
        }
    }

    /// Ask the PipeWire loop to quit and wait for its thread
    fn shutdown(&mut self) {
        if let Some(sender) = self.sender.take() {
            let _ = sender.send(PipeWireCommand::Stop);
        }
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
        self.is_running.store(false, Ordering::SeqCst);
    }
}

impl Microphone for AudioCapture {
    fn start(&mut self) -> Result<(), AudioError> {
        if self.is_running.load(Ordering::SeqCst) {
            return Err(AudioError::Device("Capture already running".to_string()));
        }

        self.state.reset();
        self.state.set_state(CaptureState::Capturing);
        self.is_running.store(true, Ordering::SeqCst);

        let state = self.state.clone();
        let is_running = self.is_running.clone();

        // Create channel for stopping the loop
        let (sender, receiver) = pw::channel::channel::<PipeWireCommand>();
        self.sender = Some(sender);

        let spawned = thread::Builder::new()
            .name("scrumbot-capture".to_string())
            .spawn(move || {
                if let Err(e) = run_capture_loop(state.clone(), receiver) {
                    warn!("Microphone capture failed: {}", e);
                    state.set_error(e);
                }
                is_running.store(false, Ordering::SeqCst);
            });

        match spawned {
            Ok(handle) => {
                self.thread_handle = Some(handle);
                debug!("Microphone capture started");
                Ok(())
            }
            Err(e) => {
                self.sender = None;
                self.is_running.store(false, Ordering::SeqCst);
                self.state.set_error(e.to_string());
                Err(AudioError::Device(format!("Failed to spawn capture thread: {}", e)))
            }
        }
    }

    fn level(&self) -> f32 {
        (self.state.volume_level() / FULL_SCALE_RMS).clamp(0.0, 1.0)
    }

    fn failure(&self) -> Option<String> {
        match self.state.state() {
            CaptureState::Error => self.state.error(),
            _ => None,
        }
    }

    fn stop(&mut self) -> Result<CapturedAudio, AudioError> {
        let was_started = self.sender.is_some() || self.thread_handle.is_some();
        self.shutdown();

        let failure = self.failure();
        let audio = self.state.take_audio();
        self.state.reset();

        if let Some(error) = failure {
            return Err(AudioError::Device(error));
        }
        if !was_started {
            return Err(AudioError::NotRunning);
        }

        debug!(
            "Microphone capture stopped ({} samples at {}Hz)",
            audio.samples.len(),
            audio.sample_rate
        );
        Ok(audio)
    }
}

impl Default for AudioCapture {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for AudioCapture {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Run the PipeWire capture loop in a background thread
fn run_capture_loop(
    state: SharedCaptureState,
    receiver: pw::channel::Receiver<PipeWireCommand>,
) -> Result<(), String> {
    pw::init();

    let mainloop = pw::main_loop::MainLoopRc::new(None)
        .map_err(|e| format!("Failed to create PipeWire main loop: {}", e))?;

    let context = pw::context::ContextRc::new(&mainloop, None)
        .map_err(|e| format!("Failed to create PipeWire context: {}", e))?;

    let core = context
        .connect_rc(None)
        .map_err(|e| format!("Failed to connect to PipeWire: {}", e))?;

    // Set up channel receiver to stop the loop
    let mainloop_weak = mainloop.downgrade();
    let _receiver = receiver.attach(mainloop.loop_(), move |cmd| match cmd {
        PipeWireCommand::Stop => {
            if let Some(mainloop) = mainloop_weak.upgrade() {
                mainloop.quit();
            }
        }
    });

    struct UserData {
        format: spa::param::audio::AudioInfoRaw,
        state: SharedCaptureState,
    }

    let user_data = UserData {
        format: Default::default(),
        state: state.clone(),
    };

    let props = pw::properties::properties! {
        *pw::keys::MEDIA_TYPE => "Audio",
        *pw::keys::MEDIA_CATEGORY => "Capture",
        *pw::keys::MEDIA_ROLE => "Communication",
        *pw::keys::APP_NAME => "ScrumBot",
    };

    let stream = pw::stream::StreamBox::new(&core, "scrumbot-capture", props)
        .map_err(|e| format!("Failed to create PipeWire stream: {}", e))?;

    let _listener = stream
        .add_local_listener_with_user_data(user_data)
        .param_changed(|_, user_data, id, param| {
            let Some(param) = param else { return };
            if id != spa::param::ParamType::Format.as_raw() {
                return;
            }

            let Ok((media_type, media_subtype)) = format_utils::parse_format(param) else {
                return;
            };

            if media_type != MediaType::Audio || media_subtype != MediaSubtype::Raw {
                return;
            }

            if let Err(e) = user_data.format.parse(param) {
                warn!("Failed to parse capture format: {:?}", e);
            }
        })
        .process(|stream, user_data| {
            let Some(mut buffer) = stream.dequeue_buffer() else {
                return;
            };

            let datas = buffer.datas_mut();
            if datas.is_empty() {
                return;
            }

            let data = &mut datas[0];
            let n_channels = user_data.format.channels().max(1);
            let sample_rate = user_data.format.rate();
            let n_samples = data.chunk().size() / (std::mem::size_of::<f32>() as u32);

            if let Some(raw_samples) = data.data() {
                // Keep the first channel of each frame
                let mut mono_samples = Vec::with_capacity((n_samples / n_channels) as usize);

                for i in (0..n_samples).step_by(n_channels as usize) {
                    let start = i as usize * std::mem::size_of::<f32>();
                    let end = start + std::mem::size_of::<f32>();
                    if end <= raw_samples.len() {
                        let sample = f32::from_le_bytes(
                            raw_samples[start..end].try_into().unwrap_or([0; 4]),
                        );
                        mono_samples.push(sample);
                    }
                }

                user_data.state.process_samples(&mono_samples, sample_rate);
            }
        })
        .register()
        .map_err(|e| format!("Failed to register stream listener: {}", e))?;

    // Request F32LE at the native rate
    let mut audio_info = spa::param::audio::AudioInfoRaw::new();
    audio_info.set_format(spa::param::audio::AudioFormat::F32LE);

    let obj = spa::pod::Object {
        type_: spa::utils::SpaTypes::ObjectParamFormat.as_raw(),
        id: spa::param::ParamType::EnumFormat.as_raw(),
        properties: audio_info.into(),
    };

    let values: Vec<u8> = spa::pod::serialize::PodSerializer::serialize(
        std::io::Cursor::new(Vec::new()),
        &spa::pod::Value::Object(obj),
    )
    .map_err(|e| format!("Failed to serialize audio format: {:?}", e))?
    .0
    .into_inner();

    let pod = Pod::from_bytes(&values).ok_or("Failed to build audio format pod")?;
    let mut params = [pod];

    stream
        .connect(
            spa::utils::Direction::Input,
            None,
            pw::stream::StreamFlags::AUTOCONNECT
                | pw::stream::StreamFlags::MAP_BUFFERS
                | pw::stream::StreamFlags::RT_PROCESS,
            &mut params,
        )
        .map_err(|e| format!("Failed to connect stream: {}", e))?;

    // Run until stopped
    mainloop.run();

    Ok(())
}

/// Calculate RMS volume from samples
pub fn calculate_rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rms() {
        assert_eq!(calculate_rms(&[]), 0.0);
        assert!((calculate_rms(&[0.5, -0.5, 0.5, -0.5]) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_process_samples_buffers_and_meters() {
        let state = SharedCaptureState::new();
        state.process_samples(&[0.5; 480], 16000);
        state.process_samples(&[0.5; 480], 16000);

        assert!(state.volume_level() > 0.0);
        let audio = state.take_audio();
        assert_eq!(audio.samples.len(), 960);
        assert_eq!(audio.sample_rate, 16000);
        assert!(state.take_audio().samples.is_empty());
    }

    #[test]
    fn test_error_state() {
        let state = SharedCaptureState::new();
        state.set_error("no device".to_string());
        assert_eq!(state.state(), CaptureState::Error);
        assert_eq!(state.error().as_deref(), Some("no device"));

        state.reset();
        assert_eq!(state.state(), CaptureState::Idle);
        assert!(state.error().is_none());
    }

    #[test]
    fn test_stop_without_start() {
        let mut capture = AudioCapture::new();
        assert!(matches!(capture.stop(), Err(AudioError::NotRunning)));
        assert!(!capture.is_running.load(Ordering::SeqCst));
    }
}
