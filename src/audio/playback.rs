//! Speech playback using PipeWire
//!
//! Plays one WAV clip at a time. Starting a clip stops the previous one.

use super::{decode_wav, AudioError};
use crate::models::AudioClip;
use async_trait::async_trait;
use log::{debug, warn};
use pipewire as pw;
use pw::spa;
use pw::spa::param::format::{MediaSubtype, MediaType};
use pw::spa::param::format_utils;
use pw::spa::pod::Pod;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use tokio::sync::oneshot;

/// How a clip left the speaker
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackEnd {
    Finished,
    Stopped,
}

/// Cancellation check for one clip
///
/// The clip is cancelled once the shared counter moves past the generation
/// it was issued for.
#[derive(Clone, Debug)]
pub struct PlaybackTicket {
    counter: Arc<AtomicU64>,
    generation: u64,
}

impl PlaybackTicket {
    pub fn new(counter: Arc<AtomicU64>, generation: u64) -> Self {
        Self {
            counter,
            generation,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.counter.load(Ordering::SeqCst) != self.generation
    }
}

/// Audio output for synthesized speech
#[async_trait]
pub trait AudioSink: Send + Sync {
    /// Play a clip, replacing whatever is playing; resolves when it ends
    ///
    /// A clip whose ticket is cancelled before or while it is being set up
    /// must not be played.
    async fn play(
        &self,
        clip: AudioClip,
        ticket: &PlaybackTicket,
    ) -> Result<PlaybackEnd, AudioError>;

    /// Stop the active clip, if any
    fn stop(&self);
}

/// Sink that swallows every clip (`--mute`)
#[derive(Clone, Copy, Debug, Default)]
pub struct MutedSink;

#[async_trait]
impl AudioSink for MutedSink {
    async fn play(
        &self,
        _clip: AudioClip,
        ticket: &PlaybackTicket,
    ) -> Result<PlaybackEnd, AudioError> {
        if ticket.is_cancelled() {
            return Ok(PlaybackEnd::Stopped);
        }
        Ok(PlaybackEnd::Finished)
    }

    fn stop(&self) {}
}

/// Samples of the clip being played - shared with the PipeWire thread
#[derive(Clone)]
struct SharedPlaybackState {
    inner: Arc<Mutex<PlaybackStateInner>>,
}

struct PlaybackStateInner {
    samples: Vec<f32>,
    /// Current playback position (sample index)
    position: usize,
}

impl SharedPlaybackState {
    fn new(samples: Vec<f32>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(PlaybackStateInner {
                samples,
                position: 0,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, PlaybackStateInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Get samples for playback (advances position)
    fn next_samples(&self, count: usize) -> Option<Vec<f32>> {
        let mut inner = self.lock();
        if inner.position >= inner.samples.len() {
            return None;
        }

        let end = (inner.position + count).min(inner.samples.len());
        let samples = inner.samples[inner.position..end].to_vec();
        inner.position = end;
        Some(samples)
    }
}

/// Handle to the clip currently owning the speaker
struct ActivePlayback {
    id: u64,
    stopped: Arc<AtomicBool>,
    sender: pw::channel::Sender<PlaybackCommand>,
    thread_handle: JoinHandle<()>,
}

impl ActivePlayback {
    fn stop(self) {
        self.stopped.store(true, Ordering::SeqCst);
        let _ = self.sender.send(PlaybackCommand::Stop);
        let _ = self.thread_handle.join();
    }
}

enum PlaybackCommand {
    Stop,
}

/// PipeWire speaker output
pub struct PipeWireSink {
    active: Mutex<Option<ActivePlayback>>,
    next_id: AtomicU64,
}

impl PipeWireSink {
    pub fn new() -> Self {
        Self {
            active: Mutex::new(None),
            next_id: AtomicU64::new(0),
        }
    }

    fn active(&self) -> MutexGuard<'_, Option<ActivePlayback>> {
        self.active.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Release the handle once its clip is over, unless a newer clip replaced it
    fn release(&self, id: u64) {
        let finished = {
            let mut active = self.active();
            match active.as_ref() {
                Some(playback) if playback.id == id => active.take(),
                _ => None,
            }
        };
        if let Some(playback) = finished {
            let _ = playback.thread_handle.join();
        }
    }
}

impl Default for PipeWireSink {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for PipeWireSink {
    fn drop(&mut self) {
        self.stop();
    }
}

#[async_trait]
impl AudioSink for PipeWireSink {
    async fn play(
        &self,
        clip: AudioClip,
        ticket: &PlaybackTicket,
    ) -> Result<PlaybackEnd, AudioError> {
        let (samples, sample_rate) = decode_wav(&clip.bytes)?;
        if samples.is_empty() {
            return Ok(PlaybackEnd::Finished);
        }
        if ticket.is_cancelled() {
            debug!("Clip cancelled before playback");
            return Ok(PlaybackEnd::Stopped);
        }

        // Stop any currently playing audio first
        self.stop();

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let stopped = Arc::new(AtomicBool::new(false));
        let state = SharedPlaybackState::new(samples);
        let (done_tx, done_rx) = oneshot::channel();
        let (sender, receiver) = pw::channel::channel::<PlaybackCommand>();

        let thread_handle = thread::Builder::new()
            .name("scrumbot-playback".to_string())
            .spawn(move || {
                let result = run_playback_loop(state, sample_rate, receiver);
                let _ = done_tx.send(result);
            })
            .map_err(|e| AudioError::Playback(format!("Failed to spawn playback thread: {}", e)))?;

        *self.active() = Some(ActivePlayback {
            id,
            stopped: stopped.clone(),
            sender,
            thread_handle,
        });
        debug!("Playing clip {} at {}Hz", id, sample_rate);

        // A stop issued while the thread was starting found nothing to halt
        if ticket.is_cancelled() {
            self.stop();
        }

        let result = done_rx.await;
        self.release(id);

        match result {
            Ok(Ok(())) if stopped.load(Ordering::SeqCst) => Ok(PlaybackEnd::Stopped),
            Ok(Ok(())) => Ok(PlaybackEnd::Finished),
            Ok(Err(e)) => Err(AudioError::Playback(e)),
            Err(_) => Err(AudioError::Playback("playback thread vanished".to_string())),
        }
    }

    fn stop(&self) {
        let previous = self.active().take();
        if let Some(playback) = previous {
            debug!("Stopping clip {}", playback.id);
            playback.stop();
        }
    }
}

/// Run the PipeWire playback loop in a background thread
fn run_playback_loop(
    state: SharedPlaybackState,
    sample_rate: u32,
    receiver: pw::channel::Receiver<PlaybackCommand>,
) -> Result<(), String> {
    pw::init();

    let mainloop = pw::main_loop::MainLoopRc::new(None)
        .map_err(|e| format!("Failed to create PipeWire main loop: {}", e))?;

    let context = pw::context::ContextRc::new(&mainloop, None)
        .map_err(|e| format!("Failed to create PipeWire context: {}", e))?;

    let core = context
        .connect_rc(None)
        .map_err(|e| format!("Failed to connect to PipeWire: {}", e))?;

    let mainloop_weak = mainloop.downgrade();
    let _receiver = receiver.attach(mainloop.loop_(), move |cmd| match cmd {
        PlaybackCommand::Stop => {
            if let Some(mainloop) = mainloop_weak.upgrade() {
                mainloop.quit();
            }
        }
    });

    struct UserData {
        format: spa::param::audio::AudioInfoRaw,
        state: SharedPlaybackState,
        mainloop_weak: pw::main_loop::MainLoopWeak,
    }

    let user_data = UserData {
        format: Default::default(),
        state,
        mainloop_weak: mainloop.downgrade(),
    };

    let props = pw::properties::properties! {
        *pw::keys::MEDIA_TYPE => "Audio",
        *pw::keys::MEDIA_CATEGORY => "Playback",
        *pw::keys::MEDIA_ROLE => "Communication",
        *pw::keys::APP_NAME => "ScrumBot",
    };

    let stream = pw::stream::StreamBox::new(&core, "scrumbot-speech", props)
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
                warn!("Failed to parse playback format: {:?}", e);
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
            let n_channels = user_data.format.channels().max(1) as usize;
            let stride = std::mem::size_of::<f32>() * n_channels;

            let Some(slice) = data.data() else {
                return;
            };

            let n_frames = slice.len() / stride;

            match user_data.state.next_samples(n_frames) {
                Some(samples) => {
                    for (i, &sample) in samples.iter().enumerate() {
                        let bytes = sample.to_le_bytes();
                        for channel in 0..n_channels {
                            let offset = i * stride + channel * 4;
                            if offset + 4 <= slice.len() {
                                slice[offset..offset + 4].copy_from_slice(&bytes);
                            }
                        }
                    }
                    // Fill remainder with silence
                    let written = samples.len() * stride;
                    if written < slice.len() {
                        slice[written..].fill(0);
                    }

                    let chunk = data.chunk_mut();
                    *chunk.offset_mut() = 0;
                    *chunk.stride_mut() = stride as i32;
                    *chunk.size_mut() = written as u32;
                }
                None => {
                    // Clip drained
                    if let Some(mainloop) = user_data.mainloop_weak.upgrade() {
                        mainloop.quit();
                    }
                }
            }
        })
        .register()
        .map_err(|e| format!("Failed to register stream listener: {}", e))?;

    // Mono F32LE at the clip's own rate; PipeWire resamples
    let mut audio_info = spa::param::audio::AudioInfoRaw::new();
    audio_info.set_format(spa::param::audio::AudioFormat::F32LE);
    audio_info.set_rate(sample_rate);
    audio_info.set_channels(1);

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
            spa::utils::Direction::Output,
            None,
            pw::stream::StreamFlags::AUTOCONNECT
                | pw::stream::StreamFlags::MAP_BUFFERS
                | pw::stream::StreamFlags::RT_PROCESS,
            &mut params,
        )
        .map_err(|e| format!("Failed to connect stream: {}", e))?;

    // Run until stopped or the clip ends
    mainloop.run();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::encode_wav;

    fn live_ticket() -> PlaybackTicket {
        PlaybackTicket::new(Arc::new(AtomicU64::new(1)), 1)
    }

    #[test]
    fn test_next_samples_drains_in_order() {
        let state = SharedPlaybackState::new(vec![0.1, 0.2, 0.3, 0.4, 0.5]);
        assert_eq!(state.next_samples(2), Some(vec![0.1, 0.2]));
        assert_eq!(state.next_samples(2), Some(vec![0.3, 0.4]));
        assert_eq!(state.next_samples(2), Some(vec![0.5]));
        assert_eq!(state.next_samples(2), None);
    }

    #[tokio::test]
    async fn test_muted_sink_finishes_immediately() {
        let sink = MutedSink;
        let end = sink.play(AudioClip::new(Vec::new()), &live_ticket()).await.unwrap();
        assert_eq!(end, PlaybackEnd::Finished);
    }

    #[tokio::test]
    async fn test_invalid_clip_is_an_error_without_touching_device() {
        let sink = PipeWireSink::new();
        let result = sink
            .play(AudioClip::new(b"not a wav".to_vec()), &live_ticket())
            .await;
        assert!(matches!(result, Err(AudioError::Encoding(_))));
        assert!(sink.active().is_none());
    }

    #[test]
    fn test_ticket_cancelled_when_counter_moves() {
        let counter = Arc::new(AtomicU64::new(3));
        let ticket = PlaybackTicket::new(counter.clone(), 3);
        assert!(!ticket.is_cancelled());

        counter.fetch_add(1, Ordering::SeqCst);
        assert!(ticket.is_cancelled());
    }

    #[tokio::test]
    async fn test_cancelled_clip_never_reaches_device() {
        let counter = Arc::new(AtomicU64::new(1));
        let ticket = PlaybackTicket::new(counter.clone(), 1);
        // Stopped while the clip was still being synthesized and decoded
        counter.fetch_add(1, Ordering::SeqCst);

        let clip = encode_wav(&[0.1; 160], 16000).unwrap();
        let sink = PipeWireSink::new();
        let end = sink.play(AudioClip::new(clip.bytes), &ticket).await.unwrap();

        assert_eq!(end, PlaybackEnd::Stopped);
        assert!(sink.active().is_none());
        let muted = MutedSink.play(AudioClip::new(Vec::new()), &ticket).await;
        assert_eq!(muted.unwrap(), PlaybackEnd::Stopped);
    }
}
