//! Sequential playback of synthesized speech segments

use super::{AudioSink, PlaybackEnd, PlaybackTicket};
use crate::api::ScrumApi;
use log::{debug, warn};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Speaks text segments one after another through a single sink
///
/// Each call to [`SpeechSequencer::play_segments`] starts a new sequence and
/// cancels the previous one. Cloning shares the same sequence counter.
#[derive(Clone)]
pub struct SpeechSequencer {
    api: Arc<dyn ScrumApi>,
    sink: Arc<dyn AudioSink>,
    pause: Duration,
    generation: Arc<AtomicU64>,
    speaking: Arc<AtomicBool>,
}

impl SpeechSequencer {
    pub fn new(api: Arc<dyn ScrumApi>, sink: Arc<dyn AudioSink>, pause: Duration) -> Self {
        Self {
            api,
            sink,
            pause,
            generation: Arc::new(AtomicU64::new(0)),
            speaking: Arc::new(AtomicBool::new(false)),
        }
    }

    /// True while a sequence is in progress
    pub fn is_speaking(&self) -> bool {
        self.speaking.load(Ordering::SeqCst)
    }

    /// Halt the current clip and drop the rest of its sequence
    pub fn stop(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.sink.stop();
        self.speaking.store(false, Ordering::SeqCst);
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// Synthesize and play each segment in order
    ///
    /// Returns how many clips played to the end. Synthesis and playback
    /// failures skip the segment.
    pub async fn play_segments(&self, segments: &[String]) -> usize {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.sink.stop();
        self.speaking.store(true, Ordering::SeqCst);

        let ticket = PlaybackTicket::new(self.generation.clone(), generation);
        let last_spoken = segments.iter().rposition(|s| !s.trim().is_empty());

        let mut finished = 0;
        for (index, segment) in segments.iter().enumerate() {
            if !self.is_current(generation) {
                debug!("Speech sequence {} cancelled", generation);
                return finished;
            }
            if segment.trim().is_empty() {
                continue;
            }

            let Some(clip) = self.api.speak(segment).await else {
                warn!("No audio data received for segment {}", index);
                continue;
            };

            // Cancelled while synthesizing
            if ticket.is_cancelled() {
                return finished;
            }

            match self.sink.play(clip, &ticket).await {
                Ok(PlaybackEnd::Finished) => finished += 1,
                Ok(PlaybackEnd::Stopped) => {}
                Err(e) => warn!("Error playing audio: {}", e),
            }

            let is_last = last_spoken == Some(index);
            if !is_last && !self.pause.is_zero() && self.is_current(generation) {
                tokio::time::sleep(self.pause).await;
            }
        }

        if self.is_current(generation) {
            self.speaking.store(false, Ordering::SeqCst);
        }
        finished
    }

    /// Speak a single reply
    pub async fn play_text(&self, text: &str) -> usize {
        self.play_segments(&[text.to_string()]).await
    }
}
