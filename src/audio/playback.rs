//! Slot-based playback with pause/resume offsets and progress polling.
//!
//! # Model
//!
//! ```text
//!            play(buf, off)          tick() reaches 1.0
//!   Idle ───────────────▶ Playing ──────────────────▶ Finished
//!    ▲                     │   ▲                          │
//!    │               pause │   │ resume                   │ resume / restart
//!    │                     ▼   │                          │ (from 0)
//!    └──── stop ────── Paused ─┘◀─────────────────────────┘
//! ```
//!
//! A [`SlotPlayer`] owns at most one sounding source.  Position is derived
//! from a [`Clock`] reference taken at start (`now - offset`), never from
//! the device, so progress stays deterministic under a manual clock.
//! [`AudioEngine`] groups the three independent slots the reader uses.

use std::sync::Arc;
use std::time::Instant;

use crate::audio::decode::{AudioBuffer, AudioError};

// ---------------------------------------------------------------------------
// Clock / AudioOutput
// ---------------------------------------------------------------------------

/// Monotonic time source in seconds.
pub trait Clock: Send + Sync {
    fn now_secs(&self) -> f64;
}

/// Wall clock measured from construction.
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_secs(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Identifies one sounding source on an [`AudioOutput`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceId(pub u64);

/// A device (or stand-in) that can start and stop sources.
///
/// `stop` must tolerate ids that already finished or were never started.
pub trait AudioOutput: Send + Sync {
    fn start(&self, buffer: &AudioBuffer, offset_secs: f64) -> Result<SourceId, AudioError>;
    fn stop(&self, id: SourceId);
}

/// Headless output: accepts every source and produces no sound.
#[derive(Default)]
pub struct NullOutput {
    next: std::sync::atomic::AtomicU64,
}

impl AudioOutput for NullOutput {
    fn start(&self, _buffer: &AudioBuffer, _offset_secs: f64) -> Result<SourceId, AudioError> {
        let id = self.next.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        Ok(SourceId(id))
    }

    fn stop(&self, _id: SourceId) {}
}

// ---------------------------------------------------------------------------
// SlotPlayer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Playing,
    Paused,
    /// Played to the end; the next resume starts from 0.
    Finished,
}

/// The three independent playback channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    /// Paragraph narration.
    Narration,
    /// Reading the current selection aloud.
    SelectionRead,
    /// Spoken explanation of a selection analysis.
    AnalysisLecture,
}

impl Slot {
    pub const ALL: [Slot; 3] = [Slot::Narration, Slot::SelectionRead, Slot::AnalysisLecture];

    fn index(self) -> usize {
        match self {
            Slot::Narration => 0,
            Slot::SelectionRead => 1,
            Slot::AnalysisLecture => 2,
        }
    }
}

/// Single-occupancy player for one [`Slot`].
pub struct SlotPlayer {
    slot: Slot,
    output: Arc<dyn AudioOutput>,
    clock: Arc<dyn Clock>,
    buffer: Option<AudioBuffer>,
    source: Option<SourceId>,
    /// Clock time corresponding to buffer position 0 while playing.
    start_ref: f64,
    /// Position to resume from while paused.
    offset: f64,
    state: PlaybackState,
    auto_restart: bool,
}

impl SlotPlayer {
    pub fn new(slot: Slot, output: Arc<dyn AudioOutput>, clock: Arc<dyn Clock>) -> Self {
        Self {
            slot,
            output,
            clock,
            buffer: None,
            source: None,
            start_ref: 0.0,
            offset: 0.0,
            state: PlaybackState::Idle,
            auto_restart: false,
        }
    }

    pub fn slot(&self) -> Slot {
        self.slot
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    pub fn has_buffer(&self) -> bool {
        self.buffer.is_some()
    }

    /// Stored resume position in seconds.
    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// When set, every resume starts from 0 regardless of the stored offset.
    pub fn set_auto_restart(&mut self, on: bool) {
        self.auto_restart = on;
    }

    pub fn auto_restart(&self) -> bool {
        self.auto_restart
    }

    fn duration(&self) -> f64 {
        self.buffer.as_ref().map_or(0.0, AudioBuffer::duration_secs)
    }

    fn silence_source(&mut self) {
        if let Some(id) = self.source.take() {
            self.output.stop(id);
        }
    }

    /// Start `buffer` at `from_offset` seconds, replacing whatever this slot
    /// was playing.
    ///
    /// On an output failure the slot is left empty and playable again.
    pub fn play(&mut self, buffer: AudioBuffer, from_offset: f64) -> Result<(), AudioError> {
        self.silence_source();

        let duration = buffer.duration_secs();
        let offset = from_offset.clamp(0.0, duration);

        match self.output.start(&buffer, offset) {
            Ok(id) => {
                log::debug!("{:?}: playing {duration:.2}s from {offset:.2}s", self.slot);
                self.source = Some(id);
                self.buffer = Some(buffer);
                self.start_ref = self.clock.now_secs() - offset;
                self.offset = offset;
                self.state = PlaybackState::Playing;
                Ok(())
            }
            Err(e) => {
                log::error!("{:?}: playback failed: {e}", self.slot);
                self.buffer = None;
                self.offset = 0.0;
                self.state = PlaybackState::Idle;
                Err(e)
            }
        }
    }

    /// Stop the source and remember the elapsed position.  No-op unless
    /// playing.
    pub fn pause(&mut self) {
        if self.state != PlaybackState::Playing {
            return;
        }
        self.silence_source();
        let elapsed = self.clock.now_secs() - self.start_ref;
        self.offset = elapsed.clamp(0.0, self.duration());
        self.state = PlaybackState::Paused;
    }

    /// Continue the loaded buffer: from the stored offset when paused, from 0
    /// after finishing or with auto-restart.  No-op without a buffer or while
    /// already playing.
    pub fn resume(&mut self) -> Result<(), AudioError> {
        let offset = match self.state {
            PlaybackState::Paused if !self.auto_restart => self.offset,
            PlaybackState::Paused | PlaybackState::Finished => 0.0,
            PlaybackState::Idle | PlaybackState::Playing => return Ok(()),
        };
        match self.buffer.clone() {
            Some(buffer) => self.play(buffer, offset),
            None => Ok(()),
        }
    }

    /// `play(buffer, 0)` on the loaded buffer.
    pub fn restart(&mut self) -> Result<(), AudioError> {
        match self.buffer.clone() {
            Some(buffer) => self.play(buffer, 0.0),
            None => Ok(()),
        }
    }

    /// Stop, unload the buffer and forget the offset.  Idempotent.
    pub fn stop(&mut self) {
        self.silence_source();
        self.buffer = None;
        self.offset = 0.0;
        self.start_ref = 0.0;
        self.state = PlaybackState::Idle;
    }

    /// Current progress in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        let duration = self.duration();
        match self.state {
            PlaybackState::Idle => 0.0,
            PlaybackState::Finished => 1.0,
            _ if duration <= 0.0 => 1.0,
            PlaybackState::Paused => (self.offset / duration).min(1.0),
            PlaybackState::Playing => {
                ((self.clock.now_secs() - self.start_ref) / duration).clamp(0.0, 1.0)
            }
        }
    }

    /// Cooperative progress poll, driven by the caller's refresh cadence.
    ///
    /// Returns the progress while playing (`None` otherwise).  On reaching 1
    /// the source is released, the offset reset and the state becomes
    /// [`PlaybackState::Finished`].
    pub fn tick(&mut self) -> Option<f64> {
        if self.state != PlaybackState::Playing {
            return None;
        }
        let progress = self.progress();
        if progress >= 1.0 {
            self.silence_source();
            self.offset = 0.0;
            self.state = PlaybackState::Finished;
            log::debug!("{:?}: finished", self.slot);
        }
        Some(progress)
    }
}

impl Drop for SlotPlayer {
    fn drop(&mut self) {
        self.silence_source();
    }
}

// ---------------------------------------------------------------------------
// AudioEngine
// ---------------------------------------------------------------------------

/// Three independent [`SlotPlayer`]s sharing one output and clock.
///
/// Starting playback on one slot never affects the others.
///
/// ```rust
/// use std::sync::Arc;
/// use smartread::audio::{AudioBuffer, AudioEngine, NullOutput, Slot, SystemClock};
///
/// let mut engine = AudioEngine::new(Arc::new(NullOutput::default()), Arc::new(SystemClock::new()));
/// let buffer = AudioBuffer::new(vec![0.0; 24_000], 24_000, 1);
///
/// engine.play(Slot::Narration, buffer.clone(), 0.0).unwrap();
/// engine.play(Slot::SelectionRead, buffer, 0.0).unwrap();
/// engine.stop(Slot::SelectionRead);
/// assert!(engine.slot(Slot::Narration).is_playing());
/// ```
pub struct AudioEngine {
    slots: [SlotPlayer; 3],
}

impl AudioEngine {
    pub fn new(output: Arc<dyn AudioOutput>, clock: Arc<dyn Clock>) -> Self {
        let player = |slot| SlotPlayer::new(slot, output.clone(), clock.clone());
        Self {
            slots: Slot::ALL.map(player),
        }
    }

    pub fn slot(&self, slot: Slot) -> &SlotPlayer {
        &self.slots[slot.index()]
    }

    pub fn slot_mut(&mut self, slot: Slot) -> &mut SlotPlayer {
        &mut self.slots[slot.index()]
    }

    pub fn play(&mut self, slot: Slot, buffer: AudioBuffer, from: f64) -> Result<(), AudioError> {
        self.slot_mut(slot).play(buffer, from)
    }

    pub fn pause(&mut self, slot: Slot) {
        self.slot_mut(slot).pause();
    }

    pub fn resume(&mut self, slot: Slot) -> Result<(), AudioError> {
        self.slot_mut(slot).resume()
    }

    pub fn restart(&mut self, slot: Slot) -> Result<(), AudioError> {
        self.slot_mut(slot).restart()
    }

    pub fn stop(&mut self, slot: Slot) {
        self.slot_mut(slot).stop();
    }

    /// Release every slot, e.g. on phase exit.
    pub fn stop_all(&mut self) {
        self.slots.iter_mut().for_each(SlotPlayer::stop);
    }

    pub fn set_auto_restart(&mut self, on: bool) {
        self.slots.iter_mut().for_each(|p| p.set_auto_restart(on));
    }

    /// Poll every playing slot; returns `(slot, progress)` for each.
    pub fn tick(&mut self) -> Vec<(Slot, f64)> {
        self.slots
            .iter_mut()
            .filter_map(|p| p.tick().map(|progress| (p.slot(), progress)))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
