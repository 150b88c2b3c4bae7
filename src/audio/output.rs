//! Speaker output via `cpal`.
//!
//! `cpal::Stream` is not `Send` on every platform, so [`CpalOutput`] keeps
//! all streams on one dedicated `audio-output` thread and talks to it over
//! an mpsc command channel.  Each started source is its own output stream;
//! dropping the stream (on `stop`) silences it.
//!
//! ```text
//! SlotPlayer ──start(buf, off)──▶ CpalOutput ──Command::Start──▶ audio thread
//!                                  (resample + remix)              builds + plays stream
//! SlotPlayer ──stop(id)─────────▶ CpalOutput ──Command::Stop───▶ drops stream
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{mpsc, Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use crate::audio::decode::{AudioBuffer, AudioError};
use crate::audio::playback::{AudioOutput, SourceId};
use crate::audio::resample::{downmix_to_mono, remix_channels, resample_linear};

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

enum Command {
    Start {
        id: SourceId,
        /// Interleaved at the device rate and channel count.
        samples: Arc<[f32]>,
        reply: mpsc::Sender<Result<(), AudioError>>,
    },
    Stop(SourceId),
}

// ---------------------------------------------------------------------------
// OutputDevice (lives on the audio thread)
// ---------------------------------------------------------------------------

struct OutputDevice {
    device: cpal::Device,
    config: cpal::StreamConfig,
}

impl OutputDevice {
    /// Open the system default output device with its preferred config.
    fn open_default() -> Result<(Self, u32, u16), AudioError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| AudioError::Output("no output device found".into()))?;

        let supported = device
            .default_output_config()
            .map_err(|e| AudioError::Output(e.to_string()))?;

        let channels = supported.channels();
        let sample_rate = supported.sample_rate().0;
        let config: cpal::StreamConfig = supported.into();

        Ok((Self { device, config }, sample_rate, channels))
    }

    fn play(&self, samples: Arc<[f32]>) -> Result<cpal::Stream, AudioError> {
        let mut pos = 0usize;
        let stream = self
            .device
            .build_output_stream(
                &self.config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    for out in data.iter_mut() {
                        *out = samples.get(pos).copied().unwrap_or(0.0);
                        pos = pos.saturating_add(1);
                    }
                },
                |err: cpal::StreamError| {
                    log::error!("cpal stream error: {err}");
                },
                None, // no timeout
            )
            .map_err(|e| AudioError::Output(e.to_string()))?;

        stream
            .play()
            .map_err(|e| AudioError::Output(e.to_string()))?;
        Ok(stream)
    }
}

fn run_audio_thread(device: OutputDevice, commands: mpsc::Receiver<Command>) {
    let mut streams: HashMap<SourceId, cpal::Stream> = HashMap::new();

    while let Ok(command) = commands.recv() {
        match command {
            Command::Start { id, samples, reply } => {
                let result = device.play(samples).map(|stream| {
                    streams.insert(id, stream);
                });
                // The caller may have given up waiting.
                let _ = reply.send(result);
            }
            Command::Stop(id) => {
                streams.remove(&id);
            }
        }
    }

    log::debug!("audio output thread exiting ({} live streams)", streams.len());
}

// ---------------------------------------------------------------------------
// CpalOutput
// ---------------------------------------------------------------------------

/// [`AudioOutput`] on the system default speaker.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use smartread::audio::{AudioEngine, CpalOutput, SystemClock};
///
/// let output = CpalOutput::new().unwrap();
/// let engine = AudioEngine::new(Arc::new(output), Arc::new(SystemClock::new()));
/// ```
pub struct CpalOutput {
    commands: Mutex<mpsc::Sender<Command>>,
    next_id: AtomicU64,
    sample_rate: u32,
    channels: u16,
}

impl CpalOutput {
    /// Open the default output device on a dedicated thread.
    ///
    /// # Errors
    ///
    /// [`AudioError::Output`] when no output device is available or the
    /// thread cannot be spawned.
    pub fn new() -> Result<Self, AudioError> {
        let (cmd_tx, cmd_rx) = mpsc::channel::<Command>();
        let (ready_tx, ready_rx) = mpsc::channel();

        std::thread::Builder::new()
            .name("audio-output".into())
            .spawn(move || match OutputDevice::open_default() {
                Ok((device, rate, channels)) => {
                    let _ = ready_tx.send(Ok((rate, channels)));
                    run_audio_thread(device, cmd_rx);
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                }
            })
            .map_err(|e| AudioError::Output(e.to_string()))?;

        let (sample_rate, channels) = ready_rx
            .recv()
            .map_err(|_| AudioError::Output("audio thread exited during startup".into()))??;

        log::info!("audio output ready: {sample_rate} Hz, {channels} channels");

        Ok(Self {
            commands: Mutex::new(cmd_tx),
            next_id: AtomicU64::new(0),
            sample_rate,
            channels,
        })
    }

    /// Native sample rate of the output device in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    fn send(&self, command: Command) -> Result<(), AudioError> {
        let tx = self
            .commands
            .lock()
            .map_err(|_| AudioError::Output("audio command channel poisoned".into()))?;
        tx.send(command)
            .map_err(|_| AudioError::Output("audio thread is gone".into()))
    }
}

/// Slice `buffer` from `offset_secs` and convert it to the device format.
fn prepare(buffer: &AudioBuffer, offset_secs: f64, rate: u32, channels: u16) -> Vec<f32> {
    let skip_frames = (offset_secs.max(0.0) * buffer.sample_rate as f64) as usize;
    let skip = (skip_frames * buffer.channels as usize).min(buffer.samples.len());

    let mono = downmix_to_mono(&buffer.samples[skip..], buffer.channels);
    let resampled = resample_linear(&mono, buffer.sample_rate, rate);
    remix_channels(&resampled, 1, channels)
}

impl AudioOutput for CpalOutput {
    fn start(&self, buffer: &AudioBuffer, offset_secs: f64) -> Result<SourceId, AudioError> {
        let id = SourceId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let samples = prepare(buffer, offset_secs, self.sample_rate, self.channels);

        let (reply_tx, reply_rx) = mpsc::channel();
        self.send(Command::Start {
            id,
            samples: samples.into(),
            reply: reply_tx,
        })?;
        reply_rx
            .recv()
            .map_err(|_| AudioError::Output("audio thread dropped the request".into()))??;

        Ok(id)
    }

    fn stop(&self, id: SourceId) {
        if let Err(e) = self.send(Command::Stop(id)) {
            log::warn!("could not stop source {id:?}: {e}");
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
