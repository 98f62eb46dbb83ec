/// Sound engine: a lo-fi background drone plus short blips, via rodio.
///
/// All sounds are generated as in-memory WAV buffers. The output device is
/// opened lazily on first use, so a machine without audio just runs silent.
/// Playback is fire-and-forget (non-blocking) via rodio's Sink.
///
/// Compile without the "sound" feature to disable audio entirely (the stub
/// SoundEngine only tracks the mute flag).

use std::f32::consts::TAU;

#[cfg_attr(not(feature = "sound"), allow(dead_code))]
const SAMPLE_RATE: u32 = 22050;
#[cfg_attr(not(feature = "sound"), allow(dead_code))]
const MASTER_GAIN: f32 = 0.65;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BlipKind {
    /// Memory acquired: rising chirp.
    Memory,
    /// UI tick: falling chirp.
    Ui,
}

#[cfg(feature = "sound")]
mod inner {
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
    use tracing::{debug, warn};

    use super::{gen_blip, gen_drone, make_wav, BlipKind, MASTER_GAIN};

    struct Output {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        drone: Option<Sink>,
        blip_memory: Arc<Vec<u8>>,
        blip_ui: Arc<Vec<u8>>,
    }

    pub struct SoundEngine {
        output: Option<Output>,
        /// Opening the device failed once; don't retry every frame.
        unavailable: bool,
        started: bool,
        muted: bool,
    }

    impl SoundEngine {
        pub fn new() -> Self {
            SoundEngine { output: None, unavailable: false, started: false, muted: false }
        }

        fn ensure(&mut self) -> Option<&mut Output> {
            if self.output.is_none() && !self.unavailable {
                match OutputStream::try_default() {
                    Ok((stream, handle)) => {
                        debug!("audio output opened");
                        self.output = Some(Output {
                            _stream: stream,
                            handle,
                            drone: None,
                            blip_memory: Arc::new(make_wav(&gen_blip(BlipKind::Memory))),
                            blip_ui: Arc::new(make_wav(&gen_blip(BlipKind::Ui))),
                        });
                    }
                    Err(e) => {
                        warn!(error = %e, "audio unavailable, running silent");
                        self.unavailable = true;
                    }
                }
            }
            self.output.as_mut()
        }

        /// Start the looping drone. Idempotent.
        pub fn start(&mut self) {
            if self.started {
                return;
            }
            let volume = self.volume();
            let Some(out) = self.ensure() else { return };
            let sink = match Sink::try_new(&out.handle) {
                Ok(s) => s,
                Err(e) => {
                    warn!(error = %e, "could not create drone sink");
                    return;
                }
            };
            match Decoder::new(Cursor::new(make_wav(&gen_drone()))) {
                Ok(src) => sink.append(src.repeat_infinite()),
                Err(e) => {
                    warn!(error = %e, "could not decode drone");
                    return;
                }
            }
            sink.set_volume(volume);
            out.drone = Some(sink);
            self.started = true;
        }

        pub fn resume_if_needed(&mut self) {
            if let Some(drone) = self.output.as_ref().and_then(|o| o.drone.as_ref()) {
                if drone.is_paused() {
                    drone.play();
                }
            }
        }

        pub fn blip(&mut self, kind: BlipKind) {
            if self.muted {
                return;
            }
            let Some(out) = self.ensure() else { return };
            let buf = match kind {
                BlipKind::Memory => Arc::clone(&out.blip_memory),
                BlipKind::Ui => Arc::clone(&out.blip_ui),
            };
            if let Ok(sink) = Sink::try_new(&out.handle) {
                if let Ok(src) = Decoder::new(Cursor::new(buf.as_ref().clone())) {
                    sink.set_volume(MASTER_GAIN);
                    sink.append(src);
                    sink.detach(); // fire-and-forget
                }
            }
        }

        /// Returns the new muted state.
        pub fn toggle_mute(&mut self) -> bool {
            self.muted = !self.muted;
            let volume = self.volume();
            if let Some(drone) = self.output.as_ref().and_then(|o| o.drone.as_ref()) {
                drone.set_volume(volume);
            }
            self.muted
        }

        pub fn is_muted(&self) -> bool {
            self.muted
        }

        fn volume(&self) -> f32 {
            if self.muted { 0.0 } else { MASTER_GAIN }
        }
    }
}

// ════════════════════════════════════════════════════════════
//  Public API: stub when the sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine {
    muted: bool,
}

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Self { SoundEngine { muted: false } }
    pub fn start(&mut self) {}
    pub fn resume_if_needed(&mut self) {}
    pub fn blip(&mut self, _kind: BlipKind) {}
    pub fn toggle_mute(&mut self) -> bool {
        self.muted = !self.muted;
        self.muted
    }
    pub fn is_muted(&self) -> bool { self.muted }
}

// ════════════════════════════════════════════════════════════
//  Waveform generators: all produce Vec<f32> mono samples
// ════════════════════════════════════════════════════════════

const BLIP_SECONDS: f32 = 0.12;
const DRONE_SECONDS: f32 = 10.0;

/// Sine chirp with an exponential pitch glide over the first 80 ms,
/// a 10 ms attack and a decay that reaches silence at 100 ms.
#[cfg_attr(not(feature = "sound"), allow(dead_code))]
fn gen_blip(kind: BlipKind) -> Vec<f32> {
    let (f0, f1, peak) = match kind {
        BlipKind::Memory => (520.0_f32, 780.0_f32, 0.10_f32),
        BlipKind::Ui => (240.0, 140.0, 0.08),
    };
    let n = (SAMPLE_RATE as f32 * BLIP_SECONDS) as usize;
    let mut phase = 0.0_f32;
    (0..n)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            let glide = (t / 0.08).min(1.0);
            let freq = f0 * (f1 / f0).powf(glide);
            phase = (phase + TAU * freq / SAMPLE_RATE as f32) % TAU;
            let env = if t < 0.01 {
                t / 0.01
            } else if t < 0.10 {
                (1.0 - (t - 0.01) / 0.09).powi(2)
            } else {
                0.0
            };
            phase.sin() * env * peak
        })
        .collect()
}

/// 110 Hz triangle through a one-pole low-pass whose cutoff wanders
/// 650 ± 220 Hz at 0.1 Hz. Ten seconds: one full sweep, loops cleanly.
#[cfg_attr(not(feature = "sound"), allow(dead_code))]
fn gen_drone() -> Vec<f32> {
    let n = (SAMPLE_RATE as f32 * DRONE_SECONDS) as usize;
    let mut y = 0.0_f32;
    (0..n)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            let p = (t * 110.0).fract();
            let tri = 4.0 * (p - 0.5).abs() - 1.0;
            let cutoff = 650.0 + 220.0 * (TAU * 0.10 * t).sin();
            let alpha = 1.0 - (-TAU * cutoff / SAMPLE_RATE as f32).exp();
            y += alpha * (tri - y);
            y * 0.12
        })
        .collect()
}

// ════════════════════════════════════════════════════════════
//  WAV encoder: wraps f32 samples into a valid WAV buffer
// ════════════════════════════════════════════════════════════

#[cfg_attr(not(feature = "sound"), allow(dead_code))]
fn make_wav(samples: &[f32]) -> Vec<u8> {
    let num_channels: u16 = 1;
    let bits_per_sample: u16 = 16;
    let byte_rate = SAMPLE_RATE * (num_channels as u32) * (bits_per_sample as u32) / 8;
    let block_align = num_channels * bits_per_sample / 8;
    let data_size = samples.len() as u32 * 2;
    let file_size = 36 + data_size;

    let mut buf = Vec::with_capacity(44 + data_size as usize);

    buf.extend_from_slice(b"RIFF");
    buf.extend_from_slice(&file_size.to_le_bytes());
    buf.extend_from_slice(b"WAVE");

    buf.extend_from_slice(b"fmt ");
    buf.extend_from_slice(&16u32.to_le_bytes());
    buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
    buf.extend_from_slice(&num_channels.to_le_bytes());
    buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
    buf.extend_from_slice(&byte_rate.to_le_bytes());
    buf.extend_from_slice(&block_align.to_le_bytes());
    buf.extend_from_slice(&bits_per_sample.to_le_bytes());

    buf.extend_from_slice(b"data");
    buf.extend_from_slice(&data_size.to_le_bytes());

    for &s in samples {
        let val = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
        buf.extend_from_slice(&val.to_le_bytes());
    }

    buf
}
