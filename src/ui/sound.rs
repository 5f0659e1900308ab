/// Sound engine: procedural sound effects via rodio.
///
/// Buffers are synthesized into in-memory WAVs once at startup and played
/// fire-and-forget on detached sinks.
///
/// Built without the "sound" feature, `SoundEngine` is a no-op stub.

use crate::sim::event::GameEvent;

#[cfg(feature = "sound")]
mod inner {
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};

    const SAMPLE_RATE: u32 = 22050;
    const TAU: f32 = std::f32::consts::TAU;

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        sfx_swoosh: Arc<Vec<u8>>,
        sfx_wing: Arc<Vec<u8>>,
        sfx_point: Arc<Vec<u8>>,
        sfx_hit: Arc<Vec<u8>>,
        sfx_die: Arc<Vec<u8>>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = match OutputStream::try_default() {
                Ok(pair) => pair,
                Err(e) => {
                    tracing::info!("audio output unavailable: {e}");
                    return None;
                }
            };

            Some(SoundEngine {
                _stream: stream,
                handle,
                sfx_swoosh: Arc::new(make_wav(&gen_swoosh())),
                sfx_wing: Arc::new(make_wav(&gen_wing())),
                sfx_point: Arc::new(make_wav(&gen_point())),
                sfx_hit: Arc::new(make_wav(&gen_hit())),
                sfx_die: Arc::new(make_wav(&gen_die())),
            })
        }

        fn play(&self, buf: &Arc<Vec<u8>>) {
            let Ok(sink) = Sink::try_new(&self.handle) else { return };
            if let Ok(src) = rodio::Decoder::new(Cursor::new(buf.as_ref().clone())) {
                sink.append(src);
                sink.detach();
            }
        }

        pub fn play_swoosh(&self) { self.play(&self.sfx_swoosh); }
        pub fn play_wing(&self) { self.play(&self.sfx_wing); }
        pub fn play_point(&self) { self.play(&self.sfx_point); }
        pub fn play_hit(&self) { self.play(&self.sfx_hit); }
        pub fn play_die(&self) { self.play(&self.sfx_die); }
    }

    // ════════════════════════════════════════════════════════════
    //  Waveform generators (mono f32 samples)
    // ════════════════════════════════════════════════════════════

    fn samples_for(duration: f32) -> usize {
        (SAMPLE_RATE as f32 * duration) as usize
    }

    /// Run start: filtered noise sweeping upward.
    fn gen_swoosh() -> Vec<f32> {
        let n = samples_for(0.25);
        let mut rng: u32 = 0x2545_f491;
        let mut prev = 0.0_f32;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                rng = rng.wrapping_mul(1_103_515_245).wrapping_add(12_345);
                let noise = (rng >> 8) as f32 / (1u32 << 24) as f32 * 2.0 - 1.0;
                // One-pole low-pass opening up over time
                let alpha = 0.05 + t * 0.5;
                prev += alpha * (noise - prev);
                let env = (t * std::f32::consts::PI).sin();
                prev * env * 0.35
            })
            .collect()
    }

    /// Flap: very short rising chirp.
    fn gen_wing() -> Vec<f32> {
        let n = samples_for(0.06);
        let mut phase = 0.0_f32;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let freq = 500.0 + t * 700.0;
                phase += freq / SAMPLE_RATE as f32;
                let env = 1.0 - t;
                (phase * TAU).sin() * env * 0.2
            })
            .collect()
    }

    /// Pipe passed: two-tone ding.
    fn gen_point() -> Vec<f32> {
        let mut samples = Vec::new();
        for &(freq, dur) in &[(988.0_f32, 0.06), (1319.0, 0.16)] {
            let n = samples_for(dur);
            for i in 0..n {
                let ti = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32).powf(0.7);
                let wave = (ti * freq * TAU).sin() * 0.8 + (ti * freq * 2.0 * TAU).sin() * 0.2;
                samples.push(wave * env * 0.25);
            }
        }
        samples
    }

    /// Collision: short thud with a noise click.
    fn gen_hit() -> Vec<f32> {
        let n = samples_for(0.12);
        let mut rng: u32 = 777;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let ti = i as f32 / SAMPLE_RATE as f32;
                rng = rng.wrapping_mul(1_103_515_245).wrapping_add(12_345);
                let noise = (rng >> 8) as f32 / (1u32 << 24) as f32 * 2.0 - 1.0;
                let tone = (ti * (140.0 - t * 60.0) * TAU).sin();
                let click = if t < 0.1 { noise * (1.0 - t * 10.0) } else { 0.0 };
                (tone * 0.6 + click * 0.4) * (1.0 - t).powf(1.5) * 0.4
            })
            .collect()
    }

    /// Fall after a hit: long descending whistle.
    fn gen_die() -> Vec<f32> {
        let n = samples_for(0.45);
        let mut phase = 0.0_f32;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let freq = 700.0 - t * 500.0;
                phase += freq / SAMPLE_RATE as f32;
                let env = (1.0 - t).powf(0.5);
                (phase * TAU).sin() * env * 0.22
            })
            .collect()
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder (16-bit PCM mono)
    // ════════════════════════════════════════════════════════════

    pub(super) fn make_wav(samples: &[f32]) -> Vec<u8> {
        let bits_per_sample: u16 = 16;
        let block_align: u16 = bits_per_sample / 8;
        let byte_rate = SAMPLE_RATE * block_align as u32;
        let data_size = samples.len() as u32 * block_align as u32;

        let mut buf = Vec::with_capacity(44 + data_size as usize);
        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&(36 + data_size).to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
        buf.extend_from_slice(&1u16.to_le_bytes()); // mono
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

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn wav_header_sizes() {
            let samples = gen_point();
            let wav = make_wav(&samples);
            assert_eq!(&wav[0..4], b"RIFF");
            assert_eq!(&wav[8..12], b"WAVE");
            assert_eq!(wav.len(), 44 + samples.len() * 2);
            let data_size = u32::from_le_bytes([wav[40], wav[41], wav[42], wav[43]]);
            assert_eq!(data_size as usize, samples.len() * 2);
        }

        #[test]
        fn generators_stay_in_range() {
            for buf in [gen_swoosh(), gen_wing(), gen_point(), gen_hit(), gen_die()] {
                assert!(!buf.is_empty());
                assert!(buf.iter().all(|s| s.abs() <= 1.0));
            }
        }
    }
}

// ════════════════════════════════════════════════════════════
//  Public API (no-ops when the sound feature is off)
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play_swoosh(&self) {}
    pub fn play_wing(&self) {}
    pub fn play_point(&self) {}
    pub fn play_hit(&self) {}
    pub fn play_die(&self) {}
}

/// Map scene events to effects.
pub fn play_events(sound: Option<&SoundEngine>, events: &[GameEvent]) {
    let Some(sfx) = sound else { return };
    for event in events {
        match event {
            GameEvent::Started => sfx.play_swoosh(),
            GameEvent::Flapped => sfx.play_wing(),
            GameEvent::Scored { .. } => sfx.play_point(),
            GameEvent::Hit => sfx.play_hit(),
            GameEvent::Died => sfx.play_die(),
            GameEvent::GameOver { .. } => {}
        }
    }
}
