/// Sound: procedural chiptune effects and a looping tune via rodio.
///
/// Every sound is synthesized into an in-memory WAV buffer at start-up.
/// Effects are fire-and-forget; the tune has its own sink so the music
/// key can pause and resume it.
///
/// Without the "sound" feature the stub engine does nothing.

#[cfg(feature = "sound")]
mod inner {
    use std::f32::consts::TAU;
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
    use tracing::{debug, warn};

    const SAMPLE_RATE: u32 = 22050;

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        sfx_bump: Arc<Vec<u8>>,
        sfx_interact: Arc<Vec<u8>>,
        tune: Arc<Vec<u8>>,
        music: Option<Sink>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = match OutputStream::try_default() {
                Ok(pair) => pair,
                Err(e) => {
                    warn!(error = %e, "no audio output, sound disabled");
                    return None;
                }
            };
            Some(SoundEngine {
                _stream: stream,
                handle,
                sfx_bump: Arc::new(make_wav(&gen_bump())),
                sfx_interact: Arc::new(make_wav(&gen_chime())),
                tune: Arc::new(make_wav(&gen_tune())),
                music: None,
            })
        }

        fn play(&self, buf: &Arc<Vec<u8>>) {
            if let Ok(sink) = Sink::try_new(&self.handle) {
                if let Ok(src) = Decoder::new(Cursor::new(buf.as_ref().clone())) {
                    sink.append(src);
                    sink.detach();
                }
            }
        }

        pub fn play_bump(&self) {
            self.play(&self.sfx_bump);
        }

        pub fn play_interact(&self) {
            self.play(&self.sfx_interact);
        }

        /// Start, resume or pause the background tune.
        pub fn set_music(&mut self, on: bool) {
            if let Some(sink) = &self.music {
                if on { sink.play() } else { sink.pause() }
                return;
            }
            if !on {
                return;
            }
            let sink = match Sink::try_new(&self.handle) {
                Ok(s) => s,
                Err(e) => {
                    warn!(error = %e, "could not open music sink");
                    return;
                }
            };
            match Decoder::new(Cursor::new(self.tune.as_ref().clone())) {
                Ok(src) => {
                    sink.append(src.repeat_infinite());
                    debug!("music started");
                    self.music = Some(sink);
                }
                Err(e) => warn!(error = %e, "could not decode tune"),
            }
        }
    }

    // ── Waveforms (mono f32 samples) ──

    /// Sine note with a linear fade, plus an optional octave overtone.
    fn note(freq: f32, duration: f32, volume: f32, overtone: f32, out: &mut Vec<f32>) {
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        for i in 0..n {
            let t = i as f32 / SAMPLE_RATE as f32;
            let env = 1.0 - i as f32 / n as f32;
            let wave = (t * freq * TAU).sin() * (1.0 - overtone)
                + (t * freq * 2.0 * TAU).sin() * overtone;
            out.push(wave * env * volume);
        }
    }

    /// Blocked step: a short low thud sliding downward.
    fn gen_bump() -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * 0.07) as usize;
        (0..n)
            .map(|i| {
                let p = i as f32 / n as f32;
                let freq = 140.0 - p * 60.0;
                let t = i as f32 / SAMPLE_RATE as f32;
                (t * freq * TAU).sin() * (1.0 - p).powf(1.5) * 0.35
            })
            .collect()
    }

    /// Interaction: two bright notes, G5 then D6.
    fn gen_chime() -> Vec<f32> {
        let mut s = Vec::new();
        note(784.0, 0.06, 0.25, 0.3, &mut s);
        note(1175.0, 0.14, 0.25, 0.3, &mut s);
        s
    }

    /// Background loop: a gentle eight-note phrase in C major.
    fn gen_tune() -> Vec<f32> {
        const PHRASE: [f32; 8] = [523.0, 659.0, 784.0, 659.0, 587.0, 698.0, 880.0, 698.0];
        let mut s = Vec::new();
        for &f in &PHRASE {
            note(f, 0.28, 0.12, 0.15, &mut s);
            note(f / 2.0, 0.04, 0.05, 0.0, &mut s);
        }
        s
    }

    /// 16-bit mono PCM WAV around `samples`.
    fn make_wav(samples: &[f32]) -> Vec<u8> {
        let channels: u16 = 1;
        let bits: u16 = 16;
        let byte_rate = SAMPLE_RATE * channels as u32 * bits as u32 / 8;
        let block_align = channels * bits / 8;
        let data_size = samples.len() as u32 * 2;

        let mut buf = Vec::with_capacity(44 + data_size as usize);
        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&(36 + data_size).to_le_bytes());
        buf.extend_from_slice(b"WAVEfmt ");
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes());
        buf.extend_from_slice(&channels.to_le_bytes());
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&bits.to_le_bytes());
        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());
        for &s in samples {
            buf.extend_from_slice(&((s.clamp(-1.0, 1.0) * 32767.0) as i16).to_le_bytes());
        }
        buf
    }

}

// ── Public API: no-ops when the sound feature is off ──

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play_bump(&self) {}
    pub fn play_interact(&self) {}
    pub fn set_music(&mut self, _on: bool) {}
}
