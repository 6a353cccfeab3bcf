/// Sound engine: procedural 8-bit style sound effects via rodio.
///
/// All sounds are generated as in-memory WAV buffers at init time; the
/// config volume (0-10) is baked into the samples as a master gain.
/// Playback is fire-and-forget (non-blocking) via rodio's Sink.
///
/// Compile with `--no-default-features` or without "sound" feature
/// to disable audio entirely (the stub SoundEngine does nothing).

#[cfg(feature = "sound")]
mod inner {
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};

    const SAMPLE_RATE: u32 = 22050;

    /// Pre-generated WAV buffers for each sound effect.
    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        sfx_countdown: Arc<Vec<u8>>,
        sfx_start: Arc<Vec<u8>>,
        sfx_trap_place: Arc<Vec<u8>>,
        sfx_trap_kill: Arc<Vec<u8>>,
        sfx_capture: Arc<Vec<u8>>,
        sfx_enemy_escaped: Arc<Vec<u8>>,
        sfx_respawn: Arc<Vec<u8>>,
        sfx_win: Arc<Vec<u8>>,
        sfx_caught: Arc<Vec<u8>>,
        sfx_time_up: Arc<Vec<u8>>,
    }

    impl SoundEngine {
        /// `volume` is the config value 0-10; 0 yields silent buffers
        /// but keeps the engine alive so playback calls stay no-ops.
        pub fn new(volume: u8) -> Option<Self> {
            let (stream, handle) = OutputStream::try_default().ok()?;
            let gain = (volume.min(10) as f32) / 10.0;

            let wav = |samples: Vec<f32>| Arc::new(make_wav(&samples, gain));

            Some(SoundEngine {
                _stream: stream,
                handle,
                sfx_countdown: wav(gen_blip(660.0, 0.08, 0.3)),
                sfx_start: wav(gen_start()),
                sfx_trap_place: wav(gen_trap_place()),
                sfx_trap_kill: wav(gen_trap_kill()),
                sfx_capture: wav(gen_capture()),
                sfx_enemy_escaped: wav(gen_enemy_escaped()),
                sfx_respawn: wav(gen_blip(220.0, 0.1, 0.25)),
                sfx_win: wav(gen_win()),
                sfx_caught: wav(gen_caught()),
                sfx_time_up: wav(gen_time_up()),
            })
        }

        fn play(&self, buf: &Arc<Vec<u8>>) {
            if let Ok(sink) = Sink::try_new(&self.handle) {
                let cursor = Cursor::new(buf.as_ref().clone());
                if let Ok(src) = rodio::Decoder::new(cursor) {
                    sink.append(src);
                    sink.detach(); // fire-and-forget
                }
            }
        }

        pub fn play_countdown(&self) { self.play(&self.sfx_countdown); }
        pub fn play_start(&self) { self.play(&self.sfx_start); }
        pub fn play_trap_place(&self) { self.play(&self.sfx_trap_place); }
        pub fn play_trap_kill(&self) { self.play(&self.sfx_trap_kill); }
        pub fn play_capture(&self) { self.play(&self.sfx_capture); }
        pub fn play_enemy_escaped(&self) { self.play(&self.sfx_enemy_escaped); }
        pub fn play_respawn(&self) { self.play(&self.sfx_respawn); }
        pub fn play_win(&self) { self.play(&self.sfx_win); }
        pub fn play_caught(&self) { self.play(&self.sfx_caught); }
        pub fn play_time_up(&self) { self.play(&self.sfx_time_up); }
    }

    // ════════════════════════════════════════════════════════════
    //  Waveform generators — all produce Vec<f32> mono samples
    // ════════════════════════════════════════════════════════════

    /// Simple sine blip at given frequency and duration
    fn gen_blip(freq: f32, duration: f32, volume: f32) -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        (0..n)
            .map(|i| {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32); // linear fade out
                (t * freq * 2.0 * std::f32::consts::PI).sin() * env * volume
            })
            .collect()
    }

    /// Match start: quick ascending arpeggio C5→E5→G5
    fn gen_start() -> Vec<f32> {
        let notes = [523.0_f32, 659.0, 784.0];
        let note_dur = 0.07;
        let mut samples = Vec::new();
        for &freq in &notes {
            let n = (SAMPLE_RATE as f32 * note_dur) as usize;
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32).powf(0.5);
                // Square-ish wave (sine + 3rd harmonic) for retro feel
                let wave = (t * freq * 2.0 * std::f32::consts::PI).sin() * 0.7
                    + (t * freq * 3.0 * 2.0 * std::f32::consts::PI).sin() * 0.3;
                samples.push(wave * env * 0.3);
            }
        }
        samples
    }

    /// Trap placement: short dull click, descending
    fn gen_trap_place() -> Vec<f32> {
        let duration = 0.08;
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let freq = 350.0 - t * 150.0;
                let ti = i as f32 / SAMPLE_RATE as f32;
                let env = (1.0 - t).powf(0.8);
                (ti * freq * 2.0 * std::f32::consts::PI).sin() * env * 0.3
            })
            .collect()
    }

    /// Trap kill: noise zap with descending pitch
    fn gen_trap_kill() -> Vec<f32> {
        let duration = 0.15;
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        let mut rng: u32 = 12345;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let freq = 900.0 - t * 700.0;
                let ti = i as f32 / SAMPLE_RATE as f32;
                let tone = (ti * freq * 2.0 * std::f32::consts::PI).sin();
                // Simple LCG noise
                rng = rng.wrapping_mul(1103515245).wrapping_add(12345);
                let noise = (rng as f32 / u32::MAX as f32) * 2.0 - 1.0;
                let env = (1.0 - t).powf(0.7);
                (tone * 0.5 + noise * 0.5) * env * 0.3
            })
            .collect()
    }

    /// Capture: bright two-note chime G5, C6
    fn gen_capture() -> Vec<f32> {
        let pairs = [(784.0_f32, 0.06), (1047.0, 0.12)];
        let mut samples = Vec::new();
        for &(freq, dur) in &pairs {
            let n = (SAMPLE_RATE as f32 * dur) as usize;
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32).powf(0.5);
                let wave = (t * freq * 2.0 * std::f32::consts::PI).sin() * 0.7
                    + (t * freq * 2.0 * 2.0 * std::f32::consts::PI).sin() * 0.3;
                samples.push(wave * env * 0.3);
            }
        }
        samples
    }

    /// Enemy escaped: short descending whistle
    fn gen_enemy_escaped() -> Vec<f32> {
        let duration = 0.18;
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let freq = 700.0 - t * 450.0;
                let ti = i as f32 / SAMPLE_RATE as f32;
                let env = (1.0 - t).powf(0.6);
                (ti * freq * 2.0 * std::f32::consts::PI).sin() * env * 0.25
            })
            .collect()
    }

    /// Victory: ascending fanfare with a sustained top note
    fn gen_win() -> Vec<f32> {
        let notes = [523.0_f32, 659.0, 784.0, 1047.0]; // C5→E5→G5→C6
        let note_dur = 0.1;
        let mut samples = Vec::new();
        for &freq in &notes {
            let n = (SAMPLE_RATE as f32 * note_dur) as usize;
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32) * 0.3;
                let wave = (t * freq * 2.0 * std::f32::consts::PI).sin() * 0.6
                    + (t * freq * 2.0 * 2.0 * std::f32::consts::PI).sin() * 0.3
                    + (t * freq * 3.0 * 2.0 * std::f32::consts::PI).sin() * 0.1;
                samples.push(wave * env * 0.3);
            }
        }
        let last_freq = 1047.0_f32;
        let n = (SAMPLE_RATE as f32 * 0.25) as usize;
        for i in 0..n {
            let t = i as f32 / SAMPLE_RATE as f32;
            let env = 1.0 - (i as f32 / n as f32);
            let wave = (t * last_freq * 2.0 * std::f32::consts::PI).sin();
            samples.push(wave * env * 0.3);
        }
        samples
    }

    /// Player caught: sad descending tone
    fn gen_caught() -> Vec<f32> {
        let notes = [440.0_f32, 370.0, 311.0, 261.0]; // A4→F#4→Eb4→C4
        let note_dur = 0.12;
        let mut samples = Vec::new();
        for &freq in &notes {
            let n = (SAMPLE_RATE as f32 * note_dur) as usize;
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32) * 0.3;
                let wave = (t * freq * 2.0 * std::f32::consts::PI).sin();
                samples.push(wave * env * 0.3);
            }
        }
        // Final fade
        let fade_len = samples.len() / 4;
        let total = samples.len();
        for i in (total - fade_len)..total {
            let ratio = (total - i) as f32 / fade_len as f32;
            samples[i] *= ratio;
        }
        samples
    }

    /// Time up: flat double buzzer
    fn gen_time_up() -> Vec<f32> {
        let mut samples = Vec::new();
        for burst in 0..2 {
            let n = (SAMPLE_RATE as f32 * 0.15) as usize;
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32) * 0.4;
                // Detuned pair gives the buzz
                let wave = (t * 196.0 * 2.0 * std::f32::consts::PI).sin() * 0.5
                    + (t * 200.0 * 2.0 * std::f32::consts::PI).sin() * 0.5;
                samples.push(wave * env * 0.3);
            }
            if burst == 0 {
                let gap = (SAMPLE_RATE as f32 * 0.06) as usize;
                samples.extend(std::iter::repeat(0.0).take(gap));
            }
        }
        samples
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder — wraps f32 samples into a valid WAV buffer
    // ════════════════════════════════════════════════════════════

    fn make_wav(samples: &[f32], gain: f32) -> Vec<u8> {
        let num_channels: u16 = 1;
        let bits_per_sample: u16 = 16;
        let byte_rate = SAMPLE_RATE * (num_channels as u32) * (bits_per_sample as u32) / 8;
        let block_align = num_channels * bits_per_sample / 8;
        let data_size = samples.len() as u32 * 2; // 16-bit = 2 bytes per sample
        let file_size = 36 + data_size;

        let mut buf = Vec::with_capacity(44 + data_size as usize);

        // RIFF header
        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&file_size.to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        // fmt chunk
        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes()); // chunk size
        buf.extend_from_slice(&1u16.to_le_bytes());  // PCM format
        buf.extend_from_slice(&num_channels.to_le_bytes());
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&bits_per_sample.to_le_bytes());

        // data chunk
        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());

        for &s in samples {
            let clamped = (s * gain).max(-1.0).min(1.0);
            let val = (clamped * 32767.0) as i16;
            buf.extend_from_slice(&val.to_le_bytes());
        }

        buf
    }
}

// ════════════════════════════════════════════════════════════
//  Public API — compiles to no-ops when sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new(_volume: u8) -> Option<Self> { Some(SoundEngine) }
    pub fn play_countdown(&self) {}
    pub fn play_start(&self) {}
    pub fn play_trap_place(&self) {}
    pub fn play_trap_kill(&self) {}
    pub fn play_capture(&self) {}
    pub fn play_enemy_escaped(&self) {}
    pub fn play_respawn(&self) {}
    pub fn play_win(&self) {}
    pub fn play_caught(&self) {}
    pub fn play_time_up(&self) {}
}
