//! Radio playback: an uncompressed WAV stream (HTTP or file) played to the
//! default output device while feeding the sample tap.
//!
//! A reader thread decodes the stream into a bounded playback queue; the cpal
//! output callback drains it, resamples to the device rate and pushes what it
//! plays into the tap, so the spectrogram follows exactly what is heard.

use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufReader, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, SampleFormat, SizedSample, Stream, StreamConfig};

use super::{AudioSource, SampleTap, SourceId};
use crate::error::{AcquisitionFailure, SessionError};

/// Seconds of decoded audio buffered ahead of playback
const QUEUE_SECONDS: usize = 2;

/// Frames decoded per reader iteration
const READ_CHUNK_FRAMES: usize = 1024;

type PlaybackQueue = Arc<Mutex<VecDeque<f32>>>;

/// Decoded WAV stream with normalized f32 samples
pub struct WavStream {
    reader: hound::WavReader<Box<dyn Read + Send>>,
}

impl WavStream {
    /// Open an http(s) URL or a local path; blocks until the header is parsed
    pub fn open(location: &str) -> Result<Self, SessionError> {
        let location = location.trim();
        let source: Box<dyn Read + Send> =
            if location.starts_with("http://") || location.starts_with("https://") {
                Box::new(open_http(location)?)
            } else {
                let path = location.strip_prefix("file://").unwrap_or(location);
                let file = File::open(path).map_err(|e| {
                    SessionError::acquisition(
                        AcquisitionFailure::DeviceNotFound,
                        format!("cannot open '{}': {}", path, e),
                    )
                })?;
                Box::new(BufReader::new(file))
            };
        Self::from_reader(source)
    }

    /// Parse a WAV header from any byte stream
    pub fn from_reader(source: Box<dyn Read + Send>) -> Result<Self, SessionError> {
        let reader = hound::WavReader::new(source).map_err(|e| {
            let failure = match e {
                hound::Error::Unsupported => AcquisitionFailure::Unsupported,
                hound::Error::IoError(_) => AcquisitionFailure::Network,
                _ => AcquisitionFailure::Decode,
            };
            SessionError::acquisition(failure, format!("not a playable WAV stream: {}", e))
        })?;
        Ok(Self { reader })
    }

    pub fn sample_rate(&self) -> u32 {
        self.reader.spec().sample_rate
    }

    pub fn channels(&self) -> usize {
        self.reader.spec().channels as usize
    }

    /// Decode up to `max_frames` interleaved frames into `out`
    ///
    /// Returns the number of samples appended; 0 means end of stream.
    pub fn read_frames(&mut self, out: &mut Vec<f32>, max_frames: usize) -> Result<usize, hound::Error> {
        let spec = self.reader.spec();
        let wanted = max_frames * spec.channels as usize;
        let before = out.len();

        match spec.sample_format {
            hound::SampleFormat::Float => {
                for sample in self.reader.samples::<f32>().take(wanted) {
                    out.push(sample?);
                }
            }
            hound::SampleFormat::Int => {
                let scale = 1.0 / (1u64 << (spec.bits_per_sample - 1)) as f32;
                for sample in self.reader.samples::<i32>().take(wanted) {
                    out.push(sample? as f32 * scale);
                }
            }
        }

        Ok(out.len() - before)
    }
}

fn open_http(url: &str) -> Result<reqwest::blocking::Response, SessionError> {
    let client = reqwest::blocking::Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .timeout(None::<Duration>)
        .build()
        .map_err(|e| SessionError::acquisition(AcquisitionFailure::Network, e.to_string()))?;

    let response = client
        .get(url)
        .send()
        .map_err(|e| SessionError::acquisition(AcquisitionFailure::Network, e.to_string()))?;

    if !response.status().is_success() {
        return Err(SessionError::acquisition(
            AcquisitionFailure::Network,
            format!("{} answered {}", url, response.status()),
        ));
    }
    Ok(response)
}

/// Maps source frames onto device frames (rate and channel count)
///
/// Nearest-frame resampling: cheap, and the analyzer cares about spectra,
/// not audiophile playback.
pub(crate) struct PlaybackCursor {
    src_channels: usize,
    dev_channels: usize,
    /// Source frames per device frame
    step: f64,
    phase: f64,
    current: Vec<f32>,
    has_frame: bool,
}

impl PlaybackCursor {
    pub(crate) fn new(src_rate: u32, src_channels: usize, dev_rate: u32, dev_channels: usize) -> Self {
        let src_channels = src_channels.max(1);
        Self {
            src_channels,
            dev_channels: dev_channels.max(1),
            step: src_rate as f64 / dev_rate.max(1) as f64,
            phase: 1.0,
            current: vec![0.0; src_channels],
            has_frame: false,
        }
    }

    /// Fill `out` (interleaved device frames) from `queue`, appending the mono
    /// mix of every frame actually played to `played`
    ///
    /// Returns the number of device frames that had to be filled with silence.
    pub(crate) fn fill(&mut self, queue: &mut VecDeque<f32>, out: &mut [f32], played: &mut Vec<f32>) -> usize {
        let mut starved = 0;
        for frame in out.chunks_exact_mut(self.dev_channels) {
            while self.phase >= 1.0 {
                self.phase -= 1.0;
                if queue.len() >= self.src_channels {
                    for slot in self.current.iter_mut() {
                        *slot = queue.pop_front().unwrap_or(0.0);
                    }
                    self.has_frame = true;
                } else {
                    self.has_frame = false;
                }
            }
            self.phase += self.step;

            if !self.has_frame {
                frame.fill(0.0);
                starved += 1;
                continue;
            }

            let mono = self.current.iter().sum::<f32>() / self.src_channels as f32;
            if self.dev_channels == 1 {
                frame[0] = mono;
            } else {
                for (c, slot) in frame.iter_mut().enumerate() {
                    *slot = self.current[c % self.src_channels];
                }
            }
            played.push(mono);
        }
        starved
    }
}

/// Internet radio (or file) playback feeding a sample tap
pub struct RadioSource {
    id: SourceId,
    tap: SampleTap,
    stream: Option<Stream>,
    stop: Arc<AtomicBool>,
    reader: Option<thread::JoinHandle<()>>,
}

impl RadioSource {
    /// Connect to `url`, start decoding and start playback
    pub fn open(id: SourceId, url: &str) -> Result<Self, SessionError> {
        let wav = WavStream::open(url)?;
        let src_rate = wav.sample_rate();
        let src_channels = wav.channels();

        let host = cpal::default_host();
        let device = host.default_output_device().ok_or_else(|| {
            SessionError::acquisition(
                AcquisitionFailure::DeviceNotFound,
                "no audio output device found",
            )
        })?;
        let supported = device.default_output_config().map_err(|e| {
            SessionError::acquisition(
                AcquisitionFailure::DeviceBusy,
                format!("failed to get audio config: {}", e),
            )
        })?;

        let sample_format = supported.sample_format();
        let config: StreamConfig = supported.into();
        let dev_rate = config.sample_rate.0;
        let tap = SampleTap::new(dev_rate);

        let queue: PlaybackQueue = Arc::new(Mutex::new(VecDeque::with_capacity(
            src_rate as usize * src_channels * QUEUE_SECONDS,
        )));
        let finished = Arc::new(AtomicBool::new(false));
        let stop = Arc::new(AtomicBool::new(false));

        let playback = Playback {
            queue: Arc::clone(&queue),
            finished: Arc::clone(&finished),
            tap: tap.clone(),
            cursor: PlaybackCursor::new(src_rate, src_channels, dev_rate, config.channels as usize),
            played: Vec::new(),
        };

        let stream = match sample_format {
            SampleFormat::F32 => build_output_stream::<f32>(&device, &config, playback),
            SampleFormat::I16 => build_output_stream::<i16>(&device, &config, playback),
            SampleFormat::U16 => build_output_stream::<u16>(&device, &config, playback),
            other => Err(SessionError::acquisition(
                AcquisitionFailure::Unsupported,
                format!("unsupported output sample format: {:?}", other),
            )),
        }?;

        let reader = spawn_reader_thread(
            wav,
            queue,
            finished,
            Arc::clone(&stop),
            src_rate as usize * src_channels * QUEUE_SECONDS,
        );

        stream.play().map_err(|e| {
            stop.store(true, Ordering::Release);
            SessionError::acquisition(
                AcquisitionFailure::DeviceBusy,
                format!("failed to start audio stream: {}", e),
            )
        })?;

        log::info!(
            "Radio: {} ({}Hz, {} ch) → {} @ {}Hz",
            url,
            src_rate,
            src_channels,
            device.name().unwrap_or_else(|_| "Unknown".to_string()),
            dev_rate
        );

        Ok(Self {
            id,
            tap,
            stream: Some(stream),
            stop,
            reader: Some(reader),
        })
    }
}

impl AudioSource for RadioSource {
    fn id(&self) -> &SourceId {
        &self.id
    }

    fn tap(&self) -> &SampleTap {
        &self.tap
    }

    fn release(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(stream) = self.stream.take() {
            if let Err(e) = stream.pause() {
                log::debug!("Ignoring error while pausing radio playback: {}", e);
            }
            drop(stream);
            log::info!("Released {}", self.id);
        }
        // The reader may sit in a blocking network read; it exits on its own
        // once the read returns and sees the stop flag.
        self.reader.take();
        self.tap.close();
    }
}

impl Drop for RadioSource {
    fn drop(&mut self) {
        self.release();
    }
}

/// State owned by the output callback
struct Playback {
    queue: PlaybackQueue,
    finished: Arc<AtomicBool>,
    tap: SampleTap,
    cursor: PlaybackCursor,
    played: Vec<f32>,
}

impl Playback {
    fn render(&mut self, out: &mut [f32]) {
        self.played.clear();
        let drained = {
            let mut queue = self.queue.lock().unwrap_or_else(PoisonError::into_inner);
            self.cursor.fill(&mut queue, out, &mut self.played);
            queue.is_empty()
        };
        self.tap.push_samples(self.played.iter().copied());

        if drained && self.finished.load(Ordering::Acquire) && self.tap.is_live() {
            log::info!("Radio stream ended");
            self.tap.close();
        }
    }
}

fn build_output_stream<T>(
    device: &cpal::Device,
    config: &StreamConfig,
    mut playback: Playback,
) -> Result<Stream, SessionError>
where
    T: SizedSample + FromSample<f32>,
{
    let err_tap = playback.tap.clone();
    let mut scratch: Vec<f32> = Vec::new();

    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                scratch.resize(data.len(), 0.0);
                playback.render(&mut scratch);
                for (slot, &sample) in data.iter_mut().zip(&scratch) {
                    // Safety limiter: hard clip to ±1.0
                    *slot = T::from_sample(sample.clamp(-1.0, 1.0));
                }
            },
            move |err| match err {
                cpal::StreamError::DeviceNotAvailable => {
                    log::warn!("Audio output device disconnected");
                    err_tap.close();
                }
                other => log::warn!("Audio stream error: {}", other),
            },
            None,
        )
        .map_err(|e| {
            SessionError::acquisition(
                AcquisitionFailure::DeviceBusy,
                format!("failed to build audio stream: {}", e),
            )
        })
}

/// Spawn the decode thread filling the playback queue
fn spawn_reader_thread(
    mut wav: WavStream,
    queue: PlaybackQueue,
    finished: Arc<AtomicBool>,
    stop: Arc<AtomicBool>,
    capacity: usize,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let chunk_len = READ_CHUNK_FRAMES * wav.channels();
        let mut chunk = Vec::with_capacity(chunk_len);
        // Very low sample rates would otherwise never fit a single chunk
        let capacity = capacity.max(chunk_len);

        while !stop.load(Ordering::Acquire) {
            let queued = queue.lock().unwrap_or_else(PoisonError::into_inner).len();
            if queued + chunk_len > capacity {
                thread::sleep(Duration::from_millis(5));
                continue;
            }

            chunk.clear();
            match wav.read_frames(&mut chunk, READ_CHUNK_FRAMES) {
                Ok(0) => break,
                Ok(_) => queue
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .extend(chunk.iter().copied()),
                Err(e) => {
                    log::warn!("Radio stream decode error: {}", e);
                    break;
                }
            }
        }

        finished.store(true, Ordering::Release);
        log::debug!("Radio reader thread exiting");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn wav_bytes(spec: hound::WavSpec, samples: &[i16]) -> Vec<u8> {
        let mut bytes = Vec::new();
        {
            let mut writer = hound::WavWriter::new(Cursor::new(&mut bytes), spec).unwrap();
            for &s in samples {
                writer.write_sample(s).unwrap();
            }
            writer.finalize().unwrap();
        }
        bytes
    }

    fn int_spec(channels: u16) -> hound::WavSpec {
        hound::WavSpec {
            channels,
            sample_rate: 22_050,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        }
    }

    #[test]
    fn test_wav_stream_decodes_and_normalizes() {
        let bytes = wav_bytes(int_spec(2), &[0, 16384, -16384, 32767, 1, 2]);
        let mut wav = WavStream::from_reader(Box::new(Cursor::new(bytes))).unwrap();

        assert_eq!(wav.sample_rate(), 22_050);
        assert_eq!(wav.channels(), 2);

        let mut out = Vec::new();
        assert_eq!(wav.read_frames(&mut out, 2).unwrap(), 4);
        assert_eq!(out, vec![0.0, 0.5, -0.5, 32767.0 / 32768.0]);

        // One frame left, then end of stream
        assert_eq!(wav.read_frames(&mut out, 8).unwrap(), 2);
        assert_eq!(wav.read_frames(&mut out, 8).unwrap(), 0);
    }

    #[test]
    fn test_reader_fills_queue_at_low_sample_rate() {
        let spec = hound::WavSpec {
            sample_rate: 100,
            ..int_spec(1)
        };
        let samples: Vec<i16> = (0..3000).map(|i| (i % 100) as i16).collect();
        let wav = WavStream::from_reader(Box::new(Cursor::new(wav_bytes(spec, &samples)))).unwrap();

        let queue: PlaybackQueue = Arc::new(Mutex::new(VecDeque::new()));
        let finished = Arc::new(AtomicBool::new(false));
        let stop = Arc::new(AtomicBool::new(false));
        let reader = spawn_reader_thread(
            wav,
            Arc::clone(&queue),
            Arc::clone(&finished),
            Arc::clone(&stop),
            100 * QUEUE_SECONDS,
        );

        // Drain like the playback callback until the reader reaches the end
        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        let mut drained = 0;
        while !finished.load(Ordering::Acquire) && std::time::Instant::now() < deadline {
            drained += queue.lock().unwrap().drain(..).count();
            thread::sleep(Duration::from_millis(1));
        }
        stop.store(true, Ordering::Release);
        reader.join().unwrap();
        drained += queue.lock().unwrap().drain(..).count();

        assert!(finished.load(Ordering::Acquire));
        assert_eq!(drained, samples.len());
    }

    #[test]
    fn test_garbage_is_a_decode_failure() {
        let result = WavStream::from_reader(Box::new(Cursor::new(b"ICY 200 OK\r\n\r\nmp3data".to_vec())));
        assert!(matches!(
            result,
            Err(SessionError::SourceAcquisition {
                failure: AcquisitionFailure::Decode,
                ..
            })
        ));
    }

    #[test]
    fn test_missing_file_is_reported() {
        let result = WavStream::open("/definitely/not/here.wav");
        assert!(matches!(
            result,
            Err(SessionError::SourceAcquisition {
                failure: AcquisitionFailure::DeviceNotFound,
                ..
            })
        ));
    }

    #[test]
    fn test_cursor_same_rate_copies_frames() {
        let mut cursor = PlaybackCursor::new(48_000, 2, 48_000, 2);
        let mut queue: VecDeque<f32> = [0.25, 0.75, 0.5, 1.0].into_iter().collect();
        let mut out = [9.0; 4];
        let mut played = Vec::new();

        let starved = cursor.fill(&mut queue, &mut out, &mut played);

        assert_eq!(starved, 0);
        assert_eq!(out, [0.25, 0.75, 0.5, 1.0]);
        assert_eq!(played, vec![0.5, 0.75]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_cursor_upsamples_mono_to_stereo() {
        // 24 kHz mono source on a 48 kHz stereo device: every frame plays twice
        let mut cursor = PlaybackCursor::new(24_000, 1, 48_000, 2);
        let mut queue: VecDeque<f32> = [0.25, -0.25].into_iter().collect();
        let mut out = [0.0; 8];
        let mut played = Vec::new();

        let starved = cursor.fill(&mut queue, &mut out, &mut played);

        assert_eq!(starved, 0);
        assert_eq!(out, [0.25, 0.25, 0.25, 0.25, -0.25, -0.25, -0.25, -0.25]);
        assert_eq!(played.len(), 4);
    }

    #[test]
    fn test_cursor_starves_with_silence() {
        let mut cursor = PlaybackCursor::new(48_000, 1, 48_000, 1);
        let mut queue: VecDeque<f32> = [0.5].into_iter().collect();
        let mut out = [9.0; 3];
        let mut played = Vec::new();

        let starved = cursor.fill(&mut queue, &mut out, &mut played);

        assert_eq!(starved, 2);
        assert_eq!(out, [0.5, 0.0, 0.0]);
        assert_eq!(played, vec![0.5]);
    }
}
