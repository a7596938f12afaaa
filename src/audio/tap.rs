//! Shared ring of the most recent mono samples produced by a source.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, TryLockError};

use crate::params::MAX_FFT_SIZE;

struct TapState {
    samples: VecDeque<f32>,
    capacity: usize,
    /// Total samples ever pushed (lets readers detect fresh data)
    written: u64,
}

/// Thread-safe sample tap (audio thread writes, render thread reads)
#[derive(Clone)]
pub struct SampleTap {
    state: Arc<Mutex<TapState>>,
    live: Arc<AtomicBool>,
    sample_rate: u32,
}

impl SampleTap {
    /// Tap large enough for the biggest analyzer window
    pub fn new(sample_rate: u32) -> Self {
        Self::with_capacity(MAX_FFT_SIZE, sample_rate)
    }

    pub fn with_capacity(capacity: usize, sample_rate: u32) -> Self {
        let capacity = capacity.max(1);
        Self {
            state: Arc::new(Mutex::new(TapState {
                samples: VecDeque::with_capacity(capacity),
                capacity,
                written: 0,
            })),
            live: Arc::new(AtomicBool::new(true)),
            sample_rate,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Append mono samples, evicting the oldest beyond capacity
    pub fn push_samples<I>(&self, samples: I)
    where
        I: IntoIterator<Item = f32>,
    {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        for sample in samples {
            if state.samples.len() == state.capacity {
                state.samples.pop_front();
            }
            state.samples.push_back(sample);
            state.written += 1;
        }
    }

    /// Append interleaved frames, averaging channels down to mono
    pub fn push_interleaved(&self, data: &[f32], channels: usize) {
        let channels = channels.max(1);
        if channels == 1 {
            self.push_samples(data.iter().copied());
            return;
        }
        let scale = 1.0 / channels as f32;
        self.push_samples(
            data.chunks_exact(channels)
                .map(|frame| frame.iter().sum::<f32>() * scale),
        );
    }

    /// Copy the most recent `out.len()` samples into `out` if anything arrived
    /// after `last_seen`
    ///
    /// Never blocks: returns `None` when there is nothing new or the writer
    /// currently holds the lock. Missing history is zero-filled at the front.
    pub fn try_snapshot(&self, out: &mut [f32], last_seen: u64) -> Option<u64> {
        let state = match self.state.try_lock() {
            Ok(state) => state,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => return None,
        };
        if state.written == last_seen {
            return None;
        }

        let available = state.samples.len().min(out.len());
        let pad = out.len() - available;
        out[..pad].fill(0.0);
        let skip = state.samples.len() - available;
        for (slot, &sample) in out[pad..].iter_mut().zip(state.samples.iter().skip(skip)) {
            *slot = sample;
        }
        Some(state.written)
    }

    /// Total samples pushed so far
    pub fn written(&self) -> u64 {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .written
    }

    /// Mark the producing source as finished
    pub fn close(&self) {
        self.live.store(false, Ordering::Release);
    }

    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_zero_pads_short_history() {
        let tap = SampleTap::with_capacity(8, 48_000);
        tap.push_samples([1.0, 2.0, 3.0]);

        let mut out = [9.0; 5];
        let seen = tap.try_snapshot(&mut out, 0);

        assert_eq!(seen, Some(3));
        assert_eq!(out, [0.0, 0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_snapshot_keeps_most_recent_samples() {
        let tap = SampleTap::with_capacity(4, 48_000);
        tap.push_samples((0..10).map(|i| i as f32));

        let mut out = [0.0; 3];
        tap.try_snapshot(&mut out, 0);
        assert_eq!(out, [7.0, 8.0, 9.0]);

        let mut wide = [0.0; 6];
        tap.try_snapshot(&mut wide, 0);
        assert_eq!(wide, [0.0, 0.0, 6.0, 7.0, 8.0, 9.0]);
    }

    #[test]
    fn test_snapshot_reports_no_new_data() {
        let tap = SampleTap::with_capacity(4, 48_000);
        tap.push_samples([0.5]);

        let mut out = [0.0; 2];
        let seen = tap.try_snapshot(&mut out, 0).unwrap();
        assert_eq!(tap.try_snapshot(&mut out, seen), None);

        tap.push_samples([0.25]);
        assert_eq!(tap.try_snapshot(&mut out, seen), Some(seen + 1));
    }

    #[test]
    fn test_interleaved_mixdown() {
        let tap = SampleTap::with_capacity(4, 44_100);
        tap.push_interleaved(&[1.0, 0.0, 0.5, 0.5, -1.0, 1.0], 2);

        let mut out = [9.0; 3];
        tap.try_snapshot(&mut out, 0);
        assert_eq!(out, [0.5, 0.5, 0.0]);
        assert_eq!(tap.written(), 3);
    }

    #[test]
    fn test_close_is_shared_between_clones() {
        let tap = SampleTap::new(44_100);
        let writer = tap.clone();
        assert!(tap.is_live());

        writer.close();
        assert!(!tap.is_live());
    }
}
