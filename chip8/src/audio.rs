//! Playback queue bridging the sound timer to an audio device.
//!
//! Every timer tick the interpreter thread appends segments describing how
//! long the tone should be on, and how long it should be silent. The audio
//! device pulls from the front of the queue in its own callback, at its own
//! cadence, often stopping halfway through a segment.
use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, MutexGuard},
};

use crate::{constants::*, cpu::TimerTick, vm::Hz};

/// Default number of segments held before the oldest are dropped.
///
/// Two segments are produced per tick, so this is about four seconds of audio.
pub const DEFAULT_QUEUE_CAPACITY: usize = 512;

/// A run of samples with the tone either on or off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    /// Remaining number of sample frames.
    pub samples: u32,
    pub tone: bool,
}

impl Segment {
    pub fn on(samples: u32) -> Self {
        Self {
            samples,
            tone: true,
        }
    }

    pub fn off(samples: u32) -> Self {
        Self {
            samples,
            tone: false,
        }
    }
}

/// Segments covering a batch of timer ticks.
///
/// The tone is on for the ticks the sound timer was counting down, and off
/// for the remainder.
pub fn tick_segments(sample_rate: u32, tick: TimerTick) -> [Segment; 2] {
    let rate = sample_rate as u64;
    let freq = TIMER_FREQUENCY;
    let silent = tick.ticks.saturating_sub(tick.sound_ticks) as u64;
    let samples = |ticks: u64| u32::try_from(rate * ticks / freq).unwrap_or(u32::MAX);
    [
        Segment::on(samples(tick.sound_ticks as u64)),
        Segment::off(samples(silent)),
    ]
}

/// Square wave tone generator.
#[derive(Debug, Clone)]
pub struct SquareWave {
    /// Number of sample frames the wave stays high, and then low.
    half_period: u32,
    amplitude: i16,
    /// Position within the current period.
    phase: u32,
}

impl SquareWave {
    pub fn new(sample_rate: u32, tone: Hz, amplitude: i16) -> Self {
        let half_period = (sample_rate as u64 / tone.0.max(1).saturating_mul(2)).max(1) as u32;
        Self {
            half_period,
            amplitude,
            phase: 0,
        }
    }

    /// Next sample of the wave.
    #[inline]
    pub fn next_sample(&mut self) -> i16 {
        let high = self.phase < self.half_period;
        self.phase = (self.phase + 1) % (self.half_period * 2);
        if high {
            self.amplitude
        } else {
            -self.amplitude
        }
    }
}

impl Default for SquareWave {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_RATE, Hz(689), 19_200)
    }
}

struct QueueState {
    segments: VecDeque<Segment>,
    capacity: usize,
    /// Sample frames thrown away because the consumer fell behind.
    dropped: u64,
}

/// Thread safe, bounded queue of audio segments.
///
/// Cloning the queue creates another handle to the same segments, so one
/// can be moved into the audio callback.
#[derive(Clone)]
pub struct SegmentQueue {
    inner: Arc<Mutex<QueueState>>,
}

impl SegmentQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(QueueState {
                segments: VecDeque::with_capacity(capacity),
                capacity: capacity.max(1),
                dropped: 0,
            })),
        }
    }

    /// Lock the queue.
    ///
    /// The state is always left consistent between operations, so a panic
    /// on the other side does not invalidate it.
    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Append a segment to the back of the queue.
    ///
    /// Empty segments are ignored, and a segment with the same tone as the
    /// last one is merged into it. When the queue is full, the oldest
    /// segment is dropped to keep latency bounded.
    pub fn push(&self, segment: Segment) {
        if segment.samples == 0 {
            return;
        }

        let mut state = self.lock();

        if let Some(back) = state.segments.back_mut() {
            if back.tone == segment.tone {
                back.samples = back.samples.saturating_add(segment.samples);
                return;
            }
        }

        if state.segments.len() >= state.capacity {
            if let Some(oldest) = state.segments.pop_front() {
                state.dropped += oldest.samples as u64;
                log::warn!(
                    "audio queue full, dropped {} samples ({} total)",
                    oldest.samples,
                    state.dropped
                );
            }
        }

        state.segments.push_back(segment);
    }

    /// Append the segments for a batch of timer ticks.
    pub fn push_tick(&self, sample_rate: u32, tick: TimerTick) {
        for segment in tick_segments(sample_rate, tick) {
            self.push(segment);
        }
    }

    /// Fill an interleaved output buffer from the front of the queue.
    ///
    /// The same sample is written to every channel of a frame. A segment is
    /// only removed once all its samples have been played; otherwise its
    /// remaining count is reduced in place. Whatever is left of the buffer
    /// when the queue runs dry is filled with silence.
    ///
    /// Returns the number of frames taken from the queue.
    pub fn fill(&self, output: &mut [i16], channels: usize, synth: &mut SquareWave) -> usize {
        let channels = channels.max(1);
        let mut frames = output.chunks_mut(channels);
        let mut consumed = 0;

        {
            let mut state = self.lock();

            while let Some(front) = state.segments.front_mut() {
                let mut played = 0;
                while played < front.samples {
                    match frames.next() {
                        Some(frame) => {
                            let value = if front.tone { synth.next_sample() } else { 0 };
                            frame.fill(value);
                            played += 1;
                        }
                        None => break,
                    }
                }
                front.samples -= played;
                consumed += played as usize;

                if front.samples == 0 {
                    state.segments.pop_front();
                } else {
                    // Output buffer is full.
                    break;
                }
            }
        }

        for frame in frames {
            frame.fill(0);
        }

        consumed
    }

    /// Number of segments waiting to be played.
    pub fn len(&self) -> usize {
        self.lock().segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().segments.is_empty()
    }

    /// Total number of sample frames waiting to be played.
    pub fn queued_samples(&self) -> u64 {
        self.lock().segments.iter().map(|s| s.samples as u64).sum()
    }

    /// Total number of sample frames dropped because the queue was full.
    pub fn dropped_samples(&self) -> u64 {
        self.lock().dropped
    }

    pub fn front(&self) -> Option<Segment> {
        self.lock().segments.front().copied()
    }
}

impl Default for SegmentQueue {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_CAPACITY)
    }
}
