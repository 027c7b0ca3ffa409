//! Audio output device.
use chip8::prelude::{SegmentQueue, SquareWave};
use chip8::Hz;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, SizedSample};

use crate::error::AppError;

/// Pitch of the buzzer.
const TONE: Hz = Hz(689);
const AMPLITUDE: i16 = 19_200;

/// Plays the segments pushed to the queue on the default output device.
///
/// Playback stops when this is dropped.
pub struct AudioOutput {
    _stream: cpal::Stream,
    sample_rate: u32,
}

impl AudioOutput {
    pub fn new(queue: SegmentQueue) -> Result<Self, AppError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| AppError::audio("no output device available"))?;
        let supported_config = device.default_output_config().map_err(AppError::audio)?;

        let sample_format = supported_config.sample_format();
        let config: cpal::StreamConfig = supported_config.into();
        let sample_rate = config.sample_rate.0;

        log::info!(
            "audio output: {} ({sample_format}, {} channels, {sample_rate}Hz)",
            device.name().unwrap_or_default(),
            config.channels
        );

        let stream = match sample_format {
            cpal::SampleFormat::I8 => Self::build::<i8>(&device, &config, queue),
            cpal::SampleFormat::I16 => Self::build::<i16>(&device, &config, queue),
            cpal::SampleFormat::I32 => Self::build::<i32>(&device, &config, queue),
            cpal::SampleFormat::I64 => Self::build::<i64>(&device, &config, queue),
            cpal::SampleFormat::U8 => Self::build::<u8>(&device, &config, queue),
            cpal::SampleFormat::U16 => Self::build::<u16>(&device, &config, queue),
            cpal::SampleFormat::U32 => Self::build::<u32>(&device, &config, queue),
            cpal::SampleFormat::U64 => Self::build::<u64>(&device, &config, queue),
            cpal::SampleFormat::F32 => Self::build::<f32>(&device, &config, queue),
            cpal::SampleFormat::F64 => Self::build::<f64>(&device, &config, queue),
            sample_format => {
                return Err(AppError::audio(format!(
                    "unsupported sample format '{sample_format}'"
                )))
            }
        }?;

        stream.play().map_err(AppError::audio)?;

        Ok(Self {
            _stream: stream,
            sample_rate,
        })
    }

    fn build<T>(
        device: &cpal::Device,
        config: &cpal::StreamConfig,
        queue: SegmentQueue,
    ) -> Result<cpal::Stream, AppError>
    where
        T: SizedSample + FromSample<i16>,
    {
        let channels = config.channels as usize;
        let mut synth = SquareWave::new(config.sample_rate.0, TONE, AMPLITUDE);
        // Reused between callbacks, grows to the largest buffer the device asks for.
        let mut scratch: Vec<i16> = Vec::new();

        let err_fn = |err| log::error!("an error occurred on the audio stream: {err}");

        device
            .build_output_stream(
                config,
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                    scratch.resize(data.len(), 0);
                    queue.fill(&mut scratch, channels, &mut synth);
                    for (sample, value) in data.iter_mut().zip(scratch.iter()) {
                        *sample = T::from_sample(*value);
                    }
                },
                err_fn,
                None,
            )
            .map_err(AppError::audio)
    }

    /// Sample rate of the output device, used to size the queued segments.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}
