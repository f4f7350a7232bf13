//! CPAL capture and playback streams.
//!
//! Device callbacks only move samples between the hardware buffer and an SPSC
//! ring; all processing happens on the pipeline thread. Input is reduced to
//! mono by taking the first channel, output duplicates the mono signal across
//! every channel.

use crate::io::{capture_ring, playback_ring, RingCapture, RingPlayback};
use crate::{AtomicFlag, Error, Result, ShiftConfig};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use ringbuf::traits::{Consumer, Producer};
use ringbuf::{HeapCons, HeapProd};
use std::sync::Arc;

/// Ring capacity in blocks. Enough to absorb callback jitter without adding
/// more than a few blocks of latency.
const RING_BLOCKS: usize = 4;

/// Wrapper to hold `cpal::Stream` in a `Send` context.
///
/// # Safety
/// `cpal::Stream` is `!Send` due to platform internals. The handle is only
/// created, paused and dropped by the thread that owns the engine.
pub struct StreamHandle(cpal::Stream);

unsafe impl Send for StreamHandle {}

impl StreamHandle {
    pub fn play(&self) -> Result<()> {
        Ok(self.0.play()?)
    }

    pub fn pause(&self) -> Result<()> {
        Ok(self.0.pause()?)
    }
}

/// Open the configured capture device at the stream rate and start it.
pub fn open_input(config: &ShiftConfig) -> Result<(StreamHandle, RingCapture)> {
    let device = input_device(config.input_device)?;
    let supported = device.default_input_config()?;
    let stream_config = stream_config(&supported, config.sample_rate_hz);

    let (producer, capture) = capture_ring(config.block_size * RING_BLOCKS);
    let fault = capture.fault_flag();

    let stream = match supported.sample_format() {
        cpal::SampleFormat::F32 => build_input::<f32>(&device, &stream_config, producer, fault)?,
        cpal::SampleFormat::I16 => build_input::<i16>(&device, &stream_config, producer, fault)?,
        cpal::SampleFormat::U16 => build_input::<u16>(&device, &stream_config, producer, fault)?,
        format => {
            return Err(Error::Device(format!(
                "Unsupported input sample format: {format:?}"
            )));
        }
    };

    stream.play()?;
    tracing::info!(
        device = %device.name().unwrap_or_default(),
        sample_rate = config.sample_rate_hz,
        channels = stream_config.channels,
        "capture stream started"
    );

    Ok((StreamHandle(stream), capture))
}

/// Open the configured playback device at the stream rate and start it.
pub fn open_output(config: &ShiftConfig) -> Result<(StreamHandle, RingPlayback)> {
    let device = output_device(config.output_device)?;
    let supported = device.default_output_config()?;
    let stream_config = stream_config(&supported, config.sample_rate_hz);

    let (playback, consumer) = playback_ring(config.block_size * RING_BLOCKS);
    let fault = playback.fault_flag();

    let stream = match supported.sample_format() {
        cpal::SampleFormat::F32 => build_output::<f32>(&device, &stream_config, consumer, fault)?,
        cpal::SampleFormat::I16 => build_output::<i16>(&device, &stream_config, consumer, fault)?,
        cpal::SampleFormat::U16 => build_output::<u16>(&device, &stream_config, consumer, fault)?,
        format => {
            return Err(Error::Device(format!(
                "Unsupported output sample format: {format:?}"
            )));
        }
    };

    stream.play()?;
    tracing::info!(
        device = %device.name().unwrap_or_default(),
        sample_rate = config.sample_rate_hz,
        channels = stream_config.channels,
        "playback stream started"
    );

    Ok((StreamHandle(stream), playback))
}

pub fn list_input_devices() -> Result<Vec<String>> {
    cpal::default_host()
        .input_devices()?
        .enumerate()
        .map(|(i, d)| Ok(format!("{i}: {}", d.name()?)))
        .collect()
}

pub fn list_output_devices() -> Result<Vec<String>> {
    cpal::default_host()
        .output_devices()?
        .enumerate()
        .map(|(i, d)| Ok(format!("{i}: {}", d.name()?)))
        .collect()
}

fn stream_config(supported: &cpal::SupportedStreamConfig, sample_rate_hz: u32) -> cpal::StreamConfig {
    let mut config = supported.config();
    config.sample_rate = cpal::SampleRate(sample_rate_hz);
    config
}

fn input_device(index: Option<usize>) -> Result<cpal::Device> {
    let host = cpal::default_host();

    match index {
        Some(i) => {
            let devices: Vec<_> = host.input_devices()?.collect();
            let count = devices.len();
            devices.into_iter().nth(i).ok_or_else(|| {
                Error::Device(format!("Input device index {i} out of range ({count} available)"))
            })
        }
        None => host
            .default_input_device()
            .ok_or_else(|| Error::Device("No input device available".into())),
    }
}

fn output_device(index: Option<usize>) -> Result<cpal::Device> {
    let host = cpal::default_host();

    match index {
        Some(i) => {
            let devices: Vec<_> = host.output_devices()?.collect();
            let count = devices.len();
            devices.into_iter().nth(i).ok_or_else(|| {
                Error::Device(format!("Output device index {i} out of range ({count} available)"))
            })
        }
        None => host
            .default_output_device()
            .ok_or_else(|| Error::Device("No output device available".into())),
    }
}

fn build_input<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut producer: HeapProd<f32>,
    fault: Arc<AtomicFlag>,
) -> Result<cpal::Stream>
where
    T: cpal::SizedSample,
    f32: cpal::FromSample<T>,
{
    let channels = config.channels as usize;

    let stream = device.build_input_stream(
        config,
        move |data: &[T], _: &cpal::InputCallbackInfo| {
            capture_first_channel(data, channels, &mut producer, |s| s.to_sample::<f32>());
        },
        move |err| {
            tracing::warn!(%err, "capture stream error");
            fault.set(true);
        },
        None,
    )?;

    Ok(stream)
}

fn build_output<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut consumer: HeapCons<f32>,
    fault: Arc<AtomicFlag>,
) -> Result<cpal::Stream>
where
    T: cpal::SizedSample + cpal::FromSample<f32>,
{
    let channels = config.channels as usize;

    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                for frame in data.chunks_mut(channels) {
                    let value = T::from_sample(consumer.try_pop().unwrap_or(0.0));
                    frame.fill(value);
                }
            }));

            if result.is_err() {
                output_silence(data);
            }
        },
        move |err| {
            tracing::warn!(%err, "playback stream error");
            fault.set(true);
        },
        None,
    )?;

    Ok(stream)
}

/// Push the first channel of every frame into the capture ring.
///
/// A full ring means the pipeline fell behind; the excess is lost. Returns
/// `false` if the copy panicked, in which case the rest of the buffer is
/// dropped.
fn capture_first_channel<T: Copy>(
    data: &[T],
    channels: usize,
    producer: &mut HeapProd<f32>,
    to_f32: impl Fn(T) -> f32,
) -> bool {
    std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        for frame in data.chunks(channels) {
            if producer.try_push(to_f32(frame[0])).is_err() {
                break;
            }
        }
    }))
    .is_ok()
}

/// Output silence (panic recovery).
#[inline]
fn output_silence<T: cpal::SizedSample + cpal::FromSample<f32>>(data: &mut [T]) {
    for sample in data.iter_mut() {
        *sample = T::from_sample(0.0);
    }
}
