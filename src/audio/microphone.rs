//! Microphone capture via cpal.
//!
//! The stream is opened raw: cpal applies no echo cancellation, noise
//! suppression or gain control, which is what a spectrogram wants.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, Stream, StreamConfig};

use super::{AudioSource, SampleTap, SourceId};
use crate::error::{AcquisitionFailure, SessionError};

/// Live microphone capture feeding a sample tap
pub struct MicrophoneSource {
    id: SourceId,
    tap: SampleTap,
    stream: Option<Stream>,
}

impl MicrophoneSource {
    /// Open the named input device (or the host default) and start capturing
    pub fn open(id: SourceId, device_name: Option<&str>) -> Result<Self, SessionError> {
        let host = cpal::default_host();
        let device = pick_input_device(&host, device_name)?;
        let name = device.name().unwrap_or_else(|_| "Unknown".to_string());

        let supported = device.default_input_config().map_err(|e| match e {
            cpal::DefaultStreamConfigError::DeviceNotAvailable => SessionError::acquisition(
                AcquisitionFailure::DeviceNotFound,
                format!("input device '{}' is not available", name),
            ),
            cpal::DefaultStreamConfigError::StreamTypeNotSupported => SessionError::acquisition(
                AcquisitionFailure::Unsupported,
                format!("input device '{}' cannot capture", name),
            ),
            other => backend_error(&other.to_string()),
        })?;

        let sample_format = supported.sample_format();
        let config: StreamConfig = supported.into();
        let channels = config.channels as usize;
        let tap = SampleTap::new(config.sample_rate.0);

        let stream = build_input_stream(&device, &config, sample_format, tap.clone())?;
        stream.play().map_err(|e| match e {
            cpal::PlayStreamError::DeviceNotAvailable => SessionError::acquisition(
                AcquisitionFailure::DeviceNotFound,
                format!("input device '{}' disappeared", name),
            ),
            other => backend_error(&other.to_string()),
        })?;

        log::info!(
            "Microphone: {} @ {}Hz, {} ch, {:?}",
            name,
            config.sample_rate.0,
            channels,
            sample_format
        );

        Ok(Self {
            id,
            tap,
            stream: Some(stream),
        })
    }
}

impl AudioSource for MicrophoneSource {
    fn id(&self) -> &SourceId {
        &self.id
    }

    fn tap(&self) -> &SampleTap {
        &self.tap
    }

    fn release(&mut self) {
        if let Some(stream) = self.stream.take() {
            if let Err(e) = stream.pause() {
                log::debug!("Ignoring error while pausing microphone: {}", e);
            }
            drop(stream);
            log::info!("Released {}", self.id);
        }
        self.tap.close();
    }
}

impl Drop for MicrophoneSource {
    fn drop(&mut self) {
        self.release();
    }
}

fn pick_input_device(
    host: &cpal::Host,
    device_name: Option<&str>,
) -> Result<cpal::Device, SessionError> {
    match device_name {
        None => host.default_input_device().ok_or_else(|| {
            SessionError::acquisition(
                AcquisitionFailure::DeviceNotFound,
                "no audio input device available",
            )
        }),
        Some(wanted) => {
            let devices = host
                .input_devices()
                .map_err(|e| backend_error(&e.to_string()))?;
            devices
                .into_iter()
                .find(|d| d.name().map(|n| n == wanted).unwrap_or(false))
                .ok_or_else(|| {
                    SessionError::acquisition(
                        AcquisitionFailure::DeviceNotFound,
                        format!("no input device named '{}'", wanted),
                    )
                })
        }
    }
}

fn build_input_stream(
    device: &cpal::Device,
    config: &StreamConfig,
    sample_format: SampleFormat,
    tap: SampleTap,
) -> Result<Stream, SessionError> {
    let channels = config.channels as usize;
    let err_tap = tap.clone();
    let err_fn = move |err: cpal::StreamError| match err {
        cpal::StreamError::DeviceNotAvailable => {
            log::warn!("Microphone disconnected");
            err_tap.close();
        }
        other => log::warn!("Microphone stream error: {}", other),
    };

    let result = match sample_format {
        SampleFormat::F32 => device.build_input_stream(
            config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| tap.push_interleaved(data, channels),
            err_fn,
            None,
        ),
        SampleFormat::I16 => {
            let mut converted = Vec::new();
            device.build_input_stream(
                config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    converted.clear();
                    converted.extend(data.iter().map(|&s| i16_to_f32(s)));
                    tap.push_interleaved(&converted, channels);
                },
                err_fn,
                None,
            )
        }
        SampleFormat::U16 => {
            let mut converted = Vec::new();
            device.build_input_stream(
                config,
                move |data: &[u16], _: &cpal::InputCallbackInfo| {
                    converted.clear();
                    converted.extend(data.iter().map(|&s| u16_to_f32(s)));
                    tap.push_interleaved(&converted, channels);
                },
                err_fn,
                None,
            )
        }
        other => {
            return Err(SessionError::acquisition(
                AcquisitionFailure::Unsupported,
                format!("unsupported input sample format: {:?}", other),
            ))
        }
    };

    result.map_err(|e| match e {
        cpal::BuildStreamError::DeviceNotAvailable => SessionError::acquisition(
            AcquisitionFailure::DeviceNotFound,
            "input device is not available",
        ),
        cpal::BuildStreamError::StreamConfigNotSupported => SessionError::acquisition(
            AcquisitionFailure::Unsupported,
            "input device rejected its own default configuration",
        ),
        other => backend_error(&other.to_string()),
    })
}

fn i16_to_f32(sample: i16) -> f32 {
    sample as f32 / i16::MAX as f32
}

fn u16_to_f32(sample: u16) -> f32 {
    (sample as f32 / u16::MAX as f32) * 2.0 - 1.0
}

/// Backends only report free-form text; sort it into a failure kind
fn backend_error(message: &str) -> SessionError {
    SessionError::acquisition(classify_backend_message(message), message.to_string())
}

fn classify_backend_message(message: &str) -> AcquisitionFailure {
    let lower = message.to_lowercase();
    if lower.contains("permission") || lower.contains("denied") || lower.contains("not authorized")
    {
        AcquisitionFailure::PermissionDenied
    } else if lower.contains("busy") || lower.contains("in use") || lower.contains("exclusive") {
        AcquisitionFailure::DeviceBusy
    } else if lower.contains("no such") || lower.contains("not found") {
        AcquisitionFailure::DeviceNotFound
    } else {
        AcquisitionFailure::Backend
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_sample_conversion() {
        assert_eq!(i16_to_f32(0), 0.0);
        assert_eq!(i16_to_f32(i16::MAX), 1.0);
        assert!((i16_to_f32(i16::MIN) + 1.0).abs() < 1e-4);

        assert_eq!(u16_to_f32(0), -1.0);
        assert_eq!(u16_to_f32(u16::MAX), 1.0);
        assert!(u16_to_f32(u16::MAX / 2).abs() < 1e-4);
    }

    #[test]
    fn test_backend_message_classification() {
        assert_eq!(
            classify_backend_message("Permission denied (os error 13)"),
            AcquisitionFailure::PermissionDenied
        );
        assert_eq!(
            classify_backend_message("Device or resource busy"),
            AcquisitionFailure::DeviceBusy
        );
        assert_eq!(
            classify_backend_message("ALSA function 'snd_pcm_open' failed: No such device"),
            AcquisitionFailure::DeviceNotFound
        );
        assert_eq!(
            classify_backend_message("something odd"),
            AcquisitionFailure::Backend
        );
    }

    #[test]
    fn test_unknown_backend_error_is_not_reported_busy() {
        let error = backend_error("The requested stream type is not available");
        assert!(matches!(
            error,
            SessionError::SourceAcquisition {
                failure: AcquisitionFailure::Backend,
                ..
            }
        ));
        assert_eq!(
            error.to_string(),
            "could not acquire audio source (audio backend error): \
             The requested stream type is not available"
        );
    }
}
