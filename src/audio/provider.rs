use super::{AudioSource, MicrophoneSource, RadioSource, SourceProvider, SourceRequest};
use crate::error::SessionError;

/// Opens real devices: cpal capture for the microphone, cpal playback for radio
#[derive(Debug, Default)]
pub struct DeviceSourceProvider;

impl DeviceSourceProvider {
    pub fn new() -> Self {
        Self
    }
}

impl SourceProvider for DeviceSourceProvider {
    fn acquire(&mut self, request: &SourceRequest) -> Result<Box<dyn AudioSource>, SessionError> {
        let id = request.source_id();
        log::info!("Connecting {}", id);

        match request {
            SourceRequest::Microphone { device } => {
                Ok(Box::new(MicrophoneSource::open(id, device.as_deref())?))
            }
            SourceRequest::Radio { url } => Ok(Box::new(RadioSource::open(id, url)?)),
        }
    }
}
