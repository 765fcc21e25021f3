use crate::error::CaptureError;
use image::RgbImage;
use nokhwa::{
    pixel_format::RgbFormat,
    utils::{CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType},
    Camera,
};
use tracing::{debug, info, warn};

/// Anything that hands out frames on demand.
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<RgbImage, CaptureError>;

    /// Drop the device handle so the next call starts from scratch.
    fn release(&mut self) {}
}

/// Default webcam. The device is opened on first use and reopened after a
/// failed read, so a camera that was busy or unplugged can come back.
pub struct WebcamSource {
    index: u32,
    camera: Option<Camera>,
}

impl WebcamSource {
    pub fn new(index: u32) -> Self {
        Self { index, camera: None }
    }

    fn open(&self) -> Result<Camera, CaptureError> {
        let mut cam = None;
        let mut last_err = None;
        'formats: for (w, h) in [(1280, 720), (640, 480)] {
            for fmt in [FrameFormat::RAWRGB, FrameFormat::MJPEG, FrameFormat::YUYV] {
                let req = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(
                    CameraFormat::new_from(w, h, fmt, 30),
                ));
                match Camera::new(CameraIndex::Index(self.index), req) {
                    Ok(c) => {
                        cam = Some(c);
                        break 'formats;
                    }
                    Err(e) => last_err = Some(e),
                }
            }
        }
        let mut cam = match cam {
            Some(c) => c,
            None => {
                let any = RequestedFormat::new::<RgbFormat>(RequestedFormatType::None);
                Camera::new(CameraIndex::Index(self.index), any).map_err(|e| CaptureError::Open {
                    index: self.index,
                    source: last_err.unwrap_or(e),
                })?
            }
        };
        cam.open_stream().map_err(CaptureError::Stream)?;
        info!(index = self.index, format = ?cam.camera_format(), "camera stream opened");
        Ok(cam)
    }
}

impl FrameSource for WebcamSource {
    fn next_frame(&mut self) -> Result<RgbImage, CaptureError> {
        let mut cam = match self.camera.take() {
            Some(cam) => cam,
            None => self.open()?,
        };
        match read_frame(&mut cam) {
            Ok(img) => {
                self.camera = Some(cam);
                Ok(img)
            }
            Err(e) => {
                stop(cam, self.index);
                Err(e)
            }
        }
    }

    fn release(&mut self) {
        if let Some(cam) = self.camera.take() {
            stop(cam, self.index);
        }
    }
}

fn read_frame(cam: &mut Camera) -> Result<RgbImage, CaptureError> {
    let frame = cam.frame().map_err(CaptureError::Read)?;
    let img = frame
        .decode_image::<RgbFormat>()
        .map_err(CaptureError::Decode)?;
    if img.width() == 0 || img.height() == 0 {
        return Err(CaptureError::EmptyFrame);
    }
    Ok(img)
}

fn stop(mut cam: Camera, index: u32) {
    if let Err(e) = cam.stop_stream() {
        warn!("failed to stop camera stream: {e}");
    }
    debug!(index, "camera released");
}

impl Drop for WebcamSource {
    fn drop(&mut self) {
        self.release();
    }
}
