use crate::errors::ClipError;
use crate::types::{CameraDeviceInfo, CameraFormat, CameraFrame, CameraInitParams};
use nokhwa::{
    pixel_format::RgbFormat,
    query,
    utils::{ApiBackend, CameraIndex, RequestedFormat, RequestedFormatType, Resolution},
    CallbackCamera,
};

/// List available cameras via MediaFoundation
pub fn list_cameras() -> Result<Vec<CameraDeviceInfo>, ClipError> {
    let cameras = query(ApiBackend::MediaFoundation)
        .map_err(|e| ClipError::Initialization(format!("Failed to query cameras: {}", e)))?;

    Ok(cameras
        .into_iter()
        .map(|info| {
            CameraDeviceInfo::new(info.index().to_string(), info.human_name())
                .with_description(info.description().to_string())
                .with_formats(common_formats())
        })
        .collect())
}

fn common_formats() -> Vec<CameraFormat> {
    vec![
        CameraFormat::new(1280, 720, 60.0).with_format_type("MJPEG".to_string()),
        CameraFormat::new(1920, 1080, 30.0).with_format_type("MJPEG".to_string()),
        CameraFormat::new(1280, 720, 30.0).with_format_type("NV12".to_string()),
        CameraFormat::new(640, 480, 30.0).with_format_type("NV12".to_string()),
    ]
}

/// Open a camera through the MediaFoundation backend
pub fn initialize_camera(params: CameraInitParams) -> Result<WindowsCamera, ClipError> {
    let index = params
        .device_id
        .parse::<u32>()
        .map_err(|_| ClipError::Initialization("Invalid device ID".to_string()))?;

    let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Exact(
        nokhwa::utils::CameraFormat::new(
            Resolution::new(params.format.width, params.format.height),
            nokhwa::utils::FrameFormat::MJPEG,
            params.format.fps as u32,
        ),
    ));

    let camera = CallbackCamera::new(CameraIndex::Index(index), requested, |_| {})
        .map_err(|e| ClipError::Initialization(format!("Failed to initialize camera: {}", e)))?;

    Ok(WindowsCamera {
        camera,
        device_id: params.device_id,
        format: params.format,
    })
}

/// Windows camera handle
pub struct WindowsCamera {
    camera: CallbackCamera,
    device_id: String,
    format: CameraFormat,
}

impl WindowsCamera {
    pub fn capture_frame(&mut self) -> Result<CameraFrame, ClipError> {
        let frame = self
            .camera
            .poll_frame()
            .map_err(|e| ClipError::Capture(format!("Failed to capture frame: {}", e)))?;

        Ok(CameraFrame::new(
            frame.buffer_bytes().to_vec(),
            frame.resolution().width_x,
            frame.resolution().height_y,
            self.device_id.clone(),
        )
        .with_format("RGB8".to_string()))
    }

    pub fn format(&self) -> &CameraFormat {
        &self.format
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn start_stream(&mut self) -> Result<(), ClipError> {
        self.camera
            .open_stream()
            .map_err(|e| ClipError::Initialization(format!("Failed to start stream: {}", e)))
    }

    pub fn stop_stream(&mut self) -> Result<(), ClipError> {
        self.camera
            .stop_stream()
            .map_err(|e| ClipError::Initialization(format!("Failed to stop stream: {}", e)))
    }
}
