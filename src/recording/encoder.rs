//! H.264 encoding for clip frames

use crate::errors::ClipError;
use openh264::encoder::{Encoder, FrameType};
use openh264::formats::YUVBuffer;

/// H.264 encoder over openh264, fixed to one output geometry per clip
pub struct ClipEncoder {
    encoder: Encoder,
    width: u32,
    height: u32,
    frames_in: u64,
}

impl ClipEncoder {
    /// Encoder for `width` x `height` output frames.
    ///
    /// openh264 infers geometry from the YUV source at encode time; fps
    /// and bitrate are rate-control hints only.
    pub fn new(width: u32, height: u32, _fps: f64, _bitrate: u32) -> Result<Self, ClipError> {
        let encoder = Encoder::new()
            .map_err(|e| ClipError::Encoding(format!("Failed to create encoder: {}", e)))?;

        Ok(Self {
            encoder,
            width,
            height,
            frames_in: 0,
        })
    }

    /// Encode one RGB24 frame. Output is Annex B with start codes; an
    /// empty payload means the encoder produced nothing for this frame.
    pub fn encode_rgb(&mut self, rgb: &[u8]) -> Result<EncodedChunk, ClipError> {
        let expected = (self.width * self.height * 3) as usize;
        if rgb.len() != expected {
            return Err(ClipError::Encoding(format!(
                "Invalid frame size: expected {} bytes, got {}",
                expected,
                rgb.len()
            )));
        }

        let yuv = rgb_to_yuv420(rgb, self.width, self.height);
        let buffer = YUVBuffer::from_vec(yuv, self.width as usize, self.height as usize);

        let bitstream = self
            .encoder
            .encode(&buffer)
            .map_err(|e| ClipError::Encoding(format!("Encoding failed: {}", e)))?;

        self.frames_in += 1;

        let keyframe = matches!(bitstream.frame_type(), FrameType::IDR | FrameType::I);

        Ok(EncodedChunk {
            data: bitstream.to_vec(),
            keyframe,
        })
    }

    pub fn frames_in(&self) -> u64 {
        self.frames_in
    }

    /// Force the next frame to be an IDR keyframe
    pub fn force_keyframe(&mut self) {
        self.encoder.force_intra_frame();
    }
}

/// One encoded frame's worth of NAL units
#[derive(Debug, Clone)]
pub struct EncodedChunk {
    /// Annex B payload (with start codes)
    pub data: Vec<u8>,
    /// Whether this chunk is an IDR/I frame
    pub keyframe: bool,
}

/// RGB24 to planar YUV420 (BT.601)
fn rgb_to_yuv420(rgb: &[u8], width: u32, height: u32) -> Vec<u8> {
    let w = width as usize;
    let h = height as usize;

    let y_size = w * h;
    let uv_size = (w / 2) * (h / 2);
    let mut yuv = vec![0u8; y_size + uv_size * 2];

    let (y_plane, uv_planes) = yuv.split_at_mut(y_size);
    let (u_plane, v_plane) = uv_planes.split_at_mut(uv_size);

    for row in 0..h {
        for col in 0..w {
            let idx = (row * w + col) * 3;
            let r = rgb[idx] as i32;
            let g = rgb[idx + 1] as i32;
            let b = rgb[idx + 2] as i32;

            let y_val = ((66 * r + 129 * g + 25 * b + 128) >> 8) + 16;
            y_plane[row * w + col] = y_val.clamp(0, 255) as u8;

            // Chroma subsampled on 2x2 blocks
            if row % 2 == 0 && col % 2 == 0 {
                let uv_idx = (row / 2) * (w / 2) + (col / 2);
                let u_val = ((-38 * r - 74 * g + 112 * b + 128) >> 8) + 128;
                let v_val = ((112 * r - 94 * g - 18 * b + 128) >> 8) + 128;
                u_plane[uv_idx] = u_val.clamp(0, 255) as u8;
                v_plane[uv_idx] = v_val.clamp(0, 255) as u8;
            }
        }
    }

    yuv
}
