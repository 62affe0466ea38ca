//! Bitmap loading and display-box scaling

use crate::types::SampleError;
use image::RgbaImage;
use std::time::Duration;

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Smallest sampling grid dimension. Tiny display boxes still get a usable grid.
pub const MIN_GRID_DIM: u32 = 10;

/// Load and decode a bitmap from a filesystem path or an http(s) URL.
/// One attempt only; callers surface failures through the fallback path.
pub fn load_bitmap(source: &str) -> Result<RgbaImage, SampleError> {
    let bytes = if source.starts_with("http://") || source.starts_with("https://") {
        fetch_remote(source)?
    } else {
        std::fs::read(source).map_err(|e| SampleError::Load(format!("read '{}': {}", source, e)))?
    };

    let decoded = image::load_from_memory(&bytes)
        .map_err(|e| SampleError::Load(format!("decode '{}': {}", source, e)))?;
    Ok(decoded.to_rgba8())
}

fn fetch_remote(url: &str) -> Result<Vec<u8>, SampleError> {
    let agent = build_agent();
    let response = agent
        .get(url)
        .call()
        .map_err(|e| SampleError::Load(format!("fetch '{}': {}", url, e)))?;

    let mut reader = response.into_body().into_reader();
    let mut bytes = Vec::new();
    std::io::Read::read_to_end(&mut reader, &mut bytes)
        .map_err(|e| SampleError::Load(format!("read body '{}': {}", url, e)))?;
    Ok(bytes)
}

fn build_agent() -> ureq::Agent {
    let config = ureq::Agent::config_builder()
        .timeout_global(Some(Duration::from_secs(REQUEST_TIMEOUT_SECS)))
        .build();
    config.into()
}

/// Scale a decoded bitmap to the sampling grid implied by the display width.
/// Grid width is the display width floored at 10 px; height follows the
/// intrinsic aspect ratio, also floored at 10 px.
pub fn resize_to_grid(bitmap: &RgbaImage, target_width: u32) -> Result<RgbaImage, SampleError> {
    let (iw, ih) = bitmap.dimensions();
    if iw == 0 || ih == 0 {
        return Err(SampleError::Draw(
            "source bitmap has a zero dimension".to_string(),
        ));
    }

    let width = target_width.max(MIN_GRID_DIM);
    let height = ((width as f32 * ih as f32 / iw as f32).floor() as u32).max(MIN_GRID_DIM);
    Ok(image::imageops::resize(
        bitmap,
        width,
        height,
        image::imageops::FilterType::Triangle,
    ))
}
