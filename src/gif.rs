//! GIF animation reading and writing

use crate::error::{Error, Result};
use crate::output::{ensure_parent, OutputError};
use crate::svg::FrameSet;
use image::codecs::gif::{GifDecoder, GifEncoder, Repeat};
use image::{AnimationDecoder, Frame, RgbaImage};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Render a sequence of frames as an animated GIF.
///
/// # Arguments
///
/// * `frames` - The image frames to include in the animation
/// * `duration_ms` - Duration per frame in milliseconds, rounded to the
///   nearest centisecond (at least one)
/// * `loop_anim` - Whether the animation should loop infinitely
/// * `path` - Output file path
pub fn render_gif(
    frames: &[RgbaImage],
    duration_ms: u32,
    loop_anim: bool,
    path: &Path,
) -> std::result::Result<(), OutputError> {
    if frames.is_empty() {
        return Ok(());
    }

    ensure_parent(path)?;
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let mut encoder = GifEncoder::new(writer);

    let repeat = if loop_anim {
        Repeat::Infinite
    } else {
        Repeat::Finite(0)
    };
    encoder.set_repeat(repeat)?;

    let delay_cs = delay_centiseconds(duration_ms);

    for rgba_image in frames {
        let delay = image::Delay::from_numer_denom_ms(delay_cs * 10, 1);
        let frame = Frame::from_parts(rgba_image.clone(), 0, 0, delay);
        encoder.encode_frame(frame)?;
    }

    log::info!("wrote {} ({} frames)", path.display(), frames.len());
    Ok(())
}

/// GIF delays are stored as a 16-bit count of centiseconds.
fn delay_centiseconds(duration_ms: u32) -> u32 {
    (duration_ms.saturating_add(5) / 10).clamp(1, u16::MAX as u32)
}

/// Read the frames of an animated GIF with their delays in milliseconds.
///
/// Frames come back fully composited onto the logical screen. At most
/// `max_frames` frames are read when given.
pub fn load_gif_frames(path: &Path, max_frames: Option<usize>) -> Result<FrameSet> {
    let file = File::open(path)?;
    let decoder = GifDecoder::new(BufReader::new(file))?;

    let mut images = Vec::new();
    let mut delays_ms = Vec::new();
    for frame in decoder.into_frames().take(max_frames.unwrap_or(usize::MAX)) {
        let frame = frame?;
        let (numer, denom) = frame.delay().numer_denom_ms();
        delays_ms.push(if denom == 0 { 0 } else { numer / denom });
        images.push(frame.into_buffer());
    }

    if images.is_empty() {
        return Err(Error::invalid_image(format!("{} has no frames", path.display())));
    }
    log::debug!("read {} frames from {}", images.len(), path.display());
    FrameSet::with_delays(images, delays_ms)
}
