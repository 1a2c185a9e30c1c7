use std::io::{Cursor, ErrorKind};
use std::path::Path;
use std::time::Duration;

use image::codecs::gif::GifDecoder;
use image::codecs::webp::WebPDecoder;
use image::{AnimationDecoder, DynamicImage, ImageError, ImageFormat, RgbaImage};
use tracing::debug;

use crate::error::{DecodeError, FileActionError};
use crate::viewer::{Animation, Decoded, Decoder, Frame};

/// Frame delays shorter than this are treated as unset.
const MIN_FRAME_DELAY: Duration = Duration::from_millis(20);
const DEFAULT_FRAME_DELAY: Duration = Duration::from_millis(100);

/// Decoder backed by the `image` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageDecoder;

impl Decoder for ImageDecoder {
    fn decode(&self, path: &Path) -> Result<Decoded, DecodeError> {
        decode_file(path)
    }
}

/// True for files whose extension maps to a format we can read.
pub fn is_image(path: &Path) -> bool {
    ImageFormat::from_path(path)
        .map(|format| format.reading_enabled())
        .unwrap_or(false)
}

fn map_image_error(path: &Path, err: ImageError) -> DecodeError {
    match err {
        ImageError::Unsupported(_) => DecodeError::Unsupported(path.to_path_buf()),
        ImageError::IoError(io) if io.kind() == ErrorKind::NotFound => {
            DecodeError::Vanished(path.to_path_buf())
        }
        other => DecodeError::Corrupt {
            path: path.to_path_buf(),
            reason: other.to_string(),
        },
    }
}

fn frame_delay(frame: &image::Frame) -> Duration {
    let delay = Duration::from(frame.delay());
    if delay < MIN_FRAME_DELAY {
        DEFAULT_FRAME_DELAY
    } else {
        delay
    }
}

fn collect_animation<'a>(
    path: &Path,
    decoder: impl AnimationDecoder<'a>,
) -> Result<Option<Animation>, DecodeError> {
    let frames = decoder
        .into_frames()
        .collect_frames()
        .map_err(|err| map_image_error(path, err))?;
    if frames.len() < 2 {
        return Ok(None);
    }
    let frames = frames
        .into_iter()
        .map(|frame| Frame {
            delay: frame_delay(&frame),
            image: frame.into_buffer(),
        })
        .collect();
    Ok(Animation::new(frames))
}

/// Decodes `path` into a static bitmap or an animation.
///
/// Single-frame GIF/WebP files are returned as static images.
pub fn decode_file(path: &Path) -> Result<Decoded, DecodeError> {
    let bytes = std::fs::read(path).map_err(|err| match err.kind() {
        ErrorKind::NotFound => DecodeError::Vanished(path.to_path_buf()),
        _ => DecodeError::Corrupt {
            path: path.to_path_buf(),
            reason: err.to_string(),
        },
    })?;

    let format = match image::guess_format(&bytes) {
        Ok(format) => format,
        Err(_) => ImageFormat::from_path(path)
            .map_err(|_| DecodeError::Unsupported(path.to_path_buf()))?,
    };

    let animation = match format {
        ImageFormat::Gif => {
            let decoder =
                GifDecoder::new(Cursor::new(&bytes)).map_err(|err| map_image_error(path, err))?;
            collect_animation(path, decoder)?
        }
        ImageFormat::WebP => {
            let decoder =
                WebPDecoder::new(Cursor::new(&bytes)).map_err(|err| map_image_error(path, err))?;
            if decoder.has_animation() {
                collect_animation(path, decoder)?
            } else {
                None
            }
        }
        _ => None,
    };

    if let Some(animation) = animation {
        debug!(frames = animation.len(), "Decoded animation {}", path.display());
        return Ok(Decoded::Animated(animation));
    }

    let image = image::load_from_memory_with_format(&bytes, format)
        .map_err(|err| map_image_error(path, err))?;
    Ok(Decoded::Static(image.to_rgba8()))
}

/// Writes `image` back to `path` in the format implied by its extension.
pub fn save_image(path: &Path, image: &RgbaImage) -> Result<(), FileActionError> {
    let save_error = |source| FileActionError::Save {
        path: path.to_path_buf(),
        source,
    };
    let format = ImageFormat::from_path(path).map_err(save_error)?;

    // JPEG has no alpha channel.
    let result = if format == ImageFormat::Jpeg {
        DynamicImage::ImageRgba8(image.clone())
            .to_rgb8()
            .save_with_format(path, format)
    } else {
        image.save_with_format(path, format)
    };
    result.map_err(save_error)
}
