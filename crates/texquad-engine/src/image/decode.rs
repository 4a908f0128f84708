use std::path::Path;

use super::{Image, ImageError, BYTES_PER_PIXEL};

/// `.k` header: i32 width, i32 height, 4-byte FourCC, all little-endian.
const K_HEADER_LEN: usize = 12;

/// How the bytes of an image file are laid out.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ImageContainer {
    /// Kinc `.k`: fixed header followed by an LZ4 or raw RGBA8 payload.
    Kinc,
    /// Any format the `image` crate can sniff (PNG, JPEG, BMP).
    Encoded,
}

impl ImageContainer {
    /// Picks the container from the file extension.
    pub fn from_name(name: &str) -> Self {
        match Path::new(name).extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("k") => Self::Kinc,
            _ => Self::Encoded,
        }
    }
}

/// Decodes `bytes` as RGBA8 into the front of `out`.
///
/// Fails with `StagingTooSmall` when `out` cannot hold `width * height * 4`
/// bytes; `out` is left unspecified on any error.
pub fn decode_into<'a>(
    bytes: &[u8],
    container: ImageContainer,
    out: &'a mut [u8],
) -> Result<Image<'a>, ImageError> {
    match container {
        ImageContainer::Kinc => decode_k(bytes, out),
        ImageContainer::Encoded => decode_encoded(bytes, out),
    }
}

struct KHeader<'b> {
    width: u32,
    height: u32,
    fourcc: [u8; 4],
    payload: &'b [u8],
}

impl<'b> KHeader<'b> {
    fn parse(bytes: &'b [u8]) -> Result<Self, ImageError> {
        if bytes.len() < K_HEADER_LEN {
            return Err(ImageError::Malformed(format!(
                "k header needs {K_HEADER_LEN} bytes, file has {}",
                bytes.len()
            )));
        }

        let dim = |at: usize| -> Result<u32, ImageError> {
            let raw = i32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]);
            u32::try_from(raw)
                .ok()
                .filter(|&d| d > 0)
                .ok_or_else(|| ImageError::Malformed(format!("invalid dimension {raw}")))
        };

        Ok(Self {
            width: dim(0)?,
            height: dim(4)?,
            fourcc: [bytes[8], bytes[9], bytes[10], bytes[11]],
            payload: &bytes[K_HEADER_LEN..],
        })
    }
}

fn pixel_len(width: u32, height: u32) -> Result<usize, ImageError> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(BYTES_PER_PIXEL))
        .ok_or_else(|| ImageError::Malformed(format!("{width}x{height} overflows")))
}

fn staging(out: &mut [u8], needed: usize) -> Result<&mut [u8], ImageError> {
    let available = out.len();
    out.get_mut(..needed)
        .ok_or(ImageError::StagingTooSmall { needed, available })
}

fn decode_k<'a>(bytes: &[u8], out: &'a mut [u8]) -> Result<Image<'a>, ImageError> {
    let header = KHeader::parse(bytes)?;
    let len = pixel_len(header.width, header.height)?;
    let dst = staging(out, len)?;

    match &header.fourcc {
        b"LZ4 " => {
            let written = lz4_flex::block::decompress_into(header.payload, dst)?;
            if written != len {
                return Err(ImageError::Malformed(format!(
                    "lz4 payload decoded to {written} bytes, expected {len}"
                )));
            }
        }
        b"RGBA" => {
            let Some(src) = header.payload.get(..len) else {
                return Err(ImageError::Malformed(format!(
                    "raw payload has {} bytes, expected {len}",
                    header.payload.len()
                )));
            };
            dst.copy_from_slice(src);
        }
        other => {
            return Err(ImageError::Unsupported(
                String::from_utf8_lossy(other).into_owned(),
            ));
        }
    }

    Image::from_rgba8(header.width, header.height, dst)
}

fn decode_encoded<'a>(bytes: &[u8], out: &'a mut [u8]) -> Result<Image<'a>, ImageError> {
    let decoded = ::image::load_from_memory(bytes)?.into_rgba8();
    let (width, height) = decoded.dimensions();
    let dst = staging(out, pixel_len(width, height)?)?;
    dst.copy_from_slice(decoded.as_raw());
    Image::from_rgba8(width, height, dst)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn k_file(width: i32, height: i32, fourcc: &[u8; 4], payload: &[u8]) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&width.to_le_bytes());
        bytes.extend_from_slice(&height.to_le_bytes());
        bytes.extend_from_slice(fourcc);
        bytes.extend_from_slice(payload);
        bytes
    }

    fn gradient(width: u32, height: u32) -> Vec<u8> {
        (0..width * height)
            .flat_map(|i| [(i % 251) as u8, (i / 7) as u8, 0x40, 0xFF])
            .collect()
    }

    // ── container ─────────────────────────────────────────────────────────

    #[test]
    fn container_from_extension() {
        assert_eq!(ImageContainer::from_name("icons.k"), ImageContainer::Kinc);
        assert_eq!(ImageContainer::from_name("dir/ICONS.K"), ImageContainer::Kinc);
        assert_eq!(ImageContainer::from_name("icons.png"), ImageContainer::Encoded);
        assert_eq!(ImageContainer::from_name("icons"), ImageContainer::Encoded);
    }

    // ── .k ────────────────────────────────────────────────────────────────

    #[test]
    fn k_lz4_payload() {
        let pixels = gradient(16, 8);
        let file = k_file(16, 8, b"LZ4 ", &lz4_flex::block::compress(&pixels));

        let mut out = vec![0u8; 1024];
        let image = decode_into(&file, ImageContainer::Kinc, &mut out).unwrap();
        assert_eq!((image.width(), image.height()), (16, 8));
        assert_eq!(image.pixels(), &pixels[..]);
    }

    #[test]
    fn k_raw_payload() {
        let pixels = gradient(3, 5);
        let file = k_file(3, 5, b"RGBA", &pixels);

        let mut out = vec![0u8; pixels.len()];
        let image = decode_into(&file, ImageContainer::Kinc, &mut out).unwrap();
        assert_eq!(image.pixels(), &pixels[..]);
        assert_eq!(image.stride(), 12);
    }

    #[test]
    fn k_short_raw_payload_is_malformed() {
        let file = k_file(4, 4, b"RGBA", &[0u8; 10]);
        let mut out = vec![0u8; 64];
        let err = decode_into(&file, ImageContainer::Kinc, &mut out).unwrap_err();
        assert!(matches!(err, ImageError::Malformed(_)));
    }

    #[test]
    fn k_unsupported_fourcc() {
        let file = k_file(4, 4, b"DXT5", &[0u8; 16]);
        let mut out = vec![0u8; 64];
        match decode_into(&file, ImageContainer::Kinc, &mut out).unwrap_err() {
            ImageError::Unsupported(f) => assert_eq!(f, "DXT5"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn k_rejects_bad_header() {
        let mut out = vec![0u8; 64];
        assert!(matches!(
            decode_into(&[1, 2, 3], ImageContainer::Kinc, &mut out),
            Err(ImageError::Malformed(_))
        ));
        let negative = k_file(-4, 4, b"RGBA", &[0u8; 64]);
        assert!(matches!(
            decode_into(&negative, ImageContainer::Kinc, &mut out),
            Err(ImageError::Malformed(_))
        ));
    }

    #[test]
    fn k_staging_too_small() {
        let pixels = gradient(8, 8);
        let file = k_file(8, 8, b"RGBA", &pixels);
        let mut out = vec![0u8; 100];
        let err = decode_into(&file, ImageContainer::Kinc, &mut out).unwrap_err();
        assert!(matches!(
            err,
            ImageError::StagingTooSmall {
                needed: 256,
                available: 100
            }
        ));
    }

    // ── encoded ───────────────────────────────────────────────────────────

    #[test]
    fn png_through_image_crate() {
        let src = ::image::RgbaImage::from_fn(3, 2, |x, y| ::image::Rgba([x as u8, y as u8, 7, 255]));
        let mut png = Vec::new();
        src.write_to(&mut std::io::Cursor::new(&mut png), ::image::ImageFormat::Png)
            .unwrap();

        let mut out = vec![0u8; 64];
        let image = decode_into(&png, ImageContainer::Encoded, &mut out).unwrap();
        assert_eq!((image.width(), image.height()), (3, 2));
        assert_eq!(image.pixels(), src.as_raw().as_slice());
    }
}
