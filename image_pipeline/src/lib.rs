use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{ExtendedColorType, ImageBuffer, ImageEncoder, RgbImage, RgbaImage};
use img_parts::{Bytes, ImageEXIF};

pub const DEFAULT_MAX_WIDTH: u32 = 1200;
pub const DEFAULT_QUALITY: u8 = 75;
pub const LARGE_SOURCE_BYTES: usize = 5 * 1024 * 1024;
pub const DATA_URL_PREFIX: &str = "data:image/jpeg;base64,";

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("image decode failed: {0}")]
    Decode(String),
    #[error("image encode failed: {0}")]
    Encode(String),
    #[error("invalid image dimensions")]
    Dimensions,
    #[error("image read failed: {0}")]
    Read(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizerConfig {
    pub max_width: u32,
    pub quality: u8,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            max_width: DEFAULT_MAX_WIDTH,
            quality: DEFAULT_QUALITY,
        }
    }
}

/// A JPEG re-encode of the source, wrapped as a data URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedImage {
    pub data_url: String,
    pub width: u32,
    pub height: u32,
    pub source_len: usize,
    pub encoded_len: usize,
}

impl NormalizedImage {
    /// `"{source}KB -> {data url}KB"`, the line callers log per image.
    pub fn size_summary(&self) -> String {
        format!(
            "{}KB -> {}KB",
            kilobytes(self.source_len),
            kilobytes(self.data_url.len())
        )
    }
}

/// Sources above [`LARGE_SOURCE_BYTES`] get a warning before compression.
pub fn is_large_source(len: usize) -> bool {
    len > LARGE_SOURCE_BYTES
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ImagePipeline {
    config: NormalizerConfig,
}

impl ImagePipeline {
    pub fn new(config: NormalizerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> NormalizerConfig {
        self.config
    }

    pub fn normalize(&self, bytes: &[u8]) -> Result<NormalizedImage, PipelineError> {
        normalize(bytes, &self.config)
    }
}

/// Decodes, orients, width-bounds and re-encodes one image. Logging is left
/// to the caller, which knows whether it runs in the browser or natively.
pub fn normalize(bytes: &[u8], config: &NormalizerConfig) -> Result<NormalizedImage, PipelineError> {
    let decoded =
        image::load_from_memory(bytes).map_err(|err| PipelineError::Decode(err.to_string()))?;
    let rgba = apply_exif_orientation(decoded.to_rgba8(), extract_exif_orientation(bytes));
    if rgba.width() == 0 || rgba.height() == 0 {
        return Err(PipelineError::Dimensions);
    }
    let rgba = resize_to_max_width(rgba, config.max_width);
    let rgb = flatten_onto_black(&rgba);

    let jpeg = encode_jpeg(&rgb, config.quality)?;
    let encoded_len = jpeg.len();
    let mut data_url = String::with_capacity(DATA_URL_PREFIX.len() + encoded_len * 4 / 3 + 4);
    data_url.push_str(DATA_URL_PREFIX);
    STANDARD.encode_string(&jpeg, &mut data_url);

    Ok(NormalizedImage {
        data_url,
        width: rgb.width(),
        height: rgb.height(),
        source_len: bytes.len(),
        encoded_len,
    })
}

/// Output size for a source of `width` x `height` under `max_width`.
pub fn target_dimensions(width: u32, height: u32, max_width: u32) -> (u32, u32) {
    if max_width == 0 || width <= max_width {
        return (width, height);
    }
    let scaled = (height as f64 * max_width as f64 / width as f64).round();
    (max_width, scaled.max(1.0) as u32)
}

fn resize_to_max_width(rgba: RgbaImage, max_width: u32) -> RgbaImage {
    let (width, height) = rgba.dimensions();
    let (next_width, next_height) = target_dimensions(width, height, max_width);
    if (next_width, next_height) == (width, height) {
        return rgba;
    }
    image::imageops::resize(&rgba, next_width, next_height, FilterType::Triangle)
}

fn flatten_onto_black(rgba: &RgbaImage) -> RgbImage {
    let (width, height) = rgba.dimensions();
    let mut out = Vec::with_capacity((width as usize) * (height as usize) * 3);
    for chunk in rgba.as_raw().chunks_exact(4) {
        let alpha = chunk[3] as u32;
        for &channel in &chunk[..3] {
            out.push(((channel as u32 * alpha + 127) / 255) as u8);
        }
    }
    ImageBuffer::from_raw(width, height, out).unwrap_or_else(|| RgbImage::new(width, height))
}

fn encode_jpeg(rgb: &RgbImage, quality: u8) -> Result<Vec<u8>, PipelineError> {
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100))
        .write_image(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)
        .map_err(|err| PipelineError::Encode(err.to_string()))?;
    Ok(out)
}

pub fn kilobytes(len: usize) -> usize {
    (len + 512) / 1024
}

pub fn extract_exif(bytes: &[u8]) -> Option<Vec<u8>> {
    let data = Bytes::copy_from_slice(bytes);

    if let Ok(jpeg) = img_parts::jpeg::Jpeg::from_bytes(data.clone()) {
        if let Some(exif) = jpeg.exif() {
            return Some(exif.as_ref().to_vec());
        }
    }
    if let Ok(webp) = img_parts::webp::WebP::from_bytes(data) {
        if let Some(exif) = webp.exif() {
            return Some(exif.as_ref().to_vec());
        }
    }
    None
}

pub fn extract_exif_orientation(bytes: &[u8]) -> Option<u16> {
    let exif = extract_exif(bytes)?;
    parse_exif_orientation(&exif)
}

#[derive(Clone, Copy)]
enum ByteOrder {
    Little,
    Big,
}

const ORIENTATION_TAG: u16 = 0x0112;
const SHORT_TYPE: u16 = 3;

fn parse_exif_orientation(exif: &[u8]) -> Option<u16> {
    let tiff = exif.strip_prefix(b"Exif\0\0").unwrap_or(exif);
    let order = match tiff.get(..2)? {
        b"II" => ByteOrder::Little,
        b"MM" => ByteOrder::Big,
        _ => return None,
    };
    if read_u16(tiff, 2, order)? != 42 {
        return None;
    }
    let ifd = usize::try_from(read_u32(tiff, 4, order)?).ok()?;
    let entries = usize::from(read_u16(tiff, ifd, order)?);
    let first = ifd.checked_add(2)?;
    (0..entries)
        .map_while(|index| first.checked_add(index.checked_mul(12)?))
        .take_while(|entry| entry.checked_add(12).is_some_and(|end| end <= tiff.len()))
        .find(|&entry| read_u16(tiff, entry, order) == Some(ORIENTATION_TAG))
        .and_then(|entry| {
            if read_u16(tiff, entry + 2, order)? != SHORT_TYPE || read_u32(tiff, entry + 4, order)? < 1 {
                return None;
            }
            read_u16(tiff, entry + 8, order).filter(|value| (1..=8).contains(value))
        })
}

fn read_u16(data: &[u8], offset: usize, order: ByteOrder) -> Option<u16> {
    let bytes: [u8; 2] = data.get(offset..offset.checked_add(2)?)?.try_into().ok()?;
    Some(match order {
        ByteOrder::Little => u16::from_le_bytes(bytes),
        ByteOrder::Big => u16::from_be_bytes(bytes),
    })
}

fn read_u32(data: &[u8], offset: usize, order: ByteOrder) -> Option<u32> {
    let bytes: [u8; 4] = data.get(offset..offset.checked_add(4)?)?.try_into().ok()?;
    Some(match order {
        ByteOrder::Little => u32::from_le_bytes(bytes),
        ByteOrder::Big => u32::from_be_bytes(bytes),
    })
}

fn apply_exif_orientation(image: RgbaImage, orientation: Option<u16>) -> RgbaImage {
    use image::imageops::{flip_horizontal, flip_vertical, rotate180, rotate270, rotate90};

    match orientation {
        Some(2) => flip_horizontal(&image),
        Some(3) => rotate180(&image),
        Some(4) => flip_vertical(&image),
        Some(5) => rotate270(&flip_horizontal(&image)),
        Some(6) => rotate90(&image),
        Some(7) => rotate90(&flip_horizontal(&image)),
        Some(8) => rotate270(&image),
        _ => image,
    }
}
