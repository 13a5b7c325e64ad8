//! Content-based file type detection.
//!
//! Encrypted references carry no usable extension, so the extension of a
//! recovered asset is decided from its decrypted bytes alone.

use image::ImageFormat;

/// Extension used when nothing else matches.
pub const FALLBACK_EXTENSION: &str = ".bin";

/// MOC3 model data magic.
const MOC3_MAGIC: &[u8; 4] = b"MOC3";

const UTF8_BOM: &[u8; 3] = b"\xEF\xBB\xBF";

/// Guess the extension (with leading dot) for a decrypted payload.
///
/// Never fails: unknown content maps to [`FALLBACK_EXTENSION`].
pub fn sniff_extension(data: &[u8]) -> &'static str {
    if let Some(ext) = image_extension(data) {
        return ext;
    }

    if data.starts_with(MOC3_MAGIC) {
        return ".moc3";
    }

    if let Some(ext) = audio_extension(data) {
        return ext;
    }

    if is_json(data) {
        return ".json";
    }

    FALLBACK_EXTENSION
}

fn image_extension(data: &[u8]) -> Option<&'static str> {
    match image::guess_format(data).ok()? {
        ImageFormat::Png => Some(".png"),
        ImageFormat::Jpeg => Some(".jpg"),
        ImageFormat::Bmp => Some(".bmp"),
        ImageFormat::Gif => Some(".gif"),
        ImageFormat::WebP => Some(".webp"),
        _ => None,
    }
}

fn audio_extension(data: &[u8]) -> Option<&'static str> {
    if data.len() >= 12 && &data[..4] == b"RIFF" && &data[8..12] == b"WAVE" {
        return Some(".wav");
    }
    if data.starts_with(b"OggS") {
        return Some(".ogg");
    }
    if data.starts_with(b"fLaC") {
        return Some(".flac");
    }
    // ID3 tag or a bare MPEG audio frame sync
    if data.starts_with(b"ID3") || (data.len() >= 2 && data[0] == 0xFF && data[1] & 0xE0 == 0xE0) {
        return Some(".mp3");
    }
    None
}

fn is_json(data: &[u8]) -> bool {
    let data = data.strip_prefix(UTF8_BOM.as_slice()).unwrap_or(data);

    let first = data.iter().find(|b| !b.is_ascii_whitespace());
    if !matches!(first, Some(b'{') | Some(b'[')) {
        return false;
    }

    serde_json::from_slice::<serde_json::Value>(data).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_png() {
        let png = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR\0\0\0\x01\0\0\0\x01";
        assert_eq!(sniff_extension(png), ".png");
    }

    #[test]
    fn test_jpeg() {
        assert_eq!(sniff_extension(b"\xFF\xD8\xFF\xE0\0\x10JFIF\0"), ".jpg");
    }

    #[test]
    fn test_moc3() {
        assert_eq!(sniff_extension(b"MOC3\x03\0\0\0\0\0\0\0"), ".moc3");
    }

    #[test]
    fn test_audio() {
        assert_eq!(sniff_extension(b"RIFF\x24\0\0\0WAVEfmt "), ".wav");
        assert_eq!(sniff_extension(b"OggS\0\x02"), ".ogg");
        assert_eq!(sniff_extension(b"ID3\x04\0\0"), ".mp3");
    }

    #[test]
    fn test_json() {
        assert_eq!(sniff_extension(br#"{"Version":3}"#), ".json");
        assert_eq!(sniff_extension(b"\xEF\xBB\xBF  [1, 2]"), ".json");
    }

    #[test]
    fn test_json_lookalikes_fall_back() {
        assert_eq!(sniff_extension(b"{not json"), FALLBACK_EXTENSION);
        assert_eq!(sniff_extension(b"42"), FALLBACK_EXTENSION);
    }

    #[test]
    fn test_unknown() {
        assert_eq!(sniff_extension(&[]), FALLBACK_EXTENSION);
        assert_eq!(sniff_extension(b"\x00\x01\x02\x03"), FALLBACK_EXTENSION);
    }
}
