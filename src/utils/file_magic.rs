/// 验证答题卡图片的魔术字节是否与扩展名匹配
///
/// # Arguments
/// * `data` - 文件内容的前几个字节
/// * `extension` - 文件扩展名（包含点号，如 ".png"）
pub fn validate_magic_bytes(data: &[u8], extension: &str) -> bool {
    if data.is_empty() {
        return false;
    }

    match extension.to_lowercase().as_str() {
        ".png" => data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]),
        ".jpg" | ".jpeg" => data.starts_with(&[0xFF, 0xD8, 0xFF]),
        ".gif" => data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a"),
        ".webp" => data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP",
        ".bmp" => data.starts_with(b"BM"),
        // 小端 II*\0 / 大端 MM\0*
        ".tif" | ".tiff" => {
            data.starts_with(&[0x49, 0x49, 0x2A, 0x00]) || data.starts_with(&[0x4D, 0x4D, 0x00, 0x2A])
        }

        // 其余格式一律拒绝
        _ => false,
    }
}

/// 从文件名取出小写扩展名（带点号）
pub fn extension_of(file_name: &str) -> Option<String> {
    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(format!(".{}", ext.to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_png_magic() {
        let png_header = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        assert!(validate_magic_bytes(&png_header, ".png"));
        assert!(validate_magic_bytes(&png_header, ".PNG"));
        assert!(!validate_magic_bytes(&png_header, ".jpg"));
    }

    #[test]
    fn test_jpeg_magic() {
        let jpeg_header = [0xFF, 0xD8, 0xFF, 0xE0];
        assert!(validate_magic_bytes(&jpeg_header, ".jpg"));
        assert!(validate_magic_bytes(&jpeg_header, ".jpeg"));
        assert!(!validate_magic_bytes(&jpeg_header, ".png"));
    }

    #[test]
    fn test_tiff_magic() {
        assert!(validate_magic_bytes(&[0x49, 0x49, 0x2A, 0x00, 0x08], ".tif"));
        assert!(validate_magic_bytes(&[0x4D, 0x4D, 0x00, 0x2A], ".tiff"));
        assert!(!validate_magic_bytes(b"BM", ".tiff"));
    }

    #[test]
    fn test_text_is_rejected() {
        assert!(!validate_magic_bytes(b"q1,q2\nA,B", ".csv"));
        assert!(!validate_magic_bytes(b"hello", ".txt"));
        assert!(!validate_magic_bytes(&[], ".png"));
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("sheet.PNG").as_deref(), Some(".png"));
        assert_eq!(extension_of("a.b.jpeg").as_deref(), Some(".jpeg"));
        assert_eq!(extension_of("noext"), None);
        assert_eq!(extension_of(".hidden"), None);
        assert_eq!(extension_of("trailing."), None);
    }
}
