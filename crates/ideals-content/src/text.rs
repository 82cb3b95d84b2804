use ideals_archive::ArchiveError;
use ideals_archive::VirtualPath;

const UTF8_BOM: &[u8] = b"\xef\xbb\xbf";

/// Decode entry bytes as UTF-8, stripping a byte order mark if present.
pub fn decode_text(path: &VirtualPath, bytes: Vec<u8>) -> Result<String, ArchiveError> {
    let bytes = match bytes.strip_prefix(UTF8_BOM) {
        Some(rest) => rest.to_vec(),
        None => bytes,
    };
    String::from_utf8(bytes).map_err(|_| ArchiveError::UnsupportedEncoding { path: path.clone() })
}
