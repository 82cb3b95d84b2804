//! URI schemes the host editor routes to the content provider.
//!
//! Both schemes resolve identically; the scheme only tells the editor how to
//! label the document.

use ideals_archive::VirtualPath;
use percent_encoding::percent_decode_str;
use percent_encoding::utf8_percent_encode;
use percent_encoding::AsciiSet;
use percent_encoding::CONTROLS;
use url::Url;

pub const JAR_SCHEME: &str = "jar";
pub const ZIP_SCHEME: &str = "zip";

/// Every scheme served by [`ContentProvider`](crate::ContentProvider).
pub const SCHEMES: [&str; 2] = [JAR_SCHEME, ZIP_SCHEME];

/// Characters escaped when a virtual path becomes a URI path. `!` and `/`
/// stay literal so the archive structure remains readable.
const PATH_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

#[must_use]
pub fn is_archive_scheme(scheme: &str) -> bool {
    SCHEMES.iter().any(|s| s.eq_ignore_ascii_case(scheme))
}

/// Extract the virtual path from an archive-scheme URI.
///
/// Returns `None` for other schemes or a path that does not decode to UTF-8.
#[must_use]
pub fn uri_to_path(uri: &Url) -> Option<VirtualPath> {
    if !is_archive_scheme(uri.scheme()) {
        return None;
    }

    let path = percent_decode_str(uri.path()).decode_utf8().ok()?;
    Some(VirtualPath::from(path.as_ref()))
}

/// Build a URI for `path` under `scheme`.
#[must_use]
pub fn path_to_uri(scheme: &str, path: &VirtualPath) -> Option<Url> {
    if !is_archive_scheme(scheme) {
        return None;
    }

    let encoded = utf8_percent_encode(path.as_str(), PATH_ENCODE_SET);
    Url::parse(&format!("{scheme}:{encoded}")).ok()
}
