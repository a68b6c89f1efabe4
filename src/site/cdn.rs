//! Image URLs served through the CDN resizing endpoint.

use url::Url;

const IMAGE_QUALITY: u8 = 80;

/// Build a resized image URL, or the plain site path when no CDN is configured.
#[must_use]
pub fn image_url(base: Option<&Url>, path: &str, width: u32) -> String {
    let path = path.trim_start_matches('/');
    match base {
        Some(base) => format!(
            "{}/cdn-cgi/image/width={width},quality={IMAGE_QUALITY},format=auto/{path}",
            base.as_str().trim_end_matches('/')
        ),
        None => format!("/{path}"),
    }
}
