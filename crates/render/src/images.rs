use regex::{Captures, Regex};
use std::borrow::Cow;
use std::sync::LazyLock;

static RELATIVE_IMG_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"(src|href)=(["'])(?:\./)?img/"#).unwrap());

/// Rewrite relative `img/...` references in rendered HTML so they resolve
/// against `base_url` (usually the raw-content URL of the package folder).
///
/// Only attribute values that *start* with `img/` (or `./img/`) are touched;
/// absolute URLs and prose mentioning "img/" are left alone.
///
/// # Examples
///
/// ```
/// use uniview_render::absolutize_images;
///
/// let html = r#"<p><img src="img/logo.png" alt="logo" /></p>"#;
/// assert_eq!(
///     absolutize_images(html, "https://raw.example.com/cassandra"),
///     r#"<p><img src="https://raw.example.com/cassandra/img/logo.png" alt="logo" /></p>"#,
/// );
/// ```
pub fn absolutize_images<'h>(html: &'h str, base_url: &str) -> Cow<'h, str> {
    let base_url = base_url.trim_end_matches('/');
    RELATIVE_IMG_REGEX.replace_all(html, |caps: &Captures<'_>| format!("{}={}{base_url}/img/", &caps[1], &caps[2]))
}
