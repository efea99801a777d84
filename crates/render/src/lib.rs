mod images;
mod markdown;

pub use crate::images::absolutize_images;
pub use crate::markdown::Markdown;
use std::sync::Arc;

/// Turns package documentation (markdown) into HTML.
///
/// Rendering never fails: malformed markdown still produces *some* HTML,
/// which is what a browser would show for it anyway.
pub trait Render: Send + Sync {
    fn render(&self, markdown: &str) -> String;

    /// Render, then point relative `img/` references at `base_url`.
    fn render_with_base(&self, markdown: &str, base_url: &str) -> String {
        absolutize_images(&self.render(markdown), base_url).into_owned()
    }
}

pub type RenderHandle = Arc<dyn Render>;
