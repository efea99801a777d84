use std::sync::Arc;
use tokio::task::JoinHandle;

/// Owns a background refresh task; dropping the handle cancels the task.
#[derive(Debug)]
pub(crate) struct RefreshHandle(JoinHandle<()>);
impl RefreshHandle {
    pub(crate) fn new(handle: JoinHandle<()>) -> Self {
        Self(handle)
    }
}
impl Drop for RefreshHandle {
    fn drop(&mut self) {
        self.0.abort();
    }
}

#[derive(Debug)]
pub(crate) enum Origin {
    /// Loaded from the documentation tree; replaced by the next bulk load.
    Bulk,
    /// Fetched on first request; kept fresh by its own task.
    Lazy(RefreshHandle),
}

/// Cached documentation for one package.
///
/// An entry without HTML is a negative entry: the package is known to have no
/// documentation (until a refresh says otherwise).
#[derive(Debug)]
pub(crate) struct DocEntry {
    pub(crate) html: Option<Arc<str>>,
    pub(crate) origin: Origin,
}
impl DocEntry {
    pub(crate) fn bulk(html: Arc<str>) -> Self {
        Self {
            html: Some(html),
            origin: Origin::Bulk,
        }
    }

    pub(crate) fn lazy(html: Option<Arc<str>>, refresh: RefreshHandle) -> Self {
        Self {
            html,
            origin: Origin::Lazy(refresh),
        }
    }

    pub(crate) fn enabled(&self) -> bool {
        self.html.is_some()
    }

    pub(crate) fn is_lazy(&self) -> bool {
        matches!(self.origin, Origin::Lazy(_))
    }
}
