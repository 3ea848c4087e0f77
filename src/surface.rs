// ABOUTME: What the app needs from the embedded page, independent of the webview backing it
// ABOUTME: The cache clearer and drag freeze are written against WebSurface; the handle strip geometry lives here too

use anyhow::Result;

pub const CONTENT_URL: &str = "https://grok.com/";

/// Height of the drag strip along the bottom of the popover that the page leaves uncovered.
pub const HANDLE_HEIGHT: f64 = 14.0;

/// Operations on the embedded page that the rest of the app relies on.
pub trait WebSurface {
    type Cookie;

    /// Start removing every stored website data record (caches, local
    /// storage, ...). `on_complete` runs once the removal has finished; it is
    /// dropped uncalled when an error is returned.
    fn clear_website_data(&self, on_complete: Box<dyn FnOnce()>) -> Result<()>;

    fn cookies(&self) -> Result<Vec<Self::Cookie>>;

    fn delete_cookie(&self, cookie: &Self::Cookie) -> Result<()>;

    /// Load `url` asking intermediaries not to serve cached copies.
    fn load_bypassing_cache(&self, url: &str) -> Result<()>;

    /// Blur the page and swallow pointer input while the popover is resized.
    fn set_frozen(&self, frozen: bool) -> Result<()>;
}

/// Whether a point in window coordinates (top-left origin) is on the resize handle.
pub fn in_handle(window_height: f64, y: f64) -> bool {
    y >= window_height - HANDLE_HEIGHT && y <= window_height
}
