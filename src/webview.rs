// ABOUTME: The embedded web surface: a wry child webview filling the popover above the resize handle
// ABOUTME: Mobile user agent, autoplay and clipboard enabled; drag freeze is a blur veil injected by script

use anyhow::{Context, Result, bail};
use block2::RcBlock;
use objc2::MainThreadMarker;
use objc2_foundation::NSDate;
use objc2_web_kit::WKWebsiteDataStore;
use std::cell::Cell;
use winit::window::Window;
use wry::dpi::{LogicalPosition, LogicalSize};
use wry::http::{HeaderMap, HeaderValue, header::CACHE_CONTROL};
use wry::{Rect, WebView, WebViewBuilder, WebViewExtMacOS};

use crate::geometry::Size;
use crate::surface::{CONTENT_URL, HANDLE_HEIGHT, WebSurface};

/// The page is asked for its mobile layout, which suits a narrow popover.
const MOBILE_USER_AGENT: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_5 like Mac OS X) \
     AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.5 Mobile/15E148 Safari/604.1";

const FREEZE_SCRIPT: &str = r#"(function () {
  if (document.getElementById('__grokbar_freeze')) return;
  var veil = document.createElement('div');
  veil.id = '__grokbar_freeze';
  veil.style.cssText = 'position:fixed;inset:0;z-index:2147483647;pointer-events:all;' +
    'backdrop-filter:blur(8px);-webkit-backdrop-filter:blur(8px);background:rgba(0,0,0,0.08);';
  document.documentElement.appendChild(veil);
})();"#;

const THAW_SCRIPT: &str = r#"(function () {
  var veil = document.getElementById('__grokbar_freeze');
  if (veil) veil.remove();
})();"#;

pub struct PopoverWebView {
    webview: WebView,
}

impl PopoverWebView {
    pub fn new(window: &Window, size: Size) -> Result<Self> {
        let webview = WebViewBuilder::new()
            .with_url(CONTENT_URL)
            .with_user_agent(MOBILE_USER_AGENT)
            .with_autoplay(true)
            .with_clipboard(true)
            .with_bounds(content_bounds(size))
            .with_navigation_handler(|url| {
                tracing::debug!(%url, "Navigation");
                true
            })
            .with_on_page_load_handler(|event, url| {
                tracing::debug!(?event, %url, "Page load");
            })
            .build_as_child(window)
            .context("Failed to create embedded webview")?;

        tracing::info!(url = CONTENT_URL, "Web surface created");
        Ok(Self { webview })
    }

    /// Re-fit the webview after the popover window changed size.
    pub fn resize(&self, size: Size) {
        if let Err(e) = self.webview.set_bounds(content_bounds(size)) {
            tracing::warn!("Failed to resize webview: {e}");
        }
    }

    pub fn focus(&self) {
        if let Err(e) = self.webview.focus() {
            tracing::debug!("Failed to focus webview: {e}");
        }
    }
}

impl WebSurface for PopoverWebView {
    type Cookie = wry::cookie::Cookie<'static>;

    fn clear_website_data(&self, on_complete: Box<dyn FnOnce()>) -> Result<()> {
        let Some(mtm) = MainThreadMarker::new() else {
            bail!("Website data can only be cleared from the main thread");
        };

        // WebKit calls the handler once, on the main thread, after removal
        let on_complete = Cell::new(Some(on_complete));
        let handler = RcBlock::new(move || {
            if let Some(on_complete) = on_complete.take() {
                on_complete();
            }
        });

        let webview = self.webview.webview();
        unsafe {
            let store = webview.configuration().websiteDataStore();
            let types = WKWebsiteDataStore::allWebsiteDataTypes(mtm);
            let since = NSDate::distantPast();
            store.removeDataOfTypes_modifiedSince_completionHandler(&types, &since, &handler);
        }
        Ok(())
    }

    fn cookies(&self) -> Result<Vec<Self::Cookie>> {
        self.webview.cookies().context("Failed to list cookies")
    }

    fn delete_cookie(&self, cookie: &Self::Cookie) -> Result<()> {
        self.webview
            .delete_cookie(cookie)
            .with_context(|| format!("Failed to delete cookie {}", cookie.name()))
    }

    fn load_bypassing_cache(&self, url: &str) -> Result<()> {
        let mut headers = HeaderMap::new();
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        self.webview
            .load_url_with_headers(url, headers)
            .with_context(|| format!("Failed to load {url}"))
    }

    fn set_frozen(&self, frozen: bool) -> Result<()> {
        let script = if frozen { FREEZE_SCRIPT } else { THAW_SCRIPT };
        self.webview
            .evaluate_script(script)
            .context("Failed to toggle content freeze")
    }
}

/// Webview rectangle inside a popover of `size`, leaving the handle strip free.
fn content_bounds(size: Size) -> Rect {
    let height = (size.height - HANDLE_HEIGHT).max(0.0);

    // winit's content view is flipped, so y counts down from the top edge
    Rect {
        position: LogicalPosition::new(0.0, 0.0).into(),
        size: LogicalSize::new(size.width, height).into(),
    }
}
