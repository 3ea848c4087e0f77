// ABOUTME: "Clear Caches" action: wipe website data, delete cookies one by one, then reload the page
// ABOUTME: Each step starts only after the previous one has finished; the first failure ends the sequence and is only logged

use crate::surface::WebSurface;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearStep {
    WebsiteData,
    ListCookies,
    DeleteCookie,
    Reload,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearOutcome {
    /// Website data removal is running; continue with [`finish_clearing`]
    /// once its completion fires.
    Pending,
    Completed { cookies_removed: usize },
    Stopped { at: ClearStep },
}

/// Starts the chain by removing all website data. `on_cleared` runs when the
/// removal has finished, and is never called if it could not be started.
pub fn start_clearing<S, F>(surface: &S, on_cleared: F) -> ClearOutcome
where
    S: WebSurface,
    F: FnOnce() + 'static,
{
    tracing::info!("Clearing website data");
    if let Err(e) = surface.clear_website_data(Box::new(on_cleared)) {
        tracing::warn!("{e:#}");
        return ClearOutcome::Stopped { at: ClearStep::WebsiteData };
    }
    ClearOutcome::Pending
}

/// Remaining steps, run after website data removal has completed.
pub fn finish_clearing<S: WebSurface>(surface: &S, url: &str) -> ClearOutcome {
    let cookies = match surface.cookies() {
        Ok(cookies) => cookies,
        Err(e) => {
            tracing::warn!("{e:#}");
            return ClearOutcome::Stopped { at: ClearStep::ListCookies };
        }
    };

    tracing::debug!(count = cookies.len(), "Deleting cookies");
    for cookie in &cookies {
        if let Err(e) = surface.delete_cookie(cookie) {
            tracing::warn!("{e:#}");
            return ClearOutcome::Stopped { at: ClearStep::DeleteCookie };
        }
    }

    if let Err(e) = surface.load_bypassing_cache(url) {
        tracing::warn!("{e:#}");
        return ClearOutcome::Stopped { at: ClearStep::Reload };
    }

    tracing::info!(cookies_removed = cookies.len(), "Caches cleared, content reloaded");
    ClearOutcome::Completed {
        cookies_removed: cookies.len(),
    }
}
