use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use scenedeploy_protocol::constants::BROWSER_OPEN_DELAY;

type Opener = Arc<dyn Fn(&str) -> std::io::Result<()> + Send + Sync>;

/// Best-effort browser launch for the signer page.
///
/// Launching happens on a background task after `delay`; failures are
/// logged and never surface to the caller.
#[derive(Clone)]
pub struct BrowserLauncher {
    delay: Duration,
    opener: Opener,
}

impl std::fmt::Debug for BrowserLauncher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrowserLauncher")
            .field("delay", &self.delay)
            .finish_non_exhaustive()
    }
}

impl Default for BrowserLauncher {
    fn default() -> Self {
        Self::system(BROWSER_OPEN_DELAY)
    }
}

impl BrowserLauncher {
    /// Opens URLs with the platform's default browser.
    pub fn system(delay: Duration) -> Self {
        Self {
            delay,
            opener: Arc::new(|url: &str| open::that(url)),
        }
    }

    /// Uses a custom opener instead of the system browser.
    pub fn with_opener<F>(delay: Duration, opener: F) -> Self
    where
        F: Fn(&str) -> std::io::Result<()> + Send + Sync + 'static,
    {
        Self {
            delay,
            opener: Arc::new(opener),
        }
    }

    /// Schedules the launch. Skipped if `cancel` fires first.
    pub(crate) fn launch(&self, url: String, cancel: CancellationToken) {
        let delay = self.delay;
        let opener = self.opener.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("browser launch skipped, session finished");
                    return;
                }
                _ = tokio::time::sleep(delay) => {}
            }
            let result = tokio::task::spawn_blocking(move || opener(&url)).await;
            match result {
                Ok(Ok(())) => debug!("signer page opened in browser"),
                Ok(Err(e)) => warn!("unable to open browser automatically: {e}"),
                Err(e) => warn!("browser launch task failed: {e}"),
            }
        });
    }
}
