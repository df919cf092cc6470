//! Warning overlay renderer.
//!
//! Runs "inside" a page: it consumes the Pending Notice exactly once and, if
//! the notice is addressed to this page's tab, draws the overlay to the
//! terminal sink. The slot is deleted whether or not anything is shown, so a
//! missing or already-consumed notice is a harmless no-op. A page shows at
//! most one overlay until its tab navigates again.

use crate::page_host::PageContext;
use parking_lot::Mutex;
use site_sentry_config::OverlayConfig;
use site_sentry_core::{KeyValueStore, PendingNotice, StoreError};
use std::io::Write;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("could not read pending notice: {0}")]
    Store(#[from] StoreError),

    #[error("could not draw overlay: {0}")]
    Output(#[from] std::io::Error),
}

/// What a render pass did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
    /// The overlay was drawn
    Displayed,
    /// No notice (or an empty one) was pending
    NothingPending,
    /// The page already shows an overlay
    AlreadyShown,
    /// The pending notice belonged to another tab and was discarded
    OtherTab(u64),
}

/// Text content of one overlay
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayView {
    pub title: String,
    pub intro: String,
    pub message: String,
    pub dismiss_label: String,
}

impl OverlayView {
    pub fn new(config: &OverlayConfig, host: &str, message: &str) -> Self {
        Self {
            title: config.title.clone(),
            intro: format!(
                "The website you are currently visiting ({host}) is on a monitored list. \
                 The reason for the warning is:"
            ),
            message: message.to_string(),
            dismiss_label: config.dismiss_label.clone(),
        }
    }

    /// Draw the overlay as a framed box `width` columns wide
    pub fn render(&self, width: usize) -> String {
        let inner = width.saturating_sub(4).max(1);
        let rule = format!("+{}+", "=".repeat(inner + 2));
        let thin = format!("+{}+", "-".repeat(inner + 2));

        let mut out = Vec::new();
        out.push(rule.clone());
        out.extend(boxed(&self.title, inner));
        out.push(thin.clone());
        out.extend(boxed(&self.intro, inner));
        out.push(boxed_line("", inner));
        out.extend(boxed(&format!(">> {} <<", self.message), inner));
        out.push(boxed_line("", inner));
        out.extend(boxed(&format!("[ {} ]", self.dismiss_label), inner));
        out.push(rule);

        let mut text = out.join("\n");
        text.push('\n');
        text
    }
}

fn boxed(text: &str, inner: usize) -> Vec<String> {
    wrap(text, inner)
        .into_iter()
        .map(|line| boxed_line(&line, inner))
        .collect()
}

fn boxed_line(line: &str, inner: usize) -> String {
    let pad = inner.saturating_sub(line.chars().count());
    format!("| {}{} |", line, " ".repeat(pad))
}

/// Greedy word wrap; words longer than `width` are split.
pub(crate) fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            lines.push(word.drain(..width).collect());
        }
        let word: String = word.into_iter().collect();
        if word.is_empty() {
            continue;
        }
        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

/// Consumes Pending Notices and draws overlays
pub struct NoticeRenderer {
    store: Arc<dyn KeyValueStore>,
    overlay: OverlayConfig,
    sink: Mutex<Box<dyn Write + Send>>,
}

impl std::fmt::Debug for NoticeRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoticeRenderer")
            .field("overlay", &self.overlay)
            .finish_non_exhaustive()
    }
}

impl NoticeRenderer {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        overlay: OverlayConfig,
        sink: Box<dyn Write + Send>,
    ) -> Self {
        Self {
            store,
            overlay,
            sink: Mutex::new(sink),
        }
    }

    /// Renderer that draws to stdout
    pub fn to_stdout(store: Arc<dyn KeyValueStore>, overlay: OverlayConfig) -> Self {
        Self::new(store, overlay, Box::new(std::io::stdout()))
    }

    /// Run one render pass in `page`.
    pub fn render(&self, page: &mut PageContext) -> Result<RenderOutcome, RenderError> {
        let notice = PendingNotice::take(self.store.as_ref())?;
        self.display(page, notice)
    }

    fn display(
        &self,
        page: &mut PageContext,
        notice: Option<PendingNotice>,
    ) -> Result<RenderOutcome, RenderError> {
        let Some(notice) = notice else {
            return Ok(RenderOutcome::NothingPending);
        };
        if !notice.is_for(page.tab_id()) {
            log::warn!(
                "Discarding pending notice for tab {} while rendering tab {}",
                notice.tab_id,
                page.tab_id()
            );
            return Ok(RenderOutcome::OtherTab(notice.tab_id));
        }
        if notice.message.trim().is_empty() {
            return Ok(RenderOutcome::NothingPending);
        }
        if page.overlay_shown() {
            log::debug!("Overlay already shown in tab {}", page.tab_id());
            return Ok(RenderOutcome::AlreadyShown);
        }

        let view = OverlayView::new(&self.overlay, page.host(), &notice.message);
        let text = view.render(self.overlay.width);
        {
            let mut sink = self.sink.lock();
            sink.write_all(text.as_bytes())?;
            sink.flush()?;
        }
        page.mark_overlay_shown();
        log::info!("Displayed warning overlay in tab {} ({})", page.tab_id(), page.url());
        Ok(RenderOutcome::Displayed)
    }
}
