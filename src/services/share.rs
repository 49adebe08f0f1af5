//! Share modal
//!
//! Turns a coloring page into an absolute link and the five share targets,
//! and models the copy-link action with its short-lived "copied" indicator.
//! The clipboard and new-window capabilities live behind traits.

use crate::services::toast::Toast;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// How long the "copied" indicator stays on
pub const COPIED_INDICATOR: Duration = Duration::from_millis(2000);

const DISPLAY_URL_MAX: usize = 40;
const DISPLAY_URL_KEEP: usize = 37;

/// Percent-encode one URL component.
///
/// Leaves `!'()*` alone, matching what browsers produce for share links.
pub fn encode_component(value: &str) -> String {
    urlencoding::encode(value)
        .replace("%21", "!")
        .replace("%27", "'")
        .replace("%28", "(")
        .replace("%29", ")")
        .replace("%2A", "*")
}

/// Absolute link for a page.
///
/// Paths already starting with `http` are used as-is; anything else is
/// joined to the canonical origin when configured, otherwise to the origin
/// of the current request.
pub fn absolute_url(page_url: &str, canonical_origin: Option<&str>, request_origin: &str) -> String {
    if page_url.starts_with("http") {
        return page_url.to_string();
    }
    let origin = canonical_origin
        .filter(|origin| !origin.trim().is_empty())
        .unwrap_or(request_origin);
    format!("{}{}", origin.trim_end_matches('/'), page_url)
}

/// Toast shown once a link is on the clipboard
pub fn copied_toast() -> Toast {
    Toast::info("Link copied!", "The link has been copied to your clipboard.")
}

/// Toast shown when the clipboard rejects a write
pub fn copy_failed_toast() -> Toast {
    Toast::error("Failed to copy", "Please try again or copy the link manually.")
}

/// Shortened form of a URL for display
pub fn display_url(url: &str) -> String {
    if url.chars().count() > DISPLAY_URL_MAX {
        let kept: String = url.chars().take(DISPLAY_URL_KEEP).collect();
        format!("{}...", kept)
    } else {
        url.to_string()
    }
}

/// Where a page can be shared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShareTarget {
    Facebook,
    Twitter,
    Pinterest,
    WhatsApp,
    Email,
}

impl ShareTarget {
    pub const ALL: [ShareTarget; 5] = [
        ShareTarget::Facebook,
        ShareTarget::Twitter,
        ShareTarget::Pinterest,
        ShareTarget::WhatsApp,
        ShareTarget::Email,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ShareTarget::Facebook => "Facebook",
            ShareTarget::Twitter => "Twitter",
            ShareTarget::Pinterest => "Pinterest",
            ShareTarget::WhatsApp => "WhatsApp",
            ShareTarget::Email => "Email",
        }
    }

    /// Path segment used by `/share/{target}`
    pub fn slug(&self) -> &'static str {
        match self {
            ShareTarget::Facebook => "facebook",
            ShareTarget::Twitter => "twitter",
            ShareTarget::Pinterest => "pinterest",
            ShareTarget::WhatsApp => "whatsapp",
            ShareTarget::Email => "email",
        }
    }

    /// Brand color of the button
    pub fn color(&self) -> &'static str {
        match self {
            ShareTarget::Facebook => "#1877F2",
            ShareTarget::Twitter => "#1DA1F2",
            ShareTarget::Pinterest => "#E60023",
            ShareTarget::WhatsApp => "#25D366",
            ShareTarget::Email => "#9d84ff",
        }
    }

    /// Target URL for sharing `link`
    pub fn share_url(&self, link: &ShareLink) -> String {
        let url = encode_component(&link.url);
        let title = encode_component(&link.title);
        match self {
            ShareTarget::Facebook => {
                format!("https://www.facebook.com/sharer/sharer.php?u={}&quote={}", url, title)
            }
            ShareTarget::Twitter => {
                format!("https://twitter.com/intent/tweet?url={}&text={}", url, title)
            }
            ShareTarget::Pinterest => format!(
                "https://pinterest.com/pin/create/button/?url={}&media={}&description={}",
                url,
                encode_component(&link.image_url),
                title
            ),
            ShareTarget::WhatsApp => format!(
                "https://wa.me/?text={}",
                encode_component(&format!("{} {}", link.title, link.url))
            ),
            ShareTarget::Email => format!(
                "mailto:?subject={}&body={}",
                encode_component(&format!("Check out this coloring page: {}", link.title)),
                encode_component(&format!(
                    "I found this awesome coloring page on ColorMyPage: {}",
                    link.url
                ))
            ),
        }
    }
}

impl fmt::Display for ShareTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for ShareTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.to_ascii_lowercase();
        ShareTarget::ALL
            .into_iter()
            .find(|target| target.slug() == s)
            .ok_or_else(|| format!("Unknown share target: {}", s))
    }
}

/// A page to share, with its link already absolute
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShareLink {
    pub title: String,
    pub image_url: String,
    pub url: String,
}

impl ShareLink {
    pub fn new(
        title: impl Into<String>,
        image_url: impl Into<String>,
        page_url: &str,
        canonical_origin: Option<&str>,
        request_origin: &str,
    ) -> Self {
        Self {
            title: title.into(),
            image_url: image_url.into(),
            url: absolute_url(page_url, canonical_origin, request_origin),
        }
    }
}

/// One share button
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShareOption {
    pub target: ShareTarget,
    pub name: &'static str,
    pub color: &'static str,
    pub href: String,
}

/// Everything the share modal renders
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShareView {
    pub title: String,
    pub image_url: String,
    pub url: String,
    pub display_url: String,
    pub options: Vec<ShareOption>,
}

impl From<&ShareLink> for ShareView {
    fn from(link: &ShareLink) -> Self {
        Self {
            title: link.title.clone(),
            image_url: link.image_url.clone(),
            url: link.url.clone(),
            display_url: display_url(&link.url),
            options: ShareTarget::ALL
                .into_iter()
                .map(|target| ShareOption {
                    target,
                    name: target.name(),
                    color: target.color(),
                    href: target.share_url(link),
                })
                .collect(),
        }
    }
}

/// Clipboard capability
#[async_trait]
pub trait Clipboard: Send + Sync {
    async fn write_text(&self, text: &str) -> anyhow::Result<()>;
}

/// New-window capability
pub trait Browser: Send + Sync {
    /// Open `url` in a new browsing context without an opener reference
    fn open_new_window(&self, url: &str) -> anyhow::Result<()>;
}

/// "Copied" indicator that switches itself off after [`COPIED_INDICATOR`]
#[derive(Debug, Default)]
pub struct CopyIndicator {
    copied_at: Mutex<Option<Instant>>,
}

impl CopyIndicator {
    pub fn mark(&self, now: Instant) {
        *self.copied_at.lock().unwrap_or_else(|e| e.into_inner()) = Some(now);
    }

    pub fn is_active(&self, now: Instant) -> bool {
        self.copied_at
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_some_and(|at| now.saturating_duration_since(at) < COPIED_INDICATOR)
    }
}

/// Share modal state for one page
pub struct ShareModal {
    link: ShareLink,
    indicator: CopyIndicator,
}

impl ShareModal {
    pub fn new(link: ShareLink) -> Self {
        Self {
            link,
            indicator: CopyIndicator::default(),
        }
    }

    pub fn view(&self) -> ShareView {
        ShareView::from(&self.link)
    }

    pub fn is_copied(&self, now: Instant) -> bool {
        self.indicator.is_active(now)
    }

    /// Copy the absolute link and report the result as a toast
    pub async fn copy_link(&self, clipboard: &dyn Clipboard, now: Instant) -> Toast {
        match clipboard.write_text(&self.link.url).await {
            Ok(()) => {
                self.indicator.mark(now);
                copied_toast()
            }
            Err(e) => {
                tracing::warn!("Failed to copy share link: {:#}", e);
                copy_failed_toast()
            }
        }
    }

    /// Open the share target in a new window
    pub fn share(&self, target: ShareTarget, browser: &dyn Browser) -> anyhow::Result<()> {
        browser.open_new_window(&target.share_url(&self.link))
    }
}
