//! View types shared between the gallery library and its front-ends

use serde::{Deserialize, Serialize};
use strum::Display;

/// Status line shown while nobody is signed in
pub const SIGNED_OUT_STATUS: &str = "You are not signed in.";

/// An image the signed-in user may display, with its time-limited URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GalleryItem {
    /// Object key inside the private container
    pub key: String,
    /// Signed retrieval URL
    pub url: String,
}

/// What the gallery area currently shows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum GalleryView {
    /// Gallery area not displayed (signed out)
    Hidden,
    /// A listing is in flight
    Loading,
    /// Listing succeeded with at least one image
    Images(Vec<GalleryItem>),
    /// Inline text replacing the gallery (empty result or failure)
    Message(String),
}

/// Everything the page renders
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    pub status_line: String,
    pub sign_out_visible: bool,
    pub gallery: GalleryView,
}

impl ViewState {
    #[must_use]
    pub fn signed_out() -> Self {
        Self {
            status_line: SIGNED_OUT_STATUS.to_string(),
            sign_out_visible: false,
            gallery: GalleryView::Hidden,
        }
    }
}

impl Default for ViewState {
    fn default() -> Self {
        Self::signed_out()
    }
}
