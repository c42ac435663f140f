//! Game DTOs decoded from `/games/` responses.
//!
//! # Design
//! Only the fields the collection pages display are modelled. Every field but
//! `name` and `slug` may be missing because callers choose which `fields` to
//! request.

use serde::{Deserialize, Serialize};

/// Image host serving IGDB cover art by Cloudinary id.
pub const COVER_ENDPOINT: &str = "https://images.igdb.com/igdb/image/upload/";

/// A single game returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Game {
    #[serde(default)]
    pub id: Option<u64>,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub summary: Option<String>,
    /// Milliseconds since the Unix epoch.
    #[serde(default)]
    pub first_release_date: Option<f64>,
    #[serde(default)]
    pub cover: Option<Cover>,
}

/// Cover art reference. IGDB sends a Cloudinary id, a URL, or both.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Cover {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloudinary_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Cover {
    /// The stored reference, preferring the Cloudinary id over the URL.
    pub fn reference(&self) -> Option<&str> {
        self.cloudinary_id.as_deref().or(self.url.as_deref())
    }

    /// Image URL for `size` (e.g. `cover_big`, `t_thumb`).
    ///
    /// References containing `/` are already URLs and are returned as-is.
    pub fn url_for(&self, size: &str) -> Option<String> {
        let reference = self.reference()?;
        if reference.contains('/') {
            return Some(reference.to_string());
        }
        Some(format!("{COVER_ENDPOINT}{size}/{reference}.png"))
    }
}

impl Game {
    pub fn cover_url(&self, size: &str) -> Option<String> {
        self.cover.as_ref().and_then(|cover| cover.url_for(size))
    }
}
