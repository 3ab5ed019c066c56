//! Host-facing contract for a manga content source.
//!
//! The reading host is written against [`MangaSource`] and the domain
//! records below; everything MangaDex-specific stays behind the trait.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A manga content source.
pub trait MangaSource: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Fetch full details for one manga.
    fn manga_details(
        &self,
        manga_id: &str,
    ) -> impl Future<Output = Result<MangaDetail, Self::Error>> + Send;

    /// Fetch the complete chapter feed for a manga, across all pages.
    fn chapters(
        &self,
        manga_id: &str,
    ) -> impl Future<Output = Result<Vec<Chapter>, Self::Error>> + Send;

    /// Fetch the page image URLs for one chapter, in reading order.
    fn chapter_pages(
        &self,
        manga_id: &str,
        chapter_id: &str,
    ) -> impl Future<Output = Result<ChapterPages, Self::Error>> + Send;

    /// Search by title. `page` starts at 0; the returned continuation
    /// token resumes the listing.
    fn search(
        &self,
        title: &str,
        page: u32,
    ) -> impl Future<Output = Result<PagedResults<MangaTile>, Self::Error>> + Send;

    /// Fetch all home-page sections with their first page of tiles.
    fn home_sections(
        &self,
    ) -> impl Future<Output = Result<Vec<HomeSection>, Self::Error>> + Send;

    /// Fetch one more page of a home-page section.
    fn view_more(
        &self,
        section_id: &str,
        page: u32,
    ) -> impl Future<Output = Result<PagedResults<MangaTile>, Self::Error>> + Send;

    /// Fetch the tag list offered as search filters.
    fn tags(&self) -> impl Future<Output = Result<TagSection, Self::Error>> + Send;
}

/// Publication status of a manga.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MangaStatus {
    Ongoing,
    Completed,
    Hiatus,
    Cancelled,
    Unknown,
}

impl MangaStatus {
    /// Map the MangaDex `status` attribute. Anything unrecognized
    /// (including a missing field) is `Unknown`.
    pub fn from_api(status: &str) -> Self {
        match status {
            "ongoing" => Self::Ongoing,
            "completed" => Self::Completed,
            "hiatus" => Self::Hiatus,
            "cancelled" => Self::Cancelled,
            _ => Self::Unknown,
        }
    }
}

/// Core manga record shared by detail and listing views.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MangaSummary {
    /// Upstream manga identifier; opaque, used to build all dependent
    /// URLs.
    pub id: String,
    /// Display titles; the first entry is the chosen display title.
    pub titles: Vec<String>,
    /// Full-size cover URL, or empty when the manga has no cover art.
    pub cover_url: String,
    pub status: MangaStatus,
    pub author: String,
    pub artist: String,
}

/// Full manga details as shown on a detail view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MangaDetail {
    #[serde(flatten)]
    pub summary: MangaSummary,
    /// Description in the preferred language; possibly empty.
    pub description: String,
    pub tags: TagSection,
}

/// One chapter in a manga's feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chapter {
    pub id: String,
    pub manga_id: String,
    /// Chapter number; non-numeric upstream values normalize to 0.
    pub number: f32,
    /// Display name, falling back to `Chapter {number}`.
    pub name: String,
    /// Translated-language code of this chapter.
    pub language: String,
    pub published_at: Option<DateTime<Utc>>,
    /// Scanlation-group name, `"Unknown"` when uncredited.
    pub group: String,
}

/// Page image URLs for one chapter, in reading order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChapterPages {
    pub id: String,
    pub manga_id: String,
    pub pages: Vec<String>,
}

/// Minimal manga projection for search results and home sections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MangaTile {
    pub id: String,
    pub title: String,
    /// Thumbnail cover URL, or empty when the manga has no cover art.
    pub cover_url: String,
}

/// A search-filter tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: String,
    pub label: String,
}

/// A named group of tags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagSection {
    pub id: String,
    pub label: String,
    pub tags: Vec<Tag>,
}

/// A home-page row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HomeSection {
    pub id: String,
    pub title: String,
    pub items: Vec<MangaTile>,
}

/// One page of a listing, with a continuation token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagedResults<T> {
    pub results: Vec<T>,
    /// Page number to request next, absent when the listing is
    /// exhausted.
    pub next_page: Option<u32>,
}
