//! MangaDex API response types and their mapping into domain records.
//!
//! Everything here is pure: no I/O, no state. Optional and nested
//! fields are fallible lookups with defined fallbacks, never unchecked
//! dereferences.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

use crate::traits::{
    Chapter, ChapterPages, MangaDetail, MangaStatus, MangaSummary, MangaTile, Tag, TagSection,
};

pub const COVERS_URL: &str = "https://uploads.mangadex.org/covers";

/// Name fallback for absent author/artist/scanlation-group
/// relationships.
const UNKNOWN_NAME: &str = "Unknown";
/// Title fallback for an empty localized-string map.
const UNKNOWN_TITLE: &str = "Unknown Title";

// ── Localized strings ────────────────────────────────────────────

/// MangaDex localized string: a map from language code to text.
///
/// Key order is preserved (serde_json `preserve_order`), because the
/// documented fallback is the first entry of the map.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct LocalizedString(serde_json::Map<String, serde_json::Value>);

impl LocalizedString {
    /// The entry for `lang`, if present and a string.
    pub fn get(&self, lang: &str) -> Option<&str> {
        self.0.get(lang).and_then(|v| v.as_str())
    }

    /// The entry for `lang` if present, else the first string value in
    /// map order.
    pub fn preferred(&self, lang: &str) -> Option<&str> {
        self.get(lang)
            .or_else(|| self.0.values().find_map(|v| v.as_str()))
    }
}

// ── Relationship records ─────────────────────────────────────────

/// MangaDex generic typed reference attached to a parent entity
/// (author, artist, cover_art, scanlation_group).
#[derive(Debug, Clone, Deserialize)]
pub struct MdRelationship {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub attributes: Option<MdRelAttributes>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MdRelAttributes {
    pub name: Option<String>,
    pub file_name: Option<String>,
}

/// First relationship of the given type, if any.
fn first_rel<'a>(rels: &'a [MdRelationship], kind: &str) -> Option<&'a MdRelAttributes> {
    rels.iter()
        .find(|r| r.kind == kind)
        .and_then(|r| r.attributes.as_ref())
}

fn rel_name(rels: &[MdRelationship], kind: &str) -> String {
    first_rel(rels, kind)
        .and_then(|a| a.name.clone())
        .unwrap_or_else(|| UNKNOWN_NAME.into())
}

pub fn author_name(rels: &[MdRelationship]) -> String {
    rel_name(rels, "author")
}

pub fn artist_name(rels: &[MdRelationship]) -> String {
    rel_name(rels, "artist")
}

pub fn group_name(rels: &[MdRelationship]) -> String {
    rel_name(rels, "scanlation_group")
}

/// Cover-art file name, empty when the manga has no cover art.
pub fn cover_file_name(rels: &[MdRelationship]) -> String {
    first_rel(rels, "cover_art")
        .and_then(|a| a.file_name.clone())
        .unwrap_or_default()
}

// ── Cover URLs ───────────────────────────────────────────────────

/// Requested cover rendition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverSize {
    /// 256px, for listing tiles.
    Thumb,
    /// 512px, for the detail view.
    Full,
}

impl CoverSize {
    fn suffix(self) -> u32 {
        match self {
            Self::Thumb => 256,
            Self::Full => 512,
        }
    }
}

/// Build a cover image URL. An empty file name yields an empty string
/// rather than a malformed URL.
pub fn cover_url(manga_id: &str, file_name: &str, size: CoverSize) -> String {
    if file_name.is_empty() {
        return String::new();
    }
    format!("{COVERS_URL}/{manga_id}/{file_name}.{}.jpg", size.suffix())
}

// ── Manga responses ──────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct MdMangaResponse {
    pub data: MdManga,
}

/// A manga listing page. A missing or non-array `data` field maps to
/// an empty list, not an error.
#[derive(Debug, Default, Deserialize)]
pub struct MdMangaListResponse {
    #[serde(default, deserialize_with = "lenient_list")]
    pub data: Vec<MdManga>,
}

#[derive(Debug, Deserialize)]
pub struct MdManga {
    pub id: String,
    pub attributes: MdMangaAttributes,
    #[serde(default)]
    pub relationships: Vec<MdRelationship>,
}

#[derive(Debug, Deserialize)]
pub struct MdMangaAttributes {
    #[serde(default)]
    pub title: LocalizedString,
    #[serde(default)]
    pub description: LocalizedString,
    pub status: Option<String>,
    #[serde(default)]
    pub tags: Vec<MdTag>,
}

impl MdManga {
    fn display_title(&self, lang: &str) -> String {
        self.attributes
            .title
            .preferred(lang)
            .unwrap_or(UNKNOWN_TITLE)
            .to_string()
    }

    fn status(&self) -> MangaStatus {
        self.attributes
            .status
            .as_deref()
            .map(MangaStatus::from_api)
            .unwrap_or(MangaStatus::Unknown)
    }

    pub fn into_summary(self, lang: &str, size: CoverSize) -> MangaSummary {
        let title = self.display_title(lang);
        let cover = cover_url(&self.id, &cover_file_name(&self.relationships), size);
        MangaSummary {
            titles: vec![title],
            cover_url: cover,
            status: self.status(),
            author: author_name(&self.relationships),
            artist: artist_name(&self.relationships),
            id: self.id,
        }
    }

    pub fn into_detail(self, lang: &str) -> MangaDetail {
        let description = self
            .attributes
            .description
            .preferred(lang)
            .unwrap_or_default()
            .to_string();
        let tags = tag_section(&self.attributes.tags, lang);
        MangaDetail {
            summary: self.into_summary(lang, CoverSize::Full),
            description,
            tags,
        }
    }

    pub fn into_tile(self, lang: &str) -> MangaTile {
        let title = self.display_title(lang);
        let cover = cover_url(
            &self.id,
            &cover_file_name(&self.relationships),
            CoverSize::Thumb,
        );
        MangaTile {
            id: self.id,
            title,
            cover_url: cover,
        }
    }
}

// ── Chapter feed responses ───────────────────────────────────────

/// One page of a manga's chapter feed. A missing or non-array `data`
/// field maps to an empty list, not an error.
#[derive(Debug, Default, Deserialize)]
pub struct MdChapterFeedResponse {
    #[serde(default, deserialize_with = "lenient_list")]
    pub data: Vec<MdChapter>,
}

#[derive(Debug, Deserialize)]
pub struct MdChapter {
    pub id: String,
    pub attributes: MdChapterAttributes,
    #[serde(default)]
    pub relationships: Vec<MdRelationship>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MdChapterAttributes {
    pub chapter: Option<String>,
    pub title: Option<String>,
    pub publish_at: Option<String>,
    pub translated_language: Option<String>,
}

impl MdChapter {
    pub fn into_chapter(self, manga_id: &str, default_lang: &str) -> Chapter {
        // Non-numeric chapter strings (e.g. "oneshot") normalize to 0
        // rather than failing; this is a deliberate lossy fallback.
        let number = self
            .attributes
            .chapter
            .as_deref()
            .and_then(|s| s.parse::<f32>().ok())
            .unwrap_or(0.0);

        let name = self
            .attributes
            .title
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| format!("Chapter {number}"));

        let published_at = self
            .attributes
            .publish_at
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|d| d.with_timezone(&Utc));

        Chapter {
            group: group_name(&self.relationships),
            id: self.id,
            manga_id: manga_id.to_string(),
            number,
            name,
            language: self
                .attributes
                .translated_language
                .unwrap_or_else(|| default_lang.to_string()),
            published_at,
        }
    }
}

// ── Chapter pages (at-home server) ───────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AtHomeResponse {
    pub base_url: String,
    pub chapter: AtHomeChapter,
}

#[derive(Debug, Deserialize)]
pub struct AtHomeChapter {
    pub hash: String,
    #[serde(default)]
    pub data: Vec<String>,
}

impl AtHomeResponse {
    /// Build the page URLs in the order given by the response; that
    /// order is the reading order.
    pub fn into_pages(self, manga_id: &str, chapter_id: &str) -> ChapterPages {
        let pages = self
            .chapter
            .data
            .iter()
            .map(|file| format!("{}/data/{}/{}", self.base_url, self.chapter.hash, file))
            .collect();
        ChapterPages {
            id: chapter_id.to_string(),
            manga_id: manga_id.to_string(),
            pages,
        }
    }
}

// ── Tags ─────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct MdTagListResponse {
    #[serde(default, deserialize_with = "lenient_list")]
    pub data: Vec<MdTag>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MdTag {
    pub id: String,
    #[serde(default)]
    pub attributes: MdTagAttributes,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MdTagAttributes {
    #[serde(default)]
    pub name: LocalizedString,
}

/// Collect tags with a non-empty label in the preferred language into
/// the host's single "Genres" section; unlabeled tags are dropped.
pub fn tag_section(tags: &[MdTag], lang: &str) -> TagSection {
    let tags = tags
        .iter()
        .filter_map(|tag| {
            let label = tag.attributes.name.get(lang)?;
            if label.is_empty() {
                return None;
            }
            Some(Tag {
                id: tag.id.clone(),
                label: label.to_string(),
            })
        })
        .collect();
    TagSection {
        id: "0".into(),
        label: "Genres".into(),
        tags,
    }
}

// ── Lenient list deserialization ─────────────────────────────────

/// Deserialize a JSON array, mapping a wrong-typed value to an empty
/// list and dropping elements that do not match the expected shape.
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::Array(items) => Ok(items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect()),
        _ => Ok(Vec::new()),
    }
}
