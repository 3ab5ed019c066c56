//! MangaDex client: builds requests, paginates, and hands the bodies
//! to the mapping layer in [`super::types`].

use serde::de::DeserializeOwned;

use super::types::{
    AtHomeResponse, MdChapterFeedResponse, MdMangaListResponse, MdMangaResponse,
    MdTagListResponse, tag_section,
};
use crate::config::SourceConfig;
use crate::error::SourceError;
use crate::traits::{
    Chapter, ChapterPages, HomeSection, MangaDetail, MangaSource, MangaTile, PagedResults,
    TagSection,
};
use crate::transport::{HttpTransport, Transport};

const API_URL: &str = "https://api.mangadex.org";
const SITE_URL: &str = "https://mangadex.org";

/// Chapter feed page size.
const FEED_LIMIT: usize = 100;
/// Manga listing page size (search, home sections).
const LISTING_LIMIT: usize = 20;

struct SectionDef {
    id: &'static str,
    title: &'static str,
    order_key: &'static str,
}

/// Home-page sections, in display order.
const SECTIONS: &[SectionDef] = &[
    SectionDef {
        id: "popular",
        title: "Popular Manga",
        order_key: "order[followedCount]",
    },
    SectionDef {
        id: "recent",
        title: "Recently Updated",
        order_key: "order[latestUploadedChapter]",
    },
];

/// MangaDex content source.
///
/// Generic over the transport so list operations can be tested against
/// canned responses; hosts use the [`HttpTransport`] default.
pub struct MangaDexSource<T = HttpTransport> {
    transport: T,
    config: SourceConfig,
}

impl MangaDexSource<HttpTransport> {
    pub fn new(config: SourceConfig) -> Result<Self, SourceError> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self { transport, config })
    }
}

impl<T: Transport> MangaDexSource<T> {
    pub fn with_transport(transport: T, config: SourceConfig) -> Self {
        Self { transport, config }
    }

    /// Web URL for sharing a manga outside the reader.
    pub fn manga_share_url(&self, manga_id: &str) -> String {
        format!("{SITE_URL}/title/{manga_id}")
    }

    /// Query parameters shared by every manga listing request.
    fn listing_query(&self, offset: usize) -> Vec<(String, String)> {
        let mut query = vec![
            ("limit".into(), LISTING_LIMIT.to_string()),
            ("offset".into(), offset.to_string()),
            ("includes[]".into(), "cover_art".into()),
            ("hasAvailableChapters".into(), "true".into()),
            (
                "availableTranslatedLanguage[]".into(),
                self.config.language.clone(),
            ),
        ];
        for rating in &self.config.content_ratings {
            query.push(("contentRating[]".into(), rating.as_str().into()));
        }
        query
    }

    /// Fetch one listing page and map it to tiles, with a continuation
    /// token when the page came back full.
    async fn listing_page(
        &self,
        query: Vec<(String, String)>,
        page: u32,
    ) -> Result<PagedResults<MangaTile>, SourceError> {
        let body = self.transport.get(&format!("{API_URL}/manga"), &query).await?;
        let list: MdMangaListResponse = parse(&body, "manga listing")?;

        let full = list.data.len() == LISTING_LIMIT;
        let results = list
            .data
            .into_iter()
            .map(|m| m.into_tile(&self.config.language))
            .collect();

        Ok(PagedResults {
            results,
            next_page: full.then_some(page + 1),
        })
    }
}

impl<T: Transport> MangaSource for MangaDexSource<T> {
    type Error = SourceError;

    async fn manga_details(&self, manga_id: &str) -> Result<MangaDetail, SourceError> {
        let query: Vec<(String, String)> = ["cover_art", "author", "artist"]
            .iter()
            .map(|inc| ("includes[]".to_string(), inc.to_string()))
            .collect();

        let body = self
            .transport
            .get(&format!("{API_URL}/manga/{manga_id}"), &query)
            .await?;
        let resp: MdMangaResponse = parse(&body, "manga details")?;
        Ok(resp.data.into_detail(&self.config.language))
    }

    async fn chapters(&self, manga_id: &str) -> Result<Vec<Chapter>, SourceError> {
        let mut chapters = Vec::new();
        let mut offset = 0usize;

        // Offset cursor over the feed; a short or empty page signals
        // end-of-data. The upstream gives no consistency guarantee
        // between pages and none is added here.
        loop {
            let query = vec![
                ("limit".into(), FEED_LIMIT.to_string()),
                ("offset".into(), offset.to_string()),
                (
                    "translatedLanguage[]".into(),
                    self.config.language.clone(),
                ),
                ("order[chapter]".into(), "desc".into()),
                ("includes[]".into(), "scanlation_group".into()),
            ];

            let body = self
                .transport
                .get(&format!("{API_URL}/manga/{manga_id}/feed"), &query)
                .await?;
            let page: MdChapterFeedResponse = parse(&body, "chapter feed")?;

            let count = page.data.len();
            chapters.extend(
                page.data
                    .into_iter()
                    .map(|c| c.into_chapter(manga_id, &self.config.language)),
            );

            if count < FEED_LIMIT {
                break;
            }
            offset += FEED_LIMIT;
        }

        tracing::debug!(manga_id, total = chapters.len(), "fetched chapter feed");
        Ok(chapters)
    }

    async fn chapter_pages(
        &self,
        manga_id: &str,
        chapter_id: &str,
    ) -> Result<ChapterPages, SourceError> {
        let body = self
            .transport
            .get(&format!("{API_URL}/at-home/server/{chapter_id}"), &[])
            .await?;
        let resp: AtHomeResponse = parse(&body, "at-home server")?;
        Ok(resp.into_pages(manga_id, chapter_id))
    }

    async fn search(
        &self,
        title: &str,
        page: u32,
    ) -> Result<PagedResults<MangaTile>, SourceError> {
        let mut query = self.listing_query(page as usize * LISTING_LIMIT);
        if !title.is_empty() {
            query.push(("title".into(), title.into()));
        }
        self.listing_page(query, page).await
    }

    async fn home_sections(&self) -> Result<Vec<HomeSection>, SourceError> {
        let mut sections = Vec::with_capacity(SECTIONS.len());
        for def in SECTIONS {
            let mut query = self.listing_query(0);
            query.push((def.order_key.into(), "desc".into()));

            let page = self.listing_page(query, 0).await?;
            sections.push(HomeSection {
                id: def.id.into(),
                title: def.title.into(),
                items: page.results,
            });
        }
        Ok(sections)
    }

    async fn view_more(
        &self,
        section_id: &str,
        page: u32,
    ) -> Result<PagedResults<MangaTile>, SourceError> {
        let def = SECTIONS
            .iter()
            .find(|s| s.id == section_id)
            .ok_or_else(|| SourceError::InvalidSection(section_id.to_string()))?;

        let mut query = self.listing_query(page as usize * LISTING_LIMIT);
        query.push((def.order_key.into(), "desc".into()));
        self.listing_page(query, page).await
    }

    async fn tags(&self) -> Result<TagSection, SourceError> {
        let body = self
            .transport
            .get(&format!("{API_URL}/manga/tag"), &[])
            .await?;
        let resp: MdTagListResponse = parse(&body, "tag list")?;
        Ok(tag_section(&resp.data, &self.config.language))
    }
}

fn parse<T: DeserializeOwned>(body: &str, context: &str) -> Result<T, SourceError> {
    serde_json::from_str(body).map_err(|e| SourceError::Malformed(format!("{context}: {e}")))
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;

    /// Serves canned bodies in order and records every request.
    struct MockTransport {
        responses: Mutex<VecDeque<String>>,
        requests: Mutex<Vec<(String, Vec<(String, String)>)>>,
    }

    impl MockTransport {
        fn new(responses: Vec<String>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn requests(&self) -> Vec<(String, Vec<(String, String)>)> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl Transport for &MockTransport {
        async fn get(&self, url: &str, query: &[(String, String)]) -> Result<String, SourceError> {
            self.requests
                .lock()
                .unwrap()
                .push((url.to_string(), query.to_vec()));
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| SourceError::Malformed("mock transport exhausted".into()))
        }
    }

    fn source(transport: &MockTransport) -> MangaDexSource<&MockTransport> {
        MangaDexSource::with_transport(transport, SourceConfig::default())
    }

    fn query_value<'a>(query: &'a [(String, String)], key: &str) -> Option<&'a str> {
        query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn feed_page(start: usize, count: usize) -> String {
        let items: Vec<serde_json::Value> = (0..count)
            .map(|i| {
                serde_json::json!({
                    "id": format!("ch-{}", start + i),
                    "attributes": {
                        "chapter": format!("{}", start + i + 1),
                        "title": null,
                        "publishAt": "2024-01-01T00:00:00+00:00",
                        "translatedLanguage": "en"
                    },
                    "relationships": [
                        { "type": "scanlation_group", "attributes": { "name": "Ember" } }
                    ]
                })
            })
            .collect();
        serde_json::json!({ "data": items }).to_string()
    }

    fn listing_page_body(count: usize) -> String {
        let items: Vec<serde_json::Value> = (0..count)
            .map(|i| {
                serde_json::json!({
                    "id": format!("m-{i}"),
                    "attributes": { "title": { "en": format!("Manga {i}") } },
                    "relationships": [
                        { "type": "cover_art", "attributes": { "fileName": "c.jpg" } }
                    ]
                })
            })
            .collect();
        serde_json::json!({ "data": items }).to_string()
    }

    #[tokio::test]
    async fn test_chapter_pagination_terminates_on_short_page() {
        let transport = MockTransport::new(vec![
            feed_page(0, 100),
            feed_page(100, 100),
            feed_page(200, 42),
        ]);
        let source = source(&transport);

        let chapters = source.chapters("m1").await.unwrap();
        assert_eq!(chapters.len(), 242);
        // Concatenated in request order.
        assert_eq!(chapters[0].id, "ch-0");
        assert_eq!(chapters[241].id, "ch-241");

        let requests = transport.requests();
        assert_eq!(requests.len(), 3);
        for (url, _) in &requests {
            assert_eq!(url, "https://api.mangadex.org/manga/m1/feed");
        }
        let offsets: Vec<&str> = requests
            .iter()
            .map(|(_, q)| query_value(q, "offset").unwrap())
            .collect();
        assert_eq!(offsets, vec!["0", "100", "200"]);
    }

    #[tokio::test]
    async fn test_chapter_pagination_full_page_then_empty() {
        let transport = MockTransport::new(vec![feed_page(0, 100), feed_page(100, 0)]);
        let source = source(&transport);

        let chapters = source.chapters("m1").await.unwrap();
        assert_eq!(chapters.len(), 100);
        // The empty page ends the loop without a third fetch and
        // without duplicating entries.
        assert_eq!(transport.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_chapter_feed_query_shape() {
        let transport = MockTransport::new(vec![feed_page(0, 1)]);
        let source = source(&transport);

        source.chapters("m1").await.unwrap();

        let requests = transport.requests();
        let query = &requests[0].1;
        assert_eq!(query_value(query, "limit"), Some("100"));
        assert_eq!(query_value(query, "translatedLanguage[]"), Some("en"));
        assert_eq!(query_value(query, "order[chapter]"), Some("desc"));
        assert_eq!(query_value(query, "includes[]"), Some("scanlation_group"));
    }

    #[tokio::test]
    async fn test_manga_details_roundtrip() {
        let body = serde_json::json!({
            "data": {
                "id": "m1",
                "attributes": {
                    "title": { "en": "Dorohedoro" },
                    "description": { "en": "Magic and mayhem." },
                    "status": "completed",
                    "tags": [
                        { "id": "t1", "attributes": { "name": { "en": "Seinen" } } }
                    ]
                },
                "relationships": [
                    { "type": "author", "attributes": { "name": "Q Hayashida" } },
                    { "type": "artist", "attributes": { "name": "Q Hayashida" } },
                    { "type": "cover_art", "attributes": { "fileName": "d.jpg" } }
                ]
            }
        })
        .to_string();

        let transport = MockTransport::new(vec![body]);
        let source = source(&transport);

        let detail = source.manga_details("m1").await.unwrap();
        assert_eq!(detail.summary.titles, vec!["Dorohedoro".to_string()]);
        assert_eq!(detail.summary.author, "Q Hayashida");
        assert_eq!(
            detail.summary.cover_url,
            "https://uploads.mangadex.org/covers/m1/d.jpg.512.jpg"
        );
        assert_eq!(detail.tags.tags.len(), 1);

        let requests = transport.requests();
        assert_eq!(requests[0].0, "https://api.mangadex.org/manga/m1");
        // cover_art, author, artist includes.
        let includes: Vec<&str> = requests[0]
            .1
            .iter()
            .filter(|(k, _)| k == "includes[]")
            .map(|(_, v)| v.as_str())
            .collect();
        assert_eq!(includes, vec!["cover_art", "author", "artist"]);
    }

    #[tokio::test]
    async fn test_manga_details_malformed_body() {
        let transport = MockTransport::new(vec![r#"{ "data": { "id": "m1" } }"#.to_string()]);
        let source = source(&transport);

        let err = source.manga_details("m1").await.unwrap_err();
        assert!(matches!(err, SourceError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_chapter_pages_roundtrip() {
        let body = serde_json::json!({
            "baseUrl": "https://node.mangadex.network",
            "chapter": { "hash": "H", "data": ["1.png", "2.png", "3.png"] }
        })
        .to_string();

        let transport = MockTransport::new(vec![body]);
        let source = source(&transport);

        let pages = source.chapter_pages("m1", "c1").await.unwrap();
        assert_eq!(pages.pages.len(), 3);
        assert_eq!(pages.pages[0], "https://node.mangadex.network/data/H/1.png");

        let requests = transport.requests();
        assert_eq!(requests[0].0, "https://api.mangadex.org/at-home/server/c1");
    }

    #[tokio::test]
    async fn test_search_full_page_has_continuation() {
        let transport = MockTransport::new(vec![listing_page_body(20)]);
        let source = source(&transport);

        let results = source.search("solo leveling", 0).await.unwrap();
        assert_eq!(results.results.len(), 20);
        assert_eq!(results.next_page, Some(1));

        let requests = transport.requests();
        let query = &requests[0].1;
        assert_eq!(query_value(query, "title"), Some("solo leveling"));
        assert_eq!(query_value(query, "limit"), Some("20"));
        assert_eq!(query_value(query, "offset"), Some("0"));
        assert_eq!(query_value(query, "hasAvailableChapters"), Some("true"));
        // Default content-rating filters.
        let ratings: Vec<&str> = query
            .iter()
            .filter(|(k, _)| k == "contentRating[]")
            .map(|(_, v)| v.as_str())
            .collect();
        assert_eq!(ratings, vec!["safe", "suggestive"]);
    }

    #[tokio::test]
    async fn test_search_short_page_is_exhausted() {
        let transport = MockTransport::new(vec![listing_page_body(7)]);
        let source = source(&transport);

        let results = source.search("obscure", 2).await.unwrap();
        assert_eq!(results.results.len(), 7);
        assert_eq!(results.next_page, None);

        let requests = transport.requests();
        assert_eq!(query_value(&requests[0].1, "offset"), Some("40"));
    }

    #[tokio::test]
    async fn test_search_without_title_omits_param() {
        let transport = MockTransport::new(vec![listing_page_body(0)]);
        let source = source(&transport);

        source.search("", 0).await.unwrap();
        let requests = transport.requests();
        assert_eq!(query_value(&requests[0].1, "title"), None);
    }

    #[tokio::test]
    async fn test_home_sections() {
        let transport =
            MockTransport::new(vec![listing_page_body(20), listing_page_body(20)]);
        let source = source(&transport);

        let sections = source.home_sections().await.unwrap();
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].id, "popular");
        assert_eq!(sections[0].title, "Popular Manga");
        assert_eq!(sections[0].items.len(), 20);
        assert_eq!(sections[1].id, "recent");
        assert_eq!(sections[1].title, "Recently Updated");

        let requests = transport.requests();
        assert_eq!(
            query_value(&requests[0].1, "order[followedCount]"),
            Some("desc")
        );
        assert_eq!(
            query_value(&requests[1].1, "order[latestUploadedChapter]"),
            Some("desc")
        );
    }

    #[tokio::test]
    async fn test_view_more_pages_section() {
        let transport = MockTransport::new(vec![listing_page_body(20)]);
        let source = source(&transport);

        let results = source.view_more("recent", 3).await.unwrap();
        assert_eq!(results.next_page, Some(4));

        let requests = transport.requests();
        assert_eq!(query_value(&requests[0].1, "offset"), Some("60"));
        assert_eq!(
            query_value(&requests[0].1, "order[latestUploadedChapter]"),
            Some("desc")
        );
    }

    #[tokio::test]
    async fn test_view_more_unknown_section() {
        let transport = MockTransport::new(vec![]);
        let source = source(&transport);

        let err = source.view_more("editors-picks", 0).await.unwrap_err();
        assert!(matches!(err, SourceError::InvalidSection(id) if id == "editors-picks"));
        // No request was issued for the bad id.
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_tags() {
        let body = serde_json::json!({
            "data": [
                { "id": "t1", "attributes": { "name": { "en": "Action" } } },
                { "id": "t2", "attributes": { "name": { "ja": "アクション" } } }
            ]
        })
        .to_string();

        let transport = MockTransport::new(vec![body]);
        let source = source(&transport);

        let section = source.tags().await.unwrap();
        assert_eq!(section.id, "0");
        assert_eq!(section.label, "Genres");
        assert_eq!(section.tags.len(), 1);
        assert_eq!(section.tags[0].label, "Action");

        let requests = transport.requests();
        assert_eq!(requests[0].0, "https://api.mangadex.org/manga/tag");
    }

    #[tokio::test]
    async fn test_language_filter_is_configurable() {
        let transport = MockTransport::new(vec![feed_page(0, 0)]);
        let config = SourceConfig {
            language: "pt-br".into(),
            ..SourceConfig::default()
        };
        let source = MangaDexSource::with_transport(&transport, config);

        source.chapters("m1").await.unwrap();
        let requests = transport.requests();
        assert_eq!(
            query_value(&requests[0].1, "translatedLanguage[]"),
            Some("pt-br")
        );
    }

    #[test]
    fn test_manga_share_url() {
        let transport = MockTransport::new(vec![]);
        let source = source(&transport);
        assert_eq!(
            source.manga_share_url("abc-123"),
            "https://mangadex.org/title/abc-123"
        );
    }

    #[tokio::test]
    async fn test_api_error_passes_through() {
        struct FailingTransport;
        impl Transport for FailingTransport {
            async fn get(
                &self,
                _url: &str,
                _query: &[(String, String)],
            ) -> Result<String, SourceError> {
                Err(SourceError::Api {
                    status: 503,
                    message: "upstream down".into(),
                })
            }
        }

        let source = MangaDexSource::with_transport(FailingTransport, SourceConfig::default());
        let err = source.chapters("m1").await.unwrap_err();
        assert!(matches!(err, SourceError::Api { status: 503, .. }));
    }
}
