//! Constants module for the Drama Scraper API
//!
//! Contains endpoint URL builders and the ordered lookup tables the extractors
//! walk through when probing an upstream page.

/// URL builder functions for all endpoints
pub mod endpoints {
    /// Home page URL (trending listing)
    pub fn home(base_url: &str) -> String {
        base_url.to_string()
    }

    /// Play page URL for a single episode
    pub fn play(base_url: &str, id: &str, episode: u32) -> String {
        format!(
            "{}/play/{}/{}",
            base_url.trim_end_matches('/'),
            urlencoding::encode(id),
            episode
        )
    }
}

/// Ordered candidate lists used by the extraction pipeline.
///
/// Earlier entries win. The upstream page shape drifts between deployments,
/// so these are defaults for [`crate::extractor::ExtractorConfig`] rather than
/// fixed rules.
pub mod extraction {
    /// Variable / element-id names used by SSR frameworks for hydration state
    pub const STATE_MARKERS: &[&str] = &[
        "__NEXT_DATA__",
        "__NUXT__",
        "__INITIAL_STATE__",
        "__PRELOADED_STATE__",
        "__APOLLO_STATE__",
    ];

    /// JSON pointers to the listing array inside the hydration state
    pub const ITEM_PATHS: &[&str] = &[
        "/props/pageProps/initialData/list",
        "/props/pageProps/initialData/items",
        "/props/pageProps/list",
        "/props/pageProps/data/list",
        "/props/pageProps/dramaList",
        "/state/home/list",
        "/data/list",
        "/list",
    ];

    /// JSON pointers to the drama info object on a play page
    pub const DRAMA_INFO_PATHS: &[&str] = &[
        "/props/pageProps/dramaInfo",
        "/props/pageProps/data/dramaInfo",
        "/props/pageProps/detail",
        "/state/play/dramaInfo",
        "/dramaInfo",
    ];

    /// Card selectors for the DOM fallback, most specific first
    pub const CARD_SELECTORS: &[&str] = &[
        "[class*=\"drama-card\"]",
        ".movie-card",
        ".series-item",
        "a[href*=\"/detail/\"]",
        "[class*=\"item\"]",
    ];

    /// Sub-selectors tried for a card title before falling back to attributes
    pub const TITLE_SELECTORS: &[&str] = &["h3", "h2", ".title", ".name"];

    /// Image attributes, eager first then lazy-load variants
    pub const IMAGE_ATTRIBUTES: &[&str] = &["src", "data-src", "data-original", "data-lazy-src"];

    /// Attributes carrying an explicit item identifier on a card
    pub const ID_ATTRIBUTES: &[&str] = &["data-id", "data-drama-id"];

    /// Manifest extensions in preference order
    pub const MANIFEST_EXTENSIONS: &[&str] = &[".m3u8", ".mp4"];

    /// Host fragments whose media URLs are ads or analytics, never the episode
    pub const IGNORED_MEDIA_HOSTS: &[&str] = &["google"];

    /// Default cap on DOM fallback records per page
    pub const DEFAULT_MAX_DOM_ITEMS: usize = 50;
}

/// Candidate source keys per logical item field
pub mod fields {
    pub const ID: &[&str] = &["id", "drama_id", "dramaId", "shortPlayId", "book_id", "bookId"];

    pub const TITLE: &[&str] = &["title", "name", "drama_name", "dramaName", "shortPlayName"];

    /// Vertical covers suit the portrait short-drama format, so they come first
    pub const COVER: &[&str] = &[
        "vertical_cover",
        "verticalCover",
        "cover",
        "cover_url",
        "coverUrl",
        "poster",
        "image",
    ];

    pub const EPISODES: &[&str] = &[
        "episode_count",
        "episodeCount",
        "total_episode",
        "totalEpisode",
        "episodes",
    ];

    pub const DETAIL: &[&str] = &["detail_url", "detailUrl", "url", "link", "href"];

    pub const DESCRIPTION: &[&str] = &["intro", "description", "desc", "synopsis"];
}

#[cfg(test)]
mod tests {
    use super::endpoints;

    #[test]
    fn test_play_endpoint() {
        assert_eq!(
            endpoints::play("https://netshort.com", "42", 3),
            "https://netshort.com/play/42/3"
        );
    }

    #[test]
    fn test_endpoints_trim_trailing_slash() {
        assert_eq!(
            endpoints::play("https://netshort.com/", "42", 1),
            "https://netshort.com/play/42/1"
        );
    }

    #[test]
    fn test_endpoints_encode_id() {
        assert_eq!(
            endpoints::play("https://netshort.com", "a b", 1),
            "https://netshort.com/play/a%20b/1"
        );
    }
}
