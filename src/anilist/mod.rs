use anyhow::{bail, Context, Result};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use crate::utils::http::get_http_client;

const ANILIST_ENDPOINT: &str = "https://graphql.anilist.co";

// Kept stable and explicit; it's intended for human inspection in logs.
const MEDIA_QUERY: &str = r#"
query ($search: String) {
  Media(search: $search, type: ANIME) {
    id
    title { romaji english }
    episodes
    genres
    coverImage { extraLarge }
  }
}
"#;

#[derive(Debug, Clone, Deserialize)]
pub struct AnimeInfo {
    pub id: i64,
    #[serde(default)]
    pub title: AnimeTitle,
    pub episodes: Option<i32>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(rename = "coverImage")]
    pub cover_image: Option<CoverImage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnimeTitle {
    pub romaji: Option<String>,
    pub english: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CoverImage {
    #[serde(rename = "extraLarge")]
    pub extra_large: Option<String>,
}

impl AnimeInfo {
    pub fn display_title(&self) -> &str {
        self.title
            .english
            .as_deref()
            .or(self.title.romaji.as_deref())
            .unwrap_or("Unknown Title")
    }

    /// Rendered poster card used as the photo for formatted posts.
    pub fn poster_url(&self) -> String {
        format!("https://img.anili.st/media/{}", self.id)
    }
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<Data>,
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct Data {
    #[serde(rename = "Media")]
    media: Option<AnimeInfo>,
}

/// Looks an anime up by name on AniList. `Ok(None)` means the search came
/// back empty (or with a GraphQL-level error, which AniList uses for "not
/// found"); transport and decode failures propagate.
pub async fn fetch_anime_info(anime_name: &str) -> Result<Option<AnimeInfo>> {
    let body = json!({
        "query": MEDIA_QUERY,
        "variables": { "search": anime_name }
    });

    let response = get_http_client()
        .post(ANILIST_ENDPOINT)
        .json(&body)
        .send()
        .await
        .context("AniList request failed")?;

    let status = response.status();
    let bytes = response
        .bytes()
        .await
        .context("Failed to read AniList response")?;
    if !status.is_success() {
        bail!("AniList HTTP error (status {status})");
    }

    let parsed: GraphQlResponse =
        serde_json::from_slice(&bytes).context("Failed to parse AniList JSON")?;
    if let Some(errors) = parsed.errors {
        let joined = errors
            .into_iter()
            .map(|error| error.message)
            .collect::<Vec<_>>()
            .join("; ");
        warn!("AniList GraphQL error for '{anime_name}': {joined}");
        return Ok(None);
    }

    Ok(parsed.data.and_then(|data| data.media))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_a_media_payload() {
        let value = json!({
            "data": {
                "Media": {
                    "id": 21,
                    "title": { "romaji": "One Piece", "english": "ONE PIECE" },
                    "episodes": 1000,
                    "genres": ["Action", "Adventure"],
                    "coverImage": { "extraLarge": "https://img.example/cover.png" }
                }
            }
        });
        let parsed: GraphQlResponse = serde_json::from_value(value).expect("deserialize");
        let media = parsed.data.and_then(|data| data.media).expect("media");
        assert_eq!(media.id, 21);
        assert_eq!(media.display_title(), "ONE PIECE");
        assert_eq!(media.episodes, Some(1000));
        assert_eq!(media.genres, vec!["Action", "Adventure"]);
    }

    #[test]
    fn missing_media_maps_to_none() {
        let value = json!({ "data": { "Media": null } });
        let parsed: GraphQlResponse = serde_json::from_value(value).expect("deserialize");
        assert!(parsed.data.and_then(|data| data.media).is_none());
    }

    #[test]
    fn title_prefers_english_then_romaji() {
        let both = AnimeInfo {
            id: 1,
            title: AnimeTitle {
                romaji: Some("Romaji".to_string()),
                english: Some("English".to_string()),
            },
            episodes: None,
            genres: vec![],
            cover_image: None,
        };
        assert_eq!(both.display_title(), "English");

        let romaji_only = AnimeInfo {
            title: AnimeTitle {
                english: None,
                ..both.title.clone()
            },
            ..both.clone()
        };
        assert_eq!(romaji_only.display_title(), "Romaji");
    }

    #[test]
    fn poster_url_embeds_the_media_id() {
        let info = AnimeInfo {
            id: 170083,
            title: AnimeTitle::default(),
            episodes: None,
            genres: vec![],
            cover_image: None,
        };
        assert_eq!(info.poster_url(), "https://img.anili.st/media/170083");
    }
}
