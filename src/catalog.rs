//! Spotify Web API collaborator: client-credentials auth, paginated
//! playlist listing and cover-art retrieval.

use std::io::Read;
use std::time::Duration;

use serde::Deserialize;

use crate::error::SyncError;
use crate::models::TrackRecord;

const TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const API_BASE: &str = "https://api.spotify.com/v1";
const PAGE_LIMIT: usize = 100;
const FIELDS: &str = "items(track(name,artists(name),album(name,images(url)))),total";
const COVER_MAX_BYTES: u64 = 10 * 1024 * 1024;

/// Catalog client backed by a blocking `ureq` agent.
pub struct CatalogClient {
    agent: ureq::Agent,
    client_id: String,
    client_secret: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct Page {
    #[serde(default)]
    items: Vec<PageItem>,
    total: usize,
}

#[derive(Deserialize)]
struct PageItem {
    track: Option<ApiTrack>,
}

#[derive(Deserialize)]
struct ApiTrack {
    name: String,
    #[serde(default)]
    artists: Vec<ApiArtist>,
    album: ApiAlbum,
}

#[derive(Deserialize)]
struct ApiArtist {
    name: String,
}

#[derive(Deserialize)]
struct ApiAlbum {
    name: String,
    #[serde(default)]
    images: Vec<ApiImage>,
}

#[derive(Deserialize)]
struct ApiImage {
    url: String,
}

impl CatalogClient {
    pub fn new(client_id: &str, client_secret: &str) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(5))
            .timeout_read(Duration::from_secs(30))
            .timeout_write(Duration::from_secs(15))
            .build();
        Self {
            agent,
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
        }
    }

    fn token(&self) -> Result<String, SyncError> {
        let response = self
            .agent
            .post(TOKEN_URL)
            .send_form(&[
                ("grant_type", "client_credentials"),
                ("client_id", &self.client_id),
                ("client_secret", &self.client_secret),
            ])
            .map_err(|e| SyncError::Catalog(format!("token request: {e}")))?;
        let parsed: TokenResponse = response
            .into_json()
            .map_err(|e| SyncError::Catalog(format!("token response: {e}")))?;
        Ok(parsed.access_token)
    }

    /// Fetch every track of the playlist, paging with the offset/total
    /// contract until exhaustion. A failure on any page aborts the whole
    /// fetch; no partial listing is returned.
    pub fn playlist_tracks(&self, playlist: &str) -> Result<Vec<TrackRecord>, SyncError> {
        let id = playlist_id(playlist);
        let token = self.token()?;
        let url = format!("{API_BASE}/playlists/{id}/tracks");

        let mut tracks = Vec::new();
        let mut offset = 0usize;
        loop {
            let page: Page = self
                .agent
                .get(&url)
                .set("Authorization", &format!("Bearer {token}"))
                .query("fields", FIELDS)
                .query("additional_types", "track")
                .query("limit", &PAGE_LIMIT.to_string())
                .query("offset", &offset.to_string())
                .call()
                .map_err(|e| SyncError::Catalog(format!("playlist page at offset {offset}: {e}")))?
                .into_json()
                .map_err(|e| SyncError::Catalog(format!("playlist page parse: {e}")))?;

            if page.items.is_empty() {
                break;
            }
            offset += page.items.len();
            for item in page.items {
                // Episodes and removed tracks come back as null entries
                if let Some(track) = item.track {
                    tracks.push(record_from(track));
                }
            }
            if offset >= page.total {
                break;
            }
        }
        Ok(tracks)
    }

    /// Download cover-art bytes, reporting the MIME type alongside.
    pub fn fetch_cover(&self, url: &str) -> Result<(Vec<u8>, String), SyncError> {
        let response = self
            .agent
            .get(url)
            .call()
            .map_err(|e| SyncError::Catalog(format!("cover fetch: {e}")))?;
        let mime = response.content_type().to_string();
        let mut data = Vec::new();
        response
            .into_reader()
            .take(COVER_MAX_BYTES)
            .read_to_end(&mut data)
            .map_err(|e| SyncError::Catalog(format!("cover read: {e}")))?;
        Ok((data, mime))
    }
}

fn record_from(track: ApiTrack) -> TrackRecord {
    let artist = track
        .artists
        .iter()
        .map(|a| a.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    let cover_url = track.album.images.first().map(|i| i.url.clone());
    TrackRecord {
        title: track.name,
        artist,
        album: track.album.name,
        downloaded: false,
        cover_url,
    }
}

/// Accepts a bare playlist id, a `spotify:playlist:<id>` URI, or an
/// open.spotify.com URL with optional query string.
pub fn playlist_id(reference: &str) -> String {
    let trimmed = reference.trim();
    if let Some(rest) = trimmed.strip_prefix("spotify:playlist:") {
        return rest.to_string();
    }
    if let Some(idx) = trimmed.find("/playlist/") {
        let tail = &trimmed[idx + "/playlist/".len()..];
        return tail
            .split(['?', '/'])
            .next()
            .unwrap_or(tail)
            .to_string();
    }
    trimmed.to_string()
}
