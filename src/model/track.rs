use serde::{Deserialize, Serialize};

/// The outcome of a `/loadtracks` lookup.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoadType {
    TrackLoaded,
    PlaylistLoaded,
    SearchResult,
    NoMatches,
    LoadFailed,
    #[serde(other)]
    Unknown,
}

impl LoadType {
    /// Whether the lookup produced nothing usable.
    pub fn is_failure(&self) -> bool {
        match *self {
            LoadType::NoMatches | LoadType::LoadFailed => true,
            _ => false,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadedTracks {
    pub load_type: LoadType,
    #[serde(default)]
    pub tracks: Vec<TrackData>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct TrackData {
    pub track: String,
    pub info: TrackInfo,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackInfo {
    pub title: String,
    pub identifier: String,
    pub author: String,
    /// Track length in milliseconds.
    pub length: u64,
    pub is_seekable: bool,
    pub is_stream: bool,
    pub uri: String,
}

/// Thumbnail sizes available for YouTube tracks.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ThumbnailSize {
    Default,
    Medium,
    High,
}

impl ThumbnailSize {
    pub fn name(&self) -> &'static str {
        match *self {
            ThumbnailSize::Default => "default",
            ThumbnailSize::Medium => "medium",
            ThumbnailSize::High => "high",
        }
    }
}

impl Default for ThumbnailSize {
    fn default() -> Self {
        ThumbnailSize::Default
    }
}

/// A playable track with display metadata, as returned by a search.
///
/// `requester` is whatever the caller passed to the search, handed back
/// untouched.
#[derive(Clone, Debug, PartialEq)]
pub struct TrackDescriptor<R = ()> {
    /// The opaque handle the node needs to play the track.
    pub track: String,
    pub title: String,
    pub identifier: String,
    pub author: String,
    /// Track length in milliseconds.
    pub duration: u64,
    pub is_seekable: bool,
    pub is_stream: bool,
    pub uri: String,
    pub thumbnail: Option<String>,
    pub requester: R,
}

impl<R> TrackDescriptor<R> {
    pub fn new(data: TrackData, requester: R) -> Self {
        let TrackData { track, info } = data;
        let thumbnail = youtube_thumbnail(&info.uri, &info.identifier, ThumbnailSize::Default);

        Self {
            title: info.title,
            identifier: info.identifier,
            author: info.author,
            duration: info.length,
            is_seekable: info.is_seekable,
            is_stream: info.is_stream,
            uri: info.uri,
            track,
            thumbnail,
            requester,
        }
    }

    /// The thumbnail URL at the given size, if the track is from YouTube.
    pub fn display_thumbnail(&self, size: ThumbnailSize) -> Option<String> {
        youtube_thumbnail(&self.uri, &self.identifier, size)
    }
}

fn youtube_thumbnail(uri: &str, identifier: &str, size: ThumbnailSize) -> Option<String> {
    if !uri.contains("youtube") {
        return None;
    }

    Some(format!("https://img.youtube.com/vi/{}/{}.jpg", identifier, size.name()))
}
