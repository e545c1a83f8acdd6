//! Track lookups through the node's `/loadtracks` HTTP endpoint.

use hyper::client::HttpConnector;
use hyper::header::AUTHORIZATION;
use hyper::{Body, Client, Request, StatusCode};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use crate::model::{LoadType, LoadedTracks, TrackDescriptor};
use crate::nodes::NodeConfig;
use crate::Error;

/// The prefix turning a query into a YouTube search.
pub const SEARCH_PREFIX: &str = "ytsearch:";

/// Characters escaped in the `identifier` query parameter. Matches
/// JavaScript's `encodeURIComponent`.
const IDENTIFIER: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Resolves queries and URIs to playable tracks.
#[derive(Clone, Debug)]
pub struct TrackResolver {
    client: Client<HttpConnector>,
    base_url: String,
    password: String,
}

impl TrackResolver {
    pub fn new(config: &NodeConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.http_url(),
            password: config.password.clone(),
        }
    }

    /// Looks up a query, which may be a URI or free text.
    ///
    /// If the lookup fails or finds nothing, it is retried once as a YouTube
    /// search. A loaded playlist resolves to all of its tracks in order;
    /// anything else resolves to its first track.
    ///
    /// Every failure is reported as [`Error::TrackNotFound`].
    ///
    /// [`Error::TrackNotFound`]: ../enum.Error.html#variant.TrackNotFound
    pub async fn search<R: Clone>(&self, query: &str, requester: R)
        -> Result<Vec<TrackDescriptor<R>>, Error> {
        let loaded = match self.load(query).await {
            Ok(loaded) if !loaded.load_type.is_failure() => loaded,
            first => {
                match first {
                    Ok(loaded) => debug!("No tracks for {:?} ({:?}), searching instead", query, loaded.load_type),
                    Err(why) => debug!("Loading {:?} failed, searching instead: {:?}", query, why),
                }

                let search = format!("{}{}", SEARCH_PREFIX, query);

                self.load(&search).await.map_err(|why| {
                    debug!("Searching {:?} failed: {:?}", search, why);

                    Error::TrackNotFound
                })?
            },
        };

        select(loaded, requester)
    }

    /// Performs a single `/loadtracks` request.
    pub async fn load(&self, identifier: &str) -> Result<LoadedTracks, Error> {
        let uri = format!(
            "{}/loadtracks?identifier={}",
            self.base_url,
            utf8_percent_encode(identifier, IDENTIFIER),
        );

        trace!("Loading tracks: {}", uri);

        let request = Request::get(uri)
            .header(AUTHORIZATION, &self.password[..])
            .body(Body::empty())?;
        let response = self.client.request(request).await?;

        if response.status() != StatusCode::OK {
            debug!("Loading tracks returned {}", response.status());

            return Err(Error::TrackNotFound);
        }

        let body = hyper::body::to_bytes(response.into_body()).await?;

        serde_json::from_slice(&body).map_err(From::from)
    }
}

fn select<R: Clone>(loaded: LoadedTracks, requester: R) -> Result<Vec<TrackDescriptor<R>>, Error> {
    let LoadedTracks { load_type, tracks } = loaded;

    if load_type == LoadType::PlaylistLoaded {
        return Ok(tracks
            .into_iter()
            .map(|track| TrackDescriptor::new(track, requester.clone()))
            .collect());
    }

    match tracks.into_iter().next() {
        Some(track) => Ok(vec![TrackDescriptor::new(track, requester)]),
        None => Err(Error::TrackNotFound),
    }
}

#[cfg(test)]
mod tests {
    use percent_encoding::utf8_percent_encode;
    use serde_json::{self, json};
    use super::*;

    fn loaded(load_type: &str, count: usize) -> LoadedTracks {
        let tracks = (0..count).map(|i| json!({
            "track": format!("track{}", i),
            "info": {
                "title": format!("Title {}", i),
                "identifier": format!("id{}", i),
                "author": "someone",
                "length": 1000,
                "isSeekable": true,
                "isStream": false,
                "uri": format!("https://www.youtube.com/watch?v=id{}", i),
            },
        })).collect::<Vec<_>>();

        serde_json::from_value(json!({"loadType": load_type, "tracks": tracks})).unwrap()
    }

    #[test]
    fn test_playlist_keeps_every_track() {
        let tracks = select(loaded("PLAYLIST_LOADED", 3), "me").unwrap();

        let ids = tracks.iter().map(|t| &t.identifier[..]).collect::<Vec<_>>();
        assert_eq!(ids, vec!["id0", "id1", "id2"]);
        assert!(tracks.iter().all(|t| t.requester == "me"));
    }

    #[test]
    fn test_search_result_keeps_first_track() {
        let tracks = select(loaded("SEARCH_RESULT", 3), ()).unwrap();

        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].track, "track0");
    }

    #[test]
    fn test_empty_is_not_found() {
        match select(loaded("TRACK_LOADED", 0), ()) {
            Err(Error::TrackNotFound) => {},
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_identifier_encoding() {
        let encoded = utf8_percent_encode("ytsearch:rick astley & co (live)!", IDENTIFIER).to_string();

        assert_eq!(encoded, "ytsearch%3Arick%20astley%20%26%20co%20(live)!");
    }
}
