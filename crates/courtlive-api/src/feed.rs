// Multi-court feed endpoints
//
// The feed fans many courts out of one service. Calls are either scoped to
// an explicit list of court names or, when nothing is on screen, to the
// courts that changed within a recency window.

use tracing::debug;
use url::Url;

use crate::client::LiveClient;
use crate::error::Error;
use crate::models::CourtMap;

impl LiveClient {
    /// Fetch the latest payload for each named court.
    ///
    /// `GET {feed}/courts?court=A&court=B`. Courts the feed does not know
    /// are simply absent from the returned map.
    pub async fn fetch_courts(&self, courts: &[String]) -> Result<CourtMap, Error> {
        let mut url = self.feed_endpoint("courts")?;
        {
            let mut pairs = url.query_pairs_mut();
            for court in courts {
                pairs.append_pair("court", court);
            }
        }
        debug!(count = courts.len(), "fetching scoped court data");
        self.get(url, self.feed_key.as_ref()).await
    }

    /// Fetch every court updated within the last `window_minutes`.
    ///
    /// `GET {feed}/courts/recent?window_minutes=N`
    pub async fn fetch_recent(&self, window_minutes: u32) -> Result<CourtMap, Error> {
        let mut url = self.feed_endpoint("courts/recent")?;
        url.query_pairs_mut()
            .append_pair("window_minutes", &window_minutes.to_string());
        debug!(window_minutes, "fetching recent court data");
        self.get(url, self.feed_key.as_ref()).await
    }

    fn feed_endpoint(&self, path: &str) -> Result<Url, Error> {
        let base = self.feed_url.as_ref().ok_or(Error::FeedNotConfigured)?;
        let full = format!("{}/{path}", base.as_str().trim_end_matches('/'));
        Ok(Url::parse(&full)?)
    }
}
