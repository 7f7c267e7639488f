// REST API root discovery
//
// WordPress advertises its API root on every front-end response:
//   Link: <https://example.com/wp-json/>; rel="https://api.w.org/"
// Sites that strip the header usually still serve the index at
// `<site>/wp-json/`, which is tried as a fallback.

use reqwest::header::LINK;
use tracing::debug;
use url::Url;

use crate::auth::with_trailing_slash;
use crate::error::Error;

/// Link relation WordPress uses for its REST API root.
pub const API_LINK_REL: &str = "https://api.w.org/";

#[derive(serde::Deserialize)]
struct ApiIndex {
    namespaces: Vec<String>,
}

/// Find the REST API root (`…/wp-json/`) of the site at `site_url`.
pub async fn discover_api_root(http: &reqwest::Client, site_url: &Url) -> Result<Url, Error> {
    debug!("discovering REST API root for {site_url}");

    let resp = http.get(site_url.clone()).send().await?;
    let final_url = resp.url().clone();
    let advertised = resp
        .headers()
        .get_all(LINK)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(api_root_from_link);

    if let Some(href) = advertised {
        let root = with_trailing_slash(final_url.join(&href)?);
        debug!("API root advertised at {root}");
        return Ok(root);
    }

    let mut base = final_url;
    base.set_query(None);
    base.set_fragment(None);
    let candidate = with_trailing_slash(base).join("wp-json/")?;
    debug!("no API link header, probing {candidate}");

    let resp = http.get(candidate.clone()).send().await?;
    if resp.status().is_success() {
        if let Ok(index) = resp.json::<ApiIndex>().await {
            debug!(namespaces = index.namespaces.len(), "found API index at {candidate}");
            return Ok(candidate);
        }
    }

    Err(Error::ApiRootNotFound {
        url: site_url.to_string(),
    })
}

/// Extract the target of the `rel="https://api.w.org/"` entry from one
/// `Link` header value, which may carry several comma-separated links.
pub fn api_root_from_link(header: &str) -> Option<String> {
    header.split(',').find_map(|link| {
        let mut parts = link.split(';');
        let target = parts.next()?.trim();
        let href = target.strip_prefix('<')?.strip_suffix('>')?;
        let is_api = parts.any(|param| {
            param
                .trim()
                .strip_prefix("rel=")
                .is_some_and(|rel| rel.trim_matches('"') == API_LINK_REL)
        });
        is_api.then(|| href.to_owned())
    })
}
