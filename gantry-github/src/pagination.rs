//! Link-header pagination

use reqwest::Method;
use reqwest::header::{HeaderMap, LINK};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::GitHubClient;
use crate::error::Result;

/// Items per page requested from list endpoints
pub(crate) const PER_PAGE: u32 = 100;

/// One page of a list endpoint
///
/// Most endpoints return a bare array; some wrap it in an object
/// (`{"runners": [...]}`).
pub(crate) trait Page: DeserializeOwned {
    type Item;

    fn into_items(self) -> Vec<Self::Item>;
}

impl<T: DeserializeOwned> Page for Vec<T> {
    type Item = T;

    fn into_items(self) -> Vec<T> {
        self
    }
}

/// URL of the `rel="next"` entry of a `Link` header
pub(crate) fn next_link(headers: &HeaderMap) -> Option<String> {
    let link = headers.get(LINK)?.to_str().ok()?;

    link.split(',').find_map(|entry| {
        let (target, params) = entry.split_once(';')?;
        let is_next = params
            .split(';')
            .any(|p| p.trim().replace(' ', "") == "rel=\"next\"");
        is_next.then(|| {
            target
                .trim()
                .trim_start_matches('<')
                .trim_end_matches('>')
                .to_string()
        })
    })
}

impl GitHubClient {
    /// Fetch every page starting at `url`, concatenating the items
    pub(crate) async fn paginate<P: Page>(&self, url: String) -> Result<Vec<P::Item>> {
        let mut items = Vec::new();
        let mut next = Some(url);

        while let Some(url) = next {
            debug!("GET {}", url);
            let response = self.send(self.request(Method::GET, &url)).await?;
            next = next_link(response.headers());

            let page: P = self.handle_response(response).await?;
            items.extend(page.into_items());
        }

        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn link(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(LINK, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_next_link_found() {
        let headers = link(
            r#"<https://api.github.com/repositories/1/comments?page=2>; rel="next", <https://api.github.com/repositories/1/comments?page=5>; rel="last""#,
        );
        assert_eq!(
            next_link(&headers).as_deref(),
            Some("https://api.github.com/repositories/1/comments?page=2")
        );
    }

    #[test]
    fn test_next_link_absent_on_last_page() {
        let headers = link(
            r#"<https://api.github.com/x?page=1>; rel="first", <https://api.github.com/x?page=4>; rel="prev""#,
        );
        assert_eq!(next_link(&headers), None);
        assert_eq!(next_link(&HeaderMap::new()), None);
    }
}
