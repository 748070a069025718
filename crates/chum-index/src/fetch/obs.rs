//! Repository discovery on the Open Build Service

use quick_xml::events::Event;
use quick_xml::Reader;
use std::time::Duration;

use super::remote::HttpClient;
use super::Credentials;
use crate::error::FetchError;
use crate::parsers::attribute;

/// Client for the `build/{project}` listing of an OBS instance
pub struct ObsClient {
    http: HttpClient,
    api_url: String,
    project: String,
}

impl ObsClient {
    pub fn new(
        api_url: &str,
        project: &str,
        auth: Credentials,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        let api_url = if api_url.ends_with('/') {
            api_url.to_string()
        } else {
            format!("{}/", api_url)
        };

        Ok(Self {
            http: HttpClient::new(user_agent, timeout, Some(auth))?,
            api_url,
            project: project.to_string(),
        })
    }

    /// Names of all repositories of the project
    pub fn list_repos(&self) -> Result<Vec<String>, FetchError> {
        let url = format!("{}build/{}", self.api_url, self.project);
        let body = self.http.get_xml(&url)?;
        let repos = parse_listing(&url, &body)?;
        log::info!("{} lists {} repositories", url, repos.len());
        Ok(repos)
    }

    /// Repositories of the newest release only
    pub fn newest_repos(&self) -> Result<Vec<String>, FetchError> {
        Ok(filter_newest_repos(&self.list_repos()?))
    }
}

fn parse_listing(url: &str, body: &[u8]) -> Result<Vec<String>, FetchError> {
    parse_entry_names(body).map_err(|message| FetchError::InvalidListing {
        url: url.to_string(),
        message,
    })
}

/// `name` attributes of the `<entry>` elements of a directory listing
fn parse_entry_names(bytes: &[u8]) -> Result<Vec<String>, String> {
    let mut reader = Reader::from_reader(bytes);
    let mut buf = Vec::new();
    let mut names = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) if e.name().as_ref() == b"entry" => {
                if let Some(Ok(name)) = attribute(&e, b"name") {
                    names.push(name);
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(format!("at byte {}: {}", reader.buffer_position(), e)),
        }
        buf.clear();
    }

    Ok(names)
}

/// Numeric parts of the release before the last `_` (`4.5.0.24_i486` → 4,5,0,24).
/// Parts that are not numbers count as 0.
fn release_numbers(repo: &str) -> Vec<u64> {
    let release = repo.rsplit_once('_').map_or(repo, |(release, _)| release);
    release
        .split('.')
        .map(|part| part.parse().unwrap_or(0))
        .collect()
}

/// Keeps the repositories of the newest release.
///
/// `["4.5.0.24_i486", "4.5.0.24_aarch64", "4.4.0.72_i486"]` gives
/// `["4.5.0.24_i486", "4.5.0.24_aarch64"]`.
pub fn filter_newest_repos(repos: &[String]) -> Vec<String> {
    let Some(newest) = repos.iter().max_by_key(|repo| release_numbers(repo)) else {
        return Vec::new();
    };
    let newest = release_numbers(newest);

    repos
        .iter()
        .filter(|repo| release_numbers(repo) == newest)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_filter_newest_repos() {
        let repos = names(&["4.5.0.24_i486", "4.5.0.24_aarch64", "4.4.0.72_i486", "4.4.0.72_aarch64"]);
        assert_eq!(filter_newest_repos(&repos), names(&["4.5.0.24_i486", "4.5.0.24_aarch64"]));
    }

    #[test]
    fn test_filter_compares_numerically() {
        let repos = names(&["4.10.0.1_i486", "4.9.9.9_i486"]);
        assert_eq!(filter_newest_repos(&repos), names(&["4.10.0.1_i486"]));
    }

    #[test]
    fn test_filter_empty() {
        assert!(filter_newest_repos(&[]).is_empty());
    }

    #[test]
    fn test_parse_entry_names() {
        let xml = br#"<directory><entry name="4.5.0.24_aarch64"/><entry name="4.5.0.24_i486"/></directory>"#;
        assert_eq!(
            parse_entry_names(xml).unwrap(),
            names(&["4.5.0.24_aarch64", "4.5.0.24_i486"])
        );
    }

    #[test]
    fn test_malformed_listing() {
        let xml = br#"<directory><entry name="4.5.0.24_aarch64"></directory>"#;
        let err = parse_listing("https://api.example.org/build/sailfishos:chum", xml).unwrap_err();
        assert!(matches!(
            err,
            FetchError::InvalidListing { ref url, .. } if url == "https://api.example.org/build/sailfishos:chum"
        ));
    }
}
