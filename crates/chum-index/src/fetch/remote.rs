//! HTTP retrieval of repository indexes

use data_encoding::HEXLOWER;
use reqwest::blocking::{Client, RequestBuilder};
use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};
use std::time::Duration;

use super::repomd::{parse_repomd, RepoData};
use super::{Credentials, RepoTarget};
use crate::error::FetchError;

/// Default timeout for a single request
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

pub const DEFAULT_USER_AGENT: &str = concat!("chum-catalog/", env!("CARGO_PKG_VERSION"));

/// Attempts for requests that fail before any response arrives
const MAX_ATTEMPTS: u32 = 3;

const RETRY_DELAY_MS: u64 = 500;

/// Blocking HTTP client with a fixed timeout, user agent and optional
/// basic auth
pub struct HttpClient {
    client: Client,
    auth: Option<Credentials>,
}

impl HttpClient {
    pub fn new(user_agent: &str, timeout: Duration, auth: Option<Credentials>) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self { client, auth })
    }

    fn request(&self, url: &str) -> RequestBuilder {
        let request = self.client.get(url);
        match &self.auth {
            Some(creds) => request.basic_auth(&creds.user, Some(&creds.password)),
            None => request,
        }
    }

    fn send(&self, url: &str, accept: Option<&str>) -> Result<reqwest::blocking::Response, FetchError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let mut request = self.request(url);
            if let Some(accept) = accept {
                request = request.header(reqwest::header::ACCEPT, accept);
            }

            match request.send() {
                Ok(response) => {
                    let status = response.status();
                    if !status.is_success() {
                        return Err(FetchError::Status {
                            url: url.to_string(),
                            status: status.as_u16(),
                        });
                    }
                    return Ok(response);
                }
                Err(e) if e.is_connect() && attempt < MAX_ATTEMPTS => {
                    log::warn!("Request to {} failed (attempt {}): {}, retrying", url, attempt, e);
                    std::thread::sleep(Duration::from_millis(RETRY_DELAY_MS * attempt as u64));
                }
                Err(e) => return Err(FetchError::from_reqwest(url, e)),
            }
        }
    }

    /// Downloads a document as bytes
    pub fn get_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        log::debug!("GET {}", url);
        let response = self.send(url, None)?;
        let bytes = response
            .bytes()
            .map_err(|e| FetchError::from_reqwest(url, e))?;
        Ok(bytes.to_vec())
    }

    /// Downloads an XML API document
    pub fn get_xml(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        log::debug!("GET {} (xml)", url);
        let response = self.send(url, Some("application/xml;charset=utf-8"))?;
        let bytes = response
            .bytes()
            .map_err(|e| FetchError::from_reqwest(url, e))?;
        Ok(bytes.to_vec())
    }

    /// Downloads a text document
    pub fn get_text(&self, url: &str) -> Result<String, FetchError> {
        log::debug!("GET {} (text)", url);
        let response = self.send(url, None)?;
        response.text().map_err(|e| FetchError::from_reqwest(url, e))
    }
}

/// Hex digest of `bytes` with the algorithm named in repomd.xml.
/// `None` for algorithms that are not verified.
fn digest_hex(algorithm: &str, bytes: &[u8]) -> Option<String> {
    let digest = match algorithm.to_ascii_lowercase().as_str() {
        "sha256" => Sha256::digest(bytes).to_vec(),
        "sha224" => Sha224::digest(bytes).to_vec(),
        "sha384" => Sha384::digest(bytes).to_vec(),
        "sha512" => Sha512::digest(bytes).to_vec(),
        _ => return None,
    };
    Some(HEXLOWER.encode(&digest))
}

/// Checks downloaded bytes against the checksum announced in repomd.xml
pub(crate) fn verify_checksum(data: &RepoData, url: &str, bytes: &[u8]) -> Result<(), FetchError> {
    let (Some(algorithm), Some(expected)) = (&data.checksum_type, &data.checksum) else {
        log::debug!("No checksum announced for {}", url);
        return Ok(());
    };

    match digest_hex(algorithm, bytes) {
        Some(actual) if actual.eq_ignore_ascii_case(expected) => Ok(()),
        Some(actual) => Err(FetchError::ChecksumMismatch {
            url: url.to_string(),
            expected: expected.to_ascii_lowercase(),
            actual,
        }),
        None => {
            log::debug!("Not verifying {} checksum of {}", algorithm, url);
            Ok(())
        }
    }
}

fn download(http: &HttpClient, base_url: &str, data: &RepoData) -> Result<Vec<u8>, FetchError> {
    let url = format!("{}{}", base_url, data.href.trim_start_matches('/'));
    let bytes = http.get_bytes(&url)?;
    verify_checksum(data, &url, &bytes)?;
    log::debug!("Downloaded {} ({} bytes)", url, bytes.len());
    Ok(bytes)
}

/// Fetches `primary` (required) and `other` (optional) for one repository
pub(crate) fn fetch_repo(
    http: &HttpClient,
    target: &RepoTarget,
    base_url: &str,
) -> Result<(Vec<u8>, Option<Vec<u8>>), FetchError> {
    let repomd_url = format!("{}repodata/repomd.xml", base_url);
    let repomd = http.get_bytes(&repomd_url)?;
    let entries = parse_repomd(&repomd).map_err(|message| FetchError::InvalidRepomd {
        url: repomd_url.clone(),
        message,
    })?;

    let primary = entries
        .iter()
        .find(|data| data.kind == "primary")
        .ok_or_else(|| FetchError::MissingPrimary {
            repo: target.repo.clone(),
        })?;
    let primary = download(http, base_url, primary)?;

    let other = match entries.iter().find(|data| data.kind == "other") {
        Some(data) => match download(http, base_url, data) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                log::warn!("Changelogs of {} unavailable: {}", target, e);
                None
            }
        },
        None => None,
    };

    Ok((primary, other))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(checksum_type: &str, checksum: &str) -> RepoData {
        RepoData {
            kind: "primary".to_string(),
            href: "repodata/abc-primary.xml.gz".to_string(),
            checksum_type: Some(checksum_type.to_string()),
            checksum: Some(checksum.to_string()),
        }
    }

    #[test]
    fn test_verify_sha256() {
        let expected = HEXLOWER.encode(&Sha256::digest(b"payload"));
        assert!(verify_checksum(&data("sha256", &expected), "u", b"payload").is_ok());
        assert!(matches!(
            verify_checksum(&data("sha256", &expected), "u", b"tampered"),
            Err(FetchError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_unverified_algorithm_passes() {
        assert!(verify_checksum(&data("md5", "deadbeef"), "u", b"payload").is_ok());
    }
}
