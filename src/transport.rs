// src/transport.rs

//! URL parsing and source transports
//!
//! Sources arrive over exactly two protocols: local files (`file://` or a
//! bare path) and HTTP(S). The HTTP side is a thin wrapper around a
//! blocking reqwest client with a hard 30-second timeout; TLS goes
//! through the platform verifier, which can complete incomplete server
//! chains (AIA fetching) where the OS supports it.

use crate::error::{Error, Result};
use std::fs::File;
use std::io;
use std::path::Path;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Total timeout applied end-to-end to each HTTP request
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Any HTTP status at or above this is treated as a failed fetch
const HTTP_ERROR_BOUNDARY: u16 = 400;

/// Transport protocol of a validated source URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    /// Local filesystem copy
    File,
    /// HTTP or HTTPS download
    Http,
}

/// The pieces of a source URL the engine cares about
#[derive(Debug, Clone)]
pub struct ParsedUrl {
    pub protocol: Protocol,
    pub scheme: String,
    pub host: String,
    pub path: String,
}

impl ParsedUrl {
    /// Local filesystem path for file-protocol URLs.
    ///
    /// Host and path are rejoined so that `file://./rel/path` resolves to
    /// `./rel/path` and `file:///abs/path` to `/abs/path`.
    pub fn local_path(&self) -> String {
        format!("{}{}", self.host, self.path)
    }
}

/// Split a URL into scheme, host and path.
///
/// With `strict` set, a URL without a scheme fails with
/// [`Error::MissingScheme`]. In lenient mode a scheme-less input is
/// treated as a bare local path. Schemes outside {file, http, https}
/// fail with [`Error::UnsupportedScheme`].
pub fn parse_url(raw: &str, strict: bool) -> Result<ParsedUrl> {
    if raw.starts_with("://") {
        return Err(Error::MissingScheme);
    }

    // The url crate's file-URL host handling is WHATWG-normalizing, which
    // would fold hosts like "." away. Split file URLs by hand instead so
    // the host survives into local_path().
    if let Some(rest) = raw.strip_prefix("file://") {
        let (host, path) = match rest.find('/') {
            Some(idx) => (&rest[..idx], &rest[idx..]),
            None => (rest, ""),
        };
        return Ok(ParsedUrl {
            protocol: Protocol::File,
            scheme: "file".to_string(),
            host: host.to_string(),
            path: path.to_string(),
        });
    }

    match Url::parse(raw) {
        Ok(parsed) => match parsed.scheme() {
            "http" | "https" => Ok(ParsedUrl {
                protocol: Protocol::Http,
                scheme: parsed.scheme().to_string(),
                host: parsed.host_str().unwrap_or_default().to_string(),
                path: parsed.path().to_string(),
            }),
            other => Err(Error::UnsupportedScheme(other.to_string())),
        },
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            if strict {
                Err(Error::MissingScheme)
            } else {
                Ok(ParsedUrl {
                    protocol: Protocol::File,
                    scheme: String::new(),
                    host: String::new(),
                    path: raw.to_string(),
                })
            }
        }
        Err(e) => Err(e.into()),
    }
}

/// A pluggable HTTP fetcher.
///
/// Production code wires this to [`HttpClient`]; tests supply fakes so
/// the fetch lifecycle can be exercised without a network.
pub trait Transport {
    /// Fetch `url` and write the body to `dest`, truncating it if present.
    fn fetch(&self, url: &str, dest: &Path) -> Result<()>;
}

/// Blocking HTTP client with a hard request timeout
pub struct HttpClient {
    client: reqwest::blocking::Client,
}

impl HttpClient {
    /// Build a client; the same instance is reused for every request.
    pub fn new() -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()?;
        Ok(Self { client })
    }
}

impl Transport for HttpClient {
    fn fetch(&self, url: &str, dest: &Path) -> Result<()> {
        debug!("GET {}", url);
        let mut response = self.client.get(url).send()?;

        let status = response.status();
        if status.as_u16() >= HTTP_ERROR_BOUNDARY {
            return Err(Error::HttpStatus {
                code: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("unknown").to_string(),
            });
        }

        let mut file = File::create(dest)?;
        io::copy(&mut response, &mut file)?;
        Ok(())
    }
}

/// Copy a local source file byte-for-byte to `dest`.
pub fn fetch_file(src: &str, dest: &Path) -> Result<()> {
    let mut source = File::open(src)?;
    let mut target = File::create(dest)?;
    io::copy(&mut source, &mut target)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_http_url() {
        let parsed = parse_url("https://ftp.gnu.org/gnu/hello/hello-2.12.tar.gz", true).unwrap();
        assert_eq!(parsed.protocol, Protocol::Http);
        assert_eq!(parsed.scheme, "https");
        assert_eq!(parsed.host, "ftp.gnu.org");
        assert_eq!(parsed.path, "/gnu/hello/hello-2.12.tar.gz");
    }

    #[test]
    fn test_parse_file_url_relative() {
        let parsed = parse_url("file://./testdata/testarchive.tar.gz", true).unwrap();
        assert_eq!(parsed.protocol, Protocol::File);
        assert_eq!(parsed.host, ".");
        assert_eq!(parsed.path, "/testdata/testarchive.tar.gz");
        assert_eq!(parsed.local_path(), "./testdata/testarchive.tar.gz");
    }

    #[test]
    fn test_parse_file_url_absolute() {
        let parsed = parse_url("file:///var/cache/src.tar.gz", true).unwrap();
        assert_eq!(parsed.host, "");
        assert_eq!(parsed.local_path(), "/var/cache/src.tar.gz");
    }

    #[test]
    fn test_parse_missing_scheme() {
        assert!(matches!(parse_url("://blergh", true).unwrap_err(), Error::MissingScheme));
        assert!(matches!(parse_url("blergh", true).unwrap_err(), Error::MissingScheme));
    }

    #[test]
    fn test_parse_lenient_treats_bare_path_as_file() {
        let parsed = parse_url("./testdata/testarchive.tar.gz", false).unwrap();
        assert_eq!(parsed.protocol, Protocol::File);
        assert_eq!(parsed.scheme, "");
        assert_eq!(parsed.local_path(), "./testdata/testarchive.tar.gz");
    }

    #[test]
    fn test_parse_unsupported_scheme() {
        match parse_url("gxp://blergh/blargh", true).unwrap_err() {
            Error::UnsupportedScheme(scheme) => assert_eq!(scheme, "gxp"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_fetch_file_copies_bytes() {
        let mut src = tempfile::NamedTempFile::new().unwrap();
        src.write_all(b"payload").unwrap();

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("copy");
        fetch_file(src.path().to_str().unwrap(), &dest).unwrap();
        assert_eq!(std::fs::read(&dest).unwrap(), b"payload");
    }

    #[test]
    fn test_fetch_file_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("copy");
        let err = fetch_file("testdata/no-such-file", &dest).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
