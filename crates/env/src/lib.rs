//! Sauce Labs connection settings.
//!
//! `SauceConfig` is the explicit configuration value built once at process start (from CLI flags
//! and environment variables) and passed by reference to the tool sources. Resolution into an
//! [`Upstream`] is a pure function of that value.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use url::Url;

pub const USERNAME_VAR: &str = "SAUCE_USERNAME";
pub const ACCESS_KEY_VAR: &str = "SAUCE_ACCESS_KEY";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvError {
    #[error("missing Sauce Labs credentials: {var} is not set")]
    MissingCredentials { var: &'static str },

    #[error("unknown Sauce Labs region '{region}' (expected one of: {})", Region::codes())]
    InvalidRegion { region: String },

    #[error("region 'other' requires an explicit API base URL (SAUCE_API_URL)")]
    OtherRegionWithoutUrl,

    #[error("invalid Sauce Labs API base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

/// Sauce Labs data center.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Region {
    #[default]
    UsWest1,
    UsEast4,
    EuCentral1,
}

impl Region {
    pub const ALL: [Region; 3] = [Region::UsWest1, Region::UsEast4, Region::EuCentral1];

    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Region::UsWest1 => "us-west-1",
            Region::UsEast4 => "us-east-4",
            Region::EuCentral1 => "eu-central-1",
        }
    }

    #[must_use]
    pub fn base_url(self) -> &'static str {
        match self {
            Region::UsWest1 => "https://api.us-west-1.saucelabs.com",
            Region::UsEast4 => "https://api.us-east-4.saucelabs.com",
            Region::EuCentral1 => "https://api.eu-central-1.saucelabs.com",
        }
    }

    fn codes() -> String {
        Region::ALL
            .iter()
            .map(|r| r.code())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Region {
    type Err = EnvError;

    /// Accepts the API host codes (`eu-central-1`), their short forms (`eu-central`) and the
    /// legacy constant names (`EU_CENTRAL`). Case and `_`/`-` are not significant.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        match normalized.as_str() {
            "us-west-1" | "us-west" => Ok(Region::UsWest1),
            "us-east-4" | "us-east" => Ok(Region::UsEast4),
            "eu-central-1" | "eu-central" => Ok(Region::EuCentral1),
            _ => Err(EnvError::InvalidRegion {
                region: s.to_string(),
            }),
        }
    }
}

/// Raw connection settings, as configured.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SauceConfig {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub access_key: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub api_url: Option<String>,
}

impl fmt::Debug for SauceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SauceConfig")
            .field("username", &self.username)
            .field("access_key", &self.access_key.as_ref().map(|_| "***"))
            .field("region", &self.region)
            .field("api_url", &self.api_url)
            .finish()
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub access_key: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("access_key", &"***")
            .finish()
    }
}

/// Where requests go and how they authenticate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upstream {
    pub credentials: Credentials,
    pub base_url: Url,
    /// `None` when the base URL came from the override.
    pub region: Option<Region>,
}

impl SauceConfig {
    /// Resolve credentials and base URL.
    ///
    /// # Errors
    ///
    /// Returns `MissingCredentials` when the username or access key is absent or empty,
    /// `InvalidRegion` for a region outside the table, and `InvalidBaseUrl` for an override that
    /// is not an absolute `http(s)` URL.
    pub fn resolve(&self) -> Result<Upstream, EnvError> {
        let credentials = self.credentials()?;
        let (base_url, region) = self.base_url()?;
        Ok(Upstream {
            credentials,
            base_url,
            region,
        })
    }

    /// Resolve only the credentials.
    ///
    /// # Errors
    ///
    /// Returns `MissingCredentials` naming the first variable that is absent or empty.
    pub fn credentials(&self) -> Result<Credentials, EnvError> {
        let username = non_empty(self.username.as_deref()).ok_or(EnvError::MissingCredentials {
            var: USERNAME_VAR,
        })?;
        let access_key =
            non_empty(self.access_key.as_deref()).ok_or(EnvError::MissingCredentials {
                var: ACCESS_KEY_VAR,
            })?;
        Ok(Credentials {
            username: username.to_string(),
            access_key: access_key.to_string(),
        })
    }

    /// Resolve the base URL. The override wins over the region.
    ///
    /// # Errors
    ///
    /// See [`SauceConfig::resolve`].
    pub fn base_url(&self) -> Result<(Url, Option<Region>), EnvError> {
        if let Some(raw) = non_empty(self.api_url.as_deref()) {
            return parse_override(raw).map(|u| (u, None));
        }

        let region = match non_empty(self.region.as_deref()) {
            None => Region::default(),
            Some(r) if r.eq_ignore_ascii_case("other") => {
                return Err(EnvError::OtherRegionWithoutUrl);
            }
            Some(r) => r.parse::<Region>()?,
        };

        let url = Url::parse(region.base_url()).map_err(|e| EnvError::InvalidBaseUrl {
            url: region.base_url().to_string(),
            reason: e.to_string(),
        })?;
        Ok((url, Some(region)))
    }
}

fn non_empty(v: Option<&str>) -> Option<&str> {
    v.map(str::trim).filter(|s| !s.is_empty())
}

fn parse_override(raw: &str) -> Result<Url, EnvError> {
    let url = Url::parse(raw).map_err(|e| EnvError::InvalidBaseUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Ok(url),
        other => Err(EnvError::InvalidBaseUrl {
            url: raw.to_string(),
            reason: format!("expected an absolute http(s) URL, got scheme '{other}'"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(region: Option<&str>, api_url: Option<&str>) -> SauceConfig {
        SauceConfig {
            username: Some("u1".to_string()),
            access_key: Some("k1".to_string()),
            region: region.map(str::to_string),
            api_url: api_url.map(str::to_string),
        }
    }

    #[test]
    fn default_region_is_us_west_1() {
        let up = config(None, None).resolve().expect("resolve");
        assert_eq!(up.region, Some(Region::UsWest1));
        assert_eq!(up.base_url.host_str(), Some("api.us-west-1.saucelabs.com"));
    }

    #[test]
    fn eu_central_1_matches_table() {
        let up = config(Some("eu-central-1"), None).resolve().expect("resolve");
        assert_eq!(up.region, Some(Region::EuCentral1));
        assert_eq!(
            up.base_url.as_str().trim_end_matches('/'),
            Region::EuCentral1.base_url()
        );
    }

    #[test]
    fn region_aliases_are_accepted() {
        for (raw, expected) in [
            ("US_WEST", Region::UsWest1),
            ("us-east", Region::UsEast4),
            ("US-EAST-4", Region::UsEast4),
            ("eu_central", Region::EuCentral1),
        ] {
            assert_eq!(raw.parse::<Region>().expect(raw), expected);
        }
    }

    #[test]
    fn unknown_region_is_invalid() {
        let err = config(Some("mars-north-1"), None).resolve().unwrap_err();
        assert_eq!(
            err,
            EnvError::InvalidRegion {
                region: "mars-north-1".to_string()
            }
        );
        assert!(err.to_string().contains("eu-central-1"));
    }

    #[test]
    fn override_takes_precedence_over_region() {
        let up = config(Some("eu-central-1"), Some("https://sauce.example.internal/"))
            .resolve()
            .expect("resolve");
        assert_eq!(up.region, None);
        assert_eq!(up.base_url.host_str(), Some("sauce.example.internal"));
    }

    #[test]
    fn other_region_requires_override() {
        let err = config(Some("OTHER"), None).resolve().unwrap_err();
        assert_eq!(err, EnvError::OtherRegionWithoutUrl);

        let up = config(Some("OTHER"), Some("http://127.0.0.1:9000"))
            .resolve()
            .expect("resolve");
        assert_eq!(up.base_url.port(), Some(9000));
    }

    #[test]
    fn override_must_be_http_url() {
        let err = config(None, Some("ftp://example.com")).resolve().unwrap_err();
        assert!(matches!(err, EnvError::InvalidBaseUrl { .. }));
    }

    #[test]
    fn empty_credentials_are_missing() {
        let mut cfg = config(None, None);
        cfg.access_key = Some("  ".to_string());
        assert_eq!(
            cfg.resolve().unwrap_err(),
            EnvError::MissingCredentials {
                var: ACCESS_KEY_VAR
            }
        );

        cfg.username = None;
        assert_eq!(
            cfg.resolve().unwrap_err(),
            EnvError::MissingCredentials { var: USERNAME_VAR }
        );
    }

    #[test]
    fn debug_output_hides_access_key() {
        let cfg = config(None, None);
        let rendered = format!("{cfg:?}");
        assert!(!rendered.contains("k1"));
        let creds = cfg.credentials().expect("credentials");
        assert!(!format!("{creds:?}").contains("k1"));
    }
}
