//! Data-plane HTTP client
//!
//! Thin wrapper over `reqwest` that knows how to address a storage account,
//! attach the service version and optional pre-issued credentials, and turn
//! non-success responses into [`CoreError::Api`].

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use std::collections::BTreeMap;
use tracing::{debug, trace};
use url::Url;

use crate::config::Profile;
use crate::error::{CoreError, Result};

/// Service version sent with every request
pub const SERVICE_VERSION: &str = "2023-11-03";

/// Header carrying the service error code on failures
pub const ERROR_CODE_HEADER: &str = "x-ms-error-code";

const META_PREFIX: &str = "x-ms-meta-";

/// Storage services with their own endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Blob,
    File,
}

impl Service {
    pub fn subdomain(&self) -> &'static str {
        match self {
            Service::Blob => "blob",
            Service::File => "file",
        }
    }
}

/// Client bound to one service of one storage account
#[derive(Debug, Clone)]
pub struct DataPlaneClient {
    http: reqwest::Client,
    base: Url,
    bearer_token: Option<String>,
    sas_token: Option<String>,
}

impl DataPlaneClient {
    /// Build a client for `account`/`service` as addressed by `profile`
    ///
    /// With a fixed `endpoint` the account becomes the first path segment
    /// (emulator style); otherwise `https://{account}.{service}.{suffix}/`.
    pub fn new(
        http: reqwest::Client,
        profile: &Profile,
        account: &str,
        service: Service,
    ) -> Result<Self> {
        validate_account_name(account)?;

        let base = match &profile.endpoint {
            Some(endpoint) => {
                let mut base = Url::parse(endpoint)?;
                base.path_segments_mut()
                    .map_err(|_| CoreError::Config(format!("endpoint '{endpoint}' cannot be a base URL")))?
                    .pop_if_empty()
                    .push(account)
                    .push("");
                base
            }
            None => Url::parse(&format!(
                "https://{}.{}.{}/",
                account,
                service.subdomain(),
                profile.endpoint_suffix
            ))?,
        };
        debug!(%base, ?service, "Resolved data-plane endpoint");

        Ok(Self {
            http,
            base,
            bearer_token: profile.bearer_token.clone(),
            sas_token: profile.sas_token.clone(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// URL for a path below the account, with query parameters
    pub fn url(&self, segments: &[&str], query: &[(&str, &str)]) -> Result<Url> {
        let mut url = self.base.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| CoreError::Validation(format!("'{}' cannot be a base URL", self.base)))?;
            path.pop_if_empty();
            for segment in segments {
                path.extend(segment.split('/').filter(|s| !s.is_empty()));
            }
        }

        let has_query = self.sas_token.is_some() || !query.is_empty();
        if has_query {
            let mut pairs = url.query_pairs_mut();
            if let Some(sas) = &self.sas_token {
                let sas = sas.trim_start_matches('?');
                pairs.extend_pairs(url::form_urlencoded::parse(sas.as_bytes()));
            }
            pairs.extend_pairs(query);
        }
        Ok(url)
    }

    /// Start a request with the common headers applied
    pub fn request(
        &self,
        method: Method,
        segments: &[&str],
        query: &[(&str, &str)],
    ) -> Result<RequestBuilder> {
        let url = self.url(segments, query)?;
        trace!(%method, %url, "Building data-plane request");

        let mut builder = self
            .http
            .request(method, url)
            .header("x-ms-version", SERVICE_VERSION);
        if let Some(token) = &self.bearer_token {
            builder = builder.bearer_auth(token);
        }
        Ok(builder)
    }

    /// Send a request, mapping non-success statuses to [`CoreError::Api`]
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let response = builder.send().await?;
        check_status(response).await
    }

    /// Send a request where 404 means "absent" rather than failure
    pub async fn send_optional(&self, builder: RequestBuilder) -> Result<Option<Response>> {
        let response = builder.send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        check_status(response).await.map(Some)
    }
}

/// Convert a non-success response into an API error
pub async fn check_status(response: Response) -> Result<Response> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let header_code = response
        .headers()
        .get(ERROR_CODE_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = response.text().await.unwrap_or_default();

    let code = header_code.or_else(|| xml_element(&body, "Code").map(str::to_string));
    let message = xml_element(&body, "Message")
        .map(str::to_string)
        .or_else(|| (!body.trim().is_empty()).then(|| body.trim().to_string()))
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());

    debug!(status = status.as_u16(), ?code, "Data-plane request failed");
    Err(CoreError::Api {
        status: status.as_u16(),
        code,
        message,
    })
}

/// True when `err` is a 409 carrying the given service error code
pub fn is_conflict_with_code(err: &CoreError, code: &str) -> bool {
    err.is_conflict() && err.error_code() == Some(code)
}

/// Attach `x-ms-meta-*` headers
pub fn with_metadata(
    mut builder: RequestBuilder,
    metadata: &BTreeMap<String, String>,
) -> RequestBuilder {
    for (key, value) in metadata {
        builder = builder.header(format!("{META_PREFIX}{key}"), value);
    }
    builder
}

/// Collect `x-ms-meta-*` headers from a response
pub fn metadata_from(response: &Response) -> BTreeMap<String, String> {
    response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            let key = name.as_str().strip_prefix(META_PREFIX)?;
            Some((key.to_string(), value.to_str().ok()?.to_string()))
        })
        .collect()
}

/// Read a response header as a string
pub fn header_str(response: &Response, name: &str) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Metadata keys must be valid identifiers
pub fn validate_metadata(metadata: &BTreeMap<String, String>) -> Result<()> {
    for key in metadata.keys() {
        let mut chars = key.chars();
        let valid_start = chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
        if !valid_start || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(CoreError::Validation(format!(
                "metadata key '{key}' must start with a letter or underscore and contain only letters, digits and underscores"
            )));
        }
    }
    Ok(())
}

/// Storage account names are 3-24 lowercase letters and digits
pub fn validate_account_name(name: &str) -> Result<()> {
    let valid = (3..=24).contains(&name.len())
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit());
    if valid {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "storage account name '{name}' must be 3-24 lowercase letters or digits"
        )))
    }
}

/// Share and container names: 3-63 chars, lowercase letters, digits and
/// single hyphens, starting and ending alphanumeric
pub fn validate_container_name(kind: &str, name: &str) -> Result<()> {
    let valid = (3..=63).contains(&name.len())
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        && !name.starts_with('-')
        && !name.ends_with('-')
        && !name.contains("--");
    if valid {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "{kind} name '{name}' must be 3-63 lowercase letters, digits or single hyphens"
        )))
    }
}

/// Text of the first `<element>...</element>` in `body`
///
/// Only enough XML handling for the flat `<Error><Code/><Message/></Error>`
/// bodies the data plane returns: no attributes, namespaces, entities or
/// nesting. [`check_status`] prefers the `x-ms-error-code` header for the
/// code and uses this as a fallback.
fn xml_element<'a>(body: &'a str, element: &str) -> Option<&'a str> {
    let open = format!("<{element}>");
    let close = format!("</{element}>");
    let start = body.find(&open)? + open.len();
    let end = body[start..].find(&close)? + start;
    Some(body[start..end].trim())
}
