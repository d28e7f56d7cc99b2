use std::time::Duration;

use bytes::Bytes;
use color_eyre::eyre::{Result, eyre};
use http_body_util::Empty;
use hyper::{Request, StatusCode, Uri, header};
use hyper_rustls::HttpsConnectorBuilder;
use hyper_util::{client::legacy::Client, rt::TokioExecutor};
use tracing::{debug, error};
use types::ApiConfig;

/// Same hop limit as a browser `fetch`
const MAX_REDIRECTS: usize = 20;

/// Transport knobs for the health probe. The default waits indefinitely.
#[derive(Clone, Debug, Default)]
pub struct ProbeOptions {
    pub timeout: Option<Duration>,
    /// Prefixed to a relative health URL; `backend_url` when unset
    pub origin: Option<String>,
}

impl ProbeOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }
}

/// Whether the backend answers its health endpoint with a 2xx status
pub async fn check_backend_health(config: &ApiConfig) -> bool {
    check_backend_health_with(config, &ProbeOptions::default()).await
}

/// Like [`check_backend_health`]. Every failure is logged and reported as `false`.
pub async fn check_backend_health_with(config: &ApiConfig, options: &ProbeOptions) -> bool {
    match probe(config, options).await {
        Ok(healthy) => healthy,
        Err(err) => {
            error!(target: constants::LOG_TARGET, "Backend health check failed: {err:#}");
            false
        }
    }
}

/// Absolute URI of the health endpoint
pub fn health_uri(config: &ApiConfig, origin: Option<&str>) -> Result<Uri> {
    let url = config.health_url();
    let url = if url.starts_with('/') {
        let origin = origin.unwrap_or(config.backend_url);
        format!("{}{}", origin.trim_end_matches('/'), url)
    } else {
        url
    };
    let uri = url
        .parse::<Uri>()
        .map_err(|e| eyre!("invalid health URL `{url}`: {e}"))?;
    if uri.scheme().is_none() || uri.authority().is_none() {
        return Err(eyre!("health URL `{url}` has no scheme or host"));
    }
    Ok(uri)
}

async fn probe(config: &ApiConfig, options: &ProbeOptions) -> Result<bool> {
    let uri = health_uri(config, options.origin.as_deref())?;
    debug!(target: constants::LOG_TARGET, %uri, "Probing backend");
    let status = match options.timeout {
        Some(limit) => tokio::time::timeout(limit, fetch_status(uri))
            .await
            .map_err(|_| eyre!("no response within {limit:?}"))??,
        None => fetch_status(uri).await?,
    };
    debug!(target: constants::LOG_TARGET, %status, "Health endpoint responded");
    Ok(status.is_success())
}

async fn fetch_status(uri: Uri) -> Result<StatusCode> {
    let connector = HttpsConnectorBuilder::new()
        .with_webpki_roots()
        .https_or_http()
        .enable_http1()
        .build();
    let client: Client<_, Empty<Bytes>> = Client::builder(TokioExecutor::new()).build(connector);

    let mut uri = uri;
    for _ in 0..=MAX_REDIRECTS {
        let req = Request::get(uri.clone())
            .header(header::CONTENT_TYPE, "application/json")
            .body(Empty::<Bytes>::new())?;

        let res = client.request(req).await?;
        let status = res.status();
        if !is_followed_redirect(status) {
            return Ok(status);
        }
        let location = res
            .headers()
            .get(header::LOCATION)
            .ok_or_else(|| eyre!("{status} from {uri} without a Location header"))?
            .to_str()
            .map_err(|e| eyre!("unreadable Location header from {uri}: {e}"))?;
        let next = resolve_location(&uri, location)?;
        debug!(target: constants::LOG_TARGET, %status, from = %uri, to = %next, "Following redirect");
        uri = next;
    }
    Err(eyre!("more than {MAX_REDIRECTS} redirects"))
}

fn is_followed_redirect(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::MOVED_PERMANENTLY
            | StatusCode::FOUND
            | StatusCode::SEE_OTHER
            | StatusCode::TEMPORARY_REDIRECT
            | StatusCode::PERMANENT_REDIRECT
    )
}

/// Resolve a `Location` value against the URI that returned it
fn resolve_location(base: &Uri, location: &str) -> Result<Uri> {
    if let Ok(uri) = location.parse::<Uri>() {
        if uri.scheme().is_some() && uri.authority().is_some() {
            return Ok(uri);
        }
    }
    let scheme = base.scheme_str().unwrap_or("http");
    let authority = base
        .authority()
        .ok_or_else(|| eyre!("cannot resolve `{location}` against {base}"))?;
    let resolved = if location.starts_with("//") {
        format!("{scheme}:{location}")
    } else if location.starts_with('/') {
        format!("{scheme}://{authority}{location}")
    } else {
        let path = base.path();
        let dir = &path[..path.rfind('/').map_or(0, |i| i + 1)];
        let dir = if dir.is_empty() { "/" } else { dir };
        format!("{scheme}://{authority}{dir}{location}")
    };
    resolved
        .parse::<Uri>()
        .map_err(|e| eyre!("invalid redirect target `{location}`: {e}"))
}
