use std::{
    convert::Infallible,
    io::{self, Write},
    net::SocketAddr,
    sync::{Arc, Mutex},
    time::Duration,
};

use bytes::Bytes;
use http_body_util::Full;
use hyper::{
    Request, Response, StatusCode, body::Incoming, header, server::conn::http1,
    service::service_fn,
};
use hyper_util::rt::TokioIo;
use pretty_assertions::assert_eq;
use tokio::net::TcpListener;
use tracing::Level;
use tracing_subscriber::fmt::MakeWriter;
use types::{ApiConfig, EnvInputs, Mode};
use utils::{ProbeOptions, check_backend_health, check_backend_health_with};

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    fn failures(&self) -> usize {
        let buf = self.0.lock().unwrap();
        String::from_utf8_lossy(&buf)
            .lines()
            .filter(|line| line.contains(" api:") && line.contains("Backend health check failed"))
            .count()
    }
}

impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for Captured {
    type Writer = Captured;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

fn capture_logs() -> (Captured, tracing::subscriber::DefaultGuard) {
    let captured = Captured::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(captured.clone())
        .with_ansi(false)
        .with_max_level(Level::ERROR)
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (captured, guard)
}

/// Answer each path with the status and optional `Location` from `route`.
/// Requests without the JSON content type get 415.
async fn serve_with<F>(route: F) -> SocketAddr
where
    F: Fn(&str) -> (StatusCode, Option<String>) + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let route = Arc::new(route);
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let route = route.clone();
            tokio::spawn(async move {
                let service = service_fn(move |req: Request<Incoming>| {
                    let route = route.clone();
                    async move {
                        let is_json = req
                            .headers()
                            .get(header::CONTENT_TYPE)
                            .is_some_and(|value| value == "application/json");
                        let (status, location) = if is_json {
                            route(req.uri().path())
                        } else {
                            (StatusCode::UNSUPPORTED_MEDIA_TYPE, None)
                        };
                        let mut res = Response::builder().status(status);
                        if let Some(location) = location {
                            res = res.header(header::LOCATION, location);
                        }
                        Ok::<_, Infallible>(res.body(Full::new(Bytes::from_static(b"{}"))).unwrap())
                    }
                });
                let _ = http1::Builder::new()
                    .serve_connection(TokioIo::new(stream), service)
                    .await;
            });
        }
    });
    addr
}

/// Serve `status` on `/api/health`, 404 for anything else
async fn serve(status: StatusCode) -> SocketAddr {
    serve_with(move |path| match path {
        "/api/health" => (status, None),
        _ => (StatusCode::NOT_FOUND, None),
    })
    .await
}

/// Accept connections and never answer
async fn serve_silently() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            held.push(stream);
        }
    });
    addr
}

async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

fn production_config(addr: SocketAddr) -> ApiConfig {
    ApiConfig::new(&EnvInputs::new(Mode::Production).with_api_url(format!("http://{addr}/api")))
}

#[tokio::test]
async fn healthy_backend_reports_true() {
    let (logs, _guard) = capture_logs();
    let addr = serve(StatusCode::OK).await;

    assert!(check_backend_health(&production_config(addr)).await);
    assert_eq!(logs.failures(), 0);
}

#[tokio::test]
async fn any_success_status_counts() {
    let (logs, _guard) = capture_logs();
    let addr = serve(StatusCode::NO_CONTENT).await;

    assert!(check_backend_health(&production_config(addr)).await);
    assert_eq!(logs.failures(), 0);
}

#[tokio::test]
async fn unavailable_backend_reports_false_without_logging() {
    let (logs, _guard) = capture_logs();
    let addr = serve(StatusCode::SERVICE_UNAVAILABLE).await;

    assert!(!check_backend_health(&production_config(addr)).await);
    assert_eq!(logs.failures(), 0);
}

#[tokio::test]
async fn refused_connection_is_logged_once() {
    let (logs, _guard) = capture_logs();
    let addr = closed_port().await;

    assert!(!check_backend_health(&production_config(addr)).await);
    assert_eq!(logs.failures(), 1);
}

#[tokio::test]
async fn malformed_url_is_logged_once() {
    let (logs, _guard) = capture_logs();
    let config = ApiConfig::new(&EnvInputs::new(Mode::Production).with_api_url("not a url"));

    assert!(!check_backend_health(&config).await);
    assert_eq!(logs.failures(), 1);
}

#[tokio::test]
async fn timeout_is_reported_as_failure() {
    let (logs, _guard) = capture_logs();
    let addr = serve_silently().await;
    let options = ProbeOptions::default().with_timeout(Duration::from_millis(100));

    assert!(!check_backend_health_with(&production_config(addr), &options).await);
    assert_eq!(logs.failures(), 1);
}

#[tokio::test]
async fn development_probe_goes_through_origin() {
    let (logs, _guard) = capture_logs();
    let addr = serve(StatusCode::OK).await;
    let config = ApiConfig::new(&EnvInputs::new(Mode::Development));
    let options = ProbeOptions::default().with_origin(format!("http://{addr}"));

    assert!(check_backend_health_with(&config, &options).await);
    assert_eq!(logs.failures(), 0);
}

#[tokio::test]
async fn concurrent_probes_do_not_interfere() {
    let up = production_config(serve(StatusCode::OK).await);
    let down = production_config(serve(StatusCode::BAD_GATEWAY).await);

    let (a, b, c) = tokio::join!(
        check_backend_health(&up),
        check_backend_health(&down),
        check_backend_health(&up),
    );
    assert_eq!((a, b, c), (true, false, true));
}

#[tokio::test]
async fn redirect_to_healthy_endpoint_is_followed() {
    let (logs, _guard) = capture_logs();
    let addr = serve_with(|path| match path {
        "/api/health" => (StatusCode::MOVED_PERMANENTLY, Some("/api/ok".to_owned())),
        "/api/ok" => (StatusCode::OK, None),
        _ => (StatusCode::NOT_FOUND, None),
    })
    .await;

    assert!(check_backend_health(&production_config(addr)).await);
    assert_eq!(logs.failures(), 0);
}

#[tokio::test]
async fn relative_redirect_to_unavailable_endpoint_is_false() {
    let (logs, _guard) = capture_logs();
    let addr = serve_with(|path| match path {
        "/api/health" => (StatusCode::FOUND, Some("ready".to_owned())),
        "/api/ready" => (StatusCode::SERVICE_UNAVAILABLE, None),
        _ => (StatusCode::NOT_FOUND, None),
    })
    .await;

    assert!(!check_backend_health(&production_config(addr)).await);
    assert_eq!(logs.failures(), 0);
}

#[tokio::test]
async fn redirect_loop_is_logged_once() {
    let (logs, _guard) = capture_logs();
    let addr = serve_with(|path| match path {
        "/api/health" => (StatusCode::TEMPORARY_REDIRECT, Some("/api/health".to_owned())),
        _ => (StatusCode::NOT_FOUND, None),
    })
    .await;

    assert!(!check_backend_health(&production_config(addr)).await);
    assert_eq!(logs.failures(), 1);
}

#[tokio::test]
async fn redirect_without_location_is_logged_once() {
    let (logs, _guard) = capture_logs();
    let addr = serve_with(|_| (StatusCode::FOUND, None)).await;

    assert!(!check_backend_health(&production_config(addr)).await);
    assert_eq!(logs.failures(), 1);
}
