//! Waiting for the launched application.
//!
//! `FixedDelay` sleeps unconditionally. `Probe` polls a TCP port or an HTTP
//! health URL with exponential backoff and gives up after a bounded number of
//! attempts.

use std::net::{TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

use crate::error::BootstrapError;
use crate::launch::AppProcess;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeTarget {
    /// `host:port`, ready once a TCP connect succeeds
    Tcp(String),
    /// Full URL, ready on a 2xx response
    Http(String),
}

impl ProbeTarget {
    /// Derive a target from the browser URL: TCP on its authority, or HTTP
    /// GET of `health_path` on the same origin.
    pub fn from_url(url: &str, health_path: Option<&str>) -> Self {
        let (scheme, rest) = match url.split_once("://") {
            Some((s, r)) => (s.to_lowercase(), r),
            None => ("http".to_string(), url),
        };
        let authority = rest.split(['/', '?', '#']).next().unwrap_or(rest);
        match health_path {
            Some(path) => {
                let path = if path.starts_with('/') {
                    path.to_string()
                } else {
                    format!("/{}", path)
                };
                ProbeTarget::Http(format!("{}://{}{}", scheme, authority, path))
            }
            None => {
                let has_port = authority
                    .rsplit_once(':')
                    .map_or(false, |(_, p)| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()));
                if has_port {
                    ProbeTarget::Tcp(authority.to_string())
                } else {
                    let port = if scheme == "https" { 443 } else { 80 };
                    ProbeTarget::Tcp(format!("{}:{}", authority, port))
                }
            }
        }
    }

    pub fn describe(&self) -> &str {
        match self {
            ProbeTarget::Tcp(addr) => addr,
            ProbeTarget::Http(url) => url,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeConfig {
    pub attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    /// Per-attempt connect/request timeout
    pub timeout: Duration,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            attempts: 20,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(2),
            timeout: Duration::from_secs(1),
        }
    }
}

impl ProbeConfig {
    /// Sleep before attempt `n + 1` (0-based `n`): initial × 2ⁿ, capped.
    pub fn backoff(&self, n: u32) -> Duration {
        let factor = 2u32.saturating_pow(n.min(16));
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    FixedDelay(Duration),
    Probe { target: ProbeTarget, config: ProbeConfig },
}

/// How readiness was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyState {
    Delayed(Duration),
    Ready { attempts: u32, elapsed: Duration },
}

/// Wait according to `readiness`. With a probe, an app that exits early is
/// reported as [`BootstrapError::AppExited`].
pub fn wait_ready(readiness: &Readiness, mut app: Option<&mut AppProcess>) -> Result<ReadyState, BootstrapError> {
    match readiness {
        Readiness::FixedDelay(d) => {
            tracing::info!(delay_ms = d.as_millis() as u64, "Waiting fixed delay for application startup");
            std::thread::sleep(*d);
            Ok(ReadyState::Delayed(*d))
        }
        Readiness::Probe { target, config } => {
            let start = Instant::now();
            for attempt in 0..config.attempts {
                if let Some(app) = app.as_deref_mut() {
                    if let Some(status) = app.exit_status() {
                        return Err(BootstrapError::AppExited {
                            status: status.to_string(),
                        });
                    }
                }
                if probe_once(target, config.timeout) {
                    let attempts = attempt + 1;
                    tracing::info!(target = %target.describe(), attempts, "Application is ready");
                    return Ok(ReadyState::Ready {
                        attempts,
                        elapsed: start.elapsed(),
                    });
                }
                if attempt + 1 < config.attempts {
                    let backoff = config.backoff(attempt);
                    tracing::debug!(target = %target.describe(), attempt = attempt + 1, backoff_ms = backoff.as_millis() as u64, "Not ready yet");
                    std::thread::sleep(backoff);
                }
            }
            Err(BootstrapError::NotReady {
                target: target.describe().to_string(),
                attempts: config.attempts,
            })
        }
    }
}

/// A single probe attempt.
pub fn probe_once(target: &ProbeTarget, timeout: Duration) -> bool {
    match target {
        ProbeTarget::Tcp(addr) => match addr.to_socket_addrs() {
            Ok(addrs) => addrs
                .into_iter()
                .any(|sa| TcpStream::connect_timeout(&sa, timeout).is_ok()),
            Err(e) => {
                tracing::debug!(addr = %addr, error = %e, "Cannot resolve probe address");
                false
            }
        },
        ProbeTarget::Http(url) => {
            let agent = ureq::AgentBuilder::new().timeout(timeout).build();
            match agent.get(url).call() {
                Ok(resp) => (200..300).contains(&resp.status()),
                Err(_) => false,
            }
        }
    }
}
