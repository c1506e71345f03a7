//! Per-process fixed-window rate limiting.

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use ipnet::IpNet;
use tokio::sync::RwLock;

use crate::config::RateLimitConfig;
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::jwt::{self, TokenType};

#[derive(Debug, Clone)]
struct Window {
    count: u32,
    started: Instant,
}

/// Outcome of recording one request against a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed {
        remaining: u32,
        /// Seconds until the window resets.
        reset: u64,
    },
    Limited {
        retry_after: u64,
    },
}

#[derive(Debug, Clone)]
enum TrustedEntry {
    Ip(IpAddr),
    Cidr(IpNet),
}

impl TrustedEntry {
    fn contains(&self, ip: &IpAddr) -> bool {
        match self {
            Self::Ip(trusted) => trusted == ip,
            Self::Cidr(net) => net.contains(ip),
        }
    }
}

/// Peers whose `X-Forwarded-For` / `X-Real-IP` headers are believed.
#[derive(Debug, Clone, Default)]
enum TrustedProxies {
    #[default]
    None,
    /// Configured as `["*"]`.
    All,
    List(Vec<TrustedEntry>),
}

impl TrustedProxies {
    fn from_config(proxies: &[String]) -> Self {
        if proxies.is_empty() {
            return Self::None;
        }
        if proxies.len() == 1 && proxies[0] == "*" {
            return Self::All;
        }
        let entries = proxies
            .iter()
            .filter_map(|entry| {
                let parsed = if entry.contains('/') {
                    entry.parse::<IpNet>().map(TrustedEntry::Cidr).ok()
                } else {
                    entry.parse::<IpAddr>().map(TrustedEntry::Ip).ok()
                };
                if parsed.is_none() {
                    tracing::warn!(%entry, "Ignoring invalid trusted proxy");
                }
                parsed
            })
            .collect();
        Self::List(entries)
    }

    /// Without a peer address only `All` trusts the headers.
    fn trusts(&self, peer: Option<IpAddr>) -> bool {
        match (self, peer) {
            (Self::None, _) => false,
            (Self::All, _) => true,
            (Self::List(_), None) => false,
            (Self::List(entries), Some(ip)) => entries.iter().any(|entry| entry.contains(&ip)),
        }
    }
}

#[derive(Clone)]
pub struct RateLimiter {
    windows: Arc<RwLock<HashMap<String, Window>>>,
    max_requests: u32,
    window: Duration,
    trusted_proxies: Arc<TrustedProxies>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            windows: Arc::new(RwLock::new(HashMap::new())),
            max_requests,
            window: Duration::from_secs(window_secs),
            trusted_proxies: Arc::new(TrustedProxies::None),
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.max_requests, config.window_secs)
            .with_trusted_proxies(&config.trusted_proxies)
    }

    /// Entries are IPs or CIDR ranges; `["*"]` trusts every peer.
    pub fn with_trusted_proxies(mut self, proxies: &[String]) -> Self {
        self.trusted_proxies = Arc::new(TrustedProxies::from_config(proxies));
        self
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    /// Record a request for `key` and decide whether it may proceed.
    pub async fn check(&self, key: &str) -> Decision {
        self.check_at(key, Instant::now()).await
    }

    async fn check_at(&self, key: &str, now: Instant) -> Decision {
        let mut windows = self.windows.write().await;
        let state = windows.entry(key.to_string()).or_insert(Window {
            count: 0,
            started: now,
        });

        if now.duration_since(state.started) >= self.window {
            state.count = 0;
            state.started = now;
        }

        let left = self
            .window
            .saturating_sub(now.duration_since(state.started))
            .as_secs()
            .max(1);

        if state.count >= self.max_requests {
            return Decision::Limited { retry_after: left };
        }

        state.count += 1;
        Decision::Allowed {
            remaining: self.max_requests - state.count,
            reset: left,
        }
    }

    /// Drop windows that have already expired.
    pub async fn cleanup(&self) {
        let now = Instant::now();
        let window = self.window;
        self.windows
            .write()
            .await
            .retain(|_, w| now.duration_since(w.started) < window);
    }

    pub async fn tracked_keys(&self) -> usize {
        self.windows.read().await.len()
    }
}

/// Forwarding headers count only when the peer is a trusted proxy.
fn client_ip(
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
    trusted: &TrustedProxies,
) -> Option<IpAddr> {
    let peer_ip = peer.map(|addr| addr.ip());
    if !trusted.trusts(peer_ip) {
        return peer_ip;
    }

    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|ip| ip.trim().parse().ok());
    let real_ip = || {
        headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .and_then(|ip| ip.trim().parse().ok())
    };

    forwarded.or_else(real_ip).or(peer_ip)
}

/// Rate-limit key: the user id for a valid bearer token, otherwise the client IP.
fn limit_key(req: &Request, secret: &str, trusted: &TrustedProxies) -> String {
    let user_id = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .and_then(|token| jwt::verify(token, secret, TokenType::Access).ok())
        .map(|claims| claims.user_id);

    if let Some(id) = user_id {
        return format!("user:{id}");
    }

    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    match client_ip(req.headers(), peer, trusted) {
        Some(ip) => format!("ip:{ip}"),
        None => "anonymous".to_string(),
    }
}

pub async fn rate_limit(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let key = limit_key(
        &req,
        &state.config.auth.jwt_secret,
        &state.rate_limiter.trusted_proxies,
    );

    match state.rate_limiter.check(&key).await {
        Decision::Limited { retry_after } => {
            tracing::debug!(%key, retry_after, "Rate limit exceeded");
            Err(AppError::RateLimited { retry_after })
        }
        Decision::Allowed { remaining, reset } => {
            let limit = state.rate_limiter.max_requests();
            let mut response = next.run(req).await;
            let headers = response.headers_mut();
            headers.insert("x-ratelimit-limit", limit.into());
            headers.insert("x-ratelimit-remaining", remaining.into());
            headers.insert("x-ratelimit-reset", reset.into());
            Ok(response)
        }
    }
}
