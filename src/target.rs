/// Connection target resolution.
///
/// A run resolves its target exactly once. The resolved value is shared
/// read-only by every virtual client through a [`TargetCell`] handle;
/// later resolution attempts are no-ops that return the cached target.
use std::env;
use std::sync::OnceLock;

use crate::error::TargetError;

/// Default server port, used when the target spec or environment omits one.
pub const DEFAULT_PORT: u16 = 7171;
/// Default host when neither a target spec nor the environment supplies one.
pub const DEFAULT_HOST: &str = "localhost";

const HOST_ENV: &str = "REDIS_HOST";
const PORT_ENV: &str = "REDIS_PORT";
const SCHEME: &str = "tcp://";

/// Resolved connection target. Invariant: host is non-empty, port is
/// positive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionTarget {
    pub host: String,
    pub port: u16,
}

impl ConnectionTarget {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Parse a `tcp://host[:port]` spec. The port defaults to
/// [`DEFAULT_PORT`] when omitted.
pub fn parse_target(raw: &str) -> Result<ConnectionTarget, TargetError> {
    let rest = raw.strip_prefix(SCHEME).unwrap_or(raw);
    let (host, port) = match rest.split_once(':') {
        Some((host, port_str)) => {
            let port = port_str
                .parse::<u16>()
                .ok()
                .filter(|p| *p > 0)
                .ok_or_else(|| TargetError::InvalidPort {
                    target: raw.to_string(),
                    port: port_str.to_string(),
                })?;
            (host, port)
        }
        None => (rest, DEFAULT_PORT),
    };
    if host.is_empty() {
        return Err(TargetError::MissingHost(raw.to_string()));
    }
    Ok(ConnectionTarget {
        host: host.to_string(),
        port,
    })
}

fn from_env() -> Result<ConnectionTarget, TargetError> {
    let host = env::var(HOST_ENV).unwrap_or_else(|_| DEFAULT_HOST.to_string());
    let port = match env::var(PORT_ENV) {
        Ok(value) => value
            .parse::<u16>()
            .ok()
            .filter(|p| *p > 0)
            .ok_or(TargetError::InvalidEnvPort {
                var: PORT_ENV,
                value,
            })?,
        Err(_) => DEFAULT_PORT,
    };
    Ok(ConnectionTarget { host, port })
}

fn resolve_raw(spec: Option<&str>) -> Result<ConnectionTarget, TargetError> {
    match spec {
        Some(raw) if raw.starts_with(SCHEME) => parse_target(raw),
        _ => from_env(),
    }
}

/// Resolve-once guard for the connection target.
///
/// Owned by the process and passed by `Arc` handle into each virtual
/// client. Concurrent first-time callers may race to parse, but exactly
/// one value wins and every caller observes it.
#[derive(Debug, Default)]
pub struct TargetCell {
    cell: OnceLock<ConnectionTarget>,
}

impl TargetCell {
    pub const fn new() -> Self {
        Self {
            cell: OnceLock::new(),
        }
    }

    /// Resolve the target from the given spec (falling back to the
    /// environment), caching the first successful result.
    pub fn resolve(&self, spec: Option<&str>) -> Result<ConnectionTarget, TargetError> {
        if let Some(target) = self.cell.get() {
            return Ok(target.clone());
        }
        let fresh = resolve_raw(spec)?;
        Ok(self.cell.get_or_init(|| fresh).clone())
    }

    /// The cached target, if a resolution has completed.
    pub fn get(&self) -> Option<&ConnectionTarget> {
        self.cell.get()
    }
}
