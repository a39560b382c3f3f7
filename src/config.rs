use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::error::{Error, Result};

pub(crate) const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Connection settings for the HERMES service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Service root, e.g. `https://hermes.example.org`. The `/v1` API segment
    /// is added by the client when missing.
    pub url: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Whether to verify TLS certificates.
    pub verify: bool,
}

impl ClientConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout: DEFAULT_TIMEOUT,
            verify: true,
        }
    }

    /// Resolves the configuration from (in order of precedence):
    /// - explicit arguments
    /// - environment variables `HERMES_URL` / `HERMES_TIMEOUT` / `HERMES_VERIFY`
    /// - config file from `HERMES_RC`, `./.hermesrc` or `~/.hermesrc`
    pub fn load(
        url: Option<String>,
        timeout: Option<Duration>,
        verify: Option<bool>,
    ) -> Result<Self> {
        let env = EnvConfig::from_env()?;
        load_config(url, timeout, verify, env, &rc_candidates())
    }
}

#[derive(Debug, Default)]
struct RcConfig {
    url: Option<String>,
    timeout: Option<Duration>,
    verify: Option<bool>,
}

type EnvConfig = RcConfig;

impl EnvConfig {
    fn from_env() -> Result<Self> {
        let timeout = match std::env::var("HERMES_TIMEOUT") {
            Ok(v) => Some(parse_timeout(&v)?),
            Err(_) => None,
        };
        Ok(Self {
            url: std::env::var("HERMES_URL").ok(),
            timeout,
            verify: std::env::var("HERMES_VERIFY").ok().map(|v| parse_verify(&v)),
        })
    }
}

fn load_config(
    url: Option<String>,
    timeout: Option<Duration>,
    verify: Option<bool>,
    env: EnvConfig,
    rc_candidates: &[PathBuf],
) -> Result<ClientConfig> {
    let mut url = url.or(env.url);
    let mut timeout = timeout.or(env.timeout);
    let mut verify = verify.or(env.verify);

    if url.is_none() || timeout.is_none() || verify.is_none() {
        for rc_path in rc_candidates {
            if rc_path.exists() {
                debug!(path = %rc_path.display(), "reading configuration file");
                let cfg = read_rc(rc_path)?;
                url = url.or(cfg.url);
                timeout = timeout.or(cfg.timeout);
                verify = verify.or(cfg.verify);
                break;
            }
        }
    }

    let Some(url) = url else {
        if rc_candidates.is_empty() {
            return Err(Error::Config(
                "missing url (set HERMES_URL or create .hermesrc)".to_string(),
            ));
        }
        return Err(Error::Config(format!(
            "missing url (set HERMES_URL or put `url:` in one of: {})",
            rc_candidates
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        )));
    };

    Ok(ClientConfig {
        url,
        timeout: timeout.unwrap_or(DEFAULT_TIMEOUT),
        verify: verify.unwrap_or(true),
    })
}

fn read_rc(path: &Path) -> Result<RcConfig> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!(
            "failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;
    parse_rc(&text)
}

fn parse_rc(text: &str) -> Result<RcConfig> {
    let mut cfg = RcConfig::default();

    // Support formatting where `url:` is on one line and the value is on the next line.
    let mut pending_key: Option<&str> = None;

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(pk) = pending_key.take() {
            // Continuation value line; a URL contains ':' so only keys end the wait.
            if !looks_like_key(line) {
                apply(&mut cfg, pk, strip_quotes(line))?;
                continue;
            }
        }

        if let Some((k, v)) = line.split_once(':') {
            let k = k.trim();
            let v = strip_quotes(v.trim());
            if v.is_empty() {
                pending_key = Some(k);
            } else {
                apply(&mut cfg, k, v)?;
            }
        }
    }

    Ok(cfg)
}

fn looks_like_key(line: &str) -> bool {
    matches!(
        line.split_once(':').map(|(k, _)| k.trim()),
        Some("url" | "timeout" | "verify")
    )
}

fn apply(cfg: &mut RcConfig, key: &str, value: &str) -> Result<()> {
    match key {
        "url" => cfg.url = Some(value.to_string()),
        "timeout" => cfg.timeout = Some(parse_timeout(value)?),
        "verify" => cfg.verify = Some(parse_verify(value)),
        _ => {}
    }
    Ok(())
}

fn parse_timeout(v: &str) -> Result<Duration> {
    v.trim()
        .parse::<f64>()
        .ok()
        .filter(|s| s.is_finite() && *s > 0.0)
        .map(Duration::from_secs_f64)
        .ok_or_else(|| Error::Config(format!("invalid timeout {:?} (expected seconds)", v)))
}

fn parse_verify(v: &str) -> bool {
    !matches!(v.trim(), "0" | "false" | "no")
}

fn strip_quotes(s: &str) -> &str {
    let s = s.trim();
    if (s.starts_with('"') && s.ends_with('"') && s.len() >= 2)
        || (s.starts_with('\'') && s.ends_with('\'') && s.len() >= 2)
    {
        &s[1..s.len() - 1]
    } else {
        s
    }
}

fn rc_candidates() -> Vec<PathBuf> {
    // 1) HERMES_RC (explicit)
    // 2) ./.hermesrc
    // 3) ~/.hermesrc
    if let Ok(p) = std::env::var("HERMES_RC") {
        return vec![PathBuf::from(p)];
    }

    let mut v = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        v.push(cwd.join(".hermesrc"));
    }
    if let Some(home) = dirs::home_dir() {
        v.push(home.join(".hermesrc"));
    }
    v
}
