//! Process configuration.
//!
//! Loaded once at startup from a YAML file with `ASTRM__`-prefixed
//! environment overrides, then shared read-only by every component.

use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use serde::Deserialize;
use url::Url;

use crate::{Error, Result};

const DEFAULT_LISTEN: &str = ":8095";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Listening address. `":8095"` binds all interfaces.
    #[serde(default = "default_listen")]
    pub listen: String,

    pub emby: EmbyConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbyConfig {
    /// Backend address; the scheme defaults to `http://`.
    pub addr: String,

    #[serde(rename = "apiKey", alias = "apikey", default)]
    pub api_key: String,

    /// Rewrite rules, evaluated in declared order.
    #[serde(rename = "httpStrm", alias = "httpstrm", default)]
    pub http_strm: Vec<RuleConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RuleConfig {
    #[serde(default)]
    pub enable: bool,

    /// Regular expression matched case-insensitively against the item path.
    #[serde(rename = "match", default)]
    pub pattern: String,

    /// Whether transcoding stays available for matched sources.
    #[serde(rename = "transCode", alias = "transcode", default)]
    pub transcode: bool,

    /// Chase HTTP redirects to hand out the final location.
    #[serde(rename = "finalURL", alias = "finalurl", default)]
    pub final_url: bool,

    #[serde(default)]
    pub mode: UrlMode,

    #[serde(default)]
    pub actions: Vec<ActionConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActionConfig {
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default)]
    pub args: String,
}

/// How a matched source's URL is handed to the client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UrlMode {
    /// Same-origin `/Videos/<id>/stream` URL, redirected on request.
    #[default]
    Proxy,
    /// Remote URL written straight into the payload.
    Direct,
}

fn default_listen() -> String {
    DEFAULT_LISTEN.to_string()
}

impl Config {
    /// Load configuration with priority:
    /// 1. Environment variables (`ASTRM__EMBY__APIKEY`, ...)
    /// 2. Config file at `path`
    pub fn load(path: &str) -> Result<Self> {
        let builder = ConfigBuilder::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(env_source());
        Self::finish(builder.build()?)
    }

    /// Load from an in-memory YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let builder = ConfigBuilder::builder().add_source(File::from_str(yaml, FileFormat::Yaml));
        Self::finish(builder.build()?)
    }

    fn finish(raw: ConfigBuilder) -> Result<Self> {
        let config: Self = raw.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.emby.addr.trim().is_empty() {
            return Err(Error::Config("emby.addr must not be empty".into()));
        }
        self.emby.base_url()?;
        Ok(())
    }

    /// Socket address to bind, expanding the `":port"` shorthand.
    pub fn listen_addr(&self) -> String {
        let listen = self.listen.trim();
        if listen.is_empty() {
            format!("0.0.0.0{}", DEFAULT_LISTEN)
        } else if listen.starts_with(':') {
            format!("0.0.0.0{}", listen)
        } else {
            listen.to_string()
        }
    }
}

impl EmbyConfig {
    /// Backend base URL with a scheme and without trailing slashes.
    pub fn base_url(&self) -> Result<Url> {
        let addr = self.addr.trim();
        let addr = if addr.starts_with("http://") || addr.starts_with("https://") {
            addr.to_string()
        } else {
            format!("http://{}", addr)
        };
        Url::parse(addr.trim_end_matches('/'))
            .map_err(|e| Error::Config(format!("emby.addr {:?}: {}", self.addr, e)))
    }
}

fn env_source() -> Environment {
    Environment::with_prefix("ASTRM")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
listen: ":9000"
emby:
  addr: "emby.lan:8096/"
  apiKey: "secret"
  httpStrm:
    - enable: true
      match: ".*\\.strm$"
      transCode: false
      finalURL: true
      actions:
        - type: replace
          args: "127.0.0.1 -> example.com"
    - enable: false
      match: "^/mnt/"
      mode: direct
"#;

    #[test]
    fn test_parse_sample() {
        let config = Config::from_yaml_str(SAMPLE).unwrap();
        assert_eq!(config.emby.api_key, "secret");
        assert_eq!(config.emby.http_strm.len(), 2);

        let first = &config.emby.http_strm[0];
        assert!(first.enable);
        assert_eq!(first.pattern, ".*\\.strm$");
        assert!(!first.transcode);
        assert!(first.final_url);
        assert_eq!(first.mode, UrlMode::Proxy);
        assert_eq!(first.actions[0].kind, "replace");

        assert_eq!(config.emby.http_strm[1].mode, UrlMode::Direct);
    }

    #[test]
    fn test_listen_addr_shorthand() {
        let config = Config::from_yaml_str(SAMPLE).unwrap();
        assert_eq!(config.listen_addr(), "0.0.0.0:9000");
    }

    #[test]
    fn test_listen_defaults() {
        let config = Config::from_yaml_str("emby:\n  addr: http://emby:8096\n").unwrap();
        assert_eq!(config.listen, ":8095");
        assert_eq!(config.listen_addr(), "0.0.0.0:8095");
        assert!(config.emby.http_strm.is_empty());
    }

    #[test]
    fn test_base_url_adds_scheme_and_strips_slash() {
        let config = Config::from_yaml_str(SAMPLE).unwrap();
        let base = config.emby.base_url().unwrap();
        assert_eq!(base.scheme(), "http");
        assert_eq!(base.host_str(), Some("emby.lan"));
        assert_eq!(base.port(), Some(8096));
        assert_eq!(base.path(), "/");
    }

    #[test]
    fn test_empty_addr_rejected() {
        let result = Config::from_yaml_str("emby:\n  addr: \"\"\n");
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
