use anyhow::{Result, anyhow, bail};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::fmt;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub http: Http,
    pub log: Log,
    pub atlassian: Atlassian,
    #[serde(default)]
    pub oauth: OAuth,
    pub session: SessionSettings,
}

#[derive(Debug, Deserialize)]
pub struct Http {
    pub address: String,
    #[serde(default)]
    pub cookie_secure: bool,
    /// Empty means any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,
    #[serde(default)]
    pub tls: Option<Tls>,
}

#[derive(Debug, Deserialize)]
pub struct Tls {
    pub cert_path: String,
    pub key_path: String,
}

#[derive(Debug, Deserialize)]
pub struct Log {
    pub filter: String,
}

#[derive(Debug, Deserialize)]
pub struct Atlassian {
    pub backend: String, // "fake" or "real"
    #[serde(default = "default_auth_url")]
    pub auth_url: String,
    #[serde(default = "default_token_url")]
    pub token_url: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_site_scheme")]
    pub site_scheme: String,
}

fn default_auth_url() -> String {
    "https://auth.atlassian.com/authorize".to_string()
}

fn default_token_url() -> String {
    "https://auth.atlassian.com/oauth/token".to_string()
}

fn default_api_base() -> String {
    "https://api.atlassian.com".to_string()
}

fn default_site_scheme() -> String {
    "https".to_string()
}

#[derive(Deserialize)]
pub struct OAuth {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub jira_redirect_uri: Option<String>,
    pub confluence_redirect_uri: Option<String>,
    #[serde(default = "default_state_ttl_secs")]
    pub state_ttl_secs: u64,
}

fn default_state_ttl_secs() -> u64 {
    600
}

impl Default for OAuth {
    fn default() -> Self {
        OAuth {
            client_id: None,
            client_secret: None,
            jira_redirect_uri: None,
            confluence_redirect_uri: None,
            state_ttl_secs: default_state_ttl_secs(),
        }
    }
}

impl fmt::Debug for OAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuth")
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "***"))
            .field("jira_redirect_uri", &self.jira_redirect_uri)
            .field("confluence_redirect_uri", &self.confluence_redirect_uri)
            .field("state_ttl_secs", &self.state_ttl_secs)
            .finish()
    }
}

#[derive(Deserialize)]
pub struct SessionSettings {
    pub secret_key: String,
}

impl fmt::Debug for SessionSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionSettings")
            .field("secret_key", &"***")
            .finish()
    }
}

impl Settings {
    /// Startup checks that deserialization alone cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.session.secret_key.trim().is_empty() {
            bail!("session.secret_key (SECRET_KEY) must not be empty");
        }
        if self.oauth.client_id.is_some() && self.oauth.client_secret.is_none() {
            bail!("oauth.client_id is set but oauth.client_secret (ATLASSIAN_CLIENT_SECRET) is missing");
        }
        match self.atlassian.backend.as_str() {
            "fake" | "real" => {}
            other => bail!("Unknown atlassian backend: {}", other),
        }
        if !matches!(self.atlassian.site_scheme.as_str(), "http" | "https") {
            bail!("atlassian.site_scheme must be http or https");
        }
        for origin in &self.http.cors_origins {
            if !is_origin(origin) {
                bail!("http.cors_origins entry is not a scheme://host[:port] origin: {}", origin);
            }
        }
        Ok(())
    }
}

fn is_origin(value: &str) -> bool {
    reqwest::Url::parse(value)
        .map(|url| url.origin().ascii_serialization() == value)
        .unwrap_or(false)
}

#[cfg(test)]
impl Settings {
    /// Fake backend with OAuth configured for both products.
    pub(crate) fn for_tests() -> Settings {
        Settings {
            http: Http {
                address: "127.0.0.1:0".to_string(),
                cookie_secure: false,
                cors_origins: Vec::new(),
                tls: None,
            },
            log: Log {
                filter: "info".to_string(),
            },
            atlassian: Atlassian {
                backend: "fake".to_string(),
                auth_url: default_auth_url(),
                token_url: default_token_url(),
                api_base: default_api_base(),
                site_scheme: default_site_scheme(),
            },
            oauth: OAuth {
                client_id: Some("client-id".to_string()),
                client_secret: Some("client-secret".to_string()),
                jira_redirect_uri: Some("http://localhost:3000/auth/jira/callback".to_string()),
                confluence_redirect_uri: Some(
                    "http://localhost:3000/auth/confluence/callback".to_string(),
                ),
                state_ttl_secs: default_state_ttl_secs(),
            },
            session: SessionSettings {
                secret_key: "test-secret".to_string(),
            },
        }
    }
}

#[cfg(debug_assertions)]
const SETTINGS_PATH: &str = "settings/dev.toml";
#[cfg(not(debug_assertions))]
const SETTINGS_PATH: &str = "settings/release.toml";

const ENV_PREFIX: &str = "DASHBOARD";

// Plain variable names the deployment docs use, and where they land.
const ENV_ALIASES: [(&str, &str); 5] = [
    ("ATLASSIAN_CLIENT_ID", "oauth.client_id"),
    ("ATLASSIAN_CLIENT_SECRET", "oauth.client_secret"),
    ("JIRA_REDIRECT_URI", "oauth.jira_redirect_uri"),
    ("CONFLUENCE_REDIRECT_URI", "oauth.confluence_redirect_uri"),
    ("SECRET_KEY", "session.secret_key"),
];

pub fn parse_settings(path: Option<&str>) -> Result<Settings> {
    parse_settings_with_env(path, std::env::vars().collect())
}

/// Layers the settings file, `DASHBOARD__SECTION__KEY` variables and the
/// plain aliases (highest precedence) taken from `env`.
pub fn parse_settings_with_env(
    path: Option<&str>,
    env: config::Map<String, String>,
) -> Result<Settings> {
    let path = path.unwrap_or(SETTINGS_PATH);

    let mut builder = Config::builder()
        .add_source(File::with_name(path))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("http.cors_origins")
                .try_parsing(true)
                .source(Some(env.clone())),
        );
    for (var, key) in ENV_ALIASES {
        let value = env.get(var).filter(|v| !v.trim().is_empty()).cloned();
        builder = builder
            .set_override_option(key, value)
            .map_err(|e| anyhow!(e))?;
    }

    let settings: Settings = builder
        .build()
        .map_err(|e| anyhow!(e))?
        .try_deserialize()
        .map_err(|e| anyhow!(e))?;

    settings.validate()?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const BASE: &str = r#"
[http]
address = "127.0.0.1:8000"

[log]
filter = "info"

[atlassian]
backend = "fake"

[session]
secret_key = "from-file"
"#;

    struct TempToml(std::path::PathBuf);

    impl TempToml {
        fn new(name: &str, contents: &str) -> Self {
            let path = std::env::temp_dir().join(format!(
                "dashboard-settings-{}-{}.toml",
                name,
                std::process::id()
            ));
            let mut file = std::fs::File::create(&path).unwrap();
            file.write_all(contents.as_bytes()).unwrap();
            TempToml(path)
        }

        fn path(&self) -> &str {
            self.0.to_str().unwrap()
        }
    }

    impl Drop for TempToml {
        fn drop(&mut self) {
            let _ = std::fs::remove_file(&self.0);
        }
    }

    fn env(pairs: &[(&str, &str)]) -> config::Map<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn file_defaults_fill_the_gaps() {
        let file = TempToml::new("defaults", BASE);
        let settings = parse_settings_with_env(Some(file.path()), env(&[])).unwrap();

        assert_eq!(settings.http.address, "127.0.0.1:8000");
        assert!(!settings.http.cookie_secure);
        assert!(settings.http.cors_origins.is_empty());
        assert!(settings.http.tls.is_none());
        assert_eq!(settings.atlassian.token_url, "https://auth.atlassian.com/oauth/token");
        assert_eq!(settings.oauth.state_ttl_secs, 600);
        assert!(settings.oauth.client_id.is_none());
    }

    #[test]
    fn plain_env_names_override_the_file() {
        let file = TempToml::new("aliases", BASE);
        let settings = parse_settings_with_env(
            Some(file.path()),
            env(&[
                ("ATLASSIAN_CLIENT_ID", "cid"),
                ("ATLASSIAN_CLIENT_SECRET", "csecret"),
                ("JIRA_REDIRECT_URI", "http://localhost:3000/jira"),
                ("SECRET_KEY", "from-env"),
                ("CONFLUENCE_REDIRECT_URI", ""),
            ]),
        )
        .unwrap();

        assert_eq!(settings.oauth.client_id.as_deref(), Some("cid"));
        assert_eq!(
            settings.oauth.jira_redirect_uri.as_deref(),
            Some("http://localhost:3000/jira")
        );
        assert!(settings.oauth.confluence_redirect_uri.is_none());
        assert_eq!(settings.session.secret_key, "from-env");
    }

    #[test]
    fn prefixed_env_reaches_any_key() {
        let file = TempToml::new("prefixed", BASE);
        let settings = parse_settings_with_env(
            Some(file.path()),
            env(&[
                ("DASHBOARD__HTTP__COOKIE_SECURE", "true"),
                ("DASHBOARD__HTTP__CORS_ORIGINS", "http://a.test,http://b.test"),
                ("DASHBOARD__LOG__FILTER", "debug"),
            ]),
        )
        .unwrap();

        assert!(settings.http.cookie_secure);
        assert_eq!(
            settings.http.cors_origins,
            ["http://a.test", "http://b.test"]
        );
        assert_eq!(settings.log.filter, "debug");
    }

    #[test]
    fn startup_checks_reject_bad_combinations() {
        let file = TempToml::new("checks", BASE);

        let err = parse_settings_with_env(Some(file.path()), env(&[("ATLASSIAN_CLIENT_ID", "cid")]))
            .unwrap_err();
        assert!(err.to_string().contains("client_secret"));

        let file = TempToml::new("empty-secret", &BASE.replace("from-file", " "));
        assert!(parse_settings_with_env(Some(file.path()), env(&[])).is_err());

        let file = TempToml::new("backend", &BASE.replace("\"fake\"", "\"mock\""));
        let err = parse_settings_with_env(Some(file.path()), env(&[])).unwrap_err();
        assert!(err.to_string().contains("mock"));

        let file = TempToml::new("cors", BASE);
        let err = parse_settings_with_env(
            Some(file.path()),
            env(&[("DASHBOARD__HTTP__CORS_ORIGINS", "http://a.test/")]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("cors_origins"));
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let file = TempToml::new("redact", BASE);
        let settings = parse_settings_with_env(
            Some(file.path()),
            env(&[
                ("ATLASSIAN_CLIENT_ID", "cid"),
                ("ATLASSIAN_CLIENT_SECRET", "very-secret"),
            ]),
        )
        .unwrap();

        let printed = format!("{:?}", settings);
        assert!(printed.contains("cid"));
        assert!(!printed.contains("very-secret"));
        assert!(!printed.contains("from-file"));
    }
}
