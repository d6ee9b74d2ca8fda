use serde::{de::Visitor, Deserialize, Deserializer};
use std::{
    net::SocketAddr,
    ops::Deref,
    path::{Path, PathBuf},
};
use time::{macros::format_description, UtcOffset};
use url::Url;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("could not read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("could not parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("usage: {0} <config.toml>")]
    Usage(String),
}

#[derive(Deserialize, Debug, Clone)]
pub struct NetConfig {
    pub proto_host: Url,
    #[serde(default = "default_base_path")]
    pub base_path: String,
    pub bind: SocketAddr,
}

#[derive(Deserialize, Debug, Clone)]
pub struct RepositoryConfig {
    /// API root, e.g. `https://my-repo.cdn.prismic.io/api/v2`.
    pub endpoint: Url,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default = "default_document_type")]
    pub document_type: String,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Upper bound for `/?pages=N`.
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
}

#[derive(Deserialize, Debug, Clone)]
pub struct CommentsConfig {
    pub repo: String,
    #[serde(default = "default_issue_term")]
    pub issue_term: String,
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default = "default_comments_src")]
    pub src: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct SiteConfig {
    #[serde(default)]
    pub static_dir: Option<ValidPath>,
    #[serde(default = "default_offset", deserialize_with = "deserialize_offset")]
    pub display_offset: UtcOffset,
    /// Repository name the preview toolbar script is loaded for.
    pub toolbar_repo: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    pub net: NetConfig,
    pub repository: RepositoryConfig,
    pub comments: CommentsConfig,
    pub site: SiteConfig,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn default_base_path() -> String {
    "/".to_string()
}

fn default_document_type() -> String {
    "post".to_string()
}

fn default_page_size() -> u32 {
    20
}

fn default_max_pages() -> u32 {
    10
}

fn default_issue_term() -> String {
    "pathname".to_string()
}

fn default_theme() -> String {
    "github-dark".to_string()
}

fn default_comments_src() -> String {
    "https://utteranc.es/client.js".to_string()
}

fn default_offset() -> UtcOffset {
    UtcOffset::UTC
}

fn deserialize_offset<'de, D>(deserializer: D) -> Result<UtcOffset, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    UtcOffset::parse(
        &value,
        format_description!("[offset_hour sign:mandatory]:[offset_minute]"),
    )
    .map_err(serde::de::Error::custom)
}

#[derive(Debug, Clone)]
pub struct ValidPath(PathBuf);

impl<'de> Deserialize<'de> for ValidPath {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct ValidPathVisitor;
        impl Visitor<'_> for ValidPathVisitor {
            type Value = ValidPath;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(formatter, "a path to an existing directory")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(ValidPath(
                    PathBuf::from(v).canonicalize().map_err(E::custom)?,
                ))
            }
        }

        deserializer.deserialize_str(ValidPathVisitor)
    }
}

impl Deref for ValidPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        self.0.as_path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        [net]
        proto_host = "https://blog.example.com"
        bind = "127.0.0.1:3000"

        [repository]
        endpoint = "https://blog.cdn.prismic.io/api/v2"

        [comments]
        repo = "fiali1/blog-comments"

        [site]
        toolbar_repo = "blog"
    "#;

    #[test]
    fn minimal_config_uses_defaults() {
        let config: Config = toml::from_str(MINIMAL).unwrap();

        assert_eq!(config.net.base_path, "/");
        assert_eq!(config.repository.document_type, "post");
        assert_eq!(config.repository.page_size, 20);
        assert_eq!(config.repository.max_pages, 10);
        assert_eq!(config.repository.access_token, None);
        assert_eq!(config.comments.issue_term, "pathname");
        assert_eq!(config.comments.theme, "github-dark");
        assert_eq!(config.comments.src, "https://utteranc.es/client.js");
        assert_eq!(config.site.display_offset, UtcOffset::UTC);
        assert!(config.site.static_dir.is_none());
    }

    #[test]
    fn parses_display_offset() {
        let config: Config = toml::from_str(&MINIMAL.replace(
            r#"toolbar_repo = "blog""#,
            "toolbar_repo = \"blog\"\ndisplay_offset = \"-03:00\"",
        ))
        .unwrap();

        assert_eq!(config.site.display_offset, time::macros::offset!(-3));
    }

    #[test]
    fn static_dir_must_exist() {
        let broken = MINIMAL.replace(
            r#"toolbar_repo = "blog""#,
            "toolbar_repo = \"blog\"\nstatic_dir = \"/definitely/not/here\"",
        );
        assert!(toml::from_str::<Config>(&broken).is_err());
    }

    #[test]
    fn load_reports_the_path() {
        let error = Config::load(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(error, ConfigError::Io { .. }));
        assert!(error.to_string().contains("/definitely/not/here.toml"));
    }
}
