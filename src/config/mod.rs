use std::env;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq)]
pub struct ConfigFile {
    #[serde(alias = "catalog_url", alias = "games")]
    pub catalog: Option<String>,
    pub page_size: Option<usize>,
    pub timeout: Option<u64>,
    pub proxy: Option<String>,
    pub base_url: Option<String>,
    pub sitemap_output: Option<String>,
    pub output_format: Option<String>,
    pub related_limit: Option<usize>,
    pub new_game_days: Option<i64>,
    pub favorites: Option<Vec<String>>,
    pub recent: Option<Vec<String>>,
    pub no_color: Option<bool>,
}

fn home_dir() -> Option<PathBuf> {
    env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(|| env::var_os("USERPROFILE").map(PathBuf::from))
        .or_else(|| {
            let drive = env::var_os("HOMEDRIVE")?;
            let path = env::var_os("HOMEPATH")?;
            Some(PathBuf::from(drive).join(path))
        })
}

pub fn default_config_path() -> Option<PathBuf> {
    Some(home_dir()?.join(".kloopik").join("config.yml"))
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\")) {
        if let Some(home) = home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

pub fn load_config(path: &PathBuf, allow_missing: bool) -> Result<ConfigFile, String> {
    match std::fs::read_to_string(path) {
        Ok(contents) if contents.trim().is_empty() => Ok(ConfigFile::default()),
        Ok(contents) => serde_yaml::from_str::<Option<ConfigFile>>(&contents)
            .map(Option::unwrap_or_default)
            .map_err(|e| format!("failed to parse config '{}': {e}", path.display())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound && allow_missing => {
            Ok(ConfigFile::default())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(format!("config file not found '{}'", path.display()))
        }
        Err(e) => Err(format!("failed to read config '{}': {e}", path.display())),
    }
}

fn default_config_yaml() -> String {
    r#"# Kloopik config
#
# Location (default):
#   ~/.kloopik/config.yml

# Catalog document: a local path or an http(s) URL
catalog: ./games.json

# Listing
page_size: 48
related_limit: 10
# Games added within this many days are flagged as new on the home view
new_game_days: 7
# output_format: text

# HTTP (only used when catalog is a URL)
timeout: 10
# proxy: http://127.0.0.1:8080

# Sitemap
base_url: https://kloopik.com
# sitemap_output: ./sitemap.xml

# Ids resolved by `kloopik route` for the favorites/recent views
# favorites: ["101", "202"]
# recent: []

# Output styling
no_color: false
"#
    .to_string()
}

pub fn ensure_default_config_file(path: &PathBuf) -> Result<bool, String> {
    if path.exists() {
        return Ok(false);
    }
    let parent = path
        .parent()
        .ok_or_else(|| format!("invalid config path '{}'", path.display()))?;
    std::fs::create_dir_all(parent).map_err(|e| {
        format!(
            "failed to create config directory '{}': {e}",
            parent.display()
        )
    })?;
    let contents = default_config_yaml();
    std::fs::write(path, contents)
        .map_err(|e| format!("failed to write config file '{}': {e}", path.display()))?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_yaml_parses() {
        let cfg: ConfigFile = serde_yaml::from_str(&default_config_yaml()).unwrap();
        assert_eq!(cfg.catalog.as_deref(), Some("./games.json"));
        assert_eq!(cfg.page_size, Some(48));
        assert_eq!(cfg.no_color, Some(false));
        assert!(cfg.favorites.is_none());
    }

    #[test]
    fn missing_file_allowed_or_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.yml");
        assert_eq!(load_config(&path, true).unwrap(), ConfigFile::default());
        assert!(load_config(&path, false).unwrap_err().contains("not found"));
    }

    #[test]
    fn ensure_default_writes_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yml");
        assert!(ensure_default_config_file(&path).unwrap());
        assert!(!ensure_default_config_file(&path).unwrap());
        let cfg = load_config(&path, false).unwrap();
        assert_eq!(cfg.base_url.as_deref(), Some("https://kloopik.com"));
    }

    #[test]
    fn empty_file_is_default_and_aliases_work() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("c.yml");
        std::fs::write(&path, "").unwrap();
        assert_eq!(load_config(&path, false).unwrap(), ConfigFile::default());
        std::fs::write(&path, "catalog_url: https://cdn/games.json\n").unwrap();
        assert_eq!(
            load_config(&path, false).unwrap().catalog.as_deref(),
            Some("https://cdn/games.json")
        );
    }

    #[test]
    fn tilde_expands_to_home() {
        assert_eq!(expand_tilde("/abs/path"), PathBuf::from("/abs/path"));
        if let Some(home) = home_dir() {
            assert_eq!(expand_tilde("~/x.json"), home.join("x.json"));
        }
    }
}
