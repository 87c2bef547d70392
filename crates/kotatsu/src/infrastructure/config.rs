use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    time::Duration,
};

use kotatsu_parsers::{proxy::ProxyConfig, settings::SourceSettings};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

pub static GLOBAL_CONFIG: OnceCell<Config> = OnceCell::new();

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Config {
    #[serde(skip)]
    path: PathBuf,
    #[serde(default = "default_database_path")]
    pub database_path: String,
    #[serde(default = "default_create_database")]
    pub create_database: bool,
    /// Seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,
    #[serde(default)]
    pub proxy: ProxyConfig,
    /// Per source overrides keyed by source key, e.g. `DESUME`
    #[serde(default)]
    pub sources: HashMap<String, SourceSettings>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            path: kotatsu_home().join("config.yml"),
            database_path: default_database_path(),
            create_database: default_create_database(),
            connect_timeout: default_connect_timeout(),
            proxy: ProxyConfig::default(),
            sources: HashMap::new(),
        }
    }
}

fn kotatsu_home() -> PathBuf {
    match std::env::var("KOTATSU_HOME") {
        Ok(path) => PathBuf::from(path),
        Err(_) => dirs::home_dir().unwrap_or_default().join(".kotatsu"),
    }
}

fn default_database_path() -> String {
    let path = kotatsu_home();
    if !path.exists() {
        let _ = std::fs::create_dir_all(&path);
    }
    path.join("kotatsu.db").display().to_string()
}

fn default_create_database() -> bool {
    true
}

fn default_connect_timeout() -> u64 {
    30
}

impl Config {
    pub fn open<P: AsRef<Path>>(path: Option<P>) -> Result<Config, anyhow::Error> {
        let config_path = match path {
            Some(p) => PathBuf::new().join(p),
            None => kotatsu_home().join("config.yml"),
        };

        let cfg = match std::fs::File::open(&config_path) {
            Ok(file) => {
                info!("Open config from {:?}", config_path);
                let mut cfg: Self = serde_yml::from_reader(file)?;
                cfg.path = config_path;
                cfg
            }
            Err(_) => {
                let cfg = Config {
                    path: config_path,
                    ..Default::default()
                };
                cfg.save()?;
                info!("Write default config at {:?}", cfg.path);
                cfg
            }
        };
        cfg.proxy.validate()?;

        Ok(cfg)
    }

    pub fn save(&self) -> Result<(), anyhow::Error> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_yml::to_string(&self)?)?;

        Ok(())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout)
    }
}

#[cfg(test)]
mod test {
    use kotatsu_parsers::proxy::ProxyType;

    use super::*;

    fn temp_config_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("kotatsu-config-test-{}-{name}", std::process::id()))
            .join("config.yml")
    }

    #[test]
    fn test_parse_config() {
        let cfg: Config = serde_yml::from_str(
            r#"
database_path: /tmp/kotatsu.db
proxy:
  type: socks
  address: 127.0.0.1
  port: 1080
sources:
  DESUME:
    domain: desu.win
"#,
        )
        .unwrap();

        assert_eq!(cfg.database_path, "/tmp/kotatsu.db");
        assert!(cfg.create_database);
        assert_eq!(cfg.connect_timeout(), Duration::from_secs(30));
        assert_eq!(cfg.proxy.kind, ProxyType::Socks);
        assert_eq!(cfg.proxy.port, Some(1080));
        assert_eq!(
            cfg.sources["DESUME"].domain.as_deref(),
            Some("desu.win")
        );
    }

    #[test]
    fn test_open_writes_default_then_reads_it() {
        let path = temp_config_path("default");
        let _ = std::fs::remove_file(&path);

        let created = Config::open(Some(&path)).unwrap();
        assert!(path.exists());
        assert_eq!(created.proxy, ProxyConfig::default());

        let reopened = Config::open(Some(&path)).unwrap();
        assert_eq!(reopened.database_path, created.database_path);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_open_rejects_invalid_proxy() {
        let path = temp_config_path("proxy");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "database_path: /tmp/k.db\nproxy:\n  type: http\n").unwrap();

        assert!(Config::open(Some(&path)).is_err());

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}
