use crate::error::{Result, SplitError};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// ルールファイルのパスを上書きする環境変数
pub const RULES_PATH_ENV: &str = "TUNGGAKAN_RULES_PATH";
/// 出力ディレクトリを上書きする環境変数
pub const OUTPUT_DIR_ENV: &str = "TUNGGAKAN_OUTPUT_DIR";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// 振り分けルール（JSON）のパス
    pub rules_path: PathBuf,
    /// 出力ブックの保存先
    pub output_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rules_path: PathBuf::from("config").join("rules.json"),
            output_dir: PathBuf::from("uploads"),
        }
    }
}

impl Config {
    /// ユーザー設定を読み込み、環境変数で上書きする
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        let mut config = Self::load_from(&config_path)?;
        config.apply_env();
        Ok(config)
    }

    /// 指定パスから読み込み（存在しなければデフォルト）
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| SplitError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| SplitError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("tunggakan-split").join("config.json"))
    }

    fn apply_env(&mut self) {
        self.apply_overrides(
            std::env::var_os(RULES_PATH_ENV),
            std::env::var_os(OUTPUT_DIR_ENV),
        );
    }

    /// メモリ上の設定だけを上書きする（ファイルには書かない）
    pub fn apply_overrides(&mut self, rules_path: Option<OsString>, output_dir: Option<OsString>) {
        if let Some(path) = rules_path {
            self.rules_path = PathBuf::from(path);
        }
        if let Some(dir) = output_dir {
            self.output_dir = PathBuf::from(dir);
        }
    }

    pub fn set_rules_path(&mut self, path: PathBuf) -> Result<()> {
        self.set_rules_path_at(&Self::config_path()?, path)
    }

    pub fn set_output_dir(&mut self, dir: PathBuf) -> Result<()> {
        self.set_output_dir_at(&Self::config_path()?, dir)
    }

    /// 設定ファイルの `rulesPath` だけを書き換える
    pub fn set_rules_path_at(&mut self, config_path: &Path, path: PathBuf) -> Result<()> {
        Self::update_file(config_path, |c| c.rules_path = path.clone())?;
        self.rules_path = path;
        Ok(())
    }

    /// 設定ファイルの `outputDir` だけを書き換える
    pub fn set_output_dir_at(&mut self, config_path: &Path, dir: PathBuf) -> Result<()> {
        Self::update_file(config_path, |c| c.output_dir = dir.clone())?;
        self.output_dir = dir;
        Ok(())
    }

    // 環境変数の上書きを含まない、ファイル上の設定に対して変更を加える
    fn update_file(config_path: &Path, change: impl FnOnce(&mut Self)) -> Result<()> {
        let mut persisted = Self::load_from(config_path)?;
        change(&mut persisted);
        persisted.save_to(config_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_paths() {
        let config = Config::default();
        assert_eq!(config.rules_path, Path::new("config/rules.json"));
        assert_eq!(config.output_dir, Path::new("uploads"));
    }

    #[test]
    fn test_load_missing_file_gives_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("none.json")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = Config {
            rules_path: PathBuf::from("/srv/rules.json"),
            output_dir: PathBuf::from("/srv/out"),
        };

        config.save_to(&path).unwrap();
        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"outputDir": "hasil"}"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.output_dir, Path::new("hasil"));
        assert_eq!(config.rules_path, Path::new("config/rules.json"));
    }

    #[test]
    fn test_corrupt_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, SplitError::Config(_)));
    }

    #[test]
    fn test_setter_does_not_persist_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"rulesPath": "config/rules.json", "outputDir": "uploads"}"#)
            .unwrap();

        let mut config = Config::load_from(&path).unwrap();
        config.apply_overrides(None, Some(OsString::from("/tmp/override-out")));
        config
            .set_rules_path_at(&path, PathBuf::from("/srv/rules.json"))
            .unwrap();

        // メモリ上は上書きが残り、ファイルには設定した項目だけが入る
        assert_eq!(config.output_dir, Path::new("/tmp/override-out"));
        assert_eq!(config.rules_path, Path::new("/srv/rules.json"));

        let persisted = Config::load_from(&path).unwrap();
        assert_eq!(persisted.output_dir, Path::new("uploads"));
        assert_eq!(persisted.rules_path, Path::new("/srv/rules.json"));
    }

    #[test]
    fn test_set_output_dir_keeps_persisted_rules_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"rulesPath": "/srv/rules.json"}"#).unwrap();

        let mut config = Config::load_from(&path).unwrap();
        config.apply_overrides(Some(OsString::from("/tmp/other-rules.json")), None);
        config.set_output_dir_at(&path, PathBuf::from("hasil")).unwrap();

        let persisted = Config::load_from(&path).unwrap();
        assert_eq!(persisted.rules_path, Path::new("/srv/rules.json"));
        assert_eq!(persisted.output_dir, Path::new("hasil"));
    }
}
