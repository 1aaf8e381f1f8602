//! 振り分けルールの保存・読み込み
//!
//! ルールファイル（JSON）と、現在有効なルールのメモリ上のコピーを管理する。
//! 読み出しは `Arc` のスナップショットで返すので、処理中に `save` されても
//! 実行中の振り分けには影響しない。

use crate::error::{Result, SplitError};
use log::{debug, info};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use tunggakan_common::RulesMap;

#[derive(Debug)]
pub struct RulesStore {
    path: PathBuf,
    active: RwLock<Option<Arc<RulesMap>>>,
}

impl RulesStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            active: RwLock::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// ルールファイルを読み込み、有効なルールとして保持する
    pub fn load(&self) -> Result<Arc<RulesMap>> {
        let mut active = self.active.write().unwrap_or_else(PoisonError::into_inner);

        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            SplitError::Config(format!(
                "ルールファイルを読み込めません ({}): {}",
                self.path.display(),
                e
            ))
        })?;

        let rules = RulesMap::from_json(&content).map_err(|e| {
            SplitError::Config(format!(
                "ルールファイルが不正です ({}): {}",
                self.path.display(),
                e
            ))
        })?;

        debug!(
            "rules loaded from {}: {} teams, {} routes",
            self.path.display(),
            rules.len(),
            rules.route_count()
        );

        let rules = Arc::new(rules);
        *active = Some(Arc::clone(&rules));
        Ok(rules)
    }

    /// 有効なルールを返す（未読み込みなら読み込む）
    pub fn get(&self) -> Result<Arc<RulesMap>> {
        let current = self
            .active
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        match current {
            Some(rules) => Ok(rules),
            None => self.load(),
        }
    }

    /// ルールを保存し、有効なルールを置き換える
    ///
    /// 同じディレクトリの一時ファイルに書いてから置き換えるので、
    /// 途中で失敗しても既存のファイルは壊れない。
    ///
    /// ファイルの置き換えとメモリ上の置き換えは同じ書き込みロックの中で行い、
    /// 並行して保存されてもファイルとメモリの内容が食い違わないようにする。
    pub fn save(&self, rules: RulesMap) -> Result<()> {
        let json = rules.to_json_pretty()?;
        let mut active = self.active.write().unwrap_or_else(PoisonError::into_inner);

        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&parent)?;

        let mut temp = tempfile::NamedTempFile::new_in(&parent)?;
        temp.write_all(json.as_bytes())?;
        temp.as_file().sync_all()?;
        temp.persist(&self.path).map_err(|e| SplitError::Io(e.error))?;

        info!(
            "rules saved to {}: {} teams, {} routes",
            self.path.display(),
            rules.len(),
            rules.route_count()
        );

        *active = Some(Arc::new(rules));
        Ok(())
    }

    /// 外部から受け取ったJSON値を検証して保存する
    pub fn save_value(&self, value: &serde_json::Value) -> Result<RulesMap> {
        let rules = RulesMap::from_value(value)?;
        self.save(rules.clone())?;
        Ok(rules)
    }

    /// JSON文字列を検証して保存する
    pub fn save_json_str(&self, json: &str) -> Result<RulesMap> {
        let value: serde_json::Value = serde_json::from_str(json)
            .map_err(|e| SplitError::Validation(format!("JSONとして解析できません: {}", e)))?;
        self.save_value(&value)
    }

    /// メモリ上の有効なルールだけを置き換える（ファイルには書かない）
    pub fn replace(&self, rules: RulesMap) -> Arc<RulesMap> {
        let rules = Arc::new(rules);
        *self.active.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&rules));
        rules
    }
}
