//! 振り分け処理本体
//!
//! 入力ブック読み込み → ルート逆引き作成 → 行の振り分け →
//! チーム別シートのブック生成 → 出力 → 入力ファイル削除

use crate::error::Result;
use crate::output;
use crate::reader;
use crate::rules_store::RulesStore;
use chrono::Utc;
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tunggakan_common::export::excel_core;
use tunggakan_common::{classify, ProcessingResult, RouteIndex, RulesMap};

/// アップロードされた入力ファイル
///
/// drop 時にファイルを削除する。削除の失敗はログに残すだけで、
/// 処理結果やエラーには影響させない。
#[derive(Debug)]
pub struct InputFileGuard {
    path: PathBuf,
}

impl InputFileGuard {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for InputFileGuard {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!("input removed: {}", self.path.display()),
            Err(e) => error!("Failed to clean up file {}: {}", self.path.display(), e),
        }
    }
}

/// 入力ブックをチーム別に振り分けて出力する
///
/// 入力ファイルは成功・失敗にかかわらず削除される。
pub fn process(input_path: &Path, rules: &RulesMap, output_dir: &Path) -> Result<ProcessingResult> {
    let input = InputFileGuard::new(input_path);
    info!("processing {}", input.path().display());

    let table = reader::read_input_table(input.path())?;

    let index = RouteIndex::build(rules);
    debug!("route index: {} routes for {} teams", index.len(), rules.len());
    for c in index.collisions() {
        warn!(
            "route \"{}\" is listed under both \"{}\" and \"{}\"; using \"{}\"",
            c.route, c.previous, c.winner, c.winner
        );
    }

    let partition = classify(&table.rows, &index);
    let buffer = excel_core::generate_workbook_buffer(&table.header, &partition)?;

    let file_name = output::output_file_name(Utc::now());
    let output_path = output::write_output(output_dir, &file_name, &buffer)?;

    let result = ProcessingResult::from_partition(file_name, output_path, &partition);
    info!(
        "wrote {}: {} teams, {} unmapped rows",
        result.output_path.display(),
        result.summary.total_teams,
        result.unmapped_rows_count
    );

    Ok(result)
}

/// ルールストアと出力先を束ねた処理器
#[derive(Debug, Clone)]
pub struct Processor {
    store: Arc<RulesStore>,
    output_dir: PathBuf,
}

impl Processor {
    pub fn new(store: Arc<RulesStore>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            store,
            output_dir: output_dir.into(),
        }
    }

    /// 現在のルールのスナップショットで処理する
    ///
    /// ルールを読めない場合も入力ファイルは削除する。
    pub fn process_file(&self, input_path: &Path) -> Result<ProcessingResult> {
        let rules = match self.store.get() {
            Ok(rules) => rules,
            Err(e) => {
                drop(InputFileGuard::new(input_path));
                return Err(e);
            }
        };

        process(input_path, &rules, &self.output_dir)
    }

    /// 生成済みファイルのパス
    pub fn locate_output(&self, file_name: &str) -> Result<PathBuf> {
        output::resolve_output_path(&self.output_dir, file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("upload.xlsx");
        std::fs::write(&path, b"x").unwrap();

        {
            let guard = InputFileGuard::new(&path);
            assert!(guard.path().exists());
        }

        assert!(!path.exists());
    }

    #[test]
    fn test_guard_missing_file_does_not_panic() {
        let dir = tempfile::tempdir().unwrap();
        drop(InputFileGuard::new(dir.path().join("gone.xlsx")));
    }

    #[test]
    fn test_process_removes_input_on_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("upload.xlsx");
        std::fs::write(&input, b"not a workbook").unwrap();
        let out_dir = dir.path().join("out");

        let result = process(&input, &RulesMap::new(), &out_dir);

        assert!(result.is_err());
        assert!(!input.exists());
        assert!(!out_dir.exists());
    }

    #[test]
    fn test_process_file_without_rules_removes_input() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("upload.xlsx");
        std::fs::write(&input, b"x").unwrap();
        let store = Arc::new(RulesStore::new(dir.path().join("missing-rules.json")));

        let err = Processor::new(store, dir.path()).process_file(&input).unwrap_err();

        assert!(matches!(err, crate::error::SplitError::Config(_)));
        assert!(!input.exists());
    }
}
