//! 出力ファイル名の生成と書き出し

use crate::error::{Result, SplitError};
use chrono::{DateTime, SecondsFormat, Utc};
use std::io::Write;
use std::path::{Component, Path, PathBuf};

/// 出力ファイル名の接頭辞
pub const OUTPUT_PREFIX: &str = "hasil_";
/// 出力ファイルの拡張子
pub const OUTPUT_EXTENSION: &str = "xlsx";

/// `hasil_2026-10-19T08-30-15-123Z.xlsx` 形式のファイル名
pub fn output_file_name(now: DateTime<Utc>) -> String {
    lazy_static::lazy_static! {
        static ref UNSAFE_CHARS: regex::Regex = regex::Regex::new(r"[:.]").unwrap();
    }

    let timestamp = now.to_rfc3339_opts(SecondsFormat::Millis, true);
    format!(
        "{}{}.{}",
        OUTPUT_PREFIX,
        UNSAFE_CHARS.replace_all(&timestamp, "-"),
        OUTPUT_EXTENSION
    )
}

/// バッファを出力ディレクトリに書き出す
///
/// ディレクトリ内の一時ファイルに書いてから名前を変えるので、
/// 書きかけのファイルが見えることはない。
pub fn write_output(output_dir: &Path, file_name: &str, data: &[u8]) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir)?;

    let target = output_dir.join(file_name);
    let mut temp = tempfile::Builder::new()
        .prefix(".hasil-")
        .suffix(".tmp")
        .tempfile_in(output_dir)?;
    temp.write_all(data)?;
    temp.as_file().sync_all()?;
    temp.persist(&target).map_err(|e| SplitError::Io(e.error))?;

    Ok(target)
}

/// 生成済みファイルのパスを返す（ダウンロード用）
///
/// ディレクトリ区切りや `..` を含む名前は受け付けない。
pub fn resolve_output_path(output_dir: &Path, file_name: &str) -> Result<PathBuf> {
    let mut components = Path::new(file_name).components();
    let is_plain_name = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );

    if !is_plain_name {
        return Err(SplitError::FileNotFound(file_name.to_string()));
    }

    let path = output_dir.join(file_name);
    if !path.is_file() {
        return Err(SplitError::FileNotFound(path.display().to_string()));
    }

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 8, 30, 15).unwrap() + chrono::Duration::milliseconds(123)
    }

    #[test]
    fn test_output_file_name() {
        assert_eq!(
            output_file_name(fixed_time()),
            "hasil_2026-10-19T08-30-15-123Z.xlsx"
        );
    }

    #[test]
    fn test_output_file_name_has_no_unsafe_chars() {
        let name = output_file_name(Utc::now());
        let stem = name.strip_suffix(".xlsx").unwrap();
        assert!(stem.starts_with(OUTPUT_PREFIX));
        assert!(!stem.contains(':'));
        assert!(!stem.contains('.'));
    }

    #[test]
    fn test_write_output_creates_dir() {
        let dir = tempfile::tempdir().unwrap();
        let out_dir = dir.path().join("uploads");

        let path = write_output(&out_dir, "hasil_test.xlsx", b"PK-data").unwrap();

        assert_eq!(path, out_dir.join("hasil_test.xlsx"));
        assert_eq!(std::fs::read(&path).unwrap(), b"PK-data");
        // 一時ファイルは残らない
        assert_eq!(std::fs::read_dir(&out_dir).unwrap().count(), 1);
    }

    #[test]
    fn test_resolve_output_path() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("hasil_a.xlsx"), b"x").unwrap();

        let path = resolve_output_path(dir.path(), "hasil_a.xlsx").unwrap();
        assert_eq!(path, dir.path().join("hasil_a.xlsx"));
    }

    #[test]
    fn test_resolve_output_path_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["../secret.xlsx", "a/b.xlsx", "/etc/passwd", "..", ""] {
            let err = resolve_output_path(dir.path(), name).unwrap_err();
            assert!(matches!(err, SplitError::FileNotFound(_)), "{}", name);
        }
    }

    #[test]
    fn test_resolve_output_path_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve_output_path(dir.path(), "hasil_none.xlsx").unwrap_err();
        assert!(matches!(err, SplitError::FileNotFound(_)));
    }
}
