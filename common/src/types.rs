//! 入力テーブルと処理結果の型定義
//!
//! - Cell: セル値（書式なしのプレーンな値）
//! - InputTable: DATATUNGGAKAN シートのヘッダー行 + データ行
//! - ProcessingResult: 振り分け処理の結果（呼び出し側に返す）

use crate::error::{Error, Result};
use crate::partition::Partition;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::path::PathBuf;

/// 振り分けに使う列（E列、0始まりで4）
pub const CLASSIFICATION_COLUMN: usize = 4;

/// セル値
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Cell {
    #[default]
    Empty,
    String(String),
    Number(f64),
    Bool(bool),
    /// Excelのシリアル値
    DateTime(f64),
    /// `#N/A` などのエラー表示
    Error(String),
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::String(s) => s.is_empty(),
            _ => false,
        }
    }

    /// 照合用の文字列表現（整数値の数値は小数点なしで表す）
    pub fn to_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::String(s) => s.clone(),
            Cell::Number(n) | Cell::DateTime(n) => format_number(*n),
            Cell::Bool(b) => b.to_string(),
            Cell::Error(e) => e.clone(),
        }
    }
}

fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::String(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::String(s)
    }
}

/// 1行分のセル
pub type Row = Vec<Cell>;

/// 行末の空セルを取り除く（空行は長さ0になる）
pub fn trim_row(mut row: Row) -> Row {
    while row.last().is_some_and(Cell::is_empty) {
        row.pop();
    }
    row
}

/// 入力テーブル（先頭行がヘッダー）
#[derive(Debug, Clone, PartialEq)]
pub struct InputTable {
    pub header: Row,
    pub rows: Vec<Row>,
}

impl InputTable {
    /// シートの行からテーブルを組み立てる
    ///
    /// 各行は行末の空セルを除いた長さで扱う。シートが空の場合、
    /// ヘッダーがE列まで届かない場合は `Error::Format`。
    pub fn from_rows<I>(rows: I) -> Result<Self>
    where
        I: IntoIterator<Item = Row>,
    {
        let mut rows = rows.into_iter().map(trim_row);

        let header = rows
            .next()
            .ok_or_else(|| Error::Format("DATATUNGGAKAN シートが空です".into()))?;

        if header.len() <= CLASSIFICATION_COLUMN {
            return Err(Error::Format(format!(
                "E列（ROUTE/RUTE）がヘッダーにありません（列数: {}）",
                header.len()
            )));
        }

        Ok(Self {
            header,
            rows: rows.collect(),
        })
    }

    /// 空行（列数0）を除いたデータ行数
    pub fn non_empty_row_count(&self) -> usize {
        self.rows.iter().filter(|r| !r.is_empty()).count()
    }
}

/// チーム別件数（チームの出現順を保持してJSONオブジェクトとして出力）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TeamCounts(Vec<(String, usize)>);

impl TeamCounts {
    pub fn get(&self, team: &str) -> Option<usize> {
        self.0.iter().find(|(t, _)| t == team).map(|(_, c)| *c)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.0.iter().map(|(t, c)| (t.as_str(), *c))
    }

    pub fn total(&self) -> usize {
        self.0.iter().map(|(_, c)| c).sum()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, usize)> for TeamCounts {
    fn from_iter<T: IntoIterator<Item = (String, usize)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Serialize for TeamCounts {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (team, count) in &self.0 {
            map.serialize_entry(team, count)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for TeamCounts {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct CountsVisitor;

        impl<'de> Visitor<'de> for CountsVisitor {
            type Value = TeamCounts;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of team name to row count")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<Self::Value, A::Error> {
                let mut counts = Vec::new();
                while let Some((team, count)) = access.next_entry::<String, usize>()? {
                    counts.push((team, count));
                }
                Ok(TeamCounts(counts))
            }
        }

        deserializer.deserialize_map(CountsVisitor)
    }
}

/// 処理結果のサマリー
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_teams: usize,
    pub has_unmapped: bool,
    pub team_counts: TeamCounts,
}

/// 振り分け処理の結果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingResult {
    /// 出力ファイル名（ディレクトリを含まない）
    pub output_file: String,

    /// 出力ファイルのパス
    #[serde(skip)]
    pub output_path: PathBuf,

    /// 1行以上振り分けられたチーム（出現順）
    pub teams_processed: Vec<String>,

    pub unmapped_rows_count: usize,

    pub summary: Summary,
}

impl ProcessingResult {
    pub fn from_partition(output_file: String, output_path: PathBuf, partition: &Partition) -> Self {
        let team_counts: TeamCounts = partition
            .teams()
            .map(|bucket| (bucket.team.clone(), bucket.rows.len()))
            .collect();

        Self {
            output_file,
            output_path,
            teams_processed: partition.team_names().map(str::to_string).collect(),
            unmapped_rows_count: partition.unmapped().len(),
            summary: Summary {
                total_teams: team_counts.len(),
                has_unmapped: !partition.unmapped().is_empty(),
                team_counts,
            },
        }
    }
}
