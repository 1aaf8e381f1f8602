//! 振り分け結果のExcel生成（共通ライブラリ）
//!
//! チームごとに1シート（ヘッダー行 + 該当行）、最後に UNMAPPED シートを作る。
//! 値はプレーンな値として書き出し、書式は引き継がない。

use crate::error::{Error, Result};
use crate::partition::Partition;
use crate::types::{Cell, Row};
use rust_xlsxwriter::{ColNum, RowNum, Workbook, Worksheet};
use std::collections::HashSet;

/// 振り分けできなかった行のシート名
pub const UNMAPPED_SHEET: &str = "UNMAPPED";

/// Excelのシート名の最大文字数
pub const MAX_SHEET_NAME_LEN: usize = 31;

/// シート名に使えない文字
const FORBIDDEN_CHARS: &[char] = &['[', ']', ':', '*', '?', '/', '\\'];

/// 空のチーム名の代わりに使うシート名
const FALLBACK_SHEET_NAME: &str = "TEAM";

/// チーム名からシート名を作る（先頭から31文字に切り詰め）
///
/// 使えない文字は `_` に置き換え、前後のアポストロフィは除く。
pub fn sheet_name_for(team: &str) -> String {
    let cleaned: String = team
        .chars()
        .map(|c| if FORBIDDEN_CHARS.contains(&c) { '_' } else { c })
        .collect();

    let truncated: String = cleaned
        .trim_matches('\'')
        .chars()
        .take(MAX_SHEET_NAME_LEN)
        .collect();
    let name = truncated.trim_end_matches('\'');

    if name.is_empty() {
        FALLBACK_SHEET_NAME.to_string()
    } else if name.eq_ignore_ascii_case("history") {
        // Excelの予約名
        format!("{}_", name)
    } else {
        name.to_string()
    }
}

/// ブック内で重複しないシート名を払い出す
///
/// Excelはシート名の大文字小文字を区別しないため、小文字で比較する。
#[derive(Debug, Default)]
pub struct SheetNamer {
    used: HashSet<String>,
}

impl SheetNamer {
    pub fn new() -> Self {
        Self::default()
    }

    /// `name` を予約する（以降は同名を払い出さない）
    pub fn reserve(&mut self, name: &str) {
        self.used.insert(name.to_lowercase());
    }

    pub fn unique(&mut self, base: &str) -> String {
        if self.used.insert(base.to_lowercase()) {
            return base.to_string();
        }

        let mut n = 2usize;
        loop {
            let candidate = suffixed(base, n);
            if self.used.insert(candidate.to_lowercase()) {
                return candidate;
            }
            n += 1;
        }
    }
}

/// `base (n)` を31文字以内で作る
fn suffixed(base: &str, n: usize) -> String {
    let suffix = format!(" ({})", n);
    let keep = MAX_SHEET_NAME_LEN.saturating_sub(suffix.chars().count());
    let prefix: String = base.chars().take(keep).collect();
    format!("{}{}", prefix.trim_end_matches('\''), suffix)
}

/// 出力するシート1枚分
#[derive(Debug, Clone, PartialEq)]
pub struct SheetPlan<'a> {
    pub name: String,
    pub rows: &'a [Row],
}

/// シート構成を決める（チームの出現順、UNMAPPED は最後）
pub fn plan_sheets(partition: &Partition) -> Vec<SheetPlan<'_>> {
    let mut namer = SheetNamer::new();
    namer.reserve(UNMAPPED_SHEET);

    let mut plans: Vec<SheetPlan<'_>> = partition
        .teams()
        .filter(|bucket| !bucket.rows.is_empty())
        .map(|bucket| SheetPlan {
            name: namer.unique(&sheet_name_for(&bucket.team)),
            rows: &bucket.rows,
        })
        .collect();

    if !partition.unmapped().is_empty() {
        plans.push(SheetPlan {
            name: UNMAPPED_SHEET.to_string(),
            rows: partition.unmapped(),
        });
    }

    plans
}

/// 振り分け結果からブックを組み立てる
pub fn build_workbook(header: &Row, partition: &Partition) -> Result<Workbook> {
    let mut workbook = Workbook::new();

    for plan in plan_sheets(partition) {
        let worksheet = workbook.add_worksheet();
        worksheet
            .set_name(&plan.name)
            .map_err(|e| Error::Excel(format!("シート名設定エラー ({}): {}", plan.name, e)))?;

        write_row(worksheet, 0, header)?;
        for (i, row) in plan.rows.iter().enumerate() {
            let row_num = RowNum::try_from(i + 1)
                .map_err(|_| Error::Excel(format!("行数が上限を超えています: {}", plan.name)))?;
            write_row(worksheet, row_num, row)?;
        }
    }

    Ok(workbook)
}

/// 振り分け結果のExcelをバッファに生成
pub fn generate_workbook_buffer(header: &Row, partition: &Partition) -> Result<Vec<u8>> {
    let mut workbook = build_workbook(header, partition)?;
    workbook
        .save_to_buffer()
        .map_err(|e| Error::Excel(format!("Excel保存エラー: {}", e)))
}

fn write_row(worksheet: &mut Worksheet, row_num: RowNum, row: &Row) -> Result<()> {
    for (col, cell) in row.iter().enumerate() {
        let col = ColNum::try_from(col)
            .map_err(|_| Error::Excel(format!("列数が上限を超えています: {}", row.len())))?;
        write_cell(worksheet, row_num, col, cell)?;
    }
    Ok(())
}

fn write_cell(worksheet: &mut Worksheet, row: RowNum, col: ColNum, cell: &Cell) -> Result<()> {
    let written = match cell {
        Cell::Empty => return Ok(()),
        Cell::String(s) | Cell::Error(s) => worksheet.write_string(row, col, s),
        Cell::Number(n) | Cell::DateTime(n) => worksheet.write_number(row, col, *n),
        Cell::Bool(b) => worksheet.write_boolean(row, col, *b),
    };

    written
        .map(|_| ())
        .map_err(|e| Error::Excel(format!("セル書き込みエラー (行{}, 列{}): {}", row + 1, col + 1, e)))
}
