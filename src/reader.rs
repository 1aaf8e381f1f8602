//! 入力ブック（xlsx）の読み込み

use crate::error::{Result, SplitError};
use calamine::{open_workbook, Data, Range, Reader, Xlsx, XlsxError};
use std::path::Path;
use tunggakan_common::{Cell, InputTable, Row};

/// 振り分け対象のシート名
pub const INPUT_SHEET: &str = "DATATUNGGAKAN";

/// DATATUNGGAKAN シートを読み込んでテーブルにする
pub fn read_input_table(path: &Path) -> Result<InputTable> {
    let mut workbook: Xlsx<_> = open_workbook(path).map_err(|e| open_error(path, e))?;

    if !workbook.sheet_names().iter().any(|name| name == INPUT_SHEET) {
        return Err(SplitError::Format(format!(
            "Sheet \"{}\" not found in the uploaded file",
            INPUT_SHEET
        )));
    }

    let range = workbook
        .worksheet_range(INPUT_SHEET)
        .map_err(|e| SplitError::Format(format!("{} シートを読み込めません: {}", INPUT_SHEET, e)))?;

    Ok(InputTable::from_rows(range_rows(&range))?)
}

/// シートの使用範囲を行の列に変換する
///
/// calamine の範囲は最初の値があるセルから始まるため、先頭の空列を補い、
/// E列が常にインデックス4になるようにする。
pub fn range_rows(range: &Range<Data>) -> Vec<Row> {
    let leading_cols = range.start().map(|(_, col)| col as usize).unwrap_or(0);

    range
        .rows()
        .map(|cells| {
            let mut row: Row = Vec::with_capacity(leading_cols + cells.len());
            row.resize(leading_cols, Cell::Empty);
            row.extend(cells.iter().map(data_to_cell));
            row
        })
        .collect()
}

pub fn data_to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) => Cell::String(s.clone()),
        Data::Float(n) => Cell::Number(*n),
        Data::Int(n) => Cell::Number(*n as f64),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) => Cell::DateTime(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::String(s.clone()),
        Data::Error(e) => Cell::Error(e.to_string()),
    }
}

fn open_error(path: &Path, err: XlsxError) -> SplitError {
    match err {
        XlsxError::Io(e) => SplitError::Io(e),
        other => SplitError::Format(format!(
            "Excelファイルとして開けません ({}): {}",
            path.display(),
            other
        )),
    }
}
