use thiserror::Error;

#[derive(Error, Debug)]
pub enum SplitError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("ルール検証エラー: {0}")]
    Validation(String),

    #[error("入力形式エラー: {0}")]
    Format(String),

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error("Excel生成エラー: {0}")]
    ExcelGeneration(String),
}

impl From<tunggakan_common::Error> for SplitError {
    fn from(err: tunggakan_common::Error) -> Self {
        use tunggakan_common::Error as CommonError;

        match err {
            CommonError::Io(e) => SplitError::Io(e),
            CommonError::Json(e) => SplitError::JsonParse(e),
            CommonError::Validation(msg) => SplitError::Validation(msg),
            CommonError::Format(msg) => SplitError::Format(msg),
            CommonError::Excel(msg) => SplitError::ExcelGeneration(msg),
        }
    }
}

pub type Result<T> = std::result::Result<T, SplitError>;
