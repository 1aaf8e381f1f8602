//! DATATUNGGAKAN シートのチーム別振り分け
//!
//! - `rules_store`: 振り分けルールの保存・読み込み
//! - `processor`: 入力ブックの振り分けと出力
//! - 振り分けロジック本体は `tunggakan_common` にある

pub mod cli;
pub mod config;
pub mod error;
pub mod output;
pub mod processor;
pub mod reader;
pub mod rules_store;

pub use error::{Result, SplitError};
pub use processor::{process, InputFileGuard, Processor};
pub use rules_store::RulesStore;
pub use tunggakan_common::{ProcessingResult, RulesMap};
