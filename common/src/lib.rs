//! Tunggakan Split Common Library
//!
//! 延滞データの振り分けエンジン（ファイル入出力を持たない純粋なロジック）

pub mod types;
pub mod error;
pub mod rules;
pub mod route_index;
pub mod partition;
pub mod export;

pub use types::{Cell, InputTable, ProcessingResult, Row, Summary, TeamCounts, CLASSIFICATION_COLUMN};
pub use error::{Error, Result};
pub use rules::{RulesMap, TeamRoutes};
pub use route_index::{normalize_route, RouteCollision, RouteIndex};
pub use partition::{classify, Partition, TeamBucket};
