//! ルート → チームの逆引きインデックス
//!
//! 処理のたびに `RulesMap` から作り直す（差分更新はしない）。
//! 同じルートが複数チームに登録されている場合は、後に出てきたチームが勝つ。

use crate::rules::RulesMap;
use std::collections::HashMap;

/// ルート文字列の正規化（前後の空白除去 + 小文字化）
pub fn normalize_route(route: &str) -> String {
    route.trim().to_lowercase()
}

/// ルートの重複登録（後勝ちで上書きされたもの）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteCollision {
    /// 正規化後のルート
    pub route: String,
    /// 上書きされたチーム
    pub previous: String,
    /// 採用されたチーム
    pub winner: String,
}

#[derive(Debug, Clone, Default)]
pub struct RouteIndex {
    route_to_team: HashMap<String, String>,
    collisions: Vec<RouteCollision>,
}

impl RouteIndex {
    pub fn build(rules: &RulesMap) -> Self {
        let mut route_to_team: HashMap<String, String> = HashMap::new();
        let mut collisions = Vec::new();

        for entry in rules.iter() {
            for route in &entry.routes {
                let key = normalize_route(route);
                if let Some(previous) = route_to_team.insert(key.clone(), entry.team.clone()) {
                    if previous != entry.team {
                        collisions.push(RouteCollision {
                            route: key,
                            previous,
                            winner: entry.team.clone(),
                        });
                    }
                }
            }
        }

        Self {
            route_to_team,
            collisions,
        }
    }

    /// 生のルート値からチームを引く
    pub fn lookup(&self, route: &str) -> Option<&str> {
        self.route_to_team
            .get(&normalize_route(route))
            .map(String::as_str)
    }

    pub fn collisions(&self) -> &[RouteCollision] {
        &self.collisions
    }

    pub fn len(&self) -> usize {
        self.route_to_team.len()
    }

    pub fn is_empty(&self) -> bool {
        self.route_to_team.is_empty()
    }
}
