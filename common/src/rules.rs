//! チーム振り分けルール
//!
//! ルールは「チーム名 → ルート一覧」のJSONオブジェクト:
//!
//! ```json
//! { "Ops": ["R1", "R7"], "Billing": ["R2"] }
//! ```
//!
//! 外部から受け取ったJSONは `RulesMap::from_value` で一度だけ検証し、
//! 以降は型付きの値として扱う。チームの並び順はJSONの記述順を保持する。

use crate::error::{Error, Result};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// 1チーム分のルール
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamRoutes {
    pub team: String,
    pub routes: Vec<String>,
}

/// チーム名 → ルート一覧（記述順を保持）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RulesMap {
    teams: Vec<TeamRoutes>,
}

impl RulesMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// JSON値を検証して読み込む
    ///
    /// オブジェクト以外、配列でない値、文字列以外の要素は
    /// `Error::Validation`（チーム名を含む）になる。
    pub fn from_value(value: &Value) -> Result<Self> {
        let object = value.as_object().ok_or_else(|| {
            Error::Validation(format!(
                "rules must be an object of team name to route list, got {}",
                json_type_name(value)
            ))
        })?;

        let mut rules = Self::new();
        for (team, routes) in object {
            let items = routes.as_array().ok_or_else(|| {
                Error::Validation(format!(
                    "Invalid routes for team {}: must be an array, got {}",
                    team,
                    json_type_name(routes)
                ))
            })?;

            let routes = items
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    item.as_str().map(str::to_string).ok_or_else(|| {
                        Error::Validation(format!(
                            "Invalid route #{} for team {}: must be a string, got {}",
                            i + 1,
                            team,
                            json_type_name(item)
                        ))
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            rules.insert(team.clone(), routes);
        }

        Ok(rules)
    }

    /// JSON文字列から読み込み
    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(&value)
    }

    /// 2スペースインデントのJSONに変換
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// チームを追加（既存のチームは位置を保ったまま置き換え）
    pub fn insert(&mut self, team: impl Into<String>, routes: Vec<String>) {
        let team = team.into();
        match self.teams.iter_mut().find(|t| t.team == team) {
            Some(existing) => existing.routes = routes,
            None => self.teams.push(TeamRoutes { team, routes }),
        }
    }

    pub fn routes_of(&self, team: &str) -> Option<&[String]> {
        self.teams
            .iter()
            .find(|t| t.team == team)
            .map(|t| t.routes.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = &TeamRoutes> {
        self.teams.iter()
    }

    pub fn team_names(&self) -> impl Iterator<Item = &str> {
        self.teams.iter().map(|t| t.team.as_str())
    }

    /// 全チームのルート数合計
    pub fn route_count(&self) -> usize {
        self.teams.iter().map(|t| t.routes.len()).sum()
    }

    pub fn len(&self) -> usize {
        self.teams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }
}

impl<T: Into<String>> FromIterator<(T, Vec<String>)> for RulesMap {
    fn from_iter<I: IntoIterator<Item = (T, Vec<String>)>>(iter: I) -> Self {
        let mut rules = Self::new();
        for (team, routes) in iter {
            rules.insert(team, routes);
        }
        rules
    }
}

impl Serialize for RulesMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.teams.len()))?;
        for t in &self.teams {
            map.serialize_entry(&t.team, &t.routes)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for RulesMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        RulesMap::from_value(&value).map_err(serde::de::Error::custom)
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
