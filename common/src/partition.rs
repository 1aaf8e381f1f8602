//! データ行のチーム振り分け

use crate::route_index::RouteIndex;
use crate::types::{Row, CLASSIFICATION_COLUMN};
use std::collections::HashMap;

/// チームごとの行バケット
#[derive(Debug, Clone, PartialEq)]
pub struct TeamBucket {
    pub team: String,
    pub rows: Vec<Row>,
}

/// 振り分け結果
///
/// チームは最初に行が振り分けられた順、行は元の順序を保持する。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Partition {
    buckets: Vec<TeamBucket>,
    unmapped: Vec<Row>,
}

impl Partition {
    pub fn teams(&self) -> impl Iterator<Item = &TeamBucket> {
        self.buckets.iter()
    }

    pub fn team_names(&self) -> impl Iterator<Item = &str> {
        self.buckets.iter().map(|b| b.team.as_str())
    }

    pub fn rows_of(&self, team: &str) -> Option<&[Row]> {
        self.buckets
            .iter()
            .find(|b| b.team == team)
            .map(|b| b.rows.as_slice())
    }

    pub fn unmapped(&self) -> &[Row] {
        &self.unmapped
    }

    /// 振り分け対象になった行数（チーム + UNMAPPED）
    pub fn classified_row_count(&self) -> usize {
        self.buckets.iter().map(|b| b.rows.len()).sum::<usize>() + self.unmapped.len()
    }
}

/// 行のルート値（E列）を取り出す。空・欠損なら `None`
///
/// 数値の `0` や `false` は空扱いせず、`"0"` / `"false"` として照合する。
pub fn route_value(row: &Row) -> Option<String> {
    row.get(CLASSIFICATION_COLUMN)
        .filter(|cell| !cell.is_empty())
        .map(|cell| cell.to_text())
}

/// データ行をチームごとに振り分ける
///
/// 列数0の行はどこにも入れない。
pub fn classify<'a, I>(rows: I, index: &RouteIndex) -> Partition
where
    I: IntoIterator<Item = &'a Row>,
{
    let mut partition = Partition::default();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for row in rows {
        if row.is_empty() {
            continue;
        }

        let team = route_value(row).and_then(|route| index.lookup(&route).map(str::to_string));

        match team {
            Some(team) => {
                let pos = *positions.entry(team.clone()).or_insert_with(|| {
                    partition.buckets.push(TeamBucket {
                        team,
                        rows: Vec::new(),
                    });
                    partition.buckets.len() - 1
                });
                partition.buckets[pos].rows.push(row.clone());
            }
            None => partition.unmapped.push(row.clone()),
        }
    }

    partition
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RulesMap;
    use crate::types::Cell;

    fn row(values: &[&str]) -> Row {
        values.iter().map(|v| Cell::from(*v)).collect()
    }

    fn ops_billing() -> RouteIndex {
        let rules = RulesMap::from_json(r#"{"Ops": ["r1"], "Billing": ["r2"]}"#).unwrap();
        RouteIndex::build(&rules)
    }

    #[test]
    fn test_classify_basic() {
        let rows = vec![
            row(&["x", "x", "x", "x", "R1"]),
            row(&["x", "x", "x", "x", "r2"]),
            row(&["x", "x", "x", "x", ""]),
        ];

        let partition = classify(&rows, &ops_billing());

        assert_eq!(partition.rows_of("Ops"), Some(&rows[0..1]));
        assert_eq!(partition.rows_of("Billing"), Some(&rows[1..2]));
        assert_eq!(partition.unmapped(), &rows[2..3]);
    }

    #[test]
    fn test_team_order_is_first_seen() {
        let rows = vec![
            row(&["1", "", "", "", "r2"]),
            row(&["2", "", "", "", "r1"]),
            row(&["3", "", "", "", "R2"]),
        ];

        let partition = classify(&rows, &ops_billing());

        let names: Vec<&str> = partition.team_names().collect();
        assert_eq!(names, vec!["Billing", "Ops"]);
        let billing = partition.rows_of("Billing").unwrap();
        assert_eq!(billing[0][0], Cell::from("1"));
        assert_eq!(billing[1][0], Cell::from("3"));
    }

    #[test]
    fn test_empty_rows_are_skipped() {
        let rows = vec![Vec::new(), row(&["x", "x", "x", "x", "r1"]), Vec::new()];

        let partition = classify(&rows, &ops_billing());

        assert_eq!(partition.classified_row_count(), 1);
        assert!(partition.unmapped().is_empty());
    }

    #[test]
    fn test_short_rows_are_unmapped() {
        let rows = vec![row(&["x", "x"]), row(&["x", "x", "x", "x", "zz"])];

        let partition = classify(&rows, &ops_billing());

        assert_eq!(partition.unmapped().len(), 2);
        assert_eq!(partition.teams().count(), 0);
    }

    #[test]
    fn test_numeric_route_matches_text_rule() {
        let rules = RulesMap::from_json(r#"{"Numeric": ["105"]}"#).unwrap();
        let index = RouteIndex::build(&rules);
        let rows = vec![vec![
            Cell::Empty,
            Cell::Empty,
            Cell::Empty,
            Cell::Empty,
            Cell::Number(105.0),
        ]];

        let partition = classify(&rows, &index);
        assert_eq!(partition.rows_of("Numeric").map(<[Row]>::len), Some(1));
    }

    #[test]
    fn test_zero_and_false_are_route_values() {
        let rules = RulesMap::from_json(r#"{"Zero": ["0"], "Off": ["FALSE"]}"#).unwrap();
        let index = RouteIndex::build(&rules);
        let with_route = |cell: Cell| vec![Cell::Empty, Cell::Empty, Cell::Empty, Cell::Empty, cell];
        let rows = vec![
            with_route(Cell::Number(0.0)),
            with_route(Cell::Bool(false)),
            with_route(Cell::Empty),
        ];

        assert_eq!(route_value(&rows[0]), Some("0".to_string()));
        assert_eq!(route_value(&rows[1]), Some("false".to_string()));

        let partition = classify(&rows, &index);
        assert_eq!(partition.rows_of("Zero").map(<[Row]>::len), Some(1));
        assert_eq!(partition.rows_of("Off").map(<[Row]>::len), Some(1));
        assert_eq!(partition.unmapped(), &rows[2..3]);
    }

    #[test]
    fn test_counts_add_up() {
        let rows = vec![
            row(&["a", "", "", "", "r1"]),
            Vec::new(),
            row(&["b", "", "", "", "nope"]),
            row(&["c"]),
            row(&["d", "", "", "", " R2 "]),
        ];

        let partition = classify(&rows, &ops_billing());
        let non_empty = rows.iter().filter(|r| !r.is_empty()).count();

        assert_eq!(partition.classified_row_count(), non_empty);
        assert_eq!(partition.unmapped().len(), 2);
    }

    #[test]
    fn test_route_value() {
        assert_eq!(route_value(&row(&["", "", "", "", "R1"])), Some("R1".to_string()));
        assert_eq!(route_value(&row(&["", "", "", ""])), None);
        assert_eq!(route_value(&row(&["", "", "", "", ""])), None);
    }
}
