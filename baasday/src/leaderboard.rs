//! Score leaderboards.
//!
//! Every entry carries an integer `_score`; higher scores rank first. To rank
//! fractional scores, scale them (`x1000` keeps three decimals). To rank
//! lower scores first, negate them.
//!
//! The service computes two positions for each fetched entry:
//!
//! - `_rank`: entries with the same score share a rank (1, 2, 2, 4)
//! - `_order`: a strict position where the earlier entry wins a tie (1, 2, 3, 4)
//!
//! Listing a leaderboard always sorts by score. Only `skip` and `limit` of the
//! query are honored.

use baasday_core::{
    client::ApiClient,
    document::{Deletable, Document, Identifiable, Resource, Updatable},
    error::BaasdayResult,
    list::ListResult,
    query::Query,
    transport::Transport,
    value::{FieldAccess, Value, ValueMap},
};

pub const LEADERBOARDS_PATH: &str = "leaderboards";

pub const SCORE_FIELD: &str = "_score";
pub const RANK_FIELD: &str = "_rank";
pub const ORDER_FIELD: &str = "_order";

/// An entry of a named leaderboard.
#[derive(Debug, Clone, PartialEq)]
pub struct LeaderboardEntry {
    leaderboard_name: String,
    document: Document,
}

impl LeaderboardEntry {
    pub fn new(leaderboard_name: impl Into<String>, values: ValueMap) -> Self {
        Self {
            leaderboard_name: leaderboard_name.into(),
            document: Document::new(values),
        }
    }

    /// Adds an entry to `leaderboard_name`. `values` must hold an integer `_score`.
    pub fn create<T: Transport>(
        client: &ApiClient<T>,
        leaderboard_name: &str,
        values: &ValueMap,
    ) -> BaasdayResult<Self> {
        client.create(&leaderboard_path(leaderboard_name), values, factory(leaderboard_name))
    }

    /// Adds an entry with `score` and the other fields of `values`.
    ///
    /// `score` wins over any `_score` already present in `values`.
    pub fn create_with_score<T: Transport>(
        client: &ApiClient<T>,
        leaderboard_name: &str,
        score: i64,
        values: &ValueMap,
    ) -> BaasdayResult<Self> {
        let mut values = values.clone();
        values.insert(SCORE_FIELD.to_string(), Value::from(score));
        Self::create(client, leaderboard_name, &values)
    }

    pub fn fetch<T: Transport>(client: &ApiClient<T>, leaderboard_name: &str, id: &str) -> BaasdayResult<Self> {
        let path = format!("{}/{id}", leaderboard_path(leaderboard_name));
        client.fetch(&path, factory(leaderboard_name))
    }

    /// Fetches one page of `leaderboard_name`, highest score first.
    ///
    /// The filter, order and wait of `query` are ignored by the service.
    pub fn fetch_all<T: Transport>(
        client: &ApiClient<T>,
        leaderboard_name: &str,
        query: &Query,
    ) -> BaasdayResult<ListResult<Self>> {
        client.fetch_all(&leaderboard_path(leaderboard_name), query, factory(leaderboard_name))
    }

    pub fn leaderboard_name(&self) -> &str {
        &self.leaderboard_name
    }

    /// Returns `_score`, or `0` when absent.
    pub fn score(&self) -> BaasdayResult<i64> {
        self.get_long(SCORE_FIELD)
    }

    /// Returns `_rank`, or `0` when the entry has not been ranked.
    pub fn rank(&self) -> BaasdayResult<i64> {
        self.get_long(RANK_FIELD)
    }

    /// Returns `_order`, or `0` when the entry has not been ranked.
    pub fn order(&self) -> BaasdayResult<i64> {
        self.get_long(ORDER_FIELD)
    }

    pub fn into_document(self) -> Document {
        self.document
    }
}

fn leaderboard_path(leaderboard_name: &str) -> String {
    format!("{LEADERBOARDS_PATH}/{leaderboard_name}")
}

fn factory(leaderboard_name: &str) -> impl Fn(ValueMap) -> BaasdayResult<LeaderboardEntry> + '_ {
    move |values| Ok(LeaderboardEntry::new(leaderboard_name, values))
}

impl FieldAccess for LeaderboardEntry {
    fn values(&self) -> &ValueMap {
        self.document.values()
    }
}

impl Identifiable for LeaderboardEntry {
    fn document(&self) -> &Document {
        &self.document
    }
}

impl Resource for LeaderboardEntry {
    fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    fn resource_path(&self) -> BaasdayResult<String> {
        self.document.path_under(&leaderboard_path(&self.leaderboard_name))
    }
}

impl Updatable for LeaderboardEntry {}

impl Deletable for LeaderboardEntry {}

#[cfg(test)]
mod tests {
    use super::*;
    use baasday_core::{error::ErrorKind, value_map};

    #[test]
    fn positions_default_to_zero() {
        let entry = LeaderboardEntry::new("weekly", ValueMap::new());

        assert_eq!(entry.score().unwrap(), 0);
        assert_eq!(entry.rank().unwrap(), 0);
        assert_eq!(entry.order().unwrap(), 0);
    }

    #[test]
    fn positions_are_read_from_reserved_fields() {
        let entry = LeaderboardEntry::new(
            "weekly",
            value_map! { "_id" => "e1", "_score" => 120, "_rank" => 2, "_order" => 3 },
        );

        assert_eq!(entry.leaderboard_name(), "weekly");
        assert_eq!(entry.score().unwrap(), 120);
        assert_eq!(entry.rank().unwrap(), 2);
        assert_eq!(entry.order().unwrap(), 3);
        assert_eq!(entry.resource_path().unwrap(), "leaderboards/weekly/e1");
    }

    #[test]
    fn non_numeric_score_is_a_mismatch() {
        let entry = LeaderboardEntry::new("weekly", value_map! { "_score" => "high" });

        assert_eq!(entry.score().unwrap_err().kind(), ErrorKind::TypeMismatch);
    }
}
