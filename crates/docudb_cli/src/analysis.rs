//! Record-level analysis shared by the store commands.

use docudb_core::ID_KEY;
use serde_json::Value;
use std::collections::{HashMap, HashSet};

/// What a single stored record turned out to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordStatus {
    /// A JSON object carrying a string `_id`.
    Valid {
        /// The record's id.
        id: String,
    },
    /// Valid JSON, but not an object.
    NotAnObject,
    /// A JSON object without a string `_id`.
    MissingId,
    /// Not valid JSON.
    Unparseable {
        /// Parser message.
        error: String,
    },
}

impl RecordStatus {
    /// Classifies one decoded record text.
    pub fn of(record: &str) -> Self {
        match serde_json::from_str::<Value>(record) {
            Ok(Value::Object(map)) => match map.get(ID_KEY) {
                Some(Value::String(id)) => Self::Valid { id: id.clone() },
                _ => Self::MissingId,
            },
            Ok(_) => Self::NotAnObject,
            Err(e) => Self::Unparseable {
                error: e.to_string(),
            },
        }
    }

    /// Returns the id of a valid record.
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Valid { id } => Some(id),
            _ => None,
        }
    }

    /// Describes why a record is not valid.
    pub fn problem(&self) -> Option<String> {
        match self {
            Self::Valid { .. } => None,
            Self::NotAnObject => Some("not a JSON object".to_string()),
            Self::MissingId => Some(format!("no string `{ID_KEY}` field")),
            Self::Unparseable { error } => Some(format!("invalid JSON: {error}")),
        }
    }
}

/// Statuses of every record in a store, in file order.
#[derive(Debug, Default)]
pub struct Analysis {
    statuses: Vec<RecordStatus>,
}

impl Analysis {
    /// Analyzes decoded record texts.
    pub fn of<S: AsRef<str>>(records: &[S]) -> Self {
        Self {
            statuses: records
                .iter()
                .map(|r| RecordStatus::of(r.as_ref()))
                .collect(),
        }
    }

    /// Number of records analyzed.
    pub fn total(&self) -> usize {
        self.statuses.len()
    }

    /// Number of valid records.
    pub fn valid(&self) -> usize {
        self.ids().count()
    }

    /// Invalid records with their zero-based position.
    pub fn invalid(&self) -> impl Iterator<Item = (usize, String)> + '_ {
        self.statuses
            .iter()
            .enumerate()
            .filter_map(|(index, status)| status.problem().map(|p| (index, p)))
    }

    /// Number of distinct ids among valid records.
    pub fn distinct_ids(&self) -> usize {
        self.ids().collect::<HashSet<_>>().len()
    }

    /// Ids stored more than once, with their counts, in order of first
    /// appearance.
    pub fn duplicate_ids(&self) -> Vec<(&str, usize)> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        let mut order = Vec::new();
        for id in self.ids() {
            let count = counts.entry(id).or_insert(0);
            if *count == 0 {
                order.push(id);
            }
            *count += 1;
        }

        order
            .into_iter()
            .filter_map(|id| {
                let count = counts[id];
                (count > 1).then_some((id, count))
            })
            .collect()
    }

    /// Positions of the records a compaction keeps: valid records, last
    /// copy of each id, in file order.
    pub fn survivors(&self) -> Vec<usize> {
        let mut seen = HashSet::new();
        let mut kept: Vec<usize> = self
            .statuses
            .iter()
            .enumerate()
            .rev()
            .filter_map(|(index, status)| {
                let id = status.id()?;
                seen.insert(id).then_some(index)
            })
            .collect();
        kept.reverse();
        kept
    }

    fn ids(&self) -> impl Iterator<Item = &str> {
        self.statuses.iter().filter_map(RecordStatus::id)
    }
}
