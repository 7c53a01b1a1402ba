use std::collections::{BTreeMap, HashMap};

use atlas_layout::{GroupId, Grouping, Item, Point};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Columnar store contents. Column `i` of every per-item vector belongs to
/// `ids[i]`; rows keep insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub ids: Vec<String>,
    pub embeddings: Vec<Vec<f32>>,
    pub hints: Vec<Point>,

    /// Group per item; `None` for items added after the last grouping.
    pub assignment: Vec<Option<GroupId>>,

    pub names: BTreeMap<GroupId, String>,

    pub updated_at: Option<DateTime<Utc>>,
}

impl Snapshot {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Checks that every column has one entry per id.
    pub fn check(&self) -> Result<(), StoreError> {
        let expected = self.ids.len();
        for (column, got) in [
            ("embeddings", self.embeddings.len()),
            ("hints", self.hints.len()),
            ("assignment", self.assignment.len()),
        ] {
            if got != expected {
                return Err(StoreError::LengthMismatch {
                    column,
                    expected,
                    got,
                });
            }
        }
        Ok(())
    }

    fn index(&self) -> HashMap<&str, usize> {
        self.ids
            .iter()
            .enumerate()
            .map(|(i, id)| (id.as_str(), i))
            .collect()
    }

    /// Inserts new items at the end and overwrites known ones in place.
    /// An overwritten item keeps its group assignment.
    pub fn upsert(&mut self, items: &[Item]) {
        let mut rows: HashMap<String, usize> = self
            .index()
            .into_iter()
            .map(|(id, i)| (id.to_string(), i))
            .collect();
        for item in items {
            match rows.get(&item.id) {
                Some(&row) => {
                    self.embeddings[row] = item.embedding.clone();
                    self.hints[row] = item.hint;
                }
                None => {
                    rows.insert(item.id.clone(), self.ids.len());
                    self.ids.push(item.id.clone());
                    self.embeddings.push(item.embedding.clone());
                    self.hints.push(item.hint);
                    self.assignment.push(None);
                }
            }
        }
        self.touch();
    }

    pub fn items(&self) -> Vec<Item> {
        self.ids
            .iter()
            .zip(&self.embeddings)
            .zip(&self.hints)
            .map(|((id, embedding), &hint)| Item::new(id.clone(), embedding.clone(), hint))
            .collect()
    }

    pub fn get(&self, id: &str) -> Option<Item> {
        let row = self.ids.iter().position(|i| i == id)?;
        Some(Item::new(
            id,
            self.embeddings[row].clone(),
            self.hints[row],
        ))
    }

    /// Ids from `ids` with no stored row, in the given order.
    pub fn missing(&self, ids: &[&str]) -> Vec<String> {
        let index = self.index();
        ids.iter()
            .filter(|id| !index.contains_key(**id))
            .map(|id| id.to_string())
            .collect()
    }

    /// Replaces the stored grouping. Items the grouping does not mention
    /// become unassigned.
    pub fn set_grouping(&mut self, grouping: &Grouping) -> Result<(), StoreError> {
        let index = self.index();
        let mut assignment = vec![None; self.ids.len()];
        for (id, &group) in &grouping.assignment {
            let row = *index
                .get(id.as_str())
                .ok_or_else(|| StoreError::UnknownItem(id.clone()))?;
            assignment[row] = Some(group);
        }
        self.assignment = assignment;
        self.names = grouping.names.clone();
        self.touch();
        Ok(())
    }

    /// The stored grouping over assigned items, or `None` if no grouping
    /// was ever stored.
    pub fn grouping(&self) -> Option<Grouping> {
        if self.names.is_empty() {
            return None;
        }
        let assignment = self
            .ids
            .iter()
            .zip(&self.assignment)
            .filter_map(|(id, group)| group.map(|g| (id.clone(), g)))
            .collect();
        Some(Grouping {
            assignment,
            names: self.names.clone(),
        })
    }

    pub fn clear(&mut self) {
        *self = Snapshot::default();
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Some(Utc::now());
    }
}
