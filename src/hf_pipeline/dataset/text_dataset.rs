//! In-memory dataset split

use serde_json::{Map, Value};

/// One row: column name to value
pub type Record = Map<String, Value>;

/// An ordered sequence of records from one split
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextDataset {
    split: String,
    records: Vec<Record>,
}

impl TextDataset {
    #[must_use]
    pub fn new(split: impl Into<String>, records: Vec<Record>) -> Self {
        Self {
            split: split.into(),
            records,
        }
    }

    /// Build a single-column dataset from plain texts
    #[must_use]
    pub fn from_texts<S: Into<String>>(
        split: impl Into<String>,
        column: &str,
        texts: impl IntoIterator<Item = S>,
    ) -> Self {
        let records = texts
            .into_iter()
            .map(|text| {
                let mut record = Record::new();
                record.insert(column.to_string(), Value::String(text.into()));
                record
            })
            .collect();
        Self::new(split, records)
    }

    /// Split name this dataset was loaded from
    #[must_use]
    pub fn split(&self) -> &str {
        &self.split
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Record> {
        self.records.get(index)
    }

    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    /// Column names in first-seen order
    #[must_use]
    pub fn column_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for record in &self.records {
            for key in record.keys() {
                if !names.iter().any(|n| n == key) {
                    names.push(key.clone());
                }
            }
        }
        names
    }

    /// Values of one column; records without it yield `Value::Null`
    #[must_use]
    pub fn column(&self, name: &str) -> Vec<&Value> {
        const NULL: Value = Value::Null;
        self.records
            .iter()
            .map(|r| r.get(name).unwrap_or(&NULL))
            .collect()
    }

    #[must_use]
    pub fn into_records(self) -> Vec<Record> {
        self.records
    }
}

impl<'a> IntoIterator for &'a TextDataset {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
