use crate::value::Value;
use std::collections::BTreeMap;

/// An ordered sequence of scalar values, one per target column — the
/// transform's output. Column order matches the schema spec's column list.
#[derive(Debug, Clone, Default)]
pub struct RowTuple(pub Vec<Value>);

impl RowTuple {
    pub fn new(values: Vec<Value>) -> Self {
        RowTuple(values)
    }

    /// Zips this row's values with a column list into a column→value map,
    /// the shape the exception shield and `upsert!` expect (§4.2).
    pub fn zip_columns(&self, columns: &[String]) -> BTreeMap<String, Value> {
        columns
            .iter()
            .cloned()
            .zip(self.0.iter().cloned())
            .collect()
    }
}
