use serde::Deserialize;

#[derive(Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Changes {
    #[serde(rename = "numRowsInserted", default)]
    pub rows_inserted: usize,
    #[serde(rename = "numRowsDeleted", default)]
    pub rows_deleted: usize,
    #[serde(rename = "numRowsUpdated", default)]
    pub rows_updated: usize,
    #[serde(rename = "numDmlDuplicates", default)]
    pub duplicates: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataManipulationResult {
    pub message: String,
    pub stats: Changes,
}
