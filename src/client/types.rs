// Decoded daemon records

use serde::{Deserialize, Serialize};

/// One record of an `add` response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AddResult {
    /// Empty on progress records
    #[serde(default)]
    pub hash: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub size: String,
    /// Bytes processed so far; only set on progress records
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bytes: Option<u64>,
}

impl AddResult {
    pub fn is_progress(&self) -> bool {
        self.hash.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListLink {
    #[serde(default)]
    pub hash: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default, rename = "Type")]
    pub kind: i32,
}

/// An `ls` object: its own link fields plus its children
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListObject {
    #[serde(rename = "Links", default)]
    pub links: Vec<ListLink>,
    #[serde(flatten)]
    pub link: ListLink,
}
