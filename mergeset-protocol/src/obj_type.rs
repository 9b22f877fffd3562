use serde::{Deserialize, Serialize};
use strum::Display;

/// The kind of container a `make*` op allocates.
#[derive(Eq, PartialEq, Debug, Hash, Clone, Copy, Serialize, Deserialize, Display)]
#[serde(rename_all = "camelCase")]
pub enum ObjType {
    Map,
    List,
    Text,
    Table,
}

impl ObjType {
    pub fn is_sequence(self) -> bool {
        matches!(self, ObjType::List | ObjType::Text)
    }
}
