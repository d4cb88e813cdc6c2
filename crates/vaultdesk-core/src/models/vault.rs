use serde::{Deserialize, Serialize};

/// A vault as returned by the listing endpoint.
///
/// Vaults are read-only on the client: they are displayed in the order the
/// server sends them and never created, edited or re-sorted locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vault {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl Vault {
    /// Description for display, empty when the server sent none
    pub fn description_display(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }
}
