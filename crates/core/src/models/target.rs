use serde::{Deserialize, Serialize};

/// A remote host a batch command is dispatched to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct BatchTarget {
    /// Opaque remote identifier, e.g. an instance id.
    pub id: String,
    pub display_name: String,
    /// Grouping key for routing work to the right regional client.
    pub location_hint: String,
}

impl BatchTarget {
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        location_hint: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            location_hint: location_hint.into(),
        }
    }
}

impl std::fmt::Display for BatchTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.display_name, self.id)
    }
}
