use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type ColumnId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub id: ColumnId,
    pub title: String,
    pub order: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

impl Column {
    pub fn new(title: String, order: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            title,
            order,
            hash: None,
        }
    }

    pub fn rename(&mut self, title: String) {
        self.title = title;
    }

    /// Name used by external callers; columns are addressed by their title.
    pub fn name(&self) -> &str {
        &self.title
    }

    pub fn matches_name(&self, name: &str) -> bool {
        self.title.to_lowercase() == name.trim().to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_name_ignores_case_and_padding() {
        let column = Column::new("In Progress".to_string(), 1);
        assert!(column.matches_name("in progress"));
        assert!(column.matches_name("  IN PROGRESS "));
        assert!(!column.matches_name("progress"));
    }
}
