//! Projects and components that groups and addons attach to.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::NodeId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub title: String,
    pub category: String,
    pub parent_id: Option<NodeId>,
    pub created: DateTime<Utc>,
}

impl Node {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: NodeId::generate(),
            title: title.into(),
            category: "project".into(),
            parent_id: None,
            created: Utc::now(),
        }
    }

    /// A component nested under `parent`.
    pub fn component(title: impl Into<String>, parent: &NodeId) -> Self {
        Self {
            category: "other".into(),
            parent_id: Some(parent.clone()),
            ..Self::new(title)
        }
    }

    #[must_use]
    pub fn project_or_component(&self) -> &'static str {
        if self.parent_id.is_some() {
            "component"
        } else {
            "project"
        }
    }

    /// Human readable category name.
    #[must_use]
    pub fn category_display(&self) -> String {
        match self.category.as_str() {
            "" => "Uncategorized".to_string(),
            "project" => "Project".to_string(),
            "hypothesis" => "Hypothesis".to_string(),
            "methods and measures" => "Methods and Measures".to_string(),
            "procedure" => "Procedure".to_string(),
            "instrumentation" => "Instrumentation".to_string(),
            "data" => "Data".to_string(),
            "analysis" => "Analysis".to_string(),
            "communication" => "Communication".to_string(),
            "software" => "Software".to_string(),
            _ => "Other".to_string(),
        }
    }

    /// Site-relative URL of the node's settings page.
    #[must_use]
    pub fn settings_url(&self) -> String {
        format!("/{}/settings/", self.id)
    }

    /// Site-relative URL to view or download a file held by an addon.
    #[must_use]
    pub fn file_url(&self, provider: &str, path: &str) -> String {
        let path = path.trim_start_matches('/');
        format!("/{}/files/{provider}/{path}", self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn components_know_their_parent() {
        let project = Node::new("Project");
        let component = Node::component("Data", &project.id);
        assert_eq!(project.project_or_component(), "project");
        assert_eq!(component.project_or_component(), "component");
        assert_eq!(component.category_display(), "Other");
    }

    #[test]
    fn file_url_strips_leading_slash() {
        let node = Node {
            id: NodeId::new("abc12"),
            ..Node::new("P")
        };
        assert_eq!(node.file_url("dataverse", "/123"), "/abc12/files/dataverse/123");
        assert_eq!(node.settings_url(), "/abc12/settings/");
    }
}
