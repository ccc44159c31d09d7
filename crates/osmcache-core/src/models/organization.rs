use serde::{Deserialize, Serialize};

/// Back-reference from a section to the group that owns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRef {
    pub id: String,
    pub name: String,
}

/// A scout group and the sections the current user can see in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    pub name: String,
    pub sections: Vec<Section>,
}

impl Group {
    /// Build a group, binding every section's back-reference to it.
    pub fn new(id: impl Into<String>, name: impl Into<String>, sections: Vec<Section>) -> Self {
        let id = id.into();
        let name = name.into();
        let group = GroupRef {
            id: id.clone(),
            name: name.clone(),
        };
        let sections = sections
            .into_iter()
            .map(|s| s.with_group(group.clone()))
            .collect();
        Self { id, name, sections }
    }

    pub fn section(&self, section_id: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.id == section_id)
    }
}

/// A section (e.g. "Scouts", "Cubs") within a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub id: String,
    pub name: String,
    /// OSM's section type code, e.g. `scouts` or `cubs`.
    pub section_type: String,
    pub group: Option<GroupRef>,
}

impl Section {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        section_type: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            section_type: section_type.into(),
            group: None,
        }
    }

    pub fn with_group(self, group: GroupRef) -> Self {
        Self {
            group: Some(group),
            ..self
        }
    }

    pub fn display_name(&self) -> String {
        match &self.group {
            Some(group) => format!("{} - {}", group.name, self.name),
            None => self.name.clone(),
        }
    }
}
