//! Source models.

/// Whether a tree entry is a folder or a plain file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    Folder,
    File,
}

/// One node of an enumerated documentation tree.
///
/// Folders carry their children (sorted by name); files never have children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub name: String,
    pub kind: EntryKind,
    pub children: Vec<TreeEntry>,
}
impl TreeEntry {
    pub fn folder(name: impl Into<String>, children: Vec<TreeEntry>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::Folder,
            children,
        }
    }

    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::File,
            children: Vec::new(),
        }
    }

    pub fn is_folder(&self) -> bool {
        self.kind == EntryKind::Folder
    }

    /// Look up a direct child by name.
    pub fn child(&self, name: &str) -> Option<&TreeEntry> {
        self.children.iter().find(|c| c.name == name)
    }
}
