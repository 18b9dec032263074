use std::fmt;

pub const UNTITLED: &str = "Untitled";
pub const ROOT_FOLDER: &str = "/";

/// A '/'-delimited category path as reported by the service, e.g. `/Work/Projects/`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Folder(String);

impl Folder {
    pub fn new(path: &str) -> Folder {
        Folder(path.to_string())
    }

    pub fn path(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0 == ROOT_FOLDER
    }

    /// Path segments without empty, `.` and backslash-only parts
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
            .filter(|segment| *segment != ".")
            .filter(|segment| !segment.chars().all(|c| c == '\\'))
    }
}

impl fmt::Display for Folder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One entry of a folder's note listing.
///
/// Only the identifier and title are interpreted, the remaining
/// fields of the listing are carried along untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteSummary {
    #[serde(rename = "docGuid", default, skip_serializing_if = "Option::is_none")]
    pub doc_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl NoteSummary {
    pub fn doc_id(&self) -> Option<&str> {
        self.doc_id.as_deref().filter(|id| !id.is_empty())
    }

    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or(UNTITLED)
    }
}
