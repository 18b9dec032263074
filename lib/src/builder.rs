use serde::Serialize;

use crate::http::Response;
use crate::model::NoteSummary;

/// Builder for NoteSummary objects, mostly for
/// testing purposes
pub struct NoteSummaryBuilder {
    note: NoteSummary,
}

impl NoteSummaryBuilder {
    pub fn new() -> NoteSummaryBuilder {
        NoteSummaryBuilder {
            note: NoteSummary {
                doc_id: None,
                title: None,
                extra: serde_json::Map::new(),
            }
        }
    }

    pub fn with_doc_id(mut self, doc_id: &str) -> Self {
        self.note.doc_id = Some(doc_id.to_string());
        self
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.note.title = Some(title.to_string());
        self
    }

    pub fn build(self) -> NoteSummary {
        self.note
    }
}

impl Default for NoteSummaryBuilder {
    fn default() -> Self {
        NoteSummaryBuilder::new()
    }
}

/// 200 response wrapping `result` in the service's JSON envelope
pub fn result_response<T: Serialize>(result: &T) -> Response {
    let body = serde_json::json!({ "returnCode": 200, "result": result });
    Response::new(200, body.to_string().into_bytes())
}
