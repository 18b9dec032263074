use crate::error::Result;
use crate::http::{HttpTransport, Request};
use crate::session::Session;

pub const NOTE_VIEW_PATH: &str = "/ks/note/view";

/// Fetches the raw body of a note.
///
/// The body is returned verbatim, any transport or status error yields `None`.
pub fn download(transport: &dyn HttpTransport, session: &Session, doc_id: &str) -> Result<Option<String>> {
    let session = session.ensure_authenticated()?;
    let url = format!("{}/{}", session.workspace_url(NOTE_VIEW_PATH), doc_id);

    match transport.send(&session.authorize(Request::get(&url)))
        .and_then(|response| response.error_for_status())
    {
        Ok(response) => Ok(Some(response.text())),
        Err(e) => {
            warn!("Request failed for note {}: {}", doc_id, e);
            Ok(None)
        }
    }
}
