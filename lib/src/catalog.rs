use crate::error::{RequestError, Result};
use crate::http::{HttpTransport, Request};
use crate::model::{Folder, NoteSummary};
use crate::session::Session;

pub const PAGE_SIZE: usize = 100;
pub const FOLDER_LIST_PATH: &str = "/ks/category/all";
pub const NOTE_LIST_PATH: &str = "/ks/note/list/category";

/// Fetches every folder of the workspace.
///
/// Listing failures are logged and yield an empty list, only a missing
/// session is reported as an error.
pub fn list_folders(transport: &dyn HttpTransport, session: &Session) -> Result<Vec<Folder>> {
    let session = session.ensure_authenticated()?;
    info!("Getting folders...");

    let request = session.authorize(Request::get(&session.workspace_url(FOLDER_LIST_PATH)));
    let folders = transport.send(&request)
        .and_then(|response| response.error_for_status())
        .and_then(|response| response.result::<Vec<Folder>>());

    match folders {
        Ok(folders) if !folders.is_empty() => {
            info!("Found {} folder(s)", folders.len());
            folders.iter()
                .filter(|folder| !folder.is_root())
                .for_each(|folder| info!(" - {}", folder));
            Ok(folders)
        }
        Ok(_) => {
            info!("No folders found.");
            Ok(Vec::new())
        }
        Err(e) => {
            warn!("Could not list folders: {}", e);
            Ok(Vec::new())
        }
    }
}

/// Collects all notes of `folder`, requesting pages of [`PAGE_SIZE`] entries
/// until an empty or short page comes back or a request fails.
///
/// Pages are not deduplicated, if the remote listing changes while paging
/// the result may skip or repeat entries.
pub fn list_notes(transport: &dyn HttpTransport, session: &Session, folder: &Folder) -> Result<Vec<NoteSummary>> {
    let session = session.ensure_authenticated()?;
    let mut notes: Vec<NoteSummary> = Vec::new();

    loop {
        let page = match fetch_page(transport, session, folder, notes.len()) {
            Ok(page) => page,
            Err(e) => {
                warn!("Could not load notes from {} at offset {}: {}", folder, notes.len(), e);
                break;
            }
        };

        let page_len = page.len();
        debug!("Page at offset {} of {} returned {} note(s)", notes.len(), folder, page_len);
        notes.extend(page);

        if page_len < PAGE_SIZE {
            break;
        }
    }

    Ok(notes)
}

fn fetch_page(transport: &dyn HttpTransport, session: &Session, folder: &Folder, start: usize)
    -> std::result::Result<Vec<NoteSummary>, RequestError>
{
    let request = Request::get(&session.workspace_url(NOTE_LIST_PATH))
        .with_query("category", folder.path())
        .with_query("start", &start.to_string())
        .with_query("count", &PAGE_SIZE.to_string())
        .with_query("orderBy", "created")
        .with_query("ascending", "desc");

    transport.send(&session.authorize(request))
        .and_then(|response| response.error_for_status())
        .and_then(|response| response.result())
}
