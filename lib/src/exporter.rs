use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use colored::Colorize;
use itertools::Itertools;
use regex::Regex;

use crate::catalog::list_notes;
use crate::downloader::download;
use crate::error::NoteError::{DownloadFailed, MissingDocId, WriteFailed};
use crate::error::{NoteError, Result};
use crate::http::HttpTransport;
use crate::model::{Folder, NoteSummary, UNTITLED};
use crate::session::Session;

pub const MAX_NAME_LENGTH: usize = 200;
pub const NOTE_EXTENSION: &str = "html";

lazy_static! {
    static ref FORBIDDEN_CHARACTERS: Regex = Regex::new(r#"[\\/*?:"<>|]"#)
        .expect("forbidden character pattern is valid");
}

/// Turns a single folder segment or note title into a safe file name.
///
/// Forbidden characters become `_`, surrounding dots are stripped and the
/// result is cut to [`MAX_NAME_LENGTH`] characters. Names that end up empty
/// are replaced by `Untitled`.
pub fn sanitize(name: &str) -> String {
    let replaced = FORBIDDEN_CHARACTERS.replace_all(name, "_");
    let truncated: String = replaced.trim_matches('.')
        .chars()
        .take(MAX_NAME_LENGTH)
        .collect();
    // truncation can expose a dot at the new end
    let truncated = truncated.trim_end_matches('.');

    if truncated.is_empty() {
        UNTITLED.to_string()
    } else {
        truncated.to_string()
    }
}

/// Creates the sanitized directory chain for `folder` below `output_root`
pub fn ensure_local_folder(output_root: &Path, folder: &Folder) -> io::Result<PathBuf> {
    let path = folder.segments()
        .map(sanitize)
        .fold(output_root.to_path_buf(), |path, segment| path.join(segment));
    fs::create_dir_all(&path)?;
    Ok(path)
}

/// Creates `<stem>.html`, or `<stem>_1.html`, `<stem>_2.html`, ... if taken
fn create_unique_file(directory: &Path, stem: &str) -> io::Result<(PathBuf, File)> {
    let mut counter = 0;
    loop {
        let file_name = if counter == 0 {
            format!("{}.{}", stem, NOTE_EXTENSION)
        } else {
            format!("{}_{}.{}", stem, counter, NOTE_EXTENSION)
        };
        let path = directory.join(file_name);

        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => counter += 1,
            Err(e) => return Err(e),
        }
    }
}

pub fn try_write_note(directory: &Path, note: &NoteSummary, content: Option<&str>) -> std::result::Result<PathBuf, NoteError> {
    if note.doc_id().is_none() {
        return Err(MissingDocId(note.title().to_string()));
    }
    let content = content
        .filter(|content| !content.is_empty())
        .ok_or_else(|| DownloadFailed(note.title().to_string()))?;

    let (path, mut file) = create_unique_file(directory, &sanitize(note.title()))
        .map_err(|source| WriteFailed { title: note.title().to_string(), source })?;

    file.write_all(content.as_bytes())
        .and_then(|_| file.flush())
        .map_err(|source| {
            let _ = fs::remove_file(&path);
            WriteFailed { title: note.title().to_string(), source }
        })?;

    Ok(path)
}

/// Writes `content` next to the other notes of `directory`.
///
/// Returns false if the note has no id, no content or could not be written.
pub fn write_note(directory: &Path, note: &NoteSummary, content: Option<&str>) -> bool {
    match try_write_note(directory, note, content) {
        Ok(path) => {
            info!(" {} Exported '{}'", "✓".green(), note.title());
            debug!("Saved to {}", path.to_string_lossy());
            true
        }
        Err(e) => {
            warn!(" {} {}, skipping", "✗".red(), e);
            false
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExportReport {
    pub folders: usize,
    pub exported: usize,
    pub failed: usize,
    pub cancelled: bool,
}

/// Walks folders and writes their notes below one output root
pub struct Exporter<'a> {
    transport: &'a dyn HttpTransport,
    output_root: PathBuf,
    interrupted: Arc<AtomicBool>,
}

impl<'a> Exporter<'a> {
    pub fn new(transport: &'a dyn HttpTransport, output_root: &Path) -> Exporter<'a> {
        Exporter {
            transport,
            output_root: output_root.to_path_buf(),
            interrupted: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Stops the export before the next folder or note once `flag` is raised
    pub fn with_interrupt(mut self, flag: Arc<AtomicBool>) -> Self {
        self.interrupted = flag;
        self
    }

    fn is_interrupted(&self) -> bool {
        self.interrupted.load(Ordering::SeqCst)
    }

    pub fn export_all(&self, session: &Session, folders: &[Folder]) -> Result<ExportReport> {
        let session = session.ensure_authenticated()?;
        info!("Exporting notes by folders");

        let mut report = ExportReport::default();
        for folder in folders.iter().filter(|folder| !folder.is_root()).sorted() {
            if self.is_interrupted() {
                report.cancelled = true;
                break;
            }
            self.export_folder(session, folder, &mut report)?;
        }
        Ok(report)
    }

    pub fn export_folder(&self, session: &Session, folder: &Folder, report: &mut ExportReport) -> Result<()> {
        info!("Processing folder: {}", folder);
        report.folders += 1;

        let directory = match ensure_local_folder(&self.output_root, folder) {
            Ok(directory) => directory,
            Err(e) => {
                warn!(" {} Could not create local folder for {}: {}", "✗".red(), folder, e);
                return Ok(());
            }
        };

        let notes = list_notes(self.transport, session, folder)?;
        if notes.is_empty() {
            info!(" No notes in this folder");
            return Ok(());
        }

        info!(" Found {} note(s), exporting...", notes.len());
        for note in &notes {
            if self.is_interrupted() {
                report.cancelled = true;
                return Ok(());
            }
            if self.export_note(session, &directory, note)? {
                report.exported += 1;
            } else {
                report.failed += 1;
            }
        }
        Ok(())
    }

    pub fn export_note(&self, session: &Session, directory: &Path, note: &NoteSummary) -> Result<bool> {
        let content = match note.doc_id() {
            Some(doc_id) => download(self.transport, session, doc_id)?,
            None => None,
        };
        Ok(write_note(directory, note, content.as_deref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use crate::builder::{result_response, NoteSummaryBuilder};
    use crate::catalog::NOTE_LIST_PATH;
    use crate::error::ExportError;
    use crate::http::{MockHttpTransport, Response};

    const FORBIDDEN: [char; 9] = ['\\', '/', '*', '?', ':', '"', '<', '>', '|'];

    fn session() -> Session {
        Session::new("t0k3n", "https://kb.wiz.cn", "kb-1").unwrap()
    }

    fn note(doc_id: &str, title: &str) -> NoteSummary {
        NoteSummaryBuilder::new().with_doc_id(doc_id).with_title(title).build()
    }

    fn file_names(directory: &Path) -> Vec<String> {
        fs::read_dir(directory).unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .sorted()
            .collect()
    }

    #[test]
    fn sanitize_replaces_forbidden_characters() {
        assert_eq!(sanitize(r#"a\b/c*d?e:f"g<h>i|j"#), "a_b_c_d_e_f_g_h_i_j");
        assert_eq!(sanitize("Meeting 12:30"), "Meeting 12_30");
    }

    #[test]
    fn sanitize_strips_surrounding_dots() {
        assert_eq!(sanitize("..hidden.."), "hidden");
        assert_eq!(sanitize("v1.2"), "v1.2");
        assert_eq!(sanitize(".."), UNTITLED);
    }

    #[test]
    fn sanitize_falls_back_to_untitled() {
        assert_eq!(sanitize(""), UNTITLED);
        assert_eq!(sanitize("..."), UNTITLED);
    }

    #[test]
    fn sanitize_truncates_on_characters() {
        let long = "ä".repeat(250);
        let sanitized = sanitize(&long);
        assert_eq!(sanitized.chars().count(), MAX_NAME_LENGTH);

        let dotted = format!("{}.{}", "a".repeat(199), "b".repeat(10));
        assert_eq!(sanitize(&dotted), "a".repeat(199));
    }

    #[test]
    fn sanitize_invariants_hold() {
        let mut inputs: Vec<String> = vec![
            "", ".", "/", "\\\\", "...a...", "a/../../etc/passwd", "<<>>", "?:*",
            "normal title", "日本語のメモ", " . ",
        ].into_iter().map(String::from).collect();
        inputs.push("x".repeat(500));
        inputs.push(format!("{}.", "y".repeat(200)));

        for input in &inputs {
            let sanitized = sanitize(input);
            assert!(!sanitized.contains(&FORBIDDEN[..]), "{:?} -> {:?}", input, sanitized);
            assert!(!sanitized.starts_with('.') && !sanitized.ends_with('.'), "{:?} -> {:?}", input, sanitized);
            assert!(!sanitized.is_empty());
            assert!(sanitized.chars().count() <= MAX_NAME_LENGTH);
        }
    }

    #[test]
    fn local_folder_is_created_per_segment() {
        let root = tempfile::tempdir().unwrap();
        let path = ensure_local_folder(root.path(), &Folder::new("/Work/Pro:jects/")).unwrap();

        assert_eq!(path, root.path().join("Work").join("Pro_jects"));
        assert!(path.is_dir());
        assert_eq!(ensure_local_folder(root.path(), &Folder::new("/Work/Pro:jects/")).unwrap(), path);
    }

    #[test]
    fn separator_only_segments_are_dropped() {
        let root = tempfile::tempdir().unwrap();

        assert_eq!(ensure_local_folder(root.path(), &Folder::new("/a/\\/b/")).unwrap(), root.path().join("a").join("b"));
        assert_eq!(ensure_local_folder(root.path(), &Folder::new("/a/./b/")).unwrap(), root.path().join("a").join("b"));
        assert_eq!(ensure_local_folder(root.path(), &Folder::new("/a\\b/")).unwrap(), root.path().join("a_b"));
    }

    #[test]
    fn local_folder_cannot_escape_root() {
        let root = tempfile::tempdir().unwrap();
        let path = ensure_local_folder(root.path(), &Folder::new("/../secret/")).unwrap();
        assert_eq!(path, root.path().join(UNTITLED).join("secret"));
    }

    #[test]
    fn duplicate_titles_get_numbered() {
        let root = tempfile::tempdir().unwrap();
        for i in 0..4 {
            let content = format!("<p>{}</p>", i);
            assert!(write_note(root.path(), &note(&i.to_string(), "Plan"), Some(&content)));
        }

        assert_eq!(file_names(root.path()), vec!["Plan.html", "Plan_1.html", "Plan_2.html", "Plan_3.html"]);
        assert_eq!(fs::read_to_string(root.path().join("Plan_2.html")).unwrap(), "<p>2</p>");
    }

    #[test]
    fn note_without_id_is_skipped() {
        let root = tempfile::tempdir().unwrap();
        let untitled = NoteSummaryBuilder::new().with_title("Orphan").build();

        assert!(!write_note(root.path(), &untitled, Some("<p></p>")));
        assert!(matches!(try_write_note(root.path(), &untitled, Some("<p></p>")), Err(MissingDocId(_))));
        assert!(file_names(root.path()).is_empty());
    }

    #[test]
    fn missing_content_is_skipped() {
        let root = tempfile::tempdir().unwrap();
        assert!(!write_note(root.path(), &note("d1", "Plan"), None));
        assert!(!write_note(root.path(), &note("d1", "Plan"), Some("")));
        assert!(file_names(root.path()).is_empty());
    }

    #[test]
    fn write_failure_is_reported() {
        let root = tempfile::tempdir().unwrap();
        let missing = root.path().join("does-not-exist");

        assert!(!write_note(&missing, &note("d1", "Plan"), Some("<p></p>")));
        assert!(matches!(try_write_note(&missing, &note("d1", "Plan"), Some("<p></p>")), Err(WriteFailed { .. })));
    }

    #[test]
    fn root_folder_is_never_exported() {
        let root = tempfile::tempdir().unwrap();
        let requested = Arc::new(Mutex::new(Vec::new()));
        let seen = requested.clone();

        let mut transport = MockHttpTransport::new();
        transport.expect_send()
            .withf(|request| request.url.contains(NOTE_LIST_PATH))
            .times(2)
            .returning(move |request| {
                seen.lock().unwrap().push(request.query_value("category").unwrap_or_default().to_string());
                Ok(result_response(&Vec::<NoteSummary>::new()))
            });

        let folders = vec![Folder::new("/B"), Folder::new("/"), Folder::new("/A")];
        let report = Exporter::new(&transport, root.path()).export_all(&session(), &folders).unwrap();

        assert_eq!(*requested.lock().unwrap(), vec!["/A".to_string(), "/B".to_string()]);
        assert_eq!(report.folders, 2);
        assert_eq!(report.exported, 0);
        assert!(root.path().join("A").is_dir());
        assert!(root.path().join("B").is_dir());
    }

    #[test]
    fn failed_downloads_are_counted() {
        let root = tempfile::tempdir().unwrap();
        let mut transport = MockHttpTransport::new();
        transport.expect_send()
            .withf(|request| request.url.contains(NOTE_LIST_PATH))
            .times(1)
            .returning(|_| Ok(result_response(&vec![
                NoteSummaryBuilder::new().with_doc_id("ok").with_title("Kept").build(),
                NoteSummaryBuilder::new().with_doc_id("gone").with_title("Lost").build(),
                NoteSummaryBuilder::new().with_title("No id").build(),
            ])));
        transport.expect_send()
            .withf(|request| request.url.ends_with("/ok"))
            .times(1)
            .returning(|_| Ok(Response::new(200, b"<p>kept</p>".to_vec())));
        transport.expect_send()
            .withf(|request| request.url.ends_with("/gone"))
            .times(1)
            .returning(|_| Ok(Response::new(500, Vec::new())));

        let report = Exporter::new(&transport, root.path())
            .export_all(&session(), &[Folder::new("/Notes/")])
            .unwrap();

        assert_eq!(report, ExportReport { folders: 1, exported: 1, failed: 2, cancelled: false });
        assert_eq!(file_names(&root.path().join("Notes")), vec!["Kept.html"]);
    }

    #[test]
    fn interrupted_export_stops_early() {
        let root = tempfile::tempdir().unwrap();
        let mut transport = MockHttpTransport::new();
        transport.expect_send().times(0);

        let report = Exporter::new(&transport, root.path())
            .with_interrupt(Arc::new(AtomicBool::new(true)))
            .export_all(&session(), &[Folder::new("/A"), Folder::new("/B")])
            .unwrap();

        assert!(report.cancelled);
        assert_eq!(report.folders, 0);
    }

    #[test]
    fn interrupt_between_notes_stops_the_folder() {
        let root = tempfile::tempdir().unwrap();
        let interrupted = Arc::new(AtomicBool::new(false));
        let raise = interrupted.clone();

        let mut transport = MockHttpTransport::new();
        transport.expect_send()
            .withf(|request| request.url.contains(NOTE_LIST_PATH))
            .times(1)
            .returning(|_| Ok(result_response(&vec![note("first", "One"), note("second", "Two")])));
        transport.expect_send()
            .withf(|request| request.url.ends_with("/first"))
            .times(1)
            .returning(move |_| {
                raise.store(true, Ordering::SeqCst);
                Ok(Response::new(200, b"<p>one</p>".to_vec()))
            });
        transport.expect_send()
            .withf(|request| request.url.ends_with("/second"))
            .times(0);

        let report = Exporter::new(&transport, root.path())
            .with_interrupt(interrupted)
            .export_all(&session(), &[Folder::new("/Notes/"), Folder::new("/Work/")])
            .unwrap();

        assert!(report.cancelled);
        assert_eq!(report.exported, 1);
        assert_eq!(report.folders, 1);
        assert_eq!(file_names(&root.path().join("Notes")), vec!["One.html"]);
        assert!(!root.path().join("Work").exists());
    }

    #[test]
    fn export_requires_session() {
        let root = tempfile::tempdir().unwrap();
        let mut transport = MockHttpTransport::new();
        transport.expect_send().times(0);

        let result = Exporter::new(&transport, root.path()).export_all(&Session::default(), &[Folder::new("/A")]);
        assert!(matches!(result, Err(ExportError::NotAuthenticated)));
    }
}
