//! In-memory document backend.
//!
//! Records every mark, apply and save so engine and runner behavior can
//! be checked without MuPDF. Individual files can be made to fail on open
//! or on commit, or to block until the test releases them.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crossbeam_channel::{bounded, Receiver, Sender};
use watermark_remover::domain::{FillMode, Rect};
use watermark_remover::redaction::{DocumentBackend, RedactableDocument, SaveOptions};
use watermark_remover::{RemoverError, RemoverResult};

/// One recorded document operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Open,
    Mark {
        page: usize,
        rect: Rect,
        fill: FillMode,
    },
    Apply {
        page: usize,
    },
    Save {
        output: PathBuf,
    },
}

/// Journal entries are tagged with the file name they happened on.
pub type Journal = Arc<Mutex<Vec<(String, Call)>>>;

/// Text occurrence a fake page reports when searched.
#[derive(Debug, Clone)]
pub struct TextHit {
    pub page: usize,
    pub text: String,
    pub rect: Rect,
}

pub struct FakeBackend {
    default_pages: usize,
    page_counts: HashMap<String, usize>,
    hits: Vec<TextHit>,
    failing: HashSet<String>,
    failing_apply: HashSet<String>,
    gates: Mutex<HashMap<String, Receiver<()>>>,
    journal: Journal,
}

impl FakeBackend {
    pub fn new(default_pages: usize) -> Self {
        Self {
            default_pages,
            page_counts: HashMap::new(),
            hits: Vec::new(),
            failing: HashSet::new(),
            failing_apply: HashSet::new(),
            gates: Mutex::new(HashMap::new()),
            journal: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_pages(mut self, file: &str, pages: usize) -> Self {
        self.page_counts.insert(file.to_string(), pages);
        self
    }

    /// Makes `text` findable at `rect` on `page` of every document.
    pub fn with_text(mut self, page: usize, text: &str, rect: Rect) -> Self {
        self.hits.push(TextHit {
            page,
            text: text.to_string(),
            rect,
        });
        self
    }

    /// Opening `file` fails.
    pub fn failing(mut self, file: &str) -> Self {
        self.failing.insert(file.to_string());
        self
    }

    /// Committing marks on any page of `file` fails.
    pub fn failing_apply(mut self, file: &str) -> Self {
        self.failing_apply.insert(file.to_string());
        self
    }

    /// Opening `file` blocks until the returned sender fires or is dropped.
    pub fn gate(&self, file: &str) -> Sender<()> {
        let (tx, rx) = bounded(1);
        self.gates
            .lock()
            .unwrap()
            .insert(file.to_string(), rx);
        tx
    }

    pub fn journal(&self) -> Journal {
        Arc::clone(&self.journal)
    }

    fn record(&self, file: &str, call: Call) {
        self.journal.lock().unwrap().push((file.to_string(), call));
    }
}

impl DocumentBackend for FakeBackend {
    fn open(&self, path: &Path) -> RemoverResult<Box<dyn RedactableDocument>> {
        let file = file_name(path);

        let gate = self.gates.lock().unwrap().remove(&file);
        if let Some(gate) = gate {
            let _ = gate.recv();
        }

        if self.failing.contains(&file) {
            return Err(RemoverError::PdfProcessing {
                message: format!("cannot open {}", file),
                page: None,
                source: None,
            });
        }

        self.record(&file, Call::Open);
        Ok(Box::new(FakeDocument {
            page_count: self
                .page_counts
                .get(&file)
                .copied()
                .unwrap_or(self.default_pages),
            hits: self.hits.clone(),
            journal: self.journal(),
            fail_apply: self.failing_apply.contains(&file),
            file,
        }))
    }

    fn name(&self) -> &str {
        "Fake"
    }
}

pub struct FakeDocument {
    file: String,
    page_count: usize,
    hits: Vec<TextHit>,
    journal: Journal,
    fail_apply: bool,
}

impl FakeDocument {
    fn record(&self, call: Call) {
        self.journal.lock().unwrap().push((self.file.clone(), call));
    }
}

impl RedactableDocument for FakeDocument {
    fn page_count(&self) -> usize {
        self.page_count
    }

    fn mark_area(&mut self, page: usize, rect: Rect, fill: FillMode) -> RemoverResult<()> {
        self.record(Call::Mark { page, rect, fill });
        Ok(())
    }

    fn search_text(&mut self, page: usize, needle: &str) -> RemoverResult<Vec<Rect>> {
        Ok(self
            .hits
            .iter()
            .filter(|hit| hit.page == page && hit.text == needle)
            .map(|hit| hit.rect)
            .collect())
    }

    fn apply_marks(&mut self, page: usize) -> RemoverResult<()> {
        if self.fail_apply {
            return Err(RemoverError::PdfProcessing {
                message: format!("cannot redact page {} of {}", page + 1, self.file),
                page: Some(page + 1),
                source: None,
            });
        }
        self.record(Call::Apply { page });
        Ok(())
    }

    fn save(&mut self, output: &Path, _options: &SaveOptions) -> RemoverResult<()> {
        // Written only when the directory exists, so tests may use
        // paths that are never on disk.
        if output.parent().is_some_and(Path::is_dir) {
            std::fs::write(output, b"%PDF-1.4\n")?;
        }
        self.record(Call::Save {
            output: output.to_path_buf(),
        });
        Ok(())
    }
}

pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Calls recorded for one file, in order.
pub fn calls_for(journal: &Journal, file: &str) -> Vec<Call> {
    journal
        .lock()
        .unwrap()
        .iter()
        .filter(|(f, _)| f == file)
        .map(|(_, call)| call.clone())
        .collect()
}

/// Pages marked on one file, in order, ignoring repeats.
pub fn marked_pages(journal: &Journal, file: &str) -> Vec<usize> {
    let mut pages = Vec::new();
    for call in calls_for(journal, file) {
        if let Call::Mark { page, .. } = call {
            if !pages.contains(&page) {
                pages.push(page);
            }
        }
    }
    pages
}
