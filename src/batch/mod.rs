//! Sequential batch processing.
//!
//! A run takes an immutable snapshot of the file list, regions, text
//! targets and exclusions, then cleans the files one after another on a
//! dedicated worker thread. Progress flows back over a channel; pause
//! and stop are atomic flags checked at file boundaries.

pub mod control;
pub mod events;

pub use control::RunControl;
pub use events::{EventDrain, LogLevel, RunEvent, RunStats, RunSummary};

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, Sender};
use tracing::{info, warn};

use crate::domain::scope::count_applicable;
use crate::domain::{
    applicable_regions, resolve_output_path, ExcludedPages, FileEntry, FileStatus, FillMode,
    Region, TextTarget, DEFAULT_SUFFIX,
};
use crate::error::{RemoverError, RemoverResult};
use crate::redaction::{DocumentBackend, RedactionEngine, SaveOptions};

/// Sleep between checks of the pause flag.
pub const PAUSE_POLL: Duration = Duration::from_millis(100);

/// Everything a run needs, captured when it starts.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub files: Vec<FileEntry>,
    pub regions: Vec<Region>,
    pub texts: Vec<TextTarget>,
    /// Raw exclusion string as typed; parsed once per run.
    pub excluded_pages: String,
    pub fill_mode: FillMode,
    pub output_suffix: String,
    pub save_options: SaveOptions,
}

impl RunRequest {
    pub fn new(files: Vec<FileEntry>) -> Self {
        Self {
            files,
            regions: Vec::new(),
            texts: Vec::new(),
            excluded_pages: String::new(),
            fill_mode: FillMode::default(),
            output_suffix: DEFAULT_SUFFIX.to_string(),
            save_options: SaveOptions::optimized(),
        }
    }

    pub fn with_regions(mut self, regions: Vec<Region>) -> Self {
        self.regions = regions;
        self
    }

    pub fn with_texts(mut self, texts: Vec<TextTarget>) -> Self {
        self.texts = texts;
        self
    }

    pub fn with_excluded_pages(mut self, excluded: impl Into<String>) -> Self {
        self.excluded_pages = excluded.into();
        self
    }

    pub fn with_fill_mode(mut self, fill_mode: FillMode) -> Self {
        self.fill_mode = fill_mode;
        self
    }

    pub fn with_output_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.output_suffix = suffix.into();
        self
    }

    /// Checks the request before any file is touched.
    pub fn validate(&self) -> RemoverResult<()> {
        if self.files.is_empty() {
            return Err(RemoverError::invalid_input("files", "No PDF files added"));
        }
        if self.regions.is_empty() && self.texts.is_empty() {
            return Err(RemoverError::invalid_input(
                "targets",
                "Select at least one region or enter text to remove",
            ));
        }
        if self.output_suffix.is_empty() {
            return Err(RemoverError::invalid_input(
                "suffix",
                "An empty suffix would overwrite the original files",
            ));
        }
        for region in &self.regions {
            region.validate()?;
        }
        Ok(())
    }
}

/// Starts batch runs against a document backend.
pub struct BatchRunner {
    backend: Arc<dyn DocumentBackend>,
    pause_poll: Duration,
}

impl BatchRunner {
    pub fn new(backend: Arc<dyn DocumentBackend>) -> Self {
        Self {
            backend,
            pause_poll: PAUSE_POLL,
        }
    }

    /// Sets the sleep between pause flag checks.
    pub fn with_pause_poll(mut self, poll: Duration) -> Self {
        self.pause_poll = poll;
        self
    }

    /// Validates the request and starts the worker. Never blocks on the
    /// run itself.
    pub fn start(&self, request: RunRequest) -> RemoverResult<RunHandle> {
        self.start_with_control(request, RunControl::new())
    }

    /// Like [`BatchRunner::start`] with caller-provided control flags, so
    /// a run can be created paused.
    pub fn start_with_control(
        &self,
        request: RunRequest,
        control: RunControl,
    ) -> RemoverResult<RunHandle> {
        request.validate()?;

        let (tx, rx) = unbounded();
        let worker = Worker {
            backend: Arc::clone(&self.backend),
            control: control.clone(),
            pause_poll: self.pause_poll,
            excluded: ExcludedPages::parse(&request.excluded_pages),
            request,
            tx,
        };

        let handle = thread::Builder::new()
            .name("batch-worker".to_string())
            .spawn(move || worker.run())
            .map_err(|e| RemoverError::Worker(e.to_string()))?;

        Ok(RunHandle {
            control,
            events: rx,
            worker: handle,
        })
    }
}

/// A run in progress.
pub struct RunHandle {
    control: RunControl,
    events: Receiver<RunEvent>,
    worker: JoinHandle<RunSummary>,
}

impl RunHandle {
    pub fn control(&self) -> &RunControl {
        &self.control
    }

    pub fn pause(&self) {
        self.control.pause();
    }

    pub fn resume(&self) {
        self.control.resume();
    }

    pub fn stop(&self) {
        self.control.stop();
    }

    /// The raw event receiver.
    pub fn events(&self) -> &Receiver<RunEvent> {
        &self.events
    }

    /// A batched drain over this run's events.
    pub fn drain(&self) -> EventDrain {
        EventDrain::new(self.events.clone())
    }

    pub fn is_finished(&self) -> bool {
        self.worker.is_finished()
    }

    /// Waits for the worker and returns the final summary.
    pub fn join(self) -> RemoverResult<RunSummary> {
        self.worker
            .join()
            .map_err(|_| RemoverError::Worker("batch worker panicked".to_string()))
    }
}

/// State owned by the worker thread for one run.
struct Worker {
    backend: Arc<dyn DocumentBackend>,
    control: RunControl,
    pause_poll: Duration,
    excluded: ExcludedPages,
    request: RunRequest,
    tx: Sender<RunEvent>,
}

impl Worker {
    fn run(self) -> RunSummary {
        let total = self.request.files.len();
        let mut files = self.request.files.clone();
        let mut stats = RunStats::new(total);
        let mut output_dir: Option<PathBuf> = None;

        info!(files = total, backend = self.backend.name(), "batch run started");
        self.emit(RunEvent::Stats(stats));

        for index in 0..total {
            if !self.control.wait_while_paused(self.pause_poll) {
                break;
            }

            let name = files[index].display_name.clone();
            self.log(
                Some(index),
                LogLevel::Info,
                format!("{} (file {} of {})", name, index + 1, total),
            );

            files[index].status = FileStatus::Processing;
            self.emit(RunEvent::Status {
                index,
                status: FileStatus::Processing,
            });
            stats.waiting = stats.waiting.saturating_sub(1);
            stats.processing = 1;
            self.emit(RunEvent::Stats(stats));

            let status = match self.process_file(index, &files[index]) {
                Ok(output) => {
                    if output_dir.is_none() {
                        output_dir = output.parent().map(Path::to_path_buf);
                    }
                    info!(file = %name, output = %output.display(), "file cleaned");
                    stats.success += 1;
                    FileStatus::Done
                }
                Err(e) => {
                    warn!(file = %name, error = %e, "file failed");
                    self.log(Some(index), LogLevel::Error, format!("Failed: {}", e));
                    stats.failed += 1;
                    FileStatus::Failed
                }
            };

            files[index].status = status;
            stats.processing = 0;
            self.emit(RunEvent::Status { index, status });
            self.emit(RunEvent::Stats(stats));
            self.emit(RunEvent::Progress {
                completed: stats.completed(),
                total,
            });
        }

        let stopped = self.control.is_stopped();
        if stopped {
            self.log(None, LogLevel::Warning, "Run stopped".to_string());
        } else {
            self.log(None, LogLevel::Success, "All files processed".to_string());
        }
        info!(
            success = stats.success,
            failed = stats.failed,
            stopped,
            "batch run finished"
        );

        let summary = RunSummary {
            files,
            stats,
            stopped,
            output_dir,
        };
        self.emit(RunEvent::Finished(summary.clone()));
        summary
    }

    /// Cleans one file and returns where the copy was written.
    fn process_file(&self, index: usize, entry: &FileEntry) -> RemoverResult<PathBuf> {
        let request = &self.request;
        self.log(Some(index), LogLevel::Success, "Started".to_string());

        let mut doc = self.backend.open(&entry.path)?;
        let page_count = doc.page_count();

        {
            let mut engine = RedactionEngine::new(&mut *doc);

            let page_rects =
                applicable_regions(&request.regions, &self.excluded, index, page_count);
            if !page_rects.is_empty() {
                let result = engine.apply_region_redactions(&page_rects, request.fill_mode)?;
                let regions = count_applicable(&request.regions, index, page_count);
                self.log(
                    Some(index),
                    LogLevel::Success,
                    format!(
                        "Region removal: {} region(s), {} area(s) on {} page(s)",
                        regions, result.areas_marked, result.pages_modified
                    ),
                );
            }

            if !request.texts.is_empty() {
                // Text removal ignores the exclusion set.
                let counts = engine.apply_text_redactions(&request.texts, None)?;
                self.log(Some(index), LogLevel::Success, "Text removal:".to_string());
                for (text, count) in counts.iter() {
                    if count > 0 {
                        self.log(
                            Some(index),
                            LogLevel::Info,
                            format!("  \"{}\": {} match(es)", text, count),
                        );
                    } else {
                        self.log(
                            Some(index),
                            LogLevel::Warning,
                            format!("  \"{}\": no match", text),
                        );
                    }
                }
            }
        }

        if !self.excluded.is_empty() {
            self.log(
                Some(index),
                LogLevel::Success,
                format!("Excluded pages: {}", self.excluded.to_range_string()),
            );
        }

        let output = resolve_output_path(&entry.path, &request.output_suffix);
        doc.save(&output, &request.save_options)?;
        drop(doc);

        let output_name = output
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.log(
            Some(index),
            LogLevel::Success,
            format!("Saved: {}", output_name),
        );

        Ok(output)
    }

    fn log(&self, index: Option<usize>, level: LogLevel, message: String) {
        self.emit(RunEvent::Log {
            index,
            level,
            message,
        });
    }

    fn emit(&self, event: RunEvent) {
        // The presentation side may have gone away; the run still completes.
        let _ = self.tx.send(event);
    }
}
