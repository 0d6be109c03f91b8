//! Selected-file state, drag/drop transitions, and progress-tracked
//! multipart submission.
//!
//! The controller owns the upload phase machine; drag signals are a
//! transient visual layer on top of it and never gate a drop. Progress
//! is derived from bytes handed to the transport and is therefore capped
//! below 100 until the server confirms completion: flushing the request
//! body is not success.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use futures_util::StreamExt;
use quarry_api_models::FileUploadResponse;
use reqwest::Body;
use reqwest::multipart::{Form, Part};

use crate::error::{ClientError, ClientResult};
use crate::http::ApiClient;

/// Transport chunk size for progress granularity.
const CHUNK_BYTES: usize = 64 * 1024;

/// Progress callback invoked with a monotone percent in `0..=100`.
type ProgressFn = Arc<dyn Fn(u8) + Send + Sync>;

/// Discrete phase of the upload lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadPhase {
    /// No file selected.
    Idle,
    /// A file is selected and ready to submit.
    Ready,
    /// A submission is in flight.
    Uploading,
    /// The server confirmed the upload.
    Succeeded,
    /// The last submission failed; submit again to retry.
    Failed,
}

/// File payload captured from a picker or a drop event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    /// File name to store under.
    pub name: String,
    /// Raw file contents.
    pub bytes: Vec<u8>,
}

#[derive(Debug)]
struct UploadState {
    phase: UploadPhase,
    dragging: bool,
    progress: u8,
    file: Option<SelectedFile>,
}

/// Drives one upload at a time through the phase machine.
///
/// State lives behind an `Arc` so the transport progress callback can
/// hold its own handle while a submission is in flight.
#[derive(Debug)]
pub struct UploadController {
    inner: Arc<Mutex<UploadState>>,
}

impl Default for UploadController {
    fn default() -> Self {
        Self::new()
    }
}

impl UploadController {
    /// Controller starting in [`UploadPhase::Idle`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(UploadState {
                phase: UploadPhase::Idle,
                dragging: false,
                progress: 0,
                file: None,
            })),
        }
    }

    fn guard(&self) -> MutexGuard<'_, UploadState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> UploadPhase {
        self.guard().phase
    }

    /// Whether a drag is hovering the drop zone.
    #[must_use]
    pub fn dragging(&self) -> bool {
        self.guard().dragging
    }

    /// Progress percent; meaningful only while [`UploadPhase::Uploading`]
    /// (and exactly 100 once [`UploadPhase::Succeeded`]).
    #[must_use]
    pub fn progress(&self) -> u8 {
        self.guard().progress
    }

    /// Currently selected file, if any.
    #[must_use]
    pub fn selected(&self) -> Option<SelectedFile> {
        self.guard().file.clone()
    }

    /// A drag entered the drop zone.
    pub fn drag_enter(&self) {
        self.guard().dragging = true;
    }

    /// A drag is moving over the drop zone.
    pub fn drag_over(&self) {
        self.guard().dragging = true;
    }

    /// The drag left the drop zone without dropping.
    pub fn drag_leave(&self) {
        self.guard().dragging = false;
    }

    /// A file was chosen from the picker.
    pub fn select(&self, file: SelectedFile) {
        self.accept_file(file);
    }

    /// A file arrived via drop; always lands in [`UploadPhase::Ready`]
    /// regardless of the drag-visual state.
    pub fn drop_file(&self, file: SelectedFile) {
        let mut inner = self.guard();
        inner.dragging = false;
        drop(inner);
        self.accept_file(file);
    }

    fn accept_file(&self, file: SelectedFile) {
        let mut inner = self.guard();
        if inner.phase == UploadPhase::Uploading {
            tracing::debug!(name = %file.name, "ignoring file selection during active upload");
            return;
        }
        inner.file = Some(file);
        inner.progress = 0;
        inner.phase = UploadPhase::Ready;
    }

    /// Deselect the file and return to [`UploadPhase::Idle`].
    pub fn clear(&self) {
        let mut inner = self.guard();
        if inner.phase == UploadPhase::Uploading {
            tracing::debug!("ignoring clear during active upload");
            return;
        }
        inner.file = None;
        inner.progress = 0;
        inner.phase = UploadPhase::Idle;
    }

    /// Submit the selected file as `POST /files/upload`.
    ///
    /// `on_progress` observes the same monotone percent sequence the
    /// controller records; it fires with 100 exactly once, after the
    /// server confirms success.
    ///
    /// # Errors
    ///
    /// A missing file or missing credential is a precondition failure
    /// raised before any request is sent; transport and server failures
    /// transition to [`UploadPhase::Failed`] and propagate.
    pub async fn submit<F>(
        &self,
        client: &ApiClient,
        on_progress: F,
    ) -> ClientResult<FileUploadResponse>
    where
        F: Fn(u8) + Send + Sync + 'static,
    {
        let file = {
            let mut inner = self.guard();
            match inner.phase {
                UploadPhase::Uploading => {
                    return Err(ClientError::precondition("an upload is already in progress"));
                }
                UploadPhase::Idle | UploadPhase::Ready | UploadPhase::Failed
                | UploadPhase::Succeeded => {}
            }
            let Some(file) = inner.file.clone() else {
                return Err(ClientError::precondition("select a file to upload first"));
            };
            if client.tokens().get().is_none() {
                return Err(ClientError::precondition(
                    "authentication token is missing; sign in before uploading",
                ));
            }
            inner.phase = UploadPhase::Uploading;
            inner.progress = 0;
            file
        };

        let observer: ProgressFn = Arc::new(on_progress);
        let recorder = {
            let observer = Arc::clone(&observer);
            let state = Arc::clone(&self.inner);
            // Transport progress is clamped to 99: the last byte leaving
            // the socket is not a confirmed upload.
            move |raw: u8| {
                let clamped = raw.min(99);
                let mut inner = state.lock().unwrap_or_else(PoisonError::into_inner);
                if clamped > inner.progress {
                    inner.progress = clamped;
                    drop(inner);
                    observer(clamped);
                }
            }
        };

        let part = counting_part(file, recorder);
        let form = Form::new().part("file", part);
        let result = client
            .post_multipart::<FileUploadResponse>("/files/upload", form)
            .await;

        let mut inner = self.guard();
        match result {
            Ok(response) => {
                inner.progress = 100;
                inner.phase = UploadPhase::Succeeded;
                drop(inner);
                observer(100);
                Ok(response)
            }
            Err(err) => {
                inner.phase = UploadPhase::Failed;
                Err(err)
            }
        }
    }
}

/// Build the multipart file part from an in-memory payload, reporting
/// cumulative percent as each chunk is handed to the transport.
fn counting_part<F>(file: SelectedFile, report: F) -> Part
where
    F: Fn(u8) + Send + Sync + 'static,
{
    let total = file.bytes.len();
    let chunks: Vec<(Bytes, u8)> = file
        .bytes
        .chunks(CHUNK_BYTES)
        .scan(0usize, |sent, chunk| {
            *sent += chunk.len();
            let percent = u8::try_from(*sent * 100 / total.max(1)).unwrap_or(100);
            Some((Bytes::copy_from_slice(chunk), percent))
        })
        .collect();

    let stream = futures_util::stream::iter(chunks).map(move |(chunk, percent)| {
        report(percent);
        Ok::<Bytes, std::io::Error>(chunk)
    });

    let length = u64::try_from(total).unwrap_or(u64::MAX);
    Part::stream_with_length(Body::wrap_stream(stream), length).file_name(file.name)
}
