use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::time::Duration;

use astro_booking_core::{
    BookingRecord, DeliveryClient, DeliveryOutcome, FormFields, FormView, ImageNormalizer,
    Navigator, NormalizeError, NormalizedImage, SessionStore, StorageError, SubmissionPhase,
    TicketHost, Timer,
};
use astro_booking_image::{is_large_source, NormalizerConfig, PipelineError};
use tracing::{debug, error, info, warn};
use url::Url;

pub struct ReqwestDelivery {
    client: reqwest::Client,
    url: Url,
}

impl ReqwestDelivery {
    pub fn new(url: Url) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl DeliveryClient for ReqwestDelivery {
    async fn deliver(&self, record: &BookingRecord) -> DeliveryOutcome {
        debug!(url = %self.url, id = %record.id, "posting booking");
        let response = match self.client.post(self.url.clone()).json(record).send().await {
            Ok(response) => response,
            Err(err) => {
                error!(error = %err, "booking request failed");
                return DeliveryOutcome::unreachable(err.to_string());
            }
        };
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        DeliveryOutcome::from_response(status, &body)
    }
}

/// Normalizes images read from disk. Decoding runs on the blocking pool.
pub struct FileNormalizer {
    config: NormalizerConfig,
}

impl FileNormalizer {
    pub fn new(config: NormalizerConfig) -> Self {
        Self { config }
    }
}

impl ImageNormalizer for FileNormalizer {
    type Source = PathBuf;

    async fn normalize(&self, path: &PathBuf) -> Result<NormalizedImage, NormalizeError> {
        let bytes = tokio::fs::read(path).await.map_err(|err| {
            NormalizeError(PipelineError::Read(format!("{}: {err}", path.display())).to_string())
        })?;
        if is_large_source(bytes.len()) {
            warn!(path = %path.display(), "large image, compression may take a while");
        }
        let config = self.config;
        let normalized =
            tokio::task::spawn_blocking(move || astro_booking_image::normalize(&bytes, &config))
                .await
                .map_err(|err| NormalizeError(err.to_string()))?
                .map_err(|err| {
                    error!(path = %path.display(), error = %err, "image normalization failed");
                    NormalizeError(err.to_string())
                })?;
        info!(
            path = %path.display(),
            width = normalized.width,
            height = normalized.height,
            "image compressed {}",
            normalized.size_summary()
        );
        Ok(NormalizedImage {
            data_url: normalized.data_url,
            width: normalized.width,
            height: normalized.height,
            source_len: normalized.source_len,
        })
    }
}

/// Session storage kept as one file per key, so a later `ticket` run can
/// read what `submit` wrote.
#[derive(Debug, Clone)]
pub struct DirSessionStore {
    dir: PathBuf,
}

impl DirSessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl SessionStore for DirSessionStore {
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        std::fs::create_dir_all(&self.dir)
            .and_then(|()| std::fs::write(self.dir.join(key), value))
            .map_err(|err| StorageError(err.to_string()))
    }

    fn get_item(&self, key: &str) -> Option<String> {
        std::fs::read_to_string(self.dir.join(key)).ok()
    }
}

#[derive(Debug, Default)]
pub struct StdoutNavigator {
    visited: RefCell<Vec<String>>,
}

impl StdoutNavigator {
    pub fn visited(&self) -> Vec<String> {
        self.visited.borrow().clone()
    }
}

impl Navigator for StdoutNavigator {
    fn navigate(&self, url: &str) {
        println!("redirect: {url}");
        self.visited.borrow_mut().push(url.to_string());
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioTimer;

impl Timer for TokioTimer {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Form state supplied on the command line.
#[derive(Debug, Default)]
pub struct ConsoleForm {
    fields: FormFields,
    busy: RefCell<bool>,
    error: RefCell<Option<String>>,
}

impl ConsoleForm {
    pub fn new(fields: FormFields) -> Self {
        Self {
            fields,
            ..Self::default()
        }
    }

    pub fn is_busy(&self) -> bool {
        *self.busy.borrow()
    }

    pub fn error(&self) -> Option<String> {
        self.error.borrow().clone()
    }
}

impl FormView for ConsoleForm {
    fn fields(&self) -> FormFields {
        self.fields.clone()
    }

    fn set_busy(&self, busy: bool) {
        *self.busy.borrow_mut() = busy;
    }

    fn show_error(&self, message: &str) {
        eprintln!("error: {message}");
        *self.error.borrow_mut() = Some(message.to_string());
    }

    fn hide_error(&self) {
        self.error.borrow_mut().take();
    }

    fn set_phase(&self, phase: SubmissionPhase) {
        info!(phase = phase.label(), "submission");
    }
}

/// Writes the ticket into `out_dir` and prints the messaging link.
#[derive(Debug)]
pub struct FileTicketHost {
    out_dir: PathBuf,
    saved: RefCell<Option<PathBuf>>,
    link: RefCell<Option<String>>,
}

impl FileTicketHost {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
            saved: RefCell::new(None),
            link: RefCell::new(None),
        }
    }

    pub fn saved(&self) -> Option<PathBuf> {
        self.saved.borrow().clone()
    }

    pub fn messaging_link(&self) -> Option<String> {
        self.link.borrow().clone()
    }
}

impl TicketHost for FileTicketHost {
    fn alert(&self, message: &str) {
        eprintln!("{message}");
    }

    fn navigate(&self, url: &str) {
        println!("redirect: {url}");
    }

    fn save(&self, file_name: &str, bytes: &[u8]) {
        let path = self.out_dir.join(file_name);
        let written = std::fs::create_dir_all(&self.out_dir).and_then(|()| std::fs::write(&path, bytes));
        match written {
            Ok(()) => {
                println!("ticket: {}", path.display());
                *self.saved.borrow_mut() = Some(path);
            }
            Err(err) => warn!(path = %path.display(), error = %err, "ticket not written"),
        }
    }

    fn set_messaging_link(&self, url: &str) {
        println!("whatsapp: {url}");
        *self.link.borrow_mut() = Some(url.to_string());
    }
}
