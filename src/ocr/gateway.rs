//! Recognition gateway: lazy, single-instance front door to the OCR engine.
//!
//! The engine is loaded on first use (or by [`RecognitionGateway::prewarm`])
//! and then reused for the rest of the process.  Concurrent first callers
//! share one initialization.  A failed initialization leaves the gateway
//! empty, so the next call tries again.
//!
//! The loaded worker sits behind an async mutex: recognitions queue up
//! instead of overlapping on one engine instance.

use std::sync::Arc;

use tokio::sync::{Mutex, OnceCell};

use crate::diagnostics::Diagnostics;
use crate::ocr::engine::{CapturedImage, OcrBackend, OcrWorker, Progress, RecognitionError};

pub struct RecognitionGateway {
    backend: Arc<dyn OcrBackend>,
    languages: String,
    diagnostics: Diagnostics,
    worker: OnceCell<Mutex<Box<dyn OcrWorker>>>,
}

impl RecognitionGateway {
    pub fn new(backend: Arc<dyn OcrBackend>, languages: impl Into<String>, diagnostics: Diagnostics) -> Self {
        Self {
            backend,
            languages: languages.into(),
            diagnostics,
            worker: OnceCell::new(),
        }
    }

    /// `true` once the engine has been loaded.
    pub fn is_initialized(&self) -> bool {
        self.worker.initialized()
    }

    /// Load the engine in the background.  Failure is logged and otherwise
    /// ignored; the first scan retries.
    pub fn prewarm(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            let _ = this.worker().await;
        })
    }

    async fn worker(&self) -> Result<&Mutex<Box<dyn OcrWorker>>, RecognitionError> {
        self.worker
            .get_or_try_init(|| async {
                self.diagnostics
                    .info(&format!("ocr: initialising engine ({})", self.languages));
                let report = |p: Progress| self.report(p);
                match self.backend.load(&self.languages, &report).await {
                    Ok(worker) => {
                        self.diagnostics.info("ocr: engine ready");
                        Ok(Mutex::new(worker))
                    }
                    Err(e) => {
                        self.diagnostics.error(&format!("ocr: {e}"));
                        Err(e)
                    }
                }
            })
            .await
    }

    /// Extract text from `image`.  No retry on failure.
    pub async fn recognize(&self, image: &CapturedImage) -> Result<String, RecognitionError> {
        let worker = self.worker().await?;
        let mut worker = worker.lock().await;

        let report = |p: Progress| self.report(p);
        match worker.recognize(image, &report).await {
            Ok(text) => {
                self.diagnostics.info(&format!(
                    "ocr: recognized {} chars",
                    text.chars().count()
                ));
                Ok(text)
            }
            Err(e) => {
                self.diagnostics.error(&format!("ocr: {e}"));
                Err(e)
            }
        }
    }

    fn report(&self, progress: Progress) {
        self.diagnostics.info(&format!(
            "ocr: {} {}%",
            progress.stage.label(),
            progress.percent
        ));
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::diagnostics::RecordingSink;
    use crate::ocr::engine::{ProgressFn, Stage};

    /// Backend whose first `fail_first` loads fail; workers echo a fixed text.
    struct MockBackend {
        loads: AtomicUsize,
        fail_first: usize,
        text: Result<String, RecognitionError>,
        active: Arc<AtomicUsize>,
        max_active: Arc<AtomicUsize>,
    }

    impl MockBackend {
        fn new(text: Result<&str, RecognitionError>) -> Self {
            Self {
                loads: AtomicUsize::new(0),
                fail_first: 0,
                text: text.map(str::to_string),
                active: Arc::new(AtomicUsize::new(0)),
                max_active: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    struct MockWorker {
        text: Result<String, RecognitionError>,
        active: Arc<AtomicUsize>,
        max_active: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl OcrBackend for MockBackend {
        async fn load(
            &self,
            _languages: &str,
            progress: ProgressFn<'_>,
        ) -> Result<Box<dyn OcrWorker>, RecognitionError> {
            let n = self.loads.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            if n < self.fail_first {
                return Err(RecognitionError::EngineInit("no tessdata".into()));
            }
            progress(Progress::new(Stage::Loading, 100));
            Ok(Box::new(MockWorker {
                text: self.text.clone(),
                active: Arc::clone(&self.active),
                max_active: Arc::clone(&self.max_active),
            }))
        }
    }

    #[async_trait]
    impl OcrWorker for MockWorker {
        async fn recognize(
            &mut self,
            _image: &CapturedImage,
            progress: ProgressFn<'_>,
        ) -> Result<String, RecognitionError> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_active.fetch_max(now, Ordering::SeqCst);
            progress(Progress::new(Stage::Recognizing, 50));
            tokio::time::sleep(Duration::from_millis(10)).await;
            progress(Progress::new(Stage::Recognizing, 100));
            self.active.fetch_sub(1, Ordering::SeqCst);
            self.text.clone()
        }
    }

    fn image() -> CapturedImage {
        CapturedImage::from_bytes(vec![1, 2, 3]).unwrap()
    }

    fn gateway(backend: &Arc<MockBackend>) -> (Arc<RecognitionGateway>, Arc<RecordingSink>) {
        let sink = RecordingSink::new();
        let gw = RecognitionGateway::new(backend.clone(), "deu+fra", sink.clone());
        (Arc::new(gw), sink)
    }

    #[tokio::test(start_paused = true)]
    async fn engine_is_loaded_once() {
        let backend = Arc::new(MockBackend::new(Ok("Moien")));
        let (gw, _) = gateway(&backend);

        assert!(!gw.is_initialized());
        for _ in 0..3 {
            assert_eq!(gw.recognize(&image()).await.unwrap(), "Moien");
        }
        assert!(gw.is_initialized());
        assert_eq!(backend.loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn prewarm_and_first_scan_share_initialization() {
        let backend = Arc::new(MockBackend::new(Ok("text")));
        let (gw, _) = gateway(&backend);

        let warm = gw.prewarm();
        let text = gw.recognize(&image()).await.unwrap();
        warm.await.unwrap();

        assert_eq!(text, "text");
        assert_eq!(backend.loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_initialization_is_retried() {
        let mut backend = MockBackend::new(Ok("text"));
        backend.fail_first = 1;
        let backend = Arc::new(backend);
        let (gw, sink) = gateway(&backend);

        let err = gw.recognize(&image()).await.unwrap_err();
        assert!(matches!(err, RecognitionError::EngineInit(_)));
        assert!(!gw.is_initialized());
        assert_eq!(sink.count_containing("initialisation failed"), 1);

        assert_eq!(gw.recognize(&image()).await.unwrap(), "text");
        assert_eq!(backend.loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn recognition_failure_is_surfaced() {
        let backend = Arc::new(MockBackend::new(Err(RecognitionError::Recognition(
            "blurry".into(),
        ))));
        let (gw, sink) = gateway(&backend);

        let err = gw.recognize(&image()).await.unwrap_err();

        assert_eq!(err, RecognitionError::Recognition("blurry".into()));
        assert_eq!(sink.count_containing("blurry"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_scans_never_overlap_on_the_engine() {
        let backend = Arc::new(MockBackend::new(Ok("text")));
        let (gw, _) = gateway(&backend);

        let img = image();
        let (a, b, c) = tokio::join!(gw.recognize(&img), gw.recognize(&img), gw.recognize(&img));

        assert!(a.is_ok() && b.is_ok() && c.is_ok());
        assert_eq!(backend.max_active.load(Ordering::SeqCst), 1);
        assert_eq!(backend.loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn progress_is_forwarded_to_diagnostics() {
        let backend = Arc::new(MockBackend::new(Ok("text")));
        let (gw, sink) = gateway(&backend);

        gw.recognize(&image()).await.unwrap();

        assert_eq!(sink.count_containing("ocr: loading engine 100%"), 1);
        assert_eq!(sink.count_containing("ocr: recognizing text 50%"), 1);
        assert_eq!(sink.count_containing("ocr: recognizing text 100%"), 1);
    }
}
