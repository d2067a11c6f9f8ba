//! Report generation for a session.
//!
//! Checks that keys and photo are present, moves the session through
//! Running, runs the pipeline and stores the result. Nothing remote is
//! touched until every required input is present.

use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::backend::Backends;
use crate::config::ModelSettings;
use crate::credentials::{ApiKey, Credentials};
use crate::error::{MissingInput, StylistError, StylistResult};
use crate::image::UploadedImage;
use crate::pipeline::{Pipeline, PipelineContext, PipelineError};
use crate::preferences::StylePreferences;
use crate::prompts::PromptLibrary;
use crate::session::{SessionId, SessionStore, StoredReport};

/// Fixed name of the downloadable report.
pub const REPORT_FILE_NAME: &str = "fashion_recommendation_report.md";

/// MIME type of the downloadable report.
pub const REPORT_MIME_TYPE: &str = "text/markdown";

#[derive(Error, Debug)]
pub enum GenerateError {
    /// Input was missing or invalid; the pipeline was not started.
    #[error(transparent)]
    Rejected(#[from] StylistError),

    /// The pipeline started and a step failed.
    #[error(transparent)]
    Failed(#[from] PipelineError),
}

/// Everything a run needs, proven present.
#[derive(Debug, Clone)]
pub struct ReadyInputs {
    pub openai_api_key: ApiKey,
    pub serp_api_key: ApiKey,
    pub image: UploadedImage,
}

/// Check required inputs in order: OpenAI key, SerpAPI key, image.
pub fn check_ready(
    credentials: &Credentials,
    preferences: &StylePreferences,
) -> Result<ReadyInputs, MissingInput> {
    let openai_api_key = credentials
        .openai_api_key
        .clone()
        .ok_or(MissingInput::OpenAiKey)?;
    let serp_api_key = credentials
        .serp_api_key
        .clone()
        .ok_or(MissingInput::SerpApiKey)?;
    let image = preferences.image.clone().ok_or(MissingInput::Image)?;

    Ok(ReadyInputs {
        openai_api_key,
        serp_api_key,
        image,
    })
}

pub struct ReportService {
    backends: Arc<dyn Backends>,
    prompts: PromptLibrary,
    models: ModelSettings,
}

impl ReportService {
    pub fn new(backends: Arc<dyn Backends>, models: ModelSettings) -> StylistResult<Self> {
        Ok(Self {
            backends,
            prompts: PromptLibrary::new()?,
            models,
        })
    }

    /// Build the three-step pipeline for one run.
    pub fn pipeline_for(&self, inputs: &ReadyInputs) -> Pipeline {
        Pipeline::fashion_report(
            self.backends.chat_model(&inputs.openai_api_key),
            self.backends.web_search(&inputs.serp_api_key),
            &self.prompts,
            &self.models,
        )
    }

    /// Generate a report for `session` from the submitted preferences.
    ///
    /// On success the new report and photo replace whatever the session
    /// held. On failure the session returns to its previous state.
    pub async fn generate(
        &self,
        sessions: &SessionStore,
        session: SessionId,
        preferences: StylePreferences,
    ) -> Result<Arc<StoredReport>, GenerateError> {
        let inputs = sessions
            .update(session, |s| {
                s.preferences = preferences.without_image();
                let inputs = check_ready(&s.credentials, &preferences)?;
                s.begin_run()?;
                Ok::<_, StylistError>(inputs)
            })
            .await?
            .inspect_err(|e| warn!(session = %session, error = %e, "Report request rejected"))?;

        info!(session = %session, "Generating fashion report");
        let pipeline = self.pipeline_for(&inputs);
        // Detached: dropping the request neither cancels the run nor leaves
        // the session stuck in Running.
        let run = tokio::spawn(run_to_completion(
            sessions.clone(),
            session,
            pipeline,
            inputs,
            preferences,
        ));

        match run.await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(session = %session, error = %e, "Report task stopped");
                let _ = sessions.update(session, |s| s.abort_run()).await;
                Err(StylistError::TaskFailed(e.to_string()).into())
            }
        }
    }
}

/// Run the pipeline and record its outcome on the session.
async fn run_to_completion(
    sessions: SessionStore,
    session: SessionId,
    pipeline: Pipeline,
    inputs: ReadyInputs,
    preferences: StylePreferences,
) -> Result<Arc<StoredReport>, GenerateError> {
    let outcome = pipeline
        .run(PipelineContext::new(inputs.image.clone(), preferences))
        .await;

    match outcome {
        Ok(result) => {
            let stored = sessions
                .update(session, |s| {
                    s.finish_run(StoredReport {
                        report: result.report,
                        image: inputs.image,
                        generated_at: Utc::now(),
                    })
                })
                .await?;
            info!(session = %session, bytes = stored.report.len(), "Fashion report ready");
            Ok(stored)
        }
        Err(e) => {
            error!(session = %session, error = %e, "Fashion report failed");
            // The session may have ended while the run was in flight.
            let _ = sessions.update(session, |s| s.abort_run()).await;
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::mock::{ScriptedChatModel, ScriptedSearch};
    use crate::llm::{ChatCompletion, ChatModel, ChatRequest, LlmResult, WebSearch};
    use crate::pipeline::StepKind;
    use crate::session::{RunPhase, Session};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Semaphore;

    /// Holds every completion until the test hands out permits.
    struct GatedChatModel {
        inner: Arc<ScriptedChatModel>,
        gate: Arc<Semaphore>,
    }

    #[async_trait]
    impl ChatModel for GatedChatModel {
        async fn complete(&self, request: ChatRequest) -> LlmResult<ChatCompletion> {
            self.gate.acquire().await.unwrap().forget();
            self.inner.complete(request).await
        }
    }

    struct TestBackends {
        model: Arc<ScriptedChatModel>,
        chat: Arc<dyn ChatModel>,
        search: Arc<ScriptedSearch>,
        built: AtomicUsize,
    }

    impl TestBackends {
        fn new(model: ScriptedChatModel) -> Arc<Self> {
            let model = Arc::new(model);
            Self::with_chat(model.clone(), model)
        }

        fn gated(model: ScriptedChatModel, gate: Arc<Semaphore>) -> Arc<Self> {
            let model = Arc::new(model);
            let chat = Arc::new(GatedChatModel {
                inner: model.clone(),
                gate,
            });
            Self::with_chat(model, chat)
        }

        fn with_chat(model: Arc<ScriptedChatModel>, chat: Arc<dyn ChatModel>) -> Arc<Self> {
            Arc::new(Self {
                model,
                chat,
                search: Arc::new(ScriptedSearch::default()),
                built: AtomicUsize::new(0),
            })
        }
    }

    impl Backends for TestBackends {
        fn chat_model(&self, _api_key: &ApiKey) -> Arc<dyn ChatModel> {
            self.built.fetch_add(1, Ordering::SeqCst);
            self.chat.clone()
        }

        fn web_search(&self, _api_key: &ApiKey) -> Arc<dyn WebSearch> {
            self.built.fetch_add(1, Ordering::SeqCst);
            self.search.clone()
        }
    }

    fn image(tag: u8) -> UploadedImage {
        UploadedImage::new("me.jpg", vec![0xFF, 0xD8, 0xFF, tag]).unwrap()
    }

    fn with_image(tag: u8) -> StylePreferences {
        StylePreferences {
            image: Some(image(tag)),
            ..StylePreferences::default()
        }
    }

    async fn setup(model: ScriptedChatModel, openai: &str, serp: &str) -> (Arc<TestBackends>, ReportService, SessionStore, SessionId) {
        setup_with(TestBackends::new(model), openai, serp).await
    }

    async fn setup_with(backends: Arc<TestBackends>, openai: &str, serp: &str) -> (Arc<TestBackends>, ReportService, SessionStore, SessionId) {
        let service = ReportService::new(backends.clone(), ModelSettings::default()).unwrap();
        let store = SessionStore::new(Duration::from_secs(60));
        let id = store.create().await;
        store.update(id, |s| s.credentials.apply(openai, serp)).await.unwrap();
        (backends, service, store, id)
    }

    fn three_replies(report: &str) -> ScriptedChatModel {
        ScriptedChatModel::new()
            .reply_text("insights")
            .reply_text("links")
            .reply_text(report)
    }

    #[test]
    fn test_check_ready_order() {
        let mut creds = Credentials::default();
        let prefs = StylePreferences::default();
        assert_eq!(check_ready(&creds, &prefs).unwrap_err(), MissingInput::OpenAiKey);

        creds.apply("sk", "");
        assert_eq!(check_ready(&creds, &prefs).unwrap_err(), MissingInput::SerpApiKey);

        creds.apply("", "serp");
        assert_eq!(check_ready(&creds, &prefs).unwrap_err(), MissingInput::Image);

        assert!(check_ready(&creds, &with_image(1)).is_ok());
    }

    #[tokio::test]
    async fn test_missing_inputs_make_no_remote_call() {
        for (openai, serp, prefs, expected) in [
            ("", "serp", with_image(1), MissingInput::OpenAiKey),
            ("sk", "", with_image(1), MissingInput::SerpApiKey),
            ("sk", "serp", StylePreferences::default(), MissingInput::Image),
        ] {
            let (backends, service, store, id) = setup(three_replies("r"), openai, serp).await;

            let err = service.generate(&store, id, prefs).await.unwrap_err();

            assert!(matches!(err, GenerateError::Rejected(StylistError::MissingInput(m)) if m == expected));
            assert_eq!(backends.built.load(Ordering::SeqCst), 0);
            assert_eq!(backends.model.call_count(), 0);
            assert_eq!(store.snapshot(id).await.unwrap().phase(), RunPhase::Empty);
        }
    }

    #[tokio::test]
    async fn test_success_stores_report_and_image() {
        let (_, service, store, id) = setup(three_replies("# Report A"), "sk", "serp").await;

        let stored = service.generate(&store, id, with_image(7)).await.unwrap();

        assert_eq!(stored.report, "# Report A");
        assert_eq!(stored.image, image(7));
        let session = store.snapshot(id).await.unwrap();
        assert_eq!(session.phase(), RunPhase::Ready);
        assert_eq!(session.result().unwrap().report, "# Report A");
    }

    #[tokio::test]
    async fn test_second_run_replaces_first() {
        let model = three_replies("# Report A")
            .reply_text("insights 2")
            .reply_text("links 2")
            .reply_text("# Report B");
        let (_, service, store, id) = setup(model, "sk", "serp").await;

        service.generate(&store, id, with_image(1)).await.unwrap();
        service.generate(&store, id, with_image(2)).await.unwrap();

        let result = store.snapshot(id).await.unwrap().result().unwrap();
        assert_eq!(result.report, "# Report B");
        assert_eq!(result.image, image(2));
    }

    #[tokio::test]
    async fn test_failure_keeps_previous_result() {
        let model = three_replies("# Report A").fail("network down");
        let (_, service, store, id) = setup(model, "sk", "serp").await;

        service.generate(&store, id, with_image(1)).await.unwrap();
        let err = service.generate(&store, id, with_image(2)).await.unwrap_err();

        match err {
            GenerateError::Failed(e) => assert_eq!(e.step(), Some(StepKind::VisualAnalysis)),
            other => panic!("unexpected error: {other:?}"),
        }
        let session = store.snapshot(id).await.unwrap();
        assert_eq!(session.phase(), RunPhase::Ready);
        assert_eq!(session.result().unwrap().report, "# Report A");
        assert_eq!(session.result().unwrap().image, image(1));
    }

    async fn wait_until_settled(store: &SessionStore, id: SessionId) -> Session {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let session = store.snapshot(id).await.unwrap();
                if session.phase() != RunPhase::Running {
                    return session;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("run never left Running")
    }

    #[tokio::test]
    async fn test_dropped_request_still_finishes_the_run() {
        let gate = Arc::new(Semaphore::new(0));
        let model = three_replies("# Report A")
            .reply_text("insights 2")
            .reply_text("links 2")
            .reply_text("# Report B");
        let (backends, service, store, id) =
            setup_with(TestBackends::gated(model, gate.clone()), "sk", "serp").await;
        let service = Arc::new(service);

        let request = tokio::spawn({
            let (service, store) = (service.clone(), store.clone());
            async move { service.generate(&store, id, with_image(1)).await }
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(store.snapshot(id).await.unwrap().phase(), RunPhase::Running);

        request.abort();
        assert!(request.await.unwrap_err().is_cancelled());

        gate.add_permits(3);
        let session = wait_until_settled(&store, id).await;
        assert_eq!(session.phase(), RunPhase::Ready);
        assert_eq!(session.result().unwrap().report, "# Report A");
        assert_eq!(backends.model.call_count(), 3);

        // The session accepts a new run and is no longer pinned against purging.
        gate.add_permits(3);
        let stored = service.generate(&store, id, with_image(2)).await.unwrap();
        assert_eq!(stored.report, "# Report B");
        store.purge_idle_at(std::time::Instant::now() + Duration::from_secs(120)).await;
        assert!(store.snapshot(id).await.is_err());
    }

    #[tokio::test]
    async fn test_dropped_request_with_failing_step_clears_running() {
        let gate = Arc::new(Semaphore::new(0));
        let model = ScriptedChatModel::new().fail("network down");
        let (_, service, store, id) =
            setup_with(TestBackends::gated(model, gate.clone()), "sk", "serp").await;
        let service = Arc::new(service);

        let request = tokio::spawn({
            let (service, store) = (service.clone(), store.clone());
            async move { service.generate(&store, id, with_image(1)).await }
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        request.abort();
        let _ = request.await;

        gate.add_permits(1);
        let session = wait_until_settled(&store, id).await;
        assert_eq!(session.phase(), RunPhase::Empty);
        assert!(session.result().is_none());
    }
}
