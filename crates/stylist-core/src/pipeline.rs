//! The report pipeline.
//!
//! An ordered list of steps, each turning the accumulated
//! [`PipelineContext`] into the next one. The first failing step aborts the
//! run and is named in the error; later steps are never invoked.

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};

use crate::agent::Agent;
use crate::config::ModelSettings;
use crate::error::StylistResult;
use crate::image::UploadedImage;
use crate::llm::{ChatModel, LlmError, WebSearch};
use crate::preferences::StylePreferences;
use crate::prompts::{
    PromptLibrary, REPORT_GENERATOR_NAME, SEARCH_ASSISTANT_NAME, VISUAL_ANALYZER_NAME,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    VisualAnalysis,
    Search,
    Synthesis,
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::VisualAnalysis => "visual analysis",
            Self::Search => "web search",
            Self::Synthesis => "report synthesis",
        })
    }
}

/// Why a single step failed.
#[derive(Error, Debug)]
pub enum StepFailure {
    #[error(transparent)]
    Remote(#[from] LlmError),

    #[error("missing {0} from an earlier step")]
    MissingInput(&'static str),
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Report generation failed during {step}: {source}")]
    StepFailed {
        step: StepKind,
        #[source]
        source: StepFailure,
    },

    #[error("Pipeline finished without producing a report")]
    Incomplete,
}

impl PipelineError {
    /// The step that failed, if any.
    pub fn step(&self) -> Option<StepKind> {
        match self {
            Self::StepFailed { step, .. } => Some(*step),
            Self::Incomplete => None,
        }
    }
}

/// State threaded through the steps.
#[derive(Debug, Clone)]
pub struct PipelineContext {
    pub image: UploadedImage,
    pub preferences: StylePreferences,
    pub visual_insights: Option<String>,
    pub research_links: Option<String>,
    pub report: Option<String>,
}

impl PipelineContext {
    pub fn new(image: UploadedImage, preferences: StylePreferences) -> Self {
        Self {
            image,
            preferences: preferences.without_image(),
            visual_insights: None,
            research_links: None,
            report: None,
        }
    }
}

/// The three texts a completed run produced, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineResult {
    pub visual_insights: String,
    pub research_links: String,
    pub report: String,
}

#[async_trait]
pub trait Step: Send + Sync {
    fn kind(&self) -> StepKind;

    async fn run(&self, ctx: PipelineContext) -> Result<PipelineContext, StepFailure>;
}

pub struct Pipeline {
    steps: Vec<Box<dyn Step>>,
}

impl Pipeline {
    pub fn new(steps: Vec<Box<dyn Step>>) -> Self {
        Self { steps }
    }

    /// Visual analysis, then web search, then report synthesis.
    pub fn fashion_report(
        model: Arc<dyn ChatModel>,
        search: Arc<dyn WebSearch>,
        prompts: &PromptLibrary,
        settings: &ModelSettings,
    ) -> Self {
        let analyzer = Agent::new(
            VISUAL_ANALYZER_NAME,
            &settings.visual_model,
            prompts.visual_system.clone(),
            model.clone(),
        );
        let researcher = Agent::new(
            SEARCH_ASSISTANT_NAME,
            &settings.search_model,
            prompts.search_system.clone(),
            model.clone(),
        )
        .with_search(search, settings.max_tool_rounds);
        let writer = Agent::new(
            REPORT_GENERATOR_NAME,
            &settings.report_model,
            prompts.report_system.clone(),
            model,
        )
        .with_datetime();

        Self::new(vec![
            Box::new(VisualAnalysisStep {
                agent: analyzer,
                prompts: prompts.clone(),
            }),
            Box::new(SearchStep {
                agent: researcher,
                prompts: prompts.clone(),
            }),
            Box::new(SynthesisStep {
                agent: writer,
                prompts: prompts.clone(),
            }),
        ])
    }

    pub fn step_kinds(&self) -> Vec<StepKind> {
        self.steps.iter().map(|step| step.kind()).collect()
    }

    /// Run every step in order.
    pub async fn run(&self, mut ctx: PipelineContext) -> Result<PipelineResult, PipelineError> {
        for step in &self.steps {
            let kind = step.kind();
            info!(step = %kind, "Running pipeline step");

            ctx = step.run(ctx).await.map_err(|source| {
                error!(step = %kind, error = %source, "Pipeline step failed");
                PipelineError::StepFailed { step: kind, source }
            })?;
        }

        match (ctx.visual_insights, ctx.research_links, ctx.report) {
            (Some(visual_insights), Some(research_links), Some(report)) => Ok(PipelineResult {
                visual_insights,
                research_links,
                report,
            }),
            _ => Err(PipelineError::Incomplete),
        }
    }
}

/// Build the search-step prompt from the preferences and the visual
/// analysis; empty preference fields read "Not specified".
pub fn search_prompt(
    prompts: &PromptLibrary,
    preferences: &StylePreferences,
    visual_insights: &str,
) -> StylistResult<String> {
    let styles = preferences.styles_text();
    let colors = preferences.colors_text();
    prompts.search_prompt.render(&[
        ("preferred_styles", styles.as_str()),
        ("color_palette", colors.as_str()),
        ("fashion_goal", preferences.goal_text()),
        ("focus_area", preferences.focus_text()),
        ("visual_insights", visual_insights),
    ])
}

/// Build the synthesis-step prompt from both earlier outputs.
pub fn report_prompt(
    prompts: &PromptLibrary,
    visual_insights: &str,
    research_links: &str,
) -> StylistResult<String> {
    prompts.report_prompt.render(&[
        ("visual_insights", visual_insights),
        ("research_links", research_links),
    ])
}

struct VisualAnalysisStep {
    agent: Agent,
    prompts: PromptLibrary,
}

#[async_trait]
impl Step for VisualAnalysisStep {
    fn kind(&self) -> StepKind {
        StepKind::VisualAnalysis
    }

    async fn run(&self, mut ctx: PipelineContext) -> Result<PipelineContext, StepFailure> {
        let task = self.prompts.visual_task.render(&[]).map_err(LlmError::from)?;
        let insights = self
            .agent
            .run(&task, std::slice::from_ref(&ctx.image))
            .await?;
        ctx.visual_insights = Some(insights);
        Ok(ctx)
    }
}

struct SearchStep {
    agent: Agent,
    prompts: PromptLibrary,
}

#[async_trait]
impl Step for SearchStep {
    fn kind(&self) -> StepKind {
        StepKind::Search
    }

    async fn run(&self, mut ctx: PipelineContext) -> Result<PipelineContext, StepFailure> {
        let insights = ctx
            .visual_insights
            .as_deref()
            .ok_or(StepFailure::MissingInput("visual insights"))?;
        let prompt =
            search_prompt(&self.prompts, &ctx.preferences, insights).map_err(LlmError::from)?;
        let links = self.agent.run(&prompt, &[]).await?;
        ctx.research_links = Some(links);
        Ok(ctx)
    }
}

struct SynthesisStep {
    agent: Agent,
    prompts: PromptLibrary,
}

#[async_trait]
impl Step for SynthesisStep {
    fn kind(&self) -> StepKind {
        StepKind::Synthesis
    }

    async fn run(&self, mut ctx: PipelineContext) -> Result<PipelineContext, StepFailure> {
        let insights = ctx
            .visual_insights
            .as_deref()
            .ok_or(StepFailure::MissingInput("visual insights"))?;
        let links = ctx
            .research_links
            .as_deref()
            .ok_or(StepFailure::MissingInput("research links"))?;

        let prompt = report_prompt(&self.prompts, insights, links).map_err(LlmError::from)?;
        let report = self.agent.run(&prompt, &[]).await?;
        ctx.report = Some(report);
        Ok(ctx)
    }
}
