//! Deck generator: outline, research, synthesis and rendering
//!
//! One [`Generator::generate`] call walks the whole pipeline sequentially:
//!
//! 1. resolve the style and open a fresh document
//! 2. ask the provider for a [`PresentationOutline`] (fatal on failure)
//! 3. per slide topic: pace, research, synthesize a [`SlideConfig`], fetch an
//!    optional image and render it
//! 4. append the references slide and save
//!
//! A failure inside step 3 only costs that slide: it is replaced by a
//! placeholder and the run continues. Downloaded images live in a per-run
//! temporary directory that is removed on every exit path.

use crate::ai::{generate_structure, AIManager, LLMProvider, PromptBuilder};
use crate::config::Config;
use crate::error::{Error, Result, ResultExt};
use crate::progress::ProgressTracker;
use crate::render::{apply_style, DeckDocument, ImageAsset, OutputFormat, SlideRenderer};
use crate::research::{OfflineResearcher, Researcher, WebResearcher};
use crate::types::{PresentationOutline, PresentationSection, SlideConfig};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tracing::{debug, info, warn};

/// Builds the empty document each run renders into
pub type DocumentFactory = Box<dyn Fn() -> Box<dyn DeckDocument> + Send + Sync>;

/// Tunables for one generator
#[derive(Debug, Clone)]
pub struct GeneratorSettings {
    /// Pause before each slide with network providers
    pub pacing_delay: Duration,
    /// Most research characters embedded in a slide prompt
    pub context_char_budget: usize,
    /// Also consult the encyclopedia source
    pub include_secondary: bool,
    /// Extra image download attempts
    pub image_retries: u32,
    /// Base directory for the per-run image directory
    pub temp_dir: Option<PathBuf>,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl GeneratorSettings {
    /// Settings from the `generation` and `research` sections
    pub fn from_config(config: &Config) -> Self {
        Self {
            pacing_delay: config.generation.pacing_delay(),
            context_char_budget: config.generation.context_char_budget,
            include_secondary: config.research.include_secondary,
            image_retries: config.research.image_download_retries,
            temp_dir: config.generation.temp_dir.clone(),
        }
    }

    /// Override the pacing delay
    pub fn with_pacing_delay(mut self, delay: Duration) -> Self {
        self.pacing_delay = delay;
        self
    }
}

/// Per-invocation choices made on the command line
#[derive(Debug, Clone, Copy, Default)]
pub struct GeneratorOptions {
    /// Output document format
    pub format: OutputFormat,
    /// Skip web research entirely
    pub no_research: bool,
    /// Override `generation.pacing_delay_secs`
    pub pacing_delay: Option<Duration>,
}

/// Unique citations in first-seen order
///
/// Entries are trimmed and blank entries are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CitationSet {
    seen: HashSet<String>,
    ordered: Vec<String>,
}

impl CitationSet {
    /// Empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one citation; returns false for blanks and duplicates
    pub fn insert(&mut self, citation: &str) -> bool {
        let citation = citation.trim();
        if citation.is_empty() || !self.seen.insert(citation.to_string()) {
            return false;
        }
        self.ordered.push(citation.to_string());
        true
    }

    /// Add every citation of a slide
    pub fn extend<I, S>(&mut self, citations: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for citation in citations {
            self.insert(citation.as_ref());
        }
    }

    /// Number of unique citations
    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    /// True when nothing was collected
    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    /// Citations in first-seen order
    pub fn as_slice(&self) -> &[String] {
        &self.ordered
    }
}

/// State owned by one run: the document, the image directory and citations
struct DeckRun {
    renderer: SlideRenderer,
    images: TempDir,
    citations: CitationSet,
}

impl DeckRun {
    fn image_path(&self, section: usize, slide: usize) -> PathBuf {
        self.images
            .path()
            .join(format!("section_{}_slide_{}.jpg", section, slide))
    }

    fn close(self) {
        let dir = self.images.path().to_path_buf();
        if let Err(e) = self.images.close() {
            warn!("Failed to remove temporary images in {}: {}", dir.display(), e);
        }
    }
}

/// Presentation generator
pub struct Generator {
    llm: Box<dyn LLMProvider>,
    researcher: Box<dyn Researcher>,
    documents: DocumentFactory,
    prompts: PromptBuilder,
    settings: GeneratorSettings,
    progress: Arc<ProgressTracker>,
}

impl fmt::Debug for Generator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Generator")
            .field("llm", &self.llm)
            .field("researcher", &self.researcher)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl Generator {
    /// Create a generator writing PowerPoint files
    pub fn new(
        llm: Box<dyn LLMProvider>,
        researcher: Box<dyn Researcher>,
        settings: GeneratorSettings,
    ) -> Self {
        let prompts = PromptBuilder::new().with_context_budget(settings.context_char_budget);
        Self {
            llm,
            researcher,
            documents: Box::new(|| OutputFormat::Pptx.new_document()),
            prompts,
            settings,
            progress: Arc::new(ProgressTracker::disabled()),
        }
    }

    /// Build provider and researcher from configuration
    ///
    /// Fails before any network call when the provider is unknown or has no
    /// credential.
    pub fn from_config(
        config: &Config,
        provider: Option<&str>,
        model: Option<&str>,
        options: GeneratorOptions,
    ) -> Result<Self> {
        let llm = AIManager::new(config.ai.clone()).create_provider(provider, model)?;

        let researcher: Box<dyn Researcher> = if options.no_research {
            info!("Web research disabled");
            Box::new(OfflineResearcher)
        } else {
            Box::new(WebResearcher::new(config.research.clone()))
        };

        let mut settings = GeneratorSettings::from_config(config);
        if let Some(delay) = options.pacing_delay {
            settings = settings.with_pacing_delay(delay);
        }

        let format = options.format;
        Ok(Self::new(llm, researcher, settings)
            .with_document_factory(Box::new(move || format.new_document())))
    }

    /// Render into documents built by `factory`
    pub fn with_document_factory(mut self, factory: DocumentFactory) -> Self {
        self.documents = factory;
        self
    }

    /// Report progress through `progress`
    pub fn with_progress(mut self, progress: Arc<ProgressTracker>) -> Self {
        self.progress = progress;
        self
    }

    /// Provider used for outlines and slides
    pub fn provider(&self) -> &dyn LLMProvider {
        self.llm.as_ref()
    }

    /// Generate a deck about `topic` and save it to `output_file`
    ///
    /// `slides_count` is a target; the outline decides the real count.
    /// Unknown styles fall back to the default style.
    pub async fn generate(
        &self,
        topic: &str,
        style: &str,
        output_file: &Path,
        slides_count: usize,
        language: &str,
    ) -> Result<PathBuf> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(Error::Validation("topic must not be empty".to_string()));
        }
        if slides_count == 0 {
            return Err(Error::Validation("slides_count must be at least 1".to_string()));
        }

        info!("Generating presentation about '{}' ({} slides, {})", topic, slides_count, language);
        let run = self.start_run(style)?;

        let outline = match self.generate_outline(topic, slides_count, language).await {
            Ok(outline) => outline,
            Err(e) => {
                self.progress.finish_with_error("outline generation failed");
                run.close();
                return Err(e.context("generating outline"));
            }
        };

        self.finish_run(run, &outline, topic, style, output_file, language)
            .await
    }

    /// Render a caller-supplied outline, skipping outline generation
    pub async fn generate_from_outline(
        &self,
        outline: &PresentationOutline,
        topic: &str,
        style: &str,
        output_file: &Path,
        language: &str,
    ) -> Result<PathBuf> {
        outline.validate()?;
        let topic = match topic.trim() {
            "" => outline.title.as_str(),
            t => t,
        };

        info!("Rendering supplied outline '{}'", outline.title);
        let run = self.start_run(style)?;
        self.finish_run(run, outline, topic, style, output_file, language)
            .await
    }

    /// Ask the provider for the deck outline
    pub async fn generate_outline(
        &self,
        topic: &str,
        slides_count: usize,
        language: &str,
    ) -> Result<PresentationOutline> {
        let prompt = self.prompts.outline_prompt(topic, slides_count, language);
        let outline: PresentationOutline =
            generate_structure(self.llm.as_ref(), &prompt, "").await?;
        outline.validate().map_err(|e| {
            Error::content_generation(self.llm.name(), format!("unusable outline: {}", e))
        })?;

        info!(
            "Outline '{}': {} sections, {} slides",
            outline.title,
            outline.sections.len(),
            outline.total_slides()
        );
        Ok(outline)
    }

    fn start_run(&self, style: &str) -> Result<DeckRun> {
        let renderer = SlideRenderer::new((self.documents)(), apply_style(style));

        let mut builder = tempfile::Builder::new();
        builder.prefix("autoppt-images-");
        let images = match &self.settings.temp_dir {
            Some(base) => {
                std::fs::create_dir_all(base)?;
                builder.tempdir_in(base)?
            }
            None => builder.tempdir()?,
        };
        debug!("Temporary images go to {}", images.path().display());

        Ok(DeckRun {
            renderer,
            images,
            citations: CitationSet::new(),
        })
    }

    async fn finish_run(
        &self,
        mut run: DeckRun,
        outline: &PresentationOutline,
        topic: &str,
        style: &str,
        output_file: &Path,
        language: &str,
    ) -> Result<PathBuf> {
        let result = self
            .render_outline(&mut run, outline, topic, style, output_file, language)
            .await;
        match &result {
            Ok(_) => self.progress.finish(),
            Err(e) => self.progress.finish_with_error(&e.to_string()),
        }
        run.close();
        result
    }

    async fn render_outline(
        &self,
        run: &mut DeckRun,
        outline: &PresentationOutline,
        topic: &str,
        style: &str,
        output_file: &Path,
        language: &str,
    ) -> Result<PathBuf> {
        self.progress.init(outline.total_slides());
        run.renderer
            .add_title_slide(&outline.title, &format!("Topic: {}", topic))?;

        let system_prompt = self.prompts.slide_system_prompt(style, language);

        for (section_index, section) in outline.sections.iter().enumerate() {
            info!("Section {}: {}", section_index + 1, section.title);
            run.renderer.add_section_header(&section.title)?;

            for (slide_index, slide_title) in section.slides.iter().enumerate() {
                self.progress.set_slide(&section.title, slide_title);
                self.pace().await;

                let image_path = run.image_path(section_index, slide_index);
                let built = self
                    .build_slide(
                        &mut run.renderer,
                        topic,
                        section,
                        slide_title,
                        &system_prompt,
                        language,
                        &image_path,
                    )
                    .await;

                match built {
                    Ok(slide) => {
                        run.citations.extend(&slide.citations);
                        self.progress.slide_done(true);
                    }
                    Err(e) => {
                        self.progress.suspend(|| {
                            warn!("Slide '{}' failed, adding placeholder: {}", slide_title, e)
                        });
                        run.renderer.add_placeholder_slide(slide_title, &e.to_string())?;
                        self.progress.slide_done(false);
                    }
                }
            }
        }

        if run.renderer.add_citations_slide(run.citations.as_slice())?.is_none() {
            debug!("No citations collected, skipping references slide");
        }

        run.renderer
            .save(output_file)
            .context("saving presentation")?;
        info!(
            "Presentation with {} slides written to {}",
            run.renderer.slide_count(),
            output_file.display()
        );
        Ok(output_file.to_path_buf())
    }

    /// Research, synthesize and render one slide
    #[allow(clippy::too_many_arguments)]
    async fn build_slide(
        &self,
        renderer: &mut SlideRenderer,
        topic: &str,
        section: &PresentationSection,
        slide_title: &str,
        system_prompt: &str,
        language: &str,
        image_path: &Path,
    ) -> Result<SlideConfig> {
        let query = format!("{} {} {}", slide_title, section.title, topic);
        let context = self
            .researcher
            .gather_context(&[query], self.settings.include_secondary)
            .await;
        debug!("Research context for '{}': {} chars", slide_title, context.len());

        let prompt = self
            .prompts
            .slide_prompt(slide_title, &section.title, topic, &context, language);
        let slide: SlideConfig = generate_structure(self.llm.as_ref(), &prompt, system_prompt)
            .await
            .with_context(|| format!("synthesizing '{}'", slide_title))?;

        let image = match slide.image_query() {
            Some(query) => self.fetch_image(query, image_path).await,
            None => None,
        };

        let layout = renderer.render_slide(&slide, image.as_ref())?;
        debug!("Slide '{}' rendered with {:?} layout", slide_title, layout);
        Ok(slide)
    }

    /// Best-effort image lookup; any failure means no image
    async fn fetch_image(&self, query: &str, dest: &Path) -> Option<ImageAsset> {
        let hit = match self.researcher.search_images(query, 1).await {
            Ok(hits) => hits.into_iter().next(),
            Err(e) => {
                debug!("Image search failed for '{}': {}", query, e);
                None
            }
        }?;

        if let Err(e) = self
            .researcher
            .download_image(&hit.image, dest, self.settings.image_retries)
            .await
        {
            warn!("Image download failed for '{}': {}", query, e);
            return None;
        }

        match ImageAsset::load(dest) {
            Ok(image) => Some(image),
            Err(e) => {
                warn!("Downloaded image for '{}' is unusable: {}", query, e);
                None
            }
        }
    }

    /// Fixed pause before each slide; skipped for offline providers
    async fn pace(&self) {
        let delay = self.settings.pacing_delay;
        if self.llm.is_offline() || delay.is_zero() {
            return;
        }
        self.progress
            .set_status(&format!("Waiting {}s to respect rate limits...", delay.as_secs()));
        debug!("Pacing for {:?}", delay);
        tokio::time::sleep(delay).await;
    }
}
