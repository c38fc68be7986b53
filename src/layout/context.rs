/*!
 * Shared collaborators for layout.
 *
 * A `LayoutContext` owns the measurer, font provider, tokenizer registry and
 * face sampler factory. The tokenizer and face sampler are constructed on
 * first use and then reused by every layout that shares the context. Racing
 * callers observe a single construction.
 */

use log::debug;
use once_cell::sync::OnceCell;
use std::fmt;
use std::sync::Arc;

use super::tokenizer::{Tokenizer, TokenizerRegistry};
use crate::errors::CollaboratorError;
use crate::providers::{CandidateFontProvider, CellWidthMeasurer, FaceSampler, FontProvider, TextMeasurer};

/// Builds a face sampler, or reports why it cannot be built
pub type FaceSamplerFactory = Box<dyn Fn() -> Result<Arc<dyn FaceSampler>, CollaboratorError> + Send + Sync>;

pub struct LayoutContext {
    measurer: Arc<dyn TextMeasurer>,
    font_provider: Arc<dyn FontProvider>,
    tokenizers: TokenizerRegistry,
    face_sampler_factory: Option<FaceSamplerFactory>,
    tokenizer: OnceCell<Option<Arc<dyn Tokenizer>>>,
    face_sampler: OnceCell<Option<Arc<dyn FaceSampler>>>,
}

impl fmt::Debug for LayoutContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayoutContext")
            .field("measurer", &self.measurer)
            .field("font_provider", &self.font_provider)
            .field("tokenizers", &self.tokenizers)
            .field("has_face_sampler", &self.face_sampler_factory.is_some())
            .finish()
    }
}

impl Default for LayoutContext {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl LayoutContext {
    pub fn builder() -> LayoutContextBuilder {
        LayoutContextBuilder::default()
    }

    pub fn measurer(&self) -> &dyn TextMeasurer {
        self.measurer.as_ref()
    }

    pub fn font_provider(&self) -> &dyn FontProvider {
        self.font_provider.as_ref()
    }

    pub fn tokenizers(&self) -> &TokenizerRegistry {
        &self.tokenizers
    }

    /// The probed tokenizer strategy, or `None` for the regex fallback.
    ///
    /// The first caller's `preferred` ranking decides; later calls reuse its outcome.
    pub fn tokenizer(&self, preferred: &[String]) -> Option<Arc<dyn Tokenizer>> {
        self.tokenizer
            .get_or_init(|| self.tokenizers.probe(preferred))
            .clone()
    }

    /// The face sampler, constructed on first use
    pub fn face_sampler(&self) -> Option<Arc<dyn FaceSampler>> {
        self.face_sampler
            .get_or_init(|| {
                let factory = self.face_sampler_factory.as_ref()?;
                match factory() {
                    Ok(sampler) => {
                        debug!("Face sampler '{}' ready", sampler.name());
                        Some(sampler)
                    }
                    Err(e) => {
                        debug!("Face sampler unavailable, placement will ignore faces: {}", e);
                        None
                    }
                }
            })
            .clone()
    }
}

/// Builder for `LayoutContext`; unset collaborators use the reference implementations
#[derive(Default)]
pub struct LayoutContextBuilder {
    measurer: Option<Arc<dyn TextMeasurer>>,
    font_provider: Option<Arc<dyn FontProvider>>,
    tokenizers: TokenizerRegistry,
    face_sampler_factory: Option<FaceSamplerFactory>,
}

impl LayoutContextBuilder {
    pub fn measurer(mut self, measurer: Arc<dyn TextMeasurer>) -> Self {
        self.measurer = Some(measurer);
        self
    }

    pub fn font_provider(mut self, provider: Arc<dyn FontProvider>) -> Self {
        self.font_provider = Some(provider);
        self
    }

    pub fn tokenizers(mut self, registry: TokenizerRegistry) -> Self {
        self.tokenizers = registry;
        self
    }

    /// Use an already constructed face sampler
    pub fn face_sampler(self, sampler: Arc<dyn FaceSampler>) -> Self {
        self.face_sampler_factory(move || Ok(sampler.clone()))
    }

    /// Construct the face sampler lazily on first use
    pub fn face_sampler_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn FaceSampler>, CollaboratorError> + Send + Sync + 'static,
    {
        self.face_sampler_factory = Some(Box::new(factory));
        self
    }

    pub fn build(self) -> LayoutContext {
        LayoutContext {
            measurer: self.measurer.unwrap_or_else(|| Arc::new(CellWidthMeasurer::default())),
            font_provider: self
                .font_provider
                .unwrap_or_else(|| Arc::new(CandidateFontProvider::new())),
            tokenizers: self.tokenizers,
            face_sampler_factory: self.face_sampler_factory,
            tokenizer: OnceCell::new(),
            face_sampler: OnceCell::new(),
        }
    }
}
