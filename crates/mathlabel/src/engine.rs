// this_file: crates/mathlabel/src/engine.rs

use std::sync::Arc;

use mathlabel_core::{
    element::{ElementOverrides, TextElementUpdate},
    types::{BlockLayout, BoxMetrics},
    ElementKind, FontMetrics, RasterSurface, Result, TextElement,
};
use mathlabel_export_svg::{SvgExporter, SvgNode};
use mathlabel_layout::{LayoutConfig, LayoutEngine};
use mathlabel_render_raster::{CancellationToken, RasterConfig, RasterRenderer, RefreshCallback, RenderPass};
use mathlabel_typeset::{EngineLoader, NoEngine, ReadyCallback, Typesetter};

use crate::Registry;

/// One label engine: the math adapter, every cache and the kind registry
///
/// Nothing here is global. Two engines share no state, so a host can run
/// several side by side and tests can start from scratch.
pub struct Engine {
    typesetter: Arc<Typesetter>,
    layout: LayoutEngine,
    raster: RasterRenderer,
    svg: SvgExporter,
    registry: Registry,
}

impl Engine {
    /// Start configuring an engine that measures text with `fonts`
    pub fn builder(fonts: Arc<dyn FontMetrics>) -> EngineBuilder {
        EngineBuilder::new(fonts)
    }

    /// Register the one-shot notification for when math becomes available
    ///
    /// The callback receives the math-element classifier so the host can
    /// pick out the elements that need measuring and drawing again.
    pub fn set_on_loaded(&self, callback: ReadyCallback) {
        self.typesetter.set_on_ready(callback);
    }

    /// Begin loading the math engine, without waiting
    pub fn ensure_loaded(&self) {
        self.typesetter.ensure_loaded();
    }

    /// Pick up a finished engine load; returns whether math is available
    pub fn poll(&self) -> bool {
        self.typesetter.poll()
    }

    pub fn is_loaded(&self) -> bool {
        self.typesetter.is_loaded()
    }

    pub fn clean(&self, kind: ElementKind, update: TextElementUpdate) -> TextElementUpdate {
        self.registry.resolve(kind).clean(update)
    }

    pub fn measure(
        &self,
        element: &TextElement,
        overrides: Option<&ElementOverrides>,
        max_width: Option<f32>,
    ) -> BoxMetrics {
        self.registry
            .resolve(element.kind)
            .measure(self, element, overrides, max_width)
    }

    pub fn layout(
        &self,
        element: &TextElement,
        overrides: Option<&ElementOverrides>,
        max_width: Option<f32>,
    ) -> Arc<BlockLayout> {
        self.registry
            .resolve(element.kind)
            .layout(self, element, overrides, max_width)
    }

    /// Draw `element`; math images that are not decoded yet arrive later
    /// through [`Engine::pump`] and trigger `refresh`
    pub fn render(
        &self,
        element: &TextElement,
        surface: &mut dyn RasterSurface,
        refresh: Option<RefreshCallback>,
        cancel: &CancellationToken,
    ) -> RenderPass {
        self.registry
            .resolve(element.kind)
            .render(self, element, surface, refresh, cancel)
    }

    pub fn render_vector(&self, target: &mut SvgNode, element: &TextElement) {
        self.registry
            .resolve(element.kind)
            .render_vector(self, target, element);
    }

    pub fn wrap(
        &self,
        element: &TextElement,
        container_width: f32,
        overrides: Option<&ElementOverrides>,
    ) -> String {
        self.registry
            .resolve(element.kind)
            .wrap(self, element, container_width, overrides)
    }

    pub fn restore(&self, element: TextElement) -> TextElement {
        self.registry.resolve(element.kind).restore(element)
    }

    /// Draw decoded math images that are ready, without waiting
    pub fn pump(&self, surface: &mut dyn RasterSurface) -> usize {
        self.raster.pump(surface)
    }

    /// Wait for every pending math image and draw it
    pub fn flush(&self, surface: &mut dyn RasterSurface) -> usize {
        self.raster.flush(surface)
    }

    pub fn typesetter(&self) -> &Arc<Typesetter> {
        &self.typesetter
    }

    pub fn layout_engine(&self) -> &LayoutEngine {
        &self.layout
    }

    pub fn raster(&self) -> &RasterRenderer {
        &self.raster
    }

    pub fn svg(&self) -> &SvgExporter {
        &self.svg
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Hit and miss counts for every cache
    pub fn cache_report(&self) -> String {
        format!(
            "{}\n{}\n{}",
            self.layout.cache_report(),
            self.raster.cache_report(),
            self.svg.cache_report()
        )
    }
}

/// Configures and creates an [`Engine`]
pub struct EngineBuilder {
    fonts: Arc<dyn FontMetrics>,
    loader: Option<Arc<dyn EngineLoader>>,
    layout_config: LayoutConfig,
    raster_config: RasterConfig,
    registry: Option<Registry>,
    svg_padding: Option<f32>,
}

impl EngineBuilder {
    pub fn new(fonts: Arc<dyn FontMetrics>) -> Self {
        Self {
            fonts,
            loader: None,
            layout_config: LayoutConfig::default(),
            raster_config: RasterConfig::default(),
            registry: None,
            svg_padding: None,
        }
    }

    /// How the math engine is obtained; without one math stays plain text
    pub fn with_loader(mut self, loader: Arc<dyn EngineLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    pub fn with_layout_config(mut self, config: LayoutConfig) -> Self {
        self.layout_config = config;
        self
    }

    pub fn with_raster_config(mut self, config: RasterConfig) -> Self {
        self.raster_config = config;
        self
    }

    pub fn with_registry(mut self, registry: Registry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn with_svg_padding(mut self, padding: f32) -> Self {
        self.svg_padding = Some(padding);
        self
    }

    /// Fails only if the image decode pool cannot be started
    pub fn build(self) -> Result<Engine> {
        let loader = self
            .loader
            .unwrap_or_else(|| Arc::new(NoEngine) as Arc<dyn EngineLoader>);
        let typesetter = Arc::new(Typesetter::new(loader));
        let layout = LayoutEngine::with_config(typesetter.clone(), self.fonts, self.layout_config);
        let raster = RasterRenderer::new(self.raster_config)?;
        let svg = match self.svg_padding {
            Some(padding) => SvgExporter::new().with_padding(padding),
            None => SvgExporter::new(),
        };
        Ok(Engine {
            typesetter,
            layout,
            raster,
            svg,
            registry: self.registry.unwrap_or_default(),
        })
    }
}
