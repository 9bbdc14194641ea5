//! Per-kind dispatch for the label entry points

use std::collections::HashMap;
use std::sync::Arc;

use mathlabel_core::{
    element::{ElementOverrides, TextElementUpdate},
    types::{BlockLayout, BoxMetrics},
    ElementKind, RasterSurface, TextElement,
};
use mathlabel_export_svg::SvgNode;
use mathlabel_render_raster::{CancellationToken, RefreshCallback, RenderPass};

use crate::{Engine, MathText, PlainText};

/// Everything a host can ask of one kind of label
pub trait TextLike: Send + Sync {
    /// The kind this implementation handles
    fn kind(&self) -> ElementKind;

    /// Normalize an update before it is applied
    fn clean(&self, update: TextElementUpdate) -> TextElementUpdate;

    /// Full layout of the element
    fn layout(
        &self,
        cx: &Engine,
        element: &TextElement,
        overrides: Option<&ElementOverrides>,
        max_width: Option<f32>,
    ) -> Arc<BlockLayout>;

    /// The element's outer box
    fn measure(
        &self,
        cx: &Engine,
        element: &TextElement,
        overrides: Option<&ElementOverrides>,
        max_width: Option<f32>,
    ) -> BoxMetrics {
        self.layout(cx, element, overrides, max_width).metrics
    }

    fn render(
        &self,
        cx: &Engine,
        element: &TextElement,
        surface: &mut dyn RasterSurface,
        refresh: Option<RefreshCallback>,
        cancel: &CancellationToken,
    ) -> RenderPass;

    /// Append the element's vector form to `target`
    fn render_vector(&self, cx: &Engine, target: &mut SvgNode, element: &TextElement);

    /// The element's source re-flowed for a container `container_width` wide
    fn wrap(
        &self,
        cx: &Engine,
        element: &TextElement,
        container_width: f32,
        overrides: Option<&ElementOverrides>,
    ) -> String;

    /// Bring a freshly loaded element up to date
    fn restore(&self, element: TextElement) -> TextElement {
        element
    }
}

/// Kind-to-implementation table with a mandatory default
#[derive(Clone)]
pub struct Registry {
    default: Arc<dyn TextLike>,
    by_kind: HashMap<ElementKind, Arc<dyn TextLike>>,
}

impl Registry {
    /// An empty table; every kind resolves to `default`
    pub fn new(default: Arc<dyn TextLike>) -> Self {
        Self {
            default,
            by_kind: HashMap::new(),
        }
    }

    /// Route the implementation's kind to it, replacing any earlier entry
    pub fn register(&mut self, implementation: Arc<dyn TextLike>) {
        let kind = implementation.kind();
        if self.by_kind.insert(kind, implementation).is_some() {
            log::debug!("replaced implementation for {:?}", kind);
        }
    }

    pub fn with(mut self, implementation: Arc<dyn TextLike>) -> Self {
        self.register(implementation);
        self
    }

    pub fn resolve(&self, kind: ElementKind) -> &dyn TextLike {
        match self.by_kind.get(&kind) {
            Some(implementation) => &**implementation,
            None => &*self.default,
        }
    }

    pub fn default_implementation(&self) -> &dyn TextLike {
        &*self.default
    }
}

impl Default for Registry {
    /// Plain text as the default, math registered
    fn default() -> Self {
        Registry::new(Arc::new(PlainText)).with(Arc::new(MathText))
    }
}
