//! The built-in label kinds

use std::sync::Arc;

use mathlabel_core::{
    element::{ElementOverrides, TextElementUpdate},
    types::BlockLayout,
    ElementKind, FontFamily, MathOpts, RasterSurface, TextElement,
};
use mathlabel_export_svg::SvgNode;
use mathlabel_render_raster::{CancellationToken, RefreshCallback, RenderPass};

use crate::{Engine, TextLike};

fn source<'a>(element: &'a TextElement, overrides: Option<&'a ElementOverrides>) -> &'a str {
    overrides
        .and_then(|o| o.text.as_deref())
        .unwrap_or(&element.text)
}

/// Width left for text once the container padding is taken off both sides
fn inner_width(cx: &Engine, container_width: f32) -> f32 {
    (container_width - cx.layout_engine().config().bound_text_padding * 2.0).max(0.0)
}

/// Literal text; delimiters mean nothing here
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainText;

impl TextLike for PlainText {
    fn kind(&self) -> ElementKind {
        ElementKind::Text
    }

    fn clean(&self, update: TextElementUpdate) -> TextElementUpdate {
        update
    }

    fn layout(
        &self,
        cx: &Engine,
        element: &TextElement,
        overrides: Option<&ElementOverrides>,
        max_width: Option<f32>,
    ) -> Arc<BlockLayout> {
        let style = element.style(overrides);
        cx.layout_engine()
            .measure_plain(source(element, overrides), &style, max_width)
    }

    fn render(
        &self,
        cx: &Engine,
        element: &TextElement,
        surface: &mut dyn RasterSurface,
        refresh: Option<RefreshCallback>,
        cancel: &CancellationToken,
    ) -> RenderPass {
        let layout = self.layout(cx, element, None, None);
        cx.raster()
            .render(&layout, &element.style(None), surface, refresh, cancel)
    }

    fn render_vector(&self, cx: &Engine, target: &mut SvgNode, element: &TextElement) {
        let layout = self.layout(cx, element, None, None);
        cx.svg()
            .append_to(target, &element.text, ElementKind::Text, &layout, &element.style(None));
    }

    fn wrap(
        &self,
        cx: &Engine,
        element: &TextElement,
        container_width: f32,
        overrides: Option<&ElementOverrides>,
    ) -> String {
        let text = overrides
            .and_then(|o| o.text.as_deref())
            .unwrap_or(&element.original_text);
        cx.layout_engine().wrap_plain_text(
            text,
            &element.style(overrides),
            inner_width(cx, container_width),
        )
    }
}

/// Text with embedded math
#[derive(Debug, Clone, Copy, Default)]
pub struct MathText;

impl TextLike for MathText {
    fn kind(&self) -> ElementKind {
        ElementKind::Math
    }

    /// Pin the math font and complete the options bag
    fn clean(&self, mut update: TextElementUpdate) -> TextElementUpdate {
        update.font_family = Some(FontFamily::MATH);
        let patch = update.text_opts.unwrap_or_default();
        update.text_opts = Some(MathOpts::ensure(&patch).into());
        update
    }

    fn layout(
        &self,
        cx: &Engine,
        element: &TextElement,
        overrides: Option<&ElementOverrides>,
        max_width: Option<f32>,
    ) -> Arc<BlockLayout> {
        let style = element.style(overrides);
        cx.layout_engine()
            .measure(source(element, overrides), &style, max_width)
    }

    fn render(
        &self,
        cx: &Engine,
        element: &TextElement,
        surface: &mut dyn RasterSurface,
        refresh: Option<RefreshCallback>,
        cancel: &CancellationToken,
    ) -> RenderPass {
        let layout = self.layout(cx, element, None, None);
        cx.raster()
            .render(&layout, &element.style(None), surface, refresh, cancel)
    }

    fn render_vector(&self, cx: &Engine, target: &mut SvgNode, element: &TextElement) {
        let layout = self.layout(cx, element, None, None);
        cx.svg()
            .append_to(target, &element.text, ElementKind::Math, &layout, &element.style(None));
    }

    /// Wraps the unwrapped source, so repeated wraps never compound
    fn wrap(
        &self,
        cx: &Engine,
        element: &TextElement,
        container_width: f32,
        overrides: Option<&ElementOverrides>,
    ) -> String {
        let text = overrides
            .and_then(|o| o.text.as_deref())
            .unwrap_or(&element.original_text);
        cx.layout_engine().wrap(
            text,
            &element.style(overrides),
            inner_width(cx, container_width),
        )
    }

    fn restore(&self, mut element: TextElement) -> TextElement {
        element.font_family = FontFamily::MATH;
        if element.original_text.is_empty() {
            element.original_text = element.text.clone();
        }
        element
    }
}
