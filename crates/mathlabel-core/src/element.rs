//! Persisted label elements and their math options
//!
//! The element is the unit a host application stores and hands back. Only
//! the fields this workspace reads are modelled; the options bag keeps its
//! persisted shape (`useTex`, `mathOnly`) so it survives save and restore
//! unchanged.

use serde::{Deserialize, Serialize};

use crate::{types::Notation, types::TextAlign, FontFamily, LabelStyle};

/// The closed set of label kinds a registry can dispatch on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    /// Literal text only, the default implementation
    #[default]
    Text,
    /// Mixed text and math
    Math,
}

impl ElementKind {
    pub fn is_math(self) -> bool {
        self == ElementKind::Math
    }
}

/// Classify an element once; hosts pass this predicate around instead of
/// re-deriving the answer at each call site
pub fn is_math_element(element: &TextElement) -> bool {
    element.kind.is_math()
}

/// Notation and math-only flag for one element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MathOpts {
    #[serde(rename = "useTex", with = "use_tex")]
    pub notation: Notation,
    pub math_only: bool,
}

impl Default for MathOpts {
    fn default() -> Self {
        Self {
            notation: Notation::Tex,
            math_only: false,
        }
    }
}

impl MathOpts {
    /// Overlay the fields present in `patch`
    pub fn patched(self, patch: &MathOptsPatch) -> Self {
        Self {
            notation: patch.notation.unwrap_or(self.notation),
            math_only: patch.math_only.unwrap_or(self.math_only),
        }
    }

    /// Fill missing fields from the defaults
    pub fn ensure(patch: &MathOptsPatch) -> Self {
        Self::default().patched(patch)
    }
}

/// A partial options bag, as found in updates and older documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MathOptsPatch {
    #[serde(
        rename = "useTex",
        with = "use_tex_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub notation: Option<Notation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub math_only: Option<bool>,
}

impl From<MathOpts> for MathOptsPatch {
    fn from(opts: MathOpts) -> Self {
        Self {
            notation: Some(opts.notation),
            math_only: Some(opts.math_only),
        }
    }
}

/// Notation is persisted as the `useTex` boolean
mod use_tex {
    use crate::types::Notation;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(notation: &Notation, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_bool(notation.uses_tex())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Notation, D::Error> {
        Ok(Notation::from_use_tex(bool::deserialize(d)?))
    }
}

mod use_tex_opt {
    use crate::types::Notation;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(notation: &Option<Notation>, s: S) -> Result<S::Ok, S::Error> {
        match notation {
            Some(n) => s.serialize_bool(n.uses_tex()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Notation>, D::Error> {
        Ok(Option::<bool>::deserialize(d)?.map(Notation::from_use_tex))
    }
}

/// A label as stored by the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextElement {
    pub id: String,
    #[serde(rename = "subtype", default)]
    pub kind: ElementKind,
    /// Displayed source, possibly wrapped
    pub text: String,
    /// Source before wrapping
    pub original_text: String,
    pub font_size: f32,
    pub font_family: FontFamily,
    pub stroke_color: String,
    pub text_align: TextAlign,
    /// 0 to 100
    pub opacity: f32,
    #[serde(default)]
    pub text_opts: MathOpts,
}

impl TextElement {
    /// A plain-text element with default styling
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            id: id.into(),
            kind: ElementKind::Text,
            original_text: text.clone(),
            text,
            font_size: 20.0,
            font_family: FontFamily::default(),
            stroke_color: "#000000".to_string(),
            text_align: TextAlign::Left,
            opacity: 100.0,
            text_opts: MathOpts::default(),
        }
    }

    /// A math element; the font family is pinned
    pub fn math(id: impl Into<String>, text: impl Into<String>, opts: MathOpts) -> Self {
        Self {
            kind: ElementKind::Math,
            font_family: FontFamily::MATH,
            text_opts: opts,
            ..Self::new(id, text)
        }
    }

    pub fn with_font_size(mut self, font_size: f32) -> Self {
        self.font_size = font_size;
        self
    }

    pub fn with_align(mut self, align: TextAlign) -> Self {
        self.text_align = align;
        self
    }

    /// Style with `overrides` applied on top of the stored fields
    pub fn style(&self, overrides: Option<&ElementOverrides>) -> LabelStyle {
        let font_size = overrides
            .and_then(|o| o.font_size)
            .unwrap_or(self.font_size);
        let opts = match overrides.and_then(|o| o.text_opts.as_ref()) {
            Some(patch) => self.text_opts.patched(patch),
            None => self.text_opts,
        };
        LabelStyle {
            font_size,
            font_family: self.font_family,
            stroke_color: self.stroke_color.clone(),
            text_align: self.text_align,
            opacity: (self.opacity / 100.0).clamp(0.0, 1.0),
            opts,
        }
    }
}

/// Pending changes a host wants measured or wrapped before committing them
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementOverrides {
    pub font_size: Option<f32>,
    pub text: Option<String>,
    pub text_opts: Option<MathOptsPatch>,
}

/// A partial update passed through `clean` before it is applied
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TextElementUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<FontFamily>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_opts: Option<MathOptsPatch>,
}

impl TextElementUpdate {
    /// Apply the update to an element
    pub fn apply_to(&self, element: &mut TextElement) {
        if let Some(text) = &self.text {
            element.text = text.clone();
        }
        if let Some(original) = &self.original_text {
            element.original_text = original.clone();
        }
        if let Some(size) = self.font_size {
            element.font_size = size;
        }
        if let Some(family) = self.font_family {
            element.font_family = family;
        }
        if let Some(patch) = &self.text_opts {
            element.text_opts = element.text_opts.patched(patch);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opts_persist_as_use_tex() {
        let opts = MathOpts {
            notation: Notation::AsciiMath,
            math_only: true,
        };
        let json = serde_json::to_string(&opts).unwrap();
        assert_eq!(json, r#"{"useTex":false,"mathOnly":true}"#);
        let back: MathOpts = serde_json::from_str(&json).unwrap();
        assert_eq!(back, opts);
    }

    #[test]
    fn test_missing_opts_fields_use_defaults() {
        let opts: MathOpts = serde_json::from_str(r#"{"mathOnly":true}"#).unwrap();
        assert_eq!(opts.notation, Notation::Tex);
        assert!(opts.math_only);

        let patch: MathOptsPatch = serde_json::from_str(r#"{"useTex":false}"#).unwrap();
        let ensured = MathOpts::ensure(&patch);
        assert_eq!(ensured.notation, Notation::AsciiMath);
        assert!(!ensured.math_only);
    }

    #[test]
    fn test_element_round_trips() {
        let element = TextElement::math(
            "e1",
            "a \\(x\\)",
            MathOpts {
                notation: Notation::Tex,
                math_only: false,
            },
        );
        let json = serde_json::to_string(&element).unwrap();
        assert!(json.contains(r#""subtype":"math""#));
        assert!(json.contains(r#""originalText":"a \\(x\\)""#));
        let back: TextElement = serde_json::from_str(&json).unwrap();
        assert_eq!(back, element);
    }

    #[test]
    fn test_style_applies_overrides() {
        let element = TextElement::math("e", "x", MathOpts::default()).with_font_size(10.0);
        let overrides = ElementOverrides {
            font_size: Some(30.0),
            text: None,
            text_opts: Some(MathOptsPatch {
                notation: None,
                math_only: Some(true),
            }),
        };
        let style = element.style(Some(&overrides));
        assert_eq!(style.font_size, 30.0);
        assert!(style.opts.math_only);
        assert_eq!(style.opts.notation, Notation::Tex);
        assert_eq!(style.opacity, 1.0);
    }

    #[test]
    fn test_classifier() {
        assert!(is_math_element(&TextElement::math("a", "", MathOpts::default())));
        assert!(!is_math_element(&TextElement::new("b", "")));
    }
}
