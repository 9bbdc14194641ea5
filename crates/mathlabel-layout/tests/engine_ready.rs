use std::sync::Arc;

use loader::Deferred;

use mathlabel_core::{
    types::{Notation, VerticalMetrics},
    FontMetrics, LabelStyle, MathEngine, Result,
};
use mathlabel_layout::LayoutEngine;
use mathlabel_typeset::Typesetter;

struct Fixed;

impl FontMetrics for Fixed {
    fn advance(&self, text: &str, font_size: f32) -> f32 {
        text.chars().count() as f32 * font_size / 2.0
    }

    fn vertical(&self, font_size: f32) -> VerticalMetrics {
        VerticalMetrics {
            ascent: font_size * 0.8,
            descent: font_size * 0.2,
            line_height: font_size * 1.25,
        }
    }
}

struct Boxy;

impl MathEngine for Boxy {
    fn name(&self) -> &'static str {
        "boxy"
    }

    fn convert(&self, _text: &str, _notation: Notation, _display: bool) -> Result<String> {
        Ok(r#"<svg width="1ex" height="5ex" style="vertical-align: -1ex"></svg>"#.into())
    }
}

mod loader {
    use std::sync::Arc;

    use mathlabel_core::MathEngine;
    use mathlabel_typeset::{EngineLoader, LoadCompletion};
    use std::sync::Mutex;

    /// Parks the completion until `release` is called
    #[derive(Default)]
    pub struct Deferred {
        pending: Mutex<Option<LoadCompletion>>,
    }

    impl Deferred {
        pub fn release(&self, engine: Arc<dyn MathEngine>) {
            let pending = self.pending.lock().map(|mut p| p.take()).ok().flatten();
            if let Some(done) = pending {
                done.complete(Ok(engine));
            }
        }
    }

    pub struct Shared(pub Arc<Deferred>);

    impl EngineLoader for Shared {
        fn name(&self) -> &'static str {
            "deferred"
        }

        fn load(&self, completion: LoadCompletion) {
            if let Ok(mut pending) = self.0.pending.lock() {
                *pending = Some(completion);
            }
        }
    }
}

#[test]
fn layout_catches_up_once_the_engine_is_ready() {
    let deferred = Arc::new(Deferred::default());
    let typesetter = Arc::new(Typesetter::new(Arc::new(loader::Shared(deferred.clone()))));
    let engine = LayoutEngine::new(typesetter.clone(), Arc::new(Fixed));
    let style = LabelStyle::default();
    let text = "area \\(x\\)";

    let before = engine.measure(text, &style, None);
    assert!(!before.engine_ready);
    let plain = engine.fonts().measure_text(text, style.font_size);
    assert_eq!(before.metrics.width, plain.width);
    assert_eq!(before.metrics.height, plain.height);

    // Same answer while still loading
    assert_eq!(engine.measure(text, &style, None).metrics, before.metrics);

    deferred.release(Arc::new(Boxy));

    let after = engine.measure(text, &style, None);
    assert!(after.engine_ready);
    assert_ne!(after.metrics, before.metrics);
    assert_eq!(after.metrics.height, 50.0);
    assert_eq!(after.metrics.baseline, 40.0);

    let hits = engine.block_cache_metrics().hits;
    let again = engine.measure(text, &style, None);
    assert_eq!(again.metrics, after.metrics);
    assert_eq!(engine.block_cache_metrics().hits, hits + 1);
}
