//! Turning math markup into pixels off the render path
//!
//! Rasterizing SVG is too slow to do inside a frame. The first time a
//! piece of markup is needed at a given pixel size, a decode job goes to a
//! small rayon pool and the frame carries on without it. Finished images
//! land in the image cache straight from the worker.
//!
//! [`DecodeQueue::pump`] is the completion step: it draws what finished
//! and calls each distinct refresh hook once. It never lays anything out.
//! A draw whose token was cancelled is skipped, but its image stays cached.

use std::collections::HashMap;
use std::sync::Arc;

use futures::channel::oneshot;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use mathlabel_core::{
    cache::{CacheMetrics, ContentCache},
    error::{LabelError, RenderError},
    types::BitmapData,
    RasterSurface, Result,
};

/// Asks the host to draw the frame again
pub type RefreshCallback = Arc<dyn Fn() + Send + Sync>;

/// Identity of a rasterized image
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageKey {
    /// The final markup, with size and color already applied
    pub markup: Arc<str>,
    pub width: u32,
    pub height: u32,
}

/// Where and how to draw an image once it exists
pub struct PendingDraw {
    pub key: ImageKey,
    pub x: f32,
    pub y: f32,
    pub opacity: f32,
    pub cancel: CancellationToken,
    pub refresh: Option<RefreshCallback>,
}

#[derive(Default)]
struct QueueState {
    in_flight: HashMap<ImageKey, oneshot::Receiver<bool>>,
    draws: Vec<PendingDraw>,
}

/// Background SVG rasterization with a shared image cache
pub struct DecodeQueue {
    pool: rayon::ThreadPool,
    images: Arc<ContentCache<ImageKey, Arc<BitmapData>>>,
    state: Mutex<QueueState>,
}

impl DecodeQueue {
    pub fn new(threads: usize, thread_prefix: &str) -> Result<Self> {
        let prefix = thread_prefix.to_string();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(move |i| format!("{}-{}", prefix, i))
            .build()
            .map_err(|e| LabelError::Config(format!("decode pool: {}", e)))?;
        Ok(Self {
            pool,
            images: Arc::new(ContentCache::new()),
            state: Mutex::new(QueueState::default()),
        })
    }

    /// A decoded image, if one is cached
    pub fn get(&self, key: &ImageKey) -> Option<Arc<BitmapData>> {
        self.images.get(key)
    }

    /// Queue `draw`, starting a decode of its markup unless one is running
    pub fn request(&self, draw: PendingDraw) {
        let mut state = self.state.lock();
        if !state.in_flight.contains_key(&draw.key) {
            let (sender, receiver) = oneshot::channel();
            let key = draw.key.clone();
            let images = self.images.clone();
            self.pool.spawn(move || {
                let decoded = match rasterize_svg(&key.markup, key.width, key.height) {
                    Ok(bitmap) => {
                        images.insert(key, Arc::new(bitmap));
                        true
                    },
                    Err(e) => {
                        log::warn!("math image decode failed: {}", e);
                        false
                    },
                };
                let _ = sender.send(decoded);
            });
            state.in_flight.insert(draw.key.clone(), receiver);
        }
        state.draws.push(draw);
    }

    /// Jobs still running
    pub fn pending(&self) -> usize {
        self.state.lock().in_flight.len()
    }

    /// Complete whatever has finished, without waiting; returns draws made
    pub fn pump(&self, surface: &mut dyn RasterSurface) -> usize {
        let finished: Vec<ImageKey> = {
            let mut state = self.state.lock();
            let mut done = Vec::new();
            state.in_flight.retain(|key, receiver| match receiver.try_recv() {
                Ok(None) => true,
                Ok(Some(_)) | Err(_) => {
                    done.push(key.clone());
                    false
                },
            });
            done
        };
        self.complete(&finished, surface)
    }

    /// Wait for every running job, then complete them all
    pub fn flush(&self, surface: &mut dyn RasterSurface) -> usize {
        let in_flight: Vec<(ImageKey, oneshot::Receiver<bool>)> =
            self.state.lock().in_flight.drain().collect();
        let finished: Vec<ImageKey> = in_flight
            .into_iter()
            .map(|(key, receiver)| {
                let _ = futures::executor::block_on(receiver);
                key
            })
            .collect();
        self.complete(&finished, surface)
    }

    fn complete(&self, finished: &[ImageKey], surface: &mut dyn RasterSurface) -> usize {
        if finished.is_empty() {
            return 0;
        }
        let ready: Vec<PendingDraw> = {
            let mut state = self.state.lock();
            let (ready, waiting) = std::mem::take(&mut state.draws)
                .into_iter()
                .partition(|draw| finished.contains(&draw.key));
            state.draws = waiting;
            ready
        };

        let mut drawn = 0;
        let mut refreshes: Vec<RefreshCallback> = Vec::new();
        for draw in ready {
            if draw.cancel.is_cancelled() {
                log::trace!("skipping cancelled math image draw");
                continue;
            }
            // A failed decode leaves nothing to draw
            let Some(image) = self.images.get(&draw.key) else {
                continue;
            };
            surface.draw_image(&image, draw.x, draw.y, draw.opacity);
            drawn += 1;
            if let Some(refresh) = draw.refresh {
                if !refreshes.iter().any(|seen| same_callback(seen, &refresh)) {
                    refreshes.push(refresh);
                }
            }
        }
        for refresh in &refreshes {
            refresh();
        }
        drawn
    }

    pub fn cache_metrics(&self) -> CacheMetrics {
        self.images.metrics()
    }

    pub fn cache_report(&self) -> String {
        self.images.report("images")
    }
}

/// Identity of the callback allocation, ignoring vtables
fn same_callback(a: &RefreshCallback, b: &RefreshCallback) -> bool {
    Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
}

/// Render standalone SVG markup into a `width` x `height` bitmap
pub fn rasterize_svg(svg: &str, width: u32, height: u32) -> Result<BitmapData> {
    let tree = usvg::Tree::from_str(svg, &usvg::Options::default())
        .map_err(|e| RenderError::SvgParse(e.to_string()))?;

    let mut pixmap = tiny_skia::Pixmap::new(width, height)
        .ok_or(RenderError::InvalidDimensions { width, height })?;

    let size = tree.size();
    let transform = tiny_skia::Transform::from_scale(
        width as f32 / size.width(),
        height as f32 / size.height(),
    );
    resvg::render(&tree, transform, &mut pixmap.as_mut());

    Ok(BitmapData {
        width,
        height,
        data: pixmap.take(),
    })
}
