//! Training progress display.
//!
//! The trainer pushes three kinds of updates: a grid of sample predictions, a
//! detail view of one image with its ranked class probabilities, and an overall
//! progress fraction. [`Viewer`] is the seam; [`LogViewer`] renders the updates
//! as text through `tracing`.

use crate::tensor::Shape;
use tracing::{debug, info};

/// A batch of images with their labels and the model's predictions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleGrid {
    pub images: Vec<Vec<u8>>,
    pub ground_truth: Vec<usize>,
    pub predictions: Vec<usize>,
    pub correct: Vec<bool>,
    /// Geometry of every image in `images`.
    pub image_shape: Shape,
    pub columns: usize,
    /// Display magnification.
    pub scale: usize,
}

impl SampleGrid {
    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Number of grid rows needed for `len()` images at `columns` per row.
    pub fn rows(&self) -> usize {
        if self.columns == 0 {
            return 0;
        }
        (self.len() + self.columns - 1) / self.columns
    }

    pub fn correct_count(&self) -> usize {
        self.correct.iter().filter(|&&c| c).count()
    }

    /// Fraction of correct predictions, 0 for an empty grid.
    pub fn accuracy(&self) -> f32 {
        if self.correct.is_empty() {
            return 0.0;
        }
        self.correct_count() as f32 / self.correct.len() as f32
    }

    /// Rendered size in pixels as (width, height).
    pub fn pixel_size(&self) -> (usize, usize) {
        (
            self.image_shape.width * self.columns.min(self.len()) * self.scale,
            self.image_shape.height * self.rows() * self.scale,
        )
    }
}

/// Receiver for training display updates.
pub trait Viewer {
    /// Replaces the sample grid.
    fn show_grid(&mut self, grid: &SampleGrid);

    /// Shows one image next to its ranking of `(class, probability)` pairs.
    fn show_detail(&mut self, image: &[u8], ranking: &[(usize, f32)], class_names: &[&str]);

    /// Overall training progress in [0, 1].
    fn set_progress(&mut self, fraction: f32);
}

/// Text bar of `width` cells filled in proportion to `fraction`.
pub fn render_bar(fraction: f32, width: usize) -> String {
    let fraction = if fraction.is_finite() {
        fraction.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let filled = (fraction * width as f32).round() as usize;
    let mut bar = String::with_capacity(width);
    bar.extend(std::iter::repeat('#').take(filled));
    bar.extend(std::iter::repeat('.').take(width - filled));
    bar
}

/// One line per grid row, `o` for a correct prediction and `x` for a miss.
pub fn grid_rows(grid: &SampleGrid) -> Vec<String> {
    if grid.columns == 0 {
        return Vec::new();
    }
    grid.correct
        .chunks(grid.columns)
        .map(|row| row.iter().map(|&ok| if ok { 'o' } else { 'x' }).collect())
        .collect()
}

/// Renders every update as `tracing` events.
///
/// Progress is only reported when it crosses into a new whole percent.
#[derive(Debug, Clone)]
pub struct LogViewer {
    bar_width: usize,
    last_percent: Option<u32>,
}

impl LogViewer {
    pub fn new(bar_width: usize) -> Self {
        Self {
            bar_width,
            last_percent: None,
        }
    }

    /// Last whole percent that was reported.
    pub fn last_percent(&self) -> Option<u32> {
        self.last_percent
    }
}

impl Default for LogViewer {
    fn default() -> Self {
        Self::new(40)
    }
}

impl Viewer for LogViewer {
    fn show_grid(&mut self, grid: &SampleGrid) {
        let (width, height) = grid.pixel_size();
        info!(
            samples = grid.len(),
            correct = grid.correct_count(),
            accuracy = %format!("{:.1}%", grid.accuracy() * 100.0),
            width,
            height,
            "sample grid"
        );
        for (row, marks) in grid_rows(grid).iter().enumerate() {
            debug!(row, "{}", marks);
        }
    }

    fn show_detail(&mut self, image: &[u8], ranking: &[(usize, f32)], class_names: &[&str]) {
        debug!(bytes = image.len(), "detail view");
        for &(class, prob) in ranking {
            let name = class_names.get(class).copied().unwrap_or("unknown");
            info!(
                "{:>12} {} {:5.1}%",
                name,
                render_bar(prob, self.bar_width),
                prob * 100.0
            );
        }
    }

    fn set_progress(&mut self, fraction: f32) {
        let fraction = fraction.clamp(0.0, 1.0);
        let percent = (fraction * 100.0).floor() as u32;
        if self.last_percent == Some(percent) {
            return;
        }
        self.last_percent = Some(percent);
        info!("progress [{}] {:3}%", render_bar(fraction, self.bar_width), percent);
    }
}
