use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::cli::ImageFormat;
use crate::config::PlotConfig;
use crate::data::loader::load_file;
use crate::data::model::{ResultsError, ResultsSet};
use crate::figure::{build_all, Figure, Series};
use crate::render::export_all;

// ---------------------------------------------------------------------------
// Viewer state
// ---------------------------------------------------------------------------

/// The full viewer state, independent of rendering.
pub struct AppState {
    /// Styles and figure list the figures are built from.
    pub config: PlotConfig,

    /// Where *Export* writes images.
    pub out_dir: PathBuf,
    pub format: ImageFormat,

    /// File the current figures were built from.
    pub source: Option<PathBuf>,

    /// Built figures (empty until results are loaded).
    pub figures: Vec<Figure>,

    /// Index into `figures` of the figure on screen.
    pub selected: usize,

    /// Methods the user switched off.
    pub hidden_methods: BTreeSet<String>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: PlotConfig, out_dir: PathBuf, format: ImageFormat) -> Self {
        Self {
            config,
            out_dir,
            format,
            source: None,
            figures: Vec::new(),
            selected: 0,
            hidden_methods: BTreeSet::new(),
            status_message: None,
        }
    }

    /// Rebuild every figure from freshly loaded results.
    pub fn set_results(&mut self, source: PathBuf, results: &ResultsSet) -> Result<(), ResultsError> {
        self.figures = build_all(results, &self.config.figures, &self.config.styles)?;
        self.source = Some(source);
        self.selected = 0;
        self.hidden_methods.clear();
        self.status_message = None;
        Ok(())
    }

    /// Load a results file and rebuild; failures land in `status_message`.
    pub fn open(&mut self, path: &Path) {
        let outcome = load_file(path).and_then(|results| {
            self.set_results(path.to_path_buf(), &results)?;
            Ok(results.series_count())
        });
        match outcome {
            Ok(n) => {
                log::info!("Loaded {n} series from {}", path.display());
            }
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                self.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }

    /// Write every figure to `out_dir`.
    pub fn export(&mut self) {
        match export_all(&self.figures, &self.out_dir, self.format) {
            Ok(paths) => {
                self.status_message = Some(format!(
                    "Exported {} figure(s) to {}",
                    paths.len(),
                    self.out_dir.display()
                ));
            }
            Err(e) => {
                log::error!("Export failed: {e:#}");
                self.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }

    pub fn selected_figure(&self) -> Option<&Figure> {
        self.figures.get(self.selected)
    }

    pub fn select_figure(&mut self, index: usize) {
        if index < self.figures.len() {
            self.selected = index;
        }
    }

    /// Series of the selected figure that are not hidden.
    pub fn visible_series(&self) -> Vec<&Series> {
        self.selected_figure()
            .map(|f| {
                f.series
                    .iter()
                    .filter(|s| !self.hidden_methods.contains(&s.method))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn is_visible(&self, method: &str) -> bool {
        !self.hidden_methods.contains(method)
    }

    pub fn set_visible(&mut self, method: &str, visible: bool) {
        if visible {
            self.hidden_methods.remove(method);
        } else {
            self.hidden_methods.insert(method.to_string());
        }
    }

    pub fn show_all(&mut self) {
        self.hidden_methods.clear();
    }

    /// Hide every method of the selected figure.
    pub fn hide_all(&mut self) {
        let methods: Vec<String> = self
            .selected_figure()
            .map(|f| f.series.iter().map(|s| s.method.clone()).collect())
            .unwrap_or_default();
        self.hidden_methods.extend(methods);
    }
}
