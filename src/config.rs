use std::num::NonZeroUsize;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::figure::{default_figures, FigureSpec};
use crate::style::StyleSheet;

/// Styles and figure list. Every field falls back to the paper defaults,
/// so a config file only needs the parts it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlotConfig {
    pub styles: StyleSheet,
    pub figures: Vec<FigureSpec>,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            styles: StyleSheet::default(),
            figures: default_figures(),
        }
    }
}

impl PlotConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Use `repeat` repetitions per block in every averaged figure.
    pub fn override_repeat(&mut self, repeat: NonZeroUsize) {
        for figure in &mut self.figures {
            figure.averaging = figure.averaging.with_repeat(repeat);
        }
    }
}
