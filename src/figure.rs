use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

use crate::data::model::{ResultsError, ResultsSet};
use crate::data::validity::{average_valid_runs, block_means, check_shape};
use crate::style::{MethodStyle, StyleSheet};

// ---------------------------------------------------------------------------
// Figure description
// ---------------------------------------------------------------------------

/// How the raw metric array of a method becomes plotted points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Averaging {
    /// One point per value.
    None,
    /// Mean of every `repeat` consecutive values.
    BlockMean { repeat: NonZeroUsize },
    /// Mean over the successful repetitions of each block, using the
    /// per-repetition flags in `status_metric`.
    ValidRuns {
        repeat: NonZeroUsize,
        status_metric: String,
    },
}

impl Averaging {
    pub fn with_repeat(&self, repeat: NonZeroUsize) -> Self {
        match self {
            Averaging::None => Averaging::None,
            Averaging::BlockMean { .. } => Averaging::BlockMean { repeat },
            Averaging::ValidRuns { status_metric, .. } => Averaging::ValidRuns {
                repeat,
                status_metric: status_metric.clone(),
            },
        }
    }
}

/// One output figure: which scenario and metric to plot, and its labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FigureSpec {
    /// Output file name without extension.
    pub file_stem: String,
    pub scenario: String,
    pub metric: String,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    /// x value of the first point.
    pub x_offset: f64,
    pub x_step: f64,
    /// Marker radius in pixels.
    pub marker_size: u32,
    pub averaging: Averaging,
    /// Skip the figure instead of failing when the scenario is absent.
    #[serde(default)]
    pub optional: bool,
}

/// Repetitions per configuration in the paper sweeps.
pub const PAPER_REPEAT: NonZeroUsize = match NonZeroUsize::new(3) {
    Some(n) => n,
    None => panic!("repeat must be non-zero"),
};

/// The two paper figures.
pub fn default_figures() -> Vec<FigureSpec> {
    vec![
        FigureSpec {
            file_stem: "iate_noise".into(),
            scenario: "2d_5r_noised_prior".into(),
            metric: "iate_trans".into(),
            title: "iATE vs. Noise of initialization.".into(),
            x_label: "Noise of initialization (m)".into(),
            y_label: "iATE".into(),
            x_offset: 5.0,
            x_step: 1.0,
            marker_size: 5,
            averaging: Averaging::ValidRuns {
                repeat: PAPER_REPEAT,
                status_metric: "statuses".into(),
            },
            optional: false,
        },
        FigureSpec {
            file_stem: "iate_nr".into(),
            scenario: "2d_nr_noised".into(),
            metric: "iate_trans".into(),
            title: "iATE vs. Number of robots.".into(),
            x_label: "Number of robots".into(),
            y_label: "iATE(trans)".into(),
            x_offset: 2.0,
            x_step: 1.0,
            marker_size: 6,
            averaging: Averaging::None,
            optional: true,
        },
    ]
}

// ---------------------------------------------------------------------------
// Built figure
// ---------------------------------------------------------------------------

/// The points of one method, ready to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub method: String,
    pub style: MethodStyle,
    pub points: Vec<(f64, f64)>,
    /// Connect the markers with a line.
    pub draw_line: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    pub spec: FigureSpec,
    pub series: Vec<Series>,
}

impl Figure {
    /// Data bounds `(x_min, x_max, y_min, y_max)` over all series, `None`
    /// when there are no finite points.
    pub fn bounds(&self) -> Option<(f64, f64, f64, f64)> {
        self.series
            .iter()
            .flat_map(|s| s.points.iter())
            .filter(|(x, y)| x.is_finite() && y.is_finite())
            .fold(None, |acc, &(x, y)| match acc {
                None => Some((x, x, y, y)),
                Some((x0, x1, y0, y1)) => Some((x0.min(x), x1.max(x), y0.min(y), y1.max(y))),
            })
    }
}

/// Build one figure from `results`.
///
/// Returns `Ok(None)` for an optional figure whose scenario is missing.
pub fn build_figure(
    results: &ResultsSet,
    spec: &FigureSpec,
    styles: &StyleSheet,
) -> Result<Option<Figure>, ResultsError> {
    if !results.has_scenario(&spec.scenario) && spec.optional {
        log::info!(
            "Scenario '{}' not in results, skipping {}",
            spec.scenario,
            spec.file_stem
        );
        return Ok(None);
    }
    let scenario = results.scenario(&spec.scenario)?;
    log::info!(
        "Scenario '{}': {} methods",
        spec.scenario,
        scenario.len()
    );

    let mut series = Vec::new();
    for (method, style) in styles.resolve(scenario.keys().map(String::as_str)) {
        let values = match results.metric_values(&spec.scenario, &method, &spec.metric) {
            Ok(values) => values,
            // Long-format exports have no rows for a method whose runs all failed.
            Err(e @ ResultsError::MissingMetric { .. }) => {
                if has_status_series(results, spec, &method)? {
                    Vec::new()
                } else {
                    return Err(e);
                }
            }
            Err(e) => return Err(e),
        };
        let (indexed, draw_line) = match &spec.averaging {
            Averaging::None => (values.into_iter().enumerate().collect::<Vec<_>>(), true),
            Averaging::BlockMean { repeat } => {
                (block_means(&values, *repeat).into_iter().enumerate().collect(), true)
            }
            Averaging::ValidRuns {
                repeat,
                status_metric,
            } => match results.metric_flags(&spec.scenario, &method, status_metric)? {
                Some(statuses) => {
                    if let Err(e) = check_shape(&values, &statuses, *repeat) {
                        log::warn!("{}/{method}: {e}", spec.scenario);
                    }
                    let avg = average_valid_runs(&values, &statuses, *repeat);
                    let draw_line = avg.all_blocks_valid();
                    (avg.valid_indices.into_iter().zip(avg.valid_means).collect(), draw_line)
                }
                None => {
                    log::debug!(
                        "{}/{method}: no '{status_metric}', averaging blocks of {repeat}",
                        spec.scenario
                    );
                    (block_means(&values, *repeat).into_iter().enumerate().collect(), true)
                }
            },
        };

        if indexed.is_empty() {
            log::warn!("{}/{method}: nothing to plot", spec.scenario);
            continue;
        }

        let points: Vec<(f64, f64)> = indexed
            .into_iter()
            .map(|(i, y)| (spec.x_offset + i as f64 * spec.x_step, y))
            .collect();
        log::debug!("{}/{method}: {} points", spec.scenario, points.len());

        series.push(Series {
            method,
            style,
            points,
            draw_line,
        });
    }

    Ok(Some(Figure {
        spec: spec.clone(),
        series,
    }))
}

fn has_status_series(
    results: &ResultsSet,
    spec: &FigureSpec,
    method: &str,
) -> Result<bool, ResultsError> {
    match &spec.averaging {
        Averaging::ValidRuns { status_metric, .. } => Ok(results
            .metric_flags(&spec.scenario, method, status_metric)?
            .is_some()),
        Averaging::None | Averaging::BlockMean { .. } => Ok(false),
    }
}

/// Build every figure in `specs`, skipping optional ones without data.
pub fn build_all(
    results: &ResultsSet,
    specs: &[FigureSpec],
    styles: &StyleSheet,
) -> Result<Vec<Figure>, ResultsError> {
    let mut figures = Vec::with_capacity(specs.len());
    for spec in specs {
        if let Some(figure) = build_figure(results, spec, styles)? {
            figures.push(figure);
        }
    }
    Ok(figures)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::MetricSeries;

    fn noise_results() -> ResultsSet {
        let mut rs = ResultsSet::new();
        // raido: block 1 fails completely.
        rs.insert(
            "2d_5r_noised_prior",
            "raido",
            "iate_trans",
            MetricSeries::Values(vec![1.0, 3.0, 5.0, 7.0]),
        );
        rs.insert(
            "2d_5r_noised_prior",
            "raido",
            "statuses",
            MetricSeries::Flags(vec![true, true, false, false, false, false, true, false, true]),
        );
        // imesa: every block has a success.
        rs.insert(
            "2d_5r_noised_prior",
            "imesa",
            "iate_trans",
            MetricSeries::Values(vec![1.0, 2.0, 4.0, 4.0]),
        );
        rs.insert(
            "2d_5r_noised_prior",
            "imesa",
            "statuses",
            MetricSeries::Flags(vec![true, false, false, true, true, false, false, false, true]),
        );
        rs
    }

    fn series<'a>(fig: &'a Figure, method: &str) -> &'a Series {
        fig.series.iter().find(|s| s.method == method).unwrap()
    }

    #[test]
    fn noise_figure_places_valid_blocks_at_offset() {
        let specs = default_figures();
        let fig = build_figure(&noise_results(), &specs[0], &StyleSheet::default())
            .unwrap()
            .unwrap();

        let raido = series(&fig, "raido");
        assert_eq!(raido.points, vec![(5.0, 2.0), (7.0, 6.0)]);
        assert!(!raido.draw_line);

        let imesa = series(&fig, "imesa");
        assert_eq!(imesa.points, vec![(5.0, 1.0), (6.0, 3.0), (7.0, 4.0)]);
        assert!(imesa.draw_line);
    }

    #[test]
    fn series_follow_style_order() {
        let specs = default_figures();
        let fig = build_figure(&noise_results(), &specs[0], &StyleSheet::default())
            .unwrap()
            .unwrap();
        let order: Vec<&str> = fig.series.iter().map(|s| s.method.as_str()).collect();
        assert_eq!(order, vec!["imesa", "raido"]);
    }

    #[test]
    fn missing_statuses_fall_back_to_block_mean() {
        let mut rs = ResultsSet::new();
        rs.insert(
            "2d_5r_noised_prior",
            "ddfsam2",
            "iate_trans",
            MetricSeries::Values(vec![1.0, 2.0, 3.0, 6.0, 6.0, 6.0]),
        );
        let specs = default_figures();
        let fig = build_figure(&rs, &specs[0], &StyleSheet::default())
            .unwrap()
            .unwrap();
        assert_eq!(fig.series[0].points, vec![(5.0, 2.0), (6.0, 6.0)]);
        assert!(fig.series[0].draw_line);
    }

    #[test]
    fn optional_figure_without_scenario_is_skipped() {
        let specs = default_figures();
        let out = build_figure(&noise_results(), &specs[1], &StyleSheet::default()).unwrap();
        assert!(out.is_none());

        let figures = build_all(&noise_results(), &specs, &StyleSheet::default()).unwrap();
        assert_eq!(figures.len(), 1);
    }

    #[test]
    fn required_figure_without_scenario_fails() {
        let specs = default_figures();
        let err = build_figure(&ResultsSet::new(), &specs[0], &StyleSheet::default()).unwrap_err();
        assert_eq!(err, ResultsError::MissingScenario("2d_5r_noised_prior".into()));
    }

    #[test]
    fn robots_figure_plots_every_value() {
        let mut rs = ResultsSet::new();
        rs.insert("2d_nr_noised", "centralized", "iate_trans", MetricSeries::Values(vec![0.1, 0.2]));
        let specs = default_figures();
        let fig = build_figure(&rs, &specs[1], &StyleSheet::default())
            .unwrap()
            .unwrap();
        assert_eq!(fig.series[0].points, vec![(2.0, 0.1), (3.0, 0.2)]);
    }

    #[test]
    fn methods_without_points_are_dropped() {
        let mut rs = ResultsSet::new();
        rs.insert("2d_nr_noised", "imesa", "iate_trans", MetricSeries::Values(vec![]));
        let specs = default_figures();
        let fig = build_figure(&rs, &specs[1], &StyleSheet::default())
            .unwrap()
            .unwrap();
        assert!(fig.series.is_empty());
        assert_eq!(fig.bounds(), None);
    }

    #[test]
    fn all_failed_method_without_values_is_skipped() {
        let mut rs = noise_results();
        rs.insert(
            "2d_5r_noised_prior",
            "ddfsam2",
            "statuses",
            MetricSeries::Flags(vec![false; 3]),
        );
        let specs = default_figures();
        let fig = build_figure(&rs, &specs[0], &StyleSheet::default())
            .unwrap()
            .unwrap();
        let order: Vec<&str> = fig.series.iter().map(|s| s.method.as_str()).collect();
        assert_eq!(order, vec!["imesa", "raido"]);
    }

    #[test]
    fn missing_values_without_statuses_still_fail() {
        let mut rs = noise_results();
        rs.insert("2d_5r_noised_prior", "ddfsam2", "other", MetricSeries::Values(vec![1.0]));
        let specs = default_figures();
        let err = build_figure(&rs, &specs[0], &StyleSheet::default()).unwrap_err();
        assert!(matches!(err, ResultsError::MissingMetric { ref method, .. } if method == "ddfsam2"));
    }

    #[test]
    fn shape_mismatch_still_plots_through_averager() {
        let mut rs = ResultsSet::new();
        // Two successes but three values: the surplus value is ignored.
        rs.insert(
            "2d_5r_noised_prior",
            "imesa",
            "iate_trans",
            MetricSeries::Values(vec![2.0, 4.0, 100.0]),
        );
        rs.insert(
            "2d_5r_noised_prior",
            "imesa",
            "statuses",
            MetricSeries::Flags(vec![true, true, false]),
        );
        let specs = default_figures();
        let fig = build_figure(&rs, &specs[0], &StyleSheet::default())
            .unwrap()
            .unwrap();
        assert_eq!(fig.series[0].points, vec![(5.0, 3.0)]);
        assert!(fig.series[0].draw_line);
    }

    #[test]
    fn bounds_cover_all_series() {
        let specs = default_figures();
        let fig = build_figure(&noise_results(), &specs[0], &StyleSheet::default())
            .unwrap()
            .unwrap();
        assert_eq!(fig.bounds(), Some((5.0, 7.0, 1.0, 6.0)));
    }

    #[test]
    fn with_repeat_keeps_kind() {
        let r = NonZeroUsize::new(5).unwrap();
        let avg = default_figures()[0].averaging.with_repeat(r);
        assert_eq!(
            avg,
            Averaging::ValidRuns {
                repeat: r,
                status_metric: "statuses".into()
            }
        );
        assert_eq!(Averaging::None.with_repeat(r), Averaging::None);
    }
}
