/// Data layer: results types, loading, and valid-run averaging.
///
/// Architecture:
/// ```text
///  .json / .csv / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → ResultsSet
///   └──────────┘
///        │
///        ▼
///   ┌────────────┐
///   │ ResultsSet │  scenario → method → metric → series
///   └────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ validity  │  statuses + values → per-block means
///   └──────────┘
/// ```

pub mod loader;
pub mod model;
pub mod validity;
