/// Data layer: core types, loading, and the pipeline stages.
///
/// Architecture:
/// ```text
///  URL / .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse source → Dataset
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  clean    │  coerce_numeric, drop_incomplete
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  bins     │  numeric field → labelled interval
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  conjunction of constraints → subsequence
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ aggregate  │  group → mean per metric → SummaryRow
///   └───────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ summary   │  pivot → SummaryTable
///   └──────────┘
/// ```

pub mod aggregate;
pub mod bins;
pub mod clean;
pub mod filter;
pub mod loader;
pub mod model;
pub mod summary;
