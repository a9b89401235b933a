/// Data layer: core types, loading, filtering, and aggregation.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → AccidentDataset
///   └──────────┘
///        │
///        ▼
///   ┌────────────────┐
///   │ AccidentDataset │  Vec<Record>, year/province indices
///   └────────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  year ∧ province predicate → filtered indices
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ aggregate  │  KPIs, monthly series + MM12, seasonality,
///   └───────────┘  rankings, geo subset → DashboardViews
/// ```
pub mod aggregate;
pub mod filter;
pub mod loader;
pub mod model;
