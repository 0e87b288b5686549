/// Data layer: typed records, loading, filtering and aggregation.
///
/// Architecture:
/// ```text
///  .xlsx / .csv / .parquet / .json   (local path or URL)
///        │
///        ▼
///   ┌──────────┐
///   │  source   │  fetch bytes
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse bytes → RawTable, memoised per source
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  schema   │  bind columns → Dataset (Vec<Record>)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  apply predicate set → filtered Dataset
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ aggregate │  count, default rate, rate per age bucket
///   └───────────┘
/// ```
pub mod aggregate;
pub mod filter;
pub mod loader;
pub mod model;
pub mod schema;
pub mod source;

pub use aggregate::{
    AgeBucket, BucketRate, Summary, SummaryView, by_age_bucket, format_rate, summarize,
    summary_view,
};
pub use filter::{Bounds, CategoryFilter, FilterPredicates};
pub use loader::{DatasetLoader, LoadOptions, load_dataset};
pub use model::{Dataset, DatasetExtents, Record};
pub use source::{DataSource, TableFormat};
