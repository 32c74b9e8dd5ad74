mod geojson;
mod metadata;
mod stats;

pub use geojson::{read_fragments_geojson, read_points_geojson, write_layers_geojson, write_parks_geojson, write_points_geojson};
pub use metadata::RunMetadata;
pub use stats::{stats_to_dataframe, write_stats_csv, write_stats_json, STATS_COLUMNS};
#[cfg(feature = "parquet")]
pub use stats::write_stats_parquet;
