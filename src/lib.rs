pub mod cache;
pub mod config;
pub mod decode;
pub mod pipeline;
pub mod render;

pub use cache::DatasetCache;
pub use config::{Config, YearRange};
pub use decode::{decode_file, RawTable};
pub use pipeline::{
    incidence_observations, mortality_observations, DenseMatrix, Metric, Observation, Sex,
};
