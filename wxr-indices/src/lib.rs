//! Climate indices computed from a station's ingested observations.
//!
//! The three consumers are independent of each other and only read the
//! dataset, so they can run side by side on the same snapshot:
//!
//! - [`hellmann`]: winter severity curves and classes
//! - [`records`]: per calendar day record highs/lows, their history and age
//! - [`density`]: temperature density estimates over a sliding window of years

pub mod density;
pub mod hellmann;
pub mod records;

pub use density::{
    compute_windowed_density, BandwidthRule, DensityConfig, DensityError, DensityPoint,
    DensityWindow, WindowedDensityEstimator,
};
pub use hellmann::{compute_winter_severity, severity_fold, SeverityClass, SeverityPoint, WinterPeriod};
pub use records::{
    compute_record_tracking, RecordAgeHistogram, RecordEntry, RecordEvolution, RecordKind,
    RecordTracker,
};
