pub mod calendar;
pub mod dataset;
pub mod error;
pub mod observation;

pub use calendar::{CalendarKey, Month, MONTHS};
pub use dataset::{ingest, DailyAggregate, Dataset, Observation};
pub use error::IngestError;
pub use observation::{read_isd_lite, read_isd_lite_dir, RawObservation};
