//! Raw sensor readings and the store boundary they are fetched through.

mod domain;
pub mod import;
mod store;

pub use domain::{AdcPayload, ClimatePayload, ParsedReading, Reading, SensorType};
pub use import::ReadingImportError;
pub use store::{ReadingStore, StoreError};
