pub mod field_model;

pub use field_model::{FieldCategory, FieldRecord, FieldTraits, FieldValue, LocatorHints};
