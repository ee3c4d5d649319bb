pub mod store;

pub use store::{FormStore, JsonFileStore, MemoryStore, SAVED_FORM_DATA, STORE_VERSION, persistable};
