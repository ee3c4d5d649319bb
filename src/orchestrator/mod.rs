pub mod command;
pub mod orchestrator;
pub mod registry;

pub use command::{Command, Response, execute, handle_line};
pub use orchestrator::{CancelFlag, FieldOutcome, FillSummary, Orchestrator};
pub use registry::Registry;
