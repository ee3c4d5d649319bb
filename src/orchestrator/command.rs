use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::dom::page::Page;
use crate::error::CommandError;
use crate::field::field_model::FieldRecord;
use crate::orchestrator::orchestrator::{FillSummary, Orchestrator};
use crate::store::{FormStore, SAVED_FORM_DATA, persistable};

// ============================================================================
// Request
// ============================================================================

/// Wire form of a request: `{"action": "...", "data": ...}`.
#[derive(Debug, Deserialize)]
struct RawCommand {
    action: String,
    #[serde(default)]
    data: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    DetectFields,
    FillForm(Vec<FieldRecord>),
    /// Saves the given records, or re-detects when none are given.
    SaveFormData(Option<Vec<FieldRecord>>),
    LoadAndFill,
    ClearData,
}

impl Command {
    pub fn action(&self) -> &'static str {
        match self {
            Command::DetectFields => "detectFields",
            Command::FillForm(_) => "fillForm",
            Command::SaveFormData(_) => "saveFormData",
            Command::LoadAndFill => "loadAndFill",
            Command::ClearData => "clearData",
        }
    }

    pub fn from_json(line: &str) -> Result<Command, CommandError> {
        let value: Value = serde_json::from_str(line).map_err(|e| CommandError::Malformed(e.to_string()))?;
        Command::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Command, CommandError> {
        let raw: RawCommand = serde_json::from_value(value).map_err(|e| CommandError::Malformed(e.to_string()))?;
        let data = raw.data.filter(|d| !d.is_null());

        match raw.action.as_str() {
            "detectFields" => Ok(Command::DetectFields),
            "fillForm" => {
                let data = data.ok_or_else(|| CommandError::MissingData(raw.action.clone()))?;
                Ok(Command::FillForm(records_from(data)?))
            }
            "saveFormData" => match data {
                Some(data) => Ok(Command::SaveFormData(Some(records_from(data)?))),
                None => Ok(Command::SaveFormData(None)),
            },
            "loadAndFill" => Ok(Command::LoadAndFill),
            "clearData" => Ok(Command::ClearData),
            _ => Err(CommandError::UnknownAction(raw.action)),
        }
    }
}

fn records_from(data: Value) -> Result<Vec<FieldRecord>, CommandError> {
    if !data.is_array() {
        return Err(CommandError::Malformed("data must be an array of field records".into()));
    }
    serde_json::from_value(data).map_err(|e| CommandError::Malformed(e.to_string()))
}

// ============================================================================
// Response
// ============================================================================

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<FieldRecord>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filled_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<FillSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Response {
    pub fn ok() -> Self {
        Response {
            success: true,
            ..Default::default()
        }
    }

    pub fn failure(error: impl ToString) -> Self {
        Response {
            success: false,
            error: Some(error.to_string()),
            ..Default::default()
        }
    }

    fn detected(fields: Vec<FieldRecord>) -> Self {
        Response {
            fields: Some(fields),
            ..Response::ok()
        }
    }

    /// A fill pass always answers `success: true`; per-record problems are
    /// in the counts.
    fn filled(summary: FillSummary) -> Self {
        Response {
            filled_count: Some(summary.filled),
            error_count: Some(summary.error_count()),
            result: Some(summary),
            ..Response::ok()
        }
    }
}

// ============================================================================
// Dispatch
// ============================================================================

/// Parses one request line and runs it. Malformed requests come back as a
/// failed response rather than an error.
pub fn handle_line(
    orchestrator: &Orchestrator<'_>,
    page: &mut dyn Page,
    store: &mut dyn FormStore,
    line: &str,
) -> Response {
    match Command::from_json(line) {
        Ok(command) => execute(orchestrator, page, store, command),
        Err(e) => {
            warn!(target: "orchestrator", error = %e, "rejected command");
            Response::failure(e)
        }
    }
}

pub fn execute(
    orchestrator: &Orchestrator<'_>,
    page: &mut dyn Page,
    store: &mut dyn FormStore,
    command: Command,
) -> Response {
    info!(target: "orchestrator", action = command.action(), "handling command");

    match command {
        Command::DetectFields => match orchestrator.detect_all(page) {
            Ok(fields) => Response::detected(fields),
            Err(e) => Response::failure(e),
        },

        Command::FillForm(records) => Response::filled(orchestrator.fill_all(page, &records)),

        Command::SaveFormData(Some(records)) => {
            let records = persistable(SAVED_FORM_DATA, &records);
            if records.is_empty() {
                warn!(target: "orchestrator", "no valid fields to save");
                return Response::failure("no valid fields to save");
            }
            match store.save(SAVED_FORM_DATA, &records) {
                Ok(()) => Response::ok(),
                Err(e) => Response::failure(e),
            }
        }

        Command::SaveFormData(None) => {
            let fields = match orchestrator.detect_all(page) {
                Ok(fields) => fields,
                Err(e) => return Response::failure(e),
            };
            if fields.is_empty() {
                warn!(target: "orchestrator", "no fields detected to save");
                return Response::failure("no fields detected");
            }
            match store.save(SAVED_FORM_DATA, &fields) {
                Ok(()) => Response::ok(),
                Err(e) => Response::failure(e),
            }
        }

        Command::LoadAndFill => match store.load(SAVED_FORM_DATA) {
            Ok(Some(records)) if !records.is_empty() => Response::filled(orchestrator.fill_all(page, &records)),
            Ok(_) => {
                warn!(target: "orchestrator", "no saved data found");
                Response::filled(FillSummary::default())
            }
            Err(e) => Response::failure(e),
        },

        Command::ClearData => match store.remove(SAVED_FORM_DATA) {
            Ok(_) => Response::ok(),
            Err(e) => Response::failure(e),
        },
    }
}
