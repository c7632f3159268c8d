//! Response helpers shared by drivers and the pipeline.

use tessera_core::{GenerateResponse, Output};
use tessera_error::{BackendError, BackendErrorKind, TesseraResult};

/// Extract the concatenated text outputs from a response.
///
/// JSON outputs are rendered to their string form so callers can hand
/// them to the extraction utilities uniformly.
///
/// # Errors
///
/// Returns a `Malformed` backend error if the response carries no output.
///
/// # Examples
///
/// ```
/// use tessera_core::{GenerateResponse, Output};
/// use tessera_interface::extract_text;
///
/// let response = GenerateResponse {
///     outputs: vec![Output::Text("once upon a time".to_string())],
/// };
/// assert_eq!(extract_text(&response).unwrap(), "once upon a time");
/// ```
pub fn extract_text(response: &GenerateResponse) -> TesseraResult<String> {
    let mut parts = Vec::new();
    for output in &response.outputs {
        match output {
            Output::Text(text) => parts.push(text.clone()),
            Output::Json(value) => parts.push(value.to_string()),
        }
    }

    if parts.is_empty() {
        return Err(BackendError::new(BackendErrorKind::Malformed(
            "Response contained no outputs".to_string(),
        ))
        .into());
    }

    Ok(parts.join("\n"))
}
