//! Success-response envelope.

use serde::Serialize;

/// Every successful endpoint wraps its payload as `{ "data": ... }`, so
/// clients tell payloads apart from the `{ "error", "code" }` failure shape
/// by key alone.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}
