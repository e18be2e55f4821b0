//! RPC Error Types
//!
//! Maps `AppError` onto JSON-RPC error objects. The two queue procedures
//! have a stable wire contract of their own (SPEC_FULL section 6/7): when
//! an error originates from a `QueueError`, its negative code is carried
//! through unchanged rather than renumbered into the 4xxx/5xxx space below.

use jsonrpsee::types::ErrorObjectOwned;
use queue_core::error::AppError;

/// RPC-layer error codes for errors that do not carry their own wire code.
pub mod code {
    pub const VALIDATION_ERROR: i32 = 4000;
    pub const INTERNAL_ERROR: i32 = 5000;
    pub const STORE_ERROR: i32 = 5001;
}

/// Convert AppError to a JSON-RPC ErrorObject, preserving queue wire codes.
pub fn to_rpc_error(err: AppError) -> ErrorObjectOwned {
    if let Some(wire_code) = err.code() {
        return ErrorObjectOwned::owned(wire_code, err.to_string(), None::<()>);
    }
    match err {
        AppError::Validation(msg) => {
            ErrorObjectOwned::owned(code::VALIDATION_ERROR, msg, None::<()>)
        }
        AppError::Store(msg) => ErrorObjectOwned::owned(code::STORE_ERROR, msg, None::<()>),
        AppError::Serialization(e) => {
            ErrorObjectOwned::owned(code::VALIDATION_ERROR, e.to_string(), None::<()>)
        }
        AppError::Internal(msg) => ErrorObjectOwned::owned(code::INTERNAL_ERROR, msg, None::<()>),
        AppError::Queue(_) => unreachable!("QueueError always has a wire code"),
    }
}
