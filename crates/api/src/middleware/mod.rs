//! HTTP middleware stack for the API.
//!
//! # Middleware Order (outermost first, as layered in [`crate::app`])
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. CORS (permissive; answers preflights itself)
//! 3. `TraceLayer` (request span)
//! 4. Request ID (recorded on the request span, echoed in the response)

pub mod request_id;

pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
