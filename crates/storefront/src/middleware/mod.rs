//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request span with `request_id` field)
//! 3. Request ID (fill in the span field, echo header)
//! 4. Session layer (tower-sessions)
//! 5. Rate limiting (governor, auth and form routes only)
//!
//! Extractors: [`RequireAuth`], [`RequireAdmin`], [`OptionalAuth`], [`Lang`].

pub mod auth;
pub mod locale;
pub mod rate_limit;
pub mod request_id;
pub mod session;

pub use auth::{OptionalAuth, RequireAdmin, RequireAuth, clear_current_user, set_current_user};
pub use locale::Lang;
pub use rate_limit::{auth_rate_limiter, form_rate_limiter};
pub use request_id::{REQUEST_ID_HEADER, RequestId, request_id_middleware};
pub use session::create_session_layer;
