//! Error classification shared by every domain error.
//!
//! DESIGN
//! ======
//! Domain modules keep their own `thiserror` enums. Each one implements
//! [`ErrorCode`] so the HTTP layer can render a stable machine-readable code
//! and a retryable hint without knowing the concrete error type.

/// Stable error classification for API responses and logs.
pub trait ErrorCode: std::fmt::Display {
    /// Short upper-case code such as `E_API_RESPONSE`.
    fn error_code(&self) -> &'static str;

    /// Whether the same operation could succeed if the user tried again.
    fn retryable(&self) -> bool {
        false
    }
}
