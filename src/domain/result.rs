//! Result type alias for Vitex

use super::errors::VitexError;

/// Result type alias for Vitex operations
///
/// # Examples
///
/// ```
/// use vitex::domain::result::Result;
/// use vitex::domain::errors::VitexError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(VitexError::Validation("Invalid input".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, VitexError>;
