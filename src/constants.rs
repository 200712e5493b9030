/// Maximum length of a category or item title, in characters
pub const MAX_TITLE_LEN: usize = 200;

/// Request header carrying the authenticated user, set by the fronting proxy
pub const DEFAULT_IDENTITY_HEADER: &str = "x-forwarded-user";

/// Name of the hidden form field carrying the anti-forgery token
pub const FORM_TOKEN_FIELD: &str = "__RequestVerificationToken";

/// Domain prefix mixed into anti-forgery token signatures
pub const FORM_TOKEN_PREFIX: &str = "form:";

// =============================================================================
// Error Messages
// =============================================================================

/// Validation message for a missing title
pub const ERR_TITLE_REQUIRED: &str = "The Title field is required.";

/// Validation message for an overlong title
pub const ERR_TITLE_TOO_LONG: &str = "The Title field must be at most 200 characters.";

/// Validation message for a missing category selection
pub const ERR_CATEGORY_REQUIRED: &str = "The Category field is required.";

/// Validation message for a category id that is not a number
pub const ERR_CATEGORY_INVALID: &str = "The Category field must be a valid id.";

/// Validation message for a category id that does not resolve
pub fn err_category_unknown(id: u64) -> String {
    format!("Category {} does not exist.", id)
}
