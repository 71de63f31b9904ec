pub mod cart;
pub mod item;

pub use cart::CartResult;
pub use item::LineItem;

/// Length of a canonical product identifier.
pub const IDENTIFIER_LEN: usize = 10;

/// A canonical identifier is exactly 10 ASCII alphanumeric characters.
///
/// Extraction paths uppercase before calling this; anything that fails the
/// check is dropped upstream rather than carried as a malformed record.
pub fn is_valid_identifier(s: &str) -> bool {
    s.len() == IDENTIFIER_LEN && s.chars().all(|c| c.is_ascii_alphanumeric())
}
