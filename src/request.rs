use crate::models::StudentHandle;

pub const REQUEST_MARKER: &str = "Teammate request:";

/// Extracts the requester from an issue title such as
/// `Teammate request: alice@kth.se`.
pub fn parse_title(title: &str) -> Option<StudentHandle> {
    let (_, rest) = title.split_once(REQUEST_MARKER)?;
    let address = rest
        .split_whitespace()
        .next()?
        .trim_matches(|c: char| matches!(c, '<' | '>' | '"' | '\''));
    // Bare handles and emails share the same rules for the local part.
    let local = address.split('@').next()?;
    if !local.chars().all(is_handle_char) {
        return None;
    }
    StudentHandle::new(local)
}

fn is_handle_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')
}
