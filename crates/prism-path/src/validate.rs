//! Structural limits for paths and names.

use crate::item_path::PathSegment;
use crate::NameError;

/// Maximum allowed path depth.
pub const MAX_PATH_LENGTH: usize = 256;

/// Validate a sequence of path segments.
///
/// # Errors
///
/// Returns an error if:
/// - The path exceeds the maximum depth (256 segments)
/// - Two id segments follow each other (an id always selects a value of the
///   item named just before it)
/// - The path starts with an id segment
pub fn validate_segments(segments: &[PathSegment]) -> Result<(), NameError> {
    if segments.len() > MAX_PATH_LENGTH {
        return Err(NameError::PathTooLong(segments.len()));
    }
    if let Some(PathSegment::Id(id)) = segments.first() {
        return Err(NameError::MisplacedId(*id));
    }
    for pair in segments.windows(2) {
        if let [PathSegment::Id(_), PathSegment::Id(id)] = pair {
            return Err(NameError::MisplacedId(*id));
        }
    }
    Ok(())
}
