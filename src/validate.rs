use crate::config::StreamConfig;
use crate::error::StreamError;
use crate::range::RequestedRange;
use crate::resolve::FileDescriptor;

/// Rejects files of a disallowed type and ranges starting past the end.
///
/// An `end` beyond the file is not an error; the planner clamps it.
pub fn validate(
    config: &StreamConfig,
    file: &FileDescriptor,
    range: &RequestedRange,
) -> Result<(), StreamError> {
    if !config.is_allowed(&file.mime_type) {
        return Err(StreamError::UnsupportedMediaType(file.mime_type.clone()));
    }
    if range.start >= file.size {
        return Err(StreamError::RangeNotSatisfiable {
            start: range.start,
            size: file.size,
        });
    }
    Ok(())
}
