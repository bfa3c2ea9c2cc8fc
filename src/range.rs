use std::str::FromStr;

use crate::error::StreamError;

const BYTES_UNIT: &str = "bytes=";

/// Client intent parsed from a `Range: bytes=<start>-<end>` header.
///
/// Only a single range with an explicit start is understood. `end` is `None`
/// when the client left it open (`bytes=500-`), which is distinct from an
/// explicit `0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestedRange {
    pub start: u64,
    pub end: Option<u64>,
}

impl RequestedRange {
    /// Parses the raw header value, treating a missing header as malformed.
    pub fn parse(header: Option<&str>) -> Result<Self, StreamError> {
        match header {
            Some(value) => value.parse(),
            None => Err(StreamError::BadRequest(None)),
        }
    }

    /// Whether this looks like a player's initial probe of a file: an open
    /// end, or the `bytes=0-1` Safari sends first.
    pub fn is_probe(&self) -> bool {
        matches!(self.end, None | Some(1))
    }
}

impl FromStr for RequestedRange {
    type Err = StreamError;

    fn from_str(header: &str) -> Result<Self, Self::Err> {
        let malformed = || StreamError::BadRequest(Some(header.to_string()));

        let (_, bounds) = header.split_once(BYTES_UNIT).ok_or_else(malformed)?;
        let (start, end) = bounds.split_once('-').ok_or_else(malformed)?;

        let start = start.trim().parse::<u64>().map_err(|_| malformed())?;
        let end = match end.trim() {
            "" => None,
            end => Some(end.parse::<u64>().map_err(|_| malformed())?),
        };

        Ok(RequestedRange { start, end })
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn parse(header: &str) -> Result<RequestedRange, StreamError> {
        RequestedRange::parse(Some(header))
    }

    #[test]
    fn test_parse_valid() {
        let tests = [
            ("bytes=0-", 0, None),
            ("bytes=0-1", 0, Some(1)),
            ("bytes=0-0", 0, Some(0)),
            ("bytes=500000-", 500_000, None),
            ("bytes=100-200", 100, Some(200)),
            ("bytes= 7 - 9 ", 7, Some(9)),
        ];

        for (header, start, end) in tests {
            let range = parse(header).unwrap_or_else(|e| panic!("{header}: {e}"));
            assert_eq!(RequestedRange { start, end }, range, "{header}");
        }
    }

    #[test]
    fn test_missing_header() {
        assert_matches!(RequestedRange::parse(None), Err(StreamError::BadRequest(None)));
    }

    #[test]
    fn test_parse_malformed() {
        let tests = [
            "",
            "none",
            "bleets=100-324",
            "bytes=",
            "bytes=100",
            "bytes=-500",
            "bytes=abc-",
            "bytes=0-abc",
            "bytes=0-1,5-9",
            "bytes=-1-2",
        ];

        for header in tests {
            assert_matches!(parse(header), Err(StreamError::BadRequest(Some(_))), "{header}");
        }
    }

    #[test]
    fn test_probe_detection() {
        assert!(parse("bytes=0-").unwrap().is_probe());
        assert!(parse("bytes=0-1").unwrap().is_probe());
        assert!(!parse("bytes=0-0").unwrap().is_probe());
        assert!(!parse("bytes=0-1024").unwrap().is_probe());
    }
}
