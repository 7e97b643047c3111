//! Query parameters for the events routes.

use serde::Deserialize;

use eventlog::Offset;

use super::error::ApiError;

/// Mode selected by the `watch` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchMode {
    /// One-shot page of the most recent records.
    Page,
    /// Long-lived newline-delimited stream.
    Stream,
}

/// Query parameters accepted by `GET /api/v1/events`.
///
/// Both parameters arrive as raw strings so parsing failures map to the
/// adapter's own 400 responses instead of a framework rejection.
#[derive(Debug, Default, Deserialize)]
pub struct EventsParams {
    /// Streaming selector; only the literal `true` selects streaming.
    pub watch: Option<String>,
    /// Start offset for streaming mode.
    pub offset: Option<String>,
}

impl EventsParams {
    /// Resolves the requested mode.
    ///
    /// Absent or empty `watch` means paged; exactly `true` means streaming;
    /// anything else is rejected.
    pub fn watch_mode(&self) -> Result<WatchMode, ApiError> {
        match self.watch.as_deref() {
            None | Some("") => Ok(WatchMode::Page),
            Some("true") => Ok(WatchMode::Stream),
            Some(_) => Err(ApiError::BadRequest("invalid watch parameter".to_string())),
        }
    }

    /// Parses the optional start offset for streaming mode.
    pub fn start_offset(&self) -> Result<Option<Offset>, ApiError> {
        match self.offset.as_deref() {
            None | Some("") => Ok(None),
            Some(raw) => raw
                .parse::<Offset>()
                .map(Some)
                .map_err(|_| ApiError::BadRequest("invalid offset".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(watch: Option<&str>, offset: Option<&str>) -> EventsParams {
        EventsParams {
            watch: watch.map(str::to_string),
            offset: offset.map(str::to_string),
        }
    }

    #[test]
    fn should_default_to_paged_mode() {
        // given/when/then
        assert_eq!(params(None, None).watch_mode().unwrap(), WatchMode::Page);
        assert_eq!(
            params(Some(""), None).watch_mode().unwrap(),
            WatchMode::Page
        );
    }

    #[test]
    fn should_select_streaming_for_literal_true() {
        assert_eq!(
            params(Some("true"), None).watch_mode().unwrap(),
            WatchMode::Stream
        );
    }

    #[test]
    fn should_reject_any_other_watch_value() {
        // given - "false" is not a valid selector either
        for value in ["false", "TRUE", "1", "yes"] {
            // when
            let result = params(Some(value), None).watch_mode();

            // then
            assert_eq!(
                result,
                Err(ApiError::BadRequest("invalid watch parameter".to_string())),
                "watch={value}"
            );
        }
    }

    #[test]
    fn should_parse_numeric_offset() {
        assert_eq!(
            params(None, Some("42")).start_offset().unwrap(),
            Some(42)
        );
        assert_eq!(params(None, None).start_offset().unwrap(), None);
    }

    #[test]
    fn should_reject_non_numeric_offset() {
        assert_eq!(
            params(None, Some("blabla")).start_offset(),
            Err(ApiError::BadRequest("invalid offset".to_string()))
        );
    }
}
