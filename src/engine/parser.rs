//! Parser for yt-dlp output lines
//!
//! The CLI engine asks yt-dlp to print progress and final file paths in a
//! tab-separated, marker-prefixed form. Everything else it prints is treated
//! as a log line whose level comes from yt-dlp's own prefixes.

use super::traits::{
    EngineEvent, PostProcessorEvent, PostProcessorStatus, ProgressEvent, ProgressStatus,
};
use crate::types::LogLevel;
use std::path::PathBuf;

/// Marker starting every progress line
pub const PROGRESS_MARKER: &str = "[mediadl:progress]";

/// Marker starting every final-path line
pub const ARTIFACT_MARKER: &str = "[mediadl:artifact]";

/// Post-processor name reported for final-path lines
pub const MOVE_FILES_POSTPROCESSOR: &str = "MoveFiles";

/// Value for `--progress-template`
pub fn progress_template() -> String {
    format!(
        "download:{}\t%(progress.status)s\t%(progress.downloaded_bytes)s\t\
         %(progress.total_bytes)s\t%(progress.total_bytes_estimate)s\t\
         %(progress.speed)s\t%(progress.eta)s\t%(progress.fragment_index)s\t\
         %(progress.filename)s",
        PROGRESS_MARKER
    )
}

/// Value for `--print`, emitted once per file after it reaches its final path
pub fn artifact_template() -> String {
    format!("after_move:{}\t%(filepath)s", ARTIFACT_MARKER)
}

/// Turn one output line into an event
///
/// Markers only count at the start of a line. Returns `None` for blank lines and for progress lines with a status the
/// engine does not model.
pub fn parse_line(line: &str) -> Option<EngineEvent> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return None;
    }

    if let Some(fields) = line.strip_prefix(PROGRESS_MARKER) {
        return parse_progress(fields).map(EngineEvent::Progress);
    }

    if let Some(rest) = line.strip_prefix(ARTIFACT_MARKER) {
        let path = rest.trim_start_matches('\t');
        return Some(EngineEvent::PostProcessor(PostProcessorEvent {
            status: PostProcessorStatus::Finished,
            postprocessor: MOVE_FILES_POSTPROCESSOR.to_string(),
            filepath: text_field(path).map(PathBuf::from),
            filename: None,
        }));
    }

    Some(EngineEvent::Log {
        level: log_level(line),
        message: line.to_string(),
    })
}

/// Severity yt-dlp attached to a diagnostic line
pub fn log_level(line: &str) -> LogLevel {
    if line.starts_with("ERROR:") {
        LogLevel::Error
    } else if line.starts_with("WARNING:") {
        LogLevel::Warning
    } else if line.starts_with("[debug]") {
        LogLevel::Debug
    } else {
        LogLevel::Info
    }
}

fn parse_progress(fields: &str) -> Option<ProgressEvent> {
    let mut parts = fields.trim_start_matches('\t').splitn(8, '\t');

    let status = match parts.next()?.trim() {
        "downloading" => ProgressStatus::Downloading,
        "finished" => ProgressStatus::Finished,
        "error" => ProgressStatus::Error,
        _ => return None,
    };

    let mut event = ProgressEvent::new(status);
    event.downloaded_bytes = parts.next().and_then(count_field);
    event.total_bytes = parts.next().and_then(count_field);
    event.total_bytes_estimate = parts.next().and_then(count_field);
    event.speed = parts.next().and_then(float_field);
    event.eta = parts.next().and_then(count_field);
    event.fragment_index = parts.next().and_then(count_field);
    event.filename = parts.next().and_then(text_field).map(str::to_string);
    Some(event)
}

/// yt-dlp prints missing template fields as "NA"
fn text_field(value: &str) -> Option<&str> {
    let value = value.trim();
    match value {
        "" | "NA" | "None" => None,
        other => Some(other),
    }
}

fn float_field(value: &str) -> Option<f64> {
    text_field(value)?
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
}

/// Byte counts and estimates may be printed as floats
fn count_field(value: &str) -> Option<u64> {
    float_field(value).map(|v| v as u64)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn progress(line: &str) -> ProgressEvent {
        match parse_line(line) {
            Some(EngineEvent::Progress(p)) => p,
            other => panic!("expected progress event, got {:?}", other),
        }
    }

    #[test]
    fn parses_full_downloading_line() {
        let event = progress(
            "[mediadl:progress]\tdownloading\t1024\t4096\tNA\t512.5\t6\tNA\t/srv/dl/clip.f137.mp4",
        );

        assert_eq!(event.status, ProgressStatus::Downloading);
        assert_eq!(event.downloaded_bytes, Some(1024));
        assert_eq!(event.total_bytes, Some(4096));
        assert_eq!(event.total_bytes_estimate, None);
        assert_eq!(event.speed, Some(512.5));
        assert_eq!(event.eta, Some(6));
        assert_eq!(event.fragment_index, None);
        assert_eq!(event.filename.as_deref(), Some("/srv/dl/clip.f137.mp4"));
    }

    #[test]
    fn float_estimates_are_truncated() {
        let event =
            progress("[mediadl:progress]\tdownloading\t10\tNA\t20480.7\tNA\tNA\t3\tlive.ts");
        assert_eq!(event.total_bytes_estimate, Some(20480));
        assert_eq!(event.fragment_index, Some(3));
        assert_eq!(event.speed, None);
    }

    #[test]
    fn finished_line_with_missing_fields() {
        let event = progress("[mediadl:progress]\tfinished\t4096\t4096\tNA\tNA\tNA\tNA\tclip.mp4");
        assert_eq!(event.status, ProgressStatus::Finished);
        assert_eq!(event.filename.as_deref(), Some("clip.mp4"));
    }

    #[test]
    fn truncated_progress_line_keeps_known_fields() {
        let event = progress("[mediadl:progress]\tdownloading\t99");
        assert_eq!(event.downloaded_bytes, Some(99));
        assert_eq!(event.filename, None);
    }

    #[test]
    fn unknown_progress_status_is_skipped() {
        assert!(parse_line("[mediadl:progress]\tpaused\t1\t2").is_none());
    }

    #[test]
    fn artifact_line_becomes_finished_postprocessor_event() {
        let event = parse_line("[mediadl:artifact]\t/srv/dl/Song Title-abc123.mp3").unwrap();
        assert_eq!(
            event,
            EngineEvent::PostProcessor(PostProcessorEvent {
                status: PostProcessorStatus::Finished,
                postprocessor: "MoveFiles".to_string(),
                filepath: Some(PathBuf::from("/srv/dl/Song Title-abc123.mp3")),
                filename: None,
            })
        );
    }

    #[test]
    fn artifact_line_without_path_has_no_filepath() {
        match parse_line("[mediadl:artifact]\tNA") {
            Some(EngineEvent::PostProcessor(pp)) => assert_eq!(pp.filepath, None),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn diagnostic_lines_keep_text_and_level() {
        let cases = [
            ("ERROR: [generic] Unsupported URL: x", LogLevel::Error),
            ("WARNING: unable to extract uploader", LogLevel::Warning),
            ("[debug] Command-line config: []", LogLevel::Debug),
            ("[youtube] abc123: Downloading webpage", LogLevel::Info),
        ];

        for (line, expected) in cases {
            match parse_line(line) {
                Some(EngineEvent::Log { level, message }) => {
                    assert_eq!(level, expected, "level for {}", line);
                    assert_eq!(message, line);
                }
                other => panic!("expected log for {}, got {:?}", line, other),
            }
        }
    }

    #[test]
    fn markers_inside_diagnostics_stay_log_lines() {
        let lines = [
            "ERROR: [generic] '[mediadl:artifact]x' is not a valid URL",
            "ERROR: [generic] '[mediadl:progress]\tdownloading\t1' is not a valid URL",
        ];

        for line in lines {
            match parse_line(line) {
                Some(EngineEvent::Log { level, message }) => {
                    assert_eq!(level, LogLevel::Error);
                    assert_eq!(message, line);
                }
                other => panic!("expected error log for {}, got {:?}", line, other),
            }
        }
    }

    #[test]
    fn blank_lines_and_carriage_returns() {
        assert!(parse_line("").is_none());
        assert!(parse_line("   \r").is_none());
        match parse_line("[info] done\r") {
            Some(EngineEvent::Log { message, .. }) => assert_eq!(message, "[info] done"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn templates_carry_markers() {
        assert!(progress_template().starts_with("download:[mediadl:progress]\t"));
        assert!(progress_template().ends_with("%(progress.filename)s"));
        assert_eq!(
            artifact_template(),
            "after_move:[mediadl:artifact]\t%(filepath)s"
        );
    }
}
