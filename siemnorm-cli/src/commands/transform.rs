//! `siemnorm transform` command handler

use std::io::Write;

use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{debug, info};

use siemnorm_core::config::SiemnormConfig;
use siemnorm_core::pipeline::LogTransform;
use siemnorm_core::record::{Node, Record};
use siemnorm_transform::DeepSecurityTransform;
use siemnorm_transform::deepsecurity::MESSAGE_FIELD;

use crate::cli::TransformArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `transform` command.
///
/// Transformed records go to stdout, one JSON document per line.
/// The summary report goes to stderr.
pub async fn execute(
    args: TransformArgs,
    config: &SiemnormConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let transform = DeepSecurityTransform::from_core(&config.deepsecurity)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    let summary = match args.input_path() {
        Some(path) => {
            info!(path = %path.display(), "transforming records from file");
            let file = tokio::fs::File::open(path).await?;
            process_lines(BufReader::new(file), &mut out, &transform, args.pretty).await?
        }
        None => {
            info!("transforming records from stdin");
            let stdin = BufReader::new(tokio::io::stdin());
            process_lines(stdin, &mut out, &transform, args.pretty).await?
        }
    };
    out.flush()?;

    info!(
        total = summary.total,
        transformed = summary.transformed,
        dropped = summary.dropped,
        invalid_json = summary.invalid_json,
        "transform finished"
    );
    writer.render_stderr(&summary)?;

    Ok(())
}

/// Transform every non-blank line of `reader` and write the results to `out`.
///
/// A line that is not a JSON object is wrapped as `{"message": <line>}`.
/// Records the transform rejects are counted and skipped.
pub async fn process_lines<R>(
    reader: R,
    out: &mut dyn Write,
    transform: &dyn LogTransform,
    pretty: bool,
) -> Result<TransformSummary, CliError>
where
    R: AsyncBufRead + Unpin,
{
    let mut summary = TransformSummary::default();
    let mut lines = reader.lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        summary.total += 1;

        let mut record = match parse_record(&line) {
            Some(record) => record,
            None => {
                summary.invalid_json += 1;
                wrap_message(&line)
            }
        };

        match transform.transform(&mut record) {
            Ok(transformed) => {
                if pretty {
                    serde_json::to_writer_pretty(&mut *out, &*transformed)?;
                } else {
                    serde_json::to_writer(&mut *out, &*transformed)?;
                }
                writeln!(out)?;
                summary.transformed += 1;
            }
            Err(e) => {
                debug!(line = summary.total, error = %e, "record dropped");
                summary.dropped += 1;
            }
        }
    }

    Ok(summary)
}

/// Parse a line as a JSON object record.
fn parse_record(line: &str) -> Option<Record> {
    match serde_json::from_str::<serde_json::Value>(line) {
        Ok(value @ serde_json::Value::Object(_)) => Some(Node::from(value)),
        _ => None,
    }
}

/// Wrap a raw line as a record with only a `message` field.
fn wrap_message(line: &str) -> Record {
    let mut record = Node::object();
    record.insert(MESSAGE_FIELD, Node::from(line));
    record
}

/// Outcome of a transform run.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct TransformSummary {
    /// Non-blank input lines
    pub total: usize,
    /// Records written to stdout
    pub transformed: usize,
    /// Records skipped because of a format error
    pub dropped: usize,
    /// Lines that were not JSON objects and were wrapped as `message`
    pub invalid_json: usize,
}

impl Render for TransformSummary {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "{}", "Transform Summary".bold())?;
        writeln!(w, "  Total:       {}", self.total)?;
        writeln!(w, "  Transformed: {}", self.transformed.to_string().green())?;
        if self.dropped > 0 {
            writeln!(w, "  Dropped:     {}", self.dropped.to_string().yellow())?;
        } else {
            writeln!(w, "  Dropped:     {}", self.dropped)?;
        }
        writeln!(w, "  Raw lines:   {}", self.invalid_json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_record_accepts_objects_only() {
        assert!(parse_record(r#"{"message": "x"}"#).is_some());
        assert!(parse_record(r#"["message"]"#).is_none());
        assert!(parse_record("\"text\"").is_none());
        assert!(parse_record("CEF:0|a|b").is_none());
    }

    #[test]
    fn test_wrap_message() {
        let record = wrap_message("CEF:0|a");
        assert_eq!(record.get("message"), Some(&Node::from("CEF:0|a")));
    }

    #[test]
    fn test_summary_render_text() {
        colored::control::set_override(false);
        let summary = TransformSummary {
            total: 3,
            transformed: 2,
            dropped: 1,
            invalid_json: 1,
        };
        let mut buffer = Vec::new();
        summary.render_text(&mut buffer).expect("render succeeds");
        let output = String::from_utf8(buffer).expect("valid UTF-8");
        assert!(output.contains("Transform Summary"));
        assert!(output.contains("Transformed: 2"));
        assert!(output.contains("Dropped:     1"));
    }

    #[test]
    fn test_summary_json_fields() {
        let summary = TransformSummary {
            total: 1,
            ..Default::default()
        };
        let json = serde_json::to_value(&summary).expect("serializes");
        assert_eq!(json["total"], 1);
        assert_eq!(json["invalid_json"], 0);
    }
}
