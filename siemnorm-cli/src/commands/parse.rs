//! `siemnorm parse` command handler

use std::io::Write;

use serde::Serialize;
use tracing::debug;

use siemnorm_transform::KeyValueParser;

use crate::cli::ParseArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `parse` command.
pub fn execute(args: ParseArgs, writer: &OutputWriter) -> Result<(), CliError> {
    let report = build_report(&args.body);
    debug!(attributes = report.attributes.len(), "attribute body parsed");
    writer.render(&report)
}

/// Parse the body into an ordered report.
pub fn build_report(body: &str) -> ParseReport {
    let attributes = KeyValueParser::new()
        .parse(body)
        .into_iter()
        .map(|(key, value)| Attribute { key, value })
        .collect();
    ParseReport { attributes }
}

/// Parsed attributes in input order.
#[derive(Debug, Serialize)]
pub struct ParseReport {
    pub attributes: Vec<Attribute>,
}

/// A single parsed attribute.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct Attribute {
    pub key: String,
    pub value: String,
}

impl Render for ParseReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        if self.attributes.is_empty() {
            writeln!(w, "(no attributes)")?;
            return Ok(());
        }

        let width = self
            .attributes
            .iter()
            .map(|a| a.key.len())
            .max()
            .unwrap_or(0);
        for attr in &self.attributes {
            writeln!(w, "{:<width$} = {}", attr.key, attr.value, width = width)?;
        }
        Ok(())
    }
}
