//! Output formatting for CLI results

use colored::Colorize;

use crate::banner::BannerResult;
use crate::cli::OutputFormat;
use crate::error::Result;

pub mod formatters;

/// Trait for types that can be formatted for output
pub trait Formattable {
    /// Format the data according to the specified format
    fn format(&self, format: OutputFormat) -> Result<String>;
}

/// Format and print data to stdout
pub fn print<T: Formattable>(data: &T, format: OutputFormat) -> Result<()> {
    let output = data.format(format)?;
    println!("{}", output);
    Ok(())
}

impl Formattable for BannerResult {
    fn format(&self, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(self)?),
            OutputFormat::Pretty => Ok(format!(
                "{}\n{} {}",
                self.banner_url,
                "source:".dimmed(),
                self.source.as_str()
            )),
        }
    }
}
