//! Formatting of command results.

use std::{fmt::Display, str::FromStr};

use serde::Serialize;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) enum OutputFormat {
    /// `key: value` lines, stable for scripts.
    #[default]
    Porcelain,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "porcelain" => Ok(Self::Porcelain),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown output format '{other}', expected porcelain or json")),
        }
    }
}

/// Trait for objects that can be formatted for porcelain output
pub(crate) trait Formattable {
    fn format_porcelain(&self) -> String;
}

impl<T: Formattable> Formattable for Vec<T> {
    fn format_porcelain(&self) -> String {
        self.iter()
            .map(Formattable::format_porcelain)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

pub(crate) fn porcelain_field(key: &str, value: impl Display) -> String {
    format!("{key}: {value}")
}

pub(crate) fn render<T: Formattable + Serialize>(
    data: &T,
    format: OutputFormat,
) -> anyhow::Result<String> {
    Ok(match format {
        OutputFormat::Porcelain => data.format_porcelain(),
        OutputFormat::Json => serde_json::to_string_pretty(data)?,
    })
}

pub(crate) fn output<T: Formattable + Serialize>(
    data: &T,
    format: OutputFormat,
) -> anyhow::Result<()> {
    println!("{}", render(data, format)?);
    Ok(())
}
