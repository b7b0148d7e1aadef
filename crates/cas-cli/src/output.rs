//! Output formatting utilities.

use cas_protocol::{Endpoint, Properties, ValidationResult};
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use crate::config::OutputFormat;

/// Prints a success message.
pub fn success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Prints an error message.
pub fn error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Prints a warning message.
pub fn warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow().bold(), message);
}

/// Prints an info message.
pub fn info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// One row of a validation result.
#[derive(Debug, Clone, PartialEq, Eq, Tabled, Serialize)]
pub struct AttributeRow {
    /// Attribute name.
    #[tabled(rename = "Name")]
    pub name: String,
    /// Attribute value; repeated values are joined with `, `.
    #[tabled(rename = "Value")]
    pub value: String,
}

impl AttributeRow {
    fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Flattens a validation result into rows, user first.
    #[must_use]
    pub fn from_result(result: &ValidationResult) -> Vec<Self> {
        let mut rows = vec![Self::new("user", &result.user)];
        rows.extend(
            result
                .attributes
                .iter()
                .map(|(name, value)| Self::new(name, value.values().join(", "))),
        );
        if let Some(iou) = &result.proxy_granting_ticket_iou {
            rows.push(Self::new("pgtIou", iou));
        }
        if let Some(pgt) = &result.proxy_granting_ticket {
            rows.push(Self::new("pgt", pgt));
        }
        if !result.proxies.is_empty() {
            rows.push(Self::new("proxies", result.proxies.join(" -> ")));
        }
        rows
    }
}

/// One configured endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Tabled, Serialize)]
pub struct EndpointRow {
    /// Endpoint name.
    #[tabled(rename = "Endpoint")]
    pub endpoint: String,
    /// Resolved URL.
    #[tabled(rename = "URL")]
    pub url: String,
    /// Allowed parameters.
    #[tabled(rename = "Allowed")]
    pub allowed: String,
    /// Default parameters as `name=value`.
    #[tabled(rename = "Defaults")]
    pub defaults: String,
}

impl EndpointRow {
    /// Lists the configured endpoints of `properties`.
    #[must_use]
    pub fn from_properties(properties: &Properties) -> Vec<Self> {
        Endpoint::ALL
            .iter()
            .filter_map(|&endpoint| {
                let definition = properties.endpoint(endpoint)?;
                let url = properties
                    .endpoint_url(endpoint)
                    .map_or_else(|e| format!("<{e}>"), |url| url.to_string());
                Some(Self {
                    endpoint: endpoint.key().to_string(),
                    url,
                    allowed: definition
                        .allowed_parameters
                        .iter()
                        .cloned()
                        .collect::<Vec<_>>()
                        .join(", "),
                    defaults: definition
                        .default_parameters
                        .iter()
                        .map(|(name, value)| format!("{name}={value}"))
                        .collect::<Vec<_>>()
                        .join(", "),
                })
            })
            .collect()
    }
}

/// Outputs rows in the specified format.
pub fn output<T: Tabled + Serialize>(data: &[T], format: OutputFormat) -> crate::CliResult<()> {
    match format {
        OutputFormat::Table => {
            if data.is_empty() {
                info("No results found.");
            } else {
                let table = Table::new(data).with(Style::rounded()).to_string();
                println!("{table}");
            }
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(data)?;
            println!("{json}");
        }
        OutputFormat::Quiet => {}
    }
    Ok(())
}

/// Outputs a single item. Quiet output prints `primary` alone.
pub fn output_single<T: Serialize>(item: &T, primary: &str, format: OutputFormat) -> crate::CliResult<()> {
    match format {
        OutputFormat::Table => print_tree(&serde_json::to_value(item)?, 0),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(item)?;
            println!("{json}");
        }
        OutputFormat::Quiet => println!("{primary}"),
    }
    Ok(())
}

/// Prints a JSON value as an indented `key: value` tree.
fn print_tree(value: &serde_json::Value, indent: usize) {
    let prefix = "  ".repeat(indent);

    match value {
        serde_json::Value::Array(items) => {
            for item in items {
                print!("{prefix}- ");
                print_tree(item, indent + 1);
            }
        }
        serde_json::Value::Object(map) => {
            for (key, val) in map {
                if val.is_object() || val.is_array() {
                    println!("{prefix}{}:", key.bold());
                    print_tree(val, indent + 1);
                } else {
                    println!("{prefix}{}: {}", key.bold(), scalar(val));
                }
            }
        }
        other => println!("{prefix}{}", scalar(other)),
    }
}

fn scalar(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
