//! Human-readable rendering of decoded events.
//!
//! Well-known token events map to a fixed projection of their fields through
//! [`ProjectionTable`]; anything else falls back to a dump of every field.
//! Registering a new projection never touches decoding.

use std::collections::HashMap;
use std::fmt;

use alloy::dyn_abi::DynSolValue;
use alloy::hex;
use tokenops_data::RawLogEntry;

use crate::events::DecodedEvent;
use crate::units::format_units;

/// Decimals and symbol used to render token amounts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayUnits {
    /// Decimal places of one display unit.
    pub decimals: u8,
    /// Symbol appended to rendered amounts.
    pub symbol: String,
}

impl Default for DisplayUnits {
    fn default() -> Self {
        Self {
            decimals: 18,
            symbol: "CAMP".to_string(),
        }
    }
}

/// How a projected field is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldFormat {
    /// Value as-is.
    Plain,
    /// Integer amount in display units, followed by the symbol.
    Amount,
}

/// One line of a projection: which field to show, and under what label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldView {
    /// Label printed before the value.
    pub label: String,
    /// Field name in the decoded event.
    pub field: String,
    /// Rendering rule.
    pub format: FieldFormat,
}

impl FieldView {
    /// Field rendered verbatim.
    pub fn plain(label: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            field: field.into(),
            format: FieldFormat::Plain,
        }
    }

    /// Field rendered as a token amount.
    pub fn amount(label: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            field: field.into(),
            format: FieldFormat::Amount,
        }
    }
}

/// A rendered log: a title line plus labelled values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventView {
    /// First line, e.g. `[Block 12] Transfer (tx: 0x1234abcd...)`.
    pub title: String,
    /// Labelled values in display order.
    pub lines: Vec<(String, String)>,
}

impl EventView {
    /// Value shown under `label`.
    pub fn value(&self, label: &str) -> Option<&str> {
        self.lines
            .iter()
            .find(|(line_label, _)| line_label == label)
            .map(|(_, value)| value.as_str())
    }
}

impl fmt::Display for EventView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title)?;
        for (label, value) in &self.lines {
            write!(f, "\n  {label}: {value}")?;
        }
        Ok(())
    }
}

/// Event name to field projection.
#[derive(Debug, Clone, Default)]
pub struct ProjectionTable {
    projections: HashMap<String, Vec<FieldView>>,
}

impl ProjectionTable {
    /// An empty table; every event renders as a generic dump.
    pub fn new() -> Self {
        Self::default()
    }

    /// Projections for the standard events of a capped, pausable,
    /// role-managed token.
    pub fn well_known() -> Self {
        let mut table = Self::new();
        table
            .register(
                "Transfer",
                vec![
                    FieldView::plain("From", "from"),
                    FieldView::plain("To", "to"),
                    FieldView::amount("Amount", "value"),
                ],
            )
            .register(
                "Approval",
                vec![
                    FieldView::plain("Owner", "owner"),
                    FieldView::plain("Spender", "spender"),
                    FieldView::amount("Amount", "value"),
                ],
            )
            .register(
                "RoleGranted",
                vec![
                    FieldView::plain("Role", "role"),
                    FieldView::plain("Account", "account"),
                    FieldView::plain("Granted by", "sender"),
                ],
            )
            .register("Paused", vec![FieldView::plain("Paused by", "account")])
            .register("Unpaused", vec![FieldView::plain("Unpaused by", "account")]);
        table
    }

    /// Adds or replaces the projection for `event_name`.
    pub fn register(&mut self, event_name: impl Into<String>, fields: Vec<FieldView>) -> &mut Self {
        self.projections.insert(event_name.into(), fields);
        self
    }

    /// Whether `event_name` has a dedicated projection.
    pub fn contains(&self, event_name: &str) -> bool {
        self.projections.contains_key(event_name)
    }

    /// Renders a decoded log.
    ///
    /// Uses the registered projection when every projected field is present;
    /// otherwise (unregistered event, or an event that shares a name but not a
    /// shape) dumps all fields.
    pub fn describe(
        &self,
        entry: &RawLogEntry,
        decoded: &DecodedEvent,
        units: &DisplayUnits,
    ) -> EventView {
        let title = format!(
            "[Block {}] {} (tx: {}...)",
            block_label(entry),
            decoded.event_name,
            short_tx_hash(entry)
        );

        let lines = self
            .projections
            .get(&decoded.event_name)
            .and_then(|views| project(views, decoded, units))
            .unwrap_or_else(|| dump(decoded));

        EventView { title, lines }
    }
}

/// Renders a decoded log with the well-known projections and default units.
pub fn describe(entry: &RawLogEntry, decoded: &DecodedEvent) -> EventView {
    ProjectionTable::well_known().describe(entry, decoded, &DisplayUnits::default())
}

/// Renders a log that did not decode: provenance and raw selector.
pub fn describe_failure(entry: &RawLogEntry) -> EventView {
    let transaction = entry
        .transaction_hash
        .map(|hash| format!("{hash:#x}"))
        .unwrap_or_else(|| "unknown".to_string());
    let topic = entry
        .signature()
        .map(|topic| format!("{topic:#x}"))
        .unwrap_or_else(|| "unknown".to_string());

    EventView {
        title: format!("[Block {}] Unable to decode event", block_label(entry)),
        lines: vec![
            ("Transaction".to_string(), transaction),
            ("Topics".to_string(), topic),
        ],
    }
}

fn project(
    views: &[FieldView],
    decoded: &DecodedEvent,
    units: &DisplayUnits,
) -> Option<Vec<(String, String)>> {
    views
        .iter()
        .map(|view| {
            let value = decoded.field(&view.field)?;
            Some((view.label.clone(), render(value, view.format, units)))
        })
        .collect()
}

fn dump(decoded: &DecodedEvent) -> Vec<(String, String)> {
    decoded
        .fields
        .iter()
        .map(|(name, value)| (name.clone(), render_value(value)))
        .collect()
}

fn render(value: &DynSolValue, format: FieldFormat, units: &DisplayUnits) -> String {
    match (format, value) {
        (FieldFormat::Amount, DynSolValue::Uint(amount, _)) => {
            format!("{} {}", format_units(*amount, units.decimals), units.symbol)
        }
        _ => render_value(value),
    }
}

/// Renders a decoded ABI value as text.
///
/// Addresses are checksummed, fixed bytes are trimmed to their declared size,
/// and composites are rendered recursively.
pub fn render_value(value: &DynSolValue) -> String {
    match value {
        DynSolValue::Address(address) => address.to_checksum(None),
        DynSolValue::Bool(flag) => flag.to_string(),
        DynSolValue::Int(int, _) => int.to_string(),
        DynSolValue::Uint(uint, _) => uint.to_string(),
        DynSolValue::FixedBytes(word, size) => hex::encode_prefixed(&word[..*size]),
        DynSolValue::Bytes(bytes) => hex::encode_prefixed(bytes),
        DynSolValue::String(text) => text.clone(),
        DynSolValue::Array(items) | DynSolValue::FixedArray(items) => {
            format!("[{}]", join(items))
        }
        DynSolValue::Tuple(items) => format!("({})", join(items)),
        other => format!("{other:?}"),
    }
}

fn join(items: &[DynSolValue]) -> String {
    items.iter().map(render_value).collect::<Vec<_>>().join(", ")
}

fn block_label(entry: &RawLogEntry) -> String {
    entry
        .block_number
        .map(|number| number.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn short_tx_hash(entry: &RawLogEntry) -> String {
    match entry.transaction_hash {
        Some(hash) => format!("{hash:#x}").chars().take(10).collect(),
        None => "unknown".to_string(),
    }
}
