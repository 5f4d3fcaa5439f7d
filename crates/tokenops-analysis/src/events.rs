//! ABI-driven event log classification.
//!
//! Logs are matched on their selector topic against the non-anonymous events
//! of a JSON ABI, then decoded field by field through `alloy::dyn_abi`.
//! Decoding failures are ordinary values: a chain shared with other contracts
//! routinely produces logs a given ABI cannot explain.

use std::collections::{BTreeMap, HashMap};

use alloy::dyn_abi::{DynSolValue, EventExt};
use alloy::json_abi::{Event, JsonAbi};
use alloy::primitives::B256;
use thiserror::Error;
use tokenops_data::RawLogEntry;

/// Summary bucket for every log that could not be decoded.
pub const UNKNOWN_BUCKET: &str = "Unknown/External";

/// Why a log could not be decoded against an ABI.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeFailure {
    /// The ABI has no non-anonymous events to match against.
    #[error("ABI declares no events")]
    NoEvents,
    /// The log carries no selector topic.
    #[error("log has no topics")]
    MissingSignature,
    /// The selector topic belongs to no event in the ABI.
    #[error("no ABI event matches signature {0}")]
    UnknownSignature(B256),
    /// The selector matched, but topics or data do not fit the event's types.
    #[error("log does not fit event `{event}`: {reason}")]
    Malformed {
        /// Name of the matched event.
        event: String,
        /// Decoder message.
        reason: String,
    },
}

/// A log decoded into a named event.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedEvent {
    /// Event name from the ABI.
    pub event_name: String,
    /// Field name and value pairs, in ABI parameter order.
    pub fields: Vec<(String, DynSolValue)>,
}

impl DecodedEvent {
    /// Looks up a field by name.
    pub fn field(&self, name: &str) -> Option<&DynSolValue> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }
}

/// Per-event counts over a batch of logs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventSummary {
    counts: BTreeMap<String, usize>,
    /// Number of logs examined.
    pub total_logs: usize,
    /// Number of logs that decoded against the ABI.
    pub successfully_decoded: usize,
}

impl EventSummary {
    /// Count for `event_name` (use [`UNKNOWN_BUCKET`] for failures).
    pub fn count(&self, event_name: &str) -> usize {
        self.counts.get(event_name).copied().unwrap_or(0)
    }

    /// Every bucket with its count, ordered by name.
    pub fn counts(&self) -> impl Iterator<Item = (&str, usize)> + '_ {
        self.counts.iter().map(|(name, count)| (name.as_str(), *count))
    }

    /// Number of logs that landed in [`UNKNOWN_BUCKET`].
    pub fn failed(&self) -> usize {
        self.total_logs - self.successfully_decoded
    }

    fn record(&mut self, outcome: &Result<DecodedEvent, DecodeFailure>) {
        let bucket = match outcome {
            Ok(decoded) => {
                self.successfully_decoded += 1;
                decoded.event_name.as_str()
            }
            Err(_) => UNKNOWN_BUCKET,
        };
        *self.counts.entry(bucket.to_string()).or_default() += 1;
        self.total_logs += 1;
    }
}

/// Selector index over the events of one ABI.
///
/// Built once and reused across logs. Several events may share a selector
/// (ERC-20 and ERC-721 `Transfer` differ only in which fields are indexed);
/// those candidates are tried in ABI order.
#[derive(Debug, Clone, Default)]
pub struct EventCatalog {
    by_selector: HashMap<B256, Vec<Event>>,
}

impl EventCatalog {
    /// Indexes the non-anonymous events of `abi`.
    pub fn new(abi: &JsonAbi) -> Self {
        let mut by_selector: HashMap<B256, Vec<Event>> = HashMap::new();
        for event in abi.events().filter(|event| !event.anonymous) {
            by_selector
                .entry(event.selector())
                .or_default()
                .push(event.clone());
        }
        Self { by_selector }
    }

    /// Whether there is nothing to match against.
    pub fn is_empty(&self) -> bool {
        self.by_selector.is_empty()
    }

    /// Decodes one log.
    ///
    /// # Errors
    /// Returns a [`DecodeFailure`] describing why the log does not fit the ABI.
    pub fn decode(&self, entry: &RawLogEntry) -> Result<DecodedEvent, DecodeFailure> {
        if self.is_empty() {
            return Err(DecodeFailure::NoEvents);
        }
        let selector = entry.signature().ok_or(DecodeFailure::MissingSignature)?;
        let candidates = self
            .by_selector
            .get(selector)
            .ok_or(DecodeFailure::UnknownSignature(*selector))?;

        let mut last_failure = DecodeFailure::UnknownSignature(*selector);
        for event in candidates {
            match decode_with(event, entry) {
                Ok(decoded) => return Ok(decoded),
                Err(failure) => last_failure = failure,
            }
        }
        Err(last_failure)
    }

    /// Decodes every log and counts the outcomes.
    ///
    /// A failing log only increments [`UNKNOWN_BUCKET`]; it never stops the
    /// logs after it from being processed.
    pub fn summarize(&self, entries: &[RawLogEntry]) -> EventSummary {
        let mut summary = EventSummary::default();
        for entry in entries {
            summary.record(&self.decode_logged(entry));
        }
        summary
    }

    /// Decodes every log once, returning each outcome alongside the summary.
    ///
    /// Outcomes are in the same order as `entries`.
    pub fn classify(
        &self,
        entries: &[RawLogEntry],
    ) -> (Vec<Result<DecodedEvent, DecodeFailure>>, EventSummary) {
        let mut summary = EventSummary::default();
        let outcomes = entries
            .iter()
            .map(|entry| {
                let outcome = self.decode_logged(entry);
                summary.record(&outcome);
                outcome
            })
            .collect();
        (outcomes, summary)
    }

    fn decode_logged(&self, entry: &RawLogEntry) -> Result<DecodedEvent, DecodeFailure> {
        let outcome = self.decode(entry);
        if let Err(failure) = &outcome {
            tracing::debug!(
                block_number = ?entry.block_number,
                tx_hash = ?entry.transaction_hash,
                %failure,
                "log not decodable against ABI"
            );
        }
        outcome
    }
}

/// Decodes one log against `abi`.
///
/// Builds a throwaway [`EventCatalog`]; prefer the catalog when decoding many logs.
///
/// # Errors
/// Returns a [`DecodeFailure`] describing why the log does not fit the ABI.
pub fn decode(entry: &RawLogEntry, abi: &JsonAbi) -> Result<DecodedEvent, DecodeFailure> {
    EventCatalog::new(abi).decode(entry)
}

/// Decodes and counts every log against `abi`.
pub fn summarize(entries: &[RawLogEntry], abi: &JsonAbi) -> EventSummary {
    EventCatalog::new(abi).summarize(entries)
}

fn decode_with(event: &Event, entry: &RawLogEntry) -> Result<DecodedEvent, DecodeFailure> {
    let malformed = |reason: String| DecodeFailure::Malformed {
        event: event.name.clone(),
        reason,
    };

    let decoded = event
        .decode_log_parts(entry.topics.iter().copied(), &entry.data, true)
        .map_err(|err| malformed(err.to_string()))?;

    // alloy splits values into indexed and body lists; re-interleave them in
    // parameter order.
    let mut indexed = decoded.indexed.into_iter();
    let mut body = decoded.body.into_iter();
    let mut fields = Vec::with_capacity(event.inputs.len());
    for (position, param) in event.inputs.iter().enumerate() {
        let value = if param.indexed {
            indexed.next()
        } else {
            body.next()
        }
        .ok_or_else(|| malformed(format!("no value for parameter {position}")))?;

        let name = if param.name.is_empty() {
            format!("arg{position}")
        } else {
            param.name.clone()
        };
        fields.push((name, value));
    }

    Ok(DecodedEvent {
        event_name: event.name.clone(),
        fields,
    })
}
