//! Reading and writing measurement tracks.
//!
//! Two on-disk formats are supported:
//!
//! - [`native`]: one probe per line, name and value separated by
//!   whitespace. Lossless for composed probe names and NaN values.
//! - [`penncnv`]: the tab-separated table exported by genotyping pipelines,
//!   carrying per-probe Name/Chr/Position columns plus a Log R Ratio and a
//!   B Allele Freq column per sample.
//!
//! Both formats share one value codec: unparseable text decodes to NaN,
//! non-finite values encode as `NaN`, and finite values are written with
//! four decimal places, trailing zeros trimmed.

pub mod native;
pub mod penncnv;

use crate::data_structs::typedef::ValueType;

/// Decodes one value token. An empty or malformed token becomes NaN; a
/// single decimal comma is accepted in place of the decimal point.
pub fn decode_value(token: &str) -> ValueType {
    if token.is_empty() {
        return ValueType::NAN;
    }
    if token.contains(',') {
        return token.replace(',', ".").parse().unwrap_or(ValueType::NAN);
    }
    token.parse().unwrap_or(ValueType::NAN)
}

/// Encodes one value: `NaN` for anything non-finite, otherwise four decimal
/// places with trailing zeros (and a bare trailing point) trimmed.
pub fn encode_value(value: ValueType) -> String {
    if !value.is_finite() {
        return "NaN".to_string();
    }
    let text = format!("{:.4}", value);
    text.trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}
