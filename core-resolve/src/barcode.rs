//! Barcode text normalization.
//!
//! Scanned text arrives with scanner artifacts: surrounding whitespace,
//! dash/space separators, stray non-digit characters, and leading zeros that
//! differ between EAN-13 and UPC-A renderings of the same code. `clean`
//! collapses all of that into one canonical digit sequence. Some catalogs
//! index the zero-padded form and some the stripped form, so the chain tries
//! both when they differ.

/// Canonicalizes raw scanned barcode text.
///
/// Trims whitespace, drops separators and any other non-digit characters,
/// then strips leading zeros. An input with no digits at all becomes `"0"`.
///
/// Total and idempotent: `clean(&clean(x)) == clean(x)` for every input.
pub fn clean(raw: &str) -> String {
    // Separator stripping (dash, space) is subsumed by keeping digits only.
    let digits: String = raw.trim().chars().filter(char::is_ascii_digit).collect();

    let stripped = digits.trim_start_matches('0');
    if stripped.is_empty() {
        "0".to_string()
    } else {
        stripped.to_string()
    }
}

/// A scanned barcode in both the form the scanner produced and the canonical
/// cleaned form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BarcodeCandidate {
    original: String,
    cleaned: String,
}

impl BarcodeCandidate {
    pub fn new(raw: &str) -> Self {
        Self {
            original: raw.to_string(),
            cleaned: clean(raw),
        }
    }

    /// The text exactly as scanned.
    pub fn original(&self) -> &str {
        &self.original
    }

    /// The canonical digit form.
    pub fn cleaned(&self) -> &str {
        &self.cleaned
    }

    /// Whether cleaning actually changed the text. When false, probing the
    /// cleaned form would duplicate the original probe.
    pub fn is_distinct(&self) -> bool {
        self.cleaned != self.original
    }
}
