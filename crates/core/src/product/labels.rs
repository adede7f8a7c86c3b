//! Product code to display label table.

/// Known product codes and their display labels.
pub const PRODUCT_LABELS: &[(&str, &str)] = &[
    ("UCOS", "Cisco Unified Communications Manager"),
    ("CUC", "Cisco Unity Connection"),
    ("CER", "Cisco Emergency Responder"),
    ("CUP", "Cisco IM and Presence"),
    ("UCCX", "Cisco Unified Contact Center Express"),
    ("UCCE", "Cisco Unified Contact Center Enterprise"),
    ("PCCE", "Cisco Packaged Contact Center Enterprise"),
    ("ECE", "Cisco Enterprise Chat and Email"),
];

/// Look up the display label for a product code.
///
/// Codes are matched exactly (they are always upper case in filenames).
pub fn product_label(code: &str) -> Option<&'static str> {
    PRODUCT_LABELS
        .iter()
        .find(|(known, _)| *known == code)
        .map(|(_, label)| *label)
}
