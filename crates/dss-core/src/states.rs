//! Indian state and union territory names with their two-letter abbreviations.
//!
//! Layers disagree on how a state is written: the state boundary layer keys on
//! the full name, the district layer on the abbreviation. This table backs
//! [`crate::enums::ValueForm::Abbreviation`] when the state layer itself does
//! not publish an abbreviation attribute.

const STATES: &[(&str, &str)] = &[
    ("Andaman and Nicobar Islands", "AN"),
    ("Andhra Pradesh", "AP"),
    ("Arunachal Pradesh", "AR"),
    ("Assam", "AS"),
    ("Bihar", "BR"),
    ("Chandigarh", "CH"),
    ("Chhattisgarh", "CT"),
    ("Dadra and Nagar Haveli and Daman and Diu", "DN"),
    ("Delhi", "DL"),
    ("Goa", "GA"),
    ("Gujarat", "GJ"),
    ("Haryana", "HR"),
    ("Himachal Pradesh", "HP"),
    ("Jammu and Kashmir", "JK"),
    ("Jharkhand", "JH"),
    ("Karnataka", "KA"),
    ("Kerala", "KL"),
    ("Ladakh", "LA"),
    ("Lakshadweep", "LD"),
    ("Madhya Pradesh", "MP"),
    ("Maharashtra", "MH"),
    ("Manipur", "MN"),
    ("Meghalaya", "ML"),
    ("Mizoram", "MZ"),
    ("Nagaland", "NL"),
    ("Odisha", "OR"),
    ("Puducherry", "PY"),
    ("Punjab", "PB"),
    ("Rajasthan", "RJ"),
    ("Sikkim", "SK"),
    ("Tamil Nadu", "TN"),
    ("Telangana", "TG"),
    ("Tripura", "TR"),
    ("Uttar Pradesh", "UP"),
    ("Uttarakhand", "UT"),
    ("West Bengal", "WB"),
];

/// Abbreviation for a full state name, matched case-insensitively.
#[must_use]
pub fn abbreviation(full_name: &str) -> Option<&'static str> {
    let needle = full_name.trim();
    STATES
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(needle))
        .map(|(_, abbrev)| *abbrev)
}

/// Full state name for an abbreviation, matched case-insensitively.
#[must_use]
pub fn full_name(abbrev: &str) -> Option<&'static str> {
    let needle = abbrev.trim();
    STATES
        .iter()
        .find(|(_, code)| code.eq_ignore_ascii_case(needle))
        .map(|(name, _)| *name)
}

/// Table spelling of a state given its full name or abbreviation in any
/// case.
#[must_use]
pub fn canonical(name: &str) -> Option<&'static str> {
    let needle = name.trim();
    STATES
        .iter()
        .find(|(full, abbrev)| {
            full.eq_ignore_ascii_case(needle) || abbrev.eq_ignore_ascii_case(needle)
        })
        .map(|(full, _)| *full)
}
