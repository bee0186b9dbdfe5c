use serde::Serialize;
use std::fmt;

const BANKS_RUSSIA: &[&str] = &[
    "sberbank",
    "tinkoff",
    "alfabank",
    "vtb",
    "raiffeisen",
    "gazprombank",
    "otkritie",
    "sovcombank",
    "rosbank",
    "pochtabank",
    "mtsbank",
    "ozonbank",
    "rshb",
    "psb",
    "homecredit",
    "uralsib",
    "akbars",
    "mkb",
];

const BANKS_AZERBAIJAN: &[&str] = &[
    "kapitalbank",
    "pashabank",
    "abb",
    "leobank",
    "unibank",
    "accessbank",
    "yelobank",
    "rabitabank",
    "xalqbank",
];

const BANKS_ABKHAZIA: &[&str] = &[
    "amrabank",
    "sukhumbank",
    "gagrabank",
    "tsabalbank",
    "garantbank",
    "svetochbank",
];

/// Country bucket a provider bank code belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Country {
    Russia,
    Azerbaijan,
    Abkhazia,
    Tajikistan,
}

impl Country {
    /// Maps a provider bank code onto its country.
    ///
    /// Codes that appear in none of the known lists land in
    /// [`Country::Tajikistan`]; merchants already rely on that fallback.
    pub fn from_bank_code(bank_code: &str) -> Self {
        if BANKS_RUSSIA.contains(&bank_code) {
            Country::Russia
        } else if BANKS_AZERBAIJAN.contains(&bank_code) {
            Country::Azerbaijan
        } else if BANKS_ABKHAZIA.contains(&bank_code) {
            Country::Abkhazia
        } else {
            Country::Tajikistan
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Country::Russia => "Russia",
            Country::Azerbaijan => "Azerbaijan",
            Country::Abkhazia => "Abkhazia",
            Country::Tajikistan => "Tajikistan",
        }
    }
}

impl fmt::Display for Country {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
