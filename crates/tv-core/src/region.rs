//! Region key resolution
//!
//! Boundary files from different revisions label the same state with different
//! property names and spellings. Every spelling registered here is a synonym for
//! one [`RegionCode`], which keeps the rest of the system independent of the
//! boundary file in use.

use ahash::AHashMap;
use serde::{Serialize, Deserialize};
use serde_json::Value;
use std::fmt;

/// First-level administrative divisions of the dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RegionCode {
    #[serde(rename = "NSW")]
    Nsw,
    #[serde(rename = "VIC")]
    Vic,
    #[serde(rename = "QLD")]
    Qld,
    #[serde(rename = "WA")]
    Wa,
    #[serde(rename = "SA")]
    Sa,
    #[serde(rename = "TAS")]
    Tas,
    #[serde(rename = "NT")]
    Nt,
    #[serde(rename = "ACT")]
    Act,
}

impl RegionCode {
    /// All regions in region-button order
    pub const ALL: [RegionCode; 8] = [
        RegionCode::Nsw,
        RegionCode::Vic,
        RegionCode::Qld,
        RegionCode::Wa,
        RegionCode::Sa,
        RegionCode::Tas,
        RegionCode::Nt,
        RegionCode::Act,
    ];

    /// Short code, e.g. `"QLD"`
    pub fn code(&self) -> &'static str {
        self.entry().code
    }

    /// Display name, e.g. `"Queensland"`
    pub fn display_name(&self) -> &'static str {
        self.entry().display_name
    }

    fn entry(&self) -> &'static RegionEntry {
        // REGION_TABLE is laid out in `ALL` order
        &REGION_TABLE[*self as usize]
    }
}

impl fmt::Display for RegionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// One row of the fixed region table
#[derive(Debug)]
struct RegionEntry {
    region: RegionCode,
    code: &'static str,
    display_name: &'static str,
    /// Extra spellings seen in boundary files, beyond code and display name
    aliases: &'static [&'static str],
}

static REGION_TABLE: [RegionEntry; 8] = [
    RegionEntry { region: RegionCode::Nsw, code: "NSW", display_name: "New South Wales", aliases: &[] },
    RegionEntry { region: RegionCode::Vic, code: "VIC", display_name: "Victoria", aliases: &["Vic.", "Vic"] },
    RegionEntry { region: RegionCode::Qld, code: "QLD", display_name: "Queensland", aliases: &["Qld"] },
    RegionEntry { region: RegionCode::Wa, code: "WA", display_name: "Western Australia", aliases: &[] },
    RegionEntry { region: RegionCode::Sa, code: "SA", display_name: "South Australia", aliases: &[] },
    RegionEntry { region: RegionCode::Tas, code: "TAS", display_name: "Tasmania", aliases: &["Tas.", "Tas"] },
    RegionEntry { region: RegionCode::Nt, code: "NT", display_name: "Northern Territory", aliases: &[] },
    RegionEntry { region: RegionCode::Act, code: "ACT", display_name: "Australian Capital Territory", aliases: &[] },
];

/// Paths into a raw mark datum that may carry a region name, probed in order
pub const REGION_PAYLOAD_PATHS: [&[&str]; 5] = [
    &["state"],
    &["properties", "STE_NAME21"],
    &["properties", "STATE_NAME"],
    &["properties", "STE_NAME16"],
    &["properties", "state"],
];

/// How the tabular dataset spells regions in its `state` column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TabularKeyStyle {
    /// Full names, e.g. `"Queensland"`
    #[default]
    DisplayName,
    /// Short codes, e.g. `"QLD"`
    Code,
}

/// Maps between boundary-file spellings, tabular keys and region codes
#[derive(Debug, Clone)]
pub struct RegionResolver {
    by_key: AHashMap<&'static str, RegionCode>,
    tabular_style: TabularKeyStyle,
}

impl RegionResolver {
    pub fn new(tabular_style: TabularKeyStyle) -> Self {
        let mut by_key = AHashMap::new();
        for entry in REGION_TABLE.iter() {
            by_key.insert(entry.code, entry.region);
            by_key.insert(entry.display_name, entry.region);
            for alias in entry.aliases {
                by_key.insert(*alias, entry.region);
            }
        }

        Self { by_key, tabular_style }
    }

    /// Resolve any known spelling to its region. Matching is exact and case-sensitive.
    pub fn resolve_region_code(&self, key: &str) -> Option<RegionCode> {
        self.by_key.get(key).copied()
    }

    pub fn display_name(&self, code: RegionCode) -> &'static str {
        code.display_name()
    }

    /// Spelling used in the tabular dataset's region column
    pub fn tabular_key(&self, code: RegionCode) -> &'static str {
        match self.tabular_style {
            TabularKeyStyle::DisplayName => code.display_name(),
            TabularKeyStyle::Code => code.code(),
        }
    }

    /// Every spelling registered for `code`, code and display name first
    pub fn spellings(&self, code: RegionCode) -> Vec<&'static str> {
        let entry = code.entry();
        let mut spellings = vec![entry.code, entry.display_name];
        spellings.extend_from_slice(entry.aliases);
        spellings
    }

    /// Find the region named by a raw mark datum.
    ///
    /// Walks [`REGION_PAYLOAD_PATHS`] and returns the first string value that
    /// resolves. Payloads naming no known region (map background, ocean) yield
    /// `None`.
    pub fn extract_region(&self, datum: &Value) -> Option<RegionCode> {
        REGION_PAYLOAD_PATHS.iter().find_map(|path| {
            let value = path.iter().try_fold(datum, |node, segment| node.get(segment))?;
            value.as_str().and_then(|key| self.resolve_region_code(key))
        })
    }
}

impl Default for RegionResolver {
    fn default() -> Self {
        Self::new(TabularKeyStyle::default())
    }
}
