//! Institutional equivalence scale: percentage bands mapped to 1.00-5.00
//! equivalent grades.
//!
//! Tables here are policy constants. Each built-in scale is pinned by its
//! fingerprint in the tests below; changing a band means publishing a new
//! version, not editing an old one.

use anyhow::anyhow;
use serde::Serialize;
use sha2::{Digest, Sha256};

pub const DEFAULT_SCALE_VERSION: &str = "std-5pt-v1";

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Band {
    /// Inclusive lower bound; the band extends up to the previous band's bound.
    pub min_percent: f64,
    pub equivalent: f64,
    pub passed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeScale {
    pub version: &'static str,
    pub passing_equivalent: f64,
    pub bands: &'static [Band],
}

const fn band(min_percent: f64, equivalent: f64, passed: bool) -> Band {
    Band {
        min_percent,
        equivalent,
        passed,
    }
}

static STD_5PT_V1_BANDS: [Band; 10] = [
    band(97.0, 1.00, true),
    band(94.0, 1.25, true),
    band(91.0, 1.50, true),
    band(88.0, 1.75, true),
    band(85.0, 2.00, true),
    band(82.0, 2.25, true),
    band(79.0, 2.50, true),
    band(76.0, 2.75, true),
    band(75.0, 3.00, true),
    band(0.0, 5.00, false),
];

pub static STD_5PT_V1: GradeScale = GradeScale {
    version: DEFAULT_SCALE_VERSION,
    passing_equivalent: 3.00,
    bands: &STD_5PT_V1_BANDS,
};

static BUILT_IN: [&GradeScale; 1] = [&STD_5PT_V1];

impl GradeScale {
    pub fn by_version(version: &str) -> anyhow::Result<&'static GradeScale> {
        BUILT_IN
            .iter()
            .copied()
            .find(|s| s.version == version)
            .ok_or_else(|| anyhow!("unknown grade scale version: {version}"))
    }

    pub fn built_in() -> &'static [&'static GradeScale] {
        &BUILT_IN
    }

    /// Band containing `percent`, or `None` below the lowest bound.
    pub fn lookup(&self, percent: f64) -> Option<&Band> {
        self.bands.iter().find(|b| percent >= b.min_percent)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let Some(last) = self.bands.last() else {
            return Err(anyhow!("scale {} has no bands", self.version));
        };
        if last.min_percent != 0.0 {
            return Err(anyhow!(
                "scale {} does not cover 0% (lowest band starts at {})",
                self.version,
                last.min_percent
            ));
        }
        let mut seen_fail = false;
        for pair in self.bands.windows(2) {
            let (hi, lo) = (&pair[0], &pair[1]);
            if hi.min_percent <= lo.min_percent {
                return Err(anyhow!(
                    "scale {} bands must be strictly descending at {}",
                    self.version,
                    lo.min_percent
                ));
            }
            if hi.equivalent > lo.equivalent {
                return Err(anyhow!(
                    "scale {} is not monotonic at {}",
                    self.version,
                    lo.min_percent
                ));
            }
        }
        for b in self.bands {
            if !b.passed {
                seen_fail = true;
            } else if seen_fail {
                return Err(anyhow!(
                    "scale {} passes {} below a failing band",
                    self.version,
                    b.min_percent
                ));
            }
            if b.passed && b.equivalent > self.passing_equivalent {
                return Err(anyhow!(
                    "scale {} marks {} as passed beyond the passing threshold",
                    self.version,
                    b.equivalent
                ));
            }
        }
        Ok(())
    }

    pub fn canonical_text(&self) -> String {
        let mut out = format!("version={}\n", self.version);
        for b in self.bands {
            out.push_str(&format!(
                "{:.2}|{:.2}|{}\n",
                b.min_percent, b.equivalent, b.passed
            ));
        }
        out
    }

    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.canonical_text().as_bytes());
        format!("{:x}", hasher.finalize())
    }
}
