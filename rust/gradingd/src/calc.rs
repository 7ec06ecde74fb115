use serde::{Deserialize, Serialize};

use crate::error::GradeError;
use crate::scale::GradeScale;

/// Tolerance for weight tables that should total 100 percentage points.
pub const WEIGHT_SUM_EPSILON: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Term {
    Midterm,
    FinalTerm,
}

impl Term {
    pub fn as_str(self) -> &'static str {
        match self {
            Term::Midterm => "midterm",
            Term::FinalTerm => "finalTerm",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Component {
    ClassStanding,
    Laboratory,
    MajorOutput,
}

impl Component {
    pub const ALL: [Component; 3] = [
        Component::ClassStanding,
        Component::Laboratory,
        Component::MajorOutput,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Component::ClassStanding => "classStanding",
            Component::Laboratory => "laboratory",
            Component::MajorOutput => "majorOutput",
        }
    }
}

/// Per-section category weights, in percentage points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradingSchema {
    pub class_standing: f64,
    pub laboratory: f64,
    pub major_output: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_laboratory: Option<bool>,
}

impl GradingSchema {
    pub fn weight(&self, c: Component) -> f64 {
        match c {
            Component::ClassStanding => self.class_standing,
            Component::Laboratory => self.laboratory,
            Component::MajorOutput => self.major_output,
        }
    }

    /// Explicit flag when given, otherwise inferred from the laboratory weight.
    pub fn has_laboratory(&self) -> bool {
        self.has_laboratory.unwrap_or(self.laboratory > 0.0)
    }

    pub fn validate(&self) -> Result<(), GradeError> {
        for c in Component::ALL {
            let w = self.weight(c);
            if !w.is_finite() || !(0.0..=100.0).contains(&w) {
                return Err(GradeError::invalid_schema(
                    format!("{} weight must be within 0..=100, got {}", c.as_str(), w),
                    None,
                ));
            }
        }
        if self.has_laboratory == Some(false) && self.laboratory != 0.0 {
            return Err(GradeError::invalid_schema(
                "laboratory weight must be 0 when hasLaboratory is false",
                None,
            ));
        }
        let sum = self.class_standing + self.laboratory + self.major_output;
        if (sum - 100.0).abs() > WEIGHT_SUM_EPSILON {
            return Err(GradeError::invalid_schema(
                format!("weights must sum to 100, got {}", sum),
                Some(sum),
            ));
        }
        Ok(())
    }
}

/// Raw percentages for one student in one term. `None` means not recorded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ComponentScoreSet {
    pub class_standing: Option<f64>,
    pub laboratory: Option<f64>,
    pub major_output: Option<f64>,
}

impl ComponentScoreSet {
    pub fn get(&self, c: Component) -> Option<f64> {
        match c {
            Component::ClassStanding => self.class_standing,
            Component::Laboratory => self.laboratory,
            Component::MajorOutput => self.major_output,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TermWeights {
    pub midterm: f64,
    pub final_term: f64,
}

impl Default for TermWeights {
    fn default() -> Self {
        Self {
            midterm: 50.0,
            final_term: 50.0,
        }
    }
}

impl TermWeights {
    pub fn validate(&self) -> Result<(), GradeError> {
        for (name, w) in [("midterm", self.midterm), ("finalTerm", self.final_term)] {
            if !w.is_finite() || !(0.0..=100.0).contains(&w) {
                return Err(GradeError::invalid_schema(
                    format!("{} term weight must be within 0..=100, got {}", name, w),
                    None,
                ));
            }
        }
        let sum = self.midterm + self.final_term;
        if (sum - 100.0).abs() > WEIGHT_SUM_EPSILON {
            return Err(GradeError::invalid_schema(
                format!("term weights must sum to 100, got {}", sum),
                Some(sum),
            ));
        }
        Ok(())
    }
}

/// Half-up rounding to 2 decimals: `Int(100*x + 0.5) / 100`.
pub fn round_off_2_decimals(x: f64) -> f64 {
    ((100.0 * x) + 0.5).floor() / 100.0
}

fn check_percent(component: &'static str, v: f64) -> Result<f64, GradeError> {
    if !v.is_finite() || !(0.0..=100.0).contains(&v) {
        return Err(GradeError::InvalidScore {
            component,
            value: v,
        });
    }
    Ok(v)
}

/// Weighted term percentage, unrounded.
///
/// Components with a zero weight (the laboratory of a non-lab subject) are
/// skipped entirely, so any stray value supplied for them is ignored. An
/// absent score for a weighted component contributes nothing; use
/// [`missing_components`] to detect that case.
pub fn compute_term_grade(
    scores: &ComponentScoreSet,
    schema: &GradingSchema,
) -> Result<f64, GradeError> {
    schema.validate()?;

    let mut sum = 0.0_f64;
    for c in Component::ALL {
        let weight = schema.weight(c);
        if weight == 0.0 {
            continue;
        }
        let Some(v) = scores.get(c) else {
            continue;
        };
        let v = check_percent(c.as_str(), v)?;
        sum += v * weight / 100.0;
    }
    // Weights may exceed 100 by up to the epsilon.
    Ok(sum.min(100.0))
}

pub fn missing_components(scores: &ComponentScoreSet, schema: &GradingSchema) -> Vec<Component> {
    Component::ALL
        .into_iter()
        .filter(|c| schema.weight(*c) > 0.0 && scores.get(*c).is_none())
        .collect()
}

/// Combines both term grades. A single recorded term is never promoted to a
/// final grade; it is reported as incomplete instead.
pub fn compute_final_grade(
    midterm_grade: Option<f64>,
    final_term_grade: Option<f64>,
    term_weights: &TermWeights,
) -> Result<f64, GradeError> {
    term_weights.validate()?;

    let (m, f) = match (midterm_grade, final_term_grade) {
        (Some(m), Some(f)) => (m, f),
        (m, f) => {
            let mut missing = Vec::new();
            if m.is_none() {
                missing.push(Term::Midterm);
            }
            if f.is_none() {
                missing.push(Term::FinalTerm);
            }
            return Err(GradeError::IncompleteGrade { missing });
        }
    };
    for v in [m, f] {
        if !v.is_finite() || !(0.0..=100.0).contains(&v) {
            return Err(GradeError::OutOfRange { value: v });
        }
    }

    let value = m * term_weights.midterm / 100.0 + f * term_weights.final_term / 100.0;
    Ok(value.min(100.0))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Remarks {
    Passed,
    Failed,
    Incomplete,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Equivalent {
    pub equivalent_grade: f64,
    pub remarks: Remarks,
}

pub fn map_to_equivalent(numeric_grade: f64, scale: &GradeScale) -> Result<Equivalent, GradeError> {
    if !numeric_grade.is_finite() || !(0.0..=100.0).contains(&numeric_grade) {
        return Err(GradeError::OutOfRange {
            value: numeric_grade,
        });
    }
    let rounded = round_off_2_decimals(numeric_grade);
    let band = scale.lookup(rounded).ok_or(GradeError::OutOfRange {
        value: numeric_grade,
    })?;
    Ok(Equivalent {
        equivalent_grade: band.equivalent,
        remarks: if band.passed {
            Remarks::Passed
        } else {
            Remarks::Failed
        },
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RecordStatus {
    Unrecorded,
    Partial,
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingComponent {
    pub term: Term,
    pub component: Component,
}

/// Derived grade fields for one student in one section.
///
/// Only [`compute_grade_record`] builds these, so derived fields can never
/// drift from the inputs they came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeRecord {
    midterm_grade: Option<f64>,
    midterm_equivalent_grade: Option<f64>,
    final_term_grade: Option<f64>,
    final_term_equivalent_grade: Option<f64>,
    final_grade_numeric: Option<f64>,
    equivalent_grade: Option<f64>,
    final_grade: String,
    remarks: Remarks,
    status: RecordStatus,
    has_laboratory: bool,
    missing_components: Vec<MissingComponent>,
    scale_version: &'static str,
}

#[allow(dead_code)]
impl GradeRecord {
    pub fn midterm_grade(&self) -> Option<f64> {
        self.midterm_grade
    }

    pub fn final_term_grade(&self) -> Option<f64> {
        self.final_term_grade
    }

    pub fn final_grade_numeric(&self) -> Option<f64> {
        self.final_grade_numeric
    }

    pub fn equivalent_grade(&self) -> Option<f64> {
        self.equivalent_grade
    }

    pub fn final_grade(&self) -> &str {
        &self.final_grade
    }

    pub fn remarks(&self) -> Remarks {
        self.remarks
    }

    pub fn status(&self) -> RecordStatus {
        self.status
    }

    pub fn missing_components(&self) -> &[MissingComponent] {
        &self.missing_components
    }
}

fn recorded_term_grade(
    term: Term,
    scores: Option<&ComponentScoreSet>,
    schema: &GradingSchema,
    missing: &mut Vec<MissingComponent>,
) -> Result<Option<f64>, GradeError> {
    let Some(scores) = scores else {
        return Ok(None);
    };
    // Provided scores are range-checked even when the term is incomplete.
    let grade = compute_term_grade(scores, schema)?;
    let absent = missing_components(scores, schema);
    if !absent.is_empty() {
        missing.extend(
            absent
                .into_iter()
                .map(|component| MissingComponent { term, component }),
        );
        return Ok(None);
    }
    Ok(Some(grade))
}

/// Runs the full pipeline for one student. Every call recomputes from the
/// inputs; nothing is patched incrementally.
pub fn compute_grade_record(
    schema: &GradingSchema,
    midterm: Option<&ComponentScoreSet>,
    final_term: Option<&ComponentScoreSet>,
    term_weights: &TermWeights,
    scale: &GradeScale,
) -> Result<GradeRecord, GradeError> {
    schema.validate()?;
    term_weights.validate()?;

    let mut missing = Vec::new();
    let mid = recorded_term_grade(Term::Midterm, midterm, schema, &mut missing)?;
    let fin = recorded_term_grade(Term::FinalTerm, final_term, schema, &mut missing)?;

    let mid_eq = mid.map(|g| map_to_equivalent(g, scale)).transpose()?;
    let fin_eq = fin.map(|g| map_to_equivalent(g, scale)).transpose()?;

    let final_numeric = match compute_final_grade(mid, fin, term_weights) {
        Ok(v) => Some(v),
        Err(GradeError::IncompleteGrade { .. }) => None,
        Err(e) => return Err(e),
    };
    let final_eq = final_numeric
        .map(|g| map_to_equivalent(g, scale))
        .transpose()?;

    let (final_grade, remarks) = match final_eq {
        Some(eq) => (format!("{:.2}", eq.equivalent_grade), eq.remarks),
        None => ("INC".to_string(), Remarks::Incomplete),
    };
    let status = match (mid, fin) {
        (Some(_), Some(_)) => RecordStatus::Complete,
        (None, None) => RecordStatus::Unrecorded,
        _ => RecordStatus::Partial,
    };

    Ok(GradeRecord {
        midterm_grade: mid.map(round_off_2_decimals),
        midterm_equivalent_grade: mid_eq.map(|e| e.equivalent_grade),
        final_term_grade: fin.map(round_off_2_decimals),
        final_term_equivalent_grade: fin_eq.map(|e| e.equivalent_grade),
        final_grade_numeric: final_numeric.map(round_off_2_decimals),
        equivalent_grade: final_eq.map(|e| e.equivalent_grade),
        final_grade,
        remarks,
        status,
        has_laboratory: schema.has_laboratory(),
        missing_components: missing,
        scale_version: scale.version,
    })
}
