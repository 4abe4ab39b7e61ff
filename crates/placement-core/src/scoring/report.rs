//! Placement report types, as emitted at the end of a test.

use serde::{Deserialize, Serialize};

use crate::domain::NovakidLevel;

/// Final report for one completed (or early-ended) test session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlacementReport {
    pub placement: Placement,
    pub skill_analysis: SkillAnalysis,
    pub recommendations: Recommendations,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Placement {
    pub novakid_level: NovakidLevel,
    /// How much weight to put on this placement, 0.0-1.0.
    pub confidence: f64,
    pub cefr_equivalent: String,
    pub level_justification: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SkillAnalysis {
    pub vocabulary: SkillReport,
    pub pronunciation: SkillReport,
    pub grammar: SkillReport,
}

/// Score and supporting evidence for one skill bucket. `score` is `None`
/// when the session produced no items for the bucket.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SkillReport {
    pub score: Option<f64>,
    pub evidence: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recommendations {
    pub immediate_focus: Vec<String>,
    pub strengths_to_build_on: Vec<String>,
    pub suggested_starting_point: String,
    pub estimated_progress: String,
}

impl PlacementReport {
    /// Check the bounds an advisory analyzer's report must satisfy before it
    /// may replace the fallback. The level itself is range-checked by its
    /// type during deserialization.
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.placement.confidence) {
            return Err(format!(
                "confidence {} outside [0, 1]",
                self.placement.confidence
            ));
        }
        if self.placement.cefr_equivalent.is_empty() {
            return Err("empty cefr_equivalent".to_string());
        }
        if self.recommendations.suggested_starting_point.is_empty() {
            return Err("empty suggested_starting_point".to_string());
        }
        for report in [
            &self.skill_analysis.vocabulary,
            &self.skill_analysis.pronunciation,
            &self.skill_analysis.grammar,
        ] {
            if let Some(score) = report.score {
                if !(0.0..=1.0).contains(&score) {
                    return Err(format!("skill score {score} outside [0, 1]"));
                }
            }
        }
        Ok(())
    }
}
