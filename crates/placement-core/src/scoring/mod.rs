mod report;
mod scorer;

pub use report::{Placement, PlacementReport, Recommendations, SkillAnalysis, SkillReport};
pub use scorer::build_fallback_report;
