pub mod adjustment;
pub mod advisor;
pub mod answers;
pub mod bank;
pub mod config;
pub mod domain;
pub mod engine;
pub mod scoring;
pub mod selection;
pub mod session;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

// Re-export commonly used types
pub use domain::{
    AnsweredRecord, BalanceSide, EngineError, Mechanic, MechanicCategory, MechanicPayload,
    NovakidLevel, Question, ServedQuestion, Skill, SkillBucket, SortItem,
};

pub use answers::{answer_key, check_answer, AnswerInput, CheckedAnswer, SelfAssessment};

pub use bank::QuestionBank;

pub use config::EngineConfig;

pub use engine::PlacementEngine;

pub use scoring::{
    build_fallback_report, Placement, PlacementReport, Recommendations, SkillAnalysis,
    SkillReport,
};

pub use advisor::{AdvisorError, AdvisorRequest, PlacementAdvisor};

pub use session::{CategoryTally, MechanicRing, PerformanceWindow, SessionState, TestPhase};
