use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Question bank is malformed: {0}")]
    BankMalformed(String),

    #[error("Question bank has no questions at level {0} (levels 0-5 must all be stocked)")]
    BankLevelGap(u8),

    #[error("Invalid level value: {0} (must be 0-5)")]
    InvalidLevel(u8),

    #[error("No unused questions remain at any level")]
    OutOfQuestions,

    #[error("Session is already complete")]
    SessionComplete,

    #[error("Session is not complete yet ({answered}/{expected} questions answered)")]
    SessionIncomplete { answered: usize, expected: usize },

    #[error("A question is already outstanding: {0}")]
    QuestionOutstanding(String),

    #[error("No question is outstanding; call next_question first")]
    NoOutstandingQuestion,

    #[error("Answer targets question {got} but {expected} is outstanding")]
    UnexpectedQuestion { expected: String, got: String },
}
