mod state;

pub use state::{CategoryTally, MechanicRing, PerformanceWindow, SessionState, TestPhase};
