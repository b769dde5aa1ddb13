#![forbid(unsafe_code)]

//! Session lifecycle for the exam practice engine: building a quiz from
//! question banks, the in-progress attempt state machine, and the
//! exactly-once submit workflow against the history store.

pub mod error;
pub mod session;

pub use exam_core::Clock;

pub use error::SessionError;
pub use session::{
    Presentation, QuizService, QuizSession, SessionBuilder, SessionProgress, SessionStore,
    SubmitOutcome,
};
