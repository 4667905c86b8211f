pub mod calculator;
pub mod metrics;
pub mod repository;
pub mod scheduler;
pub mod sequencer;

pub use repository::FinanceRepository;
pub use scheduler::{RecurringScheduler, TickOutcome};
pub use sequencer::NumberSequencer;
