pub mod dlq;
pub mod ledger;

pub use dlq::{DeadLetter, DeadLetterQueue, DlqStats};
pub use ledger::{InventoryLedger, RedriveReport, ReleaseReport, Reservation, Reservations};
