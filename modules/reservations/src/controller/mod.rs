pub mod confirm;
pub mod list;

pub use confirm::{AlwaysConfirm, ConfirmPrompt};
pub use list::{ActionError, ReservationList, ReservationListController};
