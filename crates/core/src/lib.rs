pub mod models;
pub mod parsing;
pub mod state;
pub mod status;
pub mod validation;

pub use models::{Invoice, Receipt, Settings};
pub use state::{PaymentEvent, PaymentState, TransitionError};
