#![forbid(unsafe_code)]

pub mod cache;
pub mod coordinator;
pub mod error;
pub mod handler;
pub mod replies;
pub mod transport;

pub use cache::{FillTicket, ProgressCache};
pub use coordinator::{DEFAULT_STORE_TIMEOUT, Durability, ProgressCoordinator};
pub use error::{InteractionError, ProgressError, TransportError};
pub use handler::{Command, SessionHandler};
pub use transport::{ChoiceButton, InboundEvent, Transport};
