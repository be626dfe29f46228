//! Native adapters for the booking flow, used by the `astro-booking-cli` binary
//! to drive submissions and tickets from the terminal.

pub mod adapters;
pub mod settings;

pub use adapters::{
    ConsoleForm, DirSessionStore, FileNormalizer, FileTicketHost, ReqwestDelivery,
    StdoutNavigator, TokioTimer,
};
pub use settings::{load_config, resolve_endpoint, Overrides};
