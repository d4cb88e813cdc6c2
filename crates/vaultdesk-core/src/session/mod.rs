//! Session lifecycle: who is signed in and which vaults they see.
//!
//! `SessionController` owns the `SessionState` and is the only writer of the
//! token store. Network work is split into begin/complete pairs joined by
//! tickets so a front-end can run requests in the background; results that
//! belong to a superseded session are dropped on arrival.

pub mod controller;
pub mod notice;
pub mod state;

pub use controller::{LoginTicket, RefreshTicket, SessionController};
pub use notice::{Notice, Operation, SessionError};
pub use state::{SessionState, View};
