//! # Types
//!
//! Wire and state types shared by the issuance, presentation, and
//! verification flows.

mod credential;
mod oauth;
mod presentation;

pub use self::credential::*;
pub use self::oauth::*;
pub use self::presentation::*;
