//! Browsing-session preparation and sign-in detection
//!
//! # Components
//!
//! - `SessionGuard`: location-based check run right after the first navigation
//! - `probe_authentication`: standalone "are these cookies still good" check
//! - `parse_credentials` / `establish_session`: turn a credential blob into
//!   cookies on a fresh browser

mod credentials;
mod guard;

pub use credentials::{establish_session, parse_credentials, validate_search_url, Credential};
pub use guard::{probe_authentication, AuthProbe, SessionGuard};
