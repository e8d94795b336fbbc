//! Business logic services.
//!
//! Services contain the check-in rules separated from HTTP handlers and from
//! the kiosk session state machine.

pub mod code_parser;
pub mod invitation_validator;
pub mod notification_dispatcher;
pub mod registrar;
