//! SoftDevice glue for the central firmware.
//!
//! The session logic lives in the `central_uart` library; these modules
//! turn SoftDevice calls into session events and carry out its actions:
//!
//! 1. **Scanner** - active scan with the name filter.
//! 2. **NUS Client** - GATT discovery, subscription and payload writes.
//! 3. **Link** - the central task: drives the session, runs the send
//!    loop while connected, and re-arms scanning through the work queue.

pub mod link;
pub mod nus_client;
pub mod scanner;
