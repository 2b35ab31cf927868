//! UI <-> host message bridge: channel gate, wire contract, command
//! routing, and the stdio transport.

pub mod channel;
pub mod contract;
pub mod gate;
pub mod stdio;
