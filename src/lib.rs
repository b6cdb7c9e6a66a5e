//! Tic-tac-toe played between two callers: each caller picks cells by dialing
//! digits on a phone while the board and the opponent's voice run in a browser.

pub mod api;
pub mod config;
pub mod identity;
pub mod logging;
pub mod matcher;
pub mod participant;
pub mod protocol;
pub mod registry;
pub mod relay;
pub mod room_name;
pub mod server;
pub mod session;
pub mod stats;
pub mod tictactoe;
pub mod transport;
pub mod webhook;
pub mod ws;

#[cfg(test)]
mod test_support;
#[cfg(test)]
mod test_transport;
