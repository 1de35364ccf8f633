//! Mosaic Serial Protocol
//!
//! This crate defines the line-oriented serial protocol between a host
//! client and the Mosaic display controller. The protocol carries two
//! kinds of traffic over one port:
//!
//! - newline-terminated ASCII command lines (`CMD:`, `DISPLAY:`,
//!   `SIZE:`, transfer markers), and
//! - a raw binary pixel stream (big-endian RGB565, two bytes per pixel)
//!   while a bitmap transfer is active.
//!
//! # Transfer sequence
//!
//! ```text
//! Client                        Controller
//!   DISPLAY:<name>          ->
//!                           <-  DISPLAY_READY:<name>
//!   BMPStart                ->
//!                           <-  Start marker received
//!   SIZE:<w>,<h>            ->
//!                           <-  READY
//!   <w*h RGB565 pixels>     ->
//!                           <-  Progress: ...
//!   BMPEnd                  ->
//!                           <-  COMPLETE
//! ```
//!
//! This crate owns only the wire side: incremental line assembly and the
//! typed command grammar. The state machine that interprets commands
//! lives in `mosaic-core`.

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
extern crate std;

pub mod command;
pub mod line;

pub use command::{
    Command, Edge, FrameSetting, MenuCommand, ParseError, UsableAreaUpdate,
};
pub use line::{LineError, LineReader, MAX_LINE_LEN};
