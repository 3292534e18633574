#![doc(html_root_url = "https://docs.rs/lumen/0.1.0")]

//! <h1 align="center">LUMEN - Board-attached LED control</h1>
//! <div style="text-align:center;font-style:italic;">Lumen drives LEDs wired to a remotely controlled board - written in Rust.</div>
//!
//! # Features
//!
//! **Lumen** controls LEDs attached to the output pins of an Arduino (or compatible) board, through
//! whatever [`IoProtocol`](io::IoProtocol) talks to that board.
//!
//! - Attach a [`Led`](devices::Led) to a [`Board`](hardware::Board) pin, wired active high or active low
//!   (see [`DriveMode`](devices::DriveMode))
//! - Turn it on, off, toggle it or set its intensity (continuous on PWM pins, on/off otherwise)
//! - Know when the board actually applied a level through a [`Confirmation`](io::Confirmation)
//! - Blink it in the background with a callback per phase, on a drift-free period
//!
//! # Getting Started
//!
//! - Add the following to your `Cargo.toml`:
//! ```toml
//! [dependencies]
//! lumen = "0.1.0"
//! ```
//!
//! The following code blinks the Arduino embedded led on pin 13 (on a mocked board here):
//! ```ignore
//! use lumen::devices::Led;
//! use lumen::hardware::Board;
//! use lumen::mocks::io_protocol::MockIoProtocol;
//! use lumen::pause;
//!
//! #[lumen::runtime]
//! async fn main() {
//!     let board = Board::new(MockIoProtocol::default()).open().unwrap();
//!
//!     // Register a LED on pin 13 (arduino embedded led).
//!     let mut led = Led::new(&board, 13).unwrap();
//!
//!     // Blinks the LED every 500ms.
//!     led.blink_with(500, |pin| async move {
//!         println!("LED level is now {}", pin.state);
//!         Ok(())
//!     }).unwrap();
//!
//!     pause!(3000);
//!     led.stop_blink().unwrap();
//! }
//! ```
//!
//! # Feature flags
//!
//! - **serde** -- Enables serialize/deserialize capabilities for boards, protocols and LEDs.
//! - **mocks** -- Provides a mocked board protocol (useful for tests and demos mostly).

#[cfg(test)]
extern crate self as lumen;

pub mod devices;
pub mod errors;
pub mod hardware;
pub mod io;
#[cfg(any(test, feature = "mocks"))]
pub mod mocks;
pub mod utils;

pub use lumen_macros::runtime;
