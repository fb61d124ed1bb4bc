//! VELA ― Vector Encrypted Light Arithmetic  (research prototype)

#![forbid(unsafe_code)]
#![warn(clippy::pedantic, missing_docs)]

extern crate rand;

pub mod polynomial;
pub mod cipher;
pub mod params;
pub mod channel;
pub mod scheme;
pub mod evaluator;
pub mod ptxt;
pub mod engine;
pub mod handle;
pub mod error;
pub mod ntt;

pub use channel::Channel;
pub use cipher::Cipher;
pub use polynomial::Polynomial;
pub use params::Params;
pub use scheme::Scheme;
pub use evaluator::Evaluator;
pub use engine::Engine;
pub use handle::{CtxtHandle, Operand};
pub use ptxt::Ptxt;
pub use error::{Error, Result};
