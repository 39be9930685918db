/*!
Foreign Function Interface (FFI) module for the TNCCS session layer.

This module exposes the batch channel to IMC/IMV modules written against
the C IF-IMC/IF-IMV API.
*/

mod c_api;

pub use c_api::*;
