#![no_std]
#![warn(clippy::std_instead_of_alloc, clippy::std_instead_of_core)]

pub mod blockmode;
pub mod traits;

#[cfg(any(feature = "std", test))]
#[macro_use]
extern crate std;
