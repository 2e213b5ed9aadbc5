#[cfg(test)]
#[macro_use]
extern crate quickcheck;

pub mod boot;
pub mod config;
pub mod device;
pub mod probe;
pub mod select;
pub mod syscall;
#[cfg(test)]
mod test_utils;
