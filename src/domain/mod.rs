mod atm;
mod bank;
mod client;
mod entity;
mod page;
mod withdrawal;

pub use atm::*;
pub use bank::*;
pub use client::*;
pub use entity::*;
pub use page::*;
pub use withdrawal::*;
