
pub mod assemble;
pub mod catalog;
pub mod cycle;
pub mod interp;
pub mod io;
pub mod restack;

pub mod calendar;
pub mod error;
pub mod parameters;
