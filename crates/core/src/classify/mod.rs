//! Stateless intent classifiers. Absence of a match is `None` or score 0,
//! never an error.

pub mod command;
pub mod hybrid;
pub mod mood;
pub mod product;
pub mod similarity;
pub mod teaching;
