//! Read entities definitions.

pub mod invoice;
pub mod quotation;
