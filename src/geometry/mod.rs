pub mod teapot;
pub mod triangle;
