//! The elements of a parsed tree, their names, attributes and recorded locations.
//!
//! Comments, processing instructions and CDATA markers are not materialized; text is stored
//! on the element it belongs to (see [`Element::text`] and [`Element::tail`]).
mod name;
pub use name::*;

mod attribute;
pub use attribute::*;

mod location;
pub use location::*;

mod element;
pub use element::*;
