//! The parser driver (§4.4): consumes SAX-style events and grows a
//! [`BuilderNode`](crate::builder_node::BuilderNode) tree under a roving
//! cursor, applying locale filtering as it goes.

mod xml_driver;

pub use xml_driver::parse_import;
