pub mod backend;
pub mod config;
pub mod font;
pub mod metric;
pub mod plot;
pub mod routing;
pub mod sheet;
pub mod source;
