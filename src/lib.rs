pub mod cli;
pub mod controller;
pub mod io;
pub mod logging;
pub mod model;
pub mod ops;
pub mod service;
pub mod sync;
pub mod table;
pub mod tree;
pub mod tui;
pub mod util;
