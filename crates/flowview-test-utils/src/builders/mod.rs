//! Builders for view test setups.

mod view;

pub use view::TestView;
