pub(crate) mod common;

mod ranking;
