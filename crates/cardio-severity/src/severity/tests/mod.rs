pub(crate) mod common;

mod batch;
