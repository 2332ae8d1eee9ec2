pub(crate) mod common;

mod rules;
