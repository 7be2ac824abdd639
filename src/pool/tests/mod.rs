mod common;

mod season;
mod service;
