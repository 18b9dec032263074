extern crate clap;
extern crate wizexport_lib;

pub mod app;
