#![allow(clippy::multiple_crate_versions)]

//! Gifpaper - animated GIF wallpapers.
//!
//! Usage: `gifpaper [GIF] [--fps N] [--format png|jpeg|gif] [--config PATH]`.
//! Once running, commands are read from stdin (`help` lists them).

fn main() {
    if let Err(err) = gifpaper_lib::run() {
        eprintln!("gifpaper: {err}");
        std::process::exit(1);
    }
}
