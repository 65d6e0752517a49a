//! Startup banner

use super::constants::{API_PREFIX, APP_NAME};
use crate::api::middleware::is_all_interfaces;

/// Print the API address and where spans are read from
pub fn print_banner(host: &str, port: u16, source: &str) {
    let display_host = if is_all_interfaces(host) {
        "localhost"
    } else {
        host
    };

    println!();
    println!(
        "  \x1b[1m\x1b[36m{}\x1b[0m \x1b[90mv{}\x1b[0m",
        APP_NAME,
        env!("CARGO_PKG_VERSION")
    );
    println!();

    const W: usize = 10;
    println!(
        "  \x1b[32m➜\x1b[0m  \x1b[1m{:<W$}\x1b[0m \x1b[36mhttp://{}:{}{}\x1b[0m",
        "API:", display_host, port, API_PREFIX
    );
    println!("  \x1b[33m➜\x1b[0m  \x1b[1m{:<W$}\x1b[0m {}", "Spans:", source);
    println!();
}
