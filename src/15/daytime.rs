use log::debug;
use rust_daytime::reporter::Reporter;
use rust_daytime::{client, quit_err, DAYTIME_PORT};
use std::env;
use std::io;

fn main() {
    env_logger::init();

    let reporter = Reporter::new("daytime");
    let args: Vec<String> = env::args().collect();

    if args.len() != 2 {
        reporter.fatal(&quit_err!("usage: daytime <IPaddress>"));
    }

    let result = {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        client::run(&args[1], DAYTIME_PORT, &mut out)
    };

    match result {
        Ok(n) => debug!("{} bytes from {}", n, &args[1]),
        Err(diag) => reporter.fatal(&diag),
    }
}
