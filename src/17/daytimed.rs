use rust_daytime::reporter::Reporter;
use rust_daytime::{daemon, quit_err, server};
use std::env;

fn main() {
    env_logger::init();

    let mut reporter = Reporter::new("daytimed");
    let mut argv = env::args();
    let program = argv.next().unwrap_or_else(|| "daytimed".to_string());
    let args: Vec<String> = argv.collect();

    let config = match server::parse_args(&args) {
        Ok(Some(config)) => config,
        Ok(None) => {
            print!("{}", server::usage(&program));
            return;
        }
        Err(why) => reporter.fatal(&quit_err!("{:#}; try '{} --help'", why, program)),
    };

    let listener = match server::listen_socket(config.port) {
        Ok(listener) => listener,
        Err(diag) => reporter.fatal(&diag),
    };

    if !config.debug_mode {
        if let Err(diag) = daemon::become_daemon(&mut reporter) {
            reporter.fatal(&diag);
        }
    }

    if let Err(diag) = server::server_main(&listener, config.count, &mut reporter) {
        reporter.fatal(&diag);
    }
}
