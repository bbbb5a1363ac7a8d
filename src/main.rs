mod args;
mod poll;

use clap::Parser;
use log::{debug, LevelFilter};
use snafu::ErrorCompat;

fn main() {
    let args = args::Args::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if args.verbose {
        builder.filter_level(LevelFilter::Debug);
    }
    builder.init();
    debug!("args: {:?}", args);

    let res = poll::run_poll(
        &args.config,
        args.reference.as_deref(),
        args.out.as_deref(),
        args.input.as_deref(),
        args.input_type.as_deref(),
    );

    if let Err(e) = res {
        eprintln!("An error occured: {}", e);
        if let Some(bt) = ErrorCompat::backtrace(&*e) {
            eprintln!("trace: {}", bt);
        }
        std::process::exit(1);
    }
}
