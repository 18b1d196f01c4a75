fn main() {
    if let Err(e) = scalebench_cli::run() {
        eprintln!("scalebench: {e:#}");
        std::process::exit(1);
    }
}
