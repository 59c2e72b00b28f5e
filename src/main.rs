fn main() {
    if let Err(err) = runstats_tui::cli::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
