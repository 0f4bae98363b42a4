fn main() {
    if let Err(err) = todo_tui::cli::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
