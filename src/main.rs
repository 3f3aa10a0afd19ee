fn main() {
    if let Err(err) = tcg_reprice::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
