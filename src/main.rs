fn main() {
    if let Err(e) = ea_rs::adapters::run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
