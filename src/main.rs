fn main() {
    if let Err(err) = eav_pivot::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
