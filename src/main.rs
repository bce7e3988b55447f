fn main() {
    framecurate::init_tracing();

    if let Err(err) = framecurate::run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}
