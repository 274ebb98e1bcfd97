// Main entry point that forwards to the xwfc-app library
fn main() {
    // Exit with the same code as the app
    std::process::exit(match xwfc_app::run() {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {e:#}");
            1
        }
    });
}
