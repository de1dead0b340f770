use mfascrape_env::EnvError;

fn main() {
    if let Err(e) = mfascrape::run_cli() {
        eprintln!("{e:?}");
        // A failing tool or installer hands its own status through.
        let code = e.downcast_ref::<EnvError>().map_or(1, EnvError::exit_code);
        std::process::exit(code);
    }
}
