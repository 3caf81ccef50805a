use watch_viewer::cli::CliOverrides;
use watch_viewer::run_with_overrides;

fn main() {
    let cli = match CliOverrides::parse_from_env() {
        Ok(parsed) => parsed,
        Err(err) => {
            eprintln!("[cli] {err}");
            std::process::exit(2);
        }
    };
    if let Err(err) = run_with_overrides(cli) {
        eprintln!("Viewer error: {err:?}");
        std::process::exit(1);
    }
}
