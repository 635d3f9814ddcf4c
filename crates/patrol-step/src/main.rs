use std::process::ExitCode;

fn main() -> ExitCode {
    match patrol_step::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {}", err);
            for cause in err.chain().skip(1) {
                eprintln!("  caused by: {}", cause);
            }
            eprintln!("Please check the logs for more details.");
            ExitCode::FAILURE
        }
    }
}
