use std::process::ExitCode;

fn main() -> ExitCode {
    match pdfdesk::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let code = err.exit_code();
            eprintln!("Error: {:?}", anyhow::Error::from(err));
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}
