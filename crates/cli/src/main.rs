use std::process::ExitCode;

fn main() -> ExitCode {
    curbreport_cli::run()
}
