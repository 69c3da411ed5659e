use std::process;

fn main() {
    match docgen_cli::run() {
        Ok(code) => process::exit(code),
        Err(err) => {
            eprintln!("docgen error: {err}");
            process::exit(1);
        }
    }
}
