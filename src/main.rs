use vexl_rust::run_vexl;

use std::io::{self, Read};

fn main() {
    let mut input = String::new();
    io::stdin().read_to_string(&mut input).unwrap();

    let result = run_vexl(&input);
    println!("{}", vexl_rust::json::to_json_pretty(&result.sketch));

    if !result.has_errors() {
        return;
    }
    for err in result.all_errors() {
        eprintln!("{}", err);
    }
    // Warnings alone don't fail the run.
    if result.all_errors().any(|e| !e.is_warning()) {
        std::process::exit(1);
    }
}
