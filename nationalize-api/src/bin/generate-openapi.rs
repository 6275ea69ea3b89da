//! OpenAPI Specification Generator Binary
//!
//! Prints the Nationalize OpenAPI specification as JSON to stdout.
//!
//! Usage:
//!   cargo run -p nationalize-api --bin generate-openapi > openapi.json

use nationalize_api::ApiDoc;

fn main() {
    match ApiDoc::to_json() {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Failed to serialize OpenAPI spec: {}", e);
            std::process::exit(1);
        }
    }
}
