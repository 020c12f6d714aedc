//! kodegen_bundler_launcher - native launcher bundler for JVM applications.

use kodegen_bundler_launcher::cli;
use kodegen_bundler_launcher::cli::OutputManager;
use std::process;

#[tokio::main]
async fn main() {
    env_logger::init();

    match cli::run().await {
        Ok(exit_code) => process::exit(exit_code),
        Err(e) => {
            let output = OutputManager::new(false);
            output.error(&e.to_string());

            let suggestions = e.recovery_suggestions();
            if !suggestions.is_empty() {
                let _ = output.println("\nSuggestions:");
                for suggestion in suggestions {
                    let _ = output.indent(&format!("• {suggestion}"));
                }
            }
            process::exit(1);
        }
    }
}
