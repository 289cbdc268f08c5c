//! Banner and branding for the AutoPPT CLI

use console::{style, Term};

/// Display the AutoPPT banner
pub fn display_banner() {
    let term = Term::stdout();
    let version = env!("CARGO_PKG_VERSION");

    let banner = format!(
        r#"
    _         _        ____  ____ _____
   / \  _   _| |_ ___ |  _ \|  _ \_   _|
  / _ \| | | | __/ _ \| |_) | |_) || |
 / ___ \ |_| | || (_) |  __/|  __/ | |
/_/   \_\__,_|\__\___/|_|   |_|    |_|
        AI Presentation Generator v{}
"#,
        version
    );

    let _ = term.write_line(&style(banner).cyan().to_string());
    let _ = term.write_line(&style("=".repeat(60)).dim().to_string());
    let _ = term.write_line("");
}

/// Display minimal banner (for non-interactive output)
pub fn display_minimal_banner() {
    let version = env!("CARGO_PKG_VERSION");
    println!(
        "{}",
        style(format!("AutoPPT v{} - AI Presentation Generator", version))
            .cyan()
            .bold()
    );
    println!("{}", style("=".repeat(60)).dim());
}
