//! List rules command implementation.

use errchecklog_core::Config;
use errchecklog_rules::all_rules;

/// Runs the list-rules command.
pub fn run() {
    println!("Available rules:\n");
    println!("{:<10} {:<15} Description", "Code", "Name");
    println!("{}", "-".repeat(80));

    for rule in all_rules(&Config::default()) {
        println!(
            "{:<10} {:<15} {}",
            rule.code(),
            rule.name(),
            rule.description()
        );
    }

    println!("\nThe errchecklog rule is inactive until both options are set, e.g.:");
    println!("  errchecklog check --ifacepkg example.com/app/logging --ifacename Reporter");
    println!("or in errchecklog.toml:");
    println!("  [rules.errchecklog]");
    println!("  ifacepkg = \"example.com/app/logging\"");
    println!("  ifacename = \"Reporter\"");
}
