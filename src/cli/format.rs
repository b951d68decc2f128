use crate::compile::Resolution;
use crate::config::{RuleSetting, Severity};
use crate::diagnostics::Warning;
use crate::scan::ScanResult;
use serde_json::json;

fn options_str(rule: &RuleSetting) -> String {
    rule.options
        .iter()
        .map(|o| o.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Print each file's effective rules with ANSI colors.
pub fn print_pretty(result: &ScanResult) {
    for f in &result.files {
        println!("\n\x1b[4m{}\x1b[0m", f.file);
        match &f.resolution {
            Resolution::Ignored => println!("  \x1b[90mignored\x1b[0m"),
            Resolution::Active(config) if config.rules.is_empty() && f.layers.is_empty() => {
                println!("  \x1b[90mno rules\x1b[0m")
            }
            Resolution::Active(config) => {
                if !f.layers.is_empty() {
                    println!("  \x1b[90mvia overrides {}\x1b[0m", f.layers.join(", "));
                }
                for rule in config.rules.values() {
                    let severity_str = match rule.severity {
                        Severity::Error => "\x1b[31merror\x1b[0m",
                        Severity::Warn => "\x1b[33mwarn \x1b[0m",
                        Severity::Off => "\x1b[90moff  \x1b[0m",
                    };
                    println!(
                        "  {} {:<40} \x1b[90m{}\x1b[0m",
                        severity_str,
                        rule.id,
                        options_str(rule)
                    );
                }
            }
        }
    }

    print_warnings(&result.warnings);

    let ignored = result.ignored_count();
    println!(
        "\n\x1b[1m{} file{} resolved, {} ignored\x1b[0m",
        result.files.len(),
        if result.files.len() == 1 { "" } else { "s" },
        ignored
    );
}

/// Print assembly warnings, if any.
pub fn print_warnings(warnings: &[Warning]) {
    for w in warnings {
        eprintln!("\x1b[33mwarning\x1b[0m: {}", w);
    }
}

/// Print resolutions as structured JSON.
pub fn print_json(result: &ScanResult) {
    let files: Vec<_> = result
        .files
        .iter()
        .map(|f| match &f.resolution {
            Resolution::Ignored => json!({ "file": f.file, "status": "ignored" }),
            Resolution::Active(config) => json!({
                "file": f.file,
                "status": "active",
                "overrides": f.layers,
                "rules": config.rules,
                "settings": config.settings,
            }),
        })
        .collect();

    let output = json!({
        "config": result.config_name,
        "files": files,
        "warnings": result.warnings.iter().map(|w| w.to_string()).collect::<Vec<_>>(),
        "summary": {
            "files": result.files.len(),
            "ignored": result.ignored_count(),
            "warnings": result.warnings.len(),
        },
    });

    println!("{:#}", output);
}
