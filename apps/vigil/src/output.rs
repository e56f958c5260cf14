//! Output rendering for the check, gate, and rules commands.
//!
//! Supports `human` (default) and `json` outputs. The JSON form of `check`
//! carries the score and counts at the top level so the completion gate can
//! read them from a child process.

use crate::gate::{GateRun, TierProgress};
use crate::lint::LintRun;
use crate::models::work::Priority;
use crate::models::{Severity, Violation};
use crate::rules::RuleSet;
use crate::utils::{error_prefix, info_prefix, note_prefix, use_colors};
use owo_colors::OwoColorize;
use serde_json::json;
use serde_json::Value as JsonVal;

/// Candidates listed before the remainder is summarized.
const CANDIDATE_PREVIEW: usize = 10;

fn print_json(value: &JsonVal) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("{} failed to serialize output: {}", error_prefix(), e),
    }
}

fn severity_tag(sev: Severity, color: bool) -> (String, String) {
    let (tag, icon) = match sev {
        Severity::Error => ("⟦error⟧", "✖"),
        Severity::Warning => ("⟦warn⟧", "▲"),
        Severity::Info => ("⟦info⟧", "◆"),
    };
    if !color {
        return (tag.to_string(), icon.to_string());
    }
    match sev {
        Severity::Error => (tag.red().bold().to_string(), icon.red().to_string()),
        Severity::Warning => (tag.yellow().bold().to_string(), icon.yellow().to_string()),
        Severity::Info => (tag.blue().bold().to_string(), icon.blue().to_string()),
    }
}

fn violation_line(v: &Violation, color: bool) -> String {
    let (tag, icon) = severity_tag(v.severity, color);
    let loc = format!("{}:{}", v.file_path, v.line_number);
    let loc = if color { loc.bold().to_string() } else { loc };
    format!("{} {} {} ❲{}❳ {}", icon, tag, loc, v.rule_id, v.message)
}

/// Print a check run. `report` is the persisted report path, if any.
pub fn print_check(run: &LintRun, output: &str, report: Option<&str>) {
    if output == "json" {
        print_json(&compose_check_json(run, report));
        return;
    }
    let color = use_colors(output);
    let Some(source) = run.source else {
        println!(
            "{} No governed files found to validate; nothing to report.",
            info_prefix()
        );
        return;
    };

    println!(
        "Validating {} file(s) (source: {})",
        run.candidates.len(),
        source.as_str()
    );
    for c in run.candidates.iter().take(CANDIDATE_PREVIEW) {
        println!("  - {}", c);
    }
    if run.candidates.len() > CANDIDATE_PREVIEW {
        println!("  ... and {} more", run.candidates.len() - CANDIDATE_PREVIEW);
    }

    let res = &run.result;
    for sev in Severity::DESCENDING {
        for v in res.of_severity(sev) {
            println!("{}", violation_line(v, color));
        }
    }
    for s in &res.skipped {
        eprintln!("{} skipped {} ({})", note_prefix(), s.file_path, s.reason);
    }

    let summary = format!(
        "— Summary — errors={} warnings={} infos={} files={}",
        res.counts.errors, res.counts.warnings, res.counts.infos, res.files_checked
    );
    let score = format!("Compliance Score: {:.1}/100", res.compliance_score);
    if color {
        println!("{}", summary.bold());
        if res.has_errors() {
            println!("{}", score.red().bold());
        } else {
            println!("{}", score.green().bold());
        }
    } else {
        println!("{}", summary);
        println!("{}", score);
    }
    println!("Total Violations: {}", res.total_violations());
    if let Some(path) = report {
        println!("Report: {}", path);
    }
}

/// Compose check JSON object (pure) for testing/snapshot purposes.
pub fn compose_check_json(run: &LintRun, report: Option<&str>) -> JsonVal {
    let res = &run.result;
    json!({
        "source": run.source.map(|s| s.as_str()),
        "candidates": run.candidates,
        "files_checked": res.files_checked,
        "compliance_score": res.compliance_score,
        "total_violations": res.total_violations(),
        "files_with_errors": res.files_with_errors,
        "summary": {
            "errors": res.counts.errors,
            "warnings": res.counts.warnings,
            "infos": res.counts.infos,
        },
        "violations": res.violations.iter().map(violation_json).collect::<Vec<_>>(),
        "skipped": res.skipped.iter().map(|s| json!({
            "file": s.file_path,
            "reason": s.reason,
        })).collect::<Vec<_>>(),
        "report": report,
    })
}

fn violation_json(v: &Violation) -> JsonVal {
    json!({
        "file": v.file_path,
        "line": v.line_number,
        "type": v.violation_type,
        "severity": v.severity.as_str(),
        "rule": v.rule_id,
        "message": v.message,
        "suggestion": v.suggestion,
    })
}

/// Print a gate run: the milestone summary, or its JSON form.
pub fn print_gate(run: &GateRun, output: &str) {
    if output == "json" {
        print_json(&compose_gate_json(run));
        return;
    }
    print!("{}", run.summary);
}

pub fn compose_gate_json(run: &GateRun) -> JsonVal {
    let d = &run.decision;
    let tier = |t: TierProgress| json!({"total": t.total, "completed": t.completed});
    let mut tiers = serde_json::Map::new();
    for p in Priority::TIERS {
        tiers.insert(p.as_str().to_string(), tier(d.tier(p)));
    }
    tiers.insert("overall".to_string(), tier(d.overall));
    json!({
        "should_trigger_validation": d.should_trigger_validation,
        "all_tasks_completed": d.all_tasks_completed,
        "all_high_priority_completed": d.all_high_priority_completed,
        "all_medium_priority_completed": d.all_medium_priority_completed,
        "all_low_priority_completed": d.all_low_priority_completed,
        "overall_completion_rate": d.overall_completion_rate,
        "tiers": tiers,
        "milestone": d.milestone().describe(),
        "validation": run.outcome.as_ref().map(|o| json!({
            "completed": o.completed,
            "nothing_to_check": o.nothing_to_check,
            "exit_code": o.exit_code,
            "compliance_score": o.compliance_score,
            "quality_gate_passed": o.quality_gate_passed(),
            "message": o.message,
        })),
        "exit_code": run.exit_code,
    })
}

/// Print the registered rules in registry order.
pub fn print_rules(rules: &RuleSet, output: &str) {
    if output == "json" {
        print_json(&compose_rules_json(rules));
        return;
    }
    let color = use_colors(output);
    for r in rules.rules() {
        let (tag, icon) = severity_tag(r.severity(), color);
        let id = if color {
            r.id().bold().to_string()
        } else {
            r.id().to_string()
        };
        println!(
            "{} {} {} [{}] {}",
            icon,
            tag,
            id,
            r.scope().label(),
            r.description()
        );
    }
}

pub fn compose_rules_json(rules: &RuleSet) -> JsonVal {
    let items: Vec<_> = rules
        .rules()
        .iter()
        .map(|r| {
            json!({
                "id": r.id(),
                "severity": r.severity().as_str(),
                "applies_to": r.scope().label(),
                "description": r.description(),
            })
        })
        .collect();
    json!({ "rules": items, "extensions": rules.extensions().governed() })
}
