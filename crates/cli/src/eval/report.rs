use serde::Serialize;

use super::harness::CaseResult;

const RULE: &str = "=================================================================";
const REPLY_PREVIEW_CHARS: usize = 120;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CategoryStats {
    pub category: String,
    pub passed: usize,
    pub total: usize,
    pub pass_rate_pct: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EvalReport {
    pub target: String,
    pub total: usize,
    pub passed: usize,
    pub pass_rate_pct: usize,
    pub categories: Vec<CategoryStats>,
    pub cases: Vec<CaseResult>,
}

impl EvalReport {
    /// Categories keep the order in which they first appear in `cases`.
    pub fn from_results(target: &str, cases: Vec<CaseResult>) -> Self {
        let mut categories: Vec<CategoryStats> = Vec::new();
        for case in &cases {
            let index = match categories.iter().position(|stats| stats.category == case.category)
            {
                Some(index) => index,
                None => {
                    categories.push(CategoryStats {
                        category: case.category.clone(),
                        passed: 0,
                        total: 0,
                        pass_rate_pct: 0,
                    });
                    categories.len() - 1
                }
            };
            let stats = &mut categories[index];
            stats.total += 1;
            if case.passed {
                stats.passed += 1;
            }
        }
        for stats in &mut categories {
            stats.pass_rate_pct = percent(stats.passed, stats.total);
        }

        let total = cases.len();
        let passed = cases.iter().filter(|case| case.passed).count();
        Self {
            target: target.to_string(),
            total,
            passed,
            pass_rate_pct: percent(passed, total),
            categories,
            cases,
        }
    }

    pub fn all_passed(&self) -> bool {
        self.passed == self.total
    }

    pub fn render_human(&self) -> String {
        let mut lines = vec![
            RULE.to_string(),
            "  BrewBot Evaluation Harness".to_string(),
            format!("  Target: {}", self.target),
            format!("  Tests:  {}", self.total),
            RULE.to_string(),
            String::new(),
        ];

        for case in &self.cases {
            lines.push(format!("[{}] {}", case.id, case.question));
            lines.push(format!("  Overall: {}", mark(case.passed)));
            if let Some(error) = &case.error {
                lines.push(format!("  Error calling bot: {error}"));
            }
            for check in &case.checks {
                lines.push(format!("  {:<24} {} - {}", check.name, mark(check.passed), check.detail));
            }
            if let Some(reply) = &case.reply {
                lines.push(format!("  Bot said: \"{}\"", preview(reply)));
            }
            lines.push(String::new());
        }

        lines.push(RULE.to_string());
        lines.push("  RESULTS SUMMARY".to_string());
        lines.push(RULE.to_string());
        lines.push(format!(
            "  Overall: {}/{} passed ({}%)",
            self.passed, self.total, self.pass_rate_pct
        ));
        lines.push(String::new());
        lines.push("  By category:".to_string());
        for stats in &self.categories {
            lines.push(format!(
                "    {:<20} {}/{}  [{}] {}%",
                stats.category,
                stats.passed,
                stats.total,
                bar(stats.pass_rate_pct),
                stats.pass_rate_pct
            ));
        }
        lines.push(RULE.to_string());

        lines.join("\n")
    }
}

/// Ten-cell bar, one filled cell per full 10%.
pub fn bar(pass_rate_pct: usize) -> String {
    let filled = (pass_rate_pct / 10).min(10);
    format!("{}{}", "█".repeat(filled), "░".repeat(10 - filled))
}

fn percent(passed: usize, total: usize) -> usize {
    if total == 0 {
        return 0;
    }
    100 * passed / total
}

fn mark(passed: bool) -> &'static str {
    if passed {
        "PASS"
    } else {
        "FAIL"
    }
}

fn preview(reply: &str) -> String {
    if reply.chars().count() <= REPLY_PREVIEW_CHARS {
        return reply.to_string();
    }
    let head: String = reply.chars().take(REPLY_PREVIEW_CHARS).collect();
    format!("{head}...")
}
