//! Multi-step goal planning.
//!
//! Agent mode chains four model calls: understand the goal, build a plan,
//! detail the first step, then plan the continuation. Each stage feeds the
//! next, and each is printed as it lands so a slow local model still shows
//! progress.

use crate::error::Result;
use crate::llm::ModelClient;
use colored::Colorize;
use std::io::Write;

fn understanding_prompt(goal: &str) -> String {
    format!(
        "Analyze this goal in depth:\n\n\
         GOAL: {goal}\n\n\
         Provide:\n\
         1. What success looks like (measurable)\n\
         2. Key challenges and blockers\n\
         3. Required prerequisites\n\
         4. Dependencies and order of execution\n\
         5. Potential pitfalls\n\n\
         Be specific, not generic."
    )
}

fn planning_prompt(goal: &str, understanding: &str) -> String {
    format!(
        "Create a detailed, step-by-step action plan:\n\n\
         GOAL: {goal}\n\n\
         ANALYSIS:\n{understanding}\n\n\
         Provide 5-7 concrete steps with:\n\
         - What to do (specific, not vague)\n\
         - Why it matters\n\
         - Success criteria\n\
         - Effort estimate\n\
         - Common mistakes to avoid\n\n\
         Order by dependencies. Make each step independent."
    )
}

fn execution_prompt(goal: &str, plan: &str) -> String {
    format!(
        "Provide detailed, actionable guidance for executing Step 1:\n\n\
         GOAL: {goal}\n\n\
         PLAN:\n{plan}\n\n\
         For STEP 1 only:\n\
         1. Pre-flight checklist (what to prepare)\n\
         2. Detailed step-by-step instructions\n\
         3. Expected outputs and deliverables\n\
         4. Validation and testing approach\n\
         5. Common failure modes and how to avoid them\n\
         6. How to know you're done (success criteria)\n\n\
         Be VERY specific and practical."
    )
}

fn continuation_prompt(goal: &str, plan: &str, execution: &str) -> String {
    format!(
        "Review Step 1 and plan for continuation:\n\n\
         GOAL: {goal}\n\n\
         PLAN:\n{plan}\n\n\
         STEP 1 GUIDANCE:\n{execution}\n\n\
         Provide:\n\
         1. What you should have after Step 1 is complete\n\
         2. How to verify Step 1 success\n\
         3. Blockers to watch for\n\
         4. What to prepare before Step 2\n\
         5. Brief outline of Step 2 (high level)\n\
         6. Final tips for success"
    )
}

/// Run the four-stage planning pipeline for a goal.
///
/// Returns the final continuation guidance, which is what gets logged.
pub async fn run_agent<W: Write>(
    client: &dyn ModelClient,
    goal: &str,
    out: &mut W,
) -> Result<String> {
    let rule = "=".repeat(70);

    writeln!(out, "\n{}", " AGENT MODE - MULTI-STEP PLANNING".bold())?;

    writeln!(out, "\nAnalyzing goal in depth...\n")?;
    let understanding = client.query(&understanding_prompt(goal)).await;
    writeln!(out, "{understanding}\n{rule}")?;

    writeln!(out, "\nCreating the plan...\n")?;
    let plan = client.query(&planning_prompt(goal, &understanding)).await;
    writeln!(out, "{plan}\n{rule}")?;

    writeln!(out, "\nStep 1 execution guidance...\n")?;
    let execution = client.query(&execution_prompt(goal, &plan)).await;
    writeln!(out, "{execution}\n{rule}")?;

    writeln!(out, "\nContinuation guidance...\n")?;
    let continuation = client
        .query(&continuation_prompt(goal, &plan, &execution))
        .await;
    writeln!(out, "{continuation}\n{rule}")?;

    writeln!(
        out,
        "\n{}",
        "Planning complete - ready to execute Step 1. Return for Step 2 details.".green()
    )?;
    Ok(continuation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockModelClient;

    #[test]
    fn test_stage_prompts_chain_prior_output() {
        let plan = planning_prompt("learn rust", "it is hard");
        assert!(plan.contains("learn rust"));
        assert!(plan.contains("it is hard"));

        let cont = continuation_prompt("learn rust", "the plan", "the guidance");
        assert!(cont.contains("the plan"));
        assert!(cont.contains("the guidance"));
    }

    #[tokio::test]
    async fn test_pipeline_makes_four_calls_and_returns_last() {
        let client = MockModelClient::new()
            .with_response("understanding")
            .with_response("plan")
            .with_response("execution")
            .with_response("continuation");

        let mut out = Vec::new();
        let last = run_agent(&client, "ship it", &mut out).await.unwrap();

        assert_eq!(last, "continuation");
        assert_eq!(client.call_count(), 4);

        // Each stage's output is embedded in the next stage's prompt
        let prompts = client.prompts();
        assert!(prompts[1].contains("understanding"));
        assert!(prompts[2].contains("plan"));
        assert!(prompts[3].contains("execution"));
    }

    #[tokio::test]
    async fn test_pipeline_survives_a_failing_stage() {
        // A sentinel from one stage just flows into the next prompt;
        // the pipeline itself never errors.
        let client = MockModelClient::new()
            .with_timeout()
            .with_response("plan")
            .with_response("execution")
            .with_response("continuation");

        let mut out = Vec::new();
        let last = run_agent(&client, "ship it", &mut out).await.unwrap();
        assert_eq!(last, "continuation");

        let rendered = String::from_utf8(out).unwrap();
        assert!(rendered.contains("[Response timed out]"));
    }
}
