// Interview prompt templates and the context builder.
// All prompts for the interview module are defined here.

use crate::interview::models::{CandidateContext, JobContext, Turn};
use crate::llm_client::prompts::JSON_ONLY_INSTRUCTION;

pub const INTERVIEWER_IDENTITY: &str = "You are a professional Technical Interviewer. \
Your goal is to assess the candidate's technical skills efficiently.";

/// Always appended last, unchanged for every session.
pub const INTERVIEW_RULES: &str = "
YOUR STRICT RULES:
1. ONLY ask questions related to the job role, the candidate's resume, or technical concepts.
2. If the candidate asks an irrelevant question (e.g., \"What is the weather?\", \"Who are you?\", \"Tell me a joke\"), politely REFUSE to answer and steer them back.
   - Example Refusal: \"I am here to evaluate your technical skills. Let's get back to the interview. Can you explain...\"
3. Do NOT be helpful like a chatbot. Do NOT answer the question for them or provide hints. You are the evaluator.
4. Keep your responses concise (under 2-3 sentences) because this is a voice conversation.
5. Do NOT repeat the same question twice.
6. This is a VOICE-ONLY interview. Do NOT ask questions that require writing code or syntax. Ask for conceptual explanations, logic, or system design approaches instead.
";

pub const CLOSING_MESSAGE: &str = "Thank you for your time today! Our interview session has come to an end. \
It was a pleasure speaking with you. I'll now prepare your performance report. \
Good luck with your career journey!";

/// Builds the interviewer's system prompt.
///
/// Layout: job block, resume block, identity, rules. The rule block is always last.
pub fn build_system_prompt(job: Option<&JobContext>, candidate: Option<&CandidateContext>) -> String {
    let mut prompt = String::new();

    if let Some(job) = job {
        prompt.push_str(&job_block(job));
    }
    if let Some(candidate) = candidate {
        prompt.push_str(&candidate_block(candidate));
    }
    prompt.push_str(INTERVIEWER_IDENTITY);
    prompt.push_str(INTERVIEW_RULES);
    prompt
}

fn job_block(job: &JobContext) -> String {
    let duration = job
        .duration
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_else(|| "Standard Time".to_string());

    format!(
        "
You are interviewing for the role: {role}.
Job Requirements: {description}
Difficulty Level: {difficulty}
Interview Duration: {duration}.

CONTEXT: This is a timed interview. The session will auto-close when the timer ends, so prioritize assessing key competencies quickly.
Adjust your questions and expectations based on the {difficulty} difficulty level. ",
        role = job.role_title,
        description = job.job_description,
        difficulty = job.difficulty,
    )
}

fn candidate_block(candidate: &CandidateContext) -> String {
    let skills = if candidate.technical_skills.is_empty() {
        "Not specified".to_string()
    } else {
        candidate.technical_skills.join(", ")
    };
    let focus = candidate
        .most_impressive_project
        .as_deref()
        .filter(|p| !p.trim().is_empty())
        .unwrap_or("their experience");

    format!(
        "
The candidate is {name}.
Skills: {skills}.
Focus questions on: {focus}. ",
        name = candidate.full_name,
    )
}

/// Opening line of every session.
pub fn build_greeting(job: Option<&JobContext>, candidate: Option<&CandidateContext>) -> String {
    let name = candidate
        .map(|c| c.full_name.as_str())
        .filter(|n| !n.trim().is_empty())
        .unwrap_or("there");
    let mut greeting = format!("Hello {name}! I'm your AI Interviewer. ");

    if let Some(job) = job {
        greeting.push_str(&format!(
            "Today, we'll be interviewing you for the role of {}. ",
            job.role_title
        ));
        greeting.push_str(&format!("This is a {} difficulty interview. ", job.difficulty));
    } else if candidate.is_some() {
        greeting.push_str("I've reviewed your resume and I'm excited to discuss your skills. ");
    }

    greeting.push_str("Let's begin!");
    greeting
}

// ────────────────────────────────────────────────────────────────────────────
// Analysis
// ────────────────────────────────────────────────────────────────────────────

pub const ANALYSIS_IDENTITY: &str = "You are an expert Technical Interviewer. ";

pub const ANALYSIS_SCHEMA: &str = "
Analyze the following interview transcript.
Return a STRICT JSON object (no markdown, no plain text) with these fields:
- \"technical_score\": (integer 0-100)
- \"communication_score\": (integer 0-100)
- \"confidence_score\": (integer 0-100)
- \"feedback\": (array of exactly 3 objects, each having: \"topic\", \"feedback\", \"better_answer\")
";

pub fn build_analysis_prompt(job: Option<&JobContext>) -> String {
    let mut prompt = ANALYSIS_IDENTITY.to_string();

    if let Some(job) = job {
        prompt.push_str(&format!(
            "You are analyzing an interview for: {role}
Role Requirements: {description}
Difficulty Level: {difficulty}
Adjust your scoring based on the {difficulty} difficulty level. ",
            role = job.role_title,
            description = job.job_description,
            difficulty = job.difficulty,
        ));
    }

    prompt.push_str(ANALYSIS_SCHEMA);
    prompt.push('\n');
    prompt.push_str(JSON_ONLY_INSTRUCTION);
    prompt
}

/// Renders turns as "Candidate: ..." / "Interviewer: ..." paragraphs.
pub fn render_transcript(turns: &[Turn]) -> String {
    turns
        .iter()
        .map(|t| format!("{}: {}", t.role.transcript_label(), t.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}
