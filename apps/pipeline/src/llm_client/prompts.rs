// Prompt constants for candidate assessment. Render with `render_assessment_prompt`.

/// Assessment instruction template. `{profile}` is replaced with the
/// serialized candidate summary before sending. The four-label response
/// format is instructed only; the parser tolerates whatever comes back.
pub const ASSESSMENT_PROMPT_TEMPLATE: &str = r#"You are a recruiting analyst. Given this {profile} JSON applicant profile, do four things:
1. Provide a concise 75-word summary.
2. Rate overall candidate quality from 1-10 (higher is better).
3. List any data gaps or inconsistencies you notice.
4. Suggest up to three follow-up questions to clarify gaps.

Note:
The availability is hrs/week and the company is the previous company the applicant has worked in.

Return exactly:
Summary: <text>
Score: <integer>
Issues: <comma-separated list or 'None'>
Follow-Ups: <bullet list>
"#;

/// Substitutes the candidate profile into the assessment template.
pub fn render_assessment_prompt(profile_json: &str) -> String {
    ASSESSMENT_PROMPT_TEMPLATE.replace("{profile}", profile_json)
}
