/// Placeholders: {company_name}, {industry}, {current_description}, {sources}, {grounding}
pub const DESCRIPTION_PROMPT: &str = r#"Refresh the profile of the company below.

Company: {company_name}
Industry: {industry}
Current description:
{current_description}

Recent news sources:
{sources}

{grounding}

Return a JSON object with exactly these fields:
{
  "description": "2-4 sentence neutral description of what the company does and any notable recent developments",
  "highlights": ["short bullet about a recent development", "..."]
}
"highlights" may be empty. Keep each highlight under 140 characters."#;
