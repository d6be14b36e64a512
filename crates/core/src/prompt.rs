use crate::domain::evaluation::SurveyRequest;

pub const SYSTEM_PROMPT: &str = "You are an expert in Islamic finance and ethical investment analysis. \
You must respond with valid JSON matching the requested structure precisely.";

const NO_PRIORITIES: &str = "None specified, use a balanced approach.";

const SCORE_AXES: [&str; 7] = [
    "military",
    "israel",
    "environment",
    "social",
    "governance",
    "sharia_compliance",
    "ethical_business",
];

pub fn evaluation_prompt(company_name: &str) -> String {
    let axes = SCORE_AXES
        .iter()
        .map(|axis| {
            format!(
                "        \"{axis}\": {{ \"score\": \"integer (0-100)\", \"notes\": [\"string (1-2 brief notes explaining the score)\", \"...\"] }}"
            )
        })
        .collect::<Vec<_>>()
        .join(",\n");

    format!(
        r#"You are an ethical investment analyst. Your task is to evaluate a company based on its public information and provide a structured JSON response.
The company to evaluate is: **{company_name}**.

Please return a single JSON object with the following structure:
{{
    "symbol": "string (The stock's ticker symbol)",
    "name": "string (The full company name)",
    "type": "Company",
    "overall_score": "integer (0-100, based on all factors)",
    "scores": {{
{axes}
    }},
    "details": {{
        "strengths": ["string", "..."],
        "concerns": ["string", "..."],
        "halal_status": "string ('Permissible', 'Questionable', or 'Not Permissible')",
        "recommendation": "string (A brief summary of the investment thesis)"
    }}
}}
For each item in "scores", provide 1-2 brief bullet points in the "notes" field explaining the reasoning for the numerical score.
"type" must be one of "Company", "Stock" or "ETF". Do not include any other keys."#
    )
}

pub fn basket_prompt(survey: &SurveyRequest) -> String {
    let priorities = if survey.ethical_priorities.is_empty() {
        NO_PRIORITIES.to_string()
    } else {
        survey.ethical_priorities.join(", ")
    };

    format!(
        r#"Act as an expert portfolio manager. A user has provided their investment preferences.
Based on their answers below, suggest a basket of stocks.

**User Preferences:**
- **Risk Tolerance:** {risk}
- **Investment Horizon:** {horizon} years
- **Key Ethical Priorities:** {priorities}

**Your Task:**
1.  Analyze the user's preferences.
2.  Suggest a diversified basket of {count} stocks that aligns with their goals.
3.  For each stock, provide a brief reasoning for its inclusion.

Return your response as a JSON array of objects, where each object has the following exact structure:
[
    {{
        "symbol": "string (The stock's ticker symbol)",
        "name": "string (The full company name)",
        "reasoning": "string (A brief explanation for why this stock was chosen)"
    }}
]"#,
        risk = survey.risk_tolerance,
        horizon = survey.investment_horizon,
        count = survey.number_of_stocks,
    )
}
