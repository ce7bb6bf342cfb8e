//! Prompt construction for the generation steps.
//!
//! Prompts are built here so the pipeline stages stay readable and the
//! exact wording is testable.

use crate::types::page::EvidenceChunk;
use crate::types::search::Depth;
use crate::types::structured::Citation;

/// System prompt for query expansion.
pub const EXPANSION_SYSTEM: &str = "You are a scholarship search specialist. Generate ONLY \
scholarship-related search queries. Output JSON only: {\"prompts\": string[]}. Focus on: \
scholarships, grants, funding, financial aid, academic opportunities, university programs, \
degree funding, research grants, student financial support. Avoid general topics - every \
query must be scholarship/funding related.";

/// User prompt for query expansion.
pub fn format_expansion_prompt(query: &str, locale: Option<&str>, target: usize) -> String {
    format!(
        "Query: {query}\nLocale: {locale}\nCount: {target}\n\n\
         IMPORTANT: Transform this query into {target} scholarship-specific search queries. \
         If the original query is not scholarship-related, add scholarship/funding context. \
         Examples:\n\
         - \"indonesia\" → \"Indonesia scholarships for international students\", \
         \"Indonesian government scholarships\", \"University scholarships in Indonesia\"\n\
         - \"computer science\" → \"Computer science scholarships\", \
         \"CS degree funding opportunities\", \"Tech scholarships for students\"\n\n\
         Every generated query must include scholarship, funding, grant, or financial aid terms.",
        locale = locale.unwrap_or("en"),
    )
}

/// System prompt for evidence synthesis.
pub const SYNTHESIS_SYSTEM: &str = "You are an expert scholarship analyst. Extract \
scholarship opportunities from the provided evidence and return them in the exact JSON \
format specified. Focus on finding actual scholarship programs, grants, or funding \
opportunities.";

/// User prompt for evidence synthesis.
///
/// Chunks are laid out as numbered blocks so citations can point back
/// at their source URLs; the sub-queries and discovered source list
/// give the model the full search context.
pub fn format_synthesis_prompt(
    query: &str,
    locale: Option<&str>,
    depth: Depth,
    prompts: &[String],
    chunks: &[EvidenceChunk],
    sources: &[Citation],
) -> String {
    let evidence_text = chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| {
            format!(
                "CHUNK {n}:\nURL: {url}\nTITLE: {title}\nCONTENT: {text}\n",
                n = i + 1,
                url = chunk.url,
                title = chunk.title,
                text = chunk.text,
            )
        })
        .collect::<Vec<_>>()
        .join("\n---\n");

    let sources_text = sources
        .iter()
        .enumerate()
        .map(|(i, source)| {
            format!(
                "SOURCE {n}: {url} ({title}): {snippet}",
                n = i + 1,
                url = source.url,
                title = source.title,
                snippet = source.snippet,
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Query: {query}\nLocale: {locale}\nDepth: {depth}\n\
         Sub-queries: {sub_queries}\n\n\
         Analyze this evidence and extract COMPLETE scholarship opportunities. Each chunk \
         contains more context now, so look for complete information:\n\n\
         {evidence_text}\n\n\
         DISCOVERED SOURCES:\n\
         {sources_text}\n\n\
         Return ONLY valid JSON matching this exact schema:\n\
         {{\n\
         \x20 \"items\": [\n\
         \x20   {{\n\
         \x20     \"id\": \"unique_id_1\",\n\
         \x20     \"title\": \"Complete Scholarship Name\",\n\
         \x20     \"summary\": \"Detailed description including what the scholarship covers\",\n\
         \x20     \"eligibility\": [\"Specific requirement 1\", \"Specific requirement 2\", \"Academic criteria\", \"Language requirements\"],\n\
         \x20     \"benefits\": [\"Tuition coverage details\", \"Stipend amount\", \"Travel allowance\", \"Insurance coverage\"],\n\
         \x20     \"deadlines\": [\"Application opening date\", \"Application deadline\", \"Result announcement date\"],\n\
         \x20     \"application_link\": \"https://valid-url.com/apply\",\n\
         \x20     \"citations\": [\n\
         \x20       {{\n\
         \x20         \"url\": \"https://valid-url.com\",\n\
         \x20         \"title\": \"Source Title\",\n\
         \x20         \"snippet\": \"Relevant snippet from the chunk\",\n\
         \x20         \"confidence\": 0.8\n\
         \x20       }}\n\
         \x20     ]\n\
         \x20   }}\n\
         \x20 ],\n\
         \x20 \"sources\": [\n\
         \x20   {{\n\
         \x20     \"url\": \"https://valid-url.com\",\n\
         \x20     \"title\": \"Source Title\",\n\
         \x20     \"snippet\": \"Relevant snippet\",\n\
         \x20     \"confidence\": 0.8\n\
         \x20   }}\n\
         \x20 ]\n\
         }}\n\n\
         CRITICAL INSTRUCTIONS:\n\
         - Extract COMPLETE scholarship information from the larger chunks\n\
         - Combine information across chunks if needed for completeness\n\
         - Ensure URLs are valid (start with http:// or https://)\n\
         - If a URL is invalid, use \"Not specified\" instead\n\
         - Focus on scholarships with complete information\n\
         - Quality over quantity - prefer 3 complete scholarships over 10 incomplete ones",
        locale = locale.unwrap_or("en"),
        depth = depth.as_str(),
        sub_queries = prompts.join("; "),
    )
}

/// System prompt for flat record extraction.
pub const EXTRACTION_SYSTEM: &str = "You are an expert scholarship data analyst. Extract \
and structure scholarship information into valid JSON matching the exact schema provided. \
Always return complete, valid JSON.";

/// Raw data passed to extraction is truncated beyond this many characters.
const EXTRACTION_DATA_CAP: usize = 2_000;

/// User prompt for flat record extraction.
pub fn format_extraction_prompt(query: &str, raw_data: &str) -> String {
    let truncated: String = if raw_data.chars().count() > EXTRACTION_DATA_CAP {
        let head: String = raw_data.chars().take(EXTRACTION_DATA_CAP).collect();
        format!("{head}...")
    } else {
        raw_data.to_string()
    };

    format!(
        "Analyze this scholarship data for \"{query}\" and return valid JSON matching this schema:\n\n\
         {{\n\
         \x20 \"scholarships\": [\n\
         \x20   {{\n\
         \x20     \"title\": \"Full scholarship name\",\n\
         \x20     \"scholarship_type\": \"fully funded|partial high|partial low\",\n\
         \x20     \"degree_levels\": [\"Bachelor\", \"Masters\", \"PhD\", \"Postdoctoral\"],\n\
         \x20     \"host_country\": \"Country name\",\n\
         \x20     \"benefits\": {{\n\
         \x20       \"tuition\": \"Tuition coverage details\",\n\
         \x20       \"stipend\": \"Monthly/annual stipend amount\",\n\
         \x20       \"travel\": \"Airfare/transport coverage\",\n\
         \x20       \"insurance\": \"Health/medical insurance coverage\",\n\
         \x20       \"others\": [\"Additional benefits\"]\n\
         \x20     }},\n\
         \x20     \"eligible_countries\": \"All countries or specific countries\",\n\
         \x20     \"requirements\": {{\n\
         \x20       \"academic\": \"GPA, degree requirements\",\n\
         \x20       \"age_limit\": \"Age restrictions or 'No age limit'\",\n\
         \x20       \"language\": \"Language requirements (English, IELTS, etc.)\",\n\
         \x20       \"others\": [\"Other conditions\"]\n\
         \x20     }},\n\
         \x20     \"application_timeline\": {{\n\
         \x20       \"opening_date\": \"Application opening date\",\n\
         \x20       \"deadline\": \"Application deadline\",\n\
         \x20       \"result_announcement\": \"Result notification period\"\n\
         \x20     }},\n\
         \x20     \"application_link\": \"Direct application URL\",\n\
         \x20     \"application_procedure\": [\"Step 1\", \"Step 2\", \"Step 3\"],\n\
         \x20     \"selection_process\": [\"Evaluation criteria\", \"Interview rounds\"],\n\
         \x20     \"renewal\": \"Renewal rules or 'Not applicable'\",\n\
         \x20     \"source\": [\"Source URLs\"]\n\
         \x20   }}\n\
         \x20 ]\n\
         }}\n\n\
         RAW DATA:\n\
         {truncated}\n\n\
         RULES: Return ONLY valid JSON. Use \"Not specified\" for missing info. Ensure all \
         fields are present."
    )
}
