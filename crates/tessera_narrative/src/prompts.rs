//! Prompt assembly for the generation pipeline.
//!
//! Builders keep prompt text in one place so the pipeline modules stay
//! focused on control flow. Grounding context is truncated to fixed
//! character budgets to bound prompt size; the deterministic fallback
//! paths always see the full text.

/// Character budget for aggregated grounding text.
pub(crate) const CONTEXT_BUDGET: usize = 8_000;
/// Character budget for text handed to the segmentation call.
pub(crate) const SEGMENT_BUDGET: usize = 12_000;
/// Character budget for existing text context in vision calls.
pub(crate) const VISION_CONTEXT_BUDGET: usize = 4_000;

/// Truncate to at most `max` characters on a char boundary.
pub(crate) fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

pub(crate) const SEGMENTATION_SYSTEM: &str = "You are an expert literary analyst specializing in \
narrative structure and coherence. You segment stories into meaningful, cohesive blocks.";

pub(crate) fn segmentation(story_text: &str) -> String {
    format!(
        r#"Analyze the following story and segment it into coherent blocks/sections.

Each block should:
1. Represent a cohesive narrative unit (scene, theme, or idea)
2. Be 2-5 paragraphs long (roughly 150-400 words)
3. Have internal coherence and flow
4. Transition naturally to the next block

Story to segment:
{story}

Provide your segmentation in the following JSON format:
{{
    "blocks": [
        {{
            "sequence_order": 1,
            "content": "<the text of block 1>",
            "coherence_score": <float 0-1 indicating internal coherence>,
            "summary": "<one-sentence summary of this block>"
        }}
    ]
}}

Important:
- Preserve ALL the original text - don't omit anything
- coherence_score should reflect how well the block holds together thematically
- Aim for 3-8 blocks depending on story length
- Each block should be substantial enough to pair with an image

Respond with ONLY the JSON, no additional text."#,
        story = truncate_chars(story_text, SEGMENT_BUDGET)
    )
}

pub(crate) const STORYTELLER_SYSTEM: &str =
    "You are a master storyteller specializing in epic, literary narratives. You output JSON.";

pub(crate) fn epic_story(
    aggregated_text: &str,
    generation_prompt: &str,
    user_commentary: &str,
    source_tags: &[String],
) -> String {
    let tag_context = if source_tags.is_empty() {
        "No specific tags".to_string()
    } else {
        format!("Source tags: {}", source_tags.join(", "))
    };
    let commentary = if user_commentary.is_empty() {
        "No additional commentary"
    } else {
        user_commentary
    };

    format!(
        r#"You are a master storyteller creating an epic, long-form narrative.

CONTEXT FROM EXISTING CONTENT:
{context}

{tag_context}

STORY DIRECTION/PROMPT:
{generation_prompt}

USER'S ADDITIONAL COMMENTARY:
{commentary}

TASK:
Create a rich, engaging epic story that:
1. Draws inspiration from the existing content context
2. Follows the story direction/prompt provided
3. Incorporates the user's commentary and preferences
4. Is substantial in length (1500-3000 words)
5. Has clear narrative structure with beginning, development, and conclusion
6. Uses vivid, literary language and compelling storytelling
7. Can be naturally divided into 4-8 coherent sections/chapters

The story should feel complete yet leave room for visual interpretation
(as images will be paired with sections of this story).

OUTPUT FORMAT:
Return ONLY a valid JSON object with the following structure:
{{
    "story": "Your epic story here...",
    "title_suggestion": "Suggested title for the epic",
    "themes": ["theme1", "theme2", "theme3"]
}}"#,
        context = truncate_chars(aggregated_text, CONTEXT_BUDGET),
    )
}

pub(crate) fn story_continuation(
    existing_story: &str,
    continuation_prompt: &str,
    user_commentary: &str,
) -> String {
    let commentary = if user_commentary.is_empty() {
        "No additional commentary"
    } else {
        user_commentary
    };

    format!(
        r#"You are continuing an epic story. Here is the story so far:

EXISTING STORY:
{existing}

CONTINUATION DIRECTION:
{continuation_prompt}

USER'S COMMENTARY:
{commentary}

TASK:
Write a compelling continuation that:
1. Maintains consistency with the existing story's tone, style, and narrative
2. Follows the continuation direction provided
3. Adds substantial new content (800-1500 words)
4. Advances the plot meaningfully
5. Can stand as coherent sections when paired with images

OUTPUT FORMAT:
Return ONLY a valid JSON object:
{{
    "continuation": "Your continuation text here..."
}}"#,
        existing = truncate_chars(existing_story, CONTEXT_BUDGET),
    )
}

pub(crate) const SUBTITLE: &str = r#"Analyze this image and create a SHORT, evocative subtitle or caption.

Requirements:
1. Keep it to 1-2 sentences maximum
2. Make it poetic and atmospheric
3. Capture the essence or mood of the image
4. Use vivid, sensory language
5. It should work as a subtitle for a story chapter

Generate ONLY the subtitle, no additional text or explanation:"#;

pub(crate) fn auto_recommend(existing_text: Option<&str>) -> String {
    match existing_text {
        Some(existing) if !existing.trim().is_empty() => format!(
            r#"Analyze this image and generate a descriptive, narrative text that complements the following existing context:

Existing Context:
{existing}

Requirements:
1. Describe what you see in the image in vivid, literary detail
2. Connect your description to the existing context naturally
3. Write in a flowing, narrative style (2-4 paragraphs)
4. Focus on visual elements, atmosphere, and mood
5. Make it feel like part of a larger story or essay

Generate the text:"#,
            existing = truncate_chars(existing, VISION_CONTEXT_BUDGET),
        ),
        _ => r#"Analyze this image and generate a rich, descriptive narrative text about what you see.

Requirements:
1. Describe the image in vivid, literary detail
2. Write in a flowing, narrative style (2-4 paragraphs)
3. Focus on visual elements, atmosphere, mood, and implied story
4. Make it engaging and evocative
5. Use sensory language and literary devices

Generate the text:"#
            .to_string(),
    }
}

pub(crate) fn prompt_enhance(user_prompt: &str) -> String {
    format!(
        r#"Analyze this image and generate text based on the following user direction:

User Direction:
{user_prompt}

Requirements:
1. Carefully observe all details in the image
2. Follow the user's direction/prompt closely
3. Write in a flowing, narrative style (2-4 paragraphs)
4. Incorporate visual details from the image naturally
5. Make the text vivid and engaging

Generate the text:"#
    )
}

pub(crate) fn story_connection(block_content: &str) -> String {
    format!(
        r#"Analyze this image in relation to the following story text:

Story Text:
{block}

Evaluate how well the image matches or complements the story text.

Provide your analysis in the following JSON format:
{{
    "coherence_score": <float between 0 and 1>,
    "explanation": "<brief explanation of the match>",
    "visual_elements": ["<key visual element 1>", "<key visual element 2>"],
    "thematic_connections": ["<connection 1>", "<connection 2>"]
}}

Respond with ONLY the JSON, no additional text."#,
        block = truncate_chars(block_content, VISION_CONTEXT_BUDGET),
    )
}

pub(crate) const VISION_CHAT_SYSTEM: &str = r#"You are a creative writing assistant with vision capabilities.
You can see the image being referenced and help the user write, edit, and enhance their text content.

CRITICAL INSTRUCTIONS:
1. FOCUS ON THE IMAGE: Use the visual details to ground your writing.
2. NO REPETITION: Do not repeat words like "Page" or "Image" pointlessly.
3. BE CONCISE & HELPFUL: Avoid fluff. Go straight to the prose or answer.
4. NO OCR ARTIFACTS: Do not output random page numbers or footer text.

Your responses should be:
- Contextually aware of both the image and existing text
- Creative and engaging
- Helpful for storytelling and prose writing
- Synchronized with what's visible in the image"#;

pub(crate) fn vision_chat(
    blocks_context: &str,
    conversation_context: &str,
    user_message: &str,
) -> String {
    let context_instruction = if blocks_context.is_empty() {
        "CONTEXT: The user hasn't written anything yet. Rely heavily on the visual details in the image."
    } else {
        "EXISTING TEXT BLOCKS (Use these for context, but prioritize image visuals if they conflict):"
    };

    format!(
        r#"IMAGE CONTEXT: I'm sharing an image with you.

{context_instruction}
{blocks_context}

CONVERSATION SO FAR:
{conversation_context}

USER MESSAGE: {user_message}

Please respond helpfully. If I asked for a story or description, write it clearly without repeating yourself."#,
        blocks_context = truncate_chars(blocks_context, VISION_CONTEXT_BUDGET),
    )
}

pub(crate) fn text_chat(
    blocks_context: &str,
    conversation_context: &str,
    user_message: &str,
) -> String {
    format!(
        r#"EXISTING TEXT BLOCKS:
{blocks_context}

CONVERSATION SO FAR:
{conversation_context}

USER MESSAGE: {user_message}

Please respond helpfully based on the text context provided."#,
        blocks_context = truncate_chars(blocks_context, VISION_CONTEXT_BUDGET),
    )
}

pub(crate) fn literary_rewrite(raw_text: &str) -> String {
    format!(
        r#"Rewrite the following text into sensorily rich, literary prose.

TEXT:
{raw_text}

Requirements:
1. Preserve the meaning and all factual content
2. Keep approximately the same length
3. Use vivid imagery, atmosphere, and sensory language
4. Write flowing narrative prose, not a list or summary

Return ONLY the rewritten text, no additional commentary:"#
    )
}

pub(crate) fn rewrite_block(block_content: &str, instruction: &str) -> String {
    format!(
        r#"Look at this image carefully.

CURRENT TEXT:
{block_content}

INSTRUCTION: {instruction}

Rewrite the text to better describe, relate to, or complement what's visible in the image.
Keep the same general length but improve the quality, imagery, and connection to the visual.

OUTPUT FORMAT:
Return ONLY a valid JSON object:
{{"rewritten": "Your rewritten text here..."}}"#
    )
}

pub(crate) fn prose_suggestion(
    content_text: &str,
    task_instruction: &str,
    user_commentary: &str,
) -> String {
    let commentary = if user_commentary.is_empty() {
        "No specific instructions provided."
    } else {
        user_commentary
    };

    format!(
        r#"You are a creative writer. Based on the following existing text blocks, generate new content.

EXISTING TEXT BLOCKS:
{content}

USER COMMENTARY/INSTRUCTIONS:
{commentary}

TASK:
{task_instruction}
The new content should complement and enhance the existing text, not simply repeat it.

OUTPUT FORMAT:
Return ONLY a valid JSON object with the following structure:
{{
    "suggestion": "Your generated content here..."
}}
Do not include any markdown formatting (like ```json) or extra text outside the JSON object."#,
        content = truncate_chars(content_text, CONTEXT_BUDGET / 2),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncation_respects_char_boundaries() {
        let text = "héllo wörld";
        assert_eq!(truncate_chars(text, 5), "héllo");
        assert_eq!(truncate_chars(text, 100), text);
    }

    #[test]
    fn segmentation_prompt_embeds_story() {
        let prompt = segmentation("A short tale.");
        assert!(prompt.contains("A short tale."));
        assert!(prompt.contains("sequence_order"));
    }
}
