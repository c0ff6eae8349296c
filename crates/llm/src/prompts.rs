//! Prompt templates for outline generation

/// System prompt for new outlines
pub const OUTLINE_SYSTEM: &str = r#"You are an expert presentation designer. Create a detailed outline for a PowerPoint presentation based on the user's request.

Return ONLY a JSON object with the following structure:
{
    "title": "Main presentation title",
    "slides": [
        {
            "slide_number": 1,
            "title": "Slide title",
            "content": ["Bullet point 1", "Bullet point 2", "Bullet point 3"]
        }
    ]
}

If you cannot produce JSON, use this plain format instead, one slide per block:
Slide 1: Slide title
- Bullet point 1
- Bullet point 2
---

Guidelines:
- Keep titles concise and engaging
- Use 3-5 bullet points per slide, never more than 6
- Ensure logical flow between slides
- The first slide introduces the topic, the last slide concludes with a key message
- Avoid repetitive content across slides"#;

/// System prompt for reorganizing an existing deck
pub const REORGANIZE_SYSTEM: &str = r#"You are an expert presentation editor. You receive the extracted slides of an existing deck. Your task:
1. Remove redundancy
2. Improve clarity and concision
3. Organize the material into a logical narrative
4. Limit each slide to 3-6 sharp bullet points (max ~12 words each)
Do NOT add facts that are not present in the source material.

Return ONLY a JSON object with this structure:
{
    "title": "Improved main title",
    "slides": [
        {"title": "Slide title", "content": ["Bullet 1", "Bullet 2"]}
    ]
}
Rules:
- No extra commentary
- Bullets are sentence fragments without trailing punctuation
- The last slide is a conclusion with key takeaways"#;

/// Phrases that mark model preamble rather than content
pub const PREAMBLE_PHRASES: &[&str] = &[
    "here is",
    "here are",
    "enhanced version",
    "improved content",
    "better version",
    "updated content",
    "enhanced bullet points",
];

/// Prompt for a new outline, with optional reference context
pub fn outline_prompt(topic: &str, num_slides: usize, context: Option<&str>) -> String {
    let mut prompt = format!("Create a presentation about: {}\n\nCreate exactly {} slides.", topic, num_slides);

    if let Some(context) = context.filter(|c| !c.trim().is_empty()) {
        prompt.push_str(&format!(
            "\n\nUse the following reference materials as context and incorporate relevant information:\n\n{}\n\n\
             Based on the above context and the topic \"{}\", create a presentation that:\n\
             1. Incorporates relevant information from the reference materials\n\
             2. Maintains focus on the main topic\n\
             3. Provides actionable insights and takeaways\n\
             4. Is well-structured and professional",
            context, topic
        ));
    }

    prompt
}

/// Prompt asking to condense and reorder existing slides
pub fn reorganize_prompt(source: &str, num_slides: usize) -> String {
    format!(
        "Source slides:\n---\n{}\n---\n\nProduce an improved outline with exactly {} slides now.",
        source, num_slides
    )
}

/// Prompt for sharpening one slide's bullets
pub fn enhance_prompt(title: &str, bullets: &[String]) -> String {
    let current: Vec<String> = bullets.iter().map(|b| format!("- {}", b)).collect();
    format!(
        "Enhance the following slide content for a presentation slide titled \"{}\".\n\n\
         Current content:\n{}\n\n\
         Please provide enhanced, more detailed bullet points that are:\n\
         - More specific and informative\n\
         - Professional and engaging\n\
         - Limited to 3-5 points\n\n\
         IMPORTANT: Return ONLY the enhanced bullet points, one per line, without bullet symbols. \
         Do not include any introductory text. Start directly with the first bullet point.",
        title,
        current.join("\n")
    )
}
