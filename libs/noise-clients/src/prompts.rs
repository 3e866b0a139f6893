//! Prompt templates for the generative service

use noise_core::NoiseKind;

const SUGGESTION_FORMAT: &str = r#"For each suggestion, provide a short title and a one-sentence description.
Respond with JSON of the form {"suggestions": [{"title": "...", "description": "..."}]}."#;

pub fn general_suggestions() -> String {
    format!(
        "You are a public health expert specializing in urban well-being.\n\
         Provide a short, actionable list of 3-4 general health suggestions for someone living in a typical city environment.\n\
         Focus on practical, evergreen advice for well-being, stress reduction, and creating a peaceful home environment.\n\
         These are general tips, not responses to a specific loud noise event.\n\
         {}",
        SUGGESTION_FORMAT
    )
}

pub fn condition_suggestions(noise_type: &str, level: u8) -> String {
    format!(
        "You are an audiologist and public health expert specializing in the effects of noise pollution.\n\
         A user is being exposed to high levels of noise.\n\
         \n\
         Noise Type: {}\n\
         Noise Level: {} dB\n\
         \n\
         Based on this information, provide a short, actionable list of 3-4 health suggestions to help them mitigate the potential health risks.\n\
         Focus on practical, immediate actions they can take. Frame the suggestions in a positive and helpful tone.\n\
         {}",
        noise_type, level, SUGGESTION_FORMAT
    )
}

pub fn classification() -> String {
    let kinds: Vec<&str> = NoiseKind::ALL
        .iter()
        .filter(|kind| **kind != NoiseKind::Unknown)
        .map(NoiseKind::label)
        .collect();

    format!(
        "You are an acoustic analyst. Listen to the attached audio clip and identify the noise sources in it.\n\
         Use one of these names when it fits: {}. Otherwise give a short descriptive name.\n\
         For each source give a one-sentence description, whether it is produced by humans, and a confidence between 0 and 1.\n\
         Respond with a JSON array of the form [{{\"name\": \"...\", \"description\": \"...\", \"isHuman\": false, \"confidence\": 0.0}}].\n\
         Respond with an empty array when no source is audible.",
        kinds.join(", ")
    )
}
