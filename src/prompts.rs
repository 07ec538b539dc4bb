use crate::models::CacheKey;

pub const SKETCH: &str = include_str!("../data/prompts/sketch.txt");

/// Replace `{{key}}` placeholders in a template string.
///
/// Substitution is a single pass over the template, so placeholder-looking
/// text inside a value is left alone.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => {
                let name = &after[..end];
                match vars.iter().find(|(key, _)| *key == name) {
                    Some((_, value)) => result.push_str(value),
                    None => {
                        result.push_str("{{");
                        result.push_str(name);
                        result.push_str("}}");
                    }
                }
                rest = &after[end + 2..];
            }
            None => {
                result.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    result.push_str(rest);
    result
}

/// Prompt sent to the image generator for one cache key.
pub fn sketch_prompt(key: &CacheKey) -> String {
    render(
        SKETCH.trim_end(),
        &[
            ("word", key.word.as_str()),
            ("part_of_speech", key.part_of_speech.as_str()),
            ("definition", key.definition.as_str()),
        ],
    )
}
