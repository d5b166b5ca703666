// src/personality/builder.rs

use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;

use super::tools::generate_tool_description;
use super::Personality;

/// Input for assembling a new personality at runtime
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalityBuilder {
    pub id: String,
    pub name: String,
    pub description: String,
    pub emoji: String,
    pub color: String,
    pub character_traits: String,
    #[serde(default)]
    pub additional_context: Option<String>,
}

/// Canned character text for quick personalities
#[derive(Debug, Clone, Copy)]
pub struct QuickTemplate {
    pub character_traits: &'static str,
    pub additional_context: &'static str,
}

pub const PERSONALITY_TEMPLATES: [(&str, QuickTemplate); 4] = [
    (
        "professional",
        QuickTemplate {
            character_traits: "I am a professional assistant who communicates formally and precisely. I provide comprehensive explanations and maintain business-appropriate language.",
            additional_context: "I focus on accuracy and thoroughness in all interactions.",
        },
    ),
    (
        "casual",
        QuickTemplate {
            character_traits: "Hey there! I'm your casual, friendly helper who likes to keep things relaxed and fun. I explain things in simple terms and use everyday language.",
            additional_context: "I'm here to make Web3 accessible and enjoyable for everyone!",
        },
    ),
    (
        "expert",
        QuickTemplate {
            character_traits: "I am a technical expert with deep knowledge and extensive experience. I provide detailed analysis and advanced insights.",
            additional_context: "I excel at explaining complex concepts and providing in-depth technical guidance.",
        },
    ),
    (
        "teacher",
        QuickTemplate {
            character_traits: "I'm an educational mentor focused on helping you learn step by step. I break down complex topics and encourage questions.",
            additional_context: "Every interaction is a learning opportunity. Feel free to ask me to explain anything you don't understand!",
        },
    ),
];

lazy_static! {
    static ref HEX_COLOR: Regex = Regex::new(r"(?i)^#[0-9A-F]{6}$").expect("static regex");
}

pub fn quick_template(name: &str) -> Option<&'static QuickTemplate> {
    PERSONALITY_TEMPLATES
        .iter()
        .find(|(id, _)| *id == name)
        .map(|(_, t)| t)
}

/// Character traits, then the tool block for `builder.id`, then any additional context.
pub fn create_personality(builder: PersonalityBuilder) -> Personality {
    let mut system_prompt = builder.character_traits;
    system_prompt.push_str("\n\n");
    system_prompt.push_str(&generate_tool_description(&builder.id));

    if let Some(extra) = builder.additional_context.filter(|s| !s.is_empty()) {
        system_prompt.push_str("\n\n");
        system_prompt.push_str(&extra);
    }

    Personality {
        id: builder.id,
        name: builder.name,
        description: builder.description,
        emoji: builder.emoji,
        color: builder.color,
        system_prompt,
    }
}

/// Fills empty character text from a quick template before building.
///
/// Returns `None` when `template` is not one of [`PERSONALITY_TEMPLATES`].
pub fn create_personality_from_template(
    template: &str,
    mut customization: PersonalityBuilder,
) -> Option<Personality> {
    let quick = quick_template(template)?;
    if customization.character_traits.is_empty() {
        customization.character_traits = quick.character_traits.to_string();
    }
    if customization
        .additional_context
        .as_deref()
        .map_or(true, str::is_empty)
    {
        customization.additional_context = Some(quick.additional_context.to_string());
    }
    Some(create_personality(customization))
}

/// Returns every problem found; an empty list means the builder is usable.
pub fn validate_personality(personality: &PersonalityBuilder) -> Vec<String> {
    let mut errors = Vec::new();

    let required = [
        (&personality.id, "ID is required"),
        (&personality.name, "Name is required"),
        (&personality.description, "Description is required"),
        (&personality.emoji, "Emoji is required"),
        (&personality.color, "Color is required"),
        (&personality.character_traits, "Character traits are required"),
    ];
    for (value, message) in required {
        if value.is_empty() {
            errors.push(message.to_string());
        }
    }

    if !personality.color.is_empty() && !HEX_COLOR.is_match(&personality.color) {
        errors.push("Color must be in hex format (e.g., #FF0000)".to_string());
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    fn surfer() -> PersonalityBuilder {
        PersonalityBuilder {
            id: "surfer".into(),
            name: "Surfer Dude".into(),
            description: "Laid-back surfer who loves crypto".into(),
            emoji: "🏄".into(),
            color: "#00CED1".into(),
            character_traits: String::new(),
            additional_context: None,
        }
    }

    #[test]
    fn builds_prompt_in_order() {
        let mut b = surfer();
        b.character_traits = "Whoa, dude!".into();
        b.additional_context = Some("Cowabunga!".into());
        let p = create_personality(b);
        // Unknown ids render the professional tool block
        let expected = format!(
            "Whoa, dude!\n\n{}\n\nCowabunga!",
            generate_tool_description("professional")
        );
        assert_eq!(p.system_prompt, expected);
    }

    #[test]
    fn template_fills_missing_text_only() {
        let p = create_personality_from_template("casual", surfer()).unwrap();
        assert!(p.system_prompt.starts_with("Hey there! I'm your casual"));
        assert!(p.system_prompt.ends_with("accessible and enjoyable for everyone!"));

        let mut custom = surfer();
        custom.character_traits = "Totally stoked.".into();
        let p = create_personality_from_template("teacher", custom).unwrap();
        assert!(p.system_prompt.starts_with("Totally stoked."));

        assert!(create_personality_from_template("pirate", surfer()).is_none());
    }

    #[test]
    fn validation_reports_each_problem() {
        let errors = validate_personality(&PersonalityBuilder::default());
        assert_eq!(errors.len(), 6);
        assert!(errors.contains(&"Character traits are required".to_string()));

        let mut bad = surfer();
        bad.character_traits = "ok".into();
        bad.color = "00CED1".into();
        assert_eq!(
            validate_personality(&bad),
            vec!["Color must be in hex format (e.g., #FF0000)".to_string()]
        );

        bad.color = "#00ced1".into();
        assert!(validate_personality(&bad).is_empty());
    }
}
