use lexicon::Field;

pub fn field_prompt(field: Field, word: &str, part_of_speech: &str) -> String {
    match field {
        Field::Definitions => format!(
            "Define the English word \"{word}\" ({part_of_speech}) in one short dictionary-style sentence. \
            Output only the definition."
        ),
        Field::Examples => format!(
            "Write one natural example sentence that uses the English word \"{word}\" ({part_of_speech}). \
            Output only the sentence."
        ),
        Field::Synonyms => format!(
            "List up to two synonyms of the English word \"{word}\" ({part_of_speech}), separated by semicolons. \
            Output only the list."
        ),
        Field::Antonyms => format!(
            "List up to two antonyms of the English word \"{word}\" ({part_of_speech}), separated by semicolons. \
            Output only the list."
        ),
    }
}

pub fn base_form_prompt(word: &str) -> String {
    format!(
        "What is the dictionary base form of the English word \"{word}\"? \
        For example, the base form of \"assailed\" is \"assail\". \
        Output only the base form as a single word."
    )
}

/// Asks for all six fields at once as a JSON object.
pub fn structured_prompt(word: &str, entry_json: &str) -> String {
    format!(
        r#"You are an English dictionary assistant.

Below is a partially filled dictionary entry for the word "{word}":
{entry_json}

Complete the entry. Respond with one JSON object with exactly these string fields:
{{
    "phonetic": "string",
    "word_type": "string",
    "definitions": "string",
    "examples": "string",
    "synonyms": "string",
    "antonyms": "string"
}}

RULES:
- Every value is a non-empty string
- Multiple items in one field are separated by semicolons
- Output ONLY the JSON object, no markdown, no explanations

JSON OUTPUT:"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_field_has_its_own_prompt() {
        let prompts: Vec<String> = Field::BACKFILLABLE
            .iter()
            .map(|f| field_prompt(*f, "run", "verb"))
            .collect();

        for (i, a) in prompts.iter().enumerate() {
            assert!(a.contains("\"run\" (verb)"));
            for b in &prompts[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_missing_part_of_speech_degrades_to_empty_parens() {
        let prompt = field_prompt(Field::Synonyms, "run", "");

        assert!(prompt.contains("\"run\" ()"));
    }

    #[test]
    fn test_structured_prompt_embeds_entry() {
        let prompt = structured_prompt("run", r#"{"word":"run"}"#);

        assert!(prompt.contains(r#"{"word":"run"}"#));
        assert!(prompt.contains("\"word_type\": \"string\""));
    }
}
