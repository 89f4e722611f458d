use crate::schema::{LocationType, RoomType, SizeType};

const EXTRACT_TEMPLATE: &str = "For the following text, identify and extract information about each room in the floor plan.

text: {text}

{format_instructions}

Please provide the JSON content only.";

const UPDATE_TEMPLATE: &str = "Given the existing floor plan and the following additional description, update the floor plan accordingly.

Existing floor plan:
{floor_plan}

Additional description:
{text}

{format_instructions}

Ensure the updated floor plan maintains all previous details unless explicitly modified by the new description. Please provide the JSON content only.";

fn joined<T: ToString>(values: &[T]) -> String {
    values
        .iter()
        .map(|v| format!("\"{}\"", v.to_string()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Describes the expected JSON shape and the closed enum values
pub fn format_instructions() -> String {
    format!(
        r#"The output should be a JSON object with a single key "rooms" holding a list of room objects.
Each room object has these fields:
- "name" (string, required): The name of the room. Ensure it is unique.
- "type" (string or null): The type of the room. One of: {room_types}.
- "link" (list of strings): The names of the rooms this room is connected to. Make sure two rooms are adjacent.
- "location" (string or null): The location of the room within the layout. One of: {locations}. Top represents the north, bottom represents the south.
- "size" (string or null): The size of the room, calculated as a proportion of the entire layout outline. One of: {sizes}.

Example:
{{"rooms": [{{"name": "Living room", "type": "LivingRoom", "link": ["Kitchen"], "location": "center", "size": "L"}}, {{"name": "Kitchen", "type": "Kitchen", "link": ["Living room"], "location": "north", "size": "S"}}]}}"#,
        room_types = joined(&RoomType::ALL),
        locations = joined(&LocationType::ALL),
        sizes = joined(&SizeType::ALL),
    )
}

/// Substitute `{name}` placeholders in one pass; inserted values are never rescanned
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];
        let placeholder = tail.find('}').and_then(|close| {
            let name = &tail[1..close];
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value, close + 1))
        });

        match placeholder {
            Some((value, consumed)) => {
                out.push_str(value);
                rest = &tail[consumed..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

pub fn extract_prompt(text: &str) -> String {
    let instructions = format_instructions();
    fill_template(
        EXTRACT_TEMPLATE,
        &[("text", text), ("format_instructions", instructions.as_str())],
    )
}

/// `floor_plan` is the existing plan as JSON text
pub fn update_prompt(floor_plan: &str, text: &str) -> String {
    let instructions = format_instructions();
    fill_template(
        UPDATE_TEMPLATE,
        &[
            ("floor_plan", floor_plan),
            ("text", text),
            ("format_instructions", instructions.as_str()),
        ],
    )
}
