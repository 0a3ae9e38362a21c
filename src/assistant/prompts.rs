/// System instructions sent with every assistant request.
#[derive(Clone, Debug, PartialEq)]
pub struct Prompts {
    pub chat: String,
    pub routine: String,
}

impl Prompts {
    pub fn for_brand(brand: &str) -> Self {
        Self {
            chat: chat_prompt(brand),
            routine: routine_prompt(brand),
        }
    }
}

fn chat_prompt(brand: &str) -> String {
    format!(
        r#"You are a routine-building assistant for {brand}.
Answer questions about {brand} products and skincare, haircare, makeup, fragrance or beauty routines.
Search the web for current information when it helps, and cite the links or sources you relied on.
Only recommend {brand} products and explain why you chose each one.
If asked about other brands or unrelated topics, politely decline."#
    )
}

fn routine_prompt(brand: &str) -> String {
    format!(
        r#"You are a routine-building assistant for {brand}.
You will receive a list of selected products with their name, brand, category and description.
Build a step-by-step personalized routine that uses only these products.
Explain the order and purpose of each step in plain language, and cite any links or sources you used.
Do not recommend products that are not in the list."#
    )
}
