use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Quote {
    pub quote: String,
    #[serde(default)]
    pub source: Option<String>,
}

impl Quote {
    pub fn fallback(text: &str) -> Self {
        Self {
            quote: text.to_string(),
            source: None,
        }
    }

    pub fn display(&self) -> String {
        match &self.source {
            Some(source) => format!("\"{}\" - {}", self.quote, source),
            None => format!("\"{}\"", self.quote),
        }
    }
}
