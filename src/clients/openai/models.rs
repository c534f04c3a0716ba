#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OpenAIModel {
    #[default]
    Gpt4o,
    Gpt4oMini,
    Gpt41,
    Gpt41Mini,
    Override(String),
}

impl OpenAIModel {
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Gpt4o => "gpt-4o",
            Self::Gpt4oMini => "gpt-4o-mini",
            Self::Gpt41 => "gpt-4.1",
            Self::Gpt41Mini => "gpt-4.1-mini",
            Self::Override(s) => s.as_str(),
        }
    }

    /// Known ids map to their variant; anything else is passed through verbatim.
    pub fn from_id(id: &str) -> Self {
        match id {
            "gpt-4o" => Self::Gpt4o,
            "gpt-4o-mini" => Self::Gpt4oMini,
            "gpt-4.1" => Self::Gpt41,
            "gpt-4.1-mini" => Self::Gpt41Mini,
            other => Self::Override(other.to_string()),
        }
    }

    /// Whether the model accepts `image_url` content parts.
    pub fn supports_images(&self) -> bool {
        !matches!(self, Self::Override(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_through_from_id() {
        assert_eq!(OpenAIModel::from_id("gpt-4o"), OpenAIModel::Gpt4o);
        assert_eq!(OpenAIModel::from_id("gpt-4.1-mini").id(), "gpt-4.1-mini");
        assert_eq!(
            OpenAIModel::from_id("local-llava"),
            OpenAIModel::Override("local-llava".into())
        );
        assert!(!OpenAIModel::from_id("local-llava").supports_images());
    }
}
