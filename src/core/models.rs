/// The hosted Llama 2 chat variants this client can talk to.
///
/// Each variant maps to an opaque versioned Replicate identifier. The catalog
/// is static: model selection is an enum choice, not a runtime lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ModelKind {
    #[default]
    Llama2_7b,
    Llama2_13b,
    Llama2_70b,
}

impl ModelKind {
    pub const ALL: [ModelKind; 3] = [
        ModelKind::Llama2_7b,
        ModelKind::Llama2_13b,
        ModelKind::Llama2_70b,
    ];

    /// Short name accepted on the command line and in the config file.
    pub fn as_str(self) -> &'static str {
        match self {
            ModelKind::Llama2_7b => "llama2-7b",
            ModelKind::Llama2_13b => "llama2-13b",
            ModelKind::Llama2_70b => "llama2-70b",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            ModelKind::Llama2_7b => "Llama 2 7B",
            ModelKind::Llama2_13b => "Llama 2 13B",
            ModelKind::Llama2_70b => "Llama 2 70B",
        }
    }

    /// Opaque versioned identifier the prediction API expects.
    pub fn version_id(self) -> &'static str {
        match self {
            ModelKind::Llama2_7b => {
                "a16z-infra/llama7b-v2-chat:4f0a4744c7295c024a1de15e1a63c880d3da035fa1f49bfd344fe076074c8eea"
            }
            ModelKind::Llama2_13b => {
                "a16z-infra/llama13b-v2-chat:df7690f1994d94e96ad9d568eac121aecf50684a0b0963b25a41cc40061269e5"
            }
            ModelKind::Llama2_70b => {
                "replicate/llama70b-v2-chat:e951f18578850b652510200860fc4ea62b3b16fac280f83ff32282f87bbd2e48"
            }
        }
    }
}

impl std::fmt::Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ModelKind {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_ascii_lowercase().as_str() {
            "llama2-7b" | "7b" => Ok(ModelKind::Llama2_7b),
            "llama2-13b" | "13b" => Ok(ModelKind::Llama2_13b),
            "llama2-70b" | "70b" => Ok(ModelKind::Llama2_70b),
            _ => Err(format!(
                "unknown model: {value} (expected one of: llama2-7b, llama2-13b, llama2-70b)"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_model_has_a_versioned_identifier() {
        for model in ModelKind::ALL {
            let id = model.version_id();
            let (slug, version) = id.split_once(':').expect("identifier has owner/name:version");
            assert!(slug.contains('/'));
            assert_eq!(version.len(), 64);
        }
    }

    #[test]
    fn short_names_round_trip() {
        for model in ModelKind::ALL {
            assert_eq!(ModelKind::try_from(model.as_str()), Ok(model));
        }
    }

    #[test]
    fn parsing_accepts_size_shorthand_and_rejects_unknowns() {
        assert_eq!(ModelKind::try_from("13B"), Ok(ModelKind::Llama2_13b));
        assert!(ModelKind::try_from("gpt-4").is_err());
    }
}
